use criterion::{black_box, criterion_group, criterion_main, Criterion};

use keel_codec::{Address, HexInt, Value};
use keel_proxy::message::{InvokePayload, ResultPayload};

fn make_invoke() -> InvokePayload {
    let mut body = [0u8; 20];
    body[19] = 0x42;
    InvokePayload {
        code: "token-7f9a".to_string(),
        is_query: false,
        from: Address::account(body),
        to: Address::contract(body),
        value: HexInt::new(1_000_000_000_000_000_000),
        limit: HexInt::new(2_000_000),
        method: "transfer".to_string(),
        params: Value::Map(vec![
            ("to".to_string(), Value::Bytes(body.to_vec())),
            ("amount".to_string(), Value::Int(HexInt::new(25))),
        ]),
    }
}

fn make_result() -> ResultPayload {
    ResultPayload {
        status: 0,
        step_used: HexInt::new(123_456),
        result: Value::Nil,
    }
}

fn bench_messages(c: &mut Criterion) {
    let invoke = make_invoke();
    let result = make_result();

    c.bench_function("keel_encode_invoke", |b| {
        b.iter(|| black_box(black_box(&invoke).encode()))
    });

    let invoke_bytes = invoke.encode();
    c.bench_function("keel_decode_invoke", |b| {
        b.iter(|| black_box(InvokePayload::decode(black_box(&invoke_bytes)).unwrap()))
    });

    c.bench_function("keel_encode_result", |b| {
        b.iter(|| black_box(black_box(&result).encode()))
    });

    let result_bytes = result.encode();
    c.bench_function("keel_decode_result", |b| {
        b.iter(|| black_box(ResultPayload::decode(black_box(&result_bytes)).unwrap()))
    });
}

criterion_group!(benches, bench_messages);
criterion_main!(benches);
