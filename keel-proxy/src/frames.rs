//! Per-invocation call frames and the LIFO stack that routes engine
//! messages back to their originator.

use std::sync::Arc;

use keel_codec::Address;

use crate::proxy::CallContext;

/// The minimum state needed to route inbound messages: the invocation's
/// target address (`None` for API fetches) and its callback target.
#[derive(Clone)]
pub struct CallFrame {
    pub addr: Option<Address>,
    pub ctx: Arc<dyn CallContext>,
}

/// Strictly LIFO; bounded only by host call depth.
#[derive(Default)]
pub struct FrameStack {
    frames: Vec<CallFrame>,
}

impl FrameStack {
    pub fn new() -> FrameStack {
        FrameStack { frames: Vec::new() }
    }

    pub fn push(&mut self, addr: Option<Address>, ctx: Arc<dyn CallContext>) {
        self.frames.push(CallFrame { addr, ctx });
    }

    pub fn pop(&mut self) -> Option<CallFrame> {
        self.frames.pop()
    }

    /// Clone of the innermost in-flight frame, so callers can drop the
    /// proxy lock before touching the context.
    pub fn top(&self) -> Option<CallFrame> {
        self.frames.last().cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::NullContext;

    #[test]
    fn lifo_order() {
        let ctx: Arc<dyn CallContext> = Arc::new(NullContext);
        let mut stack = FrameStack::new();
        assert!(stack.is_empty());

        let a = Address::account([1; 20]);
        let b = Address::contract([2; 20]);
        stack.push(Some(a), Arc::clone(&ctx));
        stack.push(Some(b), Arc::clone(&ctx));
        stack.push(None, Arc::clone(&ctx));
        assert_eq!(stack.len(), 3);

        assert_eq!(stack.top().unwrap().addr, None);
        assert_eq!(stack.pop().unwrap().addr, None);
        assert_eq!(stack.pop().unwrap().addr, Some(b));
        assert_eq!(stack.pop().unwrap().addr, Some(a));
        assert!(stack.pop().is_none());
    }

    #[test]
    fn clear_abandons_everything() {
        let ctx: Arc<dyn CallContext> = Arc::new(NullContext);
        let mut stack = FrameStack::new();
        stack.push(None, Arc::clone(&ctx));
        stack.push(None, ctx);
        stack.clear();
        assert!(stack.is_empty());
        assert_eq!(stack.len(), 0);
    }
}
