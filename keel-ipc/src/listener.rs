//! Accepting side of the engine socket.

use std::io;
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
#[cfg(unix)]
use std::os::unix::net::UnixListener;
#[cfg(unix)]
use std::path::Path;

use crate::stream::Stream;

#[derive(Debug)]
pub enum Listener {
    Tcp(TcpListener),
    #[cfg(unix)]
    Uds(UnixListener),
}

impl Listener {
    pub fn bind_tcp<A: ToSocketAddrs>(addr: A) -> io::Result<Listener> {
        Ok(Listener::Tcp(TcpListener::bind(addr)?))
    }

    /// Bind a fresh unix socket, replacing any stale file at `path`.
    #[cfg(unix)]
    pub fn bind_uds(path: impl AsRef<Path>) -> io::Result<Listener> {
        let path = path.as_ref();
        let _ = std::fs::remove_file(path);
        Ok(Listener::Uds(UnixListener::bind(path)?))
    }

    /// Local TCP address, if this is a TCP listener (tests bind port 0).
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        match self {
            Listener::Tcp(l) => l.local_addr(),
            #[cfg(unix)]
            Listener::Uds(_) => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "unix listener has no tcp address",
            )),
        }
    }

    /// Block until the next engine connects.
    pub fn accept(&self) -> io::Result<Stream> {
        match self {
            Listener::Tcp(l) => {
                let (s, _peer) = l.accept()?;
                s.set_nodelay(true).ok();
                Ok(Stream::Tcp(s))
            }
            #[cfg(unix)]
            Listener::Uds(l) => {
                let (s, _peer) = l.accept()?;
                Ok(Stream::Uds(s))
            }
        }
    }
}
