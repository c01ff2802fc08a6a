//! # Flow
//!
//! A byte-readable inbound connection as seen by matchers.
//!
//! While matching, every byte a matcher consumes is recorded. Rewinding makes
//! the recorded prefix readable again, so a matcher that reads 16 bytes and
//! says "no" leaves those bytes in place for the next matcher and, eventually,
//! for whatever handler takes the flow.
//!
//! ```text
//! record() ─► matcher A reads ─► rewind() ─► matcher B reads ─► rewind() ─► stop_recording()
//!                 │ recorded                    │ replayed + recorded          │ handler replays prefix
//! ```

use bytes::{Buf, Bytes, BytesMut};
use std::fmt;
use std::io;
use std::net::SocketAddr;
#[cfg(unix)]
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};
use tokio::net::TcpStream;
#[cfg(unix)]
use tokio::net::UnixStream;

/// Local endpoint of a flow, which also tells its transport kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalAddr {
    Udp(SocketAddr),
    Tcp(SocketAddr),
    #[cfg(unix)]
    Unix(Option<PathBuf>),
    Other,
}

impl LocalAddr {
    /// Connectionless transport
    pub fn is_datagram(&self) -> bool {
        matches!(self, LocalAddr::Udp(_))
    }

    pub fn socket_addr(&self) -> Option<SocketAddr> {
        match self {
            LocalAddr::Udp(addr) | LocalAddr::Tcp(addr) => Some(*addr),
            _ => None,
        }
    }
}

impl fmt::Display for LocalAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalAddr::Udp(addr) => write!(f, "udp/{addr}"),
            LocalAddr::Tcp(addr) => write!(f, "tcp/{addr}"),
            #[cfg(unix)]
            LocalAddr::Unix(Some(path)) => write!(f, "unix/{}", path.display()),
            #[cfg(unix)]
            LocalAddr::Unix(None) => f.write_str("unix/unnamed"),
            LocalAddr::Other => f.write_str("other"),
        }
    }
}

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

/// Inbound flow with record/replay buffering
pub struct Flow {
    inner: BoxedReader,
    local_addr: LocalAddr,
    peer_addr: Option<SocketAddr>,
    recorded: BytesMut,
    cursor: usize,
    recording: bool,
}

impl fmt::Debug for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flow")
            .field("local_addr", &self.local_addr)
            .field("peer_addr", &self.peer_addr)
            .field("recorded", &self.recorded.len())
            .field("cursor", &self.cursor)
            .field("recording", &self.recording)
            .finish()
    }
}

impl Flow {
    pub fn new<R>(inner: R, local_addr: LocalAddr) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self {
            inner: Box::new(inner),
            local_addr,
            peer_addr: None,
            recorded: BytesMut::new(),
            cursor: 0,
            recording: false,
        }
    }

    /// Flow over a single received datagram
    pub fn from_datagram(payload: impl Into<Bytes>, local: SocketAddr, peer: SocketAddr) -> Self {
        let reader = io::Cursor::new(payload.into());
        Self::new(reader, LocalAddr::Udp(local)).with_peer_addr(peer)
    }

    /// Flow over an accepted TCP stream
    pub fn from_tcp(stream: TcpStream) -> io::Result<Self> {
        let local = stream.local_addr()?;
        let peer = stream.peer_addr()?;
        Ok(Self::new(stream, LocalAddr::Tcp(local)).with_peer_addr(peer))
    }

    /// Flow over an accepted Unix stream
    #[cfg(unix)]
    pub fn from_unix(stream: UnixStream) -> io::Result<Self> {
        let path = stream.local_addr()?.as_pathname().map(PathBuf::from);
        Ok(Self::new(stream, LocalAddr::Unix(path)))
    }

    pub fn with_peer_addr(mut self, peer: SocketAddr) -> Self {
        self.peer_addr = Some(peer);
        self
    }

    pub fn local_addr(&self) -> &LocalAddr {
        &self.local_addr
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Start recording consumed bytes and rewind to the start of anything
    /// already buffered
    pub fn record(&mut self) {
        if !self.recording {
            self.recorded.advance(self.cursor);
        }
        self.recording = true;
        self.cursor = 0;
    }

    /// Make every recorded byte readable again. Outside recording the
    /// buffer only holds bytes nobody has read yet, so there is nothing to
    /// rewind to.
    pub fn rewind(&mut self) {
        if self.recording {
            self.cursor = 0;
        }
    }

    /// Leave the matching phase. Recorded bytes that have not been read since
    /// the last rewind stay queued for the next reader.
    pub fn stop_recording(&mut self) {
        self.recording = false;
        self.recorded.advance(self.cursor);
        self.cursor = 0;
    }

    /// Bytes recorded so far (and not yet drained after recording stopped)
    pub fn buffered(&self) -> &[u8] {
        &self.recorded
    }
}

impl AsyncRead for Flow {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        // Replay from the recorded prefix first
        if this.cursor < this.recorded.len() {
            let pending = &this.recorded[this.cursor..];
            let n = pending.len().min(buf.remaining());
            buf.put_slice(&pending[..n]);
            if this.recording {
                this.cursor += n;
            } else {
                // Delivered bytes leave the buffer for good
                this.recorded.advance(n);
            }
            return Poll::Ready(Ok(()));
        }

        let before = buf.filled().len();
        ready!(Pin::new(&mut this.inner).poll_read(cx, buf))?;

        if this.recording {
            let fresh = &buf.filled()[before..];
            this.recorded.extend_from_slice(fresh);
            this.cursor += fresh.len();
        }

        Poll::Ready(Ok(()))
    }
}
