use std::pin::Pin;
use std::task::{Context, Poll, ready};

use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, ReadBuf};

use super::hash::ContentHash;

/// Incremental SHA-256 hasher that also counts the bytes it has seen.
#[derive(Clone, Default)]
pub struct ContentHasher {
    inner: Sha256,
    len: u64,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
        self.len += data.len() as u64;
    }

    /// Number of bytes fed into the hasher so far.
    pub fn bytes_hashed(&self) -> u64 {
        self.len
    }

    pub fn finalize(self) -> ContentHash {
        ContentHash::from_bytes(self.inner.finalize().into())
    }
}

/// An `AsyncRead` adapter that hashes every byte passing through it.
///
/// Wrap the inbound side of a relay with this to compute the content hash
/// while the bytes are forwarded elsewhere.
pub struct HashingReader<R> {
    inner: R,
    hasher: ContentHasher,
}

impl<R> HashingReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            hasher: ContentHasher::new(),
        }
    }

    /// Consume the reader, returning the hash of everything read and its length.
    pub fn finalize(self) -> (ContentHash, u64) {
        let len = self.hasher.bytes_hashed();
        (self.hasher.finalize(), len)
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for HashingReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let this = self.get_mut();
        let filled_before = buf.filled().len();
        ready!(Pin::new(&mut this.inner).poll_read(cx, buf))?;
        this.hasher.update(&buf.filled()[filled_before..]);
        Poll::Ready(Ok(()))
    }
}
