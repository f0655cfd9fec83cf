//! Input stream handling
//!
//! Sessions read from a FIFO created by the container runtime; tests and
//! embedded hosts may hand in any byte stream. Teardown stops the pump by
//! closing the stream, not by signalling the pump directly, so the reader is
//! wrapped with a close handle that turns a pending or future read into
//! end-of-stream.

use std::future::Future;
use std::io;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

/// Any readable byte stream a session can ingest from
pub type ByteStream = Box<dyn AsyncRead + Send + Unpin>;

/// Closes a session's input stream from outside the pump task
#[derive(Clone, Debug)]
pub(crate) struct StreamHandle {
    token: CancellationToken,
}

impl StreamHandle {
    pub(crate) fn close(&self) {
        self.token.cancel();
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// The pump's reader over one input byte stream.
///
/// Once the handle is closed, reads observe end-of-stream even while a read
/// on the underlying stream is pending.
pub(crate) struct InputStream {
    inner: ByteStream,
    closed: Pin<Box<WaitForCancellationFutureOwned>>,
    done: bool,
}

impl InputStream {
    pub(crate) fn new(inner: ByteStream) -> (Self, StreamHandle) {
        let token = CancellationToken::new();
        let stream = Self {
            inner,
            closed: Box::pin(token.clone().cancelled_owned()),
            done: false,
        };
        (stream, StreamHandle { token })
    }
}

impl AsyncRead for InputStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if !this.done && this.closed.as_mut().poll(cx).is_ready() {
            this.done = true;
        }
        if this.done {
            // Leaving the buffer untouched reads as end-of-stream.
            return Poll::Ready(Ok(()));
        }
        Pin::new(&mut this.inner).poll_read(cx, buf)
    }
}

/// Open a session's input for reading.
///
/// The runtime hands over a FIFO path; plain files are accepted as well so a
/// recorded stream can be ingested.
pub(crate) async fn open_input(path: &Path) -> io::Result<ByteStream> {
    #[cfg(unix)]
    {
        use tokio::net::unix::pipe;
        match pipe::OpenOptions::new().open_receiver(path) {
            Ok(receiver) => return Ok(Box::new(receiver)),
            // Not a FIFO: fall through to the regular-file open.
            Err(err) if err.kind() == io::ErrorKind::InvalidInput => {}
            Err(err) => return Err(err),
        }
    }
    let file = tokio::fs::File::open(path).await?;
    Ok(Box::new(file))
}
