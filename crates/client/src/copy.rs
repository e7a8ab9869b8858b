//! Injectable byte-copy primitive.
//!
//! The resumable downloader needs to know how many bytes a failed copy
//! moved before it stopped, which a plain `Result<u64>` cannot express.
//! [`CopyReport`] carries both, and [`ByteCopier`] makes the primitive
//! injectable so tests can simulate connection resets and transports can
//! tune buffering.

use std::future::Future;
use std::pin::Pin;

use tokio::io::{AsyncRead, AsyncReadExt};

/// Read buffer size for the default copier.
const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Outcome of one copy attempt: bytes moved plus the error that stopped it,
/// if any. `error: None` means the source was exhausted cleanly.
#[derive(Debug)]
pub struct CopyReport {
    /// Bytes appended to the sink by this attempt.
    pub copied: u64,
    /// The error that interrupted the copy, if it did not run to EOF.
    pub error: Option<std::io::Error>,
}

/// Copies bytes from a stream into an accumulation sink.
pub trait ByteCopier: Send + Sync {
    /// Copies from `reader` into `sink` until EOF or failure.
    fn copy<'a>(
        &'a self,
        reader: &'a mut (dyn AsyncRead + Send + Unpin),
        sink: &'a mut Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = CopyReport> + Send + 'a>>;
}

/// Default copier: fixed-size buffered reads appended to the sink.
pub struct DefaultCopier;

impl ByteCopier for DefaultCopier {
    fn copy<'a>(
        &'a self,
        reader: &'a mut (dyn AsyncRead + Send + Unpin),
        sink: &'a mut Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = CopyReport> + Send + 'a>> {
        Box::pin(async move {
            let mut copied: u64 = 0;
            let mut buf = vec![0u8; COPY_BUFFER_SIZE];

            loop {
                match reader.read(&mut buf).await {
                    Ok(0) => {
                        return CopyReport {
                            copied,
                            error: None,
                        };
                    }
                    Ok(n) => {
                        sink.extend_from_slice(&buf[..n]);
                        copied += n as u64;
                    }
                    Err(e) => {
                        return CopyReport {
                            copied,
                            error: Some(e),
                        };
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::task::{Context, Poll};

    /// Reader that yields `payload`, then fails with a reset error.
    struct ResettingReader {
        payload: Vec<u8>,
        pos: usize,
    }

    impl AsyncRead for ResettingReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut tokio::io::ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.pos < self.payload.len() {
                let n = (self.payload.len() - self.pos).min(buf.remaining());
                buf.put_slice(&self.payload[self.pos..self.pos + n]);
                self.pos += n;
                Poll::Ready(Ok(()))
            } else {
                Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "connection reset by peer",
                )))
            }
        }
    }

    #[tokio::test]
    async fn copies_to_eof() {
        let mut reader: &[u8] = b"hello world";
        let mut sink = Vec::new();

        let report = DefaultCopier.copy(&mut reader, &mut sink).await;
        assert_eq!(report.copied, 11);
        assert!(report.error.is_none());
        assert_eq!(sink, b"hello world");
    }

    #[tokio::test]
    async fn reports_partial_progress_on_failure() {
        let mut reader = ResettingReader {
            payload: b"partial data".to_vec(),
            pos: 0,
        };
        let mut sink = Vec::new();

        let report = DefaultCopier.copy(&mut reader, &mut sink).await;
        assert_eq!(report.copied, 12);
        assert!(report.error.is_some());
        assert_eq!(sink, b"partial data");
    }

    #[tokio::test]
    async fn empty_source_reports_zero_clean() {
        let mut reader: &[u8] = b"";
        let mut sink = Vec::new();

        let report = DefaultCopier.copy(&mut reader, &mut sink).await;
        assert_eq!(report.copied, 0);
        assert!(report.error.is_none());
        assert!(sink.is_empty());
    }
}
