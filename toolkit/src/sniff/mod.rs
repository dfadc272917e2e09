//! Content-type detection from leading bytes
//!
//! Client-supplied `Content-Type` headers are never trusted. The type is
//! derived from the first [`SNIFF_LEN`] bytes of the content instead, using
//! magic numbers (and markup signatures) from the `infer` crate, with a plain
//! text fallback.
//!
//! Uploads arrive as a stream of chunks, and the bytes used for detection must
//! still reach the destination file. [`Sniffer`] records the chunks it reads
//! while sniffing and replays them before resuming the underlying stream.
//!
//! # Examples
//!
//! ```rust
//! use bytes::Bytes;
//! use futures_util::{stream, StreamExt};
//! use toolkit::sniff::Sniffer;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let chunks = vec![
//!     Ok::<_, std::io::Error>(Bytes::from_static(&[0x89, b'P', b'N', b'G'])),
//!     Ok(Bytes::from_static(&[0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3])),
//! ];
//! let mut sniffer = Sniffer::new(stream::iter(chunks));
//!
//! assert_eq!(sniffer.sniff().await.unwrap(), "image/png");
//!
//! // Nothing was lost: the full content is still readable.
//! let mut total = 0;
//! while let Some(chunk) = sniffer.next().await {
//!     total += chunk.unwrap().len();
//! }
//! assert_eq!(total, 11);
//! # }
//! ```

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use std::{
    collections::VecDeque,
    pin::Pin,
    task::{Context, Poll},
};

/// Number of leading bytes inspected to determine a content type
pub const SNIFF_LEN: usize = 512;

/// Fallback type for binary content without a known signature
pub const OCTET_STREAM: &str = "application/octet-stream";

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Determines the content type of `data` from its first [`SNIFF_LEN`] bytes
///
/// Always returns a valid MIME type; unknown binary content is
/// `application/octet-stream`.
///
/// # Examples
///
/// ```rust
/// use toolkit::sniff::detect_content_type;
///
/// assert_eq!(detect_content_type(&[0xFF, 0xD8, 0xFF, 0xE0]), "image/jpeg");
/// assert_eq!(detect_content_type(b"GIF89a"), "image/gif");
/// assert_eq!(detect_content_type(b"hello"), "text/plain; charset=utf-8");
/// assert_eq!(detect_content_type(&[0x00, 0x01, 0x02]), "application/octet-stream");
/// ```
#[must_use]
pub fn detect_content_type(data: &[u8]) -> &'static str {
    let head = &data[..data.len().min(SNIFF_LEN)];

    if let Some(kind) = infer::get(head) {
        return kind.mime_type();
    }

    if is_text(head) {
        return TEXT_PLAIN;
    }

    OCTET_STREAM
}

// Binary data bytes as defined by the WHATWG MIME sniffing standard.
const fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

fn is_text(head: &[u8]) -> bool {
    !head.iter().copied().any(is_binary_byte)
}

/// Stream adapter that peeks at leading chunks without consuming them
///
/// Call [`Sniffer::sniff`] first, then read the adapter as an ordinary
/// [`Stream`]: the chunks pulled during sniffing are yielded again, in order,
/// before the rest of the inner stream.
#[derive(Debug)]
pub struct Sniffer<S> {
    inner: S,
    replay: VecDeque<Bytes>,
    buffered: usize,
    exhausted: bool,
}

impl<S, E> Sniffer<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    /// Wraps a chunk stream
    pub const fn new(inner: S) -> Self {
        Self {
            inner,
            replay: VecDeque::new(),
            buffered: 0,
            exhausted: false,
        }
    }

    /// Reads up to [`SNIFF_LEN`] bytes and returns the detected content type
    ///
    /// Safe to call more than once; later calls reuse what is already buffered.
    pub async fn sniff(&mut self) -> Result<&'static str, E> {
        while self.buffered < SNIFF_LEN && !self.exhausted {
            match self.inner.next().await {
                Some(Ok(chunk)) => {
                    self.buffered += chunk.len();
                    self.replay.push_back(chunk);
                }
                Some(Err(e)) => return Err(e),
                None => self.exhausted = true,
            }
        }

        Ok(detect_content_type(&self.prefix()))
    }

    /// Bytes recorded so far, capped at [`SNIFF_LEN`]
    #[must_use]
    pub fn prefix(&self) -> Vec<u8> {
        let mut head = Vec::with_capacity(self.buffered.min(SNIFF_LEN));
        for chunk in &self.replay {
            let take = (SNIFF_LEN - head.len()).min(chunk.len());
            head.extend_from_slice(&chunk[..take]);
            if head.len() == SNIFF_LEN {
                break;
            }
        }
        head
    }
}

impl<S, E> Stream for Sniffer<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    type Item = Result<Bytes, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if let Some(chunk) = self.replay.pop_front() {
            return Poll::Ready(Some(Ok(chunk)));
        }
        if self.exhausted {
            return Poll::Ready(None);
        }
        self.inner.poll_next_unpin(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use proptest::prelude::*;

    const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0];
    const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    const PDF_MAGIC: &[u8] = b"%PDF-1.4";

    fn chunked(data: &[u8], size: usize) -> Vec<Result<Bytes, std::io::Error>> {
        data.chunks(size.max(1))
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect()
    }

    async fn drain<S>(mut sniffer: Sniffer<S>) -> Vec<u8>
    where
        S: Stream<Item = Result<Bytes, std::io::Error>> + Unpin,
    {
        let mut out = Vec::new();
        while let Some(chunk) = sniffer.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[test]
    fn test_detect_images_and_documents() {
        assert_eq!(detect_content_type(JPEG_MAGIC), "image/jpeg");
        assert_eq!(detect_content_type(PNG_MAGIC), "image/png");
        assert_eq!(detect_content_type(b"GIF87a"), "image/gif");
        assert_eq!(detect_content_type(PDF_MAGIC), "application/pdf");
    }

    #[test]
    fn test_detect_text_fallbacks() {
        assert_eq!(detect_content_type(b""), TEXT_PLAIN);
        assert_eq!(detect_content_type(b"plain words\n"), TEXT_PLAIN);
        assert!(detect_content_type(b"  <!DOCTYPE html><html>").starts_with("text/html"));
        assert_eq!(detect_content_type(&[0x01, 0x02, 0x03, 0x04]), OCTET_STREAM);
    }

    #[test]
    fn test_only_prefix_is_inspected() {
        let mut data = b"a".repeat(SNIFF_LEN);
        data.push(0x00);
        assert_eq!(detect_content_type(&data), TEXT_PLAIN);
    }

    #[tokio::test]
    async fn test_sniff_across_small_chunks() {
        let mut data = PNG_MAGIC.to_vec();
        data.extend(std::iter::repeat(7u8).take(2000));

        let mut sniffer = Sniffer::new(stream::iter(chunked(&data, 3)));
        assert_eq!(sniffer.sniff().await.unwrap(), "image/png");
        assert_eq!(sniffer.prefix().len(), SNIFF_LEN);
        assert_eq!(drain(sniffer).await, data);
    }

    #[tokio::test]
    async fn test_sniff_short_stream() {
        let mut sniffer = Sniffer::new(stream::iter(chunked(JPEG_MAGIC, 1)));
        assert_eq!(sniffer.sniff().await.unwrap(), "image/jpeg");
        assert_eq!(sniffer.sniff().await.unwrap(), "image/jpeg");
        assert_eq!(drain(sniffer).await, JPEG_MAGIC);
    }

    #[tokio::test]
    async fn test_sniff_propagates_stream_errors() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"ab")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ];
        let mut sniffer = Sniffer::new(stream::iter(chunks));
        let err = sniffer.sniff().await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::ConnectionReset);
    }

    proptest! {
        #[test]
        fn sniffing_never_loses_bytes(
            data in proptest::collection::vec(any::<u8>(), 0..4096),
            size in 1usize..700,
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let replayed = runtime.block_on(async {
                let mut sniffer = Sniffer::new(stream::iter(chunked(&data, size)));
                sniffer.sniff().await.unwrap();
                drain(sniffer).await
            });
            prop_assert_eq!(replayed, data);
        }
    }
}
