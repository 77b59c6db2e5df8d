//! Incremental decoding of the chat endpoint's streamed body
//!
//! The backend writes newline-delimited frames. Content frames start with
//! `data: ` and carry either a JSON object `{"content": "..."}` or the
//! terminal sentinel `[DONE]`. Everything else is noise and gets skipped.

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use std::collections::VecDeque;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::ApiError;

pub const DATA_PREFIX: &str = "data: ";
pub const DONE_SENTINEL: &str = "[DONE]";

/// One decoded content frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Fragment(String),
    Done,
}

#[derive(Deserialize)]
struct FragmentPayload {
    content: String,
}

/// Reassembles frames that were split across network reads
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk, returning every frame it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Frame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(frame) = decode_line(&line[..line.len() - 1]) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Decode whatever is left once the body has ended
    pub fn finish(&mut self) -> Option<Frame> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buffer);
        decode_line(&line)
    }
}

/// Decode one line without its trailing `\n`
pub fn decode_line(line: &[u8]) -> Option<Frame> {
    let line = String::from_utf8_lossy(line);
    let line = line.strip_suffix('\r').unwrap_or(&line);

    let data = line.strip_prefix(DATA_PREFIX)?;
    if data == DONE_SENTINEL {
        return Some(Frame::Done);
    }

    match serde_json::from_str::<FragmentPayload>(data) {
        Ok(payload) => Some(Frame::Fragment(payload.content)),
        Err(e) => {
            debug!(error = %e, frame = %data, "Skipping malformed stream frame");
            None
        }
    }
}

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ApiError>> + Send>>;

/// Cancellable async iterator over the text fragments of one chat response
pub struct FragmentReader {
    body: ByteStream,
    decoder: FrameDecoder,
    pending: VecDeque<String>,
    finished: bool,
    cancel: CancellationToken,
}

impl FragmentReader {
    pub fn new<S>(body: S, cancel: CancellationToken) -> Self
    where
        S: Stream<Item = Result<Bytes, ApiError>> + Send + 'static,
    {
        Self {
            body: Box::pin(body),
            decoder: FrameDecoder::new(),
            pending: VecDeque::new(),
            finished: false,
            cancel,
        }
    }

    /// Next fragment, `None` once the sentinel, body end, or cancellation is reached.
    ///
    /// A read error is returned once and ends the stream.
    pub async fn next(&mut self) -> Option<Result<String, ApiError>> {
        loop {
            if let Some(fragment) = self.pending.pop_front() {
                return Some(Ok(fragment));
            }
            if self.finished {
                return None;
            }

            let chunk = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!("Chat stream cancelled");
                    self.finished = true;
                    return None;
                }
                chunk = self.body.next() => chunk,
            };

            match chunk {
                Some(Ok(bytes)) => {
                    let frames = self.decoder.push(&bytes);
                    self.queue(frames);
                }
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(e));
                }
                None => {
                    let tail = self.decoder.finish();
                    self.queue(tail);
                    self.finished = true;
                }
            }
        }
    }

    fn queue(&mut self, frames: impl IntoIterator<Item = Frame>) {
        for frame in frames {
            match frame {
                Frame::Fragment(text) => self.pending.push_back(text),
                Frame::Done => {
                    // Fragments after the sentinel are not part of this answer
                    self.finished = true;
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn reader_from(chunks: Vec<&'static str>) -> FragmentReader {
        let body = stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok::<_, ApiError>(Bytes::from_static(c.as_bytes()))),
        );
        FragmentReader::new(body, CancellationToken::new())
    }

    async fn collect(mut reader: FragmentReader) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(item) = reader.next().await {
            out.push(item.unwrap());
        }
        out
    }

    #[test]
    fn test_decode_fragment_line() {
        assert_eq!(
            decode_line(br#"data: {"content":"Hel"}"#),
            Some(Frame::Fragment("Hel".to_string()))
        );
    }

    #[test]
    fn test_decode_done_line() {
        assert_eq!(decode_line(b"data: [DONE]"), Some(Frame::Done));
        assert_eq!(decode_line(b"data: [DONE]\r"), Some(Frame::Done));
    }

    #[test]
    fn test_decode_ignores_unmarked_and_malformed() {
        assert_eq!(decode_line(b""), None);
        assert_eq!(decode_line(b"event: ping"), None);
        assert_eq!(decode_line(b"data: {bad json"), None);
        assert_eq!(decode_line(br#"data: {"text":"wrong field"}"#), None);
    }

    #[test]
    fn test_decoder_joins_split_frames() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(br#"data: {"con"#).is_empty());
        let frames = decoder.push(b"tent\":\"lo\"}\n\n");
        assert_eq!(frames, vec![Frame::Fragment("lo".to_string())]);
    }

    #[test]
    fn test_decoder_keeps_multibyte_chars_across_reads() {
        let mut decoder = FrameDecoder::new();
        let line = "data: {\"content\":\"caf\u{e9}\"}\n".as_bytes();
        let split = line.len() - 4;
        assert!(decoder.push(&line[..split]).is_empty());
        let frames = decoder.push(&line[split..]);
        assert_eq!(frames, vec![Frame::Fragment("caf\u{e9}".to_string())]);
    }

    #[test]
    fn test_decoder_replaces_invalid_utf8() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.push(b"data: {\"content\":\"a\xffb\"}\n");
        assert_eq!(frames, vec![Frame::Fragment("a\u{FFFD}b".to_string())]);
    }

    #[test]
    fn test_decoder_split_multibyte_next_to_invalid_byte() {
        let mut decoder = FrameDecoder::new();
        // 0xC3 0xA9 is 'é'; the read boundary falls between its two bytes
        assert!(decoder.push(b"data: {\"content\":\"\xc3").is_empty());
        let frames = decoder.push(b"\xa9\xff!\"}\n");
        assert_eq!(frames, vec![Frame::Fragment("\u{e9}\u{FFFD}!".to_string())]);
    }

    #[test]
    fn test_decoder_flushes_unterminated_tail() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(br#"data: {"content":"end"}"#).is_empty());
        assert_eq!(decoder.finish(), Some(Frame::Fragment("end".to_string())));
        assert_eq!(decoder.finish(), None);
    }

    #[tokio::test]
    async fn test_reader_hello_then_done() {
        let reader = reader_from(vec![
            "data: {\"content\":\"Hel\"}\n",
            "data: {\"content\":\"lo\"}\n",
            "data: [DONE]\n",
        ]);
        assert_eq!(collect(reader).await.concat(), "Hello");
    }

    #[tokio::test]
    async fn test_reader_skips_bad_frame_and_continues() {
        let reader = reader_from(vec![
            "data: {\"content\":\"a\"}\n",
            "data: {bad json\n",
            "data: {\"content\":\"b\"}\n",
            "data: [DONE]\n",
        ]);
        assert_eq!(collect(reader).await, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_reader_stops_at_sentinel() {
        let reader = reader_from(vec![
            "data: {\"content\":\"kept\"}\ndata: [DONE]\ndata: {\"content\":\"dropped\"}\n",
        ]);
        assert_eq!(collect(reader).await, vec!["kept"]);
    }

    #[tokio::test]
    async fn test_reader_ends_without_sentinel() {
        let reader = reader_from(vec!["data: {\"content\":\"x\"}\n\n", "data: {\"content\":\"y\"}"]);
        assert_eq!(collect(reader).await, vec!["x", "y"]);
    }

    #[tokio::test]
    async fn test_reader_surfaces_read_error_after_partial_text() {
        let body = stream::iter(vec![
            Ok(Bytes::from_static(b"data: {\"content\":\"part\"}\n")),
            Err(ApiError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "reset",
            ))),
            Ok(Bytes::from_static(b"data: {\"content\":\"never\"}\n")),
        ]);
        let mut reader = FragmentReader::new(body, CancellationToken::new());

        assert_eq!(reader.next().await.unwrap().unwrap(), "part");
        assert!(reader.next().await.unwrap().is_err());
        assert!(reader.next().await.is_none());
    }

    #[tokio::test]
    async fn test_reader_honours_cancellation() {
        let cancel = CancellationToken::new();
        let body = stream::pending::<Result<Bytes, ApiError>>();
        let mut reader = FragmentReader::new(body, cancel.clone());

        cancel.cancel();
        assert!(reader.next().await.is_none());
        // Stays finished after cancellation
        assert!(reader.next().await.is_none());
    }
}
