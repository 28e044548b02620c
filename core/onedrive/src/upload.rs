//! Chunk planning and progress reporting for upload sessions.
//!
//! The provider's upload-session protocol accepts strictly ordered,
//! non-overlapping byte ranges, so a file is partitioned up front into
//! contiguous spans that the client submits one at a time.

use std::sync::Arc;

use bytes::Bytes;
use serde::Deserialize;

use skylift_common::{Error, Result};

/// Fixed chunk size for byte-range uploads (20 MiB).
pub const CHUNK_SIZE: u64 = 20 * 1024 * 1024;

/// Frame size used to surface progress while a chunk body streams out.
const PROGRESS_FRAME: usize = 256 * 1024;

/// Callback receiving whole percentages (0-100) as bytes go out.
pub type ProgressHandler = Arc<dyn Fn(u32) + Send + Sync>;

/// A contiguous byte range of the source file, end inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpan {
    /// First byte covered, zero-indexed.
    pub start: u64,
    /// Last byte covered, inclusive.
    pub end: u64,
}

impl ChunkSpan {
    /// Number of bytes covered by this span; always at least one.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` header value declaring this span.
    pub fn content_range(&self, total_size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, total_size)
    }
}

/// Partition `total_size` bytes into contiguous [`CHUNK_SIZE`] spans.
///
/// The last span may be shorter; an empty file yields no spans.
pub fn chunk_spans(total_size: u64) -> Vec<ChunkSpan> {
    spans_for(total_size, CHUNK_SIZE)
}

pub(crate) fn spans_for(total_size: u64, chunk_size: u64) -> Vec<ChunkSpan> {
    let mut spans = Vec::new();
    let mut start = 0u64;
    while start < total_size {
        let end = u64::min(start + chunk_size, total_size) - 1;
        spans.push(ChunkSpan { start, end });
        start = end + 1;
    }
    spans
}

/// Percentage of `total_size` covered by `bytes_sent`, rounded to the
/// nearest whole number.
pub(crate) fn progress_percent(total_size: u64, bytes_sent: u64) -> u32 {
    if total_size == 0 {
        return 100;
    }
    let sent = u128::from(bytes_sent.min(total_size));
    let total = u128::from(total_size);
    ((sent * 200 + total) / (total * 2)) as u32
}

/// Upload session handed out by the provider.
#[derive(Debug, Deserialize)]
pub(crate) struct UploadSessionResponse {
    #[serde(rename = "uploadUrl")]
    pub upload_url: Option<String>,
}

impl UploadSessionResponse {
    /// Extract the session URL, failing when the provider omitted it.
    pub fn into_upload_url(self) -> Result<String> {
        self.upload_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| Error::Session("response contained no uploadUrl".to_string()))
    }
}

/// Slice a chunk into progress frames, pairing each frame with the
/// cumulative percentage reached once that frame is on the wire.
pub(crate) fn progress_frames(
    chunk: &Bytes,
    chunk_start: u64,
    total_size: u64,
) -> Vec<(Bytes, u32)> {
    let mut frames = Vec::with_capacity(chunk.len() / PROGRESS_FRAME + 1);
    let mut offset = 0usize;
    while offset < chunk.len() {
        let end = usize::min(offset + PROGRESS_FRAME, chunk.len());
        let percent = progress_percent(total_size, chunk_start + end as u64);
        frames.push((chunk.slice(offset..end), percent));
        offset = end;
    }
    frames
}

/// Wrap a chunk into a request body that invokes the progress callback
/// as frames are handed to the transport.
///
/// Without a callback the chunk is sent as a plain body.
pub(crate) fn progress_body(
    chunk: Bytes,
    chunk_start: u64,
    total_size: u64,
    on_progress: Option<&ProgressHandler>,
) -> reqwest::Body {
    let Some(callback) = on_progress else {
        return reqwest::Body::from(chunk);
    };
    let callback = Arc::clone(callback);

    let frames = progress_frames(&chunk, chunk_start, total_size);
    let stream = futures::stream::iter(frames.into_iter().map(move |(frame, percent)| {
        callback(percent);
        Ok::<Bytes, std::convert::Infallible>(frame)
    }));

    reqwest::Body::wrap_stream(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const MIB: u64 = 1024 * 1024;

    #[test]
    fn test_three_chunks_for_45_mib() {
        let total = 45 * MIB;
        let spans = chunk_spans(total);

        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0].content_range(total), "bytes 0-20971519/47185920");
        assert_eq!(
            spans[1].content_range(total),
            "bytes 20971520-41943039/47185920"
        );
        assert_eq!(
            spans[2].content_range(total),
            "bytes 41943040-47185919/47185920"
        );
        assert_eq!(spans[2].len(), 5 * MIB);
    }

    #[test]
    fn test_exact_multiple_keeps_full_last_chunk() {
        let spans = chunk_spans(40 * MIB);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].len(), CHUNK_SIZE);
        assert_eq!(spans[1].len(), CHUNK_SIZE);
    }

    #[test]
    fn test_single_byte_file() {
        let spans = chunk_spans(1);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].content_range(1), "bytes 0-0/1");
    }

    #[test]
    fn test_empty_file_has_no_chunks() {
        assert!(chunk_spans(0).is_empty());
    }

    #[test]
    fn test_session_response_with_url() {
        let body = r#"{
            "uploadUrl": "https://sn3302.up.1drv.com/up/fe6987415ace7X4e1eF866337",
            "expirationDateTime": "2026-08-23T09:00:00.000Z"
        }"#;

        let session: UploadSessionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            session.into_upload_url().unwrap(),
            "https://sn3302.up.1drv.com/up/fe6987415ace7X4e1eF866337"
        );
    }

    #[test]
    fn test_session_response_without_url_fails() {
        let body = r#"{"expirationDateTime": "2026-08-23T09:00:00.000Z"}"#;
        let session: UploadSessionResponse = serde_json::from_str(body).unwrap();

        let err = session.into_upload_url().unwrap_err();
        assert!(err.to_string().starts_with("Upload session creation failed"));
    }

    #[test]
    fn test_session_response_empty_url_fails() {
        let session: UploadSessionResponse =
            serde_json::from_str(r#"{"uploadUrl": ""}"#).unwrap();
        assert!(session.into_upload_url().is_err());
    }

    #[test]
    fn test_progress_percent_rounds_to_nearest() {
        assert_eq!(progress_percent(3, 0), 0);
        assert_eq!(progress_percent(3, 1), 33);
        assert_eq!(progress_percent(3, 2), 67);
        assert_eq!(progress_percent(3, 3), 100);
        // Exact halves round up.
        assert_eq!(progress_percent(200, 1), 1);
        assert_eq!(progress_percent(1000, 5), 1);
    }

    #[test]
    fn test_progress_frames_monotone_and_complete() {
        // Two chunks of a 1 MiB + 100 KiB "file".
        let total = MIB + 100 * 1024;
        let first = Bytes::from(vec![0u8; MIB as usize]);
        let second = Bytes::from(vec![0u8; 100 * 1024]);

        let mut percents = Vec::new();
        for (_, p) in progress_frames(&first, 0, total) {
            percents.push(p);
        }
        for (_, p) in progress_frames(&second, MIB, total) {
            percents.push(p);
        }

        assert!(percents.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*percents.last().unwrap(), 100);

        let bytes: usize = progress_frames(&first, 0, total)
            .iter()
            .map(|(b, _)| b.len())
            .sum();
        assert_eq!(bytes, MIB as usize);
    }

    proptest! {
        #[test]
        fn chunk_partition_covers_file(total in 1u64..600 * MIB) {
            let spans = chunk_spans(total);

            prop_assert_eq!(spans.len() as u64, total.div_ceil(CHUNK_SIZE));
            prop_assert_eq!(spans[0].start, 0);
            prop_assert_eq!(spans[spans.len() - 1].end, total - 1);

            for pair in spans.windows(2) {
                prop_assert_eq!(pair[1].start, pair[0].end + 1);
                prop_assert_eq!(pair[0].len(), CHUNK_SIZE);
            }

            let expected_last = match total % CHUNK_SIZE {
                0 => CHUNK_SIZE,
                rem => rem,
            };
            prop_assert_eq!(spans[spans.len() - 1].len(), expected_last);
            prop_assert_eq!(spans.iter().map(ChunkSpan::len).sum::<u64>(), total);
        }

        #[test]
        fn progress_never_decreases(total in 1u64..10_000u64, step in 1u64..500u64) {
            let mut last = 0u32;
            let mut sent = 0u64;
            while sent < total {
                sent = (sent + step).min(total);
                let percent = progress_percent(total, sent);
                prop_assert!(percent >= last);
                last = percent;
            }
            prop_assert_eq!(last, 100);
        }
    }
}
