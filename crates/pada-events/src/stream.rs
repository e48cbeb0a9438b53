#![forbid(unsafe_code)]

use web_time::Instant;

use crate::MediaKind;

/// Kind of HTTP request recorded by the metrics collector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpRequestKind {
    Manifest,
    InitSegment,
    MediaSegment,
    Other,
}

/// Timing of one completed HTTP request.
#[derive(Clone, Debug, PartialEq)]
pub struct HttpRequest {
    pub kind: HttpRequestKind,
    /// When the request was issued.
    pub request_at: Instant,
    /// When the last byte arrived.
    pub finish_at: Instant,
    /// Number of progress trace entries; zero for requests that never received data.
    pub trace_len: usize,
}

impl HttpRequest {
    /// Whether this request describes a downloaded media segment.
    #[must_use]
    pub fn is_media_segment(&self) -> bool {
        self.kind == HttpRequestKind::MediaSegment && self.trace_len > 0
    }
}

/// A metric recorded by the metrics collector.
#[derive(Clone, Debug, PartialEq)]
pub enum Metric {
    HttpRequest(HttpRequest),
    BufferLevel { level_secs: f64 },
    DroppedFrames { count: u64 },
}

/// A downloaded media segment.
#[derive(Clone, Debug, PartialEq)]
pub struct Chunk {
    pub media_kind: MediaKind,
    /// Presentation start time, seconds.
    pub start_secs: f64,
    /// Presentation duration, seconds.
    pub duration_secs: f64,
    /// Quality index the segment was downloaded at.
    pub quality: usize,
}

/// Events emitted by the streaming (download) side of the player.
#[derive(Clone, Debug, PartialEq)]
pub enum StreamEvent {
    /// The metrics collector recorded a new metric.
    MetricAdded { media_kind: MediaKind, metric: Metric },
    /// Some decision source requested a quality change.
    QualityChangeRequested {
        media_kind: MediaKind,
        old_quality: Option<usize>,
        new_quality: usize,
    },
    /// An in-flight segment download was abandoned.
    FragmentLoadingAbandoned { media_kind: MediaKind },
    /// A media segment finished loading.
    MediaFragmentLoaded { chunk: Chunk },
}

impl StreamEvent {
    #[must_use]
    pub fn media_kind(&self) -> MediaKind {
        match self {
            Self::MetricAdded { media_kind, .. }
            | Self::QualityChangeRequested { media_kind, .. }
            | Self::FragmentLoadingAbandoned { media_kind } => *media_kind,
            Self::MediaFragmentLoaded { chunk } => chunk.media_kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(HttpRequestKind::MediaSegment, 3, true)]
    #[case(HttpRequestKind::MediaSegment, 0, false)]
    #[case(HttpRequestKind::InitSegment, 3, false)]
    #[case(HttpRequestKind::Manifest, 1, false)]
    fn only_traced_media_segments_count(
        #[case] kind: HttpRequestKind,
        #[case] trace_len: usize,
        #[case] expected: bool,
    ) {
        let now = Instant::now();
        let req = HttpRequest {
            kind,
            request_at: now,
            finish_at: now + Duration::from_millis(500),
            trace_len,
        };
        assert_eq!(req.is_media_segment(), expected);
    }

    #[test]
    fn fragment_loaded_reports_chunk_kind() {
        let event = StreamEvent::MediaFragmentLoaded {
            chunk: Chunk {
                media_kind: MediaKind::Audio,
                start_secs: 0.0,
                duration_secs: 4.0,
                quality: 1,
            },
        };
        assert_eq!(event.media_kind(), MediaKind::Audio);
    }
}
