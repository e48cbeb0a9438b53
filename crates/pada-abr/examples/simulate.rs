//! Drive the engine through a simulated VOD session with a bandwidth drop.
//!
//! ```sh
//! RUST_LOG=pada_abr=debug cargo run -p pada-abr --example simulate
//! ```

use std::time::Duration;

use pada_abr::{
    Chunk, EventBus, MediaInfo, MediaKind, PadaOptions, PadaRule, PlaybackEvent, RulesContext,
    StreamEvent, StreamInfo,
    testing::{FakeAbr, FakePlayerMetrics, FakeSchedule, FakeThroughput},
};
use pada_events::{HttpRequest, HttpRequestKind, Metric};
use web_time::Instant;

const SEGMENT_SECS: f64 = 4.0;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let bus = EventBus::new(64);
    let metrics = FakePlayerMetrics::new(0.0, 20.0);
    let mut rule = PadaRule::new(PadaOptions::default(), &metrics);
    let mut subscription = rule.subscribe(&bus);

    let media = MediaInfo::new(
        MediaKind::Video,
        vec![400_000, 800_000, 1_600_000, 3_200_000, 6_400_000],
    );
    if let Err(err) = media.validate_ladder() {
        tracing::error!(%err, "bad ladder");
        return;
    }
    let stream = StreamInfo {
        id: "period-0".to_string(),
        is_live: false,
    };
    let throughput = FakeThroughput::ready(5_000_000.0);
    let abr = FakeAbr::default();
    let schedule = FakeSchedule::default();

    let mut now = Instant::now();
    let mut buffer_level = 0.0_f64;
    let mut quality = 0;

    for segment in 0..40_u32 {
        let link_bps = if (15..25).contains(&segment) {
            900_000.0
        } else {
            5_000_000.0
        };
        throughput.set_bps(Some(link_bps));

        let ctx = RulesContext::builder()
            .media_info(&media)
            .stream_info(&stream)
            .use_buffer_occupancy_abr(true)
            .throughput(&throughput)
            .abr(&abr)
            .schedule(&schedule)
            .build();
        let decision = rule.max_index_checked(ctx, now);
        if let Some(target) = decision.target_quality {
            if target != quality {
                bus.publish(StreamEvent::QualityChangeRequested {
                    media_kind: MediaKind::Video,
                    old_quality: Some(quality),
                    new_quality: target,
                });
            }
            quality = target;
        }

        #[expect(clippy::cast_precision_loss)]
        let bitrate = media.bitrates[quality] as f64;
        let download_secs = bitrate * SEGMENT_SECS / link_bps;
        let request_at = now;
        now += Duration::from_secs_f64(download_secs);

        buffer_level -= download_secs;
        if buffer_level < 0.0 {
            bus.publish(PlaybackEvent::BufferEmpty {
                media_kind: MediaKind::Video,
            });
            buffer_level = 0.0;
        }
        buffer_level += SEGMENT_SECS;
        metrics.set_buffer_level(MediaKind::Video, buffer_level);

        bus.publish(StreamEvent::MediaFragmentLoaded {
            chunk: Chunk {
                media_kind: MediaKind::Video,
                start_secs: f64::from(segment) * SEGMENT_SECS,
                duration_secs: SEGMENT_SECS,
                quality,
            },
        });
        bus.publish(StreamEvent::MetricAdded {
            media_kind: MediaKind::Video,
            metric: Metric::HttpRequest(HttpRequest {
                kind: HttpRequestKind::MediaSegment,
                request_at,
                finish_at: now,
                trace_len: 1,
            }),
        });
        subscription.pump(&mut rule);

        tracing::info!(
            segment,
            link_bps,
            quality,
            buffer_level,
            reason = ?decision.reason,
            placeholder = decision.diagnostics.placeholder_secs,
            "simulate: segment loaded"
        );
    }

    if let Some(state) = rule.state(MediaKind::Video) {
        tracing::info!(
            switches = state.quality_switches(),
            lifecycle = ?state.lifecycle(),
            "simulate: done"
        );
    }
}
