//! Player notifications that move adaptation state between decisions.

use pada_events::{
    Chunk, Event, EventBus, MediaKind, Metric, PlaybackEvent, StreamEvent,
};
use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::{
    PadaOptions,
    context::PlayerMetrics,
    rule::PadaRule,
    state::{AdaptationState, CompletedDownload, Lifecycle},
};

impl<M: PlayerMetrics> PadaRule<M> {
    /// Playback stalled: every steady state loses its placeholder.
    pub fn on_buffer_empty(&mut self) {
        for state in self.store.iter_mut() {
            if state.lifecycle == Lifecycle::Steady {
                tracing::debug!(
                    kind = %state.kind,
                    placeholder = state.placeholder.secs(),
                    "PADA: buffer empty, placeholder dropped"
                );
                state.placeholder.reset();
            }
        }
    }

    pub fn on_playback_seeking(&mut self) {
        tracing::debug!("PADA: seeking, back to startup");
        self.store.reset_for_seek();
    }

    /// Only media-segment requests that received data are used.
    pub fn on_metric_added(&mut self, kind: MediaKind, metric: &Metric) {
        let Metric::HttpRequest(request) = metric else {
            return;
        };
        if !request.is_media_segment() {
            return;
        }
        let Some(state) = self.store.adaptive_mut(kind) else {
            return;
        };
        state.segment.last_segment_request_at = Some(request.request_at);
        state.segment.last_segment_finish_at = Some(request.finish_at);
        finalize_segment(state, &self.metrics, &self.opts);
    }

    pub fn on_quality_change_requested(&mut self, kind: MediaKind, new_quality: usize) {
        if let Some(state) = self.store.adaptive_mut(kind) {
            state.pending_external_quality = Some(new_quality);
        }
    }

    /// Cap the effective buffer so the next decision does not pick a quality
    /// the abandoned download just proved too expensive.
    pub fn on_fragment_loading_abandoned(&mut self, kind: MediaKind) {
        let Some(state) = self.store.adaptive_mut(kind) else {
            return;
        };
        let want_effective = match state.pending_external_quality {
            Some(quality) if quality > 0 => state
                .min_buffer_level_for_quality(quality)
                .unwrap_or(self.opts.minimum_buffer_secs),
            _ => self.opts.minimum_buffer_secs,
        };
        let buffer_level = self.metrics.buffer_level_secs(kind);
        state.placeholder.cap_effective(want_effective, buffer_level);
        tracing::debug!(
            %kind,
            want_effective,
            buffer_level,
            placeholder = state.placeholder.secs(),
            "PADA: download abandoned"
        );
    }

    pub fn on_media_fragment_loaded(&mut self, chunk: &Chunk) {
        let Some(state) = self.store.adaptive_mut(chunk.media_kind) else {
            return;
        };
        state
            .segment
            .record_fragment(chunk.start_secs, chunk.duration_secs);
        state.last_segment_quality = Some(state.clamp_quality(chunk.quality));
        finalize_segment(state, &self.metrics, &self.opts);
    }

    /// Route a bus event to its handler.
    pub fn handle_event(&mut self, event: &Event) {
        tracing::trace!(?event, "PADA: event");
        match event {
            Event::Playback(PlaybackEvent::BufferEmpty { .. }) => self.on_buffer_empty(),
            Event::Playback(PlaybackEvent::Seeking { .. }) => self.on_playback_seeking(),
            Event::Stream(StreamEvent::MetricAdded { media_kind, metric }) => {
                self.on_metric_added(*media_kind, metric);
            }
            Event::Stream(StreamEvent::QualityChangeRequested {
                media_kind,
                new_quality,
                ..
            }) => self.on_quality_change_requested(*media_kind, *new_quality),
            Event::Stream(StreamEvent::FragmentLoadingAbandoned { media_kind }) => {
                self.on_fragment_loading_abandoned(*media_kind);
            }
            Event::Stream(StreamEvent::MediaFragmentLoaded { chunk }) => {
                self.on_media_fragment_loaded(chunk);
            }
        }
    }

    /// Start receiving events from `bus`. Dropping the subscription
    /// unsubscribes.
    #[must_use]
    pub fn subscribe(&self, bus: &EventBus) -> EventSubscription {
        EventSubscription::new(bus)
    }
}

/// Settle the placeholder once both notifications of a segment are in.
fn finalize_segment<M: PlayerMetrics>(state: &mut AdaptationState, metrics: &M, opts: &PadaOptions) {
    let (Some(request_at), Some(duration)) = (
        state.segment.last_segment_request_at,
        state.segment.last_segment_duration,
    ) else {
        return;
    };
    if !state.segment.is_complete() {
        return;
    }

    state.placeholder.decay(opts.placeholder_decay);

    if let Some(finish_at) = state.segment.last_segment_finish_at {
        let download = CompletedDownload {
            fragment_duration_secs: duration,
            request_at,
            finish_at,
        };
        let buffer_at_request = metrics.buffer_level_secs(state.kind) + download.download_secs();
        if let Some(ceiling) = state.max_buffer_level_for_quality(state.step_base_quality()) {
            state
                .placeholder
                .clamp_to_segment_ceiling(ceiling, buffer_at_request);
        }
        state.last_download = Some(download);
    }

    if state.segment.was_replacement {
        state.placeholder.credit(duration);
    }

    tracing::trace!(
        kind = %state.kind,
        replacement = state.segment.was_replacement,
        placeholder = state.placeholder.secs(),
        "PADA: segment finalized"
    );
    state.segment.last_segment_start = None;
    state.segment.last_segment_request_at = None;
}

/// Receiver side of the engine's event-bus registration.
pub struct EventSubscription {
    rx: broadcast::Receiver<Event>,
}

impl EventSubscription {
    #[must_use]
    pub fn new(bus: &EventBus) -> Self {
        Self {
            rx: bus.subscribe(),
        }
    }

    /// Apply every queued event to `rule`. Returns how many were handled.
    pub fn pump<M: PlayerMetrics>(&mut self, rule: &mut PadaRule<M>) -> usize {
        let mut handled = 0;
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    rule.handle_event(&event);
                    handled += 1;
                }
                Err(TryRecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "PADA: event subscription lagged");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return handled,
            }
        }
    }
}
