use std::time::Duration;

use pada_events::MediaKind;
use web_time::Instant;

use crate::{
    PadaOptions, PadaResult,
    context::{PlayerMetrics, RulesContext},
    decision::{PadaDecision, PadaDiagnostics, PadaReason},
    state::{AdaptationState, Lifecycle},
    store::StateStore,
};

/// Share of the measured segment throughput trusted by the steady-state rule.
pub(crate) const THROUGHPUT_SAFETY: f64 = 0.8;

/// Priority-aware buffer-occupancy ABR rule.
///
/// Holds one [`AdaptationState`] per media kind. Decisions come from
/// [`max_index`](Self::max_index); player events are fed in through the
/// `on_*` handlers or an [`EventSubscription`](crate::EventSubscription).
pub struct PadaRule<M: PlayerMetrics> {
    pub(crate) opts: PadaOptions,
    pub(crate) metrics: M,
    pub(crate) store: StateStore,
}

impl<M: PlayerMetrics> PadaRule<M> {
    pub fn new(opts: PadaOptions, metrics: M) -> Self {
        Self {
            opts,
            metrics,
            store: StateStore::new(),
        }
    }

    /// Like [`new`](Self::new), rejecting unusable options.
    ///
    /// # Errors
    ///
    /// [`PadaError::InvalidOptions`](crate::PadaError::InvalidOptions).
    pub fn try_new(opts: PadaOptions, metrics: M) -> PadaResult<Self> {
        opts.validate()?;
        Ok(Self::new(opts, metrics))
    }

    #[must_use]
    pub fn options(&self) -> &PadaOptions {
        &self.opts
    }

    #[must_use]
    pub fn state(&self, kind: MediaKind) -> Option<&AdaptationState> {
        self.store.get(kind)
    }

    /// Forget every media kind (player reset or teardown).
    pub fn reset(&mut self) {
        tracing::debug!(states = self.store.len(), "PADA: reset");
        self.store.reset_all();
    }

    /// Decide when the caller could not assemble a full context.
    pub fn max_index_checked(
        &mut self,
        ctx: PadaResult<RulesContext<'_>>,
        now: Instant,
    ) -> PadaDecision {
        match ctx {
            Ok(ctx) => self.max_index(&ctx, now),
            Err(err) => {
                tracing::warn!(%err, "PADA decide: incomplete context");
                PadaDecision::no_change(PadaReason::MissingContext, PadaDiagnostics::default())
            }
        }
    }

    /// Quality index to request next for `ctx`'s media kind.
    pub fn max_index(&mut self, ctx: &RulesContext<'_>, now: Instant) -> PadaDecision {
        let kind = ctx.media_kind();
        if !ctx.use_buffer_occupancy_abr {
            return PadaDecision::no_change(PadaReason::Disabled, PadaDiagnostics::default());
        }
        ctx.schedule.set_time_to_load_delay(Duration::ZERO);

        let stable = self.metrics.stable_buffer_time_secs();
        let buffer_level = self.metrics.buffer_level_secs(kind);
        let opts = &self.opts;
        let (state, created) = self.store.get_or_create(kind, || {
            AdaptationState::new(
                kind,
                &ctx.media_info.bitrates,
                ctx.abr.priority(),
                stable,
                opts,
            )
        });
        if !created {
            state.retarget(stable, buffer_level, opts);
        }

        let mut diagnostics = PadaDiagnostics {
            lifecycle: Some(state.lifecycle),
            buffer_level_secs: Some(buffer_level),
            ..PadaDiagnostics::default()
        };

        if state.lifecycle == Lifecycle::SingleBitrate {
            return PadaDecision::no_change(PadaReason::SingleBitrate, diagnostics);
        }

        let is_live = ctx.is_live();
        let Some(throughput) = ctx.throughput.average_throughput_bps(kind, is_live) else {
            tracing::debug!(%kind, buffer_level, "PADA decide: NoEstimate");
            return PadaDecision::no_change(PadaReason::NoEstimate, diagnostics);
        };
        let safe_throughput = ctx
            .throughput
            .safe_average_throughput_bps(kind, is_live)
            .unwrap_or(throughput);
        let latency = ctx.throughput.average_latency_secs(kind);
        diagnostics.latency_secs = latency;

        if let Err(err) = state.check() {
            tracing::warn!(%kind, %err, "PADA decide: invalid state, recovering");
            let quality = state.clamp_quality(ctx.abr.quality_for_bitrate(
                ctx.media_info,
                safe_throughput,
                ctx.stream_id(),
                latency,
            ));
            let changed = state.last_quality != Some(quality);
            state.recover();
            diagnostics.lifecycle = Some(state.lifecycle);
            diagnostics.throughput_bps = Some(safe_throughput);
            return PadaDecision {
                target_quality: Some(quality),
                reason: PadaReason::Recovered,
                changed,
                diagnostics,
            };
        }

        match state.lifecycle {
            Lifecycle::Startup => decide_startup(
                state,
                ctx,
                safe_throughput,
                latency,
                buffer_level,
                diagnostics,
            ),
            Lifecycle::Steady => decide_steady(
                state,
                opts,
                throughput,
                buffer_level,
                now,
                diagnostics,
            ),
            Lifecycle::SingleBitrate => {
                PadaDecision::no_change(PadaReason::SingleBitrate, diagnostics)
            }
        }
    }
}

fn decide_startup(
    state: &mut AdaptationState,
    ctx: &RulesContext<'_>,
    safe_throughput: f64,
    latency: Option<f64>,
    buffer_level: f64,
    mut diagnostics: PadaDiagnostics,
) -> PadaDecision {
    let kind = state.kind;
    let quality = state.clamp_quality(ctx.abr.quality_for_bitrate(
        ctx.media_info,
        safe_throughput,
        ctx.stream_id(),
        latency,
    ));
    let min_level = state.min_buffer_level_for_quality(quality).unwrap_or(0.0);
    state.placeholder.set(min_level - buffer_level);

    let changed = state.last_quality != Some(quality);
    state.last_quality = Some(quality);
    state.last_segment_quality = Some(quality);

    if let Some(duration) = state.segment.last_segment_duration
        && buffer_level >= duration
    {
        state.lifecycle = Lifecycle::Steady;
        tracing::info!(%kind, buffer_level, quality, "PADA: startup complete, steady");
    }

    tracing::debug!(
        %kind,
        quality,
        safe_throughput,
        buffer_level,
        min_level,
        placeholder = state.placeholder.secs(),
        "PADA decide: Startup"
    );

    diagnostics.throughput_bps = Some(safe_throughput);
    diagnostics.placeholder_secs = Some(state.placeholder.secs());
    PadaDecision {
        target_quality: Some(quality),
        reason: PadaReason::Startup,
        changed,
        diagnostics,
    }
}

fn decide_steady(
    state: &mut AdaptationState,
    opts: &PadaOptions,
    average_throughput: f64,
    buffer_level: f64,
    now: Instant,
    mut diagnostics: PadaDiagnostics,
) -> PadaDecision {
    let kind = state.kind;

    let finish_at = state.segment.last_segment_finish_at.take();
    let grown = state
        .placeholder
        .grow_for_delay(finish_at, state.last_call_at, now);
    state.last_call_at = Some(now);
    state.segment.last_segment_start = None;
    state.segment.last_segment_request_at = None;

    let base = state.step_base_quality();
    let throughput = segment_throughput(state, base).unwrap_or(average_throughput);
    state.last_throughput_bps = Some(throughput);

    let placeholder = state.placeholder.secs();
    let effective = buffer_level + placeholder;
    diagnostics.throughput_bps = Some(throughput);
    diagnostics.placeholder_secs = Some(placeholder);

    let (quality, reason) = match kind {
        MediaKind::Audio => (state.top_quality(), PadaReason::TopQuality),
        MediaKind::Video => {
            let fragment_duration = state
                .last_download
                .map(|d| d.fragment_duration_secs)
                .or(state.segment.last_segment_duration)
                .unwrap_or(0.0);
            select_video_quality(
                &state.bitrates,
                base,
                effective,
                throughput,
                fragment_duration,
                opts.minimum_buffer_secs,
            )
        }
        MediaKind::Other => {
            tracing::debug!(%kind, "PADA decide: UnsupportedMedia");
            return PadaDecision::no_change(PadaReason::UnsupportedMedia, diagnostics);
        }
    };

    let delay = state
        .max_buffer_level_for_quality(quality)
        .map_or(0.0, |max_level| (effective - max_level).max(0.0));
    diagnostics.delay_secs = Some(delay);

    let changed = state.last_quality != Some(quality);
    if changed {
        state.quality_switches += 1;
    }
    state.last_quality = Some(quality);

    tracing::debug!(
        %kind,
        base,
        quality,
        ?reason,
        throughput,
        buffer_level,
        placeholder,
        grown,
        effective,
        delay,
        "PADA decide: Steady"
    );

    PadaDecision {
        target_quality: Some(quality),
        reason,
        changed,
        diagnostics,
    }
}

/// Throughput implied by the last completed download, discounted by
/// [`THROUGHPUT_SAFETY`] and expressed at the bitrate of `base`.
fn segment_throughput(state: &AdaptationState, base: usize) -> Option<f64> {
    let download = state.last_download?;
    let secs = download.download_secs();
    if secs <= 0.0 || download.fragment_duration_secs <= 0.0 {
        return None;
    }
    #[expect(clippy::cast_precision_loss)] // bitrate precision loss is negligible for ABR
    let bitrate = state.bitrates[base] as f64;
    Some(THROUGHPUT_SAFETY * bitrate * download.fragment_duration_secs / secs)
}

/// Steady-state video rule.
///
/// Below `min_buffer` falls to the lowest quality, at or above twice it jumps
/// to the top. In between it moves one step from `base`, and only steps down
/// from the top when the next download would eat into the minimum buffer at a
/// throughput below the current bitrate.
pub(crate) fn select_video_quality(
    bitrates: &[u64],
    base: usize,
    effective: f64,
    throughput: f64,
    fragment_duration: f64,
    min_buffer: f64,
) -> (usize, PadaReason) {
    let top = bitrates.len().saturating_sub(1);
    let base = base.min(top);

    if effective < min_buffer {
        return (0, PadaReason::BelowMinimumBuffer);
    }
    if effective >= 2.0 * min_buffer {
        return (top, PadaReason::TopQuality);
    }

    let step_up = || {
        if base < top {
            (base + 1, PadaReason::StepUp)
        } else {
            (top, PadaReason::Hold)
        }
    };

    #[expect(clippy::cast_precision_loss)] // bitrate precision loss is negligible for ABR
    let base_bitrate = bitrates[base] as f64;
    let download_time = if throughput > 0.0 {
        base_bitrate * fragment_duration / throughput
    } else {
        f64::INFINITY
    };

    if effective - download_time >= min_buffer {
        return step_up();
    }
    if throughput < base_bitrate {
        if base == top {
            (top.saturating_sub(1), PadaReason::StepDown)
        } else {
            (base, PadaReason::Hold)
        }
    } else {
        step_up()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use unimock::{MockFn, Unimock, matching};

    use super::*;
    use crate::{
        context::{MediaInfo, PlayerMetricsMock, StreamInfo},
        state::CompletedDownload,
        testing::{FakeAbr, FakePlayerMetrics, FakeSchedule, FakeThroughput},
    };

    const EPS: f64 = 1e-9;
    const LADDER: [u64; 4] = [500_000, 1_000_000, 2_000_000, 4_000_000];

    struct Harness {
        media: MediaInfo,
        stream: StreamInfo,
        throughput: FakeThroughput,
        abr: FakeAbr,
        schedule: FakeSchedule,
    }

    impl Harness {
        fn new(kind: MediaKind, ladder: &[u64]) -> Self {
            Self {
                media: MediaInfo::new(kind, ladder.to_vec()),
                stream: StreamInfo {
                    id: "p0".to_string(),
                    is_live: false,
                },
                throughput: FakeThroughput::ready(3_000_000.0),
                abr: FakeAbr::default(),
                schedule: FakeSchedule::default(),
            }
        }

        fn ctx(&self) -> RulesContext<'_> {
            RulesContext {
                media_info: &self.media,
                stream_info: Some(&self.stream),
                use_buffer_occupancy_abr: true,
                throughput: &self.throughput,
                abr: &self.abr,
                schedule: &self.schedule,
            }
        }
    }

    fn steady_video<M: PlayerMetrics>(rule: &mut PadaRule<M>, h: &Harness, quality: usize) {
        let now = Instant::now();
        rule.max_index(&h.ctx(), now);
        let state = rule.store.get_mut(MediaKind::Video).unwrap();
        state.lifecycle = Lifecycle::Steady;
        state.last_quality = Some(quality);
        state.last_segment_quality = Some(quality);
        state.placeholder.reset();
    }

    #[rstest]
    #[case("below_minimum", 1, 9.0, 1_000_000.0, 2.0, 0, PadaReason::BelowMinimumBuffer)]
    #[case("twice_minimum", 1, 20.0, 1_000_000.0, 2.0, 3, PadaReason::TopQuality)]
    #[case("exactly_minimum_steps_up", 1, 10.0, 8_000_000.0, 2.0, 2, PadaReason::StepUp)]
    #[case("comfortable_steps_up", 1, 15.0, 2_000_000.0, 2.0, 2, PadaReason::StepUp)]
    #[case("comfortable_at_top_holds", 3, 15.0, 8_000_000.0, 2.0, 3, PadaReason::Hold)]
    #[case("at_risk_slow_at_top_steps_down", 3, 11.0, 2_000_000.0, 4.0, 2, PadaReason::StepDown)]
    #[case("at_risk_slow_below_top_holds", 1, 10.5, 500_000.0, 4.0, 1, PadaReason::Hold)]
    #[case("at_risk_fast_steps_up", 1, 10.5, 1_000_000.0, 4.0, 2, PadaReason::StepUp)]
    #[case("at_risk_fast_at_top_holds", 3, 11.0, 4_000_000.0, 8.0, 3, PadaReason::Hold)]
    #[case("zero_throughput_at_top", 3, 12.0, 0.0, 4.0, 2, PadaReason::StepDown)]
    fn video_selection(
        #[case] _name: &str,
        #[case] base: usize,
        #[case] effective: f64,
        #[case] throughput: f64,
        #[case] fragment_duration: f64,
        #[case] expected: usize,
        #[case] expected_reason: PadaReason,
    ) {
        let (quality, reason) =
            select_video_quality(&LADDER, base, effective, throughput, fragment_duration, 10.0);
        assert_eq!(quality, expected);
        assert_eq!(reason, expected_reason);
    }

    #[test]
    fn disabled_returns_no_change_without_touching_state() {
        let h = Harness::new(MediaKind::Video, &LADDER);
        let mut rule = PadaRule::new(PadaOptions::default(), FakePlayerMetrics::new(0.0, 20.0));
        let mut ctx = h.ctx();
        ctx.use_buffer_occupancy_abr = false;

        let d = rule.max_index(&ctx, Instant::now());

        assert_eq!(d.reason, PadaReason::Disabled);
        assert!(d.is_no_change());
        assert!(rule.state(MediaKind::Video).is_none());
        assert_eq!(h.schedule.last_delay(), None);
    }

    #[test]
    fn missing_context_is_no_change() {
        let mut rule = PadaRule::new(PadaOptions::default(), FakePlayerMetrics::new(0.0, 20.0));
        let d = rule.max_index_checked(RulesContext::builder().build(), Instant::now());
        assert_eq!(d.reason, PadaReason::MissingContext);
        assert!(d.is_no_change());
    }

    #[test]
    fn single_bitrate_ladder_never_decides() {
        let h = Harness::new(MediaKind::Video, &[800_000]);
        let mut rule = PadaRule::new(PadaOptions::default(), FakePlayerMetrics::new(30.0, 20.0));

        for _ in 0..3 {
            let d = rule.max_index(&h.ctx(), Instant::now());
            assert_eq!(d.reason, PadaReason::SingleBitrate);
            assert!(d.is_no_change());
        }
        assert_eq!(
            rule.state(MediaKind::Video).unwrap().lifecycle(),
            Lifecycle::SingleBitrate
        );
    }

    #[test]
    fn no_throughput_is_no_change() {
        let mut h = Harness::new(MediaKind::Video, &LADDER);
        h.throughput = FakeThroughput::not_ready();
        let mut rule = PadaRule::new(PadaOptions::default(), FakePlayerMetrics::new(0.0, 20.0));

        let d = rule.max_index(&h.ctx(), Instant::now());

        assert_eq!(d.reason, PadaReason::NoEstimate);
        assert!(d.is_no_change());
        assert_eq!(
            rule.state(MediaKind::Video).unwrap().lifecycle(),
            Lifecycle::Startup
        );
    }

    #[test]
    fn startup_uses_mapper_and_primes_placeholder() {
        let h = Harness::new(MediaKind::Video, &LADDER);
        let metrics = Unimock::new((
            PlayerMetricsMock::stable_buffer_time_secs
                .each_call(matching!())
                .returns(20.0),
            PlayerMetricsMock::buffer_level_secs
                .each_call(matching!(MediaKind::Video))
                .returns(0.0),
        ));
        let mut rule = PadaRule::new(PadaOptions::default(), metrics);

        let d = rule.max_index(&h.ctx(), Instant::now());

        // 3 Mbit/s maps to the 2 Mbit/s rung
        assert_eq!(d.target_quality, Some(2));
        assert_eq!(d.reason, PadaReason::Startup);
        assert!(d.changed);

        let state = rule.state(MediaKind::Video).unwrap();
        let min_level = state.min_buffer_level_for_quality(2).unwrap();
        assert!(min_level > 0.0);
        assert!((state.placeholder_secs() - min_level).abs() < EPS);
        assert_eq!(state.last_quality(), Some(2));
        assert_eq!(state.lifecycle(), Lifecycle::Startup);
        assert_eq!(h.schedule.last_delay(), Some(Duration::ZERO));
    }

    #[test]
    fn diagnostics_carry_latency_and_buffer() {
        let h = Harness::new(MediaKind::Video, &LADDER);
        h.throughput.set_latency(Some(0.25));
        let mut rule = PadaRule::new(PadaOptions::default(), FakePlayerMetrics::new(3.0, 20.0));

        let d = rule.max_index(&h.ctx(), Instant::now());

        assert_eq!(d.diagnostics.latency_secs, Some(0.25));
        assert_eq!(d.diagnostics.buffer_level_secs, Some(3.0));
        assert_eq!(d.diagnostics.throughput_bps, Some(3_000_000.0));
        assert_eq!(d.diagnostics.delay_secs, None);
    }

    #[test]
    fn startup_enters_steady_once_a_segment_is_buffered() {
        let h = Harness::new(MediaKind::Video, &LADDER);
        let metrics = FakePlayerMetrics::new(0.0, 20.0);
        let mut rule = PadaRule::new(PadaOptions::default(), &metrics);
        let now = Instant::now();

        rule.max_index(&h.ctx(), now);
        rule.store
            .get_mut(MediaKind::Video)
            .unwrap()
            .segment
            .record_fragment(0.0, 4.0);

        metrics.set_buffer_level(MediaKind::Video, 3.9);
        rule.max_index(&h.ctx(), now);
        assert_eq!(
            rule.state(MediaKind::Video).unwrap().lifecycle(),
            Lifecycle::Startup
        );

        metrics.set_buffer_level(MediaKind::Video, 4.0);
        let d = rule.max_index(&h.ctx(), now);
        assert_eq!(d.reason, PadaReason::Startup);
        assert_eq!(
            rule.state(MediaKind::Video).unwrap().lifecycle(),
            Lifecycle::Steady
        );
    }

    #[test]
    fn startup_quality_is_clamped_to_filtered_ladder() {
        let mut h = Harness::new(MediaKind::Video, &[250_000, 500_000, 1_000_000, 2_000_000, 4_000_000]);
        h.abr = FakeAbr::with_priority(1);
        h.throughput = FakeThroughput::ready(10_000_000.0);
        let mut rule = PadaRule::new(PadaOptions::default(), FakePlayerMetrics::new(0.0, 20.0));

        let d = rule.max_index(&h.ctx(), Instant::now());

        assert_eq!(d.target_quality, Some(1));
        assert_eq!(rule.state(MediaKind::Video).unwrap().bitrates(), &[250_000, 500_000]);
    }

    #[test]
    fn steady_audio_always_picks_top() {
        let h = Harness::new(MediaKind::Audio, &[64_000, 128_000, 256_000]);
        let metrics = FakePlayerMetrics::new(1.0, 20.0);
        let mut rule = PadaRule::new(PadaOptions::default(), &metrics);
        let now = Instant::now();
        rule.max_index(&h.ctx(), now);
        let state = rule.store.get_mut(MediaKind::Audio).unwrap();
        state.lifecycle = Lifecycle::Steady;
        state.last_quality = Some(0);

        let d = rule.max_index(&h.ctx(), now);

        assert_eq!(d.target_quality, Some(2));
        assert_eq!(d.reason, PadaReason::TopQuality);
        assert!(d.changed);
    }

    #[test]
    fn steady_other_media_is_no_change() {
        let h = Harness::new(MediaKind::Other, &[100_000, 200_000]);
        let mut rule = PadaRule::new(PadaOptions::default(), FakePlayerMetrics::new(15.0, 20.0));
        let now = Instant::now();
        rule.max_index(&h.ctx(), now);
        let state = rule.store.get_mut(MediaKind::Other).unwrap();
        state.lifecycle = Lifecycle::Steady;
        state.last_quality = Some(0);

        let d = rule.max_index(&h.ctx(), now);
        assert_eq!(d.reason, PadaReason::UnsupportedMedia);
        assert!(d.is_no_change());
    }

    #[test]
    fn steady_low_buffer_drops_to_lowest() {
        let h = Harness::new(MediaKind::Video, &LADDER);
        let metrics = FakePlayerMetrics::new(0.0, 20.0);
        let mut rule = PadaRule::new(PadaOptions::default(), &metrics);
        steady_video(&mut rule, &h, 2);
        metrics.set_buffer_level(MediaKind::Video, 9.0);

        let d = rule.max_index(&h.ctx(), Instant::now());

        assert_eq!(d.target_quality, Some(0));
        assert_eq!(d.reason, PadaReason::BelowMinimumBuffer);
        let state = rule.state(MediaKind::Video).unwrap();
        assert_eq!(state.quality_switches(), 1);
    }

    #[test]
    fn steady_uses_last_download_for_throughput() {
        let h = Harness::new(MediaKind::Video, &LADDER);
        let metrics = FakePlayerMetrics::new(0.0, 20.0);
        let mut rule = PadaRule::new(PadaOptions::default(), &metrics);
        steady_video(&mut rule, &h, 1);
        metrics.set_buffer_level(MediaKind::Video, 12.0);

        let t0 = Instant::now();
        rule.store.get_mut(MediaKind::Video).unwrap().last_download = Some(CompletedDownload {
            fragment_duration_secs: 4.0,
            request_at: t0,
            finish_at: t0 + Duration::from_secs(2),
        });

        let d = rule.max_index(&h.ctx(), t0 + Duration::from_secs(2));

        // 0.8 * 1 Mbit/s * 4s / 2s
        let expected = 1_600_000.0;
        assert!((d.diagnostics.throughput_bps.unwrap() - expected).abs() < EPS);
        assert_eq!(
            rule.state(MediaKind::Video).unwrap().last_throughput_bps(),
            Some(expected)
        );
        // download time 2.5s leaves 9.5s < 10s and throughput >= bitrate
        assert_eq!(d.target_quality, Some(2));
        assert_eq!(d.reason, PadaReason::StepUp);
    }

    #[test]
    fn steady_grows_placeholder_by_call_gap() {
        let h = Harness::new(MediaKind::Video, &LADDER);
        let metrics = FakePlayerMetrics::new(12.0, 20.0);
        let mut rule = PadaRule::new(PadaOptions::default(), &metrics);
        steady_video(&mut rule, &h, 1);

        let t0 = Instant::now();
        rule.max_index(&h.ctx(), t0);
        let before = rule.state(MediaKind::Video).unwrap().placeholder_secs();
        rule.max_index(&h.ctx(), t0 + Duration::from_millis(1500));
        let after = rule.state(MediaKind::Video).unwrap().placeholder_secs();

        assert!((after - before - 1.5).abs() < EPS);
    }

    #[test]
    fn repeated_calls_are_idempotent_without_events() {
        let h = Harness::new(MediaKind::Video, &LADDER);
        let metrics = FakePlayerMetrics::new(12.0, 20.0);
        let mut rule = PadaRule::new(PadaOptions::default(), &metrics);
        steady_video(&mut rule, &h, 1);
        let now = Instant::now();

        let first = rule.max_index(&h.ctx(), now);
        let second = rule.max_index(&h.ctx(), now);

        assert_eq!(first.target_quality, second.target_quality);
        assert!(!second.changed);
        assert_eq!(rule.state(MediaKind::Video).unwrap().quality_switches(), 1);
    }

    #[test]
    fn delay_is_reported_when_buffer_exceeds_ceiling() {
        let h = Harness::new(MediaKind::Video, &LADDER);
        let metrics = FakePlayerMetrics::new(40.0, 20.0);
        let mut rule = PadaRule::new(PadaOptions::default(), &metrics);
        steady_video(&mut rule, &h, 3);

        let d = rule.max_index(&h.ctx(), Instant::now());

        let ceiling = rule
            .state(MediaKind::Video)
            .unwrap()
            .max_buffer_level_for_quality(3)
            .unwrap();
        assert_eq!(d.target_quality, Some(3));
        assert!((d.diagnostics.delay_secs.unwrap() - (40.0 - ceiling)).abs() < EPS);
        assert_eq!(h.schedule.last_delay(), Some(Duration::ZERO));
    }

    #[test]
    fn invalid_state_recovers_through_mapper() {
        let h = Harness::new(MediaKind::Video, &LADDER);
        let mut rule = PadaRule::new(PadaOptions::default(), FakePlayerMetrics::new(5.0, 20.0));
        rule.max_index(&h.ctx(), Instant::now());
        let state = rule.store.get_mut(MediaKind::Video).unwrap();
        state.lifecycle = Lifecycle::Steady;
        state.last_quality = Some(42);

        let d = rule.max_index(&h.ctx(), Instant::now());

        assert_eq!(d.reason, PadaReason::Recovered);
        assert_eq!(d.target_quality, Some(2));
        let state = rule.state(MediaKind::Video).unwrap();
        assert_eq!(state.lifecycle(), Lifecycle::Startup);
        assert!(state.check().is_ok());
    }

    #[test]
    fn stable_target_change_rescales_placeholder() {
        let h = Harness::new(MediaKind::Video, &LADDER);
        let metrics = FakePlayerMetrics::new(12.0, 20.0);
        let mut rule = PadaRule::new(PadaOptions::default(), &metrics);
        steady_video(&mut rule, &h, 1);
        rule.store
            .get_mut(MediaKind::Video)
            .unwrap()
            .placeholder
            .set(4.0);
        let old_vp = rule.state(MediaKind::Video).unwrap().model().unwrap().params().vp;

        metrics.set_stable_buffer_time(40.0);
        let now = Instant::now();
        rule.store.get_mut(MediaKind::Video).unwrap().last_call_at = Some(now);
        rule.max_index(&h.ctx(), now);

        let state = rule.state(MediaKind::Video).unwrap();
        let new_vp = state.model().unwrap().params().vp;
        let expected = (12.0 + 4.0 - 10.0) * new_vp / old_vp + 10.0 - 12.0;
        assert!((state.placeholder_secs() - expected).abs() < EPS);
    }

    #[test]
    fn reset_forgets_every_kind() {
        let h = Harness::new(MediaKind::Video, &LADDER);
        let mut rule = PadaRule::new(PadaOptions::default(), FakePlayerMetrics::new(0.0, 20.0));
        rule.max_index(&h.ctx(), Instant::now());
        assert!(rule.state(MediaKind::Video).is_some());

        rule.reset();
        assert!(rule.state(MediaKind::Video).is_none());
    }

    #[test]
    fn try_new_rejects_bad_options() {
        let opts = PadaOptions {
            minimum_buffer_secs: 0.0,
            ..PadaOptions::default()
        };
        assert!(PadaRule::try_new(opts, FakePlayerMetrics::new(0.0, 20.0)).is_err());
    }
}
