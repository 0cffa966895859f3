use std::{cell::Cell, time::Duration};

use kithara_abr_rules::{
    AbandonmentState, AbrSupport, BufferState, BufferStateSample, CustomRule, EwmaThroughputHistory,
    FragmentProgress, MediaInfo, MediaMetrics, MediaType, Priority, QualitySwitchRule,
    RulesCollection, RulesContext, RulesOptions, RulesState, ScheduleControl, StreamInfo,
    SwitchRequest, ThroughputHistory, ThroughputSample, ThroughputSampleSource, ladder,
};
use rstest::*;
use web_time::Instant;

// Host fakes

struct Player {
    history: EwmaThroughputHistory,
    abandoning: Option<MediaType>,
}

impl Player {
    fn new() -> Self {
        Self {
            history: EwmaThroughputHistory::new(),
            abandoning: None,
        }
    }

    /// Steady 4 Mbit/s downloads with 40 ms latency.
    fn with_video_downloads(mut self) -> Self {
        for _ in 0..8 {
            self.history.push_sample(
                MediaType::Video,
                ThroughputSample {
                    bytes: 500_000,
                    duration: Duration::from_secs(1),
                    latency: Duration::from_millis(40),
                    source: ThroughputSampleSource::Network,
                },
            );
        }
        self
    }
}

impl AbrSupport for Player {
    fn throughput_history(&self) -> &dyn ThroughputHistory {
        &self.history
    }

    fn abandonment_state(&self, media_type: MediaType) -> AbandonmentState {
        if self.abandoning == Some(media_type) {
            AbandonmentState::Abandoning
        } else {
            AbandonmentState::Allowed
        }
    }

    fn quality_for_bitrate(&self, info: &MediaInfo, kbps: f64, latency_ms: f64) -> usize {
        ladder::quality_for_bitrate(info, kbps, latency_ms)
    }
}

#[derive(Default)]
struct Scheduler {
    delay_clears: Cell<usize>,
}

impl ScheduleControl for Scheduler {
    fn clear_load_delay(&self) {
        self.delay_clears.set(self.delay_clears.get() + 1);
    }
}

#[fixture]
fn video() -> MediaInfo {
    MediaInfo::new(
        MediaType::Video,
        vec![500_000, 1_000_000, 2_000_000, 4_000_000],
        Duration::from_secs(4),
    )
}

#[fixture]
fn audio() -> MediaInfo {
    MediaInfo::new(
        MediaType::Audio,
        vec![64_000, 128_000, 256_000],
        Duration::from_secs(4),
    )
}

fn metrics(state: BufferState, buffer_secs: u64) -> MediaMetrics {
    MediaMetrics {
        buffer_states: vec![BufferStateSample {
            state,
            target: Duration::from_secs(12),
        }],
        buffer_level: Some(Duration::from_secs(buffer_secs)),
        ..MediaMetrics::default()
    }
}

fn collection(media_type: MediaType, options: &RulesOptions) -> RulesCollection {
    let mut rules = RulesCollection::new(media_type);
    rules.initialize(options);
    assert_eq!(rules.state(), RulesState::Ready);
    rules
}

#[rstest]
fn throughput_then_stall_drives_video_quality(video: MediaInfo) {
    let player = Player::new().with_video_downloads();
    let scheduler = Scheduler::default();
    let mut rules = collection(MediaType::Video, &RulesOptions::default());
    let now = Instant::now();

    // 3.6 Mbit/s safe, less 1% latency overhead: the 2 Mbit/s rung
    let loaded = metrics(BufferState::Loaded, 8);
    let ctx = RulesContext::new(&video, &player, &scheduler, now).with_metrics(&loaded);
    assert_eq!(
        rules.evaluate_quality(&ctx),
        SwitchRequest::new(2, Priority::Default)
    );
    assert_eq!(scheduler.delay_clears.get(), 1);

    let stalled = metrics(BufferState::Empty, 0);
    let ctx = RulesContext::new(&video, &player, &scheduler, now).with_metrics(&stalled);
    assert_eq!(
        rules.evaluate_quality(&ctx),
        SwitchRequest::new(0, Priority::Default)
    );
    // static stream with a starved buffer: throughput abstained
    assert_eq!(scheduler.delay_clears.get(), 1);
}

#[rstest]
fn live_stream_keeps_switching_on_throughput(video: MediaInfo) {
    let player = Player::new().with_video_downloads();
    let scheduler = Scheduler::default();
    let stream = StreamInfo {
        id: "live".to_owned(),
        is_dynamic: true,
    };
    let mut rules = collection(MediaType::Video, &RulesOptions::default());
    let initial = metrics(BufferState::Empty, 0);
    let ctx = RulesContext::new(&video, &player, &scheduler, Instant::now())
        .with_stream_info(&stream)
        .with_metrics(&initial);

    // first fill is not a stall, so only the throughput vote counts
    assert_eq!(rules.evaluate_quality(&ctx).quality, Some(2));
    assert_eq!(scheduler.delay_clears.get(), 1);
}

#[rstest]
fn pipelines_are_independent(video: MediaInfo, audio: MediaInfo) {
    let player = Player::new().with_video_downloads();
    let scheduler = Scheduler::default();
    let options = RulesOptions::default();
    let mut video_rules = collection(MediaType::Video, &options);
    let mut audio_rules = collection(MediaType::Audio, &options);
    let loaded = metrics(BufferState::Loaded, 8);
    let now = Instant::now();

    let video_ctx = RulesContext::new(&video, &player, &scheduler, now).with_metrics(&loaded);
    let audio_ctx = RulesContext::new(&audio, &player, &scheduler, now).with_metrics(&loaded);

    assert_eq!(video_rules.evaluate_quality(&video_ctx).quality, Some(2));
    // nothing measured for audio yet
    let audio_vote = audio_rules.evaluate_quality(&audio_ctx);
    assert_eq!(audio_vote, SwitchRequest::no_change());

    video_rules.reset();
    assert_eq!(video_rules.state(), RulesState::Empty);
    assert_eq!(audio_rules.state(), RulesState::Ready);
    assert_eq!(audio_rules.quality_rule_names().len(), 4);
}

#[rstest]
fn abandoning_media_type_suppresses_throughput_vote(video: MediaInfo) {
    let mut player = Player::new().with_video_downloads();
    player.abandoning = Some(MediaType::Video);
    let scheduler = Scheduler::default();
    let mut rules = collection(MediaType::Video, &RulesOptions::default());
    let loaded = metrics(BufferState::Loaded, 8);
    let ctx = RulesContext::new(&video, &player, &scheduler, Instant::now()).with_metrics(&loaded);

    assert_eq!(rules.evaluate_quality(&ctx), SwitchRequest::no_change());
    assert_eq!(scheduler.delay_clears.get(), 0);
}

#[rstest]
fn slow_fragment_is_abandoned_once(video: MediaInfo) {
    let player = Player::new();
    let scheduler = Scheduler::default();
    let mut rules = collection(MediaType::Video, &RulesOptions::default());
    let t0 = Instant::now();
    let now = t0 + Duration::from_secs(1);
    let downloading = MediaMetrics {
        in_flight: Some(FragmentProgress {
            index: 7,
            quality: 3,
            bytes_loaded: 50_000,
            bytes_total: 2_000_000,
            requested_at: t0,
            first_byte_at: Some(t0),
        }),
        ..metrics(BufferState::Loaded, 6)
    };
    let ctx = RulesContext::new(&video, &player, &scheduler, now).with_metrics(&downloading);

    let decisions: Vec<SwitchRequest> = (0..8).map(|_| rules.evaluate_abandonment(&ctx)).collect();
    let active: Vec<&SwitchRequest> = decisions.iter().filter(|d| d.is_active()).collect();

    assert_eq!(active, [&SwitchRequest::new(0, Priority::Strong)]);
    assert!(decisions[..4].iter().all(|d| !d.is_active()));
}

#[rstest]
fn buffer_occupancy_mode_tracks_buffer_within_throughput(video: MediaInfo) {
    let player = Player::new().with_video_downloads();
    let scheduler = Scheduler::default();
    let options = RulesOptions::default().with_buffer_occupancy_enabled(true);
    let mut rules = collection(MediaType::Video, &options);
    let now = Instant::now();

    let empty = metrics(BufferState::Loaded, 0);
    let ctx = RulesContext::new(&video, &player, &scheduler, now).with_metrics(&empty);
    assert_eq!(rules.evaluate_quality(&ctx).quality, Some(0));

    // buffer alone would pick the top rung; throughput sustains rung 2
    let full = metrics(BufferState::Loaded, 30);
    let ctx = RulesContext::new(&video, &player, &scheduler, now).with_metrics(&full);
    assert_eq!(rules.evaluate_quality(&ctx).quality, Some(2));
}

#[rstest]
fn custom_weak_rule_only_decides_when_built_ins_abstain(video: MediaInfo) {
    struct PreferTop;

    impl QualitySwitchRule for PreferTop {
        fn name(&self) -> &'static str {
            "PreferTop"
        }

        fn evaluate_quality(&mut self, ctx: &RulesContext<'_>) -> SwitchRequest {
            match ctx.media_info().top_quality() {
                Some(top) => SwitchRequest::new(top, Priority::Weak),
                None => SwitchRequest::no_change(),
            }
        }
    }

    let prefer_top = CustomRule::quality_switch(|_| Box::new(PreferTop));
    let options = RulesOptions::default().with_custom_rule(prefer_top);
    let scheduler = Scheduler::default();
    let loaded = metrics(BufferState::Loaded, 8);
    let now = Instant::now();

    let cold = Player::new();
    let mut rules = collection(MediaType::Video, &options);
    let ctx = RulesContext::new(&video, &cold, &scheduler, now).with_metrics(&loaded);
    let vote = rules.evaluate_quality(&ctx);
    assert_eq!(vote, SwitchRequest::new(3, Priority::Weak));

    let warm = Player::new().with_video_downloads();
    let ctx = RulesContext::new(&video, &warm, &scheduler, now).with_metrics(&loaded);
    let vote = rules.evaluate_quality(&ctx);
    assert_eq!(vote, SwitchRequest::new(2, Priority::Default));
}
