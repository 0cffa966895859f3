//! EWMA-based throughput history.

use std::{
    collections::{HashMap, VecDeque},
    time::Duration,
};

use crate::{context::ThroughputHistory, types::MediaType};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ThroughputSampleSource {
    Network,
    Cache,
}

/// One completed fragment download.
#[derive(Clone, Copy, Debug)]
pub struct ThroughputSample {
    pub bytes: u64,
    /// Transfer time, first byte to last byte.
    pub duration: Duration,
    /// Time from request to first byte.
    pub latency: Duration,
    pub source: ThroughputSampleSource,
}

/// [`ThroughputHistory`] backed by per-media-type fast/slow EWMAs.
///
/// Live and static estimates are tracked side by side with different
/// half-lives; the safe average is the lower of the fast and slow estimate
/// scaled by [`EwmaThroughputHistory::SAFETY_FACTOR`].
#[derive(Clone, Debug, Default)]
pub struct EwmaThroughputHistory {
    per_type: HashMap<MediaType, MediaEstimates>,
}

impl EwmaThroughputHistory {
    const LIVE_FAST_HALF_LIFE_SECS: f64 = 3.0;
    const LIVE_SLOW_HALF_LIFE_SECS: f64 = 8.0;
    const STATIC_FAST_HALF_LIFE_SECS: f64 = 4.0;
    const STATIC_SLOW_HALF_LIFE_SECS: f64 = 8.0;
    const MIN_CHUNK_BYTES: u64 = 16_000;
    const MIN_DURATION_MS: f64 = 0.5;
    const LATENCY_SAMPLES: usize = 4;

    /// Fraction of the estimate considered safe to spend.
    pub const SAFETY_FACTOR: f64 = 0.9;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_sample(&mut self, media_type: MediaType, sample: ThroughputSample) {
        if !matches!(sample.source, ThroughputSampleSource::Network) {
            return;
        }

        let estimates = self.per_type.entry(media_type).or_default();

        estimates
            .latencies_ms
            .push_back(sample.latency.as_secs_f64() * 1000.0);
        while estimates.latencies_ms.len() > Self::LATENCY_SAMPLES {
            estimates.latencies_ms.pop_front();
        }

        if sample.bytes < Self::MIN_CHUNK_BYTES {
            return;
        }

        let dur_ms = (sample.duration.as_secs_f64() * 1000.0).max(Self::MIN_DURATION_MS);
        #[expect(clippy::cast_precision_loss)] // byte counts far below 2^52
        let bps = (sample.bytes as f64) * 8000.0 / dur_ms;
        let weight_secs = dur_ms / 1000.0;

        estimates.live.add_sample(weight_secs, bps);
        estimates.static_.add_sample(weight_secs, bps);
    }

    /// Forget all measurements (e.g. on period change).
    pub fn reset(&mut self) {
        self.per_type.clear();
    }

    /// Unscaled estimate in bits per second.
    pub fn estimate_bps(&self, media_type: MediaType, is_dynamic: bool) -> Option<f64> {
        let estimates = self.per_type.get(&media_type)?;
        let pair = if is_dynamic {
            &estimates.live
        } else {
            &estimates.static_
        };
        pair.estimate_bps()
    }
}

impl ThroughputHistory for EwmaThroughputHistory {
    fn safe_average_throughput(&self, media_type: MediaType, is_dynamic: bool) -> Option<f64> {
        self.estimate_bps(media_type, is_dynamic)
            .map(|bps| bps * Self::SAFETY_FACTOR / 1000.0)
    }

    fn average_latency(&self, media_type: MediaType) -> Option<f64> {
        let latencies = &self.per_type.get(&media_type)?.latencies_ms;
        if latencies.is_empty() {
            return None;
        }
        #[expect(clippy::cast_precision_loss)] // at most LATENCY_SAMPLES entries
        let count = latencies.len() as f64;
        Some(latencies.iter().sum::<f64>() / count)
    }
}

#[derive(Clone, Debug)]
struct MediaEstimates {
    live: EwmaPair,
    static_: EwmaPair,
    latencies_ms: VecDeque<f64>,
}

impl Default for MediaEstimates {
    fn default() -> Self {
        Self {
            live: EwmaPair::new(
                EwmaThroughputHistory::LIVE_FAST_HALF_LIFE_SECS,
                EwmaThroughputHistory::LIVE_SLOW_HALF_LIFE_SECS,
            ),
            static_: EwmaPair::new(
                EwmaThroughputHistory::STATIC_FAST_HALF_LIFE_SECS,
                EwmaThroughputHistory::STATIC_SLOW_HALF_LIFE_SECS,
            ),
            latencies_ms: VecDeque::with_capacity(EwmaThroughputHistory::LATENCY_SAMPLES + 1),
        }
    }
}

#[derive(Clone, Debug)]
struct EwmaPair {
    fast: Ewma,
    slow: Ewma,
}

impl EwmaPair {
    fn new(fast_half_life_secs: f64, slow_half_life_secs: f64) -> Self {
        Self {
            fast: Ewma::new(fast_half_life_secs),
            slow: Ewma::new(slow_half_life_secs),
        }
    }

    fn add_sample(&mut self, weight: f64, val: f64) {
        self.fast.add_sample(weight, val);
        self.slow.add_sample(weight, val);
    }

    fn estimate_bps(&self) -> Option<f64> {
        let fast = self.fast.estimate()?;
        let slow = self.slow.estimate()?;
        Some(fast.min(slow)).filter(|&est| est > 0.0)
    }
}

/// Exponentially decaying average weighted by transfer seconds.
#[derive(Clone, Debug)]
struct Ewma {
    /// Weight left to the running value after one second.
    decay_per_sec: f64,
    running: f64,
    weight_secs: f64,
}

impl Ewma {
    fn new(half_life_secs: f64) -> Self {
        Self {
            decay_per_sec: 0.5_f64.powf(half_life_secs.max(0.001).recip()),
            running: 0.0,
            weight_secs: 0.0,
        }
    }

    fn add_sample(&mut self, weight_secs: f64, value: f64) {
        let weight_secs = weight_secs.max(0.0);
        let decay = self.decay_per_sec.powf(weight_secs);
        self.running = value * (1.0 - decay) + decay * self.running;
        self.weight_secs += weight_secs;
    }

    /// Running value with the zero-start bias removed.
    fn estimate(&self) -> Option<f64> {
        if self.weight_secs <= 0.0 {
            return None;
        }
        let filled = 1.0 - self.decay_per_sec.powf(self.weight_secs);
        Some(self.running / filled.max(1e-6))
    }
}
