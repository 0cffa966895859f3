//! Default mapping from measured throughput onto the bitrate ladder.

use crate::types::{MediaInfo, VariantSource};

/// Highest quality whose bitrate is covered by `throughput_kbps` once the
/// request latency overhead is taken out.
///
/// Latency eats into the time available for a fragment: throughput is scaled
/// by `1 - latency / fragment_duration`. A latency at or above the fragment
/// duration, or a throughput below the lowest rung, maps to quality 0.
pub fn quality_for_bitrate(media_info: &MediaInfo, throughput_kbps: f64, latency_ms: f64) -> usize {
    let fragment_secs = media_info.fragment_duration.as_secs_f64();
    let mut usable_kbps = throughput_kbps.max(0.0);

    if latency_ms > 0.0 && fragment_secs > 0.0 {
        let dead_time_ratio = latency_ms / 1000.0 / fragment_secs;
        if dead_time_ratio >= 1.0 {
            return 0;
        }
        usable_kbps *= 1.0 - dead_time_ratio;
    }

    let budget_bps = usable_kbps * 1000.0;
    #[expect(clippy::cast_precision_loss)] // bitrate precision loss is negligible for ABR
    let covered = |idx: usize| {
        media_info
            .variant_bandwidth(idx)
            .is_some_and(|bw| bw as f64 <= budget_bps)
    };

    (0..media_info.variant_count())
        .rev()
        .find(|&idx| covered(idx))
        .unwrap_or(0)
}
