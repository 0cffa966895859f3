use std::{fmt, time::Duration};

/// Media type of a single adaptation pipeline.
///
/// Each pipeline runs its own [`RulesCollection`](crate::RulesCollection);
/// nothing is shared between media types.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MediaType {
    Video,
    Audio,
    Text,
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Text => "text",
        })
    }
}

/// Source of variant information for ABR rules.
///
/// Abstracts rules from the manifest format (HLS, DASH, etc.).
pub trait VariantSource {
    /// Returns the total number of available variants.
    fn variant_count(&self) -> usize;

    /// Returns the bandwidth (bits per second) for a variant at the given index.
    ///
    /// Returns `None` if the index is out of bounds.
    fn variant_bandwidth(&self, index: usize) -> Option<u64>;
}

/// Media descriptor for the pipeline being adapted.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaInfo {
    pub media_type: MediaType,
    /// Bitrate ladder in bits per second, lowest quality first.
    ///
    /// Index in this list is the quality index rules vote for.
    pub bitrates_bps: Vec<u64>,
    /// Nominal duration of one fragment.
    pub fragment_duration: Duration,
}

impl MediaInfo {
    pub fn new(media_type: MediaType, bitrates_bps: Vec<u64>, fragment_duration: Duration) -> Self {
        Self {
            media_type,
            bitrates_bps,
            fragment_duration,
        }
    }

    /// Highest valid quality index, or `None` for an empty ladder.
    pub fn top_quality(&self) -> Option<usize> {
        self.bitrates_bps.len().checked_sub(1)
    }
}

impl VariantSource for MediaInfo {
    fn variant_count(&self) -> usize {
        self.bitrates_bps.len()
    }

    fn variant_bandwidth(&self, index: usize) -> Option<u64> {
        self.bitrates_bps.get(index).copied()
    }
}

/// Stream descriptor.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StreamInfo {
    pub id: String,
    /// Live (dynamic) presentation.
    pub is_dynamic: bool,
}

/// Fragment abandonment state of a media type, as tracked by the host.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum AbandonmentState {
    #[default]
    Allowed,
    /// An in-flight fetch is being abandoned and replaced.
    Abandoning,
}
