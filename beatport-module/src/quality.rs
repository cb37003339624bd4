//! Quality tiers and the codec they map to.

use serde::Serialize;

/// Host quality tiers.
///
/// Beatport only serves AAC: 128 kbps as an HLS stream, 256 kbps as an MP4
/// download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum QualityTier {
    Minimum,
    Low,
    Medium,
    High,
    Lossless,
    HiFi,
}

impl QualityTier {
    /// Target bitrate in kbps.
    pub fn bitrate(self) -> u32 {
        match self {
            Self::Minimum | Self::Low | Self::Medium => 128,
            Self::High | Self::Lossless | Self::HiFi => 256,
        }
    }
}

/// Audio codec of everything this module delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Codec {
    Aac,
}

impl Codec {
    /// File extension the host should use.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Aac => "m4a",
        }
    }
}
