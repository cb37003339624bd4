//! Field derivations shared by every projection.

use beatport_api::types::Track;

/// `name`, plus ` (mix)` when the mix is non-empty.
pub fn display_name(name: &str, mix_name: Option<&str>) -> String {
    match mix_name {
        Some(mix) if !mix.is_empty() => format!("{name} ({mix})"),
        _ => name.to_owned(),
    }
}

/// Year part of an ISO date.
pub fn release_year(date: Option<&str>) -> Option<String> {
    date.filter(|d| !d.is_empty())
        .map(|d| d.chars().take(4).collect())
}

/// Whole seconds of a millisecond duration, rounded down.
pub fn duration_secs(length_ms: Option<u64>) -> Option<u64> {
    length_ms.map(|ms| ms / 1000)
}

/// Sum of whole-second durations; missing lengths count as zero.
pub fn total_duration<'a>(tracks: impl IntoIterator<Item = &'a Track>) -> u64 {
    tracks
        .into_iter()
        .filter_map(|t| duration_secs(t.length_ms))
        .sum()
}

/// Why a track cannot be downloaded, if it cannot.
pub fn availability_error(track: &Track) -> Option<String> {
    if !track.is_available_for_streaming {
        Some(format!("Track \"{}\" is not streamable!", track.name))
    } else if track.preorder {
        Some(format!("Track \"{}\" is not yet released!", track.name))
    } else {
        None
    }
}
