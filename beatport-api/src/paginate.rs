//! Paginated catalog listings.
//!
//! Listing endpoints take `page` (1-based) and `per_page` and answer:
//!
//! ```json
//! { "count": 250, "next": "...", "previous": null, "page": "1/3", "per_page": 100, "results": [ ... ] }
//! ```
//!
//! [`BeatportClient::fetch_all`] reads `count` from the first page and walks
//! the remaining pages in order. The bound is fixed from that first answer;
//! if the listing grows or shrinks while it is being walked the result can
//! miss items or repeat them. Nothing here tries to detect that, but an empty
//! page ends the walk so an inflated `count` cannot keep it going.

use crate::client::BeatportClient;
use crate::error::Result;
use crate::types::{PlaylistEntry, Release, Track};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use tracing::debug;

/// Page size used when the caller has no preference.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// A listable resource yielding items of type `T`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing<T> {
    endpoint: String,
    _item: PhantomData<T>,
}

impl<T> Listing<T> {
    fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            _item: PhantomData,
        }
    }

    /// Endpoint path relative to the API root.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Listing<Track> {
    pub fn release_tracks(release_id: u64) -> Self {
        Self::new(format!("catalog/releases/{release_id}/tracks/"))
    }

    pub fn chart_tracks(chart_id: u64) -> Self {
        Self::new(format!("catalog/charts/{chart_id}/tracks/"))
    }

    pub fn artist_tracks(artist_id: u64) -> Self {
        Self::new(format!("catalog/artists/{artist_id}/tracks/"))
    }
}

impl Listing<PlaylistEntry> {
    /// Playlist rows wrap the track; see [`PlaylistEntry`].
    pub fn playlist_tracks(playlist_id: u64) -> Self {
        Self::new(format!("catalog/playlists/{playlist_id}/tracks/"))
    }
}

impl Listing<Release> {
    pub fn label_releases(label_id: u64) -> Self {
        Self::new(format!("catalog/labels/{label_id}/releases/"))
    }
}

/// One page to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PageResult<T> {
    #[serde(rename = "results", default = "Vec::new")]
    pub items: Vec<T>,
    /// Total number of items in the listing, as reported by this page.
    #[serde(rename = "count", default)]
    pub total_count: Option<u64>,
}

/// Number of pages needed for `total` items, never less than one.
pub fn page_count(total: u64, page_size: u32) -> u64 {
    total.div_ceil(u64::from(page_size.max(1))).max(1)
}

/// Last page number to request for `total` items, capped at the largest
/// page number the API accepts.
pub fn last_page(total: u64, page_size: u32) -> u32 {
    u32::try_from(page_count(total, page_size)).unwrap_or(u32::MAX)
}

/// Walk a paginated listing with `fetch_page`.
///
/// Page 1 is always fetched. Its `total_count` (absent counts as zero) fixes
/// how many further pages are requested; later pages' counts are ignored.
/// A page that comes back empty ends the walk early. Items are concatenated
/// in fetch order. The first failing page aborts the walk. `progress`
/// receives `(items so far, total)` after every page.
pub fn aggregate<T, F>(
    page_size: u32,
    fetch_page: F,
    progress: Option<&mut dyn FnMut(usize, u64)>,
) -> Result<Vec<T>>
where
    F: FnMut(PageRequest) -> Result<PageResult<T>>,
{
    aggregate_with_total(page_size, fetch_page, progress).map(|(items, _)| items)
}

/// [`aggregate`], also returning the total reported by the first page.
pub fn aggregate_with_total<T, F>(
    page_size: u32,
    mut fetch_page: F,
    mut progress: Option<&mut dyn FnMut(usize, u64)>,
) -> Result<(Vec<T>, u64)>
where
    F: FnMut(PageRequest) -> Result<PageResult<T>>,
{
    let first = fetch_page(PageRequest::new(1, page_size))?;
    let total = first.total_count.unwrap_or(0);
    let mut items = first.items;
    if let Some(report) = progress.as_deref_mut() {
        report(items.len(), total);
    }

    let last = last_page(total, page_size);
    for page in 2..=last {
        let next = fetch_page(PageRequest::new(page, page_size))?;
        if next.items.is_empty() {
            debug!("page {page} of {last} is empty, stopping");
            break;
        }
        items.extend(next.items);
        if let Some(report) = progress.as_deref_mut() {
            report(items.len(), total);
        }
    }
    debug!("aggregated {} items, reported total {total}", items.len());
    Ok((items, total))
}

impl BeatportClient {
    /// Fetch a single page of `listing`.
    pub fn fetch_page<T: DeserializeOwned>(
        &self,
        listing: &Listing<T>,
        request: PageRequest,
    ) -> Result<PageResult<T>> {
        self.get(
            listing.endpoint(),
            &[
                ("page", request.page.to_string()),
                ("per_page", request.page_size.to_string()),
            ],
        )
    }

    /// Fetch every page of `listing` and concatenate the items.
    ///
    /// See [`aggregate`] for the paging rules.
    pub fn fetch_all<T: DeserializeOwned>(
        &self,
        listing: &Listing<T>,
        page_size: u32,
        progress: Option<&mut dyn FnMut(usize, u64)>,
    ) -> Result<Vec<T>> {
        aggregate(page_size, |req| self.fetch_page(listing, req), progress)
    }

    /// [`fetch_all`](Self::fetch_all), also returning the listing size the
    /// first page reported.
    pub fn fetch_all_with_total<T: DeserializeOwned>(
        &self,
        listing: &Listing<T>,
        page_size: u32,
        progress: Option<&mut dyn FnMut(usize, u64)>,
    ) -> Result<(Vec<T>, u64)> {
        aggregate_with_total(page_size, |req| self.fetch_page(listing, req), progress)
    }
}
