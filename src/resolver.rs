use crate::api::Provider;
use crate::delay::Sleeper;
use crate::error::is_conflict;
use crate::models::{ExportedTrack, PlaylistItem, SearchHit, TrackOutcome};
use std::time::Duration;

/// Bounded retry for playlist inserts. Only conflicts are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

impl RetryPolicy {
    /// Wait before the attempt following `attempt` (0-indexed): 1s, 2s, 4s, ...
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_secs(1u64 << attempt.min(16))
    }
}

/// True if `hit` is already in the playlist, either by video id or by a
/// case-insensitive title + comma-joined artists match on the exported track.
pub fn is_duplicate(hit: &SearchHit, track: &ExportedTrack, baseline: &[PlaylistItem]) -> bool {
    let name = track.name.to_lowercase();
    let artist = track.artist.to_lowercase();
    baseline.iter().any(|item| {
        item.video_id == hit.video_id
            || (item.title.to_lowercase() == name && item.joined_artists().to_lowercase() == artist)
    })
}

/// Searches, deduplicates and inserts tracks into one resolved playlist.
pub struct TrackResolver<'a> {
    provider: &'a dyn Provider,
    sleeper: &'a dyn Sleeper,
    retry: RetryPolicy,
    api_delay: Duration,
    allow_duplicates: bool,
}

impl<'a> TrackResolver<'a> {
    pub fn new(
        provider: &'a dyn Provider,
        sleeper: &'a dyn Sleeper,
        retry: RetryPolicy,
        api_delay: Duration,
        allow_duplicates: bool,
    ) -> Self {
        Self { provider, sleeper, retry, api_delay, allow_duplicates }
    }

    /// Process one track against a baseline that is not refreshed between
    /// tracks: two identical tracks in one import are both inserted.
    pub async fn process_track(&self, track: &ExportedTrack, playlist_id: &str, baseline: &[PlaylistItem]) -> TrackOutcome {
        let query = track.search_query();
        log::info!("Searching for track: '{}' by '{}' in YouTube Music", track.name, track.artist);
        log::debug!("Search query value: '{}'", query);

        let hits = match self.provider.search_songs(&query).await {
            Ok(hits) => hits,
            Err(e) => {
                log::error!("Search failed for '{}' by '{}': {:#}", track.name, track.artist, e);
                return TrackOutcome::Failed;
            }
        };
        log::debug!("Search results found: {}", hits.len());

        let Some(hit) = hits.into_iter().next() else {
            log::warn!("Track not found: {} by {}", track.name, track.artist);
            return TrackOutcome::NotFound;
        };
        log::info!("Track found");

        let outcome = if !self.allow_duplicates && is_duplicate(&hit, track, baseline) {
            log::warn!(
                "The playlist already has the track: '{}' by '{}'. Skipping duplication",
                track.name,
                track.artist
            );
            TrackOutcome::SkippedDuplicate
        } else {
            self.insert_with_retry(track, playlist_id, &hit.video_id).await
        };

        self.sleeper.sleep(self.api_delay).await;
        outcome
    }

    async fn insert_with_retry(&self, track: &ExportedTrack, playlist_id: &str, video_id: &str) -> TrackOutcome {
        let ids = [video_id.to_string()];
        for attempt in 0..self.retry.max_attempts {
            log::debug!(
                "Adding track with ID: '{}' ('{}' by '{}') to playlist with ID: '{}', attempt {}",
                video_id,
                track.name,
                track.artist,
                playlist_id,
                attempt + 1
            );
            match self.provider.add_playlist_items(playlist_id, &ids).await {
                Ok(()) => {
                    log::info!("Added: {} by {}", track.name, track.artist);
                    return TrackOutcome::Added;
                }
                Err(e) if is_conflict(&e) && attempt + 1 < self.retry.max_attempts => {
                    let wait = self.retry.backoff(attempt);
                    log::warn!(
                        "409 Conflict when adding track with ID: '{}' ('{}' by '{}'). Retrying in {}s (attempt {})...",
                        video_id,
                        track.name,
                        track.artist,
                        wait.as_secs(),
                        attempt + 1
                    );
                    self.sleeper.sleep(wait).await;
                }
                Err(e) => {
                    log::error!(
                        "Failed to add with ID: '{}' ('{}' by '{}') to playlist with ID: '{}': {:#}",
                        video_id,
                        track.name,
                        track.artist,
                        playlist_id,
                        e
                    );
                    return TrackOutcome::Failed;
                }
            }
        }
        TrackOutcome::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Artist;

    fn hit(id: &str) -> SearchHit {
        SearchHit { video_id: id.into(), title: "whatever".into(), artists: vec![] }
    }

    fn item(id: &str, title: &str, artists: &[&str]) -> PlaylistItem {
        PlaylistItem {
            video_id: id.into(),
            title: title.into(),
            artists: artists.iter().map(|a| Artist { name: (*a).into() }).collect(),
        }
    }

    fn track(name: &str, artist: &str) -> ExportedTrack {
        ExportedTrack { name: name.into(), artist: artist.into() }
    }

    #[test]
    fn duplicate_by_video_id() {
        let baseline = vec![item("v1", "Other", &["Someone"])];
        assert!(is_duplicate(&hit("v1"), &track("Song", "Band"), &baseline));
    }

    #[test]
    fn duplicate_by_title_and_joined_artists() {
        let baseline = vec![item("v9", "Under Pressure", &["Queen", "David Bowie"])];
        assert!(is_duplicate(&hit("v1"), &track("under pressure", "QUEEN, david bowie"), &baseline));
    }

    #[test]
    fn title_alone_is_not_a_duplicate() {
        let baseline = vec![item("v9", "Under Pressure", &["Queen"])];
        assert!(!is_duplicate(&hit("v1"), &track("Under Pressure", "Vanilla Ice"), &baseline));
    }

    #[test]
    fn empty_baseline_has_no_duplicates() {
        assert!(!is_duplicate(&hit("v1"), &track("A", "B"), &[]));
    }

    #[test]
    fn backoff_doubles() {
        let p = RetryPolicy::default();
        assert_eq!(p.backoff(0), Duration::from_secs(1));
        assert_eq!(p.backoff(1), Duration::from_secs(2));
        assert_eq!(p.backoff(2), Duration::from_secs(4));
    }
}
