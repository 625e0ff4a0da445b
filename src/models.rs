use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// One playlist entry of the export file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedPlaylist {
    #[serde(rename = "playlist_name")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub tracks: Vec<ExportedTrack>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedTrack {
    pub name: String,
    pub artist: String,
}

impl ExportedTrack {
    /// Free-text query sent to the song search.
    pub fn search_query(&self) -> String {
        format!("{} {}", self.name, self.artist)
    }
}

/// A playlist present in the remote library when the snapshot was taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePlaylist {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub name: String,
}

/// A track already present in a remote playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistItem {
    pub video_id: String,
    pub title: String,
    pub artists: Vec<Artist>,
}

impl PlaylistItem {
    /// Artist names joined the way exports spell multi-artist credits.
    pub fn joined_artists(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A ranked song search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub video_id: String,
    pub title: String,
    pub artists: Vec<Artist>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackOutcome {
    Added,
    SkippedDuplicate,
    NotFound,
    Failed,
}

impl TrackOutcome {
    /// Counter contribution of a single track. `NotFound` lands in
    /// `tracks_failed`: the run summary does not report it separately.
    pub fn counters(self) -> RunCounters {
        let mut c = RunCounters::default();
        match self {
            TrackOutcome::Added => c.tracks_added = 1,
            TrackOutcome::SkippedDuplicate => c.tracks_skipped_duplicate = 1,
            TrackOutcome::NotFound | TrackOutcome::Failed => c.tracks_failed = 1,
        }
        c
    }
}

/// Aggregate result of an import run. Per-playlist values are merged by the importer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunCounters {
    pub playlists_created: u64,
    pub playlists_existing: u64,
    pub playlists_deleted: u64,
    pub tracks_added: u64,
    pub tracks_skipped_duplicate: u64,
    pub tracks_failed: u64,
}

impl AddAssign for RunCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.playlists_created += rhs.playlists_created;
        self.playlists_existing += rhs.playlists_existing;
        self.playlists_deleted += rhs.playlists_deleted;
        self.tracks_added += rhs.tracks_added;
        self.tracks_skipped_duplicate += rhs.tracks_skipped_duplicate;
        self.tracks_failed += rhs.tracks_failed;
    }
}

impl std::iter::Sum for RunCounters {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(RunCounters::default(), |mut acc, c| {
            acc += c;
            acc
        })
    }
}
