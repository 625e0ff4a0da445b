use crate::api::{Privacy, Provider};
use crate::models::{PlaylistItem, RemotePlaylist, RunCounters};

/// How a sanitized playlist name was mapped to a remote playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// An existing library playlist with the same title is reused as-is.
    Reused { playlist_id: String },
    /// A new playlist was created. `replaced` is set when a same-named
    /// playlist was deleted first.
    Created { playlist_id: String, replaced: bool },
    /// No target playlist; none of the playlist's tracks are processed.
    Skipped { deleted: bool, reason: String },
}

impl Resolution {
    pub fn playlist_id(&self) -> Option<&str> {
        match self {
            Resolution::Reused { playlist_id } | Resolution::Created { playlist_id, .. } => Some(playlist_id.as_str()),
            Resolution::Skipped { .. } => None,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Resolution::Created { .. })
    }

    pub fn counters(&self) -> RunCounters {
        let mut c = RunCounters::default();
        match self {
            Resolution::Reused { .. } => c.playlists_existing = 1,
            Resolution::Created { replaced, .. } => {
                c.playlists_created = 1;
                c.playlists_deleted = u64::from(*replaced);
            }
            Resolution::Skipped { deleted, .. } => c.playlists_deleted = u64::from(*deleted),
        }
        c
    }
}

/// Case-insensitive exact title match against the library snapshot.
pub fn find_existing<'a>(name: &str, snapshot: &'a [RemotePlaylist]) -> Option<&'a RemotePlaylist> {
    let wanted = name.to_lowercase();
    snapshot.iter().find(|p| p.title.to_lowercase() == wanted)
}

/// Reuse, create or delete-and-recreate the remote playlist named `name`.
///
/// A failed delete skips the playlist entirely; it is never retried and its
/// tracks are not counted. A failed create likewise skips the playlist.
pub async fn resolve_playlist(
    provider: &dyn Provider,
    name: &str,
    description: &str,
    snapshot: &[RemotePlaylist],
    delete_if_exists: bool,
) -> Resolution {
    let mut replaced = false;

    if let Some(existing) = find_existing(name, snapshot) {
        if !delete_if_exists {
            log::info!("Using existing playlist: '{}' (ID: {})", name, existing.id);
            return Resolution::Reused { playlist_id: existing.id.clone() };
        }

        log::info!(
            "Deleting existing playlist: '{}' (ID: {}) as --delete-if-exists is set",
            name,
            existing.id
        );
        match provider.delete_playlist(&existing.id).await {
            Ok(()) => {
                log::info!("Deleted playlist: '{}'", name);
                replaced = true;
            }
            Err(e) => {
                log::error!("Failed to delete playlist '{}': {:#}", name, e);
                return Resolution::Skipped { deleted: false, reason: format!("delete failed: {:#}", e) };
            }
        }
    }

    log::info!("Creating new playlist: '{}'...", name);
    match provider.create_playlist(name, description, Privacy::Private).await {
        Ok(playlist_id) => {
            log::info!("Playlist created with ID: {}", playlist_id);
            Resolution::Created { playlist_id, replaced }
        }
        Err(e) => {
            log::error!("Failed to create playlist '{}': {:#}", name, e);
            Resolution::Skipped { deleted: replaced, reason: format!("create failed: {:#}", e) }
        }
    }
}

/// Current playlist contents used as the duplicate baseline. A listing error
/// (new playlists often fail to list) yields an empty baseline.
pub async fn fetch_baseline(provider: &dyn Provider, playlist_id: &str, limit: usize) -> Vec<PlaylistItem> {
    match provider.get_playlist_items(playlist_id, limit).await {
        Ok(items) => {
            log::debug!("Playlist {} has {} existing tracks", playlist_id, items.len());
            items
        }
        Err(e) => {
            log::debug!("No existing tracks for playlist {}: {:#}", playlist_id, e);
            Vec::new()
        }
    }
}
