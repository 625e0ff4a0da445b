pub mod auth;
pub mod mock;
pub mod ytmusic;

use crate::models::{PlaylistItem, RemotePlaylist, SearchHit};
use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privacy {
    Private,
    Unlisted,
    Public,
}

impl Privacy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Privacy::Private => "PRIVATE",
            Privacy::Unlisted => "UNLISTED",
            Privacy::Public => "PUBLIC",
        }
    }
}

/// Provider trait: the remote operations the importer needs.
/// Implementations: ytmusic::YtMusicProvider and mock::MockProvider.
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    /// Playlists in the user's library, at most `limit`.
    async fn list_library_playlists(&self, limit: usize) -> Result<Vec<RemotePlaylist>>;

    /// Create a playlist and return its remote id.
    async fn create_playlist(&self, name: &str, description: &str, privacy: Privacy) -> Result<String>;

    async fn delete_playlist(&self, playlist_id: &str) -> Result<()>;

    /// Current contents of a playlist, at most `limit` items.
    async fn get_playlist_items(&self, playlist_id: &str, limit: usize) -> Result<Vec<PlaylistItem>>;

    /// Song-filtered search. Results are ranked, best first.
    async fn search_songs(&self, query: &str) -> Result<Vec<SearchHit>>;

    /// Append videos to a playlist. A 409 surfaces as `ApiError::Conflict`.
    async fn add_playlist_items(&self, playlist_id: &str, video_ids: &[String]) -> Result<()>;

    /// Return the provider's name (for logging)
    fn name(&self) -> &str;
}
