use super::{Privacy, Provider};
use crate::error::ApiError;
use crate::models::{PlaylistItem, RemotePlaylist, SearchHit};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use tracing::info;

/// One recorded provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListLibraryPlaylists { limit: usize },
    CreatePlaylist { name: String, description: String, privacy: Privacy },
    DeletePlaylist { playlist_id: String },
    GetPlaylistItems { playlist_id: String, limit: usize },
    SearchSongs { query: String },
    AddPlaylistItems { playlist_id: String, video_ids: Vec<String> },
}

#[derive(Default)]
struct State {
    playlists: Vec<RemotePlaylist>,
    items: HashMap<String, Vec<PlaylistItem>>,
    search_results: HashMap<String, Vec<SearchHit>>,
    failing_deletes: HashSet<String>,
    failing_creates: HashSet<String>,
    failing_item_fetches: HashSet<String>,
    add_errors: VecDeque<ApiError>,
    calls: Vec<Call>,
    next_id: u64,
}

/// An in-memory provider used in tests. It records every call and can be
/// scripted with library contents, search results and injected failures.
#[derive(Default)]
pub struct MockProvider {
    state: Mutex<State>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        let mut g = self.state.lock().unwrap_or_else(|p| p.into_inner());
        f(&mut g)
    }

    pub fn with_playlist(self, id: &str, title: &str, items: Vec<PlaylistItem>) -> Self {
        self.with_state(|s| {
            s.playlists.push(RemotePlaylist { id: id.into(), title: title.into() });
            s.items.insert(id.into(), items);
        });
        self
    }

    pub fn with_search_result(self, query: &str, hits: Vec<SearchHit>) -> Self {
        self.with_state(|s| {
            s.search_results.insert(query.into(), hits);
        });
        self
    }

    pub fn failing_delete(self, playlist_id: &str) -> Self {
        self.with_state(|s| {
            s.failing_deletes.insert(playlist_id.into());
        });
        self
    }

    pub fn failing_create(self, name: &str) -> Self {
        self.with_state(|s| {
            s.failing_creates.insert(name.into());
        });
        self
    }

    pub fn failing_item_fetch(self, playlist_id: &str) -> Self {
        self.with_state(|s| {
            s.failing_item_fetches.insert(playlist_id.into());
        });
        self
    }

    /// Queue errors returned by the next `add_playlist_items` calls, in order.
    pub fn with_add_errors(self, errors: Vec<ApiError>) -> Self {
        self.with_state(|s| s.add_errors.extend(errors));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.with_state(|s| s.calls.clone())
    }

    pub fn count_calls(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.with_state(|s| s.calls.iter().filter(|c| pred(c)).count())
    }

    pub fn playlist_items(&self, playlist_id: &str) -> Vec<PlaylistItem> {
        self.with_state(|s| s.items.get(playlist_id).cloned().unwrap_or_default())
    }

    pub fn playlists(&self) -> Vec<RemotePlaylist> {
        self.with_state(|s| s.playlists.clone())
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list_library_playlists(&self, limit: usize) -> Result<Vec<RemotePlaylist>> {
        self.with_state(|s| {
            s.calls.push(Call::ListLibraryPlaylists { limit });
            Ok(s.playlists.iter().take(limit).cloned().collect::<Vec<_>>())
        })
    }

    async fn create_playlist(&self, name: &str, description: &str, privacy: Privacy) -> Result<String> {
        info!("MockProvider: create_playlist {}", name);
        self.with_state(|s| {
            s.calls.push(Call::CreatePlaylist {
                name: name.into(),
                description: description.into(),
                privacy,
            });
            if s.failing_creates.contains(name) {
                return Err(anyhow::Error::from(ApiError::Status { status: 500, body: "create failed".into() }));
            }
            s.next_id += 1;
            let id = format!("mock-playlist-{}", s.next_id);
            s.playlists.push(RemotePlaylist { id: id.clone(), title: name.into() });
            s.items.insert(id.clone(), Vec::new());
            Ok(id)
        })
    }

    async fn delete_playlist(&self, playlist_id: &str) -> Result<()> {
        info!("MockProvider: delete_playlist {}", playlist_id);
        self.with_state(|s| {
            s.calls.push(Call::DeletePlaylist { playlist_id: playlist_id.into() });
            if s.failing_deletes.contains(playlist_id) {
                return Err(anyhow!("mock delete failure for {}", playlist_id));
            }
            s.playlists.retain(|p| p.id != playlist_id);
            s.items.remove(playlist_id);
            Ok(())
        })
    }

    async fn get_playlist_items(&self, playlist_id: &str, limit: usize) -> Result<Vec<PlaylistItem>> {
        self.with_state(|s| {
            s.calls.push(Call::GetPlaylistItems { playlist_id: playlist_id.into(), limit });
            if s.failing_item_fetches.contains(playlist_id) {
                return Err(anyhow!("mock listing failure for {}", playlist_id));
            }
            s.items
                .get(playlist_id)
                .map(|items| items.iter().take(limit).cloned().collect::<Vec<_>>())
                .ok_or_else(|| anyhow!("unknown playlist {}", playlist_id))
        })
    }

    async fn search_songs(&self, query: &str) -> Result<Vec<SearchHit>> {
        info!("MockProvider: search {}", query);
        self.with_state(|s| {
            s.calls.push(Call::SearchSongs { query: query.into() });
            Ok(s.search_results.get(query).cloned().unwrap_or_default())
        })
    }

    async fn add_playlist_items(&self, playlist_id: &str, video_ids: &[String]) -> Result<()> {
        info!("MockProvider: add_playlist_items {} -> {} tracks", playlist_id, video_ids.len());
        self.with_state(|s| {
            s.calls.push(Call::AddPlaylistItems {
                playlist_id: playlist_id.into(),
                video_ids: video_ids.to_vec(),
            });
            if let Some(err) = s.add_errors.pop_front() {
                return Err(anyhow::Error::from(err));
            }
            let items = s.items.entry(playlist_id.into()).or_default();
            for id in video_ids {
                items.push(PlaylistItem { video_id: id.clone(), title: String::new(), artists: Vec::new() });
            }
            Ok(())
        })
    }
}
