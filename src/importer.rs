use crate::api::Provider;
use crate::delay::Sleeper;
use crate::error::ImportError;
use crate::models::{ExportedPlaylist, RemotePlaylist, RunCounters};
use crate::reconcile::{fetch_baseline, resolve_playlist};
use crate::resolver::{RetryPolicy, TrackResolver};
use crate::sanitize::sanitize_playlist_name;
use std::path::Path;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub allow_duplicates: bool,
    pub delete_if_exists: bool,
    /// Pause after every track that got as far as a duplicate check.
    pub api_delay: Duration,
    pub api_max_retries: u32,
    /// Page bound for the library snapshot.
    pub library_playlist_limit: usize,
    /// Page bound for each playlist's duplicate baseline.
    pub playlist_item_limit: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            allow_duplicates: false,
            delete_if_exists: false,
            api_delay: Duration::from_secs(1),
            api_max_retries: 3,
            library_playlist_limit: 1000,
            playlist_item_limit: 1000,
        }
    }
}

/// Read and validate the export file. Every entry must carry
/// `playlist_name` and `tracks`, every track `name` and `artist`.
pub fn load_export(path: &Path) -> Result<Vec<ExportedPlaylist>, ImportError> {
    let s = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ImportError::InputMissing { path: path.to_path_buf() }
        } else {
            ImportError::InputRead { path: path.to_path_buf(), source }
        }
    })?;
    serde_json::from_str(&s).map_err(|source| ImportError::InputParse { path: path.to_path_buf(), source })
}

/// Drives the whole import: one snapshot, then playlists and their tracks strictly in file order.
pub struct Importer<'a> {
    provider: &'a dyn Provider,
    sleeper: &'a dyn Sleeper,
    options: ImportOptions,
}

impl<'a> Importer<'a> {
    pub fn new(provider: &'a dyn Provider, sleeper: &'a dyn Sleeper, options: ImportOptions) -> Self {
        Self { provider, sleeper, options }
    }

    /// Load `playlists_file` and import it.
    pub async fn run_file(&self, playlists_file: &Path) -> Result<RunCounters, ImportError> {
        let playlists = load_export(playlists_file)?;
        log::info!("Loaded {} playlists from {}", playlists.len(), playlists_file.display());
        self.run(&playlists).await
    }

    /// Import `playlists` and log a summary. Fails only if the library
    /// snapshot cannot be read, before anything is created or deleted;
    /// per-playlist and per-track failures end up in the counters.
    pub async fn run(&self, playlists: &[ExportedPlaylist]) -> Result<RunCounters, ImportError> {
        let started = Instant::now();
        let snapshot = self
            .provider
            .list_library_playlists(self.options.library_playlist_limit)
            .await
            .map_err(ImportError::Library)?;
        log::debug!("Library snapshot holds {} playlists", snapshot.len());

        let mut total = RunCounters::default();
        for playlist in playlists {
            total += self.import_playlist(playlist, &snapshot).await;
        }
        log_summary(&total, started.elapsed());
        Ok(total)
    }

    async fn import_playlist(&self, playlist: &ExportedPlaylist, snapshot: &[RemotePlaylist]) -> RunCounters {
        let name = sanitize_playlist_name(&playlist.name);
        if name != playlist.name {
            log::debug!("Sanitized playlist name '{}' -> '{}'", playlist.name, name);
        }

        let resolution = resolve_playlist(
            self.provider,
            &name,
            &playlist.description,
            snapshot,
            self.options.delete_if_exists,
        )
        .await;
        let mut counters = resolution.counters();

        let Some(playlist_id) = resolution.playlist_id() else {
            log::warn!("Skipping playlist '{}' ({} tracks not processed)", name, playlist.tracks.len());
            return counters;
        };

        let baseline = fetch_baseline(self.provider, playlist_id, self.options.playlist_item_limit).await;
        let resolver = TrackResolver::new(
            self.provider,
            self.sleeper,
            RetryPolicy { max_attempts: self.options.api_max_retries },
            self.options.api_delay,
            self.options.allow_duplicates,
        );
        for track in &playlist.tracks {
            counters += resolver.process_track(track, playlist_id, &baseline).await.counters();
        }
        counters
    }
}

fn log_summary(c: &RunCounters, elapsed: Duration) {
    log::info!("Import completed in: {:.2} seconds.", elapsed.as_secs_f64());
    log::info!("Playlists already existing (not deleted): {}", c.playlists_existing);
    log::info!("Playlists created: {}", c.playlists_created);
    log::info!("Playlists deleted: {}", c.playlists_deleted);
    log::info!("Total tracks skipped (duplicate prevention): {}", c.tracks_skipped_duplicate);
    log::info!("Total tracks successfully added: {}", c.tracks_added);
    log::info!("Total tracks failed to add (request error or not found): {}", c.tracks_failed);
}
