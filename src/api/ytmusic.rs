use super::auth::BrowserAuth;
use super::{Privacy, Provider};
use crate::error::ApiError;
use crate::models::{Artist, PlaylistItem, RemotePlaylist, SearchHit};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use serde_json::{json, Value};
use sha1::{Digest, Sha1};
use std::env;
use tracing::{debug, warn};

const DEFAULT_API_BASE: &str = "https://music.youtube.com/youtubei/v1";
const ORIGIN: &str = "https://music.youtube.com";
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";
/// Search params restricting results to songs.
const SONGS_FILTER: &str = "EgWKAQIIAWoMEA4QChADEAQQCRAF";
const LIBRARY_PLAYLISTS_BROWSE_ID: &str = "FEmusic_liked_playlists";
const RUN_SEPARATOR: &str = " • ";

/// YouTube Music provider backed by the web client's JSON API, signed with
/// browser session cookies.
/// The endpoint base may be overridden by the YTMUSIC_API_BASE env var.
pub struct YtMusicProvider {
    client: Client,
    auth: BrowserAuth,
    base: String,
    allow_duplicates: bool,
}

impl YtMusicProvider {
    pub fn new(auth: BrowserAuth) -> Result<Self> {
        Self::with_base_url(auth, Self::api_base())
    }

    pub fn with_base_url(auth: BrowserAuth, base: impl Into<String>) -> Result<Self> {
        auth.sapisid()?;
        let client = Client::builder()
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            client,
            auth,
            base: base.into().trim_end_matches('/').to_string(),
            allow_duplicates: false,
        })
    }

    /// Ask the service to accept videos already in the target playlist.
    /// Without this the service itself refuses duplicate inserts.
    pub fn allow_duplicates(mut self, allow: bool) -> Self {
        self.allow_duplicates = allow;
        self
    }

    fn api_base() -> String {
        env::var("YTMUSIC_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string())
    }

    fn context() -> Value {
        json!({
            "client": {
                "clientName": "WEB_REMIX",
                "clientVersion": format!("1.{}.01.00", Utc::now().format("%Y%m%d")),
                "hl": "en"
            },
            "user": {}
        })
    }

    async fn post(&self, endpoint: &str, mut body: Value) -> Result<Value> {
        body["context"] = Self::context();
        let url = format!("{}/{}", self.base, endpoint);
        let authorization = sapisid_hash(&self.auth.sapisid()?, Utc::now().timestamp());

        let mut req = self.client.post(&url);
        for (name, value) in &self.auth.headers {
            if name != "authorization" {
                req = req.header(name.as_str(), value.as_str());
            }
        }
        if !self.auth.headers.contains_key("user-agent") {
            req = req.header(USER_AGENT, DEFAULT_USER_AGENT);
        }
        let resp = req
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, "application/json")
            .header("origin", ORIGIN)
            .header("x-origin", ORIGIN)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("POST {}", endpoint))?;

        let status = resp.status();
        if status == reqwest::StatusCode::CONFLICT {
            let txt = resp.text().await.unwrap_or_default();
            return Err(ApiError::Conflict(txt).into());
        }
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status { status: status.as_u16(), body: txt }.into());
        }
        let j: Value = resp
            .json()
            .await
            .with_context(|| format!("decoding {} response", endpoint))?;
        Ok(j)
    }

    /// Follow continuation tokens of a browse result until `limit` items are collected.
    async fn browse_all(
        &self,
        first: &Value,
        limit: usize,
        extract: fn(&Value) -> Option<(Vec<Value>, Option<String>)>,
    ) -> Result<Vec<Value>> {
        let Some((mut items, mut next)) = extract(first) else {
            return Ok(Vec::new());
        };
        while items.len() < limit {
            let Some(token) = next.take() else { break };
            debug!("Fetching continuation ({} items so far)", items.len());
            let page = self.post("browse", json!({ "continuation": token })).await?;
            match continuation_page(&page) {
                Some((more, token)) => {
                    if more.is_empty() {
                        break;
                    }
                    items.extend(more);
                    next = token;
                }
                None => break,
            }
        }
        items.truncate(limit);
        Ok(items)
    }
}

/// `SAPISIDHASH <ts>_<sha1("<ts> <SAPISID> <origin>")>`
pub fn sapisid_hash(sapisid: &str, timestamp: i64) -> String {
    let mut hasher = Sha1::new();
    hasher.update(format!("{} {} {}", timestamp, sapisid, ORIGIN).as_bytes());
    format!("SAPISIDHASH {}_{:x}", timestamp, hasher.finalize())
}

fn browse_playlist_id(playlist_id: &str) -> String {
    if playlist_id.starts_with("VL") {
        playlist_id.to_string()
    } else {
        format!("VL{}", playlist_id)
    }
}

fn bare_playlist_id(playlist_id: &str) -> &str {
    playlist_id.strip_prefix("VL").unwrap_or(playlist_id)
}

/// Split a content list into real entries and the trailing continuation token, if any.
fn split_continuation(contents: &[Value], legacy: Option<&Value>) -> (Vec<Value>, Option<String>) {
    let mut token = legacy
        .and_then(|v| v.pointer("/continuations/0/nextContinuationData/continuation"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let mut items = Vec::with_capacity(contents.len());
    for c in contents {
        match c.pointer("/continuationItemRenderer/continuationEndpoint/continuationCommand/token") {
            Some(t) => token = t.as_str().map(str::to_string),
            None => items.push(c.clone()),
        }
    }
    (items, token)
}

fn library_grid(resp: &Value) -> Option<(Vec<Value>, Option<String>)> {
    let grid = resp.pointer(
        "/contents/singleColumnBrowseResultsRenderer/tabs/0/tabRenderer/content/sectionListRenderer/contents/0/gridRenderer",
    )?;
    let items = grid.get("items")?.as_array()?;
    Some(split_continuation(items, Some(grid)))
}

fn playlist_shelf(resp: &Value) -> Option<(Vec<Value>, Option<String>)> {
    let shelf = [
        "/contents/singleColumnBrowseResultsRenderer/tabs/0/tabRenderer/content/sectionListRenderer/contents/0/musicPlaylistShelfRenderer",
        "/contents/twoColumnBrowseResultsRenderer/secondaryContents/sectionListRenderer/contents/0/musicPlaylistShelfRenderer",
    ]
    .iter()
    .find_map(|p| resp.pointer(p))?;
    let contents = shelf.get("contents")?.as_array()?;
    Some(split_continuation(contents, Some(shelf)))
}

fn continuation_page(resp: &Value) -> Option<(Vec<Value>, Option<String>)> {
    if let Some(grid) = resp.pointer("/continuationContents/gridContinuation") {
        let items = grid.get("items")?.as_array()?;
        return Some(split_continuation(items, Some(grid)));
    }
    if let Some(shelf) = resp.pointer("/continuationContents/musicPlaylistShelfContinuation") {
        let contents = shelf.get("contents")?.as_array()?;
        return Some(split_continuation(contents, Some(shelf)));
    }
    let items = resp
        .pointer("/onResponseReceivedActions/0/appendContinuationItemsAction/continuationItems")?
        .as_array()?;
    Some(split_continuation(items, None))
}

fn parse_library_playlist(item: &Value) -> Option<RemotePlaylist> {
    let r = item.get("musicTwoRowItemRenderer")?;
    let title = r.pointer("/title/runs/0/text")?.as_str()?;
    let browse_id = r
        .pointer("/title/runs/0/navigationEndpoint/browseEndpoint/browseId")
        .or_else(|| r.pointer("/navigationEndpoint/browseEndpoint/browseId"))?
        .as_str()?;
    Some(RemotePlaylist {
        id: bare_playlist_id(browse_id).to_string(),
        title: title.to_string(),
    })
}

fn flex_column_runs(r: &Value, index: usize) -> &[Value] {
    r.pointer(&format!(
        "/flexColumns/{}/musicResponsiveListItemFlexColumnRenderer/text/runs",
        index
    ))
    .and_then(Value::as_array)
    .map(Vec::as_slice)
    .unwrap_or(&[])
}

fn run_text(run: &Value) -> &str {
    run.get("text").and_then(Value::as_str).unwrap_or("")
}

/// Artist names from the subtitle column: the first ` • `-separated segment,
/// after an optional leading result-type label ("Song").
fn parse_artists(runs: &[Value]) -> Vec<Artist> {
    let segments: Vec<&[Value]> = runs.split(|r| run_text(r) == RUN_SEPARATOR).collect();
    let segment: &[Value] = match segments.as_slice() {
        [first, second, ..] if first.len() == 1 && run_text(&first[0]) == "Song" => *second,
        [first, ..] => *first,
        [] => &[],
    };
    segment
        .iter()
        .map(run_text)
        .filter(|t| !matches!(t.trim(), "" | "," | "&"))
        .map(|t| Artist { name: t.to_string() })
        .collect()
}

/// Video id, title and artists of a list row. Rows without a playable
/// video (unavailable or removed tracks) yield `None`.
fn parse_list_row(item: &Value) -> Option<(String, String, Vec<Artist>)> {
    let r = item.get("musicResponsiveListItemRenderer")?;
    let video_id = r
        .pointer("/playlistItemData/videoId")
        .or_else(|| {
            r.pointer("/overlay/musicItemThumbnailOverlayRenderer/content/musicPlayButtonRenderer/playNavigationEndpoint/watchEndpoint/videoId")
        })?
        .as_str()?
        .to_string();
    let title = flex_column_runs(r, 0).first().map(run_text).unwrap_or("").to_string();
    let artists = parse_artists(flex_column_runs(r, 1));
    Some((video_id, title, artists))
}

fn search_rows(resp: &Value) -> Vec<Value> {
    resp.pointer("/contents/tabbedSearchResultsRenderer/tabs/0/tabRenderer/content/sectionListRenderer/contents")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|section| section.pointer("/musicShelfRenderer/contents"))
        .filter_map(Value::as_array)
        .flatten()
        .cloned()
        .collect()
}

fn check_status(resp: &Value) -> Result<()> {
    match resp.get("status").and_then(Value::as_str) {
        Some("STATUS_SUCCEEDED") | None => Ok(()),
        Some(other) => Err(ApiError::Rejected(other.to_string()).into()),
    }
}

#[async_trait]
impl Provider for YtMusicProvider {
    fn name(&self) -> &str {
        "ytmusic"
    }

    async fn list_library_playlists(&self, limit: usize) -> Result<Vec<RemotePlaylist>> {
        let first = self
            .post("browse", json!({ "browseId": LIBRARY_PLAYLISTS_BROWSE_ID }))
            .await
            .context("listing library playlists")?;
        if library_grid(&first).is_none() {
            debug!("Library playlist grid missing from response; treating library as empty");
        }
        // The grid's first tile is the "New playlist" button, which has no browse id.
        let rows = self.browse_all(&first, limit.saturating_add(1), library_grid).await?;
        Ok(rows.iter().filter_map(parse_library_playlist).take(limit).collect())
    }

    async fn create_playlist(&self, name: &str, description: &str, privacy: Privacy) -> Result<String> {
        let body = json!({
            "title": name,
            "description": description,
            "privacyStatus": privacy.as_str(),
        });
        let j = self.post("playlist/create", body).await.context("creating playlist")?;
        let id = j
            .get("playlistId")
            .and_then(Value::as_str)
            .ok_or(ApiError::Malformed("playlistId"))?;
        Ok(id.to_string())
    }

    async fn delete_playlist(&self, playlist_id: &str) -> Result<()> {
        let j = self
            .post("playlist/delete", json!({ "playlistId": bare_playlist_id(playlist_id) }))
            .await
            .context("deleting playlist")?;
        check_status(&j)
    }

    async fn get_playlist_items(&self, playlist_id: &str, limit: usize) -> Result<Vec<PlaylistItem>> {
        let first = self
            .post("browse", json!({ "browseId": browse_playlist_id(playlist_id) }))
            .await
            .context("fetching playlist")?;
        if playlist_shelf(&first).is_none() {
            return Err(ApiError::Malformed("musicPlaylistShelfRenderer").into());
        }
        let rows = self.browse_all(&first, limit, playlist_shelf).await?;
        Ok(rows
            .iter()
            .filter_map(parse_list_row)
            .map(|(video_id, title, artists)| PlaylistItem { video_id, title, artists })
            .collect())
    }

    async fn search_songs(&self, query: &str) -> Result<Vec<SearchHit>> {
        let j = self
            .post("search", json!({ "query": query, "params": SONGS_FILTER }))
            .await
            .context("searching songs")?;
        Ok(search_rows(&j)
            .iter()
            .filter_map(parse_list_row)
            .map(|(video_id, title, artists)| SearchHit { video_id, title, artists })
            .collect())
    }

    async fn add_playlist_items(&self, playlist_id: &str, video_ids: &[String]) -> Result<()> {
        let actions: Vec<Value> = video_ids
            .iter()
            .map(|id| {
                let mut action = json!({ "action": "ACTION_ADD_VIDEO", "addedVideoId": id });
                if self.allow_duplicates {
                    action["dedupeOption"] = json!("DEDUPE_OPTION_SKIP");
                }
                action
            })
            .collect();
        let body = json!({ "playlistId": bare_playlist_id(playlist_id), "actions": actions });
        let j = self.post("browse/edit_playlist", body).await?;
        if let Err(e) = check_status(&j) {
            warn!("edit_playlist on {} returned {:#}", playlist_id, e);
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runs(texts: &[&str]) -> Vec<Value> {
        texts.iter().map(|t| json!({ "text": t })).collect()
    }

    #[test]
    fn sapisid_hash_shape() {
        let h = sapisid_hash("abc", 1_700_000_000);
        let digest = h.strip_prefix("SAPISIDHASH 1700000000_").unwrap();
        assert_eq!(digest.len(), 40);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(h, sapisid_hash("abc", 1_700_000_000));
        assert_ne!(h, sapisid_hash("abd", 1_700_000_000));
    }

    #[test]
    fn artists_from_search_subtitle() {
        let a = parse_artists(&runs(&["Song", " • ", "Queen", " & ", "David Bowie", " • ", "Hot Space", " • ", "4:08"]));
        let names: Vec<_> = a.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Queen", "David Bowie"]);
    }

    #[test]
    fn artists_from_playlist_column() {
        let a = parse_artists(&runs(&["Daft Punk", ", ", "Pharrell Williams"]));
        let names: Vec<_> = a.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Daft Punk", "Pharrell Williams"]);
    }

    #[test]
    fn playlist_ids() {
        assert_eq!(browse_playlist_id("PL1"), "VLPL1");
        assert_eq!(browse_playlist_id("VLPL1"), "VLPL1");
        assert_eq!(bare_playlist_id("VLPL1"), "PL1");
    }

    #[test]
    fn continuation_item_is_split_off() {
        let contents = vec![
            json!({ "musicResponsiveListItemRenderer": {} }),
            json!({ "continuationItemRenderer": { "continuationEndpoint": { "continuationCommand": { "token": "T1" } } } }),
        ];
        let (items, token) = split_continuation(&contents, None);
        assert_eq!(items.len(), 1);
        assert_eq!(token.as_deref(), Some("T1"));
    }

    #[test]
    fn edit_status() {
        assert!(check_status(&json!({ "status": "STATUS_SUCCEEDED" })).is_ok());
        assert!(check_status(&json!({})).is_ok());
        assert!(check_status(&json!({ "status": "STATUS_FAILED" })).is_err());
    }
}
