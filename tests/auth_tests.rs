use std::fs;
use tempfile::tempdir;

use ytmusic_playlist_importer::api::auth::BrowserAuth;
use ytmusic_playlist_importer::api::ytmusic::YtMusicProvider;

const HEADERS: &str = "accept: */*\n\
    content-type: application/json\n\
    cookie: VISITOR_INFO1_LIVE=v; SAPISID=secret/abc; SID=s\n\
    user-agent: Mozilla/5.0\n\
    x-goog-authuser: 0\n";

#[test]
fn setup_writes_generated_auth_file() {
    let td = tempdir().unwrap();
    let headers = td.path().join("headers.txt");
    fs::write(&headers, HEADERS).unwrap();
    let out = td.path().join("nested").join("browser.json");

    let auth = BrowserAuth::setup(&headers, &out).expect("setup auth");
    assert!(out.exists());

    let loaded = BrowserAuth::load(&out).expect("load generated auth");
    assert_eq!(loaded, auth);
    assert_eq!(loaded.sapisid().unwrap(), "secret/abc");
    assert!(!loaded.headers.contains_key("content-type"));
}

#[test]
fn setup_fails_for_missing_headers_file() {
    let td = tempdir().unwrap();
    let res = BrowserAuth::setup(&td.path().join("missing.txt"), &td.path().join("browser.json"));
    assert!(res.is_err());
    assert!(!td.path().join("browser.json").exists());
}

#[test]
fn setup_fails_without_session_cookie() {
    let td = tempdir().unwrap();
    let headers = td.path().join("headers.txt");
    fs::write(&headers, "user-agent: Mozilla/5.0\n").unwrap();
    assert!(BrowserAuth::setup(&headers, &td.path().join("browser.json")).is_err());
}

#[test]
fn load_rejects_garbage() {
    let td = tempdir().unwrap();
    let path = td.path().join("browser.json");
    fs::write(&path, "not json").unwrap();
    assert!(BrowserAuth::load(&path).is_err());
}

#[test]
fn provider_requires_signed_session() {
    let td = tempdir().unwrap();
    let path = td.path().join("browser.json");
    fs::write(&path, r#"{"cookie": "SAPISID=x"}"#).unwrap();
    let auth = BrowserAuth::load(&path).unwrap();
    assert!(YtMusicProvider::with_base_url(auth, "http://127.0.0.1:1").is_ok());
}
