use std::fs::File;
use std::io::Write;
use tempfile::tempdir;

use ytmusic_playlist_importer::error::ImportError;
use ytmusic_playlist_importer::importer::load_export;

fn write(dir: &std::path::Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut f = File::create(&path).unwrap();
    f.write_all(body.as_bytes()).unwrap();
    path
}

#[test]
fn loads_playlists_in_file_order() {
    let td = tempdir().unwrap();
    let path = write(
        td.path(),
        "playlists.json",
        r#"[
            {"playlist_name": "Road Trip 🚗", "description": "summer", "tracks": [
                {"name": "Song A", "artist": "Artist X"},
                {"name": "Song B", "artist": "Artist Y"}
            ]},
            {"playlist_name": "Empty", "tracks": []}
        ]"#,
    );

    let playlists = load_export(&path).expect("parse export");
    assert_eq!(playlists.len(), 2);
    assert_eq!(playlists[0].name, "Road Trip 🚗");
    assert_eq!(playlists[0].description, "summer");
    assert_eq!(playlists[0].tracks[1].name, "Song B");
    assert_eq!(playlists[1].description, "");
    assert!(playlists[1].tracks.is_empty());
}

#[test]
fn missing_file_is_input_error() {
    let td = tempdir().unwrap();
    let res = load_export(&td.path().join("nope.json"));
    assert!(matches!(res, Err(ImportError::InputMissing { .. })));
}

#[test]
fn malformed_json_is_input_error() {
    let td = tempdir().unwrap();
    let path = write(td.path(), "bad.json", "[{\"playlist_name\": ");
    assert!(matches!(load_export(&path), Err(ImportError::InputParse { .. })));
}

#[test]
fn missing_required_fields_fail_at_load() {
    let td = tempdir().unwrap();
    let no_tracks = write(td.path(), "a.json", r#"[{"playlist_name": "X"}]"#);
    assert!(matches!(load_export(&no_tracks), Err(ImportError::InputParse { .. })));

    let no_artist = write(td.path(), "b.json", r#"[{"playlist_name": "X", "tracks": [{"name": "S"}]}]"#);
    let err = load_export(&no_artist).unwrap_err();
    assert!(matches!(err, ImportError::InputParse { .. }));
    assert!(err.to_string().contains("artist"));
}

#[test]
fn top_level_must_be_an_array() {
    let td = tempdir().unwrap();
    let path = write(td.path(), "obj.json", r#"{"playlist_name": "X", "tracks": []}"#);
    assert!(matches!(load_export(&path), Err(ImportError::InputParse { .. })));
}
