use once_cell::sync::Lazy;
use regex::Regex;

// Unicode "Other" (Cc, Cf, Cn, Co, Cs) and "Symbol" (Sc, Sk, Sm, So) plus
// characters rejected in file names.
static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\p{C}\p{S}\\/*?:"<>|]"#).expect("valid sanitizer regex"));

/// Make an exported playlist name safe to use as a remote playlist title.
///
/// Emoji, pictographs, control/format characters and `\ / * ? : " < > |` are
/// removed; letters (including accented ones), digits, punctuation and spaces
/// are kept with their original case. Leading and trailing whitespace is trimmed.
pub fn sanitize_playlist_name(name: &str) -> String {
    UNSAFE_CHARS.replace_all(name, "").trim().to_string()
}
