//! Request addressing: URL normalization and container classification.

use music_player_types::ContainerType;

/// Scheme prepended to bare paths.
pub const FILE_SCHEME: &str = "file://";

const KNOWN_SCHEMES: [&str; 3] = [FILE_SCHEME, "http://", "https://"];

/// Normalize a raw path into URL form.
///
/// Strings that already carry `file://`, `http://` or `https://` are returned
/// unchanged; everything else gets `file://` prepended. Existence is not
/// checked here, a bad path surfaces at fetch time.
pub fn resolve_url(path: &str) -> String {
    if KNOWN_SCHEMES.iter().any(|scheme| path.starts_with(scheme)) {
        path.to_string()
    } else {
        format!("{FILE_SCHEME}{path}")
    }
}

/// Pick the container from the URL suffix.
///
/// Case-sensitive: `.wav` and `.mp3` are recognized, anything else
/// (including `.WAV`) is treated as Ogg and left for the decoder to reject.
pub fn classify(url: &str) -> ContainerType {
    if url.ends_with(".wav") {
        ContainerType::Wav
    } else if url.ends_with(".mp3") {
        ContainerType::Mp3
    } else {
        ContainerType::Ogg
    }
}

/// Display name for a clip: the last path segment without its extension.
pub fn clip_name(url: &str) -> String {
    let file = url.rsplit('/').next().unwrap_or(url);
    match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => file.to_string(),
    }
}
