//! Expected MIME families per file extension.

use mime::Mime;

/// Extensions whose content does not sniff as the registered MIME type.
const OVERRIDES: &[(&str, &[&str])] = &[
    ("hdf5", &["text/plain"]),
    ("joblib", &["application/octet-stream"]),
    ("python_pickle", &["application/octet-stream"]),
    ("ipynb", &["application/json"]),
    ("onnx", &["application/json"]),
    ("tfrecord", &["application/octet-stream"]),
    ("jsonl", &["application/json", "application/x-ndjson"]),
];

/// MIME types acceptable for content declared with `extension`.
///
/// Returns `None` for extensions nothing is known about.
pub fn expected_mime_types(extension: &str) -> Option<Vec<Mime>> {
    let extension = extension.trim_start_matches('.').to_ascii_lowercase();
    if let Some((_, types)) = OVERRIDES.iter().find(|(ext, _)| *ext == extension) {
        return Some(types.iter().filter_map(|t| t.parse().ok()).collect());
    }

    let guessed: Vec<Mime> = mime_guess::from_ext(&extension).iter().collect();
    (!guessed.is_empty()).then_some(guessed)
}

/// Returns `true` if `actual` matches one of `expected`, ignoring parameters.
pub fn matches_any(actual: &str, expected: &[Mime]) -> bool {
    let Ok(actual) = actual.parse::<Mime>() else {
        return false;
    };
    expected
        .iter()
        .any(|mime| mime.essence_str() == actual.essence_str())
}
