use std::path::{Path, PathBuf};

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::output::OutputFormat;

/// Normalize a user-supplied file name.
///
/// Lowercases, turns spaces into `-`, strips diacritics (canonical
/// decomposition, combining marks dropped), drops anything outside
/// `[a-z0-9-_.]`, collapses dash runs and trims leading/trailing dashes.
/// Example: `"Cafés Málaga Centro"` → `"cafes-malaga-centro"`
pub fn normalize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let lowered = name.to_lowercase();
    for c in lowered.nfd().filter(|c| !is_combining_mark(*c)) {
        let c = if c == ' ' { '-' } else { c };
        if !(c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.')) {
            continue;
        }
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }
    out.trim_matches('-').to_string()
}

/// Resolve the destination file for a run.
///
/// Without an explicit name the first phrase is used (`"<phrase>-data"`).
/// The format extension is appended unless already present.
pub fn destination_path(
    data_dir: &Path,
    name: Option<&str>,
    first_phrase: &str,
    format: OutputFormat,
) -> PathBuf {
    let given = name.map(normalize_filename).filter(|n| !n.is_empty());
    let mut file = given.unwrap_or_else(|| {
        let stem = normalize_filename(first_phrase);
        format!("{}-data", if stem.is_empty() { "places" } else { &stem })
    });
    let ext = format!(".{}", format.extension());
    if !file.ends_with(&ext) {
        file.push_str(&ext);
    }
    data_dir.join(file)
}
