/// Split operator text into search phrases.
///
/// Newlines, commas and semicolons all separate phrases. Segments are
/// trimmed and empty ones dropped; order and repeats are preserved.
/// An empty result means the operator gave nothing usable.
pub fn expand_phrases(text: &str) -> Vec<String> {
    text.split(['\n', ',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
