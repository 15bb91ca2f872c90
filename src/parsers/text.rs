/// Collapses runs of whitespace in a single line or cell into single spaces
pub fn normalize_whitespace_in_segment(segment: &str) -> String {
    segment.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalizes multi-line text: whitespace is collapsed within each line and
/// blank lines are removed, so block boundaries survive as single newlines.
pub fn normalize_lines(text: &str) -> String {
    text.lines()
        .map(normalize_whitespace_in_segment)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
