pub(crate) fn formatter_str(s: &str) -> String {
    let end = s.char_indices().nth(20).map_or(s.len(), |(i, _c)| i);
    s[..end].escape_default().to_string()
}
