//! Free-text target list parsing.

/// Split operator input into target tokens.
///
/// Newlines and commas are interchangeable separators. Tokens are trimmed,
/// empty ones dropped, order and duplicates preserved.
pub fn parse_targets(raw: &str) -> Vec<String> {
    raw.split(['\n', ','])
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
