/// Characters kept before the match.
pub const SNIPPET_LOOKBEHIND: usize = 25;

/// Characters kept after the end of the match.
pub const SNIPPET_LOOKAHEAD: usize = 35;

/// Queries shorter than this never produce a snippet.
pub const MIN_QUERY_CHARS: usize = 2;

const ELLIPSIS: &str = "...";

/// Extract an excerpt of `content` around the first case-insensitive
/// occurrence of `query`.
///
/// Positions are counted in `char`s. The window spans
/// `[max(0, i - 25), min(n, i + len + 35))` for a match at `i`, and is
/// marked with `...` on each side that was clipped.
///
/// Returns `None` if there is no content, the query is shorter than
/// [`MIN_QUERY_CHARS`], or the query does not occur.
///
/// # Examples
///
/// ```
/// use cartorio::snippet::extract_snippet;
///
/// let text = "Outorgante: João Santos. Outorgado: Dr. Advogado.";
/// let snippet = extract_snippet(Some(text), "santos").unwrap();
/// assert!(snippet.starts_with("Outorgante: João Santos"));
/// assert!(extract_snippet(Some(text), "s").is_none());
/// ```
pub fn extract_snippet(content: Option<&str>, query: &str) -> Option<String> {
    let content = content?;
    let needle: Vec<char> = query.chars().collect();
    if needle.len() < MIN_QUERY_CHARS {
        return None;
    }

    let haystack: Vec<char> = content.chars().collect();
    let idx = find_ignore_case(&haystack, &needle)?;

    let start = idx.saturating_sub(SNIPPET_LOOKBEHIND);
    let end = (idx + needle.len() + SNIPPET_LOOKAHEAD).min(haystack.len());

    let mut snippet = String::with_capacity(end - start + 2 * ELLIPSIS.len());
    if start > 0 {
        snippet.push_str(ELLIPSIS);
    }
    snippet.extend(&haystack[start..end]);
    if end < haystack.len() {
        snippet.push_str(ELLIPSIS);
    }

    Some(snippet)
}

/// Index of the first window of `haystack` equal to `needle` ignoring case.
fn find_ignore_case(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }

    (0..=haystack.len() - needle.len()).find(|&i| {
        haystack[i..i + needle.len()]
            .iter()
            .zip(needle)
            .all(|(&a, &b)| chars_eq_ignore_case(a, b))
    })
}

fn chars_eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}
