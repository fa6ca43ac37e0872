//! `*`-wildcard matching for allow-lists.

/// Match `candidate` against a pattern where `*` matches any run of
/// characters (including none). A pattern without `*` is an exact match.
pub fn glob_matches(pattern: &str, candidate: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == candidate;
    }

    let parts: Vec<&str> = pattern.split('*').collect();
    let first = parts[0];
    let last = parts[parts.len() - 1];

    if !candidate.starts_with(first) || !candidate.ends_with(last) {
        return false;
    }
    if candidate.len() < first.len() + last.len() {
        // prefix and suffix may not overlap
        return false;
    }

    let mut pos = first.len();
    let tail_start = candidate.len() - last.len();
    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        match candidate[pos..tail_start].find(part) {
            Some(offset) => pos += offset + part.len(),
            None => return false,
        }
    }
    true
}

/// Whether any pattern in `list` matches `candidate`.
pub fn list_contains_glob(list: &[String], candidate: &str) -> bool {
    list.iter().any(|pattern| glob_matches(pattern, candidate))
}
