/// Checks if a domain (or host + path) matches a wildcard pattern
///
/// Patterns are globs where `*` matches any run of characters, dots included.
/// A leading `*.` additionally matches the bare domain, so:
/// 1. Exact match: "example.com" matches only "example.com"
/// 2. Wildcard match: "*.example.com" matches:
///    - "example.com" (the bare domain)
///    - "blog.example.com" (single subdomain)
///    - "api.v2.example.com" (nested subdomains)
/// 3. Infix wildcards: "*.bunkr.*" matches "bunkr.si" and "cdn.bunkr.ru"
///
/// # Arguments
///
/// * `pattern` - The domain pattern
/// * `candidate` - The domain to check against the pattern
///
/// # Examples
///
/// ```
/// use sumi_harvest::url::matches_wildcard;
///
/// assert!(matches_wildcard("example.com", "example.com"));
/// assert!(!matches_wildcard("example.com", "other.com"));
///
/// assert!(matches_wildcard("*.example.com", "example.com"));
/// assert!(matches_wildcard("*.example.com", "api.v2.example.com"));
/// assert!(matches_wildcard("*.bunkr.*", "bunkr.si"));
/// assert!(!matches_wildcard("*.example.com", "example.org"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    if let Some(base) = pattern.strip_prefix("*.") {
        // Wildcard pattern: matches the base domain itself or any subdomain
        glob_match(base.as_bytes(), candidate.as_bytes())
            || glob_match(pattern.as_bytes(), candidate.as_bytes())
    } else {
        glob_match(pattern.as_bytes(), candidate.as_bytes())
    }
}

/// Returns how specific a pattern is: the number of literal (non-`*`) characters
///
/// When several patterns match the same candidate, the one with the highest
/// specificity wins.
pub fn specificity(pattern: &str) -> usize {
    pattern.chars().filter(|c| *c != '*').count()
}

/// Picks the value attached to the most specific pattern matching `candidate`
///
/// Ties keep the first pattern in iteration order.
pub fn best_match<'a, T, I>(entries: I, candidate: &str) -> Option<T>
where
    I: IntoIterator<Item = (&'a str, T)>,
{
    let mut best: Option<(usize, T)> = None;

    for (pattern, value) in entries {
        if !matches_wildcard(pattern, candidate) {
            continue;
        }
        let score = specificity(pattern);
        match &best {
            Some((best_score, _)) if *best_score >= score => {}
            _ => best = Some((score, value)),
        }
    }

    best.map(|(_, value)| value)
}

/// Iterative glob matcher with single-star backtracking
fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    let (mut p, mut t) = (0, 0);
    let mut star: Option<usize> = None;
    let mut resume = 0;

    while t < text.len() {
        if p < pattern.len() && pattern[p] == b'*' {
            star = Some(p);
            p += 1;
            resume = t;
        } else if p < pattern.len() && pattern[p] == text[t] {
            p += 1;
            t += 1;
        } else if let Some(star_pos) = star {
            p = star_pos + 1;
            resume += 1;
            t = resume;
        } else {
            return false;
        }
    }

    while p < pattern.len() && pattern[p] == b'*' {
        p += 1;
    }

    p == pattern.len()
}
