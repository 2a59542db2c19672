use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_harvest::url::extract_domain;
///
/// let url = Url::parse("https://WWW.TokyoMotion.net/video/1").unwrap();
/// assert_eq!(extract_domain(&url), Some("www.tokyomotion.net".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Moves a URL onto a canonical base, keeping its path and query
///
/// Crawlers use this to collapse mirror hosts (`tokyomotion.net`,
/// `www.tokyomotion.net`, `m.tokyomotion.net`) onto the one host they fetch from.
pub fn rebase_onto(base: &Url, url: &Url) -> Url {
    let mut rebased = base.clone();
    rebased.set_path(url.path());
    rebased.set_query(url.query());
    rebased.set_fragment(None);
    rebased
}

/// Resolves an `href` against a base URL
///
/// Returns None if the link should be ignored:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - anything that is not HTTP(S) after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
        Some(absolute_url)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.tokyomotion.net/user/alice/videos").unwrap()
    }

    #[test]
    fn test_extract_with_port() {
        let url = Url::parse("http://127.0.0.1:8080/").unwrap();
        assert_eq!(extract_domain(&url), Some("127.0.0.1".to_string()));
    }

    #[test]
    fn test_extract_uppercase_converted_to_lowercase() {
        let url = Url::parse("https://XBUNKR.COM/a/abc").unwrap();
        assert_eq!(extract_domain(&url), Some("xbunkr.com".to_string()));
    }

    #[test]
    fn test_rebase_keeps_path_and_query() {
        let url = Url::parse("https://m.tokyomotion.net/user/bob/videos?page=2#top").unwrap();
        let rebased = rebase_onto(&base(), &url);
        assert_eq!(
            rebased.as_str(),
            "https://www.tokyomotion.net/user/bob/videos?page=2"
        );
    }

    #[test]
    fn test_resolve_root_relative_link() {
        let resolved = resolve_link("/video/123/clip", &base()).unwrap();
        assert_eq!(resolved.as_str(), "https://www.tokyomotion.net/video/123/clip");
    }

    #[test]
    fn test_resolve_absolute_link() {
        let resolved = resolve_link("https://cdn.example.com/a.mp4", &base()).unwrap();
        assert_eq!(resolved.as_str(), "https://cdn.example.com/a.mp4");
    }

    #[test]
    fn test_skip_special_links() {
        assert!(resolve_link("javascript:void(0)", &base()).is_none());
        assert!(resolve_link("mailto:a@b.c", &base()).is_none());
        assert!(resolve_link("#section", &base()).is_none());
        assert!(resolve_link("   ", &base()).is_none());
        assert!(resolve_link("ftp://example.com/file", &base()).is_none());
    }
}
