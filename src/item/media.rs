use crate::item::ScrapeItem;
use crate::ScrapeError;
use url::Url;

/// Characters that cannot appear in a file or folder name
const FORBIDDEN_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*', '\''];

/// Longest accepted extension, dot included
const MAX_EXTENSION_LEN: usize = 5;

/// A resolved media URL handed to the download stage
///
/// The crawl core's responsibility ends once this value is handed to a
/// [`MediaSink`](crate::crawler::MediaSink).
#[derive(Debug, Clone)]
pub struct MediaItem {
    /// Direct URL of the media file
    pub url: Url,

    /// The item the media was found under
    pub origin: ScrapeItem,

    /// File name including the lowercased extension
    pub filename: String,

    /// Extension with its leading dot
    pub ext: String,

    /// Display name preferred over `filename` when set
    pub custom_filename: Option<String>,
}

/// Splits a file name into (`name.ext`, `.ext`)
///
/// The extension is lowercased. Names without an extension, or with one longer
/// than four characters, are rejected because the download stage cannot place
/// them.
///
/// # Examples
///
/// ```
/// use sumi_harvest::item::filename_and_ext;
///
/// let (name, ext) = filename_and_ext("Holiday.JPG", 95).unwrap();
/// assert_eq!(name, "Holiday.jpg");
/// assert_eq!(ext, ".jpg");
///
/// assert!(filename_and_ext("README", 95).is_err());
/// ```
pub fn filename_and_ext(name: &str, max_len: usize) -> Result<(String, String), ScrapeError> {
    let name = name.trim();
    let no_extension = || ScrapeError::NoExtension {
        name: name.to_string(),
    };

    let dot = name.rfind('.').ok_or_else(no_extension)?;
    let (stem, suffix) = name.split_at(dot);

    if stem.is_empty() || suffix.len() < 2 || suffix.len() > MAX_EXTENSION_LEN {
        return Err(no_extension());
    }

    let ext = suffix.to_lowercase();
    let stem_budget = max_len.saturating_sub(ext.chars().count()).max(1);
    let stem = sanitize_name(stem, stem_budget);
    if stem.is_empty() {
        return Err(no_extension());
    }

    Ok((format!("{}{}", stem, ext), ext))
}

/// Returns the percent-decoded last path segment of a URL, if any
///
/// A segment that does not decode to UTF-8 is returned as written.
pub fn url_file_name(url: &Url) -> Option<String> {
    let segment = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())?;

    match urlencoding::decode(segment) {
        Ok(decoded) => Some(decoded.into_owned()),
        Err(_) => Some(segment.to_string()),
    }
}

/// Removes characters that are invalid in paths and truncates to `max_len`
pub fn sanitize_name(name: &str, max_len: usize) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !FORBIDDEN_CHARS.contains(c) && !c.is_control())
        .collect();

    cleaned
        .trim()
        .chars()
        .take(max_len)
        .collect::<String>()
        .trim()
        .to_string()
}
