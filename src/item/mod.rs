//! Crawl items and the download hand-off
//!
//! - `ScrapeItem`: the unit of crawl state passed between pipeline stages
//! - `ItemType`: closed classification used to resolve fan-out limits
//! - `MediaItem`: the tuple handed to the download stage once a direct media
//!   URL is known

mod media;
mod scrape_item;

pub use media::{filename_and_ext, sanitize_name, url_file_name, MediaItem};
pub use scrape_item::{ItemOrigin, ScrapeItem};

use std::fmt;

/// Classification of a crawl item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    /// A forum thread
    Forum,

    /// A single post inside a forum thread
    ForumPost,

    /// A user profile on a file host
    FileHostProfile,

    /// An album on a file host
    FileHostAlbum,
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Forum => "forum",
            Self::ForumPost => "forum-post",
            Self::FileHostProfile => "file-host-profile",
            Self::FileHostAlbum => "file-host-album",
        };
        f.write_str(name)
    }
}
