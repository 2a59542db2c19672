//! XBunkr crawler
//!
//! Hosts containing `media` serve files directly; every other URL is an album
//! page listing its images as `a.image` links.

use crate::crawler::{Crawler, CrawlerBase, Operation, SiteInfo, SiteKind};
use crate::item::{url_file_name, ItemType, ScrapeItem};
use crate::limiter::LimitSpec;
use crate::manager::Manager;
use crate::{HarvestError, ScrapeError};
use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

pub static SITE: SiteInfo = SiteInfo {
    name: "xbunkr",
    domain: "xbunkr.com",
    folder_domain: "XBunkr",
    host_patterns: &["*.xbunkr.com"],
    kind: SiteKind::FileHost,
};

const BASE_URL: &str = "https://xbunkr.com";
const TITLE_SELECTOR: &str = "h1#title";
const IMAGE_LINK_SELECTOR: &str = "a.image";

pub struct XBunkrCrawler {
    base: CrawlerBase,
}

impl XBunkrCrawler {
    pub fn new(manager: Arc<Manager>) -> Result<Self, HarvestError> {
        Ok(Self::with_base_url(manager, Url::parse(BASE_URL)?))
    }

    pub fn with_base_url(manager: Arc<Manager>, base_url: Url) -> Self {
        Self {
            base: CrawlerBase::new(manager, &SITE, base_url, LimitSpec::per_second(10)),
        }
    }
}

fn is_media_host(url: &Url) -> bool {
    url.host_str().map_or(false, |host| host.contains("media"))
}

#[async_trait]
impl Crawler for XBunkrCrawler {
    fn base(&self) -> &CrawlerBase {
        &self.base
    }

    fn route(&self, url: &Url) -> Operation {
        if is_media_host(url) {
            Operation::File
        } else {
            Operation::Album
        }
    }

    async fn file(&self, item: &mut ScrapeItem) -> Result<(), ScrapeError> {
        let name = url_file_name(&item.url).unwrap_or_default();
        let (filename, ext) = self.base.filename_and_ext(&name)?;
        self.base
            .handle_file(item.url.clone(), item, filename, ext, None)
            .await
    }

    async fn album(&self, item: &mut ScrapeItem) -> Result<(), ScrapeError> {
        let page = self.base.get_page(&item.url).await?;

        let album_id = item
            .url
            .path_segments()
            .and_then(|mut segments| segments.nth(1))
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or_else(|| page.extraction_error("missing album id in URL"))?;

        let config = self.base.manager().config();
        item.mark_part_of_album(album_id.clone());
        item.set_type(
            ItemType::FileHostAlbum,
            &config.download_options.maximum_number_of_children,
        );

        let heading = page.select_text(TITLE_SELECTOR)?.unwrap_or_default();
        let title = self.base.create_title(&heading, Some(&album_id));

        let links = page.select_links(IMAGE_LINK_SELECTOR, "href", &item.url)?;
        tracing::debug!(url = %item.url, album = %album_id, images = links.len(), "Parsed album");

        for link in links {
            let name = url_file_name(&link).unwrap_or_default();
            let (filename, ext) = match self.base.filename_and_ext(&name) {
                Ok(parts) => parts,
                Err(e) => {
                    tracing::warn!(url = %link, "Couldn't get extension: {}", e);
                    continue;
                }
            };

            item.accept_child()?;
            let child = self.base.create_scrape_item(item, link.clone(), Some(&title), true, None);
            self.base.handle_file(link, &child, filename, ext, None).await?;
        }

        Ok(())
    }
}
