//! TokyoMotion crawler
//!
//! Supports single videos and the per-user `videos` / `favorite` listings.
//! Every host alias is rebased onto `www.tokyomotion.net` before routing, so
//! cache and progress keys do not depend on which mirror a link used.

use crate::crawler::{
    handle_errors, Crawler, CrawlerBase, Operation, Outcome, SiteInfo, SiteKind,
};
use crate::item::{ItemType, ScrapeItem};
use crate::limiter::LimitSpec;
use crate::manager::Manager;
use crate::url::{normalize, rebase_onto, resolve_link};
use crate::{HarvestError, ScrapeError};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

pub static SITE: SiteInfo = SiteInfo {
    name: "tokyomotion",
    domain: "tokyomotion.net",
    folder_domain: "Tokyomotion",
    host_patterns: &["*.tokyomotion.net"],
    kind: SiteKind::FileHost,
};

const BASE_URL: &str = "https://www.tokyomotion.net";
const NEXT_PAGE_SELECTOR: &str = "a.prevnext";
const VIDEO_LINK_SELECTOR: &str = r#"a[href^="/video/"]"#;
const HD_SOURCE_SELECTOR: &str = r#"source[title="HD"]"#;
const SD_SOURCE_SELECTOR: &str = r#"source[title="SD"]"#;
const TITLE_SUFFIX: &str = " - TOKYO Motion";
const PRIVATE_VIDEO_MARKER: &str = "This is a private video";

pub struct TokyoMotionCrawler {
    base: CrawlerBase,
}

impl TokyoMotionCrawler {
    pub fn new(manager: Arc<Manager>) -> Result<Self, HarvestError> {
        Ok(Self::with_base_url(manager, Url::parse(BASE_URL)?))
    }

    /// Creates the crawler against another canonical host (mirrors, tests)
    pub fn with_base_url(manager: Arc<Manager>, base_url: Url) -> Self {
        Self {
            base: CrawlerBase::new(manager, &SITE, base_url, LimitSpec::per_second(10)),
        }
    }
}

fn path_parts(url: &Url) -> Vec<String> {
    url.path_segments()
        .map(|segments| {
            segments
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Returns the path segment following `marker`
fn part_after(parts: &[String], marker: &str) -> Option<String> {
    let position = parts.iter().position(|p| p == marker)?;
    parts.get(position + 1).cloned()
}

#[async_trait]
impl Crawler for TokyoMotionCrawler {
    fn base(&self) -> &CrawlerBase {
        &self.base
    }

    fn canonicalize(&self, url: &Url) -> Url {
        rebase_onto(self.base.base_url(), url)
    }

    fn route(&self, url: &Url) -> Operation {
        let parts = path_parts(url);
        let has = |name: &str| parts.iter().any(|p| p == name);

        if has("video") {
            Operation::Video
        } else if has("videos") {
            Operation::Playlist
        } else if has("photo") {
            Operation::Photo
        } else if has("albums") || has("photos") {
            Operation::Album
        } else if has("user") {
            Operation::Profile
        } else {
            Operation::Search
        }
    }

    async fn video(&self, item: &mut ScrapeItem) -> Result<(), ScrapeError> {
        let page = self.base.get_page(&item.url).await?;

        let source = match page.select_attr(HD_SOURCE_SELECTOR, "src")? {
            Some(src) => Some(src),
            None => page.select_attr(SD_SOURCE_SELECTOR, "src")?,
        };
        let source = match source {
            Some(src) => src,
            None if page.contains_text(PRIVATE_VIDEO_MARKER) => {
                return Err(ScrapeError::Restricted {
                    url: item.url.to_string(),
                    reason: "Private video".to_string(),
                });
            }
            None => return Err(page.extraction_error("could not find video source")),
        };

        let link = resolve_link(&source, &item.url)
            .ok_or_else(|| page.extraction_error(format!("invalid video source '{}'", source)))?;

        let video_id = part_after(&path_parts(&item.url), "video")
            .ok_or_else(|| page.extraction_error("missing video id in URL"))?;
        let title = page
            .title()
            .and_then(|t| t.split(TITLE_SUFFIX).next().map(|s| s.trim().to_string()))
            .unwrap_or_default();

        // The media server URL changes per request, so the extension is fixed
        let filename = format!("{}.mp4", video_id);
        let (custom_filename, _) = self
            .base
            .filename_and_ext(&format!("{} [{}].mp4", title, video_id))?;

        self.base
            .handle_file(link, item, filename, ".mp4".to_string(), Some(custom_filename))
            .await
    }

    async fn playlist(&self, item: &mut ScrapeItem) -> Result<(), ScrapeError> {
        let config = self.base.manager().config();
        item.set_type(
            ItemType::FileHostProfile,
            &config.download_options.maximum_number_of_children,
        );

        let parts = path_parts(&item.url);
        let title = if parts.iter().any(|p| p == "favorite") {
            "favorites"
        } else {
            "videos"
        };
        if let Some(user) = part_after(&parts, "user") {
            if !item.parent_title().split('/').any(|p| p == user) {
                item.add_to_parent_title(&user, config.general.max_folder_name_length);
            }
        }

        let mut seen = HashSet::new();
        let mut pager = self.base.pager(item.url.clone(), NEXT_PAGE_SELECTOR, "href");

        while let Some(page) = pager.next_page().await {
            let page = page?;
            let links = page.select_links(VIDEO_LINK_SELECTOR, "href", self.base.base_url())?;

            for link in links {
                let key = normalize(link.clone()).unwrap_or_else(|_| link.clone());
                if !seen.insert(key) {
                    continue;
                }

                item.ensure_capacity()?;
                let mut child = self.base.create_scrape_item(item, link, Some(title), false, None);
                let outcome = handle_errors(
                    self.base.manager(),
                    child.origin(),
                    self.run_operation(Operation::Video, &mut child),
                )
                .await?;

                // Videos an earlier run finished do not use up the budget
                match outcome {
                    Outcome::Completed => item.record_child(),
                    Outcome::Skipped => {}
                    Outcome::Failed(_) => item.record_failed_child(),
                }
            }
        }

        tracing::debug!(url = %item.url, videos = item.children(), pages = pager.pages_yielded(), "Playlist done");
        Ok(())
    }
}
