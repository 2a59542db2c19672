use crate::crawler::{Pager, SiteInfo};
use crate::http::Page;
use crate::item::{filename_and_ext, MediaItem, ScrapeItem};
use crate::limiter::{LimitSpec, RateLimiter};
use crate::manager::Manager;
use crate::storage::{ProgressStore, ProgressValue};
use crate::url::normalize;
use crate::ScrapeError;
use std::sync::Arc;
use url::Url;

/// Helpers shared by every crawler
///
/// Each crawler owns one `CrawlerBase`. It carries the site description, the
/// canonical base URL, the crawler's own domain limiter and a handle on the
/// manager.
pub struct CrawlerBase {
    manager: Arc<Manager>,
    site: &'static SiteInfo,
    base_url: Url,
    limiter: Arc<RateLimiter>,
}

impl CrawlerBase {
    /// Creates the helpers for a site
    ///
    /// # Arguments
    ///
    /// * `manager` - The run's manager
    /// * `site` - Static description of the site
    /// * `base_url` - Canonical base that relative links resolve against
    /// * `default_limit` - Domain limiter used when configuration has no override
    pub fn new(
        manager: Arc<Manager>,
        site: &'static SiteInfo,
        base_url: Url,
        default_limit: LimitSpec,
    ) -> Self {
        let limiter = manager.limiters().for_domain(site.domain, default_limit);
        Self {
            manager,
            site,
            base_url,
            limiter,
        }
    }

    pub fn manager(&self) -> &Manager {
        &self.manager
    }

    pub fn site(&self) -> &'static SiteInfo {
        self.site
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Fetches a page through the cache and this crawler's limiter
    pub async fn get_page(&self, url: &Url) -> Result<Page, ScrapeError> {
        self.manager.client().get(&self.limiter, url).await
    }

    /// Starts a pager at `start`, following `next_attr` of `next_selector`
    pub fn pager(&self, start: Url, next_selector: &str, next_attr: &str) -> Pager<'_> {
        Pager::new(
            self,
            start,
            next_selector,
            next_attr,
            self.manager.config().crawler.max_pages,
        )
    }

    /// Builds a child item of `parent`
    pub fn create_scrape_item(
        &self,
        parent: &ScrapeItem,
        url: Url,
        new_title_part: Option<&str>,
        part_of_album: bool,
        album_id: Option<String>,
    ) -> ScrapeItem {
        parent.create_child(
            url,
            new_title_part,
            part_of_album,
            album_id,
            self.manager.config().general.max_folder_name_length,
        )
    }

    /// Builds a folder title for a collection
    ///
    /// Empty titles become "Untitled". The album id is appended when
    /// `include-album-id-in-folder-name` is set, and the site's folder domain
    /// unless `remove-domains-from-folder-names` is set.
    pub fn create_title(&self, title: &str, album_id: Option<&str>) -> String {
        let options = &self.manager.config().download_options;

        let mut title = match title.trim() {
            "" => "Untitled".to_string(),
            t => t.to_string(),
        };

        if options.include_album_id_in_folder_name {
            if let Some(id) = album_id {
                title = format!("{} {}", title, id);
            }
        }

        if !options.remove_domains_from_folder_names {
            title = format!("{} ({})", title, self.site.folder_domain);
        }

        title
    }

    /// Hands a resolved media URL to the download stage
    pub async fn handle_file(
        &self,
        url: Url,
        item: &ScrapeItem,
        filename: String,
        ext: String,
        custom_filename: Option<String>,
    ) -> Result<(), ScrapeError> {
        tracing::debug!(url = %url, filename = %filename, lineage = item.parent_title(), "Found media");

        let media = MediaItem {
            url,
            origin: item.clone(),
            filename,
            ext,
            custom_filename,
        };
        self.manager.sink().handle_file(media).await?;
        self.manager.progress().record_media();
        Ok(())
    }

    /// Splits a file name using the configured maximum length
    pub fn filename_and_ext(&self, name: &str) -> Result<(String, String), ScrapeError> {
        filename_and_ext(name, self.manager.config().general.max_file_name_length)
    }

    /// Whether an operation on `url` already finished in this or an earlier run
    pub fn check_complete(&self, url: &Url) -> Result<bool, ScrapeError> {
        let value = self.manager.storage().get(&completion_key(url))?;
        Ok(value.and_then(|v| v.as_bool()).unwrap_or(false))
    }

    /// Records that the operation on `url` finished
    pub fn mark_complete(&self, url: &Url) -> Result<(), ScrapeError> {
        self.manager
            .storage()
            .save(&completion_key(url), ProgressValue::Bool(true))?;
        Ok(())
    }
}

/// Progress store key marking a URL as completed
pub fn completion_key(url: &Url) -> String {
    let normalized = normalize(url.clone()).unwrap_or_else(|_| url.clone());
    format!("completed:{}", normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::crawler::{ChannelSink, SiteKind};
    use crate::storage::MemoryStorage;

    static TEST_SITE: SiteInfo = SiteInfo {
        name: "testsite",
        domain: "testsite.example",
        folder_domain: "TestSite",
        host_patterns: &["*.testsite.example"],
        kind: SiteKind::FileHost,
    };

    fn create_test_base(config: Config) -> (CrawlerBase, tokio::sync::mpsc::UnboundedReceiver<MediaItem>) {
        let (sink, rx) = ChannelSink::new();
        let manager =
            Manager::with_storage(config, Arc::new(MemoryStorage::new()), Arc::new(sink)).unwrap();
        let base = CrawlerBase::new(
            manager,
            &TEST_SITE,
            Url::parse("https://testsite.example").unwrap(),
            LimitSpec::per_second(10),
        );
        (base, rx)
    }

    #[test]
    fn test_create_title_defaults() {
        let (base, _rx) = create_test_base(Config::default());
        assert_eq!(base.create_title("My Album", Some("abc")), "My Album (TestSite)");
        assert_eq!(base.create_title("   ", None), "Untitled (TestSite)");
    }

    #[test]
    fn test_create_title_options() {
        let mut config = Config::default();
        config.download_options.include_album_id_in_folder_name = true;
        config.download_options.remove_domains_from_folder_names = true;
        let (base, _rx) = create_test_base(config);

        assert_eq!(base.create_title("My Album", Some("abc")), "My Album abc");
        assert_eq!(base.create_title("My Album", None), "My Album");
    }

    #[test]
    fn test_completion_roundtrip() {
        let (base, _rx) = create_test_base(Config::default());
        let url = Url::parse("https://testsite.example/a/1/").unwrap();

        assert!(!base.check_complete(&url).unwrap());
        base.mark_complete(&url).unwrap();

        // Equivalent spellings share the key
        let same = Url::parse("https://testsite.example/a/1#x").unwrap();
        assert!(base.check_complete(&same).unwrap());
    }

    #[tokio::test]
    async fn test_handle_file_reaches_sink_and_counts() {
        let (base, mut rx) = create_test_base(Config::default());
        let item = ScrapeItem::new(Url::parse("https://testsite.example/a/1").unwrap());
        let url = Url::parse("https://cdn.testsite.example/1.jpg").unwrap();

        base.handle_file(url.clone(), &item, "1.jpg".to_string(), ".jpg".to_string(), None)
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap().url, url);
        assert_eq!(base.manager().progress().media(), 1);
    }

    #[test]
    fn test_shares_domain_limiter() {
        let (base, _rx) = create_test_base(Config::default());
        let again = base
            .manager()
            .limiters()
            .for_domain("testsite.example", LimitSpec::per_second(99));
        assert_eq!(again.capacity(), base.limiter().capacity());
    }
}
