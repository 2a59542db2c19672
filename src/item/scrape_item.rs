use crate::config::ChildrenLimits;
use crate::item::media::sanitize_name;
use crate::item::ItemType;
use crate::ScrapeError;
use url::Url;

/// The unit of crawl work
///
/// A ScrapeItem is owned by exactly one operation at a time. Children are
/// built from a parent with [`ScrapeItem::create_child`]; they copy the
/// parent's lineage by value and hold no reference back to it.
#[derive(Debug, Clone)]
pub struct ScrapeItem {
    /// Absolute URL being processed
    pub url: Url,

    /// Slash-joined folder titles from the seed down to this item
    parent_title: String,

    /// Classification, fixed once the item is recognised
    item_type: Option<ItemType>,

    /// Identifier of the collection this item belongs to
    album_id: Option<String>,

    /// Whether the item was recognised as a member of a collection
    part_of_album: bool,

    /// Descendants accepted so far
    children: u32,

    /// Descendants whose operation failed
    failed_children: u32,

    /// Maximum accepted descendants (0 = unlimited)
    children_limit: u32,

    /// Whether `children_limit` has been read from configuration
    limit_resolved: bool,

    /// URLs this item was created from, oldest first
    parents: Vec<Url>,
}

/// Snapshot of an item used for error reports after the item is borrowed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOrigin {
    pub url: Url,
    pub lineage: String,
}

impl ScrapeItem {
    /// Creates a seed item
    pub fn new(url: Url) -> Self {
        Self {
            url,
            parent_title: String::new(),
            item_type: None,
            album_id: None,
            part_of_album: false,
            children: 0,
            failed_children: 0,
            children_limit: 0,
            limit_resolved: false,
            parents: Vec::new(),
        }
    }

    pub fn parent_title(&self) -> &str {
        &self.parent_title
    }

    pub fn item_type(&self) -> Option<ItemType> {
        self.item_type
    }

    pub fn album_id(&self) -> Option<&str> {
        self.album_id.as_deref()
    }

    pub fn part_of_album(&self) -> bool {
        self.part_of_album
    }

    pub fn children(&self) -> u32 {
        self.children
    }

    pub fn failed_children(&self) -> u32 {
        self.failed_children
    }

    pub fn children_limit(&self) -> u32 {
        self.children_limit
    }

    pub fn parents(&self) -> &[Url] {
        &self.parents
    }

    /// Appends a title component to the lineage
    ///
    /// The component is sanitized and truncated to `max_len` characters. Empty
    /// components and a component equal to the current last one are ignored, so
    /// the title only ever grows.
    pub fn add_to_parent_title(&mut self, title: &str, max_len: usize) {
        let part = sanitize_name(title, max_len);
        if part.is_empty() {
            return;
        }
        if self.parent_title.rsplit('/').next() == Some(part.as_str()) {
            return;
        }

        if self.parent_title.is_empty() {
            self.parent_title = part;
        } else {
            self.parent_title = format!("{}/{}", self.parent_title, part);
        }
    }

    /// Classifies the item
    ///
    /// The children limit is read from `limits` the first time any type is set
    /// on this item or an ancestor; later calls change the type but never the
    /// limit.
    pub fn set_type(&mut self, item_type: ItemType, limits: &ChildrenLimits) {
        self.item_type = Some(item_type);
        if !self.limit_resolved {
            self.children_limit = limits.limit_for(item_type);
            self.limit_resolved = true;
        }
    }

    /// Marks the item as a member of a collection
    pub fn mark_part_of_album(&mut self, album_id: impl Into<String>) {
        self.part_of_album = true;
        if self.album_id.is_none() {
            self.album_id = Some(album_id.into());
        }
    }

    /// Fails if accepting one more child would exceed the limit
    pub fn ensure_capacity(&self) -> Result<(), ScrapeError> {
        if self.children_limit > 0 && self.children >= self.children_limit {
            return Err(ScrapeError::MaxChildren {
                url: self.url.to_string(),
                limit: self.children_limit,
            });
        }
        Ok(())
    }

    /// Counts a descendant that completed successfully
    pub fn record_child(&mut self) {
        self.children += 1;
    }

    /// Counts a descendant whose operation failed
    ///
    /// An item with failed descendants is not recorded as completed, so a
    /// later run visits it again.
    pub fn record_failed_child(&mut self) {
        self.failed_children += 1;
    }

    /// Checks capacity and counts the child in one step
    pub fn accept_child(&mut self) -> Result<(), ScrapeError> {
        self.ensure_capacity()?;
        self.record_child();
        Ok(())
    }

    /// Builds a child item
    ///
    /// The child inherits the lineage (extended by `new_title_part`), the type,
    /// the resolved children limit and album membership. Its own `children`
    /// counter starts at zero.
    pub fn create_child(
        &self,
        url: Url,
        new_title_part: Option<&str>,
        part_of_album: bool,
        album_id: Option<String>,
        max_folder_len: usize,
    ) -> ScrapeItem {
        let mut parents = self.parents.clone();
        parents.push(self.url.clone());

        let mut child = ScrapeItem {
            url,
            parent_title: self.parent_title.clone(),
            item_type: self.item_type,
            album_id: album_id.or_else(|| self.album_id.clone()),
            part_of_album: self.part_of_album || part_of_album,
            children: 0,
            failed_children: 0,
            children_limit: self.children_limit,
            limit_resolved: self.limit_resolved,
            parents,
        };

        if let Some(part) = new_title_part {
            child.add_to_parent_title(part, max_folder_len);
        }

        child
    }

    /// Captures what the error wrapper needs to report on this item
    pub fn origin(&self) -> ItemOrigin {
        let lineage = if self.parent_title.is_empty() {
            self.parents
                .iter()
                .map(Url::as_str)
                .collect::<Vec<_>>()
                .join(" -> ")
        } else {
            self.parent_title.clone()
        };

        ItemOrigin {
            url: self.url.clone(),
            lineage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(path: &str) -> Url {
        Url::parse(&format!("https://www.tokyomotion.net{}", path)).unwrap()
    }

    fn album_limits(limit: u32) -> ChildrenLimits {
        ChildrenLimits {
            file_host_album: limit,
            ..ChildrenLimits::default()
        }
    }

    #[test]
    fn test_new_seed_item() {
        let item = ScrapeItem::new(url("/user/alice/videos"));
        assert_eq!(item.parent_title(), "");
        assert_eq!(item.children(), 0);
        assert_eq!(item.children_limit(), 0);
        assert!(item.item_type().is_none());
        assert!(item.parents().is_empty());
    }

    #[test]
    fn test_parent_title_grows() {
        let mut item = ScrapeItem::new(url("/"));
        item.add_to_parent_title("alice", 60);
        item.add_to_parent_title("videos", 60);
        assert_eq!(item.parent_title(), "alice/videos");
    }

    #[test]
    fn test_parent_title_ignores_empty_and_repeated_parts() {
        let mut item = ScrapeItem::new(url("/"));
        item.add_to_parent_title("alice", 60);
        item.add_to_parent_title("  ", 60);
        item.add_to_parent_title("alice", 60);
        assert_eq!(item.parent_title(), "alice");
    }

    #[test]
    fn test_parent_title_is_sanitized() {
        let mut item = ScrapeItem::new(url("/"));
        item.add_to_parent_title("a/b:c?", 60);
        assert_eq!(item.parent_title(), "abc");
    }

    #[test]
    fn test_children_limit_resolved_once() {
        let mut item = ScrapeItem::new(url("/album/1"));
        item.set_type(ItemType::FileHostAlbum, &album_limits(2));
        assert_eq!(item.children_limit(), 2);

        item.set_type(ItemType::FileHostAlbum, &album_limits(50));
        assert_eq!(item.children_limit(), 2);

        item.set_type(ItemType::Forum, &ChildrenLimits::default());
        assert_eq!(item.item_type(), Some(ItemType::Forum));
        assert_eq!(item.children_limit(), 2);
    }

    #[test]
    fn test_accept_child_respects_limit() {
        let mut item = ScrapeItem::new(url("/album/1"));
        item.set_type(ItemType::FileHostAlbum, &album_limits(2));

        assert!(item.accept_child().is_ok());
        assert!(item.accept_child().is_ok());
        let err = item.accept_child().unwrap_err();
        assert!(matches!(err, ScrapeError::MaxChildren { limit: 2, .. }));
        assert_eq!(item.children(), 2);
    }

    #[test]
    fn test_unlimited_when_limit_zero() {
        let mut item = ScrapeItem::new(url("/album/1"));
        item.set_type(ItemType::FileHostAlbum, &album_limits(0));
        for _ in 0..100 {
            item.accept_child().unwrap();
        }
        assert_eq!(item.children(), 100);
    }

    #[test]
    fn test_create_child_inherits_lineage_by_value() {
        let mut parent = ScrapeItem::new(url("/user/alice/videos"));
        parent.add_to_parent_title("alice", 60);
        parent.set_type(ItemType::FileHostProfile, &ChildrenLimits {
            file_host_profile: 7,
            ..ChildrenLimits::default()
        });
        parent.record_child();
        parent.record_failed_child();

        let child = parent.create_child(url("/video/1/x"), Some("videos"), false, None, 60);

        assert_eq!(child.parent_title(), "alice/videos");
        assert_eq!(child.children(), 0);
        assert_eq!(child.failed_children(), 0);
        assert_eq!(child.children_limit(), 7);
        assert_eq!(child.item_type(), Some(ItemType::FileHostProfile));
        assert_eq!(child.parents(), &[url("/user/alice/videos")]);

        // The parent is untouched by child construction
        assert_eq!(parent.parent_title(), "alice");
        assert_eq!(parent.children(), 1);
        assert_eq!(parent.failed_children(), 1);
    }

    #[test]
    fn test_album_membership_is_sticky() {
        let mut album = ScrapeItem::new(url("/a/xyz"));
        album.mark_part_of_album("xyz");
        album.mark_part_of_album("other");
        assert_eq!(album.album_id(), Some("xyz"));

        let child = album.create_child(url("/a/xyz/1.jpg"), None, false, None, 60);
        assert!(child.part_of_album());
        assert_eq!(child.album_id(), Some("xyz"));
    }

    #[test]
    fn test_origin_uses_title_then_parents() {
        let seed = ScrapeItem::new(url("/user/alice/videos"));
        let child = seed.create_child(url("/video/1/x"), None, false, None, 60);
        assert_eq!(
            child.origin().lineage,
            "https://www.tokyomotion.net/user/alice/videos"
        );

        let mut titled = child.clone();
        titled.add_to_parent_title("alice", 60);
        assert_eq!(titled.origin().lineage, "alice");
    }
}
