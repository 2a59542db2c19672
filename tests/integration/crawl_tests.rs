//! Integration tests for the crawlers
//!
//! These tests use wiremock to stand in for the media hosts and run full
//! operations end-to-end against a real SQLite database.

use std::path::Path;
use std::sync::Arc;
use sumi_harvest::config::Config;
use sumi_harvest::crawler::{
    completion_key, ChannelSink, Outcome, TokyoMotionCrawler, XBunkrCrawler,
};
use sumi_harvest::storage::ProgressStore;
use sumi_harvest::{Crawler, MediaItem, Manager, ScrapeItem};
use sumi_harvest::FailureKind;
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a configuration writing to a database inside `dir`
fn create_test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.storage.database_path = dir
        .path()
        .join("harvest.db")
        .to_string_lossy()
        .into_owned();
    config
}

fn open_manager(config: Config) -> (Arc<Manager>, UnboundedReceiver<MediaItem>) {
    let (sink, media) = ChannelSink::new();
    let manager = Manager::open(config, Arc::new(sink)).expect("Failed to open manager");
    (manager, media)
}

fn drain(media: &mut UnboundedReceiver<MediaItem>) -> Vec<MediaItem> {
    let mut items = Vec::new();
    while let Ok(item) = media.try_recv() {
        items.push(item);
    }
    items
}

fn video_page(title: &str, src: &str) -> String {
    format!(
        r#"<html><head><title>{} - TOKYO Motion</title></head>
        <body><video><source src="{}" title="HD"></video></body></html>"#,
        title, src
    )
}

fn listing_page(videos: &[&str], next: Option<&str>) -> String {
    let mut body = String::from("<html><body>");
    for video in videos {
        body.push_str(&format!(r#"<a href="{}"><img></a>"#, video));
    }
    if let Some(next) = next {
        body.push_str(&format!(r#"<a class="prevnext" href="{}">Next</a>"#, next));
    }
    body.push_str("</body></html>");
    body
}

async fn mount_page(server: &MockServer, at: &str, body: String, times: u64) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .expect(times)
        .mount(server)
        .await;
}

fn seed(server: &MockServer, at: &str) -> ScrapeItem {
    let url = Url::parse(&server.uri())
        .and_then(|base| base.join(at))
        .expect("Failed to build seed URL");
    ScrapeItem::new(url)
}

fn tokyomotion(manager: &Arc<Manager>, server: &MockServer) -> TokyoMotionCrawler {
    let base = Url::parse(&server.uri()).expect("Failed to parse base URL");
    TokyoMotionCrawler::with_base_url(Arc::clone(manager), base)
}

/// Mounts a two-page playlist for "alice" holding three videos
async fn mount_playlist(server: &MockServer) {
    mount_page(
        server,
        "/user/alice/videos",
        listing_page(&["/video/1/one", "/video/2/two"], Some("/user/alice/videos/2")),
        1,
    )
    .await;
    mount_page(
        server,
        "/user/alice/videos/2",
        listing_page(&["/video/3/three"], None),
        1,
    )
    .await;
}

#[tokio::test]
async fn test_playlist_hands_off_every_video() {
    let server = MockServer::start().await;
    mount_playlist(&server).await;
    for (id, name) in [("1", "one"), ("2", "two"), ("3", "three")] {
        mount_page(
            &server,
            &format!("/video/{}/{}", id, name),
            video_page(name, &format!("https://cdn.example/{}.mp4", id)),
            1,
        )
        .await;
    }

    let dir = TempDir::new().unwrap();
    let (manager, mut media) = open_manager(create_test_config(&dir));
    let crawler = tokyomotion(&manager, &server);

    let outcome = crawler
        .fetch(seed(&server, "/user/alice/videos"))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Completed);

    let items = drain(&mut media);
    assert_eq!(items.len(), 3);
    for item in &items {
        assert_eq!(item.origin.parent_title(), "alice/videos");
        assert_eq!(item.origin.parents().len(), 1);
    }
    assert_eq!(items[2].custom_filename.as_deref(), Some("three [3].mp4"));

    // Three videos plus the playlist itself
    assert_eq!(manager.progress().completed(), 4);
    assert_eq!(manager.progress().media(), 3);

    manager.close().unwrap();
}

#[tokio::test]
async fn test_private_video_does_not_count_as_child() {
    let server = MockServer::start().await;
    mount_playlist(&server).await;
    mount_page(&server, "/video/1/one", video_page("one", "https://cdn.example/1.mp4"), 1).await;
    mount_page(
        &server,
        "/video/2/two",
        "<html><body>This is a private video</body></html>".to_string(),
        1,
    )
    .await;
    mount_page(&server, "/video/3/three", video_page("three", "https://cdn.example/3.mp4"), 1).await;

    // With room for two children, the failed video must leave space for the third
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&dir);
    config.download_options.maximum_number_of_children.file_host_profile = 2;
    let (manager, mut media) = open_manager(config);
    let crawler = tokyomotion(&manager, &server);

    let outcome = crawler
        .fetch(seed(&server, "/user/alice/videos"))
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Completed);
    assert_eq!(drain(&mut media).len(), 2);
    assert_eq!(manager.progress().failures(FailureKind::Restricted), 1);
    assert_eq!(manager.progress().failures(FailureKind::Fetch), 0);
    assert_eq!(manager.progress().failures(FailureKind::MaxChildren), 0);

    manager.close().unwrap();
}

#[tokio::test]
async fn test_album_stops_at_children_limit() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/a/xyz",
        r#"<html><body><h1 id="title">Trip</h1>
        <a class="image" href="https://media.xbunkr.com/xyz/1.jpg"></a>
        <a class="image" href="https://media.xbunkr.com/xyz/2.jpg"></a>
        <a class="image" href="https://media.xbunkr.com/xyz/3.jpg"></a>
        </body></html>"#
            .to_string(),
        1,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&dir);
    config.download_options.maximum_number_of_children.file_host_album = 2;
    let (manager, mut media) = open_manager(config);
    let base = Url::parse(&server.uri()).unwrap();
    let crawler = XBunkrCrawler::with_base_url(Arc::clone(&manager), base);

    let outcome = crawler.fetch(seed(&server, "/a/xyz")).await.unwrap();

    assert_eq!(outcome, Outcome::Failed(FailureKind::MaxChildren));
    let items = drain(&mut media);
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].origin.parent_title(), "Trip (XBunkr)");
    assert_eq!(manager.progress().active_tasks(), 0);

    manager.close().unwrap();
}

#[tokio::test]
async fn test_rerun_skips_completed_items() {
    let server = MockServer::start().await;
    mount_page(&server, "/video/9/clip", video_page("clip", "https://cdn.example/9.mp4"), 1).await;

    let dir = TempDir::new().unwrap();

    let (manager, mut media) = open_manager(create_test_config(&dir));
    tokyomotion(&manager, &server)
        .fetch(seed(&server, "/video/9/clip"))
        .await
        .unwrap();
    assert_eq!(drain(&mut media).len(), 1);
    manager.close().unwrap();

    // A second run over the same database neither fetches nor hands off
    let (manager, mut media) = open_manager(create_test_config(&dir));
    let outcome = tokyomotion(&manager, &server)
        .fetch(seed(&server, "/video/9/clip"))
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Skipped);
    assert!(drain(&mut media).is_empty());
    assert_eq!(manager.progress().completed(), 0);
    assert_eq!(manager.progress().skipped(), 1);
    manager.close().unwrap();
}

#[tokio::test]
async fn test_failed_video_is_retried_on_next_run() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/user/bob/videos",
        listing_page(&["/video/1/one", "/video/2/two"], None),
        1,
    )
    .await;
    mount_page(&server, "/video/1/one", video_page("one", "https://cdn.example/1.mp4"), 1).await;
    // The first request for the second video hits a server error
    Mock::given(method("GET"))
        .and(path("/video/2/two"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/video/2/two", video_page("two", "https://cdn.example/2.mp4"), 1).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&dir);
    config.rate_limiting.download_attempts = 1;
    let playlist = seed(&server, "/user/bob/videos").url;

    let (manager, mut media) = open_manager(config.clone());
    let outcome = tokyomotion(&manager, &server)
        .fetch(seed(&server, "/user/bob/videos"))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Completed);
    assert_eq!(drain(&mut media).len(), 1);
    assert_eq!(manager.progress().failures(FailureKind::Fetch), 1);
    assert!(manager.storage().get(&completion_key(&playlist)).unwrap().is_none());
    manager.close().unwrap();

    // The next run skips the finished video and fetches the failed one again
    let (manager, mut media) = open_manager(config);
    let outcome = tokyomotion(&manager, &server)
        .fetch(seed(&server, "/user/bob/videos"))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Completed);

    let items = drain(&mut media);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].url.as_str(), "https://cdn.example/2.mp4");
    assert_eq!(manager.progress().skipped(), 1);
    assert_eq!(manager.progress().completed(), 2);
    assert!(manager.storage().get(&completion_key(&playlist)).unwrap().is_some());
    manager.close().unwrap();
}

#[tokio::test]
async fn test_cached_page_is_not_fetched_again() {
    let server = MockServer::start().await;
    mount_page(&server, "/video/4/cached", video_page("cached", "https://cdn.example/4.mp4"), 1).await;

    let dir = TempDir::new().unwrap();

    let (manager, mut media) = open_manager(create_test_config(&dir));
    tokyomotion(&manager, &server)
        .fetch(seed(&server, "/video/4/cached"))
        .await
        .unwrap();
    manager.close().unwrap();
    assert_eq!(drain(&mut media).len(), 1);

    // Forget completion but keep the response cache
    let (manager, mut media) = open_manager(create_test_config(&dir));
    manager.storage().clear().unwrap();
    tokyomotion(&manager, &server)
        .fetch(seed(&server, "/video/4/cached"))
        .await
        .unwrap();

    let items = drain(&mut media);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].url.as_str(), "https://cdn.example/4.mp4");
    manager.close().unwrap();
}

#[tokio::test]
async fn test_failures_release_progress_tasks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/video/5/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/video/6/empty", "<html></html>".to_string(), 1).await;

    let dir = TempDir::new().unwrap();
    let (manager, _media) = open_manager(create_test_config(&dir));
    let crawler = tokyomotion(&manager, &server);

    let missing = crawler.fetch(seed(&server, "/video/5/missing")).await.unwrap();
    let empty = crawler.fetch(seed(&server, "/video/6/empty")).await.unwrap();
    let album = crawler.fetch(seed(&server, "/user/alice/albums")).await.unwrap();

    assert_eq!(missing, Outcome::Failed(FailureKind::Fetch));
    assert_eq!(empty, Outcome::Failed(FailureKind::Extraction));
    assert_eq!(album, Outcome::Failed(FailureKind::Unimplemented));

    let stats = manager.progress().snapshot();
    assert_eq!(stats.active_tasks, 0);
    assert_eq!(stats.completed, 0);
    assert_eq!(manager.progress().total_failures(), 3);

    // Failed items are not recorded as completed
    let missing_url = seed(&server, "/video/5/missing").url;
    assert!(manager.storage().get(&completion_key(&missing_url)).unwrap().is_none());

    manager.close().unwrap();
}

#[tokio::test]
async fn test_database_is_created_on_open() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir);
    let db_path = config.storage.database_path.clone();

    let (manager, _media) = open_manager(config);
    manager.close().unwrap();

    assert!(Path::new(&db_path).exists());
}
