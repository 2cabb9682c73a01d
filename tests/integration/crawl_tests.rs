//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use futures::StreamExt;
use scaner::config::Config;
use scaner::crawler::{Client, Crawler, SkipReason, UrlState};
use scaner::url::ScopeSpec;
use scaner::ScanError;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/html")
}

fn seed(server: &MockServer) -> Url {
    Url::parse(&format!("{}/", server.uri())).expect("Failed to parse base URL")
}

fn crawler(seed: &Url, whitelist: &[&str]) -> Crawler {
    let client = Client::new(&Config::default()).expect("Failed to build client");
    let scope = ScopeSpec::new(seed, whitelist.iter().copied()).expect("Failed to build scope");
    Crawler::new(seed.clone(), client, scope)
}

async fn collect_urls(mut crawler: Crawler) -> (Vec<String>, Crawler) {
    let mut urls = Vec::new();
    while let Some(page) = crawler.next_page().await.expect("Crawl failed") {
        urls.push(page.final_url().path().to_string());
    }
    (urls, crawler)
}

#[tokio::test]
async fn test_scope_and_non_page_handling() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    // Page A links to an in-scope page, an external page and an image
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(format!(
            r#"<html><head><title>A</title></head><body>
            <a href="{base_url}/b">B</a>
            <a href="http://evil.example/x">evil</a>
            <img src="{base_url}/img.png">
            </body></html>"#
        )))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html("<html><title>B</title><body>leaf</body></html>".to_string()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 8], "image/png"))
        .expect(1)
        .mount(&server)
        .await;

    let seed = seed(&server);
    let (urls, crawler) = collect_urls(crawler(&seed, &[])).await;

    assert_eq!(urls, vec!["/", "/b"]);

    let stats = crawler.stats();
    assert_eq!(stats.pages_yielded, 2);
    assert_eq!(stats.skipped_for(SkipReason::NotAPage), 1);
    assert_eq!(stats.visited, 3);
    assert!(!stats.aborted);

    let img = seed.join("/img.png").unwrap();
    assert_eq!(crawler.state_of(&img), Some(UrlState::Skipped));
    assert_eq!(crawler.state_of(&Url::parse("http://evil.example/x").unwrap()), None);
}

#[tokio::test]
async fn test_cyclic_links_terminate_without_refetching() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/a">a</a>"#.to_string()))
        .expect(1)
        .mount(&server)
        .await;

    // A and B link to each other and back to the root
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html(r#"<a href="/b">b</a><a href="/">home</a><a href="/a#self">self</a>"#.to_string()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html(r#"<a href="/a">a</a><a href="/">home</a>"#.to_string()))
        .expect(1)
        .mount(&server)
        .await;

    let (urls, crawler) = collect_urls(crawler(&seed(&server), &[])).await;

    assert_eq!(urls, vec!["/", "/a", "/b"]);
    assert!(crawler.is_finished());
}

#[tokio::test]
async fn test_skipped_urls_do_not_stop_the_crawl() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<a href="/missing">m</a><a href="/broken">x</a><a href="/ok">ok</a>"#.to_string(),
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(html("<p>fine</p>".to_string()))
        .mount(&server)
        .await;

    let (urls, crawler) = collect_urls(crawler(&seed(&server), &[])).await;

    assert_eq!(urls, vec!["/", "/ok"]);
    assert_eq!(crawler.stats().skipped_for(SkipReason::BadStatus), 2);
}

#[tokio::test]
async fn test_whitelisted_host_is_followed() {
    let server = MockServer::start().await;
    let port = server.address().port();

    // "localhost" reaches the same mock server under a different host name
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(format!(
            r#"<a href="http://localhost:{port}/page">b</a>
            <a href="http://c.invalid/page">c</a>"#
        )))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(html("<p>whitelisted</p>".to_string()))
        .expect(1)
        .mount(&server)
        .await;

    let seed = seed(&server);
    let mut crawler = crawler(&seed, &["localhost"]);

    let first = crawler.next_page().await.unwrap().unwrap();
    assert_eq!(first.final_url(), &seed);

    let second = crawler.next_page().await.unwrap().unwrap();
    assert_eq!(second.final_url().host_str(), Some("localhost"));
    assert_eq!(second.final_url().path(), "/page");

    assert!(crawler.next_page().await.unwrap().is_none());
}

#[tokio::test]
async fn test_non_whitelisted_host_is_ignored() {
    let server = MockServer::start().await;
    let port = server.address().port();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(format!(r#"<a href="http://localhost:{port}/page">b</a>"#)))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(html("<p>out of scope</p>".to_string()))
        .expect(0)
        .mount(&server)
        .await;

    let (urls, _) = collect_urls(crawler(&seed(&server), &[])).await;
    assert_eq!(urls, vec!["/"]);
}

#[tokio::test]
async fn test_transport_failure_aborts_once() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let seed = Url::parse(&format!("http://127.0.0.1:{}/", port)).unwrap();

    let pages: Vec<_> = crawler(&seed, &[]).into_stream().collect().await;

    assert_eq!(pages.len(), 1);
    assert!(matches!(pages[0], Err(ScanError::Transport { .. })));
}

#[tokio::test]
async fn test_stream_yields_pages_in_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/one">1</a><a href="/two">2</a>"#.to_string()))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/one"))
        .respond_with(html("one".to_string()))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/two"))
        .respond_with(html("two".to_string()))
        .mount(&server)
        .await;

    let paths: Vec<String> = crawler(&seed(&server), &[])
        .into_stream()
        .map(|page| page.expect("Crawl failed").final_url().path().to_string())
        .collect()
        .await;

    assert_eq!(paths, vec!["/", "/one", "/two"]);
}

#[tokio::test]
async fn test_redirect_with_fragment_is_not_visited_twice() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/old">old</a><a href="/new">new</a>"#.to_string()))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/new#frag"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(html("<html>new</html>".to_string()))
        .expect(1)
        .mount(&server)
        .await;

    let seed = seed(&server);
    let mut crawler = crawler(&seed, &[]);
    let mut pages = Vec::new();
    while let Some(page) = crawler.next_page().await.expect("Crawl failed") {
        pages.push(page.final_url().to_string());
    }

    assert_eq!(
        pages,
        vec![format!("{}/", server.uri()), format!("{}/new", server.uri())]
    );
    assert_eq!(crawler.stats().pages_yielded, 2);
}
