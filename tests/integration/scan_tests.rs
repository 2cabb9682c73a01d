//! End-to-end tests for scan orchestration
//!
//! A wiremock server plays the target site; reports go to a temporary
//! directory.

use futures::FutureExt;
use reqwest::header::HeaderMap;
use scaner::attacks::{Attack, AttackError, AttackFuture};
use scaner::config::Config;
use scaner::crawler::{Client, Page};
use scaner::output::Log;
use scaner::scan::{self, AuthData, ScanOptions, ScanOutcome};
use scaner::{AttackEngine, Cancellation};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn html(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into().into_bytes(), "text/html")
}

fn options(server: &MockServer, dir: &TempDir) -> ScanOptions {
    ScanOptions {
        url: format!("{}/", server.uri()),
        csv_path: Some(dir.path().join("audit.csv")),
        html_path: Some(dir.path().join("audit.html")),
        ..Default::default()
    }
}

fn config_with(attacks: &[&str]) -> Config {
    let mut config = Config::default();
    config.attacks.enabled = Some(attacks.iter().map(|a| a.to_string()).collect());
    config
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).expect("Report should exist")
}

fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Echoes the `q` parameter back unescaped
struct ReflectQuery;

impl Respond for ReflectQuery {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let q = request
            .url
            .query_pairs()
            .find(|(k, _)| k == "q")
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default();
        html(format!("<html><body>Results for {}</body></html>", q))
    }
}

/// Leaks a database error when `id` contains a quote
struct QuoteBreaksQuery;

impl Respond for QuoteBreaksQuery {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let broken = request
            .url
            .query_pairs()
            .any(|(k, v)| k == "id" && v.contains('\''));
        if broken {
            html("<b>Warning</b>: You have an error in your SQL syntax near '''")
        } else {
            html("<html><body>Item 1</body></html>")
        }
    }
}

#[tokio::test]
async fn test_page_only_scan_writes_reports() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<html><body><a href="/other">other</a></body></html>"#))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/other"))
        .respond_with(html("<p>never crawled</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let options = ScanOptions {
        page_only: true,
        ..options(&server, &dir)
    };
    let report = scan::run(options, config_with(&["security_headers"]), None, Cancellation::new())
        .await
        .expect("Scan should start");

    assert_eq!(report.outcome, ScanOutcome::Completed);
    assert_eq!(report.pages_scanned, 1);
    assert!(report.report_errors.is_empty());

    let csv = read(&report.csv_path);
    assert!(csv.starts_with("kind,url,name,detail"));
    assert!(csv.contains(&format!("url,{}/,,200", server.uri())));
    assert!(csv.contains("security_headers"));

    let html = read(&report.html_path);
    assert!(html.contains("completed"));
    assert!(html.contains("Scanned URLs (1)"));
}

#[tokio::test]
async fn test_crawl_finds_reflected_and_sql_errors() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<a href="/search?q=shoes">search</a><a href="/item?id=1">item</a>"#,
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ReflectQuery)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/item"))
        .respond_with(QuoteBreaksQuery)
        .mount(&server)
        .await;

    let report = scan::run(
        options(&server, &dir),
        config_with(&["xss", "sqli"]),
        None,
        Cancellation::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.outcome, ScanOutcome::Completed);
    assert_eq!(report.pages_scanned, 3);

    let csv = read(&report.csv_path);
    assert!(csv.contains("search?q=shoes,xss,"), "csv was: {}", csv);
    assert!(csv.contains("item?id=1,sqli,"), "csv was: {}", csv);
    assert!(!csv.contains("search?q=shoes,sqli"));
}

#[tokio::test]
async fn test_page_limit_caps_the_crawl() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/a">a</a><a href="/b">b</a>"#))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html("a"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html("b"))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = config_with(&[]);
    config.crawler.max_pages = Some(2);

    let report = scan::run(options(&server, &dir), config, None, Cancellation::new())
        .await
        .unwrap();

    assert_eq!(report.outcome, ScanOutcome::Completed);
    assert_eq!(report.pages_scanned, 2);
}

#[tokio::test]
async fn test_reports_written_when_interrupted() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/a">a</a><a href="/slow">slow</a>"#))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html("<p>a</p>"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("late").set_delay(Duration::from_secs(10)))
        .mount(&server)
        .await;

    let cancel = Cancellation::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        trigger.cancel();
    });

    let report = tokio::time::timeout(
        Duration::from_secs(5),
        scan::run(
            options(&server, &dir),
            config_with(&["security_headers"]),
            None,
            cancel,
        ),
    )
    .await
    .expect("Cancellation should stop the in-flight fetch")
    .unwrap();

    assert_eq!(report.outcome, ScanOutcome::Interrupted);
    assert_eq!(report.pages_scanned, 2);

    let root = format!("{}/", server.uri());
    let page_a = format!("{}/a", server.uri());

    let mut reader = csv::Reader::from_path(&report.csv_path).unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();

    let scanned: Vec<&str> = rows.iter().filter(|r| &r[0] == "url").map(|r| &r[1]).collect();
    assert_eq!(scanned, vec![root.as_str(), page_a.as_str()]);

    // Three missing headers on each of the two scanned pages, nothing else
    let findings: Vec<&csv::StringRecord> = rows.iter().filter(|r| &r[0] == "finding").collect();
    assert_eq!(findings.len(), 6);
    assert!(findings.iter().all(|r| &r[2] == "security_headers"));
    assert_eq!(findings.iter().filter(|r| r[1] == root).count(), 3);
    assert_eq!(findings.iter().filter(|r| r[1] == page_a).count(), 3);
    assert!(rows.iter().all(|r| &r[0] != "error"));
    assert!(!rows.iter().any(|r| r[1].contains("/slow")));

    let html = read(&report.html_path);
    assert!(html.contains("interrupted"));
    assert!(html.contains("Findings (6)"));
    assert!(html.contains("Scanned URLs (2)"));
    assert!(!html.contains("/slow"));
}

#[tokio::test]
async fn test_reports_written_after_transport_failure() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    // Same host, different port: in scope but unreachable
    let dead = format!("http://127.0.0.1:{}/", closed_port());
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(format!(r#"<a href="{}">dead</a>"#, dead)))
        .mount(&server)
        .await;

    let report = scan::run(options(&server, &dir), config_with(&[]), None, Cancellation::new())
        .await
        .unwrap();

    assert!(matches!(report.outcome, ScanOutcome::Aborted(_)));
    assert_eq!(report.pages_scanned, 1);
    assert!(read(&report.csv_path).contains(&format!("{}/,,200", server.uri())));
    assert!(read(&report.html_path).contains("aborted"));
}

#[tokio::test]
async fn test_cms_checks_run_once() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<link rel="stylesheet" href="/wp-content/themes/t/style.css"><a href="/about">about</a>"#,
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html("about"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/wp-login.php"))
        .respond_with(html("<form>login</form>"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/wp-content/themes/t/style.css"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("body{}", "text/css"))
        .mount(&server)
        .await;

    let report = scan::run(options(&server, &dir), config_with(&[]), None, Cancellation::new())
        .await
        .unwrap();

    assert_eq!(report.outcome, ScanOutcome::Completed);
    assert!(report.detected_apps.contains_key("WordPress"));
    assert_eq!(report.pages_scanned, 2);

    let csv = read(&report.csv_path);
    assert_eq!(csv.matches("wp-login.php").count(), 1);
    assert!(read(&report.html_path).contains("WordPress"));
}

#[tokio::test]
async fn test_login_precedes_crawl() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_string_contains("user=admin"))
        .respond_with(html("welcome").insert_header("set-cookie", "sid=1; Path=/"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<p>home</p>"))
        .mount(&server)
        .await;

    let auth = AuthData::from_args(&format!("{}/login", server.uri()), "user=admin", "pass=x")
        .unwrap();
    let options = ScanOptions {
        auth: Some(auth),
        ..options(&server, &dir)
    };

    let report = scan::run(options, config_with(&[]), None, Cancellation::new())
        .await
        .unwrap();
    assert_eq!(report.outcome, ScanOutcome::Completed);
}

#[tokio::test]
async fn test_failed_login_does_not_stop_scan() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<p>home</p>"))
        .mount(&server)
        .await;

    let auth = AuthData::from_args(&format!("{}/login", server.uri()), "u=a", "p=b").unwrap();
    let options = ScanOptions {
        auth: Some(auth),
        ..options(&server, &dir)
    };

    let report = scan::run(options, config_with(&[]), None, Cancellation::new())
        .await
        .unwrap();
    assert_eq!(report.outcome, ScanOutcome::Completed);
    assert_eq!(report.pages_scanned, 1);
}

fn broken_probe<'a>(_: &'a Page, _: &'a Client, _: &'a Log) -> AttackFuture<'a> {
    async { Err::<(), _>(AttackError::Failed("probe bug".to_string())) }.boxed()
}

fn counting_probe<'a>(page: &'a Page, _: &'a Client, log: &'a Log) -> AttackFuture<'a> {
    async move {
        log.add_finding("counting", page.final_url().as_str(), "seen");
        Ok::<(), AttackError>(())
    }
    .boxed()
}

#[tokio::test]
async fn test_probe_failure_is_isolated_per_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<p>home</p>"))
        .mount(&server)
        .await;

    let client = Client::new(&Config::default()).unwrap();
    let page = client
        .get(&Url::parse(&format!("{}/", server.uri())).unwrap())
        .await
        .unwrap();

    let engine = AttackEngine::new(vec![
        Attack {
            name: "broken",
            run: broken_probe,
        },
        Attack {
            name: "counting",
            run: counting_probe,
        },
    ]);
    let log = Log::new();
    let cancel = Cancellation::new();

    engine.run(&page, &client, &log, &cancel).await.unwrap();
    engine.run(&page, &client, &log, &cancel).await.unwrap();

    assert_eq!(log.errors().len(), 2);
    assert_eq!(log.findings().len(), 2);
    assert!(log.errors().iter().all(|r| r.attack_name == "broken"));

    // Pages built by hand work the same way
    let offline = Page::new(
        Url::parse("http://example.com/").unwrap(),
        200,
        HeaderMap::new(),
        Vec::new(),
    );
    engine.run(&offline, &client, &log, &cancel).await.unwrap();
    assert_eq!(log.findings().len(), 3);
}
