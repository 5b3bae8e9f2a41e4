//! Fetcher and crawl engine against a mock site

use crate::test_config;
use contact_crawler::crawler::{
    CancelFlag, ContactExtractor, CrawlEngine, CrawlLimits, FetchError, HttpFetcher, PageFetcher,
    ProxyEndpoint, StaticProxyList, StopReason,
};
use std::sync::Arc;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_raw(body, "text/html")
}

fn engine(fetcher: Arc<dyn PageFetcher>) -> CrawlEngine {
    CrawlEngine::new(
        fetcher,
        ContactExtractor::new(true),
        CrawlLimits::default(),
        CancelFlag::new(),
    )
}

#[tokio::test]
async fn test_crawl_visits_each_page_once() {
    // Start a mock server
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r##"<a href="/about">About</a><a href="/contact">Contact</a><a href="/about#team">Team</a>"##,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html(
            r#"<a href="/">Home</a><a href="/contact">Contact</a><p>Call +1 (202) 555-0143</p>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/contact"))
        .respond_with(html(
            r#"<a href="/about">About</a><a href="mailto:owner@gmail.com?subject=Hi">Mail</a>
               <a href="https://elsewhere.test/">Partner</a>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = Arc::new(HttpFetcher::new(&test_config().fetcher, None).unwrap());
    let seed = Url::parse(&base_url).unwrap();

    let outcome = engine(fetcher).run(&seed).await;

    assert_eq!(outcome.pages_fetched, 3);
    assert_eq!(outcome.stop_reason, StopReason::Exhausted);
    assert!(outcome.failures.is_empty());
    assert!(outcome.contacts.emails.contains("owner@gmail.com"));
    assert!(outcome.contacts.phones.contains("+1 (202) 555-0143"));
    // Expectations (each page exactly once) are verified when the server drops
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let mock_server = MockServer::start().await;

    // One attempt plus max_retries (2)
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let fetcher = Arc::new(HttpFetcher::new(&test_config().fetcher, None).unwrap());
    let seed = Url::parse(&mock_server.uri()).unwrap();

    let outcome = engine(fetcher).run(&seed).await;

    assert_eq!(outcome.pages_fetched, 0);
    assert!(matches!(
        outcome.seed_error,
        Some(FetchError::Http { status: 503, .. })
    ));
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/gone">Gone</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = Arc::new(HttpFetcher::new(&test_config().fetcher, None).unwrap());
    let seed = Url::parse(&mock_server.uri()).unwrap();

    let outcome = engine(fetcher).run(&seed).await;

    assert_eq!(outcome.failures.len(), 1);
    assert!(matches!(
        outcome.failures[0].error,
        FetchError::Http { status: 404, .. }
    ));
    assert!(outcome.seed_error.is_none());
}

#[tokio::test]
async fn test_non_textual_content_not_parsed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/brochure.pdf">Brochure</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/brochure.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("sales@gmail.com <a href=\"/secret\">x</a>", "application/pdf"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/secret"))
        .respond_with(html("secret@gmail.com"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let fetcher = Arc::new(HttpFetcher::new(&test_config().fetcher, None).unwrap());
    let seed = Url::parse(&mock_server.uri()).unwrap();

    let outcome = engine(fetcher).run(&seed).await;

    assert_eq!(outcome.pages_fetched, 2);
    assert!(outcome.contacts.is_empty());
}

#[tokio::test]
async fn test_page_budget_stops_crawl() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/1">1</a><a href="/2">2</a><a href="/3">3</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(html("nothing"))
        .mount(&mock_server)
        .await;

    let fetcher = Arc::new(HttpFetcher::new(&test_config().fetcher, None).unwrap());
    let engine = CrawlEngine::new(
        fetcher,
        ContactExtractor::new(true),
        CrawlLimits {
            max_pages: Some(2),
            max_duration: None,
        },
        CancelFlag::new(),
    );

    let outcome = engine.run(&Url::parse(&mock_server.uri()).unwrap()).await;

    assert_eq!(outcome.pages_fetched, 2);
    assert_eq!(outcome.stop_reason, StopReason::PageBudget);
}

#[tokio::test]
async fn test_blocked_request_with_empty_pool() {
    let mock_server = MockServer::start().await;

    // Blocked responses go straight to proxies, no direct retry
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&mock_server)
        .await;

    let pool = Arc::new(StaticProxyList::new(Vec::new()));
    let fetcher = HttpFetcher::new(&test_config().fetcher, Some(pool)).unwrap();
    let url = Url::parse(&mock_server.uri()).unwrap();

    let result = fetcher.fetch(&url, false).await;

    assert!(matches!(result, Err(FetchError::NoProxyAvailable { .. })));
}

#[tokio::test]
async fn test_blocked_request_without_proxy_provider() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(&test_config().fetcher, None).unwrap();
    let url = Url::parse(&mock_server.uri()).unwrap();

    let result = fetcher.fetch(&url, false).await;

    assert!(matches!(result, Err(FetchError::Http { status: 429, .. })));
}

#[tokio::test]
async fn test_dead_proxies_are_each_tried_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    // Nothing listens on these ports
    let pool = Arc::new(StaticProxyList::new(vec![
        ProxyEndpoint::parse("127.0.0.1:9").unwrap(),
        ProxyEndpoint::parse("127.0.0.1:1").unwrap(),
    ]));

    let mut config = test_config().fetcher;
    config.proxy_attempts = 5;
    let fetcher = HttpFetcher::new(&config, Some(pool)).unwrap();
    let url = Url::parse(&mock_server.uri()).unwrap();

    let result = fetcher.fetch(&url, false).await;

    assert!(matches!(result, Err(FetchError::Network { .. })));
}

#[tokio::test]
async fn test_redirect_off_site_is_not_crawled() {
    let mock_server = MockServer::start().await;
    let other_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/out">Partner</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/out"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", format!("{}/", other_server.uri()).as_str()),
        )
        .mount(&mock_server)
        .await;

    // The redirect itself is followed by the client, nothing past it
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/secret">Secret</a><p>+44 20 7946 0958</p>"#))
        .expect(1)
        .mount(&other_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/secret"))
        .respond_with(html("<p>leak@gmail.com</p>"))
        .expect(0)
        .mount(&other_server)
        .await;

    let fetcher = Arc::new(HttpFetcher::new(&test_config().fetcher, None).unwrap());
    let seed = Url::parse(&mock_server.uri()).unwrap();

    let outcome = engine(fetcher).run(&seed).await;

    assert!(outcome.contacts.is_empty());
    assert_eq!(outcome.visited.len(), 2);
    assert!(outcome
        .visited
        .iter()
        .all(|url| url.port() == seed.port()));
}

#[tokio::test]
async fn test_blocked_request_served_through_proxy() {
    let mock_server = MockServer::start().await;
    let proxy_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(html("<p>proxied@gmail.com</p>"))
        .expect(1)
        .mount(&proxy_server)
        .await;

    let endpoint = ProxyEndpoint::parse(&proxy_server.address().to_string()).unwrap();
    let pool = Arc::new(StaticProxyList::new(vec![endpoint.clone()]));
    let fetcher = HttpFetcher::new(&test_config().fetcher, Some(pool)).unwrap();
    let url = Url::parse(&mock_server.uri()).unwrap();

    let page = fetcher.fetch(&url, false).await.unwrap();

    assert_eq!(page.proxy, Some(endpoint));
    assert!(page.body.contains("proxied@gmail.com"));
}

#[tokio::test]
async fn test_server_errors_fall_back_to_proxy() {
    let mock_server = MockServer::start().await;
    let proxy_server = MockServer::start().await;

    // One attempt plus max_retries (2), then the proxy
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(html("<p>ok</p>"))
        .expect(1)
        .mount(&proxy_server)
        .await;

    let endpoint = ProxyEndpoint::parse(&proxy_server.address().to_string()).unwrap();
    let pool = Arc::new(StaticProxyList::new(vec![endpoint.clone()]));
    let fetcher = HttpFetcher::new(&test_config().fetcher, Some(pool)).unwrap();
    let url = Url::parse(&mock_server.uri()).unwrap();

    let page = fetcher.fetch(&url, false).await.unwrap();

    assert_eq!(page.status, 200);
    assert_eq!(page.proxy, Some(endpoint));
}
