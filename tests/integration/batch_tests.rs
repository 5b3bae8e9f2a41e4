//! Batch orchestration: sitemap seeding, invalid targets, reports

use crate::test_config;
use contact_crawler::crawler::{BatchRunner, CancelFlag};
use contact_crawler::output::{read_report, CsvReportSink, RecordError, ResultSink};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_raw(body, "text/html")
}

fn xml(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_raw(body, "application/xml")
}

fn runner() -> Arc<BatchRunner> {
    Arc::new(BatchRunner::from_config(&test_config(), CancelFlag::new()).unwrap())
}

#[tokio::test]
async fn test_sitemap_urls_become_records() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let sitemap = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>{base}/p1</loc></url>
  <url><loc>{base}/p2</loc></url>
  <url><loc>{base}/p3</loc></url>
</urlset>"#,
        base = base_url
    );

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(xml(sitemap))
        .expect(1)
        .mount(&mock_server)
        .await;

    for page in ["p1", "p2", "p3"] {
        Mock::given(method("GET"))
            .and(path(format!("/{}", page)))
            .respond_with(html(&format!("<p>Write to {}@gmail.com</p>", page)))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let report = runner().run(vec![base_url.clone()]).await;

    assert_eq!(report.records.len(), 3);
    for (record, page) in report.records.iter().zip(["p1", "p2", "p3"]) {
        assert_eq!(record.url, format!("{}/{}", base_url, page));
        assert!(record.error.is_none());
        assert_eq!(record.emails.len(), 1);
        assert!(record.emails.contains(&format!("{}@gmail.com", page)));
    }
    assert_eq!(report.stats.targets, 1);
    assert_eq!(report.stats.records_with_contacts, 3);
}

#[tokio::test]
async fn test_sitemap_index_is_followed() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(xml(format!(
            r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>{}/sitemap-pages.xml</loc></sitemap>
</sitemapindex>"#,
            base_url
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sitemap-pages.xml"))
        .respond_with(xml(format!(
            r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>{}/team</loc></url>
</urlset>"#,
            base_url
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/team"))
        .respond_with(html("<p>Phone: 202-555-0198</p>"))
        .mount(&mock_server)
        .await;

    let report = runner().run(vec![base_url.clone()]).await;

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].url, format!("{}/team", base_url));
    assert!(report.records[0].phones.contains("202-555-0198"));
}

#[tokio::test]
async fn test_non_xml_sitemap_falls_back_to_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Soft 404 served as HTML
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(html("<html><body>Page not found</body></html>"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/contact">Contact</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/contact"))
        .respond_with(html("<p>info@yahoo.com</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let report = runner().run(vec![base_url.clone()]).await;

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].url, base_url);
    assert!(report.records[0].emails.contains("info@yahoo.com"));
}

#[tokio::test]
async fn test_invalid_target_keeps_its_row() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<p>hello@outlook.com</p>"))
        .mount(&mock_server)
        .await;

    let report = runner()
        .run(vec![base_url.clone(), "not-a-url".to_string()])
        .await;

    assert_eq!(report.records.len(), 2);
    assert_eq!(report.records[0].url, base_url);
    assert!(report.records[0].emails.contains("hello@outlook.com"));
    assert_eq!(report.records[1].url, "not-a-url");
    assert!(matches!(
        report.records[1].error,
        Some(RecordError::InvalidTarget(_))
    ));
}

#[tokio::test]
async fn test_site_without_contacts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<p>Nothing to see here</p>"))
        .mount(&mock_server)
        .await;

    let report = runner().run(vec![mock_server.uri()]).await;

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].error, Some(RecordError::NoContactInfo));
}

#[tokio::test]
async fn test_unreachable_seed_reports_fetch_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&mock_server)
        .await;

    let report = runner().run(vec![mock_server.uri()]).await;

    assert!(matches!(
        report.records[0].error,
        Some(RecordError::Fetch(ref message)) if message.contains("410")
    ));
}

#[tokio::test]
async fn test_report_written_and_read_back() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<a href="mailto:desk@gmail.com">Mail</a><p>+44 20 7946 0958</p>"#,
        ))
        .mount(&mock_server)
        .await;

    let report = runner()
        .run(vec![base_url.clone(), "ftp://".to_string()])
        .await;

    let temp_dir = TempDir::new().unwrap();
    let report_path = temp_dir.path().join("out").join("contacts.csv");
    CsvReportSink::new(&report_path)
        .write_records(&report.records)
        .unwrap();

    let read_back = read_report(&report_path).unwrap();
    assert_eq!(read_back, report.records);
    assert!(read_back[0].emails.contains("desk@gmail.com"));
    assert!(read_back[1].error.is_some());
}

#[tokio::test]
async fn test_list_links_prefers_sitemap() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(xml(format!(
            "<urlset><url><loc>{0}/b</loc></url><url><loc>{0}/a</loc></url></urlset>",
            base_url
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("home"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let target = url::Url::parse(&base_url).unwrap();
    let links: Vec<String> = runner().list_links(&target).await.into_iter().collect();

    assert_eq!(
        links,
        vec![format!("{}/a", base_url), format!("{}/b", base_url)]
    );
}
