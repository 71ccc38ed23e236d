//! Integration tests for the scraper
//!
//! These tests use wiremock to create mock HTTP servers and exercise the
//! fetcher, the per-URL pipeline and batch orchestration end-to-end.

use circuit_scraper::cache::ResultCache;
use circuit_scraper::crawler::{
    FetchPolicy, Fetcher, Orchestrator, OrchestratorSettings, ScrapePipeline,
};
use circuit_scraper::output::{export_csv, CsvSink, RecordSink};
use circuit_scraper::ratelimit::RateLimiter;
use circuit_scraper::{ErrorKind, ItemStatus, UrlPolicy};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CIRCUIT_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Perú mágico | Traveltool</title>
  <meta name="description" content="De Lima a Cusco y Machu Picchu.">
</head>
<body>
  <div class="header-summary__info-subtitle">Perú, 9 días · Circuito clásico</div>
  <p>Duración: 9 días / 7 noches</p>
  <span class="price__int">1.890</span>
  <div class="itinerary-day"><h4>Día 1: Madrid - Lima</h4><p>Vuelo a Lima.</p></div>
  <div class="itinerary-day"><h4>Día 2: Lima - Cusco</h4><p>Vuelo a Cusco.</p></div>
</body>
</html>"#;

/// Fetch policy with short timings for tests
fn fast_policy(max_retries: u32) -> FetchPolicy {
    FetchPolicy {
        timeout: Duration::from_secs(2),
        max_retries,
        initial_backoff: Duration::from_millis(10),
        ..FetchPolicy::default()
    }
}

/// Pipeline that accepts the loopback address wiremock listens on
fn test_pipeline(max_retries: u32) -> ScrapePipeline {
    let fetcher = Fetcher::new(fast_policy(max_retries)).expect("Failed to build fetcher");
    ScrapePipeline::new(
        UrlPolicy::default().allowing_private_networks(),
        Arc::new(ResultCache::default()),
        fetcher,
    )
}

fn test_orchestrator(concurrency: usize) -> Orchestrator<ScrapePipeline> {
    let settings = OrchestratorSettings {
        concurrency,
        domain_delay: Duration::ZERO,
        max_batch_size: 300,
    };
    let limiter = Arc::new(RateLimiter::new(30, Duration::from_secs(60)));
    Orchestrator::new(test_pipeline(0), settings, limiter)
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

#[tokio::test]
async fn test_fetch_retries_server_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/circuito"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/circuito"))
        .respond_with(html(CIRCUIT_PAGE))
        .mount(&mock_server)
        .await;

    let fetcher = Fetcher::new(fast_policy(2)).unwrap();
    let body = fetcher
        .fetch(&format!("{}/circuito", mock_server.uri()))
        .await
        .expect("Fetch should succeed on the third attempt");

    assert!(body.contains("Perú mágico"));
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn test_fetch_exhausted_retries_keep_kind() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&mock_server)
        .await;

    let fetcher = Fetcher::new(fast_policy(1)).unwrap();
    let error = fetcher
        .fetch(&format!("{}/circuito", mock_server.uri()))
        .await
        .unwrap_err();

    assert_eq!(error.kind, ErrorKind::ServerError);
    assert_eq!(error.status, Some(503));
    assert_eq!(error.attempts, 2);
}

#[tokio::test]
async fn test_fetch_forbidden_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = Fetcher::new(fast_policy(3)).unwrap();
    let error = fetcher
        .fetch(&format!("{}/circuito", mock_server.uri()))
        .await
        .unwrap_err();

    assert_eq!(error.kind, ErrorKind::Forbidden);
    assert_eq!(error.attempts, 1);
}

#[tokio::test]
async fn test_fetch_not_found_is_unknown() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = Fetcher::new(fast_policy(2)).unwrap();
    let error = fetcher
        .fetch(&format!("{}/missing", mock_server.uri()))
        .await
        .unwrap_err();

    assert_eq!(error.kind, ErrorKind::Unknown);
}

#[tokio::test]
async fn test_fetch_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html(CIRCUIT_PAGE).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let policy = FetchPolicy {
        timeout: Duration::from_millis(500),
        ..fast_policy(0)
    };
    let fetcher = Fetcher::new(policy).unwrap();
    let error = fetcher
        .fetch(&format!("{}/slow", mock_server.uri()))
        .await
        .unwrap_err();

    assert_eq!(error.kind, ErrorKind::Timeout);
}

#[tokio::test]
async fn test_fetch_connection_refused() {
    // Reserve a port, then free it so nothing is listening
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let fetcher = Fetcher::new(fast_policy(0)).unwrap();
    let error = fetcher
        .fetch(&format!("http://127.0.0.1:{}/", port))
        .await
        .unwrap_err();

    assert_eq!(error.kind, ErrorKind::Network);
}

#[tokio::test]
async fn test_fetch_refuses_redirect_to_private_network() {
    let public = MockServer::start().await;
    let internal = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/circuito"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/admin", internal.uri()).as_str()),
        )
        .expect(1)
        .mount(&public)
        .await;
    Mock::given(method("GET"))
        .respond_with(html(CIRCUIT_PAGE))
        .expect(0)
        .mount(&internal)
        .await;

    let fetcher = Fetcher::new(fast_policy(2)).unwrap();
    let error = fetcher
        .fetch(&format!("{}/circuito", public.uri()))
        .await
        .unwrap_err();

    assert_eq!(error.kind, ErrorKind::Unknown);
    assert_eq!(error.attempts, 1);
    assert!(error.status.is_none());
}

#[tokio::test]
async fn test_fetch_follows_allowed_redirect() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("{}/circuito", mock_server.uri()).as_str()),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/circuito"))
        .respond_with(html(CIRCUIT_PAGE))
        .expect(1)
        .mount(&mock_server)
        .await;

    let policy = FetchPolicy {
        targets: UrlPolicy::default().allowing_private_networks(),
        ..fast_policy(0)
    };
    let body = Fetcher::new(policy)
        .unwrap()
        .fetch(&format!("{}/old", mock_server.uri()))
        .await
        .unwrap();

    assert!(body.contains("Perú mágico"));
}

#[tokio::test]
async fn test_pipeline_end_to_end_with_cache() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/circuitos/peru-magico"))
        .respond_with(html(CIRCUIT_PAGE))
        .expect(1)
        .mount(&mock_server)
        .await;

    let pipeline = test_pipeline(0);
    let url = format!("{}/circuitos/peru-magico", mock_server.uri());

    let first = pipeline.scrape(&url).await;
    let record = first.record().expect("First scrape should succeed");
    assert_eq!(record.meta_title, "Perú mágico");
    assert_eq!(record.days, Some(9));
    assert_eq!(record.nights, Some(7));
    assert_eq!(record.price, Some(1890));
    assert_eq!(record.itinerary_days, vec!["@Lima", "@Cusco"]);
    assert!(!first.from_cache());

    // Trailing slash normalises to the same cache key
    let second = pipeline.scrape(&format!("{}/", url)).await;
    assert!(second.is_success());
    assert!(second.from_cache());
}

#[tokio::test]
async fn test_pipeline_reports_parse_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"status\": \"ok\"}"))
        .mount(&mock_server)
        .await;

    let outcome = test_pipeline(0)
        .scrape(&format!("{}/api/circuito", mock_server.uri()))
        .await;

    let failure = outcome.failure().expect("JSON body should not parse as a page");
    assert_eq!(failure.kind, ErrorKind::Parse);
}

#[tokio::test]
async fn test_pipeline_failures_are_not_cached() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&mock_server)
        .await;

    let pipeline = test_pipeline(0);
    let url = format!("{}/circuito", mock_server.uri());

    assert!(!pipeline.scrape(&url).await.is_success());
    assert!(!pipeline.scrape(&url).await.is_success());
    assert!(pipeline.cache().is_empty());
}

#[tokio::test]
async fn test_pipeline_rejects_loopback_by_default() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html(CIRCUIT_PAGE))
        .expect(0)
        .mount(&mock_server)
        .await;

    let fetcher = Fetcher::new(fast_policy(0)).unwrap();
    let pipeline = ScrapePipeline::new(
        UrlPolicy::default(),
        Arc::new(ResultCache::default()),
        fetcher,
    );

    let outcome = pipeline
        .scrape(&format!("{}/circuito", mock_server.uri()))
        .await;
    assert_eq!(outcome.failure().unwrap().kind, ErrorKind::Unknown);
}

#[tokio::test]
async fn test_pipeline_records_parsed_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/circuitos/peru-magico"))
        .respond_with(html(CIRCUIT_PAGE))
        .mount(&mock_server)
        .await;

    let submitted = format!(
        "  {}/circuitos/./peru-magico",
        mock_server.uri().replacen("http://", "HTTP://", 1)
    );
    let outcome = test_pipeline(0).scrape(&submitted).await;

    let record = outcome.record().expect("Scrape should succeed");
    assert_eq!(record.url, format!("{}/circuitos/peru-magico", mock_server.uri()));
}

#[tokio::test]
async fn test_batch_over_http_and_csv_export() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/blocked"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(html(CIRCUIT_PAGE))
        .mount(&mock_server)
        .await;

    let orchestrator = test_orchestrator(3);
    let mut urls: Vec<String> = (0..4)
        .map(|i| format!("{}/circuitos/{}", mock_server.uri(), i))
        .collect();
    urls.push(format!("{}/blocked", mock_server.uri()));

    let report = orchestrator.run_batch(urls.clone()).await.unwrap();
    assert!(!report.cancelled);
    assert_eq!(report.summary.done, 4);
    assert_eq!(report.summary.errors, 1);
    assert_eq!(report.summary.errors_by_kind.get(&ErrorKind::Forbidden), Some(&1));

    // Every item resolves exactly once, in submission order
    let resolved: Vec<&str> = report.items.iter().map(|item| item.url.as_str()).collect();
    assert_eq!(resolved, urls.iter().map(String::as_str).collect::<Vec<_>>());

    // A retry only re-runs the failure
    let before = mock_server.received_requests().await.unwrap().len();
    let retried = orchestrator.retry_errors("integration").await.unwrap();
    let after = mock_server.received_requests().await.unwrap().len();
    assert_eq!(after - before, 1);
    assert_eq!(retried.summary.done, 4);
    assert_eq!(retried.summary.errors, 1);

    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("export.csv");
    let records: Vec<_> = retried.outcomes().filter_map(|o| o.record()).collect();
    assert_eq!(export_csv(&csv_path, &records).unwrap(), 4);

    let content = std::fs::read_to_string(&csv_path).unwrap();
    assert_eq!(content.lines().count(), 5);
    assert!(content.contains("\"itinerario2\""));
    assert!(!content.contains("\"itinerario10\""));
    assert!(content.contains("\"día 9\""));

    let outcomes: Vec<_> = retried.outcomes().collect();
    let mut sink = CsvSink::new(Vec::new());
    assert_eq!(sink.write_outcomes(&outcomes).unwrap(), 4);
}

#[tokio::test]
async fn test_cancelled_batch_leaves_items_pending() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html(CIRCUIT_PAGE).set_delay(Duration::from_millis(200)))
        .mount(&mock_server)
        .await;

    let orchestrator = test_orchestrator(1);
    let urls: Vec<String> = (0..10)
        .map(|i| format!("{}/circuitos/{}", mock_server.uri(), i))
        .collect();

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        canceller.cancel();
    });

    let report = orchestrator.run_batch_with_token(urls, token).await.unwrap();

    assert!(report.cancelled);
    assert!(report.summary.pending > 0);
    assert!(report.summary.done >= 1);
    assert_eq!(report.summary.done + report.summary.errors + report.summary.pending, 10);
    assert!(report
        .items
        .iter()
        .all(|item| item.status != ItemStatus::Active));

    let requests = mock_server.received_requests().await.unwrap().len();
    assert_eq!(requests, report.summary.done + report.summary.errors);
}

#[tokio::test]
async fn test_rate_limited_submission() {
    let settings = OrchestratorSettings {
        domain_delay: Duration::ZERO,
        ..OrchestratorSettings::default()
    };
    let limiter = Arc::new(RateLimiter::new(2, Duration::from_secs(60)));
    let orchestrator = Orchestrator::new(test_pipeline(0), settings, limiter);

    let urls = vec!["not a url at all".to_string()];
    assert!(orchestrator.submit("caller-a", urls.clone()).await.is_ok());
    assert!(orchestrator.submit("caller-a", urls.clone()).await.is_ok());

    let denied = orchestrator.submit("caller-a", urls.clone()).await;
    match denied {
        Err(circuit_scraper::ScraperError::RateLimited { reset_in }) => {
            assert!(reset_in <= Duration::from_secs(60));
        }
        other => panic!("Expected rate limit, got {:?}", other.map(|r| r.summary)),
    }

    assert!(orchestrator.submit("caller-b", urls).await.is_ok());
}
