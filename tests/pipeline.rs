use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use cotacao::AppConfig;
use cotacao::core::RateStore;
use cotacao::providers::AwesomeApiProvider;
use cotacao::server::{self, AppState};
use cotacao::store::SqliteRateStore;
use tracing::info;

mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub const ORIGIN_PATH: &str = "/json/last/USD-BRL";

    pub fn origin_body(bid: &str) -> String {
        format!(
            r#"{{
                "USDBRL": {{
                    "code": "USD",
                    "codein": "BRL",
                    "name": "Dólar Americano/Real Brasileiro",
                    "high": "5.4512",
                    "low": "5.3987",
                    "varBid": "0.0123",
                    "pctChange": "0.23",
                    "bid": "{bid}",
                    "ask": "5.4331",
                    "timestamp": "1718900000",
                    "create_date": "2024-06-20 13:33:20"
                }}
            }}"#
        )
    }

    pub async fn create_origin_server(response: ResponseTemplate) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(ORIGIN_PATH))
            .respond_with(response)
            .mount(&mock_server)
            .await;

        mock_server
    }
}

struct Pipeline {
    addr: SocketAddr,
    store: Arc<SqliteRateStore>,
    _dir: tempfile::TempDir,
}

impl Pipeline {
    /// Starts the quote server against `origin_uri` with a fresh database.
    async fn start(origin_uri: &str, fetch_timeout: Duration, init_schema: bool) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = SqliteRateStore::connect(
            &dir.path().join("cotacoes.db"),
            Duration::from_secs(2),
        )
        .await
        .expect("Failed to open database");
        if init_schema {
            store.initialize_schema().await.expect("Failed to create table");
        }
        let store = Arc::new(store);

        let url = format!("{origin_uri}{}", test_utils::ORIGIN_PATH);
        let provider = AwesomeApiProvider::new(&url, fetch_timeout).expect("Failed to build provider");
        let app = server::router(AppState::new(Arc::new(provider), store.clone()));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("No local address");
        tokio::spawn(async move { axum::serve(listener, app).await });
        info!(%addr, "Quote server started");

        Pipeline {
            addr,
            store,
            _dir: dir,
        }
    }

    fn client_config(&self, output_path: &Path) -> AppConfig {
        AppConfig {
            server_url: format!("http://{}{}", self.addr, server::QUOTE_ROUTE),
            output_path: output_path.to_path_buf(),
            client_timeout: Duration::from_secs(3),
            ..AppConfig::default()
        }
    }
}

#[test_log::test(tokio::test)]
async fn test_full_flow_writes_artifact_and_row() {
    let origin = test_utils::create_origin_server(
        wiremock::ResponseTemplate::new(200).set_body_string(test_utils::origin_body("5.43")),
    )
    .await;
    let pipeline = Pipeline::start(&origin.uri(), Duration::from_secs(2), true).await;

    let output_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let output = output_dir.path().join("cotacao.txt");

    let result = cotacao::client::run(&pipeline.client_config(&output)).await;
    assert!(result.is_ok(), "Client failed with: {:?}", result.err());

    assert_eq!(fs::read_to_string(&output).unwrap(), "Dólar: 5.43");
    assert_eq!(pipeline.store.count().await.unwrap(), 1);
    assert_eq!(pipeline.store.latest().await.unwrap().unwrap().bid, "5.43");
}

#[test_log::test(tokio::test)]
async fn test_slow_origin_returns_408_and_writes_nothing() {
    let origin = test_utils::create_origin_server(
        wiremock::ResponseTemplate::new(200)
            .set_body_string(test_utils::origin_body("5.43"))
            .set_delay(Duration::from_millis(500)),
    )
    .await;
    let pipeline = Pipeline::start(&origin.uri(), Duration::from_millis(50), true).await;

    let output_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let output = output_dir.path().join("cotacao.txt");
    fs::write(&output, "Dólar: 4.99").unwrap();

    let response = reqwest::get(format!("http://{}{}", pipeline.addr, server::QUOTE_ROUTE))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 408);
    assert_eq!(response.text().await.unwrap(), server::FETCH_FAILED_MESSAGE);

    let err = cotacao::client::run(&pipeline.client_config(&output))
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains(server::FETCH_FAILED_MESSAGE));

    assert_eq!(pipeline.store.count().await.unwrap(), 0);
    assert_eq!(fs::read_to_string(&output).unwrap(), "Dólar: 4.99");
}

#[test_log::test(tokio::test)]
async fn test_persist_failure_returns_500_without_bid() {
    let origin = test_utils::create_origin_server(
        wiremock::ResponseTemplate::new(200).set_body_string(test_utils::origin_body("5.43")),
    )
    .await;
    // No table, so every insert fails
    let pipeline = Pipeline::start(&origin.uri(), Duration::from_secs(2), false).await;

    let response = reqwest::get(format!("http://{}{}", pipeline.addr, server::QUOTE_ROUTE))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 500);
    let body = response.text().await.unwrap();
    assert_eq!(body, server::PERSIST_FAILED_MESSAGE);
    assert!(!body.contains("5.43"));

    let output_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let output = output_dir.path().join("cotacao.txt");
    assert!(cotacao::client::run(&pipeline.client_config(&output)).await.is_err());
    assert!(!output.exists());
}

#[test_log::test(tokio::test)]
async fn test_concurrent_requests_each_append_one_row() {
    let origin = test_utils::create_origin_server(
        wiremock::ResponseTemplate::new(200).set_body_string(test_utils::origin_body("5.4321")),
    )
    .await;
    let pipeline = Pipeline::start(&origin.uri(), Duration::from_secs(2), true).await;
    let url = format!("http://{}{}", pipeline.addr, server::QUOTE_ROUTE);

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let url = url.clone();
            tokio::spawn(async move { reqwest::get(url).await.unwrap().status().as_u16() })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap() == 200 {
            successes += 1;
        }
    }

    assert_eq!(successes, 5);
    assert_eq!(pipeline.store.count().await.unwrap(), successes);
}
