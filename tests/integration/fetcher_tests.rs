use super::*;
use ozon_price_watcher::{AppError, PriceFetcher, Visibility};
use rust_decimal::Decimal;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn fetcher_for(server: &MockServer) -> PriceFetcher {
    let mut config = AppConfig::default().ozon;
    config.prices_url = format!("{}{}", server.uri(), PRICES_PATH);
    PriceFetcher::new(config)
}

#[tokio::test]
async fn test_fetch_sends_credentials_and_filter() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PRICES_PATH))
        .and(header("Client-Id", "12345"))
        .and(header("Api-Key", "test-api-key"))
        .and(body_json(json!({
            "cursor": "",
            "filter": { "visibility": "IN_SALE" },
            "limit": 100
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_page()))
        .expect(1)
        .mount(&server)
        .await;

    let settings = Settings {
        visibility: Visibility::InSale,
        ..configured_settings()
    };
    let page = fetcher_for(&server).fetch(&settings).await?;

    let items = page.items.expect("items present");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].offer_id, "SKU-RED");
    assert_eq!(items[0].product_id, "214591");
    assert_eq!(items[0].price.min_price, Decimal::new(1390, 0));
    assert_eq!(page.total, Some(2));

    Ok(())
}

#[tokio::test]
async fn test_fetch_without_api_key_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_page()))
        .expect(0)
        .mount(&server)
        .await;

    let settings = Settings {
        api_key: String::new(),
        ..configured_settings()
    };
    let err = fetcher_for(&server).fetch(&settings).await.unwrap_err();

    assert!(matches!(err, AppError::CredentialsMissing { .. }));
}

#[tokio::test]
async fn test_non_200_status_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PRICES_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&server)
        .await;

    let err = fetcher_for(&server)
        .fetch(&configured_settings())
        .await
        .unwrap_err();

    match err {
        AppError::Api { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "internal");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_non_json_body_is_analysis_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PRICES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = fetcher_for(&server)
        .fetch(&configured_settings())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::AnalysisData(_)));
}

#[tokio::test]
async fn test_page_limit_is_configurable() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PRICES_PATH))
        .and(body_json(json!({
            "cursor": "",
            "filter": { "visibility": "ALL" },
            "limit": 25
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = AppConfig::default().ozon;
    config.prices_url = format!("{}{}", server.uri(), PRICES_PATH);
    config.page_limit = 25;

    let page = PriceFetcher::new(config).fetch(&configured_settings()).await?;
    assert_eq!(page.items, Some(vec![]));

    Ok(())
}
