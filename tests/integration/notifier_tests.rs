use super::*;
use ozon_price_watcher::config::TelegramConfig;
use ozon_price_watcher::{NotifierPlugin, TelegramNotifier};
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

fn notifier_for(server: &MockServer, max_message_length: usize) -> TelegramNotifier {
    TelegramNotifier::new(&TelegramConfig {
        api_base: server.uri(),
        max_message_length,
        part_delay_ms: 0,
    })
}

fn report_lines(count: usize) -> String {
    (0..count)
        .map(|i| format!("- line {:02}: price check entry", i))
        .collect::<Vec<_>>()
        .join("\n")
}

#[tokio::test]
async fn test_send_posts_html_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TELEGRAM_PATH))
        .and(body_json(json!({
            "chat_id": "@price_alerts",
            "text": "<b>hello</b>",
            "parse_mode": "HTML"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = notifier_for(&server, 4000);
    assert!(notifier.send(&configured_settings(), "<b>hello</b>").await);
}

#[tokio::test]
async fn test_missing_credentials_make_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let settings = Settings {
        telegram_bot_token: String::new(),
        ..configured_settings()
    };
    assert!(!notifier_for(&server, 4000).send(&settings, "hello").await);
}

#[tokio::test]
async fn test_other_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TELEGRAM_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "description": "Bad Request: chat not found"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let message = report_lines(20);
    assert!(!notifier_for(&server, 100).send(&configured_settings(), &message).await);
}

#[tokio::test]
async fn test_too_long_message_is_resent_in_parts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TELEGRAM_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(too_long_body()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(TELEGRAM_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let message = report_lines(12);
    let notifier = notifier_for(&server, 100);
    assert!(notifier.send(&configured_settings(), &message).await);

    let texts = telegram_texts(&server).await;
    let (first, parts) = texts.split_first().expect("at least one request");
    assert_eq!(first, &message);
    assert!(parts.len() >= 4);
    assert_eq!(parts.concat(), message);
    assert!(parts.iter().all(|part| part.chars().count() <= 100));
}

#[tokio::test]
async fn test_failed_part_does_not_stop_remaining_parts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TELEGRAM_PATH))
        .respond_with(
            ResponseTemplate::new(400).set_body_string("Bad Request: MESSAGE IS TOO LONG"),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(TELEGRAM_PATH))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(TELEGRAM_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let message = report_lines(12);
    let expected_parts = ozon_price_watcher::plugins::notifiers::split_message(&message, 100);

    let delivered = notifier_for(&server, 100)
        .send(&configured_settings(), &message)
        .await;

    assert!(!delivered);
    assert_eq!(telegram_texts(&server).await.len(), 1 + expected_parts.len());
}

#[tokio::test]
async fn test_parts_are_spaced_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TELEGRAM_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(too_long_body()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(TELEGRAM_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let message = report_lines(3);
    let notifier = notifier_for(&server, 40).with_part_delay(Duration::from_millis(50));
    let parts = ozon_price_watcher::plugins::notifiers::split_message(&message, 40).len();

    let started = std::time::Instant::now();
    assert!(notifier.send(&configured_settings(), &message).await);
    assert!(started.elapsed() >= Duration::from_millis(50 * parts as u64));
}

#[tokio::test]
async fn test_unreachable_api_returns_false() {
    let notifier = TelegramNotifier::new(&TelegramConfig {
        api_base: "http://127.0.0.1:9".to_string(),
        max_message_length: 4000,
        part_delay_ms: 0,
    });

    assert!(!notifier.send(&configured_settings(), "hello").await);
}
