//! End-to-end cycles: scripted transfer list, real Telegram client, mock HTTP

use async_trait::async_trait;
use std::sync::Mutex;
use upload_monitor::config::{PollingConfig, TelegramConfig};
use upload_monitor::{FetchError, Monitor, TelegramNotifier, TransferSnapshot, TransferSource};

/// Always returns the same list
struct FixedSource(Mutex<Vec<TransferSnapshot>>);

impl FixedSource {
    fn new(list: Vec<TransferSnapshot>) -> Self {
        Self(Mutex::new(list))
    }
}

#[async_trait]
impl TransferSource for FixedSource {
    async fn fetch(&self) -> Result<Vec<TransferSnapshot>, FetchError> {
        Ok(self.0.lock().unwrap().clone())
    }
}

fn notifier_for(server: &mockito::ServerGuard) -> TelegramNotifier {
    TelegramNotifier::new(&TelegramConfig {
        api_url: server.url(),
        bot_token: "123:abc".to_string(),
        chat_id: "42".to_string(),
        timeout_secs: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn test_server_error_leaves_upload_pending_until_delivered() {
    let mut server = mockito::Server::new_async().await;
    let failing = server
        .mock("POST", "/bot123:abc/sendMessage")
        .with_status(500)
        .expect(1)
        .create_async()
        .await;

    let source = FixedSource::new(vec![TransferSnapshot::upload(1u64, "movie.mkv", "running")]);
    let mut monitor = Monitor::new(source, notifier_for(&server), PollingConfig::default());

    let report = monitor.run_cycle().await.unwrap();
    assert_eq!(report.failed, 1);
    assert!(!monitor.reconciler().is_notified("movie.mkv"));
    failing.assert_async().await;
    failing.remove_async().await;

    let accepting = server
        .mock("POST", "/bot123:abc/sendMessage")
        .with_status(200)
        .with_body(r#"{"ok":true}"#)
        .expect(1)
        .create_async()
        .await;

    let report = monitor.run_cycle().await.unwrap();
    assert_eq!(report.detected, 1);
    assert_eq!(report.notified, 1);
    assert!(monitor.reconciler().is_notified("movie.mkv"));

    // Delivered once; later cycles stay quiet
    let report = monitor.run_cycle().await.unwrap();
    assert_eq!(report.detected, 0);
    accepting.assert_async().await;
}

#[tokio::test]
async fn test_downloads_and_file_lists_never_reach_telegram() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/bot123:abc/sendMessage")
        .with_status(200)
        .expect(0)
        .create_async()
        .await;

    let source = FixedSource::new(vec![
        TransferSnapshot::upload(1u64, "incoming.iso", "running").with_download(Some(true)),
        TransferSnapshot::upload(2u64, "Partial File List", "running"),
        TransferSnapshot::upload(3u64, "unknown.iso", "running").with_download(None),
    ]);
    let mut monitor = Monitor::new(source, notifier_for(&server), PollingConfig::default());

    let report = monitor.run_cycle().await.unwrap();
    assert_eq!(report.fetched, 3);
    assert_eq!(report.detected, 0);
    assert_eq!(monitor.reconciler().active_len(), 0);
    mock.assert_async().await;
}
