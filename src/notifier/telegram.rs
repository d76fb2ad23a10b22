//! Telegram Bot API delivery

use super::message::UploadMessage;
use super::Notifier;
use crate::config::TelegramConfig;
use crate::errors::DeliveryError;
use crate::types::TransferSnapshot;
use async_trait::async_trait;
use chrono::Local;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error, info};

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

/// Sends upload notifications through `sendMessage`
pub struct TelegramNotifier {
    client: Client,
    /// Full `sendMessage` URL; contains the bot token, never logged
    endpoint: String,
    api_url: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        let api_url = config.api_url.trim_end_matches('/').to_string();

        Ok(Self {
            client,
            endpoint: format!("{}/bot{}/sendMessage", api_url, config.bot_token),
            api_url,
            chat_id: config.chat_id.clone(),
        })
    }

    /// Post one HTML message to the configured chat
    pub async fn send_message(&self, text: &str) -> Result<(), DeliveryError> {
        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
            parse_mode: "HTML",
        };
        debug!(api = %self.api_url, payload = ?request, "Sending Telegram message");

        let response = self.client.post(&self.endpoint).json(&request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        if tracing::enabled!(tracing::Level::DEBUG) {
            let body = response.text().await.unwrap_or_default();
            debug!(response = %body, "Telegram response");
        }

        info!("Message sent to Telegram");
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, transfer: &TransferSnapshot) -> Result<(), DeliveryError> {
        let message = UploadMessage::from_transfer(transfer, Local::now());
        debug!(
            name = %message.file,
            size = %message.size,
            progress = %format!("{:.1}%", message.progress_percent),
            "Preparing Telegram notification"
        );

        self.send_message(&message.render()).await.map_err(|e| {
            error!("Error sending Telegram message: {}", e);
            e
        })
    }
}
