//! Notification text for a newly-detected upload

use crate::types::TransferSnapshot;
use chrono::{DateTime, Local};

/// Placeholder for fields the source did not report
pub const UNKNOWN: &str = "unknown";

const HEADER: &str = "🔼 <b>AirDC - New upload detected</b>";

/// Everything known about an upload at notification time
///
/// `size` and `progress_percent` are computed but left out of the rendered
/// text.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadMessage {
    pub timestamp: DateTime<Local>,
    pub file: String,
    pub user: String,
    pub hub: String,
    pub speed: String,
    pub status: String,
    pub size: String,
    pub progress_percent: f64,
}

impl UploadMessage {
    pub fn from_transfer(transfer: &TransferSnapshot, timestamp: DateTime<Local>) -> Self {
        Self {
            timestamp,
            file: transfer.display_name().to_string(),
            user: transfer.peer_nick().unwrap_or(UNKNOWN).to_string(),
            hub: transfer.peer_hub().unwrap_or(UNKNOWN).to_string(),
            speed: format_speed(transfer.speed_bps()),
            status: transfer.status_text().unwrap_or(UNKNOWN).to_string(),
            size: format_size(transfer.size_bytes()),
            progress_percent: progress_percent(transfer.transferred_bytes(), transfer.size_bytes()),
        }
    }

    /// Telegram HTML body
    pub fn render(&self) -> String {
        format!(
            "{header}\n\n\
             📅 Date: {date}\n\
             📁 File: {file}\n\
             👤 User: {user}\n\
             🌐 Hub: {hub}\n\
             ⚡ Speed: {speed}\n\
             📋 Status: {status}",
            header = HEADER,
            date = self.timestamp.format("%d/%m/%Y %H:%M:%S"),
            file = escape_html(&self.file),
            user = escape_html(&self.user),
            hub = escape_html(&self.hub),
            speed = self.speed,
            status = escape_html(&self.status),
        )
    }
}

/// Bytes per second as `x.xx MB/s`, or `unknown` when not positive
pub fn format_speed(bytes_per_sec: f64) -> String {
    if bytes_per_sec > 0.0 {
        format!("{:.2} MB/s", bytes_per_sec / 1024.0 / 1024.0)
    } else {
        UNKNOWN.to_string()
    }
}

/// Human-readable size with two decimals, B through PB
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if size < 1024.0 {
            return format!("{:.2} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.2} PB", size)
}

/// Percentage transferred; 0 when the size is unknown
pub fn progress_percent(transferred: u64, size: u64) -> f64 {
    if size == 0 {
        return 0.0;
    }
    transferred as f64 / size as f64 * 100.0
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
