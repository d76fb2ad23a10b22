//! Transfer records as reported by the AirDC++ transfers API

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Status id the source reports once a transfer has completed
pub const STATUS_FINISHED: &str = "finished";

/// Control transfers (partial file lists) carry this in their name
const FILE_LIST_MARKER: &str = "file list";

/// Source-assigned transfer identifier
///
/// AirDC++ emits numeric ids; string ids are accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransferId {
    Number(u64),
    Text(String),
}

impl TransferId {
    /// Zero and the empty string count as a missing id
    pub fn is_blank(&self) -> bool {
        match self {
            TransferId::Number(n) => *n == 0,
            TransferId::Text(s) => s.is_empty(),
        }
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferId::Number(n) => write!(f, "{}", n),
            TransferId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for TransferId {
    fn from(n: u64) -> Self {
        TransferId::Number(n)
    }
}

impl From<&str> for TransferId {
    fn from(s: &str) -> Self {
        TransferId::Text(s.to_string())
    }
}

/// Composite identity of one logical transfer: `{id}_{name}`
///
/// The id alone can be reused across reconnects and the name alone collides
/// when several peers fetch the same file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransferKey(String);

impl TransferKey {
    pub fn new(id: &TransferId, name: &str) -> Self {
        Self(format!("{}_{}", id, name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransferKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status block (`status.id` / `status.str`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferStatus {
    /// Machine-readable state, e.g. `running`, `waiting`, `finished`
    #[serde(default)]
    pub id: Option<String>,

    /// Human-readable status line shown by the client
    #[serde(default, rename = "str")]
    pub text: Option<String>,
}

/// One entry of the transfer list, read-only input to the reconciler
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferSnapshot {
    #[serde(default)]
    pub id: Option<TransferId>,

    #[serde(default)]
    pub name: Option<String>,

    /// `false` for uploads; `true`, missing or null mean download
    #[serde(default)]
    pub download: Option<bool>,

    #[serde(default, deserialize_with = "lenient")]
    pub status: TransferStatus,

    // Informational only; a bad shape reads as missing instead of dropping the entry
    #[serde(default, deserialize_with = "lenient")]
    pub size: Option<u64>,

    #[serde(default, deserialize_with = "lenient")]
    pub bytes_transferred: Option<u64>,

    /// Bytes per second
    #[serde(default, deserialize_with = "lenient")]
    pub speed: Option<f64>,

    /// Peer block; kept loose so a malformed peer never drops the entry
    #[serde(default)]
    pub user: Option<Value>,
}

impl TransferSnapshot {
    /// Build an upload entry with the given id, name and status id
    pub fn upload(id: impl Into<TransferId>, name: &str, status: &str) -> Self {
        Self {
            id: Some(id.into()),
            name: Some(name.to_string()),
            download: Some(false),
            status: TransferStatus {
                id: Some(status.to_string()),
                text: None,
            },
            ..Default::default()
        }
    }

    pub fn with_download(mut self, download: Option<bool>) -> Self {
        self.download = download;
        self
    }

    pub fn with_status_text(mut self, text: &str) -> Self {
        self.status.text = Some(text.to_string());
        self
    }

    pub fn with_peer(mut self, nick: &str, hub: &str) -> Self {
        self.user = Some(serde_json::json!({ "nicks": nick, "hub_names": hub }));
        self
    }

    pub fn with_progress(mut self, size: u64, bytes_transferred: u64, speed: f64) -> Self {
        self.size = Some(size);
        self.bytes_transferred = Some(bytes_transferred);
        self.speed = Some(speed);
        self
    }

    /// Display name with surrounding whitespace removed
    pub fn display_name(&self) -> &str {
        self.name.as_deref().map(str::trim).unwrap_or("")
    }

    pub fn is_upload(&self) -> bool {
        self.download == Some(false)
    }

    /// Partial file-list fetches are protocol chatter, not real uploads
    pub fn is_file_list(&self) -> bool {
        self.display_name().to_lowercase().contains(FILE_LIST_MARKER)
    }

    /// Composite key, or `None` when the id or name is blank
    pub fn key(&self) -> Option<TransferKey> {
        let id = self.id.as_ref().filter(|id| !id.is_blank())?;
        let name = self.display_name();
        if name.is_empty() {
            return None;
        }
        Some(TransferKey::new(id, name))
    }

    pub fn status_id(&self) -> Option<&str> {
        self.status.id.as_deref()
    }

    pub fn is_finished(&self) -> bool {
        self.status_id() == Some(STATUS_FINISHED)
    }

    pub fn status_text(&self) -> Option<&str> {
        self.status.text.as_deref()
    }

    pub fn peer_nick(&self) -> Option<&str> {
        self.user_field("nicks")
    }

    pub fn peer_hub(&self) -> Option<&str> {
        self.user_field("hub_names")
    }

    fn user_field(&self, field: &str) -> Option<&str> {
        self.user.as_ref()?.as_object()?.get(field)?.as_str()
    }

    pub fn size_bytes(&self) -> u64 {
        self.size.unwrap_or(0)
    }

    pub fn transferred_bytes(&self) -> u64 {
        self.bytes_transferred.unwrap_or(0)
    }

    pub fn speed_bps(&self) -> f64 {
        self.speed.unwrap_or(0.0)
    }
}

/// Decode a field, falling back to its default when the value has the wrong shape
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Read a raw API payload into transfer entries
///
/// Anything but a JSON array reads as an empty list. Array elements that do
/// not have the shape of a transfer become blank entries, which every filter
/// rejects; they still count towards the list so the cycle is not mistaken
/// for an empty one.
pub fn parse_transfer_list(payload: Value) -> Vec<TransferSnapshot> {
    let Value::Array(items) = payload else {
        tracing::debug!("Transfer payload is not an array, treating as empty");
        return Vec::new();
    };

    items
        .into_iter()
        .map(|item| match serde_json::from_value::<TransferSnapshot>(item) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::debug!("Unreadable transfer entry, ignoring it: {}", e);
                TransferSnapshot::default()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_combines_id_and_trimmed_name() {
        let t = TransferSnapshot::upload(42u64, "  movie.mkv ", "running");
        assert_eq!(t.key().unwrap().as_str(), "42_movie.mkv");
    }

    #[test]
    fn test_blank_id_or_name_has_no_key() {
        assert!(TransferSnapshot::upload(0u64, "a.bin", "running").key().is_none());
        assert!(TransferSnapshot::upload("", "a.bin", "running").key().is_none());
        assert!(TransferSnapshot::upload(7u64, "   ", "running").key().is_none());

        let mut no_id = TransferSnapshot::upload(7u64, "a.bin", "running");
        no_id.id = None;
        assert!(no_id.key().is_none());
    }

    #[test]
    fn test_direction_requires_explicit_false() {
        let t = TransferSnapshot::upload(1u64, "a", "running");
        assert!(t.is_upload());
        assert!(!t.clone().with_download(Some(true)).is_upload());
        assert!(!t.with_download(None).is_upload());
    }

    #[test]
    fn test_file_list_detection_ignores_case() {
        assert!(TransferSnapshot::upload(1u64, "Partial File List", "running").is_file_list());
        assert!(TransferSnapshot::upload(1u64, "files.xml.bz2 (file list)", "running").is_file_list());
        assert!(!TransferSnapshot::upload(1u64, "filelist.txt", "running").is_file_list());
    }

    #[test]
    fn test_parse_full_api_entry() {
        let payload = json!([{
            "id": 1234,
            "name": "movie.mkv",
            "download": false,
            "status": { "id": "running", "str": "Running (12.3%)" },
            "size": 1048576,
            "bytes_transferred": 524288,
            "speed": 2097152,
            "user": { "nicks": "alice", "hub_names": "Hub One", "cid": "ABC" },
            "target": "/share/movie.mkv"
        }]);

        let list = parse_transfer_list(payload);
        assert_eq!(list.len(), 1);
        let t = &list[0];
        assert_eq!(t.id, Some(TransferId::Number(1234)));
        assert!(t.is_upload());
        assert_eq!(t.status_id(), Some("running"));
        assert_eq!(t.status_text(), Some("Running (12.3%)"));
        assert_eq!(t.peer_nick(), Some("alice"));
        assert_eq!(t.peer_hub(), Some("Hub One"));
        assert_eq!(t.size_bytes(), 1048576);
        assert_eq!(t.transferred_bytes(), 524288);
        assert_eq!(t.speed_bps(), 2097152.0);
    }

    #[test]
    fn test_parse_non_array_is_empty() {
        assert!(parse_transfer_list(json!({"error": "unauthorized"})).is_empty());
        assert!(parse_transfer_list(json!(null)).is_empty());
    }

    #[test]
    fn test_parse_keeps_malformed_entries_as_blank() {
        let payload = json!([
            { "id": 1, "name": "good.iso", "download": false, "status": { "id": "running" } },
            { "id": 2, "name": "bad.iso", "download": "maybe" },
            "not an object"
        ]);
        let list = parse_transfer_list(payload);
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].display_name(), "good.iso");
        assert!(list[1..].iter().all(|t| !t.is_upload() && t.key().is_none()));
    }

    #[test]
    fn test_bad_informational_fields_keep_the_upload() {
        let payload = json!([
            { "id": 1, "name": "negative.iso", "download": false, "size": -1,
              "status": { "id": "running" } },
            { "id": 2, "name": "float.iso", "download": false, "bytes_transferred": 1.5e3,
              "speed": "fast", "status": { "id": "running" } },
            { "id": 3, "name": "nostatus.iso", "download": false, "status": null },
            { "id": 4, "name": "ok.iso", "download": false, "size": 10,
              "status": { "id": "running" } }
        ]);

        let list = parse_transfer_list(payload);
        let names: Vec<&str> = list.iter().map(|t| t.display_name()).collect();
        assert_eq!(names, vec!["negative.iso", "float.iso", "nostatus.iso", "ok.iso"]);
        assert!(list.iter().all(|t| t.is_upload() && t.key().is_some()));

        assert_eq!(list[0].size, None);
        assert_eq!(list[0].size_bytes(), 0);
        assert_eq!(list[1].bytes_transferred, None);
        assert_eq!(list[1].speed_bps(), 0.0);
        assert_eq!(list[2].status, TransferStatus::default());
        assert!(!list[2].is_finished());
        assert_eq!(list[3].size_bytes(), 10);
    }

    #[test]
    fn test_malformed_user_reads_as_missing() {
        let payload = json!([
            { "id": 1, "name": "a.iso", "download": false, "user": "someone" },
            { "id": 2, "name": "b.iso", "download": false, "user": { "nicks": ["x"] } }
        ]);
        let list = parse_transfer_list(payload);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].peer_nick(), None);
        assert_eq!(list[1].peer_nick(), None);
        assert_eq!(list[1].peer_hub(), None);
    }
}
