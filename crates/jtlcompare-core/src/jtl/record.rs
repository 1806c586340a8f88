use serde::{Deserialize, Serialize};

/// One sample row of a JTL file.
///
/// Every field is optional because JMeter only writes the columns enabled for
/// the run. A field is `Some` exactly when its column was in the file header;
/// the accessor methods apply the defaults consumers rely on (`0`, `false`,
/// `""`). Records are never mutated after parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JtlRecord {
    /// Sample start time, epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes_received: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes_sent: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_threads: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_threads: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_time_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_ms: Option<u64>,
}

impl JtlRecord {
    pub fn timestamp(&self) -> i64 {
        self.timestamp.unwrap_or(0)
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms.unwrap_or(0)
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or("")
    }

    /// A record without a `success` column counts as failed.
    pub fn is_success(&self) -> bool {
        self.success.unwrap_or(false)
    }

    pub fn response_code(&self) -> &str {
        self.response_code.as_deref().unwrap_or("")
    }

    pub fn response_message(&self) -> &str {
        self.response_message.as_deref().unwrap_or("")
    }

    pub fn thread_name(&self) -> &str {
        self.thread_name.as_deref().unwrap_or("")
    }

    pub fn data_type(&self) -> &str {
        self.data_type.as_deref().unwrap_or("")
    }

    pub fn failure_message(&self) -> &str {
        self.failure_message.as_deref().unwrap_or("")
    }

    pub fn url(&self) -> &str {
        self.url.as_deref().unwrap_or("")
    }

    pub fn bytes_received(&self) -> u64 {
        self.bytes_received.unwrap_or(0)
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent.unwrap_or(0)
    }

    pub fn group_threads(&self) -> u64 {
        self.group_threads.unwrap_or(0)
    }

    pub fn all_threads(&self) -> u64 {
        self.all_threads.unwrap_or(0)
    }

    pub fn latency_ms(&self) -> u64 {
        self.latency_ms.unwrap_or(0)
    }

    pub fn idle_time_ms(&self) -> u64 {
        self.idle_time_ms.unwrap_or(0)
    }

    pub fn connect_ms(&self) -> u64 {
        self.connect_ms.unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_use_defaults() {
        let record = JtlRecord::default();
        assert_eq!(record.timestamp(), 0);
        assert_eq!(record.elapsed_ms(), 0);
        assert_eq!(record.label(), "");
        assert!(!record.is_success());
        assert_eq!(record.bytes_received(), 0);
        assert_eq!(record.url(), "");
        assert_eq!(record.connect_ms(), 0);
    }

    #[test]
    fn present_fields_are_returned() {
        let record = JtlRecord {
            timestamp: Some(1_700_000_000_000),
            elapsed_ms: Some(250),
            label: Some("login".to_string()),
            success: Some(true),
            bytes_sent: Some(128),
            ..Default::default()
        };
        assert_eq!(record.timestamp(), 1_700_000_000_000);
        assert_eq!(record.elapsed_ms(), 250);
        assert_eq!(record.label(), "login");
        assert!(record.is_success());
        assert_eq!(record.bytes_sent(), 128);
    }

    #[test]
    fn serialization_omits_absent_columns() {
        let record = JtlRecord {
            elapsed_ms: Some(10),
            label: Some("home".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&record).expect("serialize should succeed");
        let obj = json.as_object().expect("record should serialize to an object");
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["elapsedMs"], 10);
        assert_eq!(obj["label"], "home");
        assert!(obj.get("timestamp").is_none());
    }
}
