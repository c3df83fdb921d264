//! Node telemetry snapshot published by the supervisor's poller

use chrono::{DateTime, Local};
use serde_json::Value;

/// Point-in-time view of the node daemon, replaced wholesale each poll cycle.
#[derive(Debug, Clone)]
pub struct TelemetrySnapshot {
    pub height: u64,
    pub peer_count: u64,
    pub captured_at: DateTime<Local>,
}

impl Default for TelemetrySnapshot {
    fn default() -> Self {
        Self {
            height: 0,
            peer_count: 0,
            captured_at: Local::now(),
        }
    }
}

impl TelemetrySnapshot {
    /// Build a snapshot from the node's `/get_info` response body.
    ///
    /// Missing or non-numeric fields count as 0. The peer count is the sum of
    /// the incoming and outgoing connection counts.
    pub fn from_get_info(body: &Value) -> Self {
        let field = |name: &str| body.get(name).and_then(Value::as_u64).unwrap_or(0);
        Self {
            height: field("height"),
            peer_count: field("incoming_connections_count") + field("outgoing_connections_count"),
            captured_at: Local::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_height_and_sums_connection_counts() {
        let body = json!({
            "height": 1234,
            "incoming_connections_count": 3,
            "outgoing_connections_count": 5
        });

        let snapshot = TelemetrySnapshot::from_get_info(&body);
        assert_eq!(snapshot.height, 1234);
        assert_eq!(snapshot.peer_count, 8);
    }

    #[test]
    fn missing_fields_default_to_zero() {
        let snapshot = TelemetrySnapshot::from_get_info(&json!({}));
        assert_eq!(snapshot.height, 0);
        assert_eq!(snapshot.peer_count, 0);
    }

    #[test]
    fn non_numeric_fields_count_as_zero() {
        let body = json!({
            "height": "not a number",
            "incoming_connections_count": 2
        });

        let snapshot = TelemetrySnapshot::from_get_info(&body);
        assert_eq!(snapshot.height, 0);
        assert_eq!(snapshot.peer_count, 2);
    }
}
