//! Aggregate health of the running server
//!
//! Combines the self-healing client's view of the REST API with the
//! transport manager's status into one serializable report.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::healing::{HealthSnapshot, SelfHealingClient};
use crate::transports::manager::TransportStatus;
use crate::transports::TransportManager;

/// REST API side of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObsidianHealth {
    /// The client has no pending failed reconnects
    pub connected: bool,
    pub url: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_check: DateTime<Utc>,
}

/// Full health report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    /// API connected and every enabled transport running
    pub healthy: bool,
    pub obsidian: ObsidianHealth,
    pub transports: TransportStatus,
    /// Whole seconds since `started_at`
    pub uptime: u64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl HealthStatus {
    pub fn from_parts(
        api: &HealthSnapshot,
        transports: TransportStatus,
        started_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        let transports_up = [transports.stdio, transports.http]
            .iter()
            .all(|entry| !entry.enabled || entry.running);

        Self {
            healthy: api.healthy && transports_up,
            obsidian: ObsidianHealth {
                connected: api.healthy,
                url: api.url.clone(),
                last_check: api.last_check,
            },
            transports,
            uptime: (now - started_at).num_seconds().max(0) as u64,
            timestamp: now,
        }
    }
}

/// Snapshot the client and the transports right now
pub fn health_status(
    client: &SelfHealingClient,
    manager: &TransportManager,
    started_at: DateTime<Utc>,
) -> HealthStatus {
    HealthStatus::from_parts(&client.health(), manager.get_status(), started_at, Utc::now())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::transports::manager::TransportStatusEntry;

    const ON: TransportStatusEntry = TransportStatusEntry {
        enabled: true,
        running: true,
    };
    const DOWN: TransportStatusEntry = TransportStatusEntry {
        enabled: true,
        running: false,
    };
    const OFF: TransportStatusEntry = TransportStatusEntry {
        enabled: false,
        running: false,
    };

    fn snapshot(healthy: bool) -> HealthSnapshot {
        HealthSnapshot {
            healthy,
            url: "http://127.0.0.1:27123".to_string(),
            last_check: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
            reconnect_count: if healthy { 0 } else { 2 },
        }
    }

    fn status(api: &HealthSnapshot, stdio: TransportStatusEntry, http: TransportStatusEntry) -> HealthStatus {
        let started = Utc.with_ymd_and_hms(2026, 1, 2, 3, 0, 0).unwrap();
        let now = started + Duration::milliseconds(90_900);
        HealthStatus::from_parts(api, TransportStatus { stdio, http }, started, now)
    }

    #[test]
    fn test_healthy_when_api_and_enabled_transports_are_up() {
        assert!(status(&snapshot(true), ON, ON).healthy);
        assert!(status(&snapshot(true), ON, OFF).healthy);
        assert!(status(&snapshot(true), OFF, ON).healthy);
    }

    #[test]
    fn test_enabled_transport_down_is_unhealthy() {
        assert!(!status(&snapshot(true), ON, DOWN).healthy);
        assert!(!status(&snapshot(true), DOWN, OFF).healthy);
    }

    #[test]
    fn test_pending_reconnects_are_unhealthy() {
        let health = status(&snapshot(false), ON, ON);
        assert!(!health.healthy);
        assert!(!health.obsidian.connected);
    }

    #[test]
    fn test_uptime_in_whole_seconds() {
        assert_eq!(status(&snapshot(true), ON, ON).uptime, 90);

        let now = Utc::now();
        let health = HealthStatus::from_parts(
            &snapshot(true),
            TransportStatus::default(),
            now + Duration::seconds(5),
            now,
        );
        assert_eq!(health.uptime, 0, "clock skew never goes negative");
    }

    #[test]
    fn test_serializes_camel_case_with_millisecond_timestamps() {
        let api = snapshot(true);
        let health = status(&api, ON, OFF);
        let json = serde_json::to_value(&health).unwrap();

        assert_eq!(json["healthy"], true);
        assert_eq!(json["obsidian"]["connected"], true);
        assert_eq!(json["obsidian"]["url"], "http://127.0.0.1:27123");
        assert_eq!(
            json["obsidian"]["lastCheck"],
            api.last_check.timestamp_millis()
        );
        assert_eq!(json["transports"]["stdio"]["running"], true);
        assert_eq!(json["transports"]["http"]["enabled"], false);
        assert_eq!(json["uptime"], 90);
        assert_eq!(json["timestamp"], health.timestamp.timestamp_millis());
    }
}
