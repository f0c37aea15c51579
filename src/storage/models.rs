use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Online,
    Warning,
    Critical,
    Offline,
}

impl std::fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerStatus::Online => write!(f, "online"),
            ServerStatus::Warning => write!(f, "warning"),
            ServerStatus::Critical => write!(f, "critical"),
            ServerStatus::Offline => write!(f, "offline"),
        }
    }
}

impl std::str::FromStr for ServerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" => Ok(ServerStatus::Online),
            "warning" => Ok(ServerStatus::Warning),
            "critical" => Ok(ServerStatus::Critical),
            "offline" => Ok(ServerStatus::Offline),
            _ => Err(format!("Unknown server status: {}", s)),
        }
    }
}

/// A monitored host registration. The agent token is persisted only as a
/// SHA-256 hex digest; the plaintext is printed once at creation time.
#[derive(Debug, Clone, Serialize)]
pub struct Server {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub hostname: Option<String>,
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub status: ServerStatus,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub agent_version: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Server {
    /// No ingestion within the threshold window reads as offline,
    /// regardless of the stored status.
    pub fn is_offline(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        match self.last_seen_at {
            Some(seen) => seen < now - threshold,
            None => true,
        }
    }

    pub fn effective_status(&self, now: DateTime<Utc>, threshold: Duration) -> ServerStatus {
        if self.is_offline(now, threshold) {
            ServerStatus::Offline
        } else {
            self.status
        }
    }
}

/// One ingestion snapshot. Scalars are independently optional; the
/// structured sections are stored as opaque JSON documents and read
/// through the typed accessors below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricRecord {
    pub id: Option<i64>,
    pub server_id: i64,
    pub recorded_at: DateTime<Utc>,
    pub uptime: Option<i64>,
    pub load_1m: Option<f64>,
    pub load_5m: Option<f64>,
    pub load_15m: Option<f64>,
    pub cpu_cores: Option<i64>,
    pub memory_total: Option<i64>,
    pub memory_used: Option<i64>,
    pub memory_available: Option<i64>,
    pub swap_total: Option<i64>,
    pub swap_used: Option<i64>,
    pub disks: Option<Value>,
    pub services: Option<Value>,
    pub network: Option<Value>,
    pub security: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[allow(dead_code)]
pub struct DiskUsage {
    #[serde(default)]
    pub mount: Option<String>,
    #[serde(default)]
    pub total_mb: Option<i64>,
    #[serde(default)]
    pub used_mb: Option<i64>,
    #[serde(default)]
    pub percent: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[allow(dead_code)]
pub struct InterfaceCounters {
    #[serde(default)]
    pub interface: Option<String>,
    #[serde(default)]
    pub rx_bytes: Option<i64>,
    #[serde(default)]
    pub tx_bytes: Option<i64>,
}

impl MetricRecord {
    /// Normalize a raw agent payload. Every scalar is looked up by nested
    /// path and missing segments degrade to None; `recorded_at` is the
    /// injected ingestion time, never a client-supplied value.
    pub fn from_payload(server_id: i64, recorded_at: DateTime<Utc>, payload: &Value) -> Self {
        Self {
            id: None,
            server_id,
            recorded_at,
            uptime: payload.pointer("/system/uptime").and_then(Value::as_i64),
            load_1m: payload.pointer("/system/load/1m").and_then(Value::as_f64),
            load_5m: payload.pointer("/system/load/5m").and_then(Value::as_f64),
            load_15m: payload.pointer("/system/load/15m").and_then(Value::as_f64),
            cpu_cores: payload.pointer("/system/cpu_cores").and_then(Value::as_i64),
            memory_total: payload.pointer("/memory/mem/total").and_then(Value::as_i64),
            memory_used: payload.pointer("/memory/mem/used").and_then(Value::as_i64),
            memory_available: payload
                .pointer("/memory/mem/available")
                .and_then(Value::as_i64),
            swap_total: payload.pointer("/memory/swap/total").and_then(Value::as_i64),
            swap_used: payload.pointer("/memory/swap/used").and_then(Value::as_i64),
            disks: payload.get("disks").filter(|v| v.is_array()).cloned(),
            services: payload
                .get("services")
                .filter(|v| v.is_array() || v.is_object())
                .cloned(),
            network: payload.get("network").filter(|v| v.is_array()).cloned(),
            security: payload.get("security").filter(|v| v.is_object()).cloned(),
        }
    }

    /// Disk entries that parse; malformed elements are skipped.
    pub fn disk_entries(&self) -> Vec<DiskUsage> {
        match &self.disks {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| serde_json::from_value(v.clone()).ok())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Service (name, status) pairs. Accepts both the current
    /// array-of-objects shape and the legacy name→status map.
    pub fn service_statuses(&self) -> Vec<(String, String)> {
        match &self.services {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    let name = item
                        .get("name")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown")
                        .to_string();
                    let status = item
                        .get("status")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown")
                        .to_string();
                    (name, status)
                })
                .collect(),
            Some(Value::Object(map)) => map
                .iter()
                .map(|(name, status)| {
                    let status = status.as_str().unwrap_or("unknown").to_string();
                    (name.clone(), status)
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// First reported interface (the agent lists the primary one first).
    pub fn primary_interface(&self) -> Option<InterfaceCounters> {
        match &self.network {
            Some(Value::Array(items)) => items
                .first()
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
            _ => None,
        }
    }

    /// Integer counter from the security document (e.g. `ssh_failed_24h`).
    pub fn security_counter(&self, key: &str) -> Option<i64> {
        self.security
            .as_ref()
            .and_then(|s| s.get(key))
            .and_then(Value::as_i64)
    }

    /// Currently banned IPs from `security.banned_ips`. Accepts both the
    /// legacy list-of-strings and the `{ip, unban_at}` object shape.
    pub fn banned_ips(&self) -> Vec<String> {
        let items = match self.security.as_ref().and_then(|s| s.get("banned_ips")) {
            Some(Value::Array(items)) => items,
            _ => return Vec::new(),
        };

        items
            .iter()
            .filter_map(|item| match item {
                Value::String(ip) => Some(ip.clone()),
                Value::Object(obj) => obj.get("ip").and_then(Value::as_str).map(str::to_string),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BanEventType {
    Ban,
    Unban,
}

impl std::fmt::Display for BanEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BanEventType::Ban => write!(f, "ban"),
            BanEventType::Unban => write!(f, "unban"),
        }
    }
}

impl std::str::FromStr for BanEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ban" => Ok(BanEventType::Ban),
            "unban" => Ok(BanEventType::Unban),
            _ => Err(format!("Unknown ban event type: {}", s)),
        }
    }
}

/// A ban or unban occurrence for an IP on a server. Append-only; the
/// latest event for a (server, ip) pair defines "currently banned".
#[derive(Debug, Clone, Serialize)]
pub struct BannedIpEvent {
    pub id: Option<i64>,
    pub server_id: i64,
    pub ip_address: String,
    pub event_type: BanEventType,
    pub jail: String,
    pub country_code: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub isp: Option<String>,
    pub event_at: DateTime<Utc>,
}

pub const DEFAULT_JAIL: &str = "sshd";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Comparison {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "==")]
    Eq,
}

impl std::fmt::Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Comparison::Gt => write!(f, ">"),
            Comparison::Lt => write!(f, "<"),
            Comparison::Ge => write!(f, ">="),
            Comparison::Le => write!(f, "<="),
            Comparison::Eq => write!(f, "=="),
        }
    }
}

impl std::str::FromStr for Comparison {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ">" => Ok(Comparison::Gt),
            "<" => Ok(Comparison::Lt),
            ">=" => Ok(Comparison::Ge),
            "<=" => Ok(Comparison::Le),
            "==" => Ok(Comparison::Eq),
            _ => Err(format!("Unknown comparison operator: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
pub enum ThresholdSeverity {
    Warning,
    Critical,
}

/// User-configurable alert threshold. A null `server_id` is the owner's
/// global default; server-specific rows take precedence at resolution.
#[derive(Debug, Clone, Serialize)]
pub struct Threshold {
    pub id: Option<i64>,
    pub owner_id: i64,
    pub server_id: Option<i64>,
    pub metric: String,
    pub warning_value: f64,
    pub critical_value: f64,
    pub comparison: Comparison,
    pub is_active: bool,
}

/// Seed thresholds for a new owner: (metric, warning, critical, comparison).
pub const DEFAULT_THRESHOLDS: &[(&str, f64, f64, Comparison)] = &[
    ("cpu_load", 70.0, 90.0, Comparison::Gt),
    ("memory_percent", 80.0, 95.0, Comparison::Gt),
    ("disk_percent", 80.0, 95.0, Comparison::Gt),
    ("swap_percent", 50.0, 80.0, Comparison::Gt),
];

impl Threshold {
    /// Critical is checked before warning; inactive thresholds never match.
    #[allow(dead_code)]
    pub fn check(&self, value: f64) -> Option<ThresholdSeverity> {
        if !self.is_active {
            return None;
        }

        if self.violates(value, self.critical_value) {
            return Some(ThresholdSeverity::Critical);
        }

        if self.violates(value, self.warning_value) {
            return Some(ThresholdSeverity::Warning);
        }

        None
    }

    fn violates(&self, value: f64, threshold: f64) -> bool {
        match self.comparison {
            Comparison::Gt => value > threshold,
            Comparison::Lt => value < threshold,
            Comparison::Ge => value >= threshold,
            Comparison::Le => value <= threshold,
            Comparison::Eq => value == threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(payload: serde_json::Value) -> MetricRecord {
        MetricRecord::from_payload(1, Utc::now(), &payload)
    }

    #[test]
    fn test_from_payload_extracts_nested_scalars() {
        let m = record(json!({
            "system": {"uptime": 3600, "load": {"1m": 0.5, "5m": 0.4, "15m": 0.3}, "cpu_cores": 4},
            "memory": {"mem": {"total": 8192, "used": 4096, "available": 4000},
                       "swap": {"total": 2048, "used": 100}},
        }));

        assert_eq!(m.uptime, Some(3600));
        assert_eq!(m.load_1m, Some(0.5));
        assert_eq!(m.cpu_cores, Some(4));
        assert_eq!(m.memory_total, Some(8192));
        assert_eq!(m.memory_used, Some(4096));
        assert_eq!(m.swap_used, Some(100));
    }

    #[test]
    fn test_from_payload_tolerates_missing_sections() {
        let m = record(json!({}));

        assert_eq!(m.uptime, None);
        assert_eq!(m.load_1m, None);
        assert_eq!(m.memory_total, None);
        assert!(m.disks.is_none());
        assert!(m.services.is_none());
        assert!(m.security.is_none());
    }

    #[test]
    fn test_from_payload_rejects_wrongly_shaped_documents() {
        // disks must be an array, security an object; other shapes are dropped
        let m = record(json!({"disks": "nope", "security": [1, 2], "services": 7}));

        assert!(m.disks.is_none());
        assert!(m.security.is_none());
        assert!(m.services.is_none());
    }

    #[test]
    fn test_service_statuses_array_format() {
        let m = record(json!({
            "services": [
                {"name": "nginx", "status": "running"},
                {"name": "mysql", "status": "stopped"},
            ]
        }));

        assert_eq!(
            m.service_statuses(),
            vec![
                ("nginx".to_string(), "running".to_string()),
                ("mysql".to_string(), "stopped".to_string()),
            ]
        );
    }

    #[test]
    fn test_service_statuses_legacy_map_format() {
        let m = record(json!({"services": {"nginx": "running", "mysql": "stopped"}}));

        let statuses = m.service_statuses();
        assert_eq!(statuses.len(), 2);
        assert!(statuses.contains(&("mysql".to_string(), "stopped".to_string())));
    }

    #[test]
    fn test_banned_ips_legacy_string_list() {
        let m = record(json!({"security": {"banned_ips": ["1.2.3.4", "5.6.7.8"]}}));
        assert_eq!(m.banned_ips(), vec!["1.2.3.4", "5.6.7.8"]);
    }

    #[test]
    fn test_banned_ips_object_list() {
        let m = record(json!({"security": {"banned_ips": [
            {"ip": "1.2.3.4", "unban_at": "2026-01-03T12:00:00Z"},
            {"ip": "5.6.7.8", "unban_at": "2026-01-03T13:00:00Z"},
        ]}}));
        assert_eq!(m.banned_ips(), vec!["1.2.3.4", "5.6.7.8"]);
    }

    #[test]
    fn test_banned_ips_skips_malformed_entries() {
        let m = record(json!({"security": {"banned_ips": [
            "1.2.3.4", 42, {"unban_at": "2026-01-03T12:00:00Z"}, {"ip": "5.6.7.8"},
        ]}}));
        assert_eq!(m.banned_ips(), vec!["1.2.3.4", "5.6.7.8"]);
    }

    #[test]
    fn test_primary_interface() {
        let m = record(json!({"network": [
            {"interface": "eth0", "rx_bytes": 1000, "tx_bytes": 2000},
            {"interface": "eth1", "rx_bytes": 10, "tx_bytes": 20},
        ]}));

        let iface = m.primary_interface().unwrap();
        assert_eq!(iface.interface.as_deref(), Some("eth0"));
        assert_eq!(iface.rx_bytes, Some(1000));
    }

    #[test]
    fn test_security_counter() {
        let m = record(json!({"security": {"ssh_failed_24h": 17, "f2b_currently_banned": 3}}));
        assert_eq!(m.security_counter("ssh_failed_24h"), Some(17));
        assert_eq!(m.security_counter("f2b_total_banned"), None);
    }

    #[test]
    fn test_server_offline_by_staleness() {
        let now = Utc::now();
        let server = Server {
            id: 1,
            owner_id: 1,
            name: "web-1".to_string(),
            hostname: None,
            token_hash: String::new(),
            status: ServerStatus::Online,
            last_seen_at: Some(now - Duration::minutes(6)),
            is_active: true,
            agent_version: None,
            created_at: now,
        };

        assert!(server.is_offline(now, Duration::minutes(5)));
        assert_eq!(
            server.effective_status(now, Duration::minutes(5)),
            ServerStatus::Offline
        );

        let fresh = Server {
            last_seen_at: Some(now - Duration::minutes(2)),
            ..server
        };
        assert_eq!(
            fresh.effective_status(now, Duration::minutes(5)),
            ServerStatus::Online
        );
    }

    #[test]
    fn test_threshold_check_severity_order() {
        let t = Threshold {
            id: None,
            owner_id: 1,
            server_id: None,
            metric: "memory_percent".to_string(),
            warning_value: 80.0,
            critical_value: 95.0,
            comparison: Comparison::Gt,
            is_active: true,
        };

        assert_eq!(t.check(70.0), None);
        assert_eq!(t.check(85.0), Some(ThresholdSeverity::Warning));
        assert_eq!(t.check(96.0), Some(ThresholdSeverity::Critical));
    }

    #[test]
    fn test_inactive_threshold_never_matches() {
        let t = Threshold {
            id: None,
            owner_id: 1,
            server_id: None,
            metric: "disk_percent".to_string(),
            warning_value: 1.0,
            critical_value: 2.0,
            comparison: Comparison::Gt,
            is_active: false,
        };

        assert_eq!(t.check(99.0), None);
    }

    #[test]
    fn test_comparison_operators() {
        let mk = |comparison| Threshold {
            id: None,
            owner_id: 1,
            server_id: None,
            metric: "m".to_string(),
            warning_value: 10.0,
            critical_value: 20.0,
            comparison,
            is_active: true,
        };

        assert_eq!(mk(Comparison::Ge).check(10.0), Some(ThresholdSeverity::Warning));
        assert_eq!(mk(Comparison::Gt).check(10.0), None);
        assert_eq!(mk(Comparison::Lt).check(5.0), Some(ThresholdSeverity::Critical));
        assert_eq!(mk(Comparison::Eq).check(20.0), Some(ThresholdSeverity::Critical));
    }

    #[test]
    fn test_status_roundtrip() {
        for s in ["online", "warning", "critical", "offline"] {
            let parsed: ServerStatus = s.parse().unwrap();
            assert_eq!(parsed.to_string(), s);
        }
        assert!("unknown".parse::<ServerStatus>().is_err());
    }
}
