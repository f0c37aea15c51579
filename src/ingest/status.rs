use super::derive;
use crate::storage::{MetricRecord, ServerStatus};

const MEMORY_WARNING: f64 = 80.0;
const MEMORY_CRITICAL: f64 = 95.0;
const DISK_WARNING: f64 = 80.0;
const DISK_CRITICAL: f64 = 95.0;
const LOAD_WARNING: f64 = 1.5;

/// Classify one snapshot into online/warning/critical. Pure and
/// memoryless: the same record always yields the same status, and
/// critical conditions dominate warning ones. Absent derived values
/// (e.g. no disks reported) never escalate.
///
/// Offline is not produced here; it is a staleness property resolved by
/// readers from `last_seen_at`.
pub fn classify(metric: &MetricRecord) -> ServerStatus {
    let memory = derive::memory_percent(metric, 2);
    let disk = derive::max_disk_percent(metric, 2);
    let load = derive::normalized_load(metric, 2);

    if reaches(memory, MEMORY_CRITICAL) || reaches(disk, DISK_CRITICAL) {
        return ServerStatus::Critical;
    }

    if reaches(memory, MEMORY_WARNING)
        || reaches(disk, DISK_WARNING)
        || reaches(load, LOAD_WARNING)
        || derive::failed_services_count(metric) > 0
    {
        return ServerStatus::Warning;
    }

    ServerStatus::Online
}

fn reaches(value: Option<f64>, limit: f64) -> bool {
    value.map_or(false, |v| v >= limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn classify_payload(payload: serde_json::Value) -> ServerStatus {
        classify(&MetricRecord::from_payload(1, Utc::now(), &payload))
    }

    #[test]
    fn test_healthy_record_is_online() {
        let status = classify_payload(json!({
            "system": {"load": {"1m": 0.5}, "cpu_cores": 4},
            "memory": {"mem": {"total": 8192, "used": 2048}},
            "disks": [{"mount": "/", "percent": 35.0}],
            "services": [{"name": "nginx", "status": "running"}],
        }));
        assert_eq!(status, ServerStatus::Online);
    }

    #[test]
    fn test_memory_thresholds() {
        let warn = json!({"memory": {"mem": {"total": 8192, "used": 7000}}}); // ~85%
        assert_eq!(classify_payload(warn), ServerStatus::Warning);

        let crit = json!({"memory": {"mem": {"total": 8192, "used": 7900}}}); // ~96%
        assert_eq!(classify_payload(crit), ServerStatus::Critical);
    }

    #[test]
    fn test_disk_thresholds() {
        let warn = json!({"disks": [{"mount": "/", "percent": 85.0}]});
        assert_eq!(classify_payload(warn), ServerStatus::Warning);

        let crit = json!({"disks": [{"mount": "/", "percent": 97.5}]});
        assert_eq!(classify_payload(crit), ServerStatus::Critical);
    }

    #[test]
    fn test_boundary_values_inclusive() {
        let at_warning = json!({"memory": {"mem": {"total": 100, "used": 80}}});
        assert_eq!(classify_payload(at_warning), ServerStatus::Warning);

        let at_critical = json!({"memory": {"mem": {"total": 100, "used": 95}}});
        assert_eq!(classify_payload(at_critical), ServerStatus::Critical);
    }

    #[test]
    fn test_load_escalates_to_warning_only() {
        let status = classify_payload(json!({
            "system": {"load": {"1m": 8.0}, "cpu_cores": 4},
        }));
        assert_eq!(status, ServerStatus::Warning);
    }

    #[test]
    fn test_failed_service_escalates_to_warning() {
        let status = classify_payload(json!({
            "services": [{"name": "mysql", "status": "stopped"}],
        }));
        assert_eq!(status, ServerStatus::Warning);
    }

    #[test]
    fn test_critical_dominates_warning() {
        let status = classify_payload(json!({
            "system": {"load": {"1m": 10.0}, "cpu_cores": 2},
            "memory": {"mem": {"total": 8192, "used": 8000}},
            "disks": [{"mount": "/", "percent": 85.0}],
            "services": [{"name": "mysql", "status": "stopped"}],
        }));
        assert_eq!(status, ServerStatus::Critical);
    }

    #[test]
    fn test_absent_metrics_never_escalate() {
        assert_eq!(classify_payload(json!({})), ServerStatus::Online);

        // Empty disks and zero totals are "cannot classify", not warnings
        let status = classify_payload(json!({
            "memory": {"mem": {"total": 0, "used": 0}},
            "disks": [],
        }));
        assert_eq!(status, ServerStatus::Online);
    }

    #[test]
    fn test_classification_is_pure() {
        let record = MetricRecord::from_payload(
            1,
            Utc::now(),
            &json!({"memory": {"mem": {"total": 8192, "used": 7000}}}),
        );
        assert_eq!(classify(&record), classify(&record));
    }
}
