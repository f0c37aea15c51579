//! Time-aligned presentation series over an ordered window of metric
//! records. Every series has exactly one point per input record; points
//! that cannot be derived render as neutral zeros rather than holes, and
//! delta-based series always start at 0.

use super::derive;
use crate::storage::MetricRecord;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct CpuPoint {
    pub time: String,
    /// Normalized load as a percentage of total core capacity
    pub value: f64,
    pub load: f64,
    pub cores: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemoryPoint {
    pub time: String,
    pub value: f64,
    pub used: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiskPoint {
    pub time: String,
    pub value: f64,
    pub mount: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkPoint {
    pub time: String,
    pub rx: i64,
    pub tx: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SecurityPoint {
    pub time: String,
    pub timestamp: String,
    /// New failed SSH attempts in this interval
    pub attacks: i64,
    pub total_24h: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartBundle {
    pub cpu: Vec<CpuPoint>,
    pub memory: Vec<MemoryPoint>,
    pub disk: Vec<DiskPoint>,
    pub network: Vec<NetworkPoint>,
    pub security: Vec<SecurityPoint>,
}

fn time_label(metric: &MetricRecord) -> String {
    format!("{} UTC", metric.recorded_at.format("%H:%M"))
}

pub fn build(records: &[MetricRecord]) -> ChartBundle {
    ChartBundle {
        cpu: cpu_series(records),
        memory: memory_series(records),
        disk: disk_series(records),
        network: network_series(records),
        security: security_series(records),
    }
}

pub fn cpu_series(records: &[MetricRecord]) -> Vec<CpuPoint> {
    records
        .iter()
        .map(|metric| {
            let cores = metric.cpu_cores.unwrap_or(1);
            let load = metric.load_1m.unwrap_or(0.0);
            let value = if cores > 0 {
                derive::round_to(load / cores as f64 * 100.0, 1)
            } else {
                0.0
            };

            CpuPoint {
                time: time_label(metric),
                value,
                load,
                cores,
            }
        })
        .collect()
}

pub fn memory_series(records: &[MetricRecord]) -> Vec<MemoryPoint> {
    records
        .iter()
        .map(|metric| {
            let total = metric.memory_total.unwrap_or(0);
            let used = metric.memory_used.unwrap_or(0);
            let value = if total > 0 {
                derive::round_to(used as f64 / total as f64 * 100.0, 1)
            } else {
                0.0
            };

            MemoryPoint {
                time: time_label(metric),
                value,
                used,
                total,
            }
        })
        .collect()
}

pub fn disk_series(records: &[MetricRecord]) -> Vec<DiskPoint> {
    records
        .iter()
        .map(|metric| {
            let (mount, percent) =
                derive::max_disk(metric).unwrap_or_else(|| ("/".to_string(), 0.0));

            DiskPoint {
                time: time_label(metric),
                value: derive::round_to(percent, 1),
                mount,
            }
        })
        .collect()
}

/// Bytes transferred on the primary interface per interval. A point is
/// zeroed when either counter went backwards (reboot) or the elapsed gap
/// is not positive (duplicate or out-of-order timestamps).
pub fn network_series(records: &[MetricRecord]) -> Vec<NetworkPoint> {
    let mut points = Vec::with_capacity(records.len());
    let mut prev: Option<&MetricRecord> = None;

    for metric in records {
        let mut rx = 0;
        let mut tx = 0;

        if let (Some(prev_metric), Some(iface)) = (prev, metric.primary_interface()) {
            if let Some(prev_iface) = prev_metric.primary_interface() {
                if derive::elapsed_seconds(metric, prev_metric) > 0 {
                    let rx_delta =
                        iface.rx_bytes.unwrap_or(0) - prev_iface.rx_bytes.unwrap_or(0);
                    let tx_delta =
                        iface.tx_bytes.unwrap_or(0) - prev_iface.tx_bytes.unwrap_or(0);
                    if rx_delta >= 0 && tx_delta >= 0 {
                        rx = rx_delta;
                        tx = tx_delta;
                    }
                }
            }
        }

        points.push(NetworkPoint {
            time: time_label(metric),
            rx,
            tx,
        });

        prev = Some(metric);
    }

    points
}

/// New SSH failures per interval, derived from the 24h rolling counter.
pub fn security_series(records: &[MetricRecord]) -> Vec<SecurityPoint> {
    let mut points = Vec::with_capacity(records.len());
    let mut prev_failed: Option<i64> = None;

    for metric in records {
        let failed = metric.security_counter("ssh_failed_24h").unwrap_or(0);

        points.push(SecurityPoint {
            time: time_label(metric),
            timestamp: metric.recorded_at.to_rfc3339(),
            attacks: derive::counter_delta(failed, prev_failed),
            total_24h: failed,
        });

        prev_failed = Some(failed);
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    fn window(payloads: Vec<serde_json::Value>) -> Vec<MetricRecord> {
        let base = Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap();
        payloads
            .into_iter()
            .enumerate()
            .map(|(i, payload)| {
                MetricRecord::from_payload(
                    1,
                    base + Duration::seconds(i as i64 * 300),
                    &payload,
                )
            })
            .collect()
    }

    #[test]
    fn test_every_series_matches_window_length() {
        let records = window(vec![json!({}), json!({}), json!({})]);
        let bundle = build(&records);

        assert_eq!(bundle.cpu.len(), 3);
        assert_eq!(bundle.memory.len(), 3);
        assert_eq!(bundle.disk.len(), 3);
        assert_eq!(bundle.network.len(), 3);
        assert_eq!(bundle.security.len(), 3);
    }

    #[test]
    fn test_time_labels() {
        let records = window(vec![json!({}), json!({})]);
        let series = cpu_series(&records);
        assert_eq!(series[0].time, "12:00 UTC");
        assert_eq!(series[1].time, "12:05 UTC");
    }

    #[test]
    fn test_network_deltas_and_reset() {
        let records = window(vec![
            json!({"network": [{"interface": "eth0", "rx_bytes": 1_000_000, "tx_bytes": 500}]}),
            json!({"network": [{"interface": "eth0", "rx_bytes": 1_500_000, "tx_bytes": 700}]}),
            // counter reset after reboot
            json!({"network": [{"interface": "eth0", "rx_bytes": 100_000, "tx_bytes": 50}]}),
        ]);

        let series = network_series(&records);
        assert_eq!(series[0].rx, 0); // first point: neutral baseline
        assert_eq!(series[1].rx, 500_000);
        assert_eq!(series[1].tx, 200);
        assert_eq!(series[2].rx, 0);
        assert_eq!(series[2].tx, 0);
    }

    #[test]
    fn test_network_zero_elapsed_yields_zero() {
        let base = Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap();
        let records: Vec<MetricRecord> = (0..2)
            .map(|i| {
                MetricRecord::from_payload(
                    1,
                    base, // identical timestamps
                    &json!({"network": [{"interface": "eth0", "rx_bytes": 1000 * (i + 1), "tx_bytes": 0}]}),
                )
            })
            .collect();

        let series = network_series(&records);
        assert_eq!(series[1].rx, 0);
    }

    #[test]
    fn test_network_one_negative_counter_zeroes_both() {
        let records = window(vec![
            json!({"network": [{"interface": "eth0", "rx_bytes": 1000, "tx_bytes": 1000}]}),
            json!({"network": [{"interface": "eth0", "rx_bytes": 2000, "tx_bytes": 400}]}),
        ]);

        let series = network_series(&records);
        assert_eq!(series[1].rx, 0);
        assert_eq!(series[1].tx, 0);
    }

    #[test]
    fn test_security_attack_deltas() {
        let records = window(vec![
            json!({"security": {"ssh_failed_24h": 100}}),
            json!({"security": {"ssh_failed_24h": 117}}),
            json!({"security": {"ssh_failed_24h": 40}}), // counter rolled back
        ]);

        let series = security_series(&records);
        assert_eq!(series[0].attacks, 0);
        assert_eq!(series[0].total_24h, 100);
        assert_eq!(series[1].attacks, 17);
        assert_eq!(series[2].attacks, 0);
        assert_eq!(series[2].total_24h, 40);
    }

    #[test]
    fn test_gauge_series_values() {
        let records = window(vec![json!({
            "system": {"load": {"1m": 2.0}, "cpu_cores": 4},
            "memory": {"mem": {"total": 8192, "used": 4096}},
            "disks": [{"mount": "/", "percent": 40.0}, {"mount": "/data", "percent": 91.3}],
        })]);

        let bundle = build(&records);
        assert_eq!(bundle.cpu[0].value, 50.0);
        assert_eq!(bundle.cpu[0].cores, 4);
        assert_eq!(bundle.memory[0].value, 50.0);
        assert_eq!(bundle.memory[0].used, 4096);
        assert_eq!(bundle.disk[0].value, 91.3);
        assert_eq!(bundle.disk[0].mount, "/data");
    }

    #[test]
    fn test_gauge_series_tolerate_missing_fields() {
        let records = window(vec![json!({})]);
        let bundle = build(&records);

        assert_eq!(bundle.cpu[0].value, 0.0);
        assert_eq!(bundle.cpu[0].cores, 1);
        assert_eq!(bundle.memory[0].value, 0.0);
        assert_eq!(bundle.disk[0].mount, "/");
    }

    #[test]
    fn test_empty_window() {
        let bundle = build(&[]);
        assert!(bundle.cpu.is_empty());
        assert!(bundle.network.is_empty());
    }
}
