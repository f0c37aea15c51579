use super::repository::Database;
use std::sync::Arc;
use tracing::{error, info};

/// Delete metrics and ban events older than the given cutoffs.
pub fn run_prune(db: &Database, metric_days: u32, ban_days: u32) -> rusqlite::Result<(usize, usize)> {
    let metrics_deleted = db.prune_metrics(metric_days)?;
    let bans_deleted = db.prune_ban_events(ban_days)?;

    info!(
        metrics = metrics_deleted,
        ban_events = bans_deleted,
        "Retention cleanup completed"
    );

    Ok((metrics_deleted, bans_deleted))
}

/// Parse retention duration string like "90d", "1y" to days
pub fn parse_retention_days(duration: &str) -> u32 {
    let duration = duration.trim().to_lowercase();

    if duration.ends_with('d') {
        duration[..duration.len() - 1].parse().unwrap_or(365)
    } else if duration.ends_with('w') {
        duration[..duration.len() - 1].parse::<u32>().unwrap_or(1) * 7
    } else if duration.ends_with('m') {
        duration[..duration.len() - 1].parse::<u32>().unwrap_or(1) * 30
    } else if duration.ends_with('y') {
        duration[..duration.len() - 1].parse::<u32>().unwrap_or(1) * 365
    } else {
        duration.parse().unwrap_or(365)
    }
}

/// Background task for periodic retention cleanup. Safe to run alongside
/// ingestion: only rows older than the cutoff are touched.
pub async fn retention_task(
    db: Arc<Database>,
    interval_secs: u64,
    metric_days: u32,
    ban_days: u32,
) {
    let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        if let Err(e) = run_prune(&db, metric_days, ban_days) {
            error!("Retention cleanup failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_retention() {
        assert_eq!(parse_retention_days("90d"), 90);
        assert_eq!(parse_retention_days("2w"), 14);
        assert_eq!(parse_retention_days("6m"), 180);
        assert_eq!(parse_retention_days("1y"), 365);
        assert_eq!(parse_retention_days("30"), 30);
        assert_eq!(parse_retention_days("junk"), 365);
    }

    #[test]
    fn test_prune_keeps_recent_rows() {
        use crate::storage::models::MetricRecord;
        use chrono::Utc;

        let db = Database::new(":memory:").unwrap();
        db.migrate().unwrap();
        let server = db.insert_server(1, "web-1", None, "hash").unwrap();

        let metric =
            MetricRecord::from_payload(server.id, Utc::now(), &serde_json::json!({}));
        db.insert_metric(&metric).unwrap();

        let (metrics_deleted, bans_deleted) = run_prune(&db, 365, 90).unwrap();
        assert_eq!(metrics_deleted, 0);
        assert_eq!(bans_deleted, 0);
        assert!(db.latest_metric(server.id).unwrap().is_some());
    }
}
