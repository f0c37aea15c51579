use super::migrations;
use super::models::*;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn format_ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn json_to_text(value: &Option<Value>) -> Option<String> {
    value.as_ref().map(|v| v.to_string())
}

fn text_to_json(text: Option<String>) -> Option<Value> {
    text.and_then(|t| serde_json::from_str(&t).ok())
}

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn new(path: &str) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;

        // WAL for concurrent readers; foreign keys drive cascade deletes
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA foreign_keys=ON;
             PRAGMA cache_size=-64000;",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn migrate(&self) -> rusqlite::Result<()> {
        let conn = self.conn.lock().unwrap();
        migrations::run_migrations(&conn)
    }

    // =========================================================================
    // Server Operations
    // =========================================================================

    pub fn insert_server(
        &self,
        owner_id: i64,
        name: &str,
        hostname: Option<&str>,
        token_hash: &str,
    ) -> rusqlite::Result<Server> {
        let conn = self.conn.lock().unwrap();
        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO servers (owner_id, name, hostname, token, status, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, 'offline', 1, ?5)",
            params![owner_id, name, hostname, token_hash, format_ts(created_at)],
        )?;

        Ok(Server {
            id: conn.last_insert_rowid(),
            owner_id,
            name: name.to_string(),
            hostname: hostname.map(str::to_string),
            token_hash: token_hash.to_string(),
            status: ServerStatus::Offline,
            last_seen_at: None,
            is_active: true,
            agent_version: None,
            created_at,
        })
    }

    pub fn find_server_by_token_hash(&self, token_hash: &str) -> rusqlite::Result<Option<Server>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, owner_id, name, hostname, token, status, last_seen_at,
                    is_active, agent_version, created_at
             FROM servers WHERE token = ?1",
            params![token_hash],
            Self::map_server_row,
        )
        .optional()
    }

    pub fn get_server(&self, id: i64) -> rusqlite::Result<Option<Server>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, owner_id, name, hostname, token, status, last_seen_at,
                    is_active, agent_version, created_at
             FROM servers WHERE id = ?1",
            params![id],
            Self::map_server_row,
        )
        .optional()
    }

    pub fn get_servers(&self) -> rusqlite::Result<Vec<Server>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, owner_id, name, hostname, token, status, last_seen_at,
                    is_active, agent_version, created_at
             FROM servers ORDER BY name",
        )?;

        let rows = stmt.query_map([], Self::map_server_row)?;
        rows.collect()
    }

    pub fn mark_server_seen(&self, id: i64, now: DateTime<Utc>) -> rusqlite::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE servers SET last_seen_at = ?1 WHERE id = ?2",
            params![format_ts(now), id],
        )?;
        Ok(())
    }

    pub fn update_server_status(&self, id: i64, status: ServerStatus) -> rusqlite::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE servers SET status = ?1 WHERE id = ?2",
            params![status.to_string(), id],
        )?;
        Ok(())
    }

    pub fn update_agent_version(&self, id: i64, version: &str) -> rusqlite::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE servers SET agent_version = ?1 WHERE id = ?2",
            params![version, id],
        )?;
        Ok(())
    }

    #[allow(dead_code)]
    pub fn set_server_active(&self, id: i64, is_active: bool) -> rusqlite::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE servers SET is_active = ?1 WHERE id = ?2",
            params![is_active, id],
        )?;
        Ok(())
    }

    pub fn update_server_token(&self, id: i64, token_hash: &str) -> rusqlite::Result<bool> {
        let conn = self.conn.lock().unwrap();
        let affected = conn.execute(
            "UPDATE servers SET token = ?1 WHERE id = ?2",
            params![token_hash, id],
        )?;
        Ok(affected > 0)
    }

    /// Cascades to metrics, ban events and server-scoped thresholds.
    #[allow(dead_code)]
    pub fn delete_server(&self, id: i64) -> rusqlite::Result<bool> {
        let conn = self.conn.lock().unwrap();
        let affected = conn.execute("DELETE FROM servers WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    fn map_server_row(row: &rusqlite::Row) -> rusqlite::Result<Server> {
        Ok(Server {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            name: row.get(2)?,
            hostname: row.get(3)?,
            token_hash: row.get(4)?,
            status: row
                .get::<_, String>(5)?
                .parse()
                .unwrap_or(ServerStatus::Offline),
            last_seen_at: row.get::<_, Option<String>>(6)?.map(|s| parse_ts(&s)),
            is_active: row.get(7)?,
            agent_version: row.get(8)?,
            created_at: parse_ts(&row.get::<_, String>(9)?),
        })
    }

    // =========================================================================
    // Metric Operations
    // =========================================================================

    pub fn insert_metric(&self, metric: &MetricRecord) -> rusqlite::Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO metrics (
                server_id, recorded_at, uptime, load_1m, load_5m, load_15m,
                cpu_cores, memory_total, memory_used, memory_available,
                swap_total, swap_used, disks, services, network, security
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                metric.server_id,
                format_ts(metric.recorded_at),
                metric.uptime,
                metric.load_1m,
                metric.load_5m,
                metric.load_15m,
                metric.cpu_cores,
                metric.memory_total,
                metric.memory_used,
                metric.memory_available,
                metric.swap_total,
                metric.swap_used,
                json_to_text(&metric.disks),
                json_to_text(&metric.services),
                json_to_text(&metric.network),
                json_to_text(&metric.security),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Last `limit` records for a server, oldest first. Ties on
    /// `recorded_at` fall back to insertion id.
    pub fn recent_metrics(&self, server_id: i64, limit: u32) -> rusqlite::Result<Vec<MetricRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, server_id, recorded_at, uptime, load_1m, load_5m, load_15m,
                    cpu_cores, memory_total, memory_used, memory_available,
                    swap_total, swap_used, disks, services, network, security
             FROM metrics WHERE server_id = ?1
             ORDER BY recorded_at DESC, id DESC LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![server_id, limit], Self::map_metric_row)?;
        let mut metrics: Vec<MetricRecord> = rows.collect::<rusqlite::Result<_>>()?;
        metrics.reverse();
        Ok(metrics)
    }

    pub fn latest_metric(&self, server_id: i64) -> rusqlite::Result<Option<MetricRecord>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, server_id, recorded_at, uptime, load_1m, load_5m, load_15m,
                    cpu_cores, memory_total, memory_used, memory_available,
                    swap_total, swap_used, disks, services, network, security
             FROM metrics WHERE server_id = ?1
             ORDER BY recorded_at DESC, id DESC LIMIT 1",
            params![server_id],
            Self::map_metric_row,
        )
        .optional()
    }

    fn map_metric_row(row: &rusqlite::Row) -> rusqlite::Result<MetricRecord> {
        Ok(MetricRecord {
            id: Some(row.get(0)?),
            server_id: row.get(1)?,
            recorded_at: parse_ts(&row.get::<_, String>(2)?),
            uptime: row.get(3)?,
            load_1m: row.get(4)?,
            load_5m: row.get(5)?,
            load_15m: row.get(6)?,
            cpu_cores: row.get(7)?,
            memory_total: row.get(8)?,
            memory_used: row.get(9)?,
            memory_available: row.get(10)?,
            swap_total: row.get(11)?,
            swap_used: row.get(12)?,
            disks: text_to_json(row.get(13)?),
            services: text_to_json(row.get(14)?),
            network: text_to_json(row.get(15)?),
            security: text_to_json(row.get(16)?),
        })
    }

    // =========================================================================
    // Ban Event Operations
    // =========================================================================

    pub fn insert_ban_event(&self, event: &BannedIpEvent) -> rusqlite::Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO banned_ip_events (
                server_id, ip_address, event_type, jail,
                country_code, country, city, isp, event_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                event.server_id,
                event.ip_address,
                event.event_type.to_string(),
                event.jail,
                event.country_code,
                event.country,
                event.city,
                event.isp,
                format_ts(event.event_at),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// IPs whose latest recorded event for this server is a ban. The log is
    /// append-only, so insertion id orders events within equal timestamps.
    pub fn currently_banned_ips(&self, server_id: i64) -> rusqlite::Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT e.ip_address
             FROM banned_ip_events e
             JOIN (
                 SELECT ip_address, MAX(id) AS last_id
                 FROM banned_ip_events
                 WHERE server_id = ?1
                 GROUP BY ip_address
             ) last ON e.id = last.last_id
             WHERE e.event_type = 'ban'
             ORDER BY e.ip_address",
        )?;

        let rows = stmt.query_map(params![server_id], |row| row.get(0))?;
        rows.collect()
    }

    pub fn latest_ban_event(
        &self,
        server_id: i64,
        ip: &str,
    ) -> rusqlite::Result<Option<BannedIpEvent>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, server_id, ip_address, event_type, jail,
                    country_code, country, city, isp, event_at
             FROM banned_ip_events
             WHERE server_id = ?1 AND ip_address = ?2 AND event_type = 'ban'
             ORDER BY event_at DESC, id DESC LIMIT 1",
            params![server_id, ip],
            Self::map_ban_event_row,
        )
        .optional()
    }

    #[allow(dead_code)]
    pub fn ban_count(&self, server_id: i64, ip: &str) -> rusqlite::Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT COUNT(*) FROM banned_ip_events
             WHERE server_id = ?1 AND ip_address = ?2 AND event_type = 'ban'",
            params![server_id, ip],
            |row| row.get(0),
        )
    }

    pub fn ban_counts(
        &self,
        server_id: i64,
        ips: &[String],
    ) -> rusqlite::Result<HashMap<String, i64>> {
        if ips.is_empty() {
            return Ok(HashMap::new());
        }

        let conn = self.conn.lock().unwrap();
        let placeholders = vec!["?"; ips.len()].join(", ");
        let sql = format!(
            "SELECT ip_address, COUNT(*) FROM banned_ip_events
             WHERE server_id = ? AND event_type = 'ban' AND ip_address IN ({})
             GROUP BY ip_address",
            placeholders
        );

        let mut stmt = conn.prepare(&sql)?;
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(server_id)];
        for ip in ips {
            params_vec.push(Box::new(ip.clone()));
        }
        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();

        let rows = stmt.query_map(params_refs.as_slice(), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        rows.collect()
    }

    pub fn recent_ban_events(
        &self,
        server_id: i64,
        limit: u32,
    ) -> rusqlite::Result<Vec<BannedIpEvent>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, server_id, ip_address, event_type, jail,
                    country_code, country, city, isp, event_at
             FROM banned_ip_events WHERE server_id = ?1
             ORDER BY event_at DESC, id DESC LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![server_id, limit], Self::map_ban_event_row)?;
        rows.collect()
    }

    fn map_ban_event_row(row: &rusqlite::Row) -> rusqlite::Result<BannedIpEvent> {
        Ok(BannedIpEvent {
            id: Some(row.get(0)?),
            server_id: row.get(1)?,
            ip_address: row.get(2)?,
            event_type: row
                .get::<_, String>(3)?
                .parse()
                .unwrap_or(BanEventType::Ban),
            jail: row
                .get::<_, Option<String>>(4)?
                .unwrap_or_else(|| DEFAULT_JAIL.to_string()),
            country_code: row.get(5)?,
            country: row.get(6)?,
            city: row.get(7)?,
            isp: row.get(8)?,
            event_at: parse_ts(&row.get::<_, String>(9)?),
        })
    }

    // =========================================================================
    // Threshold Operations
    // =========================================================================

    pub fn insert_threshold(&self, threshold: &Threshold) -> rusqlite::Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO thresholds (
                owner_id, server_id, metric, warning_value, critical_value,
                comparison, is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                threshold.owner_id,
                threshold.server_id,
                threshold.metric,
                threshold.warning_value,
                threshold.critical_value,
                threshold.comparison.to_string(),
                threshold.is_active,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Server-specific active threshold wins over the owner's global default.
    #[allow(dead_code)]
    pub fn threshold_for(
        &self,
        owner_id: i64,
        server_id: i64,
        metric: &str,
    ) -> rusqlite::Result<Option<Threshold>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, owner_id, server_id, metric, warning_value, critical_value,
                    comparison, is_active
             FROM thresholds
             WHERE owner_id = ?1 AND metric = ?2 AND is_active = 1
               AND (server_id = ?3 OR server_id IS NULL)
             ORDER BY server_id IS NULL LIMIT 1",
            params![owner_id, metric, server_id],
            Self::map_threshold_row,
        )
        .optional()
    }

    pub fn has_thresholds(&self, owner_id: i64) -> rusqlite::Result<bool> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM thresholds WHERE owner_id = ?1",
            params![owner_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn seed_default_thresholds(&self, owner_id: i64) -> rusqlite::Result<()> {
        for (metric, warning, critical, comparison) in DEFAULT_THRESHOLDS {
            self.insert_threshold(&Threshold {
                id: None,
                owner_id,
                server_id: None,
                metric: metric.to_string(),
                warning_value: *warning,
                critical_value: *critical,
                comparison: *comparison,
                is_active: true,
            })?;
        }
        Ok(())
    }

    fn map_threshold_row(row: &rusqlite::Row) -> rusqlite::Result<Threshold> {
        Ok(Threshold {
            id: Some(row.get(0)?),
            owner_id: row.get(1)?,
            server_id: row.get(2)?,
            metric: row.get(3)?,
            warning_value: row.get(4)?,
            critical_value: row.get(5)?,
            comparison: row
                .get::<_, String>(6)?
                .parse()
                .unwrap_or(Comparison::Gt),
            is_active: row.get(7)?,
        })
    }

    // =========================================================================
    // Retention Operations
    // =========================================================================

    pub fn prune_metrics(&self, days: u32) -> rusqlite::Result<usize> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM metrics WHERE recorded_at < datetime('now', ?1)",
            params![format!("-{} days", days)],
        )
    }

    pub fn prune_ban_events(&self, days: u32) -> rusqlite::Result<usize> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM banned_ip_events WHERE event_at < datetime('now', ?1)",
            params![format!("-{} days", days)],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_db() -> Database {
        let db = Database::new(":memory:").unwrap();
        db.migrate().unwrap();
        db
    }

    fn add_server(db: &Database, name: &str) -> Server {
        db.insert_server(1, name, None, &format!("hash-{}", name))
            .unwrap()
    }

    #[test]
    fn test_server_roundtrip_by_token_hash() {
        let db = test_db();
        let created = db
            .insert_server(1, "web-1", Some("web.example.com"), "abc123")
            .unwrap();

        let found = db.find_server_by_token_hash("abc123").unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.name, "web-1");
        assert_eq!(found.hostname.as_deref(), Some("web.example.com"));
        assert_eq!(found.status, ServerStatus::Offline);
        assert!(found.is_active);
        assert!(found.last_seen_at.is_none());

        assert!(db.find_server_by_token_hash("nope").unwrap().is_none());
    }

    #[test]
    fn test_mark_seen_and_status_update() {
        let db = test_db();
        let server = add_server(&db, "web-1");

        let now = Utc::now();
        db.mark_server_seen(server.id, now).unwrap();
        db.update_server_status(server.id, ServerStatus::Warning).unwrap();
        db.update_agent_version(server.id, "0.2.0").unwrap();

        let fresh = db.get_server(server.id).unwrap().unwrap();
        assert!(fresh.last_seen_at.is_some());
        assert_eq!(fresh.status, ServerStatus::Warning);
        assert_eq!(fresh.agent_version.as_deref(), Some("0.2.0"));
    }

    #[test]
    fn test_metric_roundtrip_preserves_documents() {
        let db = test_db();
        let server = add_server(&db, "web-1");

        let payload = json!({
            "system": {"load": {"1m": 0.5}},
            "disks": [{"mount": "/", "percent": 42.0}],
            "services": {"nginx": "running"},
            "security": {"banned_ips": ["1.2.3.4"]},
        });
        let metric = MetricRecord::from_payload(server.id, Utc::now(), &payload);
        let id = db.insert_metric(&metric).unwrap();
        assert!(id > 0);

        let stored = db.latest_metric(server.id).unwrap().unwrap();
        assert_eq!(stored.load_1m, Some(0.5));
        assert_eq!(stored.disk_entries()[0].percent, Some(42.0));
        assert_eq!(stored.banned_ips(), vec!["1.2.3.4"]);
        assert_eq!(stored.service_statuses().len(), 1);
    }

    #[test]
    fn test_recent_metrics_ordered_oldest_first() {
        let db = test_db();
        let server = add_server(&db, "web-1");
        let base = Utc::now();

        for i in 0..5 {
            let m = MetricRecord::from_payload(
                server.id,
                base + chrono::Duration::seconds(i * 300),
                &json!({"system": {"uptime": i}}),
            );
            db.insert_metric(&m).unwrap();
        }

        let window = db.recent_metrics(server.id, 3).unwrap();
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].uptime, Some(2));
        assert_eq!(window[2].uptime, Some(4));
    }

    #[test]
    fn test_currently_banned_follows_latest_event() {
        let db = test_db();
        let server = add_server(&db, "web-1");
        let now = Utc::now();

        let mut event = BannedIpEvent {
            id: None,
            server_id: server.id,
            ip_address: "1.2.3.4".to_string(),
            event_type: BanEventType::Ban,
            jail: DEFAULT_JAIL.to_string(),
            country_code: None,
            country: None,
            city: None,
            isp: None,
            event_at: now,
        };
        db.insert_ban_event(&event).unwrap();
        assert_eq!(db.currently_banned_ips(server.id).unwrap(), vec!["1.2.3.4"]);

        event.event_type = BanEventType::Unban;
        event.event_at = now + chrono::Duration::minutes(5);
        db.insert_ban_event(&event).unwrap();
        assert!(db.currently_banned_ips(server.id).unwrap().is_empty());

        event.event_type = BanEventType::Ban;
        event.event_at = now + chrono::Duration::minutes(10);
        db.insert_ban_event(&event).unwrap();
        assert_eq!(db.currently_banned_ips(server.id).unwrap(), vec!["1.2.3.4"]);
        assert_eq!(db.ban_count(server.id, "1.2.3.4").unwrap(), 2);
    }

    #[test]
    fn test_ban_counts_groups_by_ip() {
        let db = test_db();
        let server = add_server(&db, "web-1");
        let now = Utc::now();

        for (ip, count) in [("1.2.3.4", 2), ("5.6.7.8", 1)] {
            for i in 0..count {
                db.insert_ban_event(&BannedIpEvent {
                    id: None,
                    server_id: server.id,
                    ip_address: ip.to_string(),
                    event_type: BanEventType::Ban,
                    jail: DEFAULT_JAIL.to_string(),
                    country_code: None,
                    country: None,
                    city: None,
                    isp: None,
                    event_at: now + chrono::Duration::minutes(i),
                })
                .unwrap();
            }
        }

        let counts = db
            .ban_counts(server.id, &["1.2.3.4".to_string(), "5.6.7.8".to_string()])
            .unwrap();
        assert_eq!(counts["1.2.3.4"], 2);
        assert_eq!(counts["5.6.7.8"], 1);

        assert!(db.ban_counts(server.id, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_delete_server_cascades() {
        let db = test_db();
        let server = add_server(&db, "web-1");

        let metric = MetricRecord::from_payload(server.id, Utc::now(), &json!({}));
        db.insert_metric(&metric).unwrap();
        db.insert_ban_event(&BannedIpEvent {
            id: None,
            server_id: server.id,
            ip_address: "1.2.3.4".to_string(),
            event_type: BanEventType::Ban,
            jail: DEFAULT_JAIL.to_string(),
            country_code: None,
            country: None,
            city: None,
            isp: None,
            event_at: Utc::now(),
        })
        .unwrap();

        assert!(db.delete_server(server.id).unwrap());
        assert!(db.latest_metric(server.id).unwrap().is_none());
        assert!(db.recent_ban_events(server.id, 10).unwrap().is_empty());
        assert!(!db.delete_server(server.id).unwrap());
    }

    #[test]
    fn test_threshold_resolution_precedence() {
        let db = test_db();
        let server = add_server(&db, "web-1");
        db.seed_default_thresholds(1).unwrap();

        // Global default applies first
        let global = db.threshold_for(1, server.id, "memory_percent").unwrap().unwrap();
        assert!(global.server_id.is_none());
        assert_eq!(global.warning_value, 80.0);

        // Server-specific override wins
        db.insert_threshold(&Threshold {
            id: None,
            owner_id: 1,
            server_id: Some(server.id),
            metric: "memory_percent".to_string(),
            warning_value: 60.0,
            critical_value: 85.0,
            comparison: Comparison::Gt,
            is_active: true,
        })
        .unwrap();

        let specific = db.threshold_for(1, server.id, "memory_percent").unwrap().unwrap();
        assert_eq!(specific.server_id, Some(server.id));
        assert_eq!(specific.warning_value, 60.0);

        assert!(db.threshold_for(1, server.id, "no_such_metric").unwrap().is_none());
    }
}
