//! Ban/unban tracking over the append-only `banned_ip_events` log.
//!
//! Each ingestion reports the full set of currently banned IPs; this
//! module diffs that set against the state derived from event history and
//! appends only the transitions. Stable IPs produce no rows, which keeps
//! repeated five-minute polls idempotent.

use crate::error::Result;
use crate::geoip::{GeoInfo, GeoIpClient};
use crate::storage::{BanEventType, BannedIpEvent, Database, MetricRecord, DEFAULT_JAIL};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Per-server async locks. Opt-in: without them, concurrent ingestions
/// for one server may race the diff+append sequence and record duplicate
/// events (at-least-once semantics, harmless for retries).
#[derive(Default)]
struct ServerLocks {
    inner: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl ServerLocks {
    async fn for_server(&self, server_id: i64) -> Arc<Mutex<()>> {
        let mut locks = self.inner.lock().await;
        locks.entry(server_id).or_default().clone()
    }
}

pub struct BanTracker {
    db: Arc<Database>,
    geoip: Arc<GeoIpClient>,
    locks: Option<ServerLocks>,
}

impl BanTracker {
    pub fn new(db: Arc<Database>, geoip: Arc<GeoIpClient>, serialize_writes: bool) -> Self {
        Self {
            db,
            geoip,
            locks: serialize_writes.then(ServerLocks::default),
        }
    }

    /// Diff the reported banned set against event history and append
    /// ban/unban transitions. Geo lookups are best-effort; a failed
    /// lookup records the event with null geo fields.
    pub async fn process(
        &self,
        server_id: i64,
        metric: &MetricRecord,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let current: HashSet<String> = metric.banned_ips().into_iter().collect();

        let _guard = match &self.locks {
            Some(locks) => {
                let lock = locks.for_server(server_id).await;
                Some(lock.lock_owned().await)
            }
            None => None,
        };

        let previously_banned: HashSet<String> = self
            .db
            .currently_banned_ips(server_id)?
            .into_iter()
            .collect();

        if current.is_empty() && previously_banned.is_empty() {
            return Ok(());
        }

        let mut new_bans: Vec<String> = current.difference(&previously_banned).cloned().collect();
        let mut unbanned: Vec<String> = previously_banned.difference(&current).cloned().collect();
        new_bans.sort();
        unbanned.sort();

        if !new_bans.is_empty() {
            self.record_bans(server_id, &new_bans, now).await?;
        }

        if !unbanned.is_empty() {
            self.record_unbans(server_id, &unbanned, now)?;
        }

        Ok(())
    }

    async fn record_bans(&self, server_id: i64, ips: &[String], now: DateTime<Utc>) -> Result<()> {
        let geo_data = self.geoip.lookup_many(ips).await;

        for ip in ips {
            let geo = geo_data.get(ip).cloned().flatten();

            self.db.insert_ban_event(&BannedIpEvent {
                id: None,
                server_id,
                ip_address: ip.clone(),
                event_type: BanEventType::Ban,
                jail: DEFAULT_JAIL.to_string(),
                country_code: geo.as_ref().and_then(|g| g.country_code.clone()),
                country: geo.as_ref().and_then(|g| g.country.clone()),
                city: geo.as_ref().and_then(|g| g.city.clone()),
                isp: geo.as_ref().and_then(|g| g.isp.clone()),
                event_at: now,
            })?;

            info!(server_id, ip = %ip, "Recorded ban event");
        }

        Ok(())
    }

    /// Unban events reuse the geo snapshot of the matching ban; the
    /// location that mattered is where the attacker was when banned.
    fn record_unbans(&self, server_id: i64, ips: &[String], now: DateTime<Utc>) -> Result<()> {
        for ip in ips {
            let last_ban = self.db.latest_ban_event(server_id, ip)?;

            let (jail, geo) = match last_ban {
                Some(event) => (
                    event.jail.clone(),
                    Some(GeoInfo {
                        country: event.country,
                        country_code: event.country_code,
                        city: event.city,
                        isp: event.isp,
                    }),
                ),
                None => (DEFAULT_JAIL.to_string(), None),
            };

            self.db.insert_ban_event(&BannedIpEvent {
                id: None,
                server_id,
                ip_address: ip.clone(),
                event_type: BanEventType::Unban,
                jail,
                country_code: geo.as_ref().and_then(|g| g.country_code.clone()),
                country: geo.as_ref().and_then(|g| g.country.clone()),
                city: geo.as_ref().and_then(|g| g.city.clone()),
                isp: geo.as_ref().and_then(|g| g.isp.clone()),
                event_at: now,
            })?;

            info!(server_id, ip = %ip, "Recorded unban event");
        }

        Ok(())
    }
}
