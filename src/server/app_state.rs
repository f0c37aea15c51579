use crate::config::{self, Config};
use crate::geoip::GeoIpClient;
use crate::ingest::bans::BanTracker;
use crate::storage::Database;
use chrono::Duration;
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub db: Arc<Database>,
    pub geoip: Arc<GeoIpClient>,
    pub ban_tracker: BanTracker,
}

impl AppState {
    pub fn new(config: Config, db: Arc<Database>, geoip: Arc<GeoIpClient>) -> Arc<Self> {
        let ban_tracker = BanTracker::new(
            db.clone(),
            geoip.clone(),
            config.ingest.serialize_ban_writes,
        );

        Arc::new(Self {
            config,
            db,
            geoip,
            ban_tracker,
        })
    }

    /// Staleness window after which a server reads as offline.
    pub fn offline_threshold(&self) -> Duration {
        let std_duration = config::parse_duration(
            &self.config.ingest.offline_threshold,
            "ingest.offline_threshold",
        )
        .unwrap_or(std::time::Duration::from_secs(300));

        Duration::from_std(std_duration).unwrap_or_else(|_| Duration::minutes(5))
    }
}
