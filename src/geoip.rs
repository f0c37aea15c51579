use crate::config::{self, GeoIpConfig};
use ipnetwork::IpNetwork;
use serde::Deserialize;
use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Ranges that are never worth an external lookup.
const NON_ROUTABLE_NETWORKS: &[&str] = &[
    "0.0.0.0/8",
    "10.0.0.0/8",
    "100.64.0.0/10",
    "127.0.0.0/8",
    "169.254.0.0/16",
    "172.16.0.0/12",
    "192.0.2.0/24",
    "192.168.0.0/16",
    "198.18.0.0/15",
    "::1/128",
    "fc00::/7",
    "fe80::/10",
];

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct GeoInfo {
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub city: Option<String>,
    pub isp: Option<String>,
}

#[derive(Deserialize)]
struct ApiResponse {
    status: Option<String>,
    country: Option<String>,
    #[serde(rename = "countryCode")]
    country_code: Option<String>,
    city: Option<String>,
    isp: Option<String>,
}

struct CacheEntry {
    looked_up_at: Instant,
    result: Option<GeoInfo>,
}

/// Cache-backed lookup client for the ip-api.com contract. Lookups are
/// best-effort: any failure, timeout or non-success answer resolves to
/// None and is cached like a real answer.
pub struct GeoIpClient {
    http: reqwest::Client,
    base_url: String,
    enabled: bool,
    cache_ttl: Duration,
    cache: RwLock<HashMap<String, CacheEntry>>,
}

impl GeoIpClient {
    pub fn new(config: &GeoIpConfig) -> Self {
        let timeout = config::parse_duration(&config.timeout, "geoip.timeout")
            .unwrap_or(Duration::from_secs(2));
        let cache_ttl = config::parse_duration(&config.cache_ttl, "geoip.cache_ttl")
            .unwrap_or(Duration::from_secs(86400));

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            enabled: config.enabled,
            cache_ttl,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub async fn lookup(&self, ip: &str) -> Option<GeoInfo> {
        if !self.enabled || is_non_routable(ip) {
            return None;
        }

        {
            let cache = self.cache.read().await;
            if let Some(entry) = cache.get(ip) {
                if entry.looked_up_at.elapsed() < self.cache_ttl {
                    return entry.result.clone();
                }
            }
        }

        let result = self.fetch(ip).await;

        let mut cache = self.cache.write().await;
        cache.insert(
            ip.to_string(),
            CacheEntry {
                looked_up_at: Instant::now(),
                result: result.clone(),
            },
        );

        result
    }

    /// Sequential batch lookup; the result map has an entry for every input.
    pub async fn lookup_many(&self, ips: &[String]) -> HashMap<String, Option<GeoInfo>> {
        let mut results = HashMap::new();
        for ip in ips {
            results.insert(ip.clone(), self.lookup(ip).await);
        }
        results
    }

    async fn fetch(&self, ip: &str) -> Option<GeoInfo> {
        let url = format!("{}/json/{}", self.base_url, ip);

        let response = match self
            .http
            .get(&url)
            .query(&[("fields", "status,country,countryCode,city,isp")])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                debug!(ip = %ip, error = %e, "Geo lookup failed");
                return None;
            }
        };

        if !response.status().is_success() {
            debug!(ip = %ip, status = %response.status(), "Geo lookup rejected");
            return None;
        }

        let body: ApiResponse = response.json().await.ok()?;
        if body.status.as_deref() != Some("success") {
            return None;
        }

        Some(GeoInfo {
            country: body.country,
            country_code: body.country_code,
            city: body.city,
            isp: body.isp,
        })
    }
}

/// Private, loopback, link-local and otherwise reserved addresses skip the
/// external call; so does anything that is not a parseable IP.
pub fn is_non_routable(ip: &str) -> bool {
    let addr: IpAddr = match ip.parse() {
        Ok(addr) => addr,
        Err(_) => return true,
    };

    NON_ROUTABLE_NETWORKS.iter().any(|net| {
        net.parse::<IpNetwork>()
            .map(|network| network.contains(addr))
            .unwrap_or(false)
    })
}
