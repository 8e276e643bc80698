//! Rate-limited, cached client for the address search service.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Url;
use tokio::time::Instant;

use crate::core::config::MapConfig;
use crate::geocode::place::{PlaceCandidate, PlaceResult};
use crate::{MapError, Result};

static SHARED_CLIENT: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

/// Transport seam for the geocoding HTTP call.
#[async_trait]
pub trait GeocodeTransport: Send + Sync {
    async fn get(
        &self,
        url: Url,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Vec<PlaceResult>>;
}

/// Production transport on the shared HTTP client.
#[derive(Debug, Default)]
pub struct HttpTransport;

#[async_trait]
impl GeocodeTransport for HttpTransport {
    async fn get(
        &self,
        url: Url,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Vec<PlaceResult>> {
        let response = SHARED_CLIENT
            .get(url)
            .header(reqwest::header::USER_AGENT, user_agent)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MapError::GeocodeStatus(status.as_u16()));
        }

        Ok(response.json().await?)
    }
}

/// Serializes outgoing requests so consecutive ones are spaced by at least
/// the configured interval. The lock is held across the wait, so
/// concurrent callers queue behind the delay instead of parallelizing;
/// the service's policy is per-client, not per-query.
struct RateLimiter {
    min_interval: Duration,
    last_request: tokio::sync::Mutex<Option<Instant>>,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: tokio::sync::Mutex::new(None),
        }
    }

    async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            tokio::time::sleep_until(previous + self.min_interval).await;
        }
        *last = Some(Instant::now());
    }
}

struct CacheEntry {
    results: Vec<PlaceResult>,
    fetched_at: Instant,
}

/// Bounded result cache with oldest-first eviction by insertion order.
/// Re-inserting an existing key refreshes the value but keeps the key's
/// original position in the eviction queue.
struct ResultCache {
    capacity: usize,
    ttl: Duration,
    inner: Mutex<CacheInner>,
}

#[derive(Default)]
struct CacheInner {
    order: VecDeque<String>,
    entries: HashMap<String, CacheEntry>,
}

impl ResultCache {
    fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity,
            ttl,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    fn get(&self, key: &str) -> Option<Vec<PlaceResult>> {
        let inner = match self.inner.lock() {
            Ok(inner) => inner,
            Err(poisoned) => poisoned.into_inner(),
        };
        let entry = inner.entries.get(key)?;
        if entry.fetched_at.elapsed() < self.ttl {
            Some(entry.results.clone())
        } else {
            None
        }
    }

    fn insert(&self, key: String, results: Vec<PlaceResult>) {
        let mut inner = match self.inner.lock() {
            Ok(inner) => inner,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !inner.entries.contains_key(&key) {
            inner.order.push_back(key.clone());
        }
        inner.entries.insert(
            key,
            CacheEntry {
                results,
                fetched_at: Instant::now(),
            },
        );
        while inner.entries.len() > self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }
}

/// Converts free-text address queries into ranked place candidates.
///
/// `search` never fails to the caller: any transport, status or decode
/// problem resolves to an empty candidate list and a log line, so the UI
/// degrades to "no suggestions" instead of crashing.
pub struct GeocodingClient<T = HttpTransport> {
    transport: T,
    endpoint: String,
    user_agent: String,
    home_country: String,
    request_timeout: Duration,
    limiter: RateLimiter,
    cache: ResultCache,
    // A superseded query's late response must not be cached or shown.
    next_seq: AtomicU64,
    latest_issued: AtomicU64,
}

impl GeocodingClient<HttpTransport> {
    pub fn new(config: &MapConfig) -> Self {
        Self::with_transport(HttpTransport, config)
    }
}

impl<T: GeocodeTransport> GeocodingClient<T> {
    pub fn with_transport(transport: T, config: &MapConfig) -> Self {
        let geocoding = &config.geocoding;
        Self {
            transport,
            endpoint: geocoding.endpoint.trim_end_matches('/').to_string(),
            user_agent: geocoding.application_name.clone(),
            home_country: config.home_country.clone(),
            request_timeout: geocoding.request_timeout,
            limiter: RateLimiter::new(geocoding.min_interval),
            cache: ResultCache::new(geocoding.cache_capacity, geocoding.cache_ttl),
            next_seq: AtomicU64::new(0),
            latest_issued: AtomicU64::new(0),
        }
    }

    fn cache_key(query: &str, country_filter: Option<&[String]>, locale: Option<&str>) -> String {
        format!(
            "{}-{}-{}",
            query,
            country_filter.map(|c| c.join(",")).unwrap_or_default(),
            locale.unwrap_or_default()
        )
    }

    fn search_url(
        &self,
        query: &str,
        country_filter: Option<&[String]>,
        locale: Option<&str>,
    ) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/search", self.endpoint))
            .map_err(|e| MapError::InvalidEndpoint(e.to_string()))?;
        {
            let mut params = url.query_pairs_mut();
            params
                .append_pair("q", query)
                .append_pair("format", "json")
                .append_pair("addressdetails", "1")
                .append_pair("limit", "5")
                .append_pair("extratags", "1")
                .append_pair("namedetails", "1");
            if let Some(countries) = country_filter {
                if !countries.is_empty() {
                    params.append_pair("countrycodes", &countries.join(","));
                }
            }
            if let Some(locale) = locale {
                params.append_pair("accept-language", locale);
            }
        }
        Ok(url)
    }

    /// Ranked place candidates for a free-text query. A cache hit younger
    /// than the TTL short-circuits the network entirely and does not
    /// consume a rate-limit slot.
    pub async fn search(
        &self,
        query: &str,
        country_filter: Option<&[String]>,
        locale: Option<&str>,
    ) -> Vec<PlaceCandidate> {
        let results = self.search_raw(query, country_filter, locale).await;
        results
            .iter()
            .filter_map(|result| PlaceCandidate::from_result(result, &self.home_country))
            .collect()
    }

    async fn search_raw(
        &self,
        query: &str,
        country_filter: Option<&[String]>,
        locale: Option<&str>,
    ) -> Vec<PlaceResult> {
        let key = Self::cache_key(query, country_filter, locale);
        if let Some(cached) = self.cache.get(&key) {
            log::debug!("geocode cache hit for {:?}", query);
            return cached;
        }

        let url = match self.search_url(query, country_filter, locale) {
            Ok(url) => url,
            Err(e) => {
                log::error!("geocode request could not be built: {}", e);
                return Vec::new();
            }
        };

        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.latest_issued.store(seq, Ordering::SeqCst);

        self.limiter.acquire().await;

        let results = match self
            .transport
            .get(url, &self.user_agent, self.request_timeout)
            .await
        {
            Ok(results) => results,
            Err(e) => {
                log::error!("geocode request failed: {}", e);
                return Vec::new();
            }
        };

        if self.latest_issued.load(Ordering::SeqCst) != seq {
            log::debug!("discarding superseded geocode response for {:?}", query);
            return Vec::new();
        }

        self.cache.insert(key, results.clone());
        results
    }
}
