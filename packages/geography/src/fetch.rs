//! Boundary fetching and memoization.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::{BoundaryCollection, BoundarySource, GeoError};

/// Downloads a boundary document as text.
///
/// # Errors
///
/// Returns [`GeoError::Http`] on connection failure, timeout or a
/// non-success status.
async fn fetch_url(url: &str, timeout: Duration) -> Result<String, GeoError> {
    let http_error = |source: reqwest::Error| GeoError::Http {
        url: url.to_string(),
        source,
    };

    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(http_error)?;

    log::debug!("Fetching boundaries from {url} (timeout {}ms)", timeout.as_millis());

    let response = client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(http_error)?;

    response.text().await.map_err(http_error)
}

/// Reads the boundary document from `source`.
///
/// # Errors
///
/// Returns [`GeoError`] if the file cannot be read or the request fails.
pub async fn fetch_text(source: &BoundarySource, timeout: Duration) -> Result<String, GeoError> {
    match source {
        BoundarySource::Url(url) => fetch_url(url, timeout).await,
        BoundarySource::File(path) => {
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| GeoError::Io {
                    path: path.clone(),
                    source,
                })
        }
    }
}

/// Fetches and parses the boundary collection, uncached.
///
/// # Errors
///
/// Returns [`GeoError`] if the document cannot be obtained or parsed.
pub async fn fetch_boundaries(
    source: &BoundarySource,
    label_property: &str,
    timeout: Duration,
) -> Result<BoundaryCollection, GeoError> {
    let text = fetch_text(source, timeout).await?;
    let boundaries = BoundaryCollection::parse(&text, label_property)?;
    log::info!("Loaded {} boundary features from {source}", boundaries.len());
    Ok(boundaries)
}

type CacheKey = (BoundarySource, String);

/// Memoizes boundary collections per source and label property.
///
/// Failures are not cached, so a later call retries the fetch.
#[derive(Debug)]
pub struct BoundaryCache {
    timeout: Duration,
    entries: Mutex<BTreeMap<CacheKey, Arc<BoundaryCollection>>>,
}

impl BoundaryCache {
    /// Creates an empty cache whose fetches use `timeout`.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Returns the collection for `source`, fetching it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError`] if the fetch or parse fails.
    pub async fn get(
        &self,
        source: &BoundarySource,
        label_property: &str,
    ) -> Result<Arc<BoundaryCollection>, GeoError> {
        let key: CacheKey = (source.clone(), label_property.to_string());

        let cached = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();
        if let Some(hit) = cached {
            log::debug!("Boundary cache hit for {source}");
            return Ok(hit);
        }

        let fetched = Arc::new(fetch_boundaries(source, label_property, self.timeout).await?);

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(entries.entry(key).or_insert(fetched)))
    }

    /// Number of memoized collections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been fetched yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::boundary::test_support::PROVINCES;

    fn write_provinces(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("risk_map_geography_{name}.geojson"));
        std::fs::write(&path, PROVINCES).unwrap();
        path
    }

    #[tokio::test]
    async fn reads_local_file() {
        let source = BoundarySource::File(write_provinces("local"));
        let boundaries = fetch_boundaries(&source, "NAME_1", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(boundaries.len(), 3);
    }

    #[tokio::test]
    async fn missing_file_names_the_path() {
        let source = BoundarySource::File(std::env::temp_dir().join("risk_map_no_such.geojson"));
        let err = fetch_boundaries(&source, "NAME_1", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, GeoError::Io { .. }));
        assert!(err.to_string().contains("risk_map_no_such.geojson"));
    }

    #[tokio::test]
    async fn malformed_url_is_an_http_error() {
        let source = BoundarySource::Url("not a url".to_string());
        let err = fetch_boundaries(&source, "NAME_1", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, GeoError::Http { .. }), "{err}");
    }

    #[tokio::test]
    async fn silent_server_times_out_as_http_error() {
        // Connections queue in the backlog but are never answered.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let source = BoundarySource::Url(format!("http://{addr}/provinces.geojson"));

        let started = std::time::Instant::now();
        let err = fetch_text(&source, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(5));

        let proxied = ["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"]
            .iter()
            .any(|var| std::env::var_os(var).is_some());

        match err {
            GeoError::Http { url, source } => {
                assert!(url.contains(&addr.to_string()));
                assert!(proxied || source.is_timeout(), "{source}");
            }
            other => panic!("expected http error, got {other}"),
        }
        drop(listener);
    }

    #[tokio::test]
    async fn cache_reuses_collection_per_source() {
        let cache = BoundaryCache::new(Duration::from_secs(1));
        let source = BoundarySource::File(write_provinces("cached"));

        let first = cache.get(&source, "NAME_1").await.unwrap();
        let second = cache.get(&source, "NAME_1").await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn cache_does_not_keep_failures() {
        let cache = BoundaryCache::new(Duration::from_secs(1));
        let source = BoundarySource::File(std::env::temp_dir().join("risk_map_absent.geojson"));

        assert!(cache.get(&source, "NAME_1").await.is_err());
        assert!(cache.is_empty());
    }
}
