//! HTTP client abstraction for testability

use super::GeoError;
use std::future::Future;
use tracing::{debug, warn};

/// Trait for asynchronous HTTP GET operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait HttpClient: Send + Sync {
    /// Performs an async HTTP GET request with query parameters.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request (without query string)
    /// * `query` - Slice of (name, value) query parameters; the client is
    ///   responsible for encoding them
    ///
    /// # Returns
    ///
    /// The response body as bytes or an error.
    fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> impl Future<Output = Result<Vec<u8>, GeoError>> + Send;
}

/// Real HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with default configuration.
    pub fn new() -> Result<Self, GeoError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| GeoError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<Vec<u8>, GeoError> {
        let response = match self.client.get(url).query(query).send().await {
            Ok(resp) => {
                debug!(url = url, status = resp.status().as_u16(), "geocoding response received");
                resp
            }
            Err(e) => {
                warn!(url = url, error = %e, "geocoding request failed");
                return Err(GeoError::Http(format!("Request failed: {}", e)));
            }
        };

        if !response.status().is_success() {
            return Err(GeoError::Http(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| GeoError::Http(format!("Failed to read response: {}", e)))
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock HTTP client for testing. Records the last request made.
    pub struct MockHttpClient {
        pub response: Result<Vec<u8>, GeoError>,
        pub last_request: Mutex<Option<(String, Vec<(String, String)>)>>,
    }

    impl MockHttpClient {
        pub fn returning(response: Result<Vec<u8>, GeoError>) -> Self {
            Self {
                response,
                last_request: Mutex::new(None),
            }
        }
    }

    impl HttpClient for MockHttpClient {
        async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<Vec<u8>, GeoError> {
            let recorded = query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            *self.last_request.lock().unwrap() = Some((url.to_string(), recorded));
            self.response.clone()
        }
    }

    #[tokio::test]
    async fn test_mock_client_success() {
        let mock = MockHttpClient::returning(Ok(vec![1, 2, 3, 4]));

        let result = mock.get("http://example.com", &[]).await;
        assert_eq!(result.unwrap(), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_mock_client_records_request() {
        let mock = MockHttpClient::returning(Ok(vec![]));

        mock.get("http://example.com", &[("limit", "1")])
            .await
            .unwrap();

        let recorded = mock.last_request.lock().unwrap().clone();
        let (url, query) = recorded.unwrap();
        assert_eq!(url, "http://example.com");
        assert_eq!(query, vec![("limit".to_string(), "1".to_string())]);
    }

    #[tokio::test]
    async fn test_mock_client_error() {
        let mock = MockHttpClient::returning(Err(GeoError::Http("Test error".to_string())));

        let result = mock.get("http://example.com", &[]).await;
        assert!(result.is_err());
    }
}
