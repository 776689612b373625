//! HTTP client for the remote search service
//!
//! This module owns the wire half of the search controller: one method per
//! backend route, shared request execution, and the response shapes. Routes
//! are fixed by the backend contract and must not change.

use crate::error::{Error, Result};
use crate::query::{FilterSet, SearchRequest};
use reqwest::{Client as ReqwestClient, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, error, instrument};
use url::Url;

/// Default timeout for HTTP requests in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where the search service listens when nothing else is configured
pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000";

/// One search hit as returned by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hit {
    /// Record identifier
    #[serde(rename = "_id")]
    pub id: String,

    /// Relevance score
    #[serde(rename = "_score")]
    pub score: f64,

    /// The full record. Fields are passed through opaquely; only a handful
    /// get special formatting at render time.
    #[serde(rename = "_source")]
    pub source: Map<String, Value>,

    /// Backend-provided highlighted excerpt, when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<Highlight>,
}

/// Highlighted fragments for a hit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Highlight {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<Vec<String>>,
}

impl Hit {
    /// Preferred snippet source: the first highlighted fragment, if any
    pub fn highlight_fragment(&self) -> Option<&str> {
        self.highlight
            .as_ref()
            .and_then(|h| h.status_message.as_ref())
            .and_then(|fragments| fragments.first())
            .map(String::as_str)
    }
}

/// Response body of the search and similarity routes
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub hits: Vec<Hit>,
}

/// Response body of the delete route
#[derive(Debug, Deserialize)]
struct DeleteResponse {
    status: String,
    message: String,
}

/// HTTP client for the search service
#[derive(Clone)]
pub struct SearchClient {
    /// The underlying reqwest client
    client: ReqwestClient,

    /// Base URL of the search service
    base_url: String,
}

impl SearchClient {
    /// Create a client for the service at `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        Url::parse(&base_url)
            .map_err(|e| Error::InvalidRequest(format!("invalid endpoint {base_url}: {e}")))?;

        let client = ReqwestClient::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(Error::Http)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Dispatch the one network call appropriate to the request mode
    pub async fn execute(&self, request: &SearchRequest) -> Result<Vec<Hit>> {
        match request {
            SearchRequest::Plain { query } => self.search(query).await,
            SearchRequest::Filtered { query, filters } => {
                self.search_filtered(query, filters).await
            }
            SearchRequest::Similar { id, .. } => self.similar(id).await,
        }
    }

    /// Plain free-text search
    #[instrument(skip(self), level = "debug")]
    pub async fn search(&self, query: &str) -> Result<Vec<Hit>> {
        let url = self.build_url("api/search")?;
        let request = self.client.get(url).query(&[("query", query)]);

        debug!("Sending plain search request");
        let response: SearchResponse = self.execute_request(request).await?;
        Ok(response.hits)
    }

    /// Structured search: free text plus the serialized filter set
    #[instrument(skip(self, filters), level = "debug")]
    pub async fn search_filtered(&self, query: &str, filters: &FilterSet) -> Result<Vec<Hit>> {
        let url = self.build_url("api/search")?;
        let body = serde_json::json!({ "query": query, "filters": filters });
        let request = self.client.post(url).json(&body);

        debug!("Sending structured search request");
        let response: SearchResponse = self.execute_request(request).await?;
        Ok(response.hits)
    }

    /// More-like-this search seeded by a record id
    #[instrument(skip(self), level = "debug")]
    pub async fn similar(&self, id: &str) -> Result<Vec<Hit>> {
        let url = self.build_url(&format!("api/similar/{id}"))?;
        let request = self.client.get(url);

        debug!("Sending similarity request");
        let response: SearchResponse = self.execute_request(request).await?;
        Ok(response.hits)
    }

    /// Delete a record. Returns the backend's success message; an in-band
    /// `status: "error"` answer maps to [`Error::Rejected`].
    #[instrument(skip(self), level = "debug")]
    pub async fn delete(&self, id: &str) -> Result<String> {
        let url = self.build_url(&format!("api/delete/{id}"))?;
        let request = self.client.delete(url);

        debug!("Sending delete request");
        let response: DeleteResponse = self.execute_request(request).await?;
        if response.status == "success" {
            Ok(response.message)
        } else {
            Err(Error::Rejected(response.message))
        }
    }

    fn build_url(&self, path: &str) -> Result<Url> {
        let url = format!("{}/{}", self.base_url, path);
        Url::parse(&url).map_err(|e| Error::InvalidRequest(format!("invalid URL {url}: {e}")))
    }

    /// Execute an HTTP request and handle the response
    async fn execute_request<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(Error::Http)?;

        let status = response.status();
        let response_text = response.text().await.map_err(Error::Http)?;

        if status.is_success() {
            serde_json::from_str(&response_text).map_err(|e| {
                error!("Failed to parse response: {}", e);
                Error::MalformedResponse(format!("Failed to parse response: {e}"))
            })
        } else {
            error!("API error: {} - {}", status, response_text);
            Err(Error::Api {
                status_code: status.as_u16(),
                message: response_text,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::RuleSet;
    use crate::schema::Operator;
    use mockito::{Matcher, Server};

    const HITS_BODY: &str = r#"{
        "hits": [
            {
                "_id": "abc",
                "_score": 1.2345,
                "_source": { "link_name": "Post X", "status_message": "hello world" },
                "highlight": { "status_message": ["<em>hello</em> world"] }
            }
        ]
    }"#;

    #[tokio::test]
    async fn plain_search_encodes_query_and_parses_hits() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/search")
            .match_query(Matcher::UrlEncoded("query".into(), "hello world".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(HITS_BODY)
            .expect(1)
            .create_async()
            .await;

        let client = SearchClient::new(server.url()).unwrap();
        let hits = client.search("hello world").await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "abc");
        assert_eq!(hits[0].highlight_fragment(), Some("<em>hello</em> world"));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn structured_search_posts_query_and_filters() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/search")
            .match_body(Matcher::Json(serde_json::json!({
                "query": "",
                "filters": { "num_likes": { "min": "10", "max": "50" } }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{ "hits": [] }"#)
            .expect(1)
            .create_async()
            .await;

        let mut rules = RuleSet::new();
        let a = rules.add_rule();
        rules.set_value(a, "10");
        let b = rules.add_rule();
        rules.set_operator(b, Operator::Lte).unwrap();
        rules.set_value(b, "50");

        let client = SearchClient::new(server.url()).unwrap();
        let hits = client
            .search_filtered("", &rules.serialize_non_empty())
            .await
            .unwrap();
        assert!(hits.is_empty());

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn similarity_search_hits_the_id_route() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/similar/abc")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(HITS_BODY)
            .expect(1)
            .create_async()
            .await;

        let client = SearchClient::new(server.url()).unwrap();
        let hits = client.similar("abc").await.unwrap();
        assert_eq!(hits.len(), 1);

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_maps_to_api_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/search")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = SearchClient::new(server.url()).unwrap();
        let result = client.search("anything").await;
        assert!(matches!(
            result,
            Err(Error::Api {
                status_code: 500,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn malformed_body_maps_to_malformed_response() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("not json at all")
            .create_async()
            .await;

        let client = SearchClient::new(server.url()).unwrap();
        let result = client.search("anything").await;
        assert!(matches!(result, Err(Error::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn delete_returns_backend_message() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", "/api/delete/abc")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{ "status": "success", "message": "Post deleted" }"#)
            .expect(1)
            .create_async()
            .await;

        let client = SearchClient::new(server.url()).unwrap();
        assert_eq!(client.delete("abc").await.unwrap(), "Post deleted");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn delete_in_band_error_is_rejected() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/api/delete/abc")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{ "status": "error", "message": "no such document" }"#)
            .create_async()
            .await;

        let client = SearchClient::new(server.url()).unwrap();
        match client.delete("abc").await {
            Err(Error::Rejected(message)) => assert_eq!(message, "no such document"),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn rejects_garbage_endpoint() {
        assert!(matches!(
            SearchClient::new("not a url"),
            Err(Error::InvalidRequest(_))
        ));
    }
}
