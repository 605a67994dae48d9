use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{collection_route, entities_route, record_route, DeleteResponse},
    record::Fields,
};
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid server url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    Api {
        status: u16,
        code: Option<ErrorCode>,
        message: String,
    },
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::InvalidUrl { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Typed client for the entity REST API.
#[derive(Debug, Clone)]
pub struct AdminClient {
    http: Client,
    server_url: String,
}

impl AdminClient {
    pub fn new(server_url: impl Into<String>) -> Result<Self> {
        Self::with_http_client(server_url, Client::new())
    }

    pub fn with_http_client(server_url: impl Into<String>, http: Client) -> Result<Self> {
        let server_url = server_url.into();
        let parsed = Url::parse(&server_url).map_err(|source| ClientError::InvalidUrl {
            url: server_url.clone(),
            source,
        })?;
        Ok(Self {
            http,
            server_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub async fn health(&self) -> Result<()> {
        self.send(self.request(Method::GET, "/healthz")).await?;
        Ok(())
    }

    pub async fn entities(&self) -> Result<Vec<String>> {
        self.fetch(self.request(Method::GET, entities_route()))
            .await
    }

    pub async fn list(&self, entity: &str) -> Result<Vec<Fields>> {
        self.fetch(self.request(Method::GET, &collection_route(entity)))
            .await
    }

    pub async fn get(&self, entity: &str, id: i64) -> Result<Fields> {
        self.fetch(self.request(Method::GET, &record_route(entity, id)))
            .await
    }

    pub async fn create(&self, entity: &str, fields: &Fields) -> Result<Fields> {
        self.fetch(
            self.request(Method::POST, &collection_route(entity))
                .json(fields),
        )
        .await
    }

    pub async fn update(&self, entity: &str, id: i64, fields: &Fields) -> Result<Fields> {
        self.fetch(
            self.request(Method::PUT, &record_route(entity, id))
                .json(fields),
        )
        .await
    }

    pub async fn delete(&self, entity: &str, id: i64) -> Result<String> {
        let response: DeleteResponse = self
            .fetch(self.request(Method::DELETE, &record_route(entity, id)))
            .await?;
        Ok(response.message)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!(%method, path, "admin api request");
        self.http
            .request(method, format!("{}{path}", self.server_url))
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        Ok(self.send(request).await?.json().await?)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(match serde_json::from_str::<ApiError>(&body) {
            Ok(api) => ClientError::Api {
                status: status.as_u16(),
                code: Some(api.code),
                message: api.message,
            },
            Err(_) => ClientError::Api {
                status: status.as_u16(),
                code: None,
                message: if body.is_empty() {
                    status.to_string()
                } else {
                    body
                },
            },
        })
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
