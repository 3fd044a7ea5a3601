//! remote::http
//!
//! Repository client speaking the JSON gateway protocol over HTTP.
//!
//! # Protocol
//!
//! Reads are `GET` requests below the configured endpoint:
//!
//! | Read                 | Request                                   |
//! |----------------------|-------------------------------------------|
//! | `lists`              | `GET /lists`                              |
//! | `list_schema`        | `GET /lists/{title}`                      |
//! | `content_types`      | `GET /lists/{title}/content-types`        |
//! | `views`              | `GET /lists/{title}/views`                |
//! | `documents`          | `GET /folders?path={folder}`              |
//! | `document`           | `GET /files?path={path}` (404 is `None`)  |
//! | `site`               | `GET /site`                               |
//! | `site_content_types` | `GET /site/content-types`                 |
//! | `gallery`            | `GET /gallery`                            |
//! | `pages`              | `GET /lists/{title}/pages`                |
//! | `site_property`      | `GET /site/properties/{key}` (404 is `None`) |
//!
//! Writes are a single `POST /batch` whose body is the JSON array of tagged
//! mutations. A refused batch answers 409 or 422 with
//! `{"message": "...", "index": n}`.
//!
//! Views are read with the repository's own view-type tag (`"HTML"`,
//! `"GRID"`, ...) in a `view_type` field.
//!
//! # Authentication
//!
//! A bearer token is sent on every request when one is configured.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::batch::Batch;
use super::traits::{
    ContentTypeRef, DocumentRef, Gallery, ListSchema, ListSettings, ListSummary, PageRef,
    RepoError, RepositoryClient, SiteInfo, ViewDef,
};
use crate::core::types::{ServerPath, ViewKind};

/// User-Agent header value for gateway requests.
const USER_AGENT_VALUE: &str = "sitegraft";

/// HTTP repository client.
pub struct HttpRepository {
    client: Client,
    endpoint: Url,
    token: Option<String>,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for HttpRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRepository")
            .field("endpoint", &self.endpoint.as_str())
            .field("has_token", &self.token.is_some())
            .finish()
    }
}

/// Error body returned by the gateway.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    index: Option<usize>,
}

/// A view as the gateway reports it.
#[derive(Debug, Deserialize)]
struct WireView {
    title: String,
    #[serde(default)]
    paged: bool,
    #[serde(default)]
    personal: bool,
    #[serde(default)]
    query: String,
    #[serde(default)]
    row_limit: u32,
    #[serde(default)]
    default_view: bool,
    #[serde(default)]
    fields: Vec<String>,
    #[serde(default)]
    view_type: ViewKind,
}

impl From<WireView> for ViewDef {
    fn from(w: WireView) -> Self {
        ViewDef {
            title: w.title,
            paged: w.paged,
            personal: w.personal,
            query: w.query,
            row_limit: w.row_limit,
            default_view: w.default_view,
            fields: w.fields,
            kind: w.view_type,
        }
    }
}

/// A list schema as the gateway reports it.
#[derive(Debug, Deserialize)]
struct WireListSchema {
    title: String,
    template: u32,
    root: ServerPath,
    #[serde(default)]
    content_types_enabled: bool,
    #[serde(default)]
    settings: ListSettings,
    #[serde(default)]
    content_types: Vec<ContentTypeRef>,
    #[serde(default)]
    views: Vec<WireView>,
}

impl From<WireListSchema> for ListSchema {
    fn from(w: WireListSchema) -> Self {
        ListSchema {
            title: w.title,
            template: w.template,
            root: w.root,
            content_types_enabled: w.content_types_enabled,
            settings: w.settings,
            content_types: w.content_types,
            views: w.views.into_iter().map(Into::into).collect(),
        }
    }
}

/// A site property as the gateway reports it.
#[derive(Debug, Deserialize)]
struct WireProperty {
    value: String,
}

impl HttpRepository {
    /// Create a client for a gateway endpoint.
    ///
    /// # Errors
    ///
    /// `ApiError` with status 0 if the endpoint is not an http(s) URL.
    pub fn new(endpoint: &str, token: Option<String>) -> Result<Self, RepoError> {
        let invalid = |reason: String| RepoError::ApiError {
            status: 0,
            message: format!("invalid endpoint '{}': {}", endpoint, reason),
        };

        let url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
            return Err(invalid("scheme must be http or https".into()));
        }

        Ok(Self {
            client: Client::new(),
            endpoint: url,
            token,
        })
    }

    fn headers(&self) -> Result<HeaderMap, RepoError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        if let Some(token) = &self.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| RepoError::AuthFailed("token contains invalid characters".into()))?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Build a URL below the endpoint from path segments.
    fn url(&self, segments: &[&str]) -> Result<Url, RepoError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| RepoError::ApiError {
                status: 0,
                message: format!("endpoint '{}' cannot carry a path", self.endpoint),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Build a URL carrying a `path` query parameter.
    fn path_url(&self, resource: &str, path: &ServerPath) -> Result<Url, RepoError> {
        let mut url = self.url(&[resource])?;
        url.query_pairs_mut().append_pair("path", path.as_str());
        Ok(url)
    }

    async fn send_get(&self, url: Url) -> Result<Response, RepoError> {
        debug!(url = %url, "GET");
        self.client
            .get(url)
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| RepoError::NetworkError(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, RepoError> {
        let response = self.send_get(url).await?;
        self.handle_response(response).await
    }

    /// Like `get`, but a 404 yields `None`.
    async fn get_optional<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>, RepoError> {
        let response = self.send_get(url).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        self.handle_response(response).await.map(Some)
    }

    /// Handle a gateway response, mapping errors appropriately.
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> Result<T, RepoError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| RepoError::ApiError {
                status: status.as_u16(),
                message: format!("failed to parse response: {}", e),
            })
        } else {
            Err(self.error_from(response, status).await)
        }
    }

    /// Map an error response to a `RepoError`.
    async fn error_from(&self, response: Response, status: StatusCode) -> RepoError {
        let (message, index) = match response.json::<ErrorBody>().await {
            Ok(body) => (body.message, body.index),
            Err(_) => ("unknown error".to_string(), None),
        };

        match status {
            StatusCode::UNAUTHORIZED if self.token.is_none() => RepoError::AuthRequired,
            StatusCode::UNAUTHORIZED => RepoError::AuthFailed("invalid or expired token".into()),
            StatusCode::FORBIDDEN => RepoError::AuthFailed(format!("permission denied: {}", message)),
            StatusCode::NOT_FOUND => RepoError::NotFound(message),
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => match index {
                Some(index) => RepoError::Rejected { index, message },
                None if status == StatusCode::CONFLICT => RepoError::Conflict(message),
                None => RepoError::ApiError {
                    status: status.as_u16(),
                    message,
                },
            },
            _ if status.is_server_error() => RepoError::ApiError {
                status: status.as_u16(),
                message: format!("gateway server error: {}", message),
            },
            _ => RepoError::ApiError {
                status: status.as_u16(),
                message,
            },
        }
    }
}

#[async_trait]
impl RepositoryClient for HttpRepository {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn lists(&self) -> Result<Vec<ListSummary>, RepoError> {
        self.get(self.url(&["lists"])?).await
    }

    async fn list_schema(&self, title: &str) -> Result<ListSchema, RepoError> {
        let schema: WireListSchema = self.get(self.url(&["lists", title])?).await?;
        Ok(schema.into())
    }

    async fn content_types(&self, list: &str) -> Result<Vec<ContentTypeRef>, RepoError> {
        self.get(self.url(&["lists", list, "content-types"])?).await
    }

    async fn views(&self, list: &str) -> Result<Vec<ViewDef>, RepoError> {
        let views: Vec<WireView> = self.get(self.url(&["lists", list, "views"])?).await?;
        Ok(views.into_iter().map(Into::into).collect())
    }

    async fn documents(&self, folder: &ServerPath) -> Result<Vec<DocumentRef>, RepoError> {
        self.get(self.path_url("folders", folder)?).await
    }

    async fn document(&self, path: &ServerPath) -> Result<Option<DocumentRef>, RepoError> {
        self.get_optional(self.path_url("files", path)?).await
    }

    async fn site(&self) -> Result<SiteInfo, RepoError> {
        self.get(self.url(&["site"])?).await
    }

    async fn site_content_types(&self) -> Result<Vec<ContentTypeRef>, RepoError> {
        self.get(self.url(&["site", "content-types"])?).await
    }

    async fn gallery(&self) -> Result<Gallery, RepoError> {
        self.get(self.url(&["gallery"])?).await
    }

    async fn pages(&self, library: &str) -> Result<Vec<PageRef>, RepoError> {
        self.get(self.url(&["lists", library, "pages"])?).await
    }

    async fn site_property(&self, key: &str) -> Result<Option<String>, RepoError> {
        let property: Option<WireProperty> = self
            .get_optional(self.url(&["site", "properties", key])?)
            .await?;
        Ok(property.map(|p| p.value))
    }

    async fn execute(&self, batch: Batch) -> Result<(), RepoError> {
        let url = self.url(&["batch"])?;
        debug!(url = %url, mutations = batch.len(), "POST batch");

        let response = self
            .client
            .post(url)
            .headers(self.headers()?)
            .json(&batch)
            .send()
            .await
            .map_err(|e| RepoError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let err = self.error_from(response, status).await;
        if let RepoError::Rejected { index, .. } = &err {
            if let Some(mutation) = batch.mutations().get(*index) {
                warn!(index, mutation = %mutation.description(), "gateway rejected batch");
            }
        }
        Err(err)
    }
}
