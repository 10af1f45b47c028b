//! Typed access to the record endpoints.
//!
//! No retries and no caching: every call is exactly one request, and whatever
//! the server reports comes back as a [`GatewayError`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, Response, StatusCode};
use shared::{
    domain::{Record, RecordId},
    error::ErrorBody,
    protocol::{
        HealthResponse, ListQuery, ListResponse, ListResult, RecordBody, SingleResponse,
        HEALTH_PATH, RECORDS_PATH, UPLOADS_PATH,
    },
};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },
    #[error("record {0} not found")]
    NotFound(RecordId),
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("invalid server url {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl From<reqwest::Error> for GatewayError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::Decode(value.to_string())
        } else {
            Self::Network(value)
        }
    }
}

/// An image picked in the form, uploaded as the `profile` multipart field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileImage {
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Create/update input. Carries a file only when the user attached one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPayload {
    pub fields: RecordBody,
    pub image: Option<ProfileImage>,
}

/// Wire shape chosen for a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Json(RecordBody),
    Multipart {
        fields: RecordBody,
        image: ProfileImage,
    },
}

impl RecordPayload {
    pub fn new(fields: RecordBody) -> Self {
        Self {
            fields,
            image: None,
        }
    }

    pub fn with_image(mut self, image: ProfileImage) -> Self {
        self.image = Some(image);
        self
    }

    /// Multipart exactly when a file is attached, JSON otherwise.
    pub fn into_body(self) -> RequestBody {
        match self.image {
            Some(image) => RequestBody::Multipart {
                fields: self.fields,
                image,
            },
            None => RequestBody::Json(self.fields),
        }
    }
}

#[async_trait]
pub trait RecordGateway: Send + Sync {
    async fn list(&self, query: &ListQuery) -> Result<ListResult, GatewayError>;
    async fn get(&self, id: RecordId) -> Result<Record, GatewayError>;
    async fn create(&self, payload: RecordPayload) -> Result<Record, GatewayError>;
    async fn update(&self, id: RecordId, payload: RecordPayload) -> Result<Record, GatewayError>;
    async fn delete(&self, id: RecordId) -> Result<(), GatewayError>;
}

pub struct HttpRecordGateway {
    http: Client,
    base_url: String,
}

impl HttpRecordGateway {
    pub fn new(base_url: &str) -> Result<Self, GatewayError> {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let http = Client::builder().timeout(timeout).build()?;
        Self::with_client(base_url, http)
    }

    fn with_client(base_url: &str, http: Client) -> Result<Self, GatewayError> {
        let raw = base_url.trim();
        let parsed = Url::parse(raw).map_err(|err| GatewayError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: err.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(GatewayError::InvalidBaseUrl {
                url: raw.to_string(),
                reason: "scheme must be http or https".to_string(),
            });
        }

        Ok(Self {
            http,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Where the server exposes an uploaded profile image.
    pub fn image_url(&self, profile: &str) -> String {
        format!(
            "{}{UPLOADS_PATH}/{}",
            self.base_url,
            profile.trim_start_matches('/')
        )
    }

    pub async fn health(&self) -> Result<(), GatewayError> {
        let response = self
            .http
            .get(format!("{}{HEALTH_PATH}", self.base_url))
            .send()
            .await?;
        let body: HealthResponse = ensure_success(response, None).await?.json().await?;
        if body.status != "ok" {
            return Err(GatewayError::Decode(format!(
                "health status {:?}",
                body.status
            )));
        }
        Ok(())
    }

    fn records_url(&self) -> String {
        format!("{}{RECORDS_PATH}", self.base_url)
    }

    fn record_url(&self, id: RecordId) -> String {
        format!("{}{RECORDS_PATH}/{}", self.base_url, id.0)
    }

    async fn send_payload(
        &self,
        request: reqwest::RequestBuilder,
        payload: RecordPayload,
        id: Option<RecordId>,
    ) -> Result<Record, GatewayError> {
        let request = match payload.into_body() {
            RequestBody::Json(fields) => request.json(&fields),
            RequestBody::Multipart { fields, image } => {
                request.multipart(multipart_form(fields, image)?)
            }
        };
        let response = request.send().await?;
        let body: SingleResponse<Record> = ensure_success(response, id).await?.json().await?;
        Ok(body.data)
    }
}

#[async_trait]
impl RecordGateway for HttpRecordGateway {
    async fn list(&self, query: &ListQuery) -> Result<ListResult, GatewayError> {
        debug!(q = %query.q, page = query.page, limit = query.limit, "gateway: list");
        let result: Result<ListResult, GatewayError> = async {
            let response = self.http.get(self.records_url()).query(query).send().await?;
            let body: ListResponse<Record> = ensure_success(response, None).await?.json().await?;
            Ok(ListResult::from(body))
        }
        .await;
        result.inspect_err(|err| warn!(%err, page = query.page, "gateway: list failed"))
    }

    async fn get(&self, id: RecordId) -> Result<Record, GatewayError> {
        debug!(id = id.0, "gateway: get");
        let result: Result<Record, GatewayError> = async {
            let response = self.http.get(self.record_url(id)).send().await?;
            let body: SingleResponse<Record> =
                ensure_success(response, Some(id)).await?.json().await?;
            Ok(body.data)
        }
        .await;
        result.inspect_err(|err| warn!(%err, id = id.0, "gateway: get failed"))
    }

    async fn create(&self, payload: RecordPayload) -> Result<Record, GatewayError> {
        debug!(with_image = payload.image.is_some(), "gateway: create");
        self.send_payload(self.http.post(self.records_url()), payload, None)
            .await
            .inspect_err(|err| warn!(%err, "gateway: create failed"))
    }

    async fn update(&self, id: RecordId, payload: RecordPayload) -> Result<Record, GatewayError> {
        debug!(id = id.0, with_image = payload.image.is_some(), "gateway: update");
        self.send_payload(self.http.put(self.record_url(id)), payload, Some(id))
            .await
            .inspect_err(|err| warn!(%err, id = id.0, "gateway: update failed"))
    }

    async fn delete(&self, id: RecordId) -> Result<(), GatewayError> {
        debug!(id = id.0, "gateway: delete");
        let result: Result<(), GatewayError> = async {
            let response = self.http.delete(self.record_url(id)).send().await?;
            ensure_success(response, Some(id)).await?;
            Ok(())
        }
        .await;
        result.inspect_err(|err| warn!(%err, id = id.0, "gateway: delete failed"))
    }
}

fn multipart_form(fields: RecordBody, image: ProfileImage) -> Result<multipart::Form, GatewayError> {
    let mut form = multipart::Form::new()
        .text("npm", fields.npm)
        .text("nama", fields.nama)
        .text("kelas", fields.kelas);
    if let Some(minat) = fields.minat {
        form = form.text("minat", minat);
    }

    let mut part = multipart::Part::bytes(image.bytes).file_name(image.filename);
    if let Some(mime_type) = image.mime_type.as_deref() {
        part = part.mime_str(mime_type)?;
    }
    Ok(form.part("profile", part))
}

/// 404 on an id-addressed call is `NotFound`; every other non-2xx status is
/// a `Server` error carrying the `{error}` message when the body has one.
async fn ensure_success(response: Response, id: Option<RecordId>) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if let (StatusCode::NOT_FOUND, Some(id)) = (status, id) {
        return Err(GatewayError::NotFound(id));
    }

    let raw = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&raw)
        .map(|body| body.error)
        .ok()
        .or_else(|| {
            let trimmed = raw.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

    Err(GatewayError::Server {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
