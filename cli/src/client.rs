//! REST client for the sigstudio server.

use reqwest::Method;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use sigstudio::model::SignatureDesign;
use sigstudio::routes::signatures::RenderedSignature;
use sigstudio::templates::TemplateId;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{step} returned HTTP {status}: {body}")]
    Status { step: &'static str, status: u16, body: String },
    #[error("request encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("missing expected field `{0}` in {1} response")]
    MissingField(&'static str, &'static str),
}

/// Catalog entry as listed by `GET /api/templates`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSummary {
    pub id: TemplateId,
    pub name: String,
    pub description: String,
    pub supports_animation: bool,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.trim_end_matches('/').to_owned() }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a server path (or pass through an absolute URL).
    #[must_use]
    pub fn absolute(&self, path_or_url: &str) -> String {
        if path_or_url.starts_with("http://") || path_or_url.starts_with("https://") {
            path_or_url.to_owned()
        } else {
            format!("{}{path_or_url}", self.base_url)
        }
    }

    /// `POST /api/objects/upload`
    ///
    /// # Errors
    ///
    /// Returns a transport, status, or missing-field error.
    pub async fn request_upload_url(&self) -> Result<String, ClientError> {
        const STEP: &str = "upload request";
        let json: Value = self
            .send_json(Method::POST, "/api/objects/upload", None, STEP)
            .await?;
        json.get("uploadURL")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or(ClientError::MissingField("uploadURL", STEP))
    }

    /// PUT raw bytes to an upload URL.
    ///
    /// # Errors
    ///
    /// Returns a transport or status error.
    pub async fn put_object(&self, upload_url: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .put(self.absolute(upload_url))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;
        check_status(response, "object upload").await?;
        Ok(())
    }

    /// `PUT /api/contact-icons`; returns the published object path.
    ///
    /// # Errors
    ///
    /// Returns a transport, status, or missing-field error.
    pub async fn register_contact_icon(&self, icon_url: &str) -> Result<String, ClientError> {
        const STEP: &str = "contact icon registration";
        let body = serde_json::json!({ "iconURL": icon_url });
        let json: Value = self
            .send_json(Method::PUT, "/api/contact-icons", Some(body), STEP)
            .await?;
        json.get("objectPath")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or(ClientError::MissingField("objectPath", STEP))
    }

    /// `POST /api/signatures/render`
    ///
    /// # Errors
    ///
    /// Returns a transport or status error, including server-side validation.
    pub async fn render(&self, design: &SignatureDesign) -> Result<RenderedSignature, ClientError> {
        let body = serde_json::to_value(design)?;
        self.send_json(Method::POST, "/api/signatures/render", Some(body), "render")
            .await
    }

    /// `GET /healthz`
    ///
    /// # Errors
    ///
    /// Returns a transport or status error.
    pub async fn ping(&self) -> Result<(), ClientError> {
        let response = self.http.get(self.absolute("/healthz")).send().await?;
        check_status(response, "health check").await?;
        Ok(())
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        step: &'static str,
    ) -> Result<T, ClientError> {
        let request = self.http.request(method, self.absolute(path));
        let request = if let Some(json) = body { request.json(&json) } else { request };
        let response = check_status(request.send().await?, step).await?;
        Ok(response.json::<T>().await?)
    }
}

async fn check_status(response: reqwest::Response, step: &'static str) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status { step, status: status.as_u16(), body })
}

/// Read-only access to the template catalog.
#[derive(Debug, Clone)]
pub struct TemplateClient {
    client: ApiClient,
}

impl TemplateClient {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// `GET /api/templates`
    ///
    /// # Errors
    ///
    /// Returns a transport or status error.
    pub async fn list(&self) -> Result<Vec<TemplateSummary>, ClientError> {
        self.client
            .send_json(Method::GET, "/api/templates", None, "template list")
            .await
    }
}
