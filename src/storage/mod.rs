//! Object storage service.
//!
//! ARCHITECTURE
//! ============
//! Uploads are two-phase. `request_upload` issues a one-shot ticket and
//! returns an absolute upload URL carrying it; the client PUTs raw bytes to
//! that URL and `accept_upload` stores them as a *private* object. A later
//! `publish` (the contact-icon registration) flips the object to public
//! and returns its stable path, `/objects/uploads/<id>`. Only public
//! objects are ever served back.
//!
//! ERROR HANDLING
//! ==============
//! The ticket is checked first and only redeemed once the body passes
//! validation, so a rejected body leaves it usable for a corrected retry.
//! A failed backend write puts the redeemed ticket back for the same reason.

pub mod fs;
pub mod store;
pub mod tickets;

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::config::{StorageBackend, StudioConfig};
use crate::error::ErrorCode;
pub use store::{MemoryStore, ObjectMeta, ObjectStore, StoredObject, Visibility};
use tickets::{TicketRejection, UploadTickets};

/// Path prefix of published objects.
pub const OBJECT_PATH_PREFIX: &str = "/objects/uploads/";
/// Path prefix of upload targets.
pub const UPLOAD_PATH_PREFIX: &str = "/api/objects/uploads/";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(Uuid),
    #[error("upload ticket rejected: {0:?}")]
    TicketRejected(TicketRejection),
    #[error("upload of {size} bytes exceeds limit of {limit}")]
    TooLarge { size: usize, limit: usize },
    #[error("upload body is empty")]
    EmptyBody,
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),
    #[error("not an object reference: {0}")]
    InvalidPath(String),
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("metadata encoding failed: {0}")]
    Metadata(#[from] serde_json::Error),
}

impl ErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_OBJECT_NOT_FOUND",
            Self::TicketRejected(_) => "E_TICKET_REJECTED",
            Self::TooLarge { .. } => "E_UPLOAD_TOO_LARGE",
            Self::EmptyBody => "E_EMPTY_BODY",
            Self::UnsupportedContentType(_) => "E_UNSUPPORTED_CONTENT_TYPE",
            Self::InvalidPath(_) => "E_INVALID_OBJECT_PATH",
            Self::Io(_) => "E_STORAGE_IO",
            Self::Metadata(_) => "E_STORAGE_METADATA",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::TicketRejected(_) => StatusCode::FORBIDDEN,
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnsupportedContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::EmptyBody | Self::InvalidPath(_) => StatusCode::BAD_REQUEST,
            Self::Io(_) | Self::Metadata(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

/// What a client needs to perform an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadGrant {
    pub object_id: Uuid,
    pub upload_url: String,
}

/// Open the backend selected by config.
///
/// # Errors
///
/// Returns `Io` if the filesystem root cannot be created.
pub async fn open_store(config: &StudioConfig) -> Result<Arc<dyn ObjectStore>, StorageError> {
    let store: Arc<dyn ObjectStore> = match config.storage_backend {
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::Fs => Arc::new(fs::FsStore::open(&config.storage_dir).await?),
    };
    Ok(store)
}

#[must_use]
pub fn object_path(id: Uuid) -> String {
    format!("{OBJECT_PATH_PREFIX}{id}")
}

/// Extract the object id from an upload URL or an object path.
///
/// Accepts absolute or relative forms of `/api/objects/uploads/<id>` (any
/// query string ignored) and `/objects/uploads/<id>`.
///
/// # Errors
///
/// Returns `InvalidPath` if neither form matches.
pub fn parse_object_ref(raw: &str) -> Result<Uuid, StorageError> {
    let invalid = || StorageError::InvalidPath(raw.to_string());
    let trimmed = raw.trim();
    let without_query = trimmed.split(['?', '#']).next().unwrap_or_default();

    let path = match without_query.find("://") {
        Some(i) => {
            let after_scheme = &without_query[i + 3..];
            let slash = after_scheme.find('/').ok_or_else(invalid)?;
            &after_scheme[slash..]
        }
        None => without_query,
    };

    let id = path
        .strip_prefix(UPLOAD_PATH_PREFIX)
        .or_else(|| path.strip_prefix(OBJECT_PATH_PREFIX))
        .ok_or_else(invalid)?;
    Uuid::parse_str(id.trim_end_matches('/')).map_err(|_| invalid())
}

/// Object storage with upload tickets, size limits, and ACL.
pub struct StorageService {
    store: Arc<dyn ObjectStore>,
    tickets: UploadTickets,
    max_upload_bytes: usize,
    public_base_url: String,
}

impl StorageService {
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, config: &StudioConfig) -> Self {
        Self {
            store,
            tickets: UploadTickets::new(Duration::from_secs(config.upload_ticket_ttl_secs)),
            max_upload_bytes: config.max_upload_bytes,
            public_base_url: config.public_base_url.clone(),
        }
    }

    #[must_use]
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Absolute public URL of an object path.
    #[must_use]
    pub fn public_url(&self, path: &str) -> String {
        format!("{}{path}", self.public_base_url)
    }

    /// Issue an upload ticket and its URL.
    pub fn request_upload(&self) -> UploadGrant {
        let ticket = self.tickets.issue(Instant::now());
        let upload_url = format!(
            "{}{UPLOAD_PATH_PREFIX}{}?token={}",
            self.public_base_url, ticket.object_id, ticket.token
        );
        tracing::debug!(object_id = %ticket.object_id, "upload ticket issued");
        UploadGrant { object_id: ticket.object_id, upload_url }
    }

    /// Store the bytes of a ticketed upload as a private object.
    ///
    /// # Errors
    ///
    /// Returns a body validation error, `TicketRejected`, or a backend error.
    pub async fn accept_upload(
        &self,
        object_id: Uuid,
        token: &str,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<ObjectMeta, StorageError> {
        self.tickets
            .check(object_id, token, Instant::now())
            .map_err(StorageError::TicketRejected)?;
        let content_type = self.validate_body(content_type, &bytes)?;
        let ticket = self
            .tickets
            .redeem(object_id, token, Instant::now())
            .map_err(StorageError::TicketRejected)?;

        let meta = ObjectMeta {
            id: object_id,
            content_type,
            size: bytes.len() as u64,
            sha256: sha256_hex(&bytes),
            visibility: Visibility::Private,
            uploaded_at: OffsetDateTime::now_utc(),
        };
        if let Err(err) = self.store.put(meta.clone(), bytes).await {
            tracing::warn!(%object_id, error = %err, "object write failed; ticket restored");
            self.tickets.restore(ticket);
            return Err(err);
        }
        tracing::info!(%object_id, size = meta.size, content_type = %meta.content_type, "object uploaded");
        Ok(meta)
    }

    /// Make an uploaded object public and return its object path.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPath` for an unrecognised reference and `NotFound`
    /// when nothing was uploaded under it.
    pub async fn publish(&self, reference: &str) -> Result<String, StorageError> {
        let id = parse_object_ref(reference)?;
        self.store
            .set_visibility(id, Visibility::Public)
            .await?
            .ok_or(StorageError::NotFound(id))?;
        tracing::info!(object_id = %id, "object published");
        Ok(object_path(id))
    }

    /// Fetch a public object. Private objects read as not found.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a backend error.
    pub async fn fetch_public(&self, id: Uuid) -> Result<StoredObject, StorageError> {
        match self.store.get(id).await? {
            Some(obj) if obj.meta.visibility == Visibility::Public => Ok(obj),
            _ => Err(StorageError::NotFound(id)),
        }
    }

    fn validate_body(&self, content_type: Option<&str>, bytes: &[u8]) -> Result<String, StorageError> {
        if bytes.is_empty() {
            return Err(StorageError::EmptyBody);
        }
        if bytes.len() > self.max_upload_bytes {
            return Err(StorageError::TooLarge { size: bytes.len(), limit: self.max_upload_bytes });
        }

        let mime = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase())
            .unwrap_or_default();
        // SVG can carry script and would be served from our origin.
        if !mime.starts_with("image/") || mime.starts_with("image/svg") {
            return Err(StorageError::UnsupportedContentType(mime));
        }
        if image::guess_format(bytes).is_err() {
            return Err(StorageError::UnsupportedContentType(format!("{mime} (unrecognised bytes)")));
        }
        Ok(mime)
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
