//! Contact-icon uploads.
//!
//! DESIGN
//! ======
//! Uploading an icon takes three requests: ask for an upload URL, PUT the
//! bytes there, then register the URL as a contact icon, which publishes it.
//! Successful results are cached per caller-chosen key, so repeated icons
//! cost nothing. A failed upload is logged and the icon degrades to an
//! inline `data:` URL; that fallback is not cached, so a later call for the
//! same key tries the network again.

use std::collections::HashMap;

use sigstudio::imaging::export::data_url;

use crate::client::{ApiClient, ClientError};

/// Where an icon ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconUrl {
    /// Absolute URL of a published object.
    Remote(String),
    /// `data:` URL carrying the bytes themselves.
    Inline(String),
}

impl IconUrl {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Remote(url) | Self::Inline(url) => url,
        }
    }

    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    #[must_use]
    pub fn into_string(self) -> String {
        match self {
            Self::Remote(url) | Self::Inline(url) => url,
        }
    }
}

pub struct IconUploader {
    client: ApiClient,
    cache: HashMap<String, String>,
}

impl IconUploader {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client, cache: HashMap::new() }
    }

    /// Cached remote URL for `key`, if any.
    #[must_use]
    pub fn cached(&self, key: &str) -> Option<&str> {
        self.cache.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Upload `bytes` under `key`, or return the URL cached for it.
    pub async fn upload_icon(&mut self, key: &str, bytes: &[u8], content_type: &str) -> IconUrl {
        if let Some(url) = self.cache.get(key) {
            tracing::debug!(key, "icon cache hit");
            return IconUrl::Remote(url.clone());
        }

        match self.try_upload(bytes, content_type).await {
            Ok(url) => {
                tracing::info!(key, %url, "icon uploaded");
                self.cache.insert(key.to_owned(), url.clone());
                IconUrl::Remote(url)
            }
            Err(error) => {
                tracing::warn!(key, %error, "icon upload failed; inlining as data URL");
                IconUrl::Inline(data_url(content_type, bytes))
            }
        }
    }

    async fn try_upload(&self, bytes: &[u8], content_type: &str) -> Result<String, ClientError> {
        let upload_url = self.client.request_upload_url().await?;
        self.client
            .put_object(&upload_url, bytes.to_vec(), content_type)
            .await?;
        let object_path = self.client.register_contact_icon(&upload_url).await?;
        Ok(self.client.absolute(&object_path))
    }
}
