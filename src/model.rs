//! Signature data model.
//!
//! DESIGN
//! ======
//! Everything here is a display record: strings the user typed, image URLs,
//! and the position of the two draggable images. The only invariants are
//! that positions stay finite, the accent color is a `#rrggbb` literal, and
//! links use a scheme that is safe to embed in an email.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;
use crate::templates::TemplateId;

pub const DEFAULT_ACCENT_COLOR: &str = "#2563eb";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ModelError {
    #[error("{element} position has a non-finite {field}")]
    NonFinite { element: &'static str, field: &'static str },
    #[error("invalid accent color: {0} (expected #rrggbb)")]
    InvalidColor(String),
    #[error("unsupported link for {platform}: {url}")]
    UnsafeLink { platform: &'static str, url: String },
}

impl ErrorCode for ModelError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NonFinite { .. } => "E_NON_FINITE_POSITION",
            Self::InvalidColor(_) => "E_INVALID_COLOR",
            Self::UnsafeLink { .. } => "E_UNSAFE_LINK",
        }
    }
}

// =============================================================================
// PERSONAL / SOCIAL / IMAGES
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersonalInfo {
    pub name: String,
    pub title: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    pub company: String,
}

/// Supported social platforms, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linkedin,
    Twitter,
    Instagram,
    Youtube,
    Tiktok,
}

impl Platform {
    pub const ALL: [Platform; 5] =
        [Platform::Linkedin, Platform::Twitter, Platform::Instagram, Platform::Youtube, Platform::Tiktok];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linkedin => "linkedin",
            Self::Twitter => "twitter",
            Self::Instagram => "instagram",
            Self::Youtube => "youtube",
            Self::Tiktok => "tiktok",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Linkedin => "LinkedIn",
            Self::Twitter => "X",
            Self::Instagram => "Instagram",
            Self::Youtube => "YouTube",
            Self::Tiktok => "TikTok",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialMedia {
    pub linkedin: String,
    pub twitter: String,
    pub instagram: String,
    pub youtube: String,
    pub tiktok: String,
}

impl SocialMedia {
    #[must_use]
    pub fn get(&self, platform: Platform) -> &str {
        match platform {
            Platform::Linkedin => &self.linkedin,
            Platform::Twitter => &self.twitter,
            Platform::Instagram => &self.instagram,
            Platform::Youtube => &self.youtube,
            Platform::Tiktok => &self.tiktok,
        }
    }

    /// Non-empty links in platform display order.
    pub fn links(&self) -> impl Iterator<Item = (Platform, &str)> {
        Platform::ALL.into_iter().filter_map(|p| {
            let url = self.get(p).trim();
            (!url.is_empty()).then_some((p, url))
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Images {
    /// URL or data URL.
    pub headshot: Option<String>,
    /// URL or data URL.
    pub logo: Option<String>,
}

// =============================================================================
// POSITION
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
}

impl Default for Position {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, scale: 1.0 }
    }
}

impl Position {
    /// # Errors
    ///
    /// Returns `NonFinite` naming the first field that is NaN or infinite.
    pub fn validate(&self, element: ElementId) -> Result<(), ModelError> {
        for (field, value) in [("x", self.x), ("y", self.y), ("scale", self.scale)] {
            if !value.is_finite() {
                return Err(ModelError::NonFinite { element: element.as_str(), field });
            }
        }
        Ok(())
    }
}

/// The draggable images of a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementId {
    Headshot,
    Logo,
}

impl ElementId {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Headshot => "headshot",
            Self::Logo => "logo",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "headshot" => Some(Self::Headshot),
            "logo" => Some(Self::Logo),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub headshot: Position,
    pub logo: Position,
}

impl Layout {
    #[must_use]
    pub fn get(&self, element: ElementId) -> Position {
        match element {
            ElementId::Headshot => self.headshot,
            ElementId::Logo => self.logo,
        }
    }

    pub fn get_mut(&mut self, element: ElementId) -> &mut Position {
        match element {
            ElementId::Headshot => &mut self.headshot,
            ElementId::Logo => &mut self.logo,
        }
    }
}

// =============================================================================
// SIGNATURE DESIGN
// =============================================================================

/// Everything needed to render one signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SignatureDesign {
    pub template: TemplateId,
    pub personal: PersonalInfo,
    pub social: SocialMedia,
    pub images: Images,
    pub layout: Layout,
    pub accent_color: String,
    /// Uploaded icon URLs per platform.
    pub icons: BTreeMap<Platform, String>,
}

impl Default for SignatureDesign {
    fn default() -> Self {
        Self {
            template: TemplateId::default(),
            personal: PersonalInfo::default(),
            social: SocialMedia::default(),
            images: Images::default(),
            layout: Layout::default(),
            accent_color: DEFAULT_ACCENT_COLOR.to_string(),
            icons: BTreeMap::new(),
        }
    }
}

impl SignatureDesign {
    /// # Errors
    ///
    /// Returns the first invariant violation found.
    pub fn validate(&self) -> Result<(), ModelError> {
        self.layout.headshot.validate(ElementId::Headshot)?;
        self.layout.logo.validate(ElementId::Logo)?;

        if !is_hex_color(&self.accent_color) {
            return Err(ModelError::InvalidColor(self.accent_color.clone()));
        }

        for (platform, url) in self.social.links() {
            if normalize_web_url(url).is_none() {
                return Err(ModelError::UnsafeLink { platform: platform.as_str(), url: url.to_string() });
            }
        }
        Ok(())
    }
}

/// `#rrggbb`, case-insensitive.
#[must_use]
pub fn is_hex_color(raw: &str) -> bool {
    raw.len() == 7
        && raw.starts_with('#')
        && raw[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Normalize a user-entered web link.
///
/// Bare hosts get `https://`. Anything with a scheme other than http(s)
/// yields `None`.
#[must_use]
pub fn normalize_web_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Some(trimmed.to_string());
    }
    if let Some(rest) = trimmed.strip_prefix("//") {
        return Some(format!("https://{rest}"));
    }
    if has_scheme(trimmed) {
        return None;
    }
    Some(format!("https://{trimmed}"))
}

/// Whether the string begins with `scheme:` (RFC 3986 scheme characters).
fn has_scheme(raw: &str) -> bool {
    let Some((scheme, rest)) = raw.split_once(':') else {
        return false;
    };
    // `localhost:3000/me` has a port, not a scheme.
    let port = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let mut chars = scheme.chars();
    let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    // `example.com:8080/path` has a port, not a scheme.
    starts_alpha
        && !scheme.contains('.')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
