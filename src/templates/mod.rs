//! Signature templates.
//!
//! ARCHITECTURE
//! ============
//! A template is a named layout over the same [`SignatureDesign`]. The
//! catalog is static; each entry carries the layout parameters the HTML
//! renderer needs, so adding a template means adding one catalog row.
//!
//! [`SignatureDesign`]: crate::model::SignatureDesign

mod html;
mod text;

use serde::{Deserialize, Serialize};

pub use html::{escape_html, render_html};
pub use text::render_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateId {
    #[default]
    Minimal,
    SalesProfessional,
    Modern,
    Corporate,
    Creative,
}

impl TemplateId {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::SalesProfessional => "sales-professional",
            Self::Modern => "modern",
            Self::Corporate => "corporate",
            Self::Creative => "creative",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        catalog().iter().map(|t| t.id).find(|id| id.as_str() == raw.trim())
    }

    #[must_use]
    pub fn template(self) -> &'static Template {
        // Catalog order matches declaration order.
        &CATALOG[self as usize]
    }
}

/// How the images sit relative to the text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Arrangement {
    /// Text only, images below.
    Stacked,
    /// Headshot column left of the text, logo under the text.
    SideBySide,
    /// Logo as a header row above the text.
    LogoHeader,
    /// Images offset by their dragged positions.
    Freeform,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: TemplateId,
    pub name: &'static str,
    pub description: &'static str,
    pub supports_animation: bool,
    #[serde(skip)]
    pub arrangement: Arrangement,
    #[serde(skip)]
    pub font_family: &'static str,
    #[serde(skip)]
    pub name_px: u32,
    /// Headshot width at scale 1.0.
    #[serde(skip)]
    pub headshot_px: u32,
    /// Logo width at scale 1.0.
    #[serde(skip)]
    pub logo_px: u32,
    /// Draw a rule in the accent color between sections.
    #[serde(skip)]
    pub accent_rule: bool,
}

static CATALOG: [Template; 5] = [
    Template {
        id: TemplateId::Minimal,
        name: "Minimal",
        description: "Name, title and contact lines with no decoration.",
        supports_animation: false,
        arrangement: Arrangement::Stacked,
        font_family: "Arial, Helvetica, sans-serif",
        name_px: 16,
        headshot_px: 64,
        logo_px: 96,
        accent_rule: false,
    },
    Template {
        id: TemplateId::SalesProfessional,
        name: "Sales Professional",
        description: "Headshot beside contact details with a prominent phone line.",
        supports_animation: true,
        arrangement: Arrangement::SideBySide,
        font_family: "Helvetica, Arial, sans-serif",
        name_px: 18,
        headshot_px: 96,
        logo_px: 120,
        accent_rule: true,
    },
    Template {
        id: TemplateId::Modern,
        name: "Modern",
        description: "Accent bar, rounded headshot and inline social icons.",
        supports_animation: true,
        arrangement: Arrangement::SideBySide,
        font_family: "'Segoe UI', Roboto, Arial, sans-serif",
        name_px: 20,
        headshot_px: 80,
        logo_px: 100,
        accent_rule: false,
    },
    Template {
        id: TemplateId::Corporate,
        name: "Corporate",
        description: "Company logo header above a ruled contact block.",
        supports_animation: false,
        arrangement: Arrangement::LogoHeader,
        font_family: "Georgia, 'Times New Roman', serif",
        name_px: 17,
        headshot_px: 72,
        logo_px: 160,
        accent_rule: true,
    },
    Template {
        id: TemplateId::Creative,
        name: "Creative",
        description: "Freely positioned and scaled headshot and logo.",
        supports_animation: true,
        arrangement: Arrangement::Freeform,
        font_family: "Verdana, Geneva, sans-serif",
        name_px: 19,
        headshot_px: 88,
        logo_px: 110,
        accent_rule: false,
    },
];

/// Every available template, in display order.
#[must_use]
pub fn catalog() -> &'static [Template] {
    &CATALOG
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
