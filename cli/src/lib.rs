//! HTTP client pieces of the `sigstudio` command-line tool.
//!
//! | Module | Role |
//! |--------|------|
//! | [`client`] | Thin REST client plus the template client |
//! | [`icons`] | Contact-icon uploader with a per-key URL cache |

pub mod client;
pub mod icons;

pub use client::{ApiClient, ClientError, TemplateClient, TemplateSummary};
pub use icons::{IconUploader, IconUrl};
