//! Plain-text alternative for `multipart/alternative` mail bodies.

use crate::model::{SignatureDesign, normalize_web_url};

/// Render the signature as plain text, one fact per line.
#[must_use]
pub fn render_text(design: &SignatureDesign) -> String {
    let p = &design.personal;
    let mut lines: Vec<String> = Vec::new();

    if !p.name.trim().is_empty() {
        lines.push(p.name.trim().to_string());
    }
    let role: Vec<&str> = [p.title.trim(), p.company.trim()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();
    if !role.is_empty() {
        lines.push(role.join(" | "));
    }
    if !p.phone.trim().is_empty() {
        lines.push(format!("Phone: {}", p.phone.trim()));
    }
    if !p.email.trim().is_empty() {
        lines.push(format!("Email: {}", p.email.trim()));
    }
    if let Some(url) = normalize_web_url(&p.website) {
        lines.push(format!("Web: {url}"));
    }
    for (platform, raw) in design.social.links() {
        if let Some(url) = normalize_web_url(raw) {
            lines.push(format!("{}: {url}", platform.label()));
        }
    }

    if lines.is_empty() {
        return String::new();
    }
    // RFC 3676 signature separator.
    format!("-- \n{}\n", lines.join("\n"))
}
