//! HTML renderer.
//!
//! Output is table-based with inline styles, the lowest common denominator
//! email clients agree on. All user text passes through [`escape_html`];
//! every `href`/`src` is rebuilt from an allow-listed scheme or dropped.

use crate::drag::{MAX_SCALE, MIN_SCALE};
use crate::model::{
    DEFAULT_ACCENT_COLOR, ElementId, Platform, Position, SignatureDesign, is_hex_color, normalize_web_url,
};
use crate::templates::{Arrangement, Template, TemplateId};

const SOCIAL_ICON_PX: u32 = 20;
const TEXT_COLOR: &str = "#1f2937";
const MUTED_COLOR: &str = "#6b7280";

/// Escape text for use in element content and quoted attributes.
#[must_use]
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the signature as an HTML fragment.
#[must_use]
pub fn render_html(design: &SignatureDesign) -> String {
    let tpl = design.template.template();
    let accent = if is_hex_color(&design.accent_color) { design.accent_color.as_str() } else { DEFAULT_ACCENT_COLOR };

    let headshot = design
        .images
        .headshot
        .as_deref()
        .and_then(|src| image_tag(tpl, design, ElementId::Headshot, src));
    let logo = design
        .images
        .logo
        .as_deref()
        .and_then(|src| image_tag(tpl, design, ElementId::Logo, src));
    let text = text_block(tpl, design, accent);

    let body = match tpl.arrangement {
        Arrangement::Stacked => {
            let images: String = [headshot, logo].into_iter().flatten().collect::<Vec<_>>().join("&nbsp;");
            let image_row = if images.is_empty() {
                String::new()
            } else {
                format!(r#"<tr><td style="padding-top:8px;">{images}</td></tr>"#)
            };
            format!("<tr><td>{text}</td></tr>{image_row}")
        }
        Arrangement::SideBySide => {
            let image_cell = headshot
                .map(|img| format!(r#"<td style="padding-right:14px;vertical-align:top;">{img}</td>"#))
                .unwrap_or_default();
            let divider = if tpl.accent_rule || tpl.id == TemplateId::Modern {
                format!("border-left:{}px solid {accent};padding-left:14px;", if tpl.accent_rule { 2 } else { 4 })
            } else {
                String::new()
            };
            let logo_row = logo
                .map(|img| format!(r#"<div style="padding-top:10px;">{img}</div>"#))
                .unwrap_or_default();
            format!(r#"<tr>{image_cell}<td style="vertical-align:top;{divider}">{text}{logo_row}</td></tr>"#)
        }
        Arrangement::LogoHeader => {
            let logo_row = logo
                .map(|img| format!(r#"<tr><td style="padding-bottom:8px;">{img}</td></tr>"#))
                .unwrap_or_default();
            let headshot_cell = headshot
                .map(|img| format!(r#"<td style="padding-right:12px;vertical-align:top;">{img}</td>"#))
                .unwrap_or_default();
            format!(
                r#"{logo_row}<tr><td style="border-top:2px solid {accent};padding-top:8px;"><table cellpadding="0" cellspacing="0" border="0" role="presentation"><tr>{headshot_cell}<td style="vertical-align:top;">{text}</td></tr></table></td></tr>"#
            )
        }
        Arrangement::Freeform => {
            let head = headshot.unwrap_or_default();
            let logo = logo.unwrap_or_default();
            format!(r#"<tr><td style="position:relative;">{head}{text}{logo}</td></tr>"#)
        }
    };

    format!(
        r#"<table cellpadding="0" cellspacing="0" border="0" role="presentation" data-template="{id}" style="font-family:{font};color:{TEXT_COLOR};font-size:13px;line-height:1.4;">{body}</table>"#,
        id = tpl.id.as_str(),
        font = escape_html(tpl.font_family),
    )
}

fn text_block(tpl: &Template, design: &SignatureDesign, accent: &str) -> String {
    let p = &design.personal;
    let mut parts = Vec::new();

    if !p.name.trim().is_empty() {
        parts.push(format!(
            r#"<div style="font-size:{}px;font-weight:bold;color:{accent};">{}</div>"#,
            tpl.name_px,
            escape_html(p.name.trim())
        ));
    }

    let role: Vec<String> = [p.title.trim(), p.company.trim()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .map(escape_html)
        .collect();
    if !role.is_empty() {
        parts.push(format!(r#"<div style="color:{MUTED_COLOR};">{}</div>"#, role.join(" | ")));
    }

    let mut contact = Vec::new();
    if !p.phone.trim().is_empty() {
        let label = escape_html(p.phone.trim());
        let line = match tel_href(&p.phone) {
            Some(href) => format!(r#"<a href="{href}" style="color:{TEXT_COLOR};text-decoration:none;">{label}</a>"#),
            None => label,
        };
        // The phone line leads for sales layouts.
        if tpl.id == TemplateId::SalesProfessional {
            contact.push(format!(r#"<strong style="color:{accent};">{line}</strong>"#));
        } else {
            contact.push(line);
        }
    }
    if !p.email.trim().is_empty() {
        let label = escape_html(p.email.trim());
        contact.push(match mailto_href(&p.email) {
            Some(href) => format!(r#"<a href="{href}" style="color:{accent};text-decoration:none;">{label}</a>"#),
            None => label,
        });
    }
    if let Some(url) = normalize_web_url(&p.website) {
        contact.push(format!(
            r#"<a href="{}" style="color:{accent};text-decoration:none;">{}</a>"#,
            escape_html(&url),
            escape_html(display_host(p.website.trim()))
        ));
    }
    if !contact.is_empty() {
        let rule = if tpl.accent_rule && tpl.arrangement != Arrangement::SideBySide {
            format!("border-top:1px solid {accent};margin-top:4px;")
        } else {
            String::new()
        };
        parts.push(format!(r#"<div style="padding-top:4px;{rule}">{}</div>"#, contact.join("<br>")));
    }

    let social = social_row(design, accent);
    if !social.is_empty() {
        parts.push(format!(r#"<div style="padding-top:6px;">{social}</div>"#));
    }

    parts.concat()
}

fn social_row(design: &SignatureDesign, accent: &str) -> String {
    design
        .social
        .links()
        .filter_map(|(platform, raw)| {
            let href = escape_html(&normalize_web_url(raw)?);
            Some(match icon_src(design, platform) {
                Some(src) => format!(
                    r#"<a href="{href}" style="text-decoration:none;"><img src="{src}" alt="{label}" width="{SOCIAL_ICON_PX}" height="{SOCIAL_ICON_PX}" style="border:0;vertical-align:middle;"></a>"#,
                    label = platform.label()
                ),
                None => format!(
                    r#"<a href="{href}" style="color:{accent};text-decoration:none;">{}</a>"#,
                    platform.label()
                ),
            })
        })
        .collect::<Vec<_>>()
        .join("&nbsp;&nbsp;")
}

fn icon_src(design: &SignatureDesign, platform: Platform) -> Option<String> {
    design.icons.get(&platform).and_then(|url| safe_image_src(url))
}

fn image_tag(tpl: &Template, design: &SignatureDesign, element: ElementId, src: &str) -> Option<String> {
    let src = safe_image_src(src)?;
    let pos = design.layout.get(element);
    let base = match element {
        ElementId::Headshot => tpl.headshot_px,
        ElementId::Logo => tpl.logo_px,
    };
    let width = scaled_width(base, pos);

    let mut style = String::from("border:0;display:block;");
    if element == ElementId::Headshot && matches!(tpl.id, TemplateId::Modern | TemplateId::SalesProfessional) {
        style.push_str("border-radius:50%;");
    }
    if tpl.arrangement == Arrangement::Freeform {
        style = format!(
            "border:0;display:inline-block;position:relative;left:{}px;top:{}px;",
            round_px(pos.x),
            round_px(pos.y)
        );
    }

    let alt = match element {
        ElementId::Headshot => escape_html(design.personal.name.trim()),
        ElementId::Logo => escape_html(design.personal.company.trim()),
    };
    Some(format!(
        r#"<img src="{src}" alt="{alt}" width="{width}" style="{style}" data-element="{}">"#,
        element.as_str()
    ))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scaled_width(base: u32, pos: Position) -> u32 {
    let scale = if pos.scale.is_finite() { pos.scale.clamp(MIN_SCALE, MAX_SCALE) } else { 1.0 };
    (f64::from(base) * scale).round().max(1.0) as u32
}

#[allow(clippy::cast_possible_truncation)]
fn round_px(v: f64) -> i64 {
    if v.is_finite() { v.round() as i64 } else { 0 }
}

/// Escaped `src` for http(s) URLs and inline raster data URLs.
fn safe_image_src(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let lower = trimmed.to_ascii_lowercase();
    let allowed = lower.starts_with("https://")
        || lower.starts_with("http://")
        || (lower.starts_with("data:image/") && !lower.starts_with("data:image/svg"));
    allowed.then(|| escape_html(trimmed))
}

/// `tel:` link keeping only digits and a leading `+`.
fn tel_href(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let mut digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    if trimmed.starts_with('+') {
        digits.insert(0, '+');
    }
    Some(format!("tel:{digits}"))
}

fn mailto_href(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let valid = trimmed.contains('@') && !trimmed.chars().any(|c| c.is_whitespace() || c == ':');
    valid.then(|| format!("mailto:{}", escape_html(trimmed)))
}

/// Website label without scheme or trailing slash.
fn display_host(raw: &str) -> &str {
    let without_scheme = raw
        .strip_prefix("https://")
        .or_else(|| raw.strip_prefix("http://"))
        .unwrap_or(raw);
    without_scheme.trim_end_matches('/')
}

#[cfg(test)]
#[path = "html_test.rs"]
mod tests;
