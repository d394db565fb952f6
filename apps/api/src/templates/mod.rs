//! HTML templates for resumes, cover letters and portfolio pages.
//!
//! Every template is a pure function from document data to a complete HTML
//! page. A [`Skin`] picks the typography and colour tokens; a [`Medium`] picks
//! between an on-screen preview and a print-ready page. All user text passes
//! through [`text`] or [`attr`] before it reaches the output.

pub mod cover_letter;
pub mod portfolio;
pub mod resume;

use std::borrow::Cow;
use std::fmt::Write;

use serde::{Deserialize, Serialize};

pub use cover_letter::render_cover_letter;
pub use portfolio::render_portfolio;
pub use resume::render_resume;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skin {
    #[default]
    Classic,
    Modern,
    Minimal,
    Executive,
    Creative,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Medium {
    #[default]
    Screen,
    Print,
}

/// Which generated document of an application to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Resume,
    CoverLetter,
    Portfolio,
}

/// Design tokens for one skin.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub body_font: &'static str,
    pub heading_font: &'static str,
    pub text: &'static str,
    pub muted: &'static str,
    pub accent: &'static str,
    pub heading_transform: &'static str,
    /// Draw a rule under section headings.
    pub section_rule: bool,
    pub base_size_pt: f32,
}

impl Skin {
    #[cfg(test)]
    pub const ALL: [Skin; 5] = [
        Skin::Classic,
        Skin::Modern,
        Skin::Minimal,
        Skin::Executive,
        Skin::Creative,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Skin::Classic => "classic",
            Skin::Modern => "modern",
            Skin::Minimal => "minimal",
            Skin::Executive => "executive",
            Skin::Creative => "creative",
        }
    }

    pub fn theme(&self) -> Theme {
        match self {
            Skin::Classic => Theme {
                body_font: "Georgia, 'Times New Roman', serif",
                heading_font: "Georgia, 'Times New Roman', serif",
                text: "#1a1a1a",
                muted: "#555555",
                accent: "#1a1a1a",
                heading_transform: "uppercase",
                section_rule: true,
                base_size_pt: 11.0,
            },
            Skin::Modern => Theme {
                body_font: "Inter, 'Helvetica Neue', Arial, sans-serif",
                heading_font: "Inter, 'Helvetica Neue', Arial, sans-serif",
                text: "#1f2933",
                muted: "#616e7c",
                accent: "#2563eb",
                heading_transform: "none",
                section_rule: false,
                base_size_pt: 10.5,
            },
            Skin::Minimal => Theme {
                body_font: "'Helvetica Neue', Arial, sans-serif",
                heading_font: "'Helvetica Neue', Arial, sans-serif",
                text: "#222222",
                muted: "#777777",
                accent: "#222222",
                heading_transform: "lowercase",
                section_rule: false,
                base_size_pt: 10.0,
            },
            Skin::Executive => Theme {
                body_font: "Garamond, 'EB Garamond', Georgia, serif",
                heading_font: "'Playfair Display', Georgia, serif",
                text: "#111827",
                muted: "#4b5563",
                accent: "#7c2d12",
                heading_transform: "uppercase",
                section_rule: true,
                base_size_pt: 11.5,
            },
            Skin::Creative => Theme {
                body_font: "'Source Sans 3', 'Segoe UI', sans-serif",
                heading_font: "'Space Grotesk', 'Segoe UI', sans-serif",
                text: "#1e1b4b",
                muted: "#6b7280",
                accent: "#db2777",
                heading_transform: "none",
                section_rule: false,
                base_size_pt: 10.5,
            },
        }
    }
}

impl Medium {
    pub fn name(&self) -> &'static str {
        match self {
            Medium::Screen => "screen",
            Medium::Print => "print",
        }
    }
}

/// Escapes text content.
pub(crate) fn text(s: &str) -> Cow<'_, str> {
    html_escape::encode_text(s)
}

/// Escapes a double-quoted attribute value.
pub(crate) fn attr(s: &str) -> Cow<'_, str> {
    html_escape::encode_double_quoted_attribute(s)
}

/// A link target for user-entered contact data, or `None` if it should be
/// shown as plain text. Only web and mail links are produced.
pub(crate) fn safe_href(value: &str) -> Option<String> {
    let value = value.trim();
    let lower = value.to_ascii_lowercase();
    if lower.starts_with("https://") || lower.starts_with("http://") {
        Some(value.to_string())
    } else if lower.starts_with("mailto:") {
        Some(value.to_string())
    } else if value.contains('@') && !value.contains(char::is_whitespace) {
        Some(format!("mailto:{value}"))
    } else if lower.starts_with("www.")
        || lower.starts_with("github.com/")
        || lower.starts_with("linkedin.com/")
    {
        Some(format!("https://{value}"))
    } else {
        None
    }
}

/// Writes `value` as a link when it has a safe target, otherwise as text.
pub(crate) fn write_link(out: &mut String, value: &str) {
    match safe_href(value) {
        Some(href) => {
            let _ = write!(out, r#"<a href="{}">{}</a>"#, attr(&href), text(value));
        }
        None => out.push_str(&text(value)),
    }
}

/// Writes a `<ul>` of non-blank items; nothing for an empty list.
pub(crate) fn write_list(out: &mut String, class: &str, items: &[String]) {
    let items: Vec<&String> = items.iter().filter(|i| !i.trim().is_empty()).collect();
    if items.is_empty() {
        return;
    }
    let _ = write!(out, r#"<ul class="{}">"#, attr(class));
    for item in items {
        let _ = write!(out, "<li>{}</li>", text(item));
    }
    out.push_str("</ul>");
}

const BASE_CSS: &str = "\
*{box-sizing:border-box}\
body{margin:0;font-family:var(--body-font);color:var(--text);font-size:var(--base-size);line-height:1.45}\
h1,h2,h3{font-family:var(--heading-font);margin:0}\
h1{font-size:2em;color:var(--accent)}\
h2{font-size:1.05em;margin-top:1.2em;margin-bottom:.4em;text-transform:var(--heading-transform);letter-spacing:.04em;color:var(--accent)}\
h3{font-size:1em}\
.muted{color:var(--muted)}\
ul{margin:.25em 0 .5em 1.2em;padding:0}\
li{margin:.1em 0}\
a{color:var(--accent)}\
.entry{margin-bottom:.7em}\
.entry-head{display:flex;justify-content:space-between;gap:1em}\
.tags{color:var(--muted);font-size:.9em}\
.contact{color:var(--muted)}\
.contact span+span:before{content:' \\00b7 '}";

const SCREEN_CSS: &str = "\
body{background:#eef0f3}\
.sheet{max-width:8.5in;margin:2rem auto;padding:.75in;background:#fff;box-shadow:0 2px 12px rgba(0,0,0,.12)}";

const PRINT_CSS: &str = "\
@page{size:Letter;margin:.75in}\
body{background:#fff}\
.sheet{margin:0;padding:0;box-shadow:none;max-width:none}\
a{color:inherit;text-decoration:none}\
.entry,li{break-inside:avoid}";

/// Wraps a rendered body in a complete HTML page styled for `skin` and `medium`.
pub(crate) fn page(title: &str, skin: Skin, medium: Medium, extra_css: &str, body: &str) -> String {
    let theme = skin.theme();
    let mut out = String::with_capacity(body.len() + 4096);
    out.push_str("<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">");
    if medium == Medium::Screen {
        out.push_str(r#"<meta name="viewport" content="width=device-width, initial-scale=1">"#);
    }
    let _ = write!(out, "<title>{}</title><style>", text(title));
    let _ = write!(
        out,
        ":root{{--body-font:{};--heading-font:{};--text:{};--muted:{};--accent:{};\
         --heading-transform:{};--base-size:{}pt}}",
        theme.body_font,
        theme.heading_font,
        theme.text,
        theme.muted,
        theme.accent,
        theme.heading_transform,
        theme.base_size_pt,
    );
    out.push_str(BASE_CSS);
    if theme.section_rule {
        out.push_str("h2{border-bottom:1px solid var(--accent);padding-bottom:.15em}");
    }
    out.push_str(match medium {
        Medium::Screen => SCREEN_CSS,
        Medium::Print => PRINT_CSS,
    });
    out.push_str(extra_css);
    let _ = write!(
        out,
        r#"</style></head><body class="skin-{} medium-{}"><main class="sheet">{}</main></body></html>"#,
        skin.name(),
        medium.name(),
        body
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skin_and_medium_parse_snake_case() {
        let skin: Skin = serde_json::from_str(r#""executive""#).unwrap();
        assert_eq!(skin, Skin::Executive);
        let medium: Medium = serde_json::from_str(r#""print""#).unwrap();
        assert_eq!(medium, Medium::Print);
        let kind: DocumentKind = serde_json::from_str(r#""cover_letter""#).unwrap();
        assert_eq!(kind, DocumentKind::CoverLetter);
    }

    #[test]
    fn test_every_skin_has_distinct_name() {
        let mut names: Vec<&str> = Skin::ALL.iter().map(Skin::name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Skin::ALL.len());
    }

    #[test]
    fn test_print_page_has_page_rule() {
        let html = page("T", Skin::Classic, Medium::Print, "", "<p>x</p>");
        assert!(html.contains("@page{size:Letter"));
        assert!(!html.contains("box-shadow:0 2px"));
        assert!(html.contains(r#"class="skin-classic medium-print""#));
    }

    #[test]
    fn test_screen_page_has_no_page_rule() {
        let html = page("T", Skin::Modern, Medium::Screen, "", "");
        assert!(!html.contains("@page"));
        assert!(html.contains("--accent:#2563eb"));
    }

    #[test]
    fn test_title_is_escaped() {
        let html = page("<script>", Skin::Classic, Medium::Screen, "", "");
        assert!(html.contains("<title>&lt;script&gt;</title>"));
    }

    #[test]
    fn test_safe_href_rejects_script_urls() {
        assert_eq!(safe_href("javascript:alert(1)"), None);
        assert_eq!(
            safe_href("ada@example.com").as_deref(),
            Some("mailto:ada@example.com")
        );
        assert_eq!(
            safe_href("github.com/ada").as_deref(),
            Some("https://github.com/ada")
        );
        assert_eq!(safe_href("London, UK"), None);
    }

    #[test]
    fn test_write_list_skips_blank_items() {
        let mut out = String::new();
        write_list(&mut out, "bullets", &["a".into(), " ".into()]);
        assert_eq!(out, r#"<ul class="bullets"><li>a</li></ul>"#);

        let mut empty = String::new();
        write_list(&mut empty, "bullets", &[" ".into()]);
        assert!(empty.is_empty());
    }
}
