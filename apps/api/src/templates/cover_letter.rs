use std::fmt::Write;

use crate::models::application::CoverLetter;
use crate::models::profile::ResumeContent;
use crate::templates::resume::write_header;
use crate::templates::{page, text, Medium, Skin};

const LETTER_CSS: &str = "\
.recipient{margin:1.5em 0 1em}\
.letter p{margin:0 0 .9em}\
.signature{margin-top:2em}";

/// Renders a cover letter under the sender's resume letterhead.
pub fn render_cover_letter(
    letter: &CoverLetter,
    sender: &ResumeContent,
    company: &str,
    skin: Skin,
    medium: Medium,
) -> String {
    let mut body = String::new();
    write_header(&mut body, sender);

    if !company.trim().is_empty() {
        let _ = write!(body, r#"<p class="recipient">{}</p>"#, text(company));
    }

    body.push_str(r#"<section class="letter">"#);
    if !letter.greeting.trim().is_empty() {
        let _ = write!(body, "<p>{}</p>", text(&letter.greeting));
    }
    for paragraph in letter.paragraphs.iter().filter(|p| !p.trim().is_empty()) {
        let _ = write!(body, "<p>{}</p>", text(paragraph));
    }

    let signature = if letter.signature.trim().is_empty() {
        sender.full_name.as_str()
    } else {
        letter.signature.as_str()
    };
    body.push_str(r#"<p class="signature">"#);
    if !letter.closing.trim().is_empty() {
        let _ = write!(body, "{}<br>", text(&letter.closing));
    }
    body.push_str(&text(signature));
    body.push_str("</p></section>");

    let title = format!("Cover letter — {company}");
    page(&title, skin, medium, LETTER_CSS, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letter() -> CoverLetter {
        CoverLetter {
            greeting: "Dear hiring team,".into(),
            paragraphs: vec!["First & foremost.".into(), "".into(), "Second.".into()],
            closing: "Sincerely,".into(),
            signature: String::new(),
        }
    }

    fn sender() -> ResumeContent {
        ResumeContent {
            full_name: "Grace Hopper".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_paragraphs_rendered_and_blank_skipped() {
        let html = render_cover_letter(&letter(), &sender(), "Acme", Skin::Classic, Medium::Screen);
        assert!(html.contains("<p>First &amp; foremost.</p>"));
        assert!(html.contains("<p>Second.</p>"));
        assert!(!html.contains("<p></p>"));
    }

    #[test]
    fn test_signature_falls_back_to_sender_name() {
        let html = render_cover_letter(&letter(), &sender(), "Acme", Skin::Minimal, Medium::Print);
        assert!(html.contains("Sincerely,<br>Grace Hopper"));
        assert!(html.contains("@page"));
    }

    #[test]
    fn test_company_is_escaped() {
        let html = render_cover_letter(
            &letter(),
            &sender(),
            "<Evil> Corp",
            Skin::Modern,
            Medium::Screen,
        );
        assert!(html.contains("&lt;Evil&gt; Corp"));
        assert!(!html.contains("<Evil>"));
    }
}
