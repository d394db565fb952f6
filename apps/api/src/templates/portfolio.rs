use std::fmt::Write;

use crate::models::application::Portfolio;
use crate::models::profile::{format_date_range, ResumeContent};
use crate::templates::{page, text, write_link, write_list, Medium, Skin};

const PORTFOLIO_CSS: &str = "\
.hero{padding:1.5em 0 1em;border-bottom:2px solid var(--accent)}\
.tagline{font-size:1.25em;margin:.3em 0 0}\
.highlights{display:grid;grid-template-columns:repeat(auto-fit,minmax(14em,1fr));gap:1em}\
.highlight{padding:.8em;border:1px solid #e5e7eb;border-radius:6px}\
.timeline .entry{border-left:3px solid var(--accent);padding-left:.8em}\
nav.site-nav{display:flex;gap:1em;margin-bottom:1em;font-size:.9em}\
footer.site-footer{margin-top:2em;font-size:.8em;color:var(--muted)}";

/// Renders the one-page public portfolio for an application.
///
/// Screen output carries site navigation and a footer; print output drops
/// both so the page reads as a plain document.
pub fn render_portfolio(
    portfolio: &Portfolio,
    resume: &ResumeContent,
    job_title: &str,
    skin: Skin,
    medium: Medium,
) -> String {
    let mut body = String::new();

    if medium == Medium::Screen {
        body.push_str(
            r##"<nav class="site-nav screen-only"><a href="#about">About</a><a href="#highlights">Highlights</a><a href="#experience">Experience</a><a href="#contact">Contact</a></nav>"##,
        );
    }

    body.push_str(r#"<header class="hero">"#);
    let _ = write!(body, "<h1>{}</h1>", text(&resume.full_name));
    let tagline = if portfolio.tagline.trim().is_empty() {
        job_title
    } else {
        portfolio.tagline.as_str()
    };
    if !tagline.trim().is_empty() {
        let _ = write!(body, r#"<p class="tagline">{}</p>"#, text(tagline));
    }
    body.push_str("</header>");

    if !portfolio.about.trim().is_empty() {
        let _ = write!(
            body,
            r#"<section id="about"><h2>About</h2><p>{}</p></section>"#,
            text(&portfolio.about)
        );
    }

    let highlights: Vec<_> = portfolio
        .highlights
        .iter()
        .filter(|h| !h.title.trim().is_empty())
        .collect();
    if !highlights.is_empty() {
        body.push_str(r#"<section id="highlights"><h2>Highlights</h2><div class="highlights">"#);
        for highlight in highlights {
            let _ = write!(
                body,
                r#"<div class="highlight"><h3>{}</h3><p>{}</p></div>"#,
                text(&highlight.title),
                text(&highlight.description)
            );
        }
        body.push_str("</div></section>");
    }

    if !resume.experience.is_empty() {
        body.push_str(r#"<section id="experience" class="timeline"><h2>Experience</h2>"#);
        for entry in &resume.experience {
            let _ = write!(
                body,
                r#"<div class="entry"><h3>{} <span class="muted">· {}</span></h3><div class="muted">{}</div>"#,
                text(&entry.role),
                text(&entry.company),
                text(&format_date_range(entry.start_date, entry.end_date))
            );
            write_list(&mut body, "bullets", &entry.bullets);
            body.push_str("</div>");
        }
        body.push_str("</section>");
    }

    if !resume.projects.is_empty() {
        body.push_str(r#"<section id="projects"><h2>Projects</h2>"#);
        for project in &resume.projects {
            let _ = write!(body, r#"<div class="entry"><h3>{}</h3>"#, text(&project.name));
            if !project.description.trim().is_empty() {
                let _ = write!(body, "<p>{}</p>", text(&project.description));
            }
            if let Some(url) = project.url.as_deref().filter(|u| !u.trim().is_empty()) {
                body.push_str("<p>");
                write_link(&mut body, url);
                body.push_str("</p>");
            }
            body.push_str("</div>");
        }
        body.push_str("</section>");
    }

    let contact = resume.contact.lines();
    if !contact.is_empty() {
        body.push_str(r#"<section id="contact"><h2>Contact</h2><ul>"#);
        for line in contact {
            body.push_str("<li>");
            write_link(&mut body, line);
            body.push_str("</li>");
        }
        body.push_str("</ul></section>");
    }

    if medium == Medium::Screen {
        let _ = write!(
            body,
            r#"<footer class="site-footer screen-only">{} · {}</footer>"#,
            text(&resume.full_name),
            text(job_title)
        );
    }

    let title = if resume.full_name.trim().is_empty() {
        "Portfolio".to_string()
    } else {
        format!("{} — Portfolio", resume.full_name)
    };
    page(&title, skin, medium, PORTFOLIO_CSS, &body)
}
