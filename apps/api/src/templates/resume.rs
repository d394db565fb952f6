use std::fmt::Write;

use crate::models::profile::{format_date_range, ResumeContent};
use crate::templates::{attr, page, text, write_link, write_list, Medium, Skin};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Summary,
    Experience,
    Projects,
    Education,
    Skills,
}

fn section_order(skin: Skin) -> [Section; 5] {
    use Section::*;
    match skin {
        // Creative leads with skills; everything else is chronological-first.
        Skin::Creative => [Summary, Skills, Experience, Projects, Education],
        Skin::Executive => [Summary, Experience, Education, Projects, Skills],
        _ => [Summary, Experience, Projects, Education, Skills],
    }
}

pub fn render_resume(resume: &ResumeContent, skin: Skin, medium: Medium) -> String {
    let mut body = String::new();
    write_header(&mut body, resume);
    for section in section_order(skin) {
        match section {
            Section::Summary => write_summary(&mut body, resume),
            Section::Experience => write_experience(&mut body, resume),
            Section::Projects => write_projects(&mut body, resume),
            Section::Education => write_education(&mut body, resume),
            Section::Skills => write_skills(&mut body, resume),
        }
    }

    let title = if resume.full_name.trim().is_empty() {
        "Resume".to_string()
    } else {
        format!("{} — Resume", resume.full_name)
    };
    page(&title, skin, medium, RESUME_CSS, &body)
}

const RESUME_CSS: &str = "\
header.resume-head{margin-bottom:.8em}\
.headline{font-size:1.1em;margin:.15em 0}\
.skills{display:flex;flex-wrap:wrap;gap:.3em .8em;list-style:none;margin-left:0}";

/// Name, headline and contact line. Shared with the cover letter letterhead.
pub(crate) fn write_header(out: &mut String, resume: &ResumeContent) {
    out.push_str(r#"<header class="resume-head">"#);
    if !resume.full_name.trim().is_empty() {
        let _ = write!(out, "<h1>{}</h1>", text(&resume.full_name));
    }
    if !resume.headline.trim().is_empty() {
        let _ = write!(out, r#"<p class="headline">{}</p>"#, text(&resume.headline));
    }
    let lines = resume.contact.lines();
    if !lines.is_empty() {
        out.push_str(r#"<p class="contact">"#);
        for line in lines {
            out.push_str("<span>");
            write_link(out, line);
            out.push_str("</span>");
        }
        out.push_str("</p>");
    }
    out.push_str("</header>");
}

fn write_summary(out: &mut String, resume: &ResumeContent) {
    if resume.summary.trim().is_empty() {
        return;
    }
    let _ = write!(
        out,
        r#"<section class="summary"><h2>Summary</h2><p>{}</p></section>"#,
        text(&resume.summary)
    );
}

fn write_experience(out: &mut String, resume: &ResumeContent) {
    if resume.experience.is_empty() {
        return;
    }
    out.push_str(r#"<section class="experience"><h2>Experience</h2>"#);
    for entry in &resume.experience {
        let _ = write!(
            out,
            r#"<article class="entry" id="exp-{}"><div class="entry-head"><h3>{}"#,
            attr(&entry.id.to_string()),
            text(&entry.role)
        );
        if !entry.company.trim().is_empty() {
            let _ = write!(out, r#" <span class="muted">· {}</span>"#, text(&entry.company));
        }
        out.push_str("</h3>");
        let dates = format_date_range(entry.start_date, entry.end_date);
        if !dates.is_empty() {
            let _ = write!(out, r#"<span class="muted">{}</span>"#, text(&dates));
        }
        out.push_str("</div>");
        if let Some(location) = entry.location.as_deref().filter(|l| !l.trim().is_empty()) {
            let _ = write!(out, r#"<div class="muted">{}</div>"#, text(location));
        }
        write_list(out, "bullets", &entry.bullets);
        write_tags(out, &entry.tech_stack);
        out.push_str("</article>");
    }
    out.push_str("</section>");
}

fn write_projects(out: &mut String, resume: &ResumeContent) {
    if resume.projects.is_empty() {
        return;
    }
    out.push_str(r#"<section class="projects"><h2>Projects</h2>"#);
    for project in &resume.projects {
        out.push_str(r#"<article class="entry"><div class="entry-head"><h3>"#);
        out.push_str(&text(&project.name));
        out.push_str("</h3>");
        if let Some(url) = project.url.as_deref().filter(|u| !u.trim().is_empty()) {
            out.push_str(r#"<span class="muted">"#);
            write_link(out, url);
            out.push_str("</span>");
        }
        out.push_str("</div>");
        if !project.description.trim().is_empty() {
            let _ = write!(out, "<p>{}</p>", text(&project.description));
        }
        write_list(out, "bullets", &project.bullets);
        write_tags(out, &project.tech_stack);
        out.push_str("</article>");
    }
    out.push_str("</section>");
}

fn write_education(out: &mut String, resume: &ResumeContent) {
    if resume.education.is_empty() {
        return;
    }
    out.push_str(r#"<section class="education"><h2>Education</h2>"#);
    for entry in &resume.education {
        let degree = match entry.field.as_deref().filter(|f| !f.trim().is_empty()) {
            Some(field) => format!("{}, {}", entry.degree, field),
            None => entry.degree.clone(),
        };
        let _ = write!(
            out,
            r#"<article class="entry"><div class="entry-head"><h3>{} <span class="muted">· {}</span></h3>"#,
            text(&entry.institution),
            text(&degree)
        );
        let dates = format_date_range(entry.start_date, entry.end_date);
        if !dates.is_empty() {
            let _ = write!(out, r#"<span class="muted">{}</span>"#, text(&dates));
        }
        out.push_str("</div>");
        write_list(out, "details", &entry.details);
        out.push_str("</article>");
    }
    out.push_str("</section>");
}

fn write_skills(out: &mut String, resume: &ResumeContent) {
    if resume.skills.iter().all(|s| s.trim().is_empty()) {
        return;
    }
    out.push_str(r#"<section class="skills-section"><h2>Skills</h2>"#);
    write_list(out, "skills", &resume.skills);
    out.push_str("</section>");
}

fn write_tags(out: &mut String, tags: &[String]) {
    let tags: Vec<&str> = tags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    if !tags.is_empty() {
        let _ = write!(out, r#"<p class="tags">{}</p>"#, text(&tags.join(", ")));
    }
}
