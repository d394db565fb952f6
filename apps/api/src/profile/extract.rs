use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::prompts::{fenced, fill, GROUNDING_INSTRUCTION, STRUCTURED_SYSTEM};
use crate::llm_client::{LlmClient, StructuredTool};
use crate::models::profile::{
    Contact, EducationEntry, ExperienceEntry, ProjectEntry, ResumeContent,
};
use crate::profile::prompts::{EXTRACT_PROMPT, EXTRACT_TOOL_DESCRIPTION, EXTRACT_TOOL_NAME};

/// Resume text beyond this many characters is not sent to the model.
const MAX_RESUME_CHARS: usize = 60_000;

// ────────────────────────────────────────────────────────────────────────────
// Text extraction
// ────────────────────────────────────────────────────────────────────────────

pub fn is_pdf(file_name: Option<&str>, content_type: Option<&str>, bytes: &[u8]) -> bool {
    content_type == Some("application/pdf")
        || file_name.is_some_and(|n| n.to_ascii_lowercase().ends_with(".pdf"))
        || bytes.starts_with(b"%PDF")
}

/// Plain text of an uploaded resume. PDFs are parsed; anything else must be
/// UTF-8 text.
pub async fn resume_text(
    file_name: Option<&str>,
    content_type: Option<&str>,
    bytes: Vec<u8>,
) -> Result<String, AppError> {
    let text = if is_pdf(file_name, content_type, &bytes) {
        // PDF parsing is CPU-bound.
        tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .map_err(|e| AppError::Internal(e.into()))?
            .map_err(|e| AppError::UnprocessableEntity(format!("Could not read PDF: {e}")))?
    } else {
        String::from_utf8(bytes).map_err(|_| {
            AppError::UnprocessableEntity("Resume must be a PDF or a plain-text file".to_string())
        })?
    };

    let text = normalize_whitespace(&text);
    if text.is_empty() {
        return Err(AppError::UnprocessableEntity(
            "No text could be extracted from the resume".to_string(),
        ));
    }
    Ok(text)
}

/// Collapses runs of blank lines and trailing spaces left by PDF extraction.
fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Structured extraction
// ────────────────────────────────────────────────────────────────────────────

/// Shape the model fills in. Dates stay strings here and are parsed leniently.
#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ExtractedResume {
    pub full_name: String,
    pub headline: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub summary: String,
    pub experience: Vec<ExtractedExperience>,
    pub education: Vec<ExtractedEducation>,
    pub projects: Vec<ExtractedProject>,
    pub skills: Vec<String>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ExtractedExperience {
    pub company: String,
    pub role: String,
    pub location: Option<String>,
    /// "YYYY-MM" or "YYYY".
    pub start_date: Option<String>,
    /// "YYYY-MM", "YYYY", or null when current.
    pub end_date: Option<String>,
    pub bullets: Vec<String>,
    pub tech_stack: Vec<String>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ExtractedEducation {
    pub institution: String,
    pub degree: String,
    pub field: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub details: Vec<String>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ExtractedProject {
    pub name: String,
    pub description: String,
    pub url: Option<String>,
    pub tech_stack: Vec<String>,
    pub bullets: Vec<String>,
}

/// Parses the date shapes resumes and models produce: `YYYY-MM-DD`,
/// `YYYY-MM`, `YYYY`, `Mar 2021`, `March 2021`, `03/2021`. Partial dates
/// resolve to the first of the month or year; "Present" and unparseable
/// input yield `None`.
pub fn parse_resume_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    let month_first = format!("{s}-01");
    if let Ok(d) = NaiveDate::parse_from_str(&month_first, "%Y-%m-%d") {
        return Some(d);
    }
    if s.len() == 4 && s.chars().all(|c| c.is_ascii_digit()) {
        return s.parse().ok().and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1));
    }
    let day_first = format!("1 {s}");
    for format in ["%d %b %Y", "%d %B %Y", "%d %m/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(&day_first, format) {
            return Some(d);
        }
    }
    None
}

fn parse_opt(raw: Option<&str>) -> Option<NaiveDate> {
    raw.and_then(parse_resume_date)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty())
        .collect()
}

impl From<ExtractedResume> for ResumeContent {
    fn from(x: ExtractedResume) -> Self {
        ResumeContent {
            full_name: x.full_name.trim().to_string(),
            headline: x.headline.trim().to_string(),
            contact: Contact {
                email: non_blank(x.email),
                phone: non_blank(x.phone),
                location: non_blank(x.location),
                website: non_blank(x.website),
                linkedin: non_blank(x.linkedin),
                github: non_blank(x.github),
            },
            summary: x.summary.trim().to_string(),
            experience: x
                .experience
                .into_iter()
                .filter(|e| !e.company.trim().is_empty() || !e.role.trim().is_empty())
                .map(|e| ExperienceEntry {
                    id: Uuid::new_v4(),
                    start_date: parse_opt(e.start_date.as_deref()),
                    end_date: parse_opt(e.end_date.as_deref()),
                    company: e.company.trim().to_string(),
                    role: e.role.trim().to_string(),
                    location: non_blank(e.location),
                    bullets: clean_list(e.bullets),
                    tech_stack: clean_list(e.tech_stack),
                })
                .collect(),
            education: x
                .education
                .into_iter()
                .filter(|e| !e.institution.trim().is_empty())
                .map(|e| EducationEntry {
                    id: Uuid::new_v4(),
                    start_date: parse_opt(e.start_date.as_deref()),
                    end_date: parse_opt(e.end_date.as_deref()),
                    institution: e.institution.trim().to_string(),
                    degree: e.degree.trim().to_string(),
                    field: non_blank(e.field),
                    details: clean_list(e.details),
                })
                .collect(),
            projects: x
                .projects
                .into_iter()
                .filter(|p| !p.name.trim().is_empty())
                .map(|p| ProjectEntry {
                    id: Uuid::new_v4(),
                    name: p.name.trim().to_string(),
                    description: p.description.trim().to_string(),
                    url: non_blank(p.url),
                    tech_stack: clean_list(p.tech_stack),
                    bullets: clean_list(p.bullets),
                })
                .collect(),
            skills: clean_list(x.skills),
        }
    }
}

/// Asks the model to structure `text` into resume content with fresh entry ids.
pub async fn extract_resume(llm: &LlmClient, text: &str) -> Result<ResumeContent, AppError> {
    let text = truncate_chars(text, MAX_RESUME_CHARS);
    let prompt = format!(
        "{}\n\n{}",
        fill(EXTRACT_PROMPT, &[("resume", fenced("resume", text).as_str())]),
        GROUNDING_INSTRUCTION
    );

    debug!("Extracting resume ({} chars)", text.len());
    let extracted: ExtractedResume = llm
        .call_structured(
            StructuredTool {
                name: EXTRACT_TOOL_NAME,
                description: EXTRACT_TOOL_DESCRIPTION,
            },
            &prompt,
            STRUCTURED_SYSTEM,
        )
        .await?;

    let resume = ResumeContent::from(extracted);
    info!(
        "Extracted resume: {} experience, {} education, {} projects, {} skills",
        resume.experience.len(),
        resume.education.len(),
        resume.projects.len(),
        resume.skills.len()
    );
    Ok(resume)
}
