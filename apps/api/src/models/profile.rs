use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Identified;

/// A user's base profile, extracted from an uploaded resume and edited in place.
/// Keyed in the store by `user_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: Uuid,
    /// Public URL of the originally uploaded resume file, if any.
    #[serde(default)]
    pub resume_url: Option<String>,
    #[serde(default)]
    pub resume: ResumeContent,
}

impl Profile {
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            resume_url: None,
            resume: ResumeContent::default(),
        }
    }
}

/// Everything a rendered resume shows. Shared by the base profile and by the
/// tailored copy stored on each application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeContent {
    pub full_name: String,
    pub headline: String,
    pub contact: Contact,
    pub summary: String,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
    pub projects: Vec<ProjectEntry>,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactField {
    Email,
    Phone,
    Location,
    Website,
    Linkedin,
    Github,
}

impl Contact {
    pub fn field_mut(&mut self, field: ContactField) -> &mut Option<String> {
        match field {
            ContactField::Email => &mut self.email,
            ContactField::Phone => &mut self.phone,
            ContactField::Location => &mut self.location,
            ContactField::Website => &mut self.website,
            ContactField::Linkedin => &mut self.linkedin,
            ContactField::Github => &mut self.github,
        }
    }

    /// Non-empty contact lines in display order.
    pub fn lines(&self) -> Vec<&str> {
        [
            &self.email,
            &self.phone,
            &self.location,
            &self.website,
            &self.linkedin,
            &self.github,
        ]
        .into_iter()
        .filter_map(|f| f.as_deref())
        .filter(|s| !s.trim().is_empty())
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub company: String,
    pub role: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// `None` means the position is current.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub bullets: Vec<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub institution: String,
    pub degree: String,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub details: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectEntry {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub bullets: Vec<String>,
}

impl Identified for ExperienceEntry {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Identified for EducationEntry {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Identified for ProjectEntry {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Formats an optional start/end pair the way resumes show it: "Jan 2020 – Present".
pub fn format_date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> String {
    let fmt = |d: NaiveDate| d.format("%b %Y").to_string();
    match (start, end) {
        (Some(s), Some(e)) => format!("{} – {}", fmt(s), fmt(e)),
        (Some(s), None) => format!("{} – Present", fmt(s)),
        (None, Some(e)) => fmt(e),
        (None, None) => String::new(),
    }
}
