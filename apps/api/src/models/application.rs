use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::profile::ResumeContent;
use crate::templates::Skin;

/// One job application: the target role plus everything generated for it.
/// Keyed in the store by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company: String,
    pub job_title: String,
    pub job_description: String,
    #[serde(default)]
    pub status: ApplicationStatus,
    #[serde(default)]
    pub skin: Skin,
    #[serde(default)]
    pub notes: String,
    /// Resume rewritten for this role. `None` until generation runs.
    #[serde(default)]
    pub tailored: Option<ResumeContent>,
    #[serde(default)]
    pub cover_letter: Option<CoverLetter>,
    #[serde(default)]
    pub portfolio: Option<Portfolio>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Draft,
    Applied,
    Interviewing,
    Offer,
    Rejected,
    Withdrawn,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverLetter {
    pub greeting: String,
    pub paragraphs: Vec<String>,
    pub closing: String,
    pub signature: String,
}

/// Public one-page portfolio published per application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Portfolio {
    pub slug: String,
    pub tagline: String,
    pub about: String,
    pub highlights: Vec<PortfolioHighlight>,
    pub published_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioHighlight {
    pub title: String,
    pub description: String,
}

impl Application {
    pub fn new(
        user_id: Uuid,
        company: String,
        job_title: String,
        job_description: String,
        skin: Skin,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            company,
            job_title,
            job_description,
            status: ApplicationStatus::Draft,
            skin,
            notes: String::new(),
            tailored: None,
            cover_letter: None,
            portfolio: None,
            created_at: Utc::now(),
        }
    }

    /// URL-safe slug for the public portfolio page, unique per application.
    pub fn portfolio_slug(&self, full_name: &str) -> String {
        let short_id = &self.id.simple().to_string()[..8];
        let base = slugify(&format!("{full_name} {} {}", self.company, self.job_title));
        if base.is_empty() {
            short_id.to_string()
        } else {
            format!("{base}-{short_id}")
        }
    }
}

fn slugify(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Application {
        Application::new(
            Uuid::new_v4(),
            "Acme Corp".into(),
            "Senior Rust Engineer".into(),
            "Build things.".into(),
            Skin::Modern,
        )
    }

    #[test]
    fn test_new_application_is_draft_without_generated_content() {
        let app = sample();
        assert_eq!(app.status, ApplicationStatus::Draft);
        assert!(app.tailored.is_none());
        assert!(app.cover_letter.is_none());
        assert!(app.portfolio.is_none());
    }

    #[test]
    fn test_portfolio_slug_is_url_safe() {
        let app = sample();
        let slug = app.portfolio_slug("Ada Lovelace");
        assert!(slug.starts_with("ada-lovelace-acme-corp-senior-rust-engineer-"));
        assert!(slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
    }

    #[test]
    fn test_portfolio_slug_without_text_falls_back_to_id() {
        let mut app = sample();
        app.company = "!!".into();
        app.job_title = String::new();
        let slug = app.portfolio_slug("");
        assert_eq!(slug.len(), 8);
    }

    #[test]
    fn test_status_serde_is_snake_case() {
        let json = serde_json::to_string(&ApplicationStatus::Interviewing).unwrap();
        assert_eq!(json, r#""interviewing""#);
    }
}
