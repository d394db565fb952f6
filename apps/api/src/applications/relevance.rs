//! Relevance reordering of experience entries.
//!
//! The model returns experience ids in relevance order with rewritten bullets.
//! Its answer is spliced back into the original entries by id, so everything
//! the model was not asked to touch (company, role, dates) is kept verbatim.

use std::collections::HashSet;
use std::future::Future;

use schemars::JsonSchema;
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::llm_client::LlmError;
use crate::models::profile::{ExperienceEntry, ResumeContent};

/// Total attempts: the first call plus two retries.
pub const MAX_RELEVANCE_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RankedExperience {
    /// The entry's `id`, copied exactly from the resume.
    pub id: String,
    /// Rewritten bullets, most relevant first.
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TailoredResume {
    pub headline: String,
    pub summary: String,
    /// Every experience entry, most relevant first.
    pub experience: Vec<RankedExperience>,
    /// Existing skills, most relevant first.
    pub skills: Vec<String>,
}

/// Reorders `original` to follow `ranked`.
///
/// Duplicate ids keep their first position. Entries the model left out are
/// appended in their original order. Non-empty rewritten bullets replace the
/// original bullets. Returns the offending ids if any are not in `original`.
pub fn splice_experience(
    original: &[ExperienceEntry],
    ranked: &[RankedExperience],
) -> Result<Vec<ExperienceEntry>, Vec<String>> {
    let unknown: Vec<String> = ranked
        .iter()
        .filter(|r| {
            Uuid::parse_str(r.id.trim())
                .map(|id| !original.iter().any(|e| e.id == id))
                .unwrap_or(true)
        })
        .map(|r| r.id.clone())
        .collect();
    if !unknown.is_empty() {
        return Err(unknown);
    }

    let mut placed: HashSet<Uuid> = HashSet::with_capacity(original.len());
    let mut out = Vec::with_capacity(original.len());
    for r in ranked {
        let Ok(id) = Uuid::parse_str(r.id.trim()) else {
            continue;
        };
        if !placed.insert(id) {
            continue;
        }
        let Some(entry) = original.iter().find(|e| e.id == id) else {
            continue;
        };
        let mut entry = entry.clone();
        let bullets: Vec<String> = r
            .bullets
            .iter()
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty())
            .collect();
        if !bullets.is_empty() {
            entry.bullets = bullets;
        }
        out.push(entry);
    }

    out.extend(
        original
            .iter()
            .filter(|e| !placed.contains(&e.id))
            .cloned(),
    );
    Ok(out)
}

/// Orders `original` skills with those the model ranked first. Skills the
/// model made up are dropped; skills it left out keep their original order.
pub fn reorder_skills(original: &[String], ranked: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(original.len());
    for skill in ranked {
        let Some(existing) = original
            .iter()
            .find(|o| o.trim().eq_ignore_ascii_case(skill.trim()))
        else {
            continue;
        };
        if !out.contains(existing) {
            out.push(existing.clone());
        }
    }
    for skill in original {
        if !out.contains(skill) {
            out.push(skill.clone());
        }
    }
    out
}

/// Builds the tailored copy of `base` from a validated model answer.
pub fn apply_tailoring(
    base: &ResumeContent,
    tailored: TailoredResume,
    experience: Vec<ExperienceEntry>,
) -> ResumeContent {
    let mut resume = base.clone();
    if !tailored.headline.trim().is_empty() {
        resume.headline = tailored.headline.trim().to_string();
    }
    if !tailored.summary.trim().is_empty() {
        resume.summary = tailored.summary.trim().to_string();
    }
    resume.experience = experience;
    resume.skills = reorder_skills(&base.skills, &tailored.skills);
    resume
}

/// Asks for a tailoring until its experience ids all exist, then splices it
/// into `base`.
///
/// `ask` receives the ids rejected on the previous attempt (none on the first)
/// so the prompt can say what went wrong.
pub async fn tailor_with_retry<F, Fut>(
    base: &ResumeContent,
    mut ask: F,
) -> Result<ResumeContent, LlmError>
where
    F: FnMut(Option<Vec<String>>) -> Fut,
    Fut: Future<Output = Result<TailoredResume, LlmError>>,
{
    let mut rejected: Option<Vec<String>> = None;

    for attempt in 1..=MAX_RELEVANCE_ATTEMPTS {
        let tailored = ask(rejected.take()).await?;
        match splice_experience(&base.experience, &tailored.experience) {
            Ok(experience) => return Ok(apply_tailoring(base, tailored, experience)),
            Err(unknown) => {
                warn!(
                    "Tailoring attempt {}/{}: {} unknown experience ids — retrying",
                    attempt,
                    MAX_RELEVANCE_ATTEMPTS,
                    unknown.len()
                );
                rejected = Some(unknown);
            }
        }
    }

    Err(LlmError::Rejected(format!(
        "tailoring failed after {} attempts: experience ids did not match the resume ({})",
        MAX_RELEVANCE_ATTEMPTS,
        rejected.unwrap_or_default().join(", ")
    )))
}
