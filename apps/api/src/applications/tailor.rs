use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{debug, info};

use crate::applications::prompts::{
    COVER_LETTER_PROMPT_TEMPLATE, COVER_LETTER_TOOL_DESCRIPTION, COVER_LETTER_TOOL_NAME,
    PORTFOLIO_PROMPT_TEMPLATE, PORTFOLIO_TOOL_DESCRIPTION, PORTFOLIO_TOOL_NAME,
    TAILOR_PROMPT_TEMPLATE, TAILOR_RETRY_NOTE, TAILOR_TOOL_DESCRIPTION, TAILOR_TOOL_NAME,
};
use crate::applications::relevance::{tailor_with_retry, TailoredResume};
use crate::llm_client::prompts::{fenced, fill, GROUNDING_INSTRUCTION, STRUCTURED_SYSTEM};
use crate::llm_client::{LlmClient, LlmError, StructuredTool};
use crate::models::application::{Application, CoverLetter, Portfolio, PortfolioHighlight};
use crate::models::profile::ResumeContent;

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GeneratedCoverLetter {
    pub greeting: String,
    pub paragraphs: Vec<String>,
    pub closing: String,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GeneratedPortfolio {
    pub tagline: String,
    pub about: String,
    pub highlights: Vec<GeneratedHighlight>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GeneratedHighlight {
    pub title: String,
    pub description: String,
}

/// Everything one generation run produces for an application.
#[derive(Debug, Clone)]
pub struct GeneratedDocuments {
    pub tailored: ResumeContent,
    pub cover_letter: CoverLetter,
    pub portfolio: Portfolio,
}

impl GeneratedCoverLetter {
    pub fn into_cover_letter(self, signature: &str) -> CoverLetter {
        CoverLetter {
            greeting: self.greeting.trim().to_string(),
            paragraphs: non_empty(self.paragraphs),
            closing: self.closing.trim().to_string(),
            signature: signature.trim().to_string(),
        }
    }
}

impl GeneratedPortfolio {
    /// Keeps the slug and published URL of `previous` so regeneration does not
    /// move an already published page.
    pub fn into_portfolio(self, previous: Option<&Portfolio>, fallback_slug: String) -> Portfolio {
        let (slug, published_url) = match previous {
            Some(p) if !p.slug.is_empty() => (p.slug.clone(), p.published_url.clone()),
            _ => (fallback_slug, None),
        };
        Portfolio {
            slug,
            tagline: self.tagline.trim().to_string(),
            about: self.about.trim().to_string(),
            highlights: self
                .highlights
                .into_iter()
                .filter(|h| !h.title.trim().is_empty())
                .map(|h| PortfolioHighlight {
                    title: h.title.trim().to_string(),
                    description: h.description.trim().to_string(),
                })
                .collect(),
            published_url,
        }
    }
}

fn non_empty(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

fn job_block(application: &Application) -> String {
    fenced(
        "job",
        &format!(
            "Company: {}\nTitle: {}\n\n{}",
            application.company, application.job_title, application.job_description
        ),
    )
}

fn resume_block(resume: &ResumeContent) -> Result<String, LlmError> {
    Ok(fenced("resume_json", &serde_json::to_string_pretty(resume)?))
}

fn build_prompt(template: &str, job: &str, resume: &str) -> String {
    format!(
        "{}\n\n{}",
        fill(template, &[("job", job), ("resume_json", resume)]),
        GROUNDING_INSTRUCTION
    )
}

/// Generates the tailored resume, cover letter and portfolio copy for
/// `application` from the candidate's base resume. The three calls run
/// concurrently; any failure fails the whole run.
pub async fn generate_documents(
    llm: &LlmClient,
    application: &Application,
    base: &ResumeContent,
) -> Result<GeneratedDocuments, LlmError> {
    let job = job_block(application);
    let resume = resume_block(base)?;

    let tailor_prompt = build_prompt(TAILOR_PROMPT_TEMPLATE, &job, &resume);
    let cover_prompt = build_prompt(COVER_LETTER_PROMPT_TEMPLATE, &job, &resume);
    let portfolio_prompt = build_prompt(PORTFOLIO_PROMPT_TEMPLATE, &job, &resume);

    info!(
        "Generating documents for application {} ({} at {})",
        application.id, application.job_title, application.company
    );

    let tailoring = tailor_with_retry(base, |rejected| {
        let prompt = match rejected {
            Some(ids) => format!(
                "{tailor_prompt}\n\n{}",
                fill(TAILOR_RETRY_NOTE, &[("unknown_ids", ids.join(", ").as_str())])
            ),
            None => tailor_prompt.clone(),
        };
        async move {
            llm.call_structured::<TailoredResume>(
                StructuredTool {
                    name: TAILOR_TOOL_NAME,
                    description: TAILOR_TOOL_DESCRIPTION,
                },
                &prompt,
                STRUCTURED_SYSTEM,
            )
            .await
        }
    });

    let cover_letter = llm.call_structured::<GeneratedCoverLetter>(
        StructuredTool {
            name: COVER_LETTER_TOOL_NAME,
            description: COVER_LETTER_TOOL_DESCRIPTION,
        },
        &cover_prompt,
        STRUCTURED_SYSTEM,
    );

    let portfolio = llm.call_structured::<GeneratedPortfolio>(
        StructuredTool {
            name: PORTFOLIO_TOOL_NAME,
            description: PORTFOLIO_TOOL_DESCRIPTION,
        },
        &portfolio_prompt,
        STRUCTURED_SYSTEM,
    );

    let (tailored, cover_letter, portfolio) = tokio::try_join!(tailoring, cover_letter, portfolio)?;
    debug!(
        "Generation done: {} experience entries, {} paragraphs, {} highlights",
        tailored.experience.len(),
        cover_letter.paragraphs.len(),
        portfolio.highlights.len()
    );

    Ok(GeneratedDocuments {
        tailored,
        cover_letter: cover_letter.into_cover_letter(&base.full_name),
        portfolio: portfolio.into_portfolio(
            application.portfolio.as_ref(),
            application.portfolio_slug(&base.full_name),
        ),
    })
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::templates::Skin;

    fn application() -> Application {
        Application::new(
            Uuid::new_v4(),
            "Acme".into(),
            "Rust Engineer".into(),
            "Own the storage layer.".into(),
            Skin::Classic,
        )
    }

    #[test]
    fn test_cover_letter_signed_with_full_name() {
        let letter = GeneratedCoverLetter {
            greeting: " Dear Hiring Team, ".into(),
            paragraphs: vec!["One.".into(), "  ".into(), "Two.".into()],
            closing: "Sincerely,".into(),
        }
        .into_cover_letter("Ada Lovelace");
        assert_eq!(letter.greeting, "Dear Hiring Team,");
        assert_eq!(letter.paragraphs, vec!["One.", "Two."]);
        assert_eq!(letter.signature, "Ada Lovelace");
    }

    #[test]
    fn test_regenerated_portfolio_keeps_published_slug() {
        let previous = Portfolio {
            slug: "ada-acme-1234".into(),
            published_url: Some("https://cdn.test/portfolios/ada-acme-1234/index.html".into()),
            ..Default::default()
        };
        let portfolio = GeneratedPortfolio {
            tagline: "Storage engines".into(),
            about: "I build databases.".into(),
            highlights: vec![
                GeneratedHighlight {
                    title: "".into(),
                    description: "dropped".into(),
                },
                GeneratedHighlight {
                    title: "Raft".into(),
                    description: "Shipped consensus.".into(),
                },
            ],
        }
        .into_portfolio(Some(&previous), "fresh-slug".into());

        assert_eq!(portfolio.slug, "ada-acme-1234");
        assert_eq!(portfolio.published_url, previous.published_url);
        assert_eq!(portfolio.highlights.len(), 1);
    }

    #[test]
    fn test_first_portfolio_uses_fallback_slug() {
        let portfolio = GeneratedPortfolio::default().into_portfolio(None, "fresh-slug".into());
        assert_eq!(portfolio.slug, "fresh-slug");
        assert!(portfolio.published_url.is_none());
    }

    #[test]
    fn test_prompt_fences_job_and_resume() {
        let app = application();
        let resume = ResumeContent {
            full_name: "Ada".into(),
            ..Default::default()
        };
        let prompt = build_prompt(
            TAILOR_PROMPT_TEMPLATE,
            &job_block(&app),
            &resume_block(&resume).unwrap(),
        );
        assert!(prompt.contains("<job>\nCompany: Acme\nTitle: Rust Engineer"));
        assert!(prompt.contains("<resume_json>"));
        assert!(prompt.contains("\"full_name\": \"Ada\""));
        assert!(prompt.ends_with(GROUNDING_INSTRUCTION));
        assert!(!prompt.contains("{job}"));
    }

    #[test]
    fn test_job_text_quoting_a_placeholder_stays_literal() {
        let mut app = application();
        app.job_description = "Paste your {resume_json} here.".into();
        let resume = ResumeContent {
            full_name: "Ada".into(),
            ..Default::default()
        };
        let prompt = build_prompt(
            TAILOR_PROMPT_TEMPLATE,
            &job_block(&app),
            &resume_block(&resume).unwrap(),
        );
        assert!(prompt.contains("Paste your {resume_json} here."));
        assert_eq!(prompt.matches("\"full_name\": \"Ada\"").count(), 1);
    }
}
