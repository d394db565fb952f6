// All LLM prompt constants for the applications module.
// Templates take `{placeholder}` substitutions; cross-cutting fragments come
// from llm_client::prompts.

pub const TAILOR_TOOL_NAME: &str = "record_tailored_resume";
pub const TAILOR_TOOL_DESCRIPTION: &str =
    "Record the resume reordered and reworded for the target role.";

/// Replace: {job}, {resume_json}
pub const TAILOR_PROMPT_TEMPLATE: &str = r#"Tailor the candidate's resume to the job below.

Return:
- `headline`: one line positioning the candidate for this role.
- `summary`: 2-3 sentences aimed at this role.
- `experience`: EVERY experience entry from the resume, most relevant to the job first.
  Use each entry's exact `id`. Rewrite its bullets to emphasise what the job asks for,
  most relevant bullet first. Keep the facts; change only emphasis and wording.
- `skills`: the candidate's skills, most relevant first. Only skills already listed.

{job}

{resume_json}"#;

/// Appended on a retry after the model used ids that do not exist.
/// Replace: {unknown_ids}
pub const TAILOR_RETRY_NOTE: &str = "\
    Your previous answer used experience ids that are not in the resume: {unknown_ids}. \
    Use only the `id` values given in the resume JSON, copied exactly.";

pub const COVER_LETTER_TOOL_NAME: &str = "record_cover_letter";
pub const COVER_LETTER_TOOL_DESCRIPTION: &str = "Record a cover letter for the target role.";

/// Replace: {job}, {resume_json}
pub const COVER_LETTER_PROMPT_TEMPLATE: &str = r#"Write a cover letter from the candidate for the job below.

- `greeting`: e.g. "Dear Hiring Team," (use a name only if the job description gives one).
- `paragraphs`: 3-4 short paragraphs. Open with why this role, then the two or three most
  relevant accomplishments from the resume, then close with a call to action.
- `closing`: e.g. "Sincerely,".
Plain, confident tone. No clichés, no flattery.

{job}

{resume_json}"#;

pub const PORTFOLIO_TOOL_NAME: &str = "record_portfolio";
pub const PORTFOLIO_TOOL_DESCRIPTION: &str =
    "Record copy for a one-page personal portfolio aimed at the target role.";

/// Replace: {job}, {resume_json}
pub const PORTFOLIO_PROMPT_TEMPLATE: &str = r#"Write copy for the candidate's one-page portfolio site, aimed at the job below.

- `tagline`: under 12 words.
- `about`: one paragraph in the first person.
- `highlights`: 3-4 items, each a short `title` and a one-sentence `description`,
  drawn from the candidate's strongest work relevant to this job.

{job}

{resume_json}"#;
