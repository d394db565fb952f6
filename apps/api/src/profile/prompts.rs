// Profile extraction prompt templates.

pub const EXTRACT_TOOL_NAME: &str = "record_resume";

pub const EXTRACT_TOOL_DESCRIPTION: &str =
    "Record the structured contents of the candidate's resume.";

pub const EXTRACT_PROMPT: &str = r#"Extract the structured contents of the resume below.

Rules:
- Copy facts exactly as written. Do not summarise bullets or merge roles.
- Dates use "YYYY-MM" (or "YYYY" when only the year is given). Use null for an end date that is "Present" or "Current".
- List experience, education and projects in the order they appear.
- `skills` is a flat list of individual skills, tools and languages.
- Leave a field empty when the resume does not mention it.

{resume}"#;
