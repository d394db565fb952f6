// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.

/// System prompt for every structured call: answer through the tool only.
pub const STRUCTURED_SYSTEM: &str = "You are a precise career-writing assistant. \
    Always answer by calling the provided tool exactly once. \
    Do NOT add prose outside the tool call.";

/// Appended to every prompt that writes on the candidate's behalf.
pub const GROUNDING_INSTRUCTION: &str = "\
    CRITICAL: Use only facts present in the candidate's resume. \
    Do NOT invent employers, titles, dates, metrics, technologies or degrees. \
    You may rephrase and emphasise, but every claim must be traceable to the resume. \
    If the resume does not support a claim, leave it out.";

/// Wraps untrusted document text so instructions inside it are not followed.
pub fn fenced(label: &str, body: &str) -> String {
    format!("<{label}>\n{}\n</{label}>", body.trim())
}

/// Substitutes `{name}` placeholders in one pass over `template`.
///
/// Inserted values are never rescanned, so a placeholder that appears inside
/// a value (a job description quoting `{resume_json}`, say) stays literal.
/// Braces that do not name a known placeholder are kept as written.
pub fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let known = after.find('}').and_then(|close| {
            let name = &after[..close];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match known {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
