// Base profile: resume upload, structured extraction, and profile endpoints.

pub mod extract;
pub mod handlers;
pub mod prompts;
