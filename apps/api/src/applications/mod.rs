// Job applications: CRUD, tailored document generation, portfolio publishing.

pub mod handlers;
pub mod prompts;
pub mod relevance;
pub mod tailor;
