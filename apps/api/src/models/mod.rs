pub mod application;
pub mod profile;

use uuid::Uuid;

/// List entries that keep a stable identity across edits and reorderings.
pub trait Identified {
    fn id(&self) -> Uuid;
}
