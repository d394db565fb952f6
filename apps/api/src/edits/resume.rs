use serde::Deserialize;
use uuid::Uuid;

use crate::edits::{add_entry, move_entry, remove_entry, update_entry, Editable, MutationError};
use crate::models::profile::{
    ContactField, EducationEntry, ExperienceEntry, Profile, ProjectEntry, ResumeContent,
};

/// Edits to resume content. Used for the base profile and for the tailored
/// resume held by an application.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ResumeMutation {
    SetFullName { value: String },
    SetHeadline { value: String },
    SetSummary { value: String },
    SetContact {
        field: ContactField,
        value: Option<String>,
    },
    SetSkills { skills: Vec<String> },

    AddExperience { entry: ExperienceEntry },
    UpdateExperience { entry: ExperienceEntry },
    RemoveExperience { id: Uuid },
    MoveExperience { id: Uuid, to: usize },

    AddEducation { entry: EducationEntry },
    UpdateEducation { entry: EducationEntry },
    RemoveEducation { id: Uuid },
    MoveEducation { id: Uuid, to: usize },

    AddProject { entry: ProjectEntry },
    UpdateProject { entry: ProjectEntry },
    RemoveProject { id: Uuid },
    MoveProject { id: Uuid, to: usize },

    Replace { resume: ResumeContent },
}

impl Editable for ResumeContent {
    type Mutation = ResumeMutation;

    fn apply(&self, mutation: ResumeMutation) -> Result<Self, MutationError> {
        use ResumeMutation::*;

        let mut next = self.clone();
        match mutation {
            SetFullName { value } => next.full_name = value,
            SetHeadline { value } => next.headline = value,
            SetSummary { value } => next.summary = value,
            SetContact { field, value } => {
                *next.contact.field_mut(field) = value.filter(|v| !v.trim().is_empty());
            }
            SetSkills { skills } => {
                next.skills = skills
                    .into_iter()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
            }

            AddExperience { entry } => {
                next.experience = add_entry(&self.experience, entry, "experience")?
            }
            UpdateExperience { entry } => {
                next.experience = update_entry(&self.experience, entry, "experience")?
            }
            RemoveExperience { id } => {
                next.experience = remove_entry(&self.experience, id, "experience")?
            }
            MoveExperience { id, to } => {
                next.experience = move_entry(&self.experience, id, to, "experience")?
            }

            AddEducation { entry } => {
                next.education = add_entry(&self.education, entry, "education")?
            }
            UpdateEducation { entry } => {
                next.education = update_entry(&self.education, entry, "education")?
            }
            RemoveEducation { id } => {
                next.education = remove_entry(&self.education, id, "education")?
            }
            MoveEducation { id, to } => {
                next.education = move_entry(&self.education, id, to, "education")?
            }

            AddProject { entry } => next.projects = add_entry(&self.projects, entry, "project")?,
            UpdateProject { entry } => {
                next.projects = update_entry(&self.projects, entry, "project")?
            }
            RemoveProject { id } => next.projects = remove_entry(&self.projects, id, "project")?,
            MoveProject { id, to } => {
                next.projects = move_entry(&self.projects, id, to, "project")?
            }

            Replace { resume } => next = resume,
        }
        Ok(next)
    }
}

impl Editable for Profile {
    type Mutation = ResumeMutation;

    fn apply(&self, mutation: ResumeMutation) -> Result<Self, MutationError> {
        Ok(Profile {
            user_id: self.user_id,
            resume_url: self.resume_url.clone(),
            resume: self.resume.apply(mutation)?,
        })
    }
}
