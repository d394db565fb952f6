use serde::Deserialize;

use crate::edits::resume::ResumeMutation;
use crate::edits::{Editable, MutationError};
use crate::models::application::{Application, ApplicationStatus, CoverLetter, Portfolio};
use crate::templates::Skin;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ApplicationMutation {
    SetCompany { value: String },
    SetJobTitle { value: String },
    SetJobDescription { value: String },
    SetStatus { status: ApplicationStatus },
    SetSkin { skin: Skin },
    SetNotes { value: String },
    SetCoverLetter { cover_letter: CoverLetter },
    SetPortfolio { portfolio: Portfolio },
    /// Edit the tailored resume; fails until one has been generated.
    EditTailored { edit: ResumeMutation },
    Replace { application: Application },
}

impl Editable for Application {
    type Mutation = ApplicationMutation;

    fn apply(&self, mutation: ApplicationMutation) -> Result<Self, MutationError> {
        use ApplicationMutation::*;

        let mut next = self.clone();
        match mutation {
            SetCompany { value } => next.company = value,
            SetJobTitle { value } => next.job_title = value,
            SetJobDescription { value } => next.job_description = value,
            SetStatus { status } => next.status = status,
            SetSkin { skin } => next.skin = skin,
            SetNotes { value } => next.notes = value,
            SetCoverLetter { cover_letter } => next.cover_letter = Some(cover_letter),
            SetPortfolio { portfolio } => next.portfolio = Some(portfolio),
            EditTailored { edit } => {
                let tailored = self.tailored.as_ref().ok_or_else(|| {
                    MutationError::Invalid(
                        "no tailored resume yet; generate one first".to_string(),
                    )
                })?;
                next.tailored = Some(tailored.apply(edit)?);
            }
            Replace { application } => {
                if application.id != self.id || application.user_id != self.user_id {
                    return Err(MutationError::Invalid(
                        "replacement must keep the application id and owner".to_string(),
                    ));
                }
                next = application;
            }
        }
        Ok(next)
    }
}
