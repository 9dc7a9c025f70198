use chrono::Utc;
use crate::domain::models::guide::{Guide, GuideStatus};
use crate::error::AppError;

pub const FEEDBACK_REQUIRED_MESSAGE: &str = "El comentario de rechazo es obligatorio.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationAction {
    Approve,
    Reject { feedback: String },
}

impl ModerationAction {
    pub fn target_status(&self) -> GuideStatus {
        match self {
            ModerationAction::Approve => GuideStatus::Approved,
            ModerationAction::Reject { .. } => GuideStatus::Rejected,
        }
    }
}

/// Moves a guide to the status the action names.
///
/// Any status may be approved or rejected, including re-approving a rejected
/// guide. Rejection needs a non-blank feedback string; approval clears any
/// previous feedback.
pub fn apply(guide: &mut Guide, action: ModerationAction) -> Result<(), AppError> {
    let feedback = match &action {
        ModerationAction::Approve => None,
        ModerationAction::Reject { feedback } => {
            let trimmed = feedback.trim();
            if trimmed.is_empty() {
                return Err(AppError::Validation(FEEDBACK_REQUIRED_MESSAGE.into()));
            }
            Some(trimmed.to_string())
        }
    };

    guide.status = action.target_status();
    guide.moderator_feedback = feedback;
    guide.updated_at = Utc::now();
    Ok(())
}
