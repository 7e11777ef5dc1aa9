// src/domain/lifecycle.rs

use crate::domain::lead::LeadStatus;
use crate::errors::ServerError;

/// Terminal states have no outgoing edges.
pub fn is_terminal(status: LeadStatus) -> bool {
    matches!(status, LeadStatus::Closed | LeadStatus::Lost)
}

/// The lifecycle edge table.
///
/// Advance edges: new -> contacted, new -> in-progress,
/// contacted -> in-progress, in-progress -> closed.
/// Abandonment (`-> lost`) is permitted from any non-terminal state.
pub fn can_transition(from: LeadStatus, to: LeadStatus) -> bool {
    if is_terminal(from) {
        return false;
    }
    if to == LeadStatus::Lost {
        return true;
    }

    matches!(
        (from, to),
        (LeadStatus::New, LeadStatus::Contacted)
            | (LeadStatus::New, LeadStatus::InProgress)
            | (LeadStatus::Contacted, LeadStatus::InProgress)
            | (LeadStatus::InProgress, LeadStatus::Closed)
    )
}

/// Same table, as a typed failure carrying the attempted pair.
pub fn check_transition(from: LeadStatus, to: LeadStatus) -> Result<(), ServerError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(ServerError::InvalidTransition { from, to })
    }
}
