// errors.rs
use std::fmt;

use crate::automation::executor::TaskId;
use crate::domain::lead::{LeadStatus, Role};

/// Errors originating from the server logic (routing, policy checks,
/// lifecycle rules) or downstream layers (DB, spreadsheet writer).
#[derive(Debug)]
pub enum ServerError {
    NotFound,
    BadRequest(String),
    Unauthorized(String),
    Forbidden,
    /// A lead-status edge outside the lifecycle table. The lead is left
    /// unmodified; the attempted pair is carried for the caller.
    InvalidTransition { from: LeadStatus, to: LeadStatus },
    /// The task exists but is not in the acting role's task set.
    TaskNotAllowedForRole { task: TaskId, role: Role },
    /// An optimistic status write lost a race; caller re-reads and retries.
    StaleState,
    /// Fan-out persisted only part of the batch; carries the recipient ids
    /// that failed so a caller can re-issue to just those.
    PartialFanout(Vec<i64>),
    DbError(String),
    XlsxError(String),
    InternalError,
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::NotFound => write!(f, "Not Found"),
            ServerError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            ServerError::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            ServerError::Forbidden => write!(f, "Forbidden"),
            ServerError::InvalidTransition { from, to } => {
                write!(
                    f,
                    "Invalid lead transition: {} -> {}",
                    from.as_str(),
                    to.as_str()
                )
            }
            ServerError::TaskNotAllowedForRole { task, role } => {
                write!(
                    f,
                    "Task {} is not allowed for role {}",
                    task.as_str(),
                    role.as_str()
                )
            }
            ServerError::StaleState => write!(f, "Stale state: lead changed under us"),
            ServerError::PartialFanout(ids) => {
                write!(f, "Fan-out failed for {} recipient(s)", ids.len())
            }
            ServerError::DbError(msg) => write!(f, "Database Error: {msg}"),
            ServerError::XlsxError(msg) => write!(f, "Spreadsheet Error: {msg}"),
            ServerError::InternalError => write!(f, "Internal Server Error"),
        }
    }
}

impl std::error::Error for ServerError {}
