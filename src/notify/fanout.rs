// src/notify/fanout.rs
use crate::db::connection::Database;
use crate::db::notifications::{insert_batch, NewNotification, NotificationMeta};
use crate::db::users::{self, RecipientInfo};
use crate::domain::lead::Role;
use crate::errors::ServerError;

/// Fan-out policy knobs.
#[derive(Debug, Clone)]
pub struct FanoutConfig {
    /// Bulk inserts are chunked to this many rows per transaction so a
    /// broadcast to a large user base never becomes one unbounded write.
    pub batch_size: usize,
    /// Whether entering `lost` notifies the lead owner. Off by default.
    pub notify_on_lost: bool,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            notify_on_lost: false,
        }
    }
}

/// Who a broadcast goes to.
#[derive(Debug, Clone, Copy)]
pub enum Recipients {
    /// Exactly one user. Explicit self-notification is allowed here.
    User(i64),
    /// Every user except the given role (announcements skip Admins).
    AllExceptRole(Role),
}

/// One notification, minus the recipient; the template builder produces
/// one of these per resolved recipient.
#[derive(Debug, Clone)]
pub struct NotificationDraft {
    pub kind: String,
    pub title: String,
    pub message: String,
    pub metadata: Option<NotificationMeta>,
}

#[derive(Debug, Default)]
pub struct FanoutReport {
    /// Recipients resolved by the selector (after actor exclusion).
    pub requested: usize,
    /// Rows actually persisted.
    pub created: usize,
    /// Recipients skipped because their template failed to build.
    pub skipped: usize,
    /// Recipients whose insert did not land; re-issue to just these.
    pub failed_user_ids: Vec<i64>,
}

impl FanoutReport {
    /// For callers that treat partial delivery as an error.
    pub fn require_complete(self) -> Result<FanoutReport, ServerError> {
        if self.failed_user_ids.is_empty() {
            Ok(self)
        } else {
            Err(ServerError::PartialFanout(self.failed_user_ids))
        }
    }
}

/// Fan one logical event out into per-recipient notification records.
///
/// Resolution excludes the triggering `actor` from set-valued selectors so
/// users are not notified about their own actions; a `Recipients::User`
/// selector is taken as an explicit choice and never filtered.
///
/// Delivery is best-effort and at-most-once: a template failure logs and
/// skips that recipient, a store-level failure is reported in
/// `failed_user_ids`, and nothing is retried here.
pub fn broadcast<F>(
    db: &Database,
    cfg: &FanoutConfig,
    selector: Recipients,
    actor: Option<i64>,
    build: F,
    now: i64,
) -> Result<FanoutReport, ServerError>
where
    F: Fn(&RecipientInfo) -> Result<NotificationDraft, ServerError>,
{
    let mut report = FanoutReport::default();

    let recipients: Vec<RecipientInfo> = match selector {
        Recipients::User(user_id) => {
            match db.with_conn(|conn| users::get_recipient(conn, user_id))? {
                Some(r) => vec![r],
                None => {
                    // The single target is already gone; report it failed.
                    report.requested = 1;
                    report.failed_user_ids.push(user_id);
                    return Ok(report);
                }
            }
        }
        Recipients::AllExceptRole(role) => db
            .with_conn(|conn| users::list_recipients_except_role(conn, role))?
            .into_iter()
            .filter(|r| Some(r.user_id) != actor)
            .collect(),
    };

    report.requested = recipients.len();

    for chunk in recipients.chunks(cfg.batch_size.max(1)) {
        let mut batch: Vec<NewNotification> = Vec::with_capacity(chunk.len());

        for recipient in chunk {
            match build(recipient) {
                Ok(draft) => batch.push(NewNotification {
                    user_id: recipient.user_id,
                    kind: draft.kind,
                    title: draft.title,
                    message: draft.message,
                    metadata: draft.metadata,
                }),
                Err(e) => {
                    eprintln!(
                        "fanout: skipping recipient {} (template failed: {e})",
                        recipient.user_id
                    );
                    report.skipped += 1;
                }
            }
        }

        if batch.is_empty() {
            continue;
        }

        let outcome = db.with_conn(|conn| insert_batch(conn, &batch, now))?;
        report.created += outcome.created;
        report.failed_user_ids.extend(outcome.failed_user_ids);
    }

    Ok(report)
}
