// src/automation/executor.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::automation::tasks;
use crate::domain::lead::Role;
use crate::errors::ServerError;

/// Every automation task the platform knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskId {
    AutoRespond,
    AutoSchedule,
    AutoMarketing,
    AutoFollowup,
    AutoRentReminder,
    AutoScreen,
    AutoMaintenance,
    AutoPricing,
    AutoAnalysis,
    AutoOptimize,
    AutoMaintenanceRoute,
    AutoPaymentReminder,
}

impl TaskId {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskId::AutoRespond => "auto_respond",
            TaskId::AutoSchedule => "auto_schedule",
            TaskId::AutoMarketing => "auto_marketing",
            TaskId::AutoFollowup => "auto_followup",
            TaskId::AutoRentReminder => "auto_rent_reminder",
            TaskId::AutoScreen => "auto_screen",
            TaskId::AutoMaintenance => "auto_maintenance",
            TaskId::AutoPricing => "auto_pricing",
            TaskId::AutoAnalysis => "auto_analysis",
            TaskId::AutoOptimize => "auto_optimize",
            TaskId::AutoMaintenanceRoute => "auto_maintenance_route",
            TaskId::AutoPaymentReminder => "auto_payment_reminder",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ServerError> {
        match s {
            "auto_respond" => Ok(TaskId::AutoRespond),
            "auto_schedule" => Ok(TaskId::AutoSchedule),
            "auto_marketing" => Ok(TaskId::AutoMarketing),
            "auto_followup" => Ok(TaskId::AutoFollowup),
            "auto_rent_reminder" => Ok(TaskId::AutoRentReminder),
            "auto_screen" => Ok(TaskId::AutoScreen),
            "auto_maintenance" => Ok(TaskId::AutoMaintenance),
            "auto_pricing" => Ok(TaskId::AutoPricing),
            "auto_analysis" => Ok(TaskId::AutoAnalysis),
            "auto_optimize" => Ok(TaskId::AutoOptimize),
            "auto_maintenance_route" => Ok(TaskId::AutoMaintenanceRoute),
            "auto_payment_reminder" => Ok(TaskId::AutoPaymentReminder),
            other => Err(ServerError::BadRequest(format!("unknown task: {other}"))),
        }
    }

    /// Dashboard display name.
    pub fn label(self) -> &'static str {
        match self {
            TaskId::AutoRespond => "Auto-Respond to Inquiries",
            TaskId::AutoSchedule => "Auto-Schedule Viewings",
            TaskId::AutoMarketing => "Auto-Generate Marketing",
            TaskId::AutoFollowup => "Auto-Follow-Up Leads",
            TaskId::AutoRentReminder => "Send Rent Reminders",
            TaskId::AutoScreen => "Screen Tenant Application",
            TaskId::AutoMaintenance => "Schedule Maintenance",
            TaskId::AutoPricing => "Optimize Pricing",
            TaskId::AutoAnalysis => "Market Analysis",
            TaskId::AutoOptimize => "Optimize Listing",
            TaskId::AutoMaintenanceRoute => "Submit Maintenance Request",
            TaskId::AutoPaymentReminder => "Payment Reminders",
        }
    }
}

/// Result of one automation run. Ephemeral — surfaced to the caller,
/// never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct AutomationResult {
    pub success: bool,
    pub message: String,
    /// Human-readable record of the side effects actually performed,
    /// in order.
    pub actions: Vec<String>,
}

impl AutomationResult {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            actions: Vec::new(),
        }
    }
}

/// The fixed role -> task-set table. An exhaustive match, so adding a role
/// or task forces this to be revisited.
pub fn tasks_for_role(role: Role) -> &'static [TaskId] {
    match role {
        Role::Agent => &[
            TaskId::AutoRespond,
            TaskId::AutoSchedule,
            TaskId::AutoMarketing,
            TaskId::AutoFollowup,
        ],
        Role::Landlord => &[
            TaskId::AutoRentReminder,
            TaskId::AutoScreen,
            TaskId::AutoMaintenance,
        ],
        Role::PropertyOwner => &[TaskId::AutoPricing, TaskId::AutoAnalysis, TaskId::AutoOptimize],
        Role::Tenant => &[TaskId::AutoMaintenanceRoute, TaskId::AutoPaymentReminder],
        // Admins administer; they run no automations.
        Role::Admin => &[],
    }
}

type Handler = fn(&Value) -> Result<AutomationResult, String>;

/// Task-id-keyed handler table. Handlers are plain functions over the
/// payload; adding a task means adding a row here, not a subtype.
fn handler_for(task: TaskId) -> Handler {
    match task {
        TaskId::AutoRespond => tasks::auto_respond,
        TaskId::AutoSchedule => tasks::auto_schedule,
        TaskId::AutoMarketing => tasks::auto_marketing,
        TaskId::AutoFollowup => tasks::auto_followup,
        TaskId::AutoRentReminder => tasks::auto_rent_reminder,
        TaskId::AutoScreen => tasks::auto_screen,
        TaskId::AutoMaintenance => tasks::auto_maintenance,
        TaskId::AutoPricing => tasks::auto_pricing,
        TaskId::AutoAnalysis => tasks::auto_analysis,
        TaskId::AutoOptimize => tasks::auto_optimize,
        TaskId::AutoMaintenanceRoute => tasks::auto_maintenance_route,
        TaskId::AutoPaymentReminder => tasks::auto_payment_reminder,
    }
}

/// Run one automation task for a role.
///
/// The only hard failure is a role/task mismatch. Handler failures are
/// captured and come back as `{success: false}` results — nothing a
/// handler does propagates past this boundary. No retries happen here;
/// handlers are pure over their payload, so callers may simply re-invoke.
pub fn execute(task: TaskId, role: Role, payload: &Value) -> Result<AutomationResult, ServerError> {
    if !tasks_for_role(role).contains(&task) {
        return Err(ServerError::TaskNotAllowedForRole { task, role });
    }

    match handler_for(task)(payload) {
        Ok(result) => Ok(result),
        Err(msg) => Ok(AutomationResult::failed(msg)),
    }
}
