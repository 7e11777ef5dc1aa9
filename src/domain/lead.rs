use serde::{Deserialize, Serialize};

use crate::errors::ServerError;

/// What kind of transaction a conversation produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DealType {
    Purchase,
    Rental,
    Viewing,
}

impl DealType {
    pub fn as_str(self) -> &'static str {
        match self {
            DealType::Purchase => "purchase",
            DealType::Rental => "rental",
            DealType::Viewing => "viewing",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ServerError> {
        match s {
            "purchase" => Ok(DealType::Purchase),
            "rental" => Ok(DealType::Rental),
            "viewing" => Ok(DealType::Viewing),
            other => Err(ServerError::BadRequest(format!(
                "unknown deal type: {other}"
            ))),
        }
    }
}

/// Lead lifecycle status. Valid edges live in `domain::lifecycle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LeadStatus {
    New,
    Contacted,
    InProgress,
    Closed,
    Lost,
}

impl LeadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::InProgress => "in-progress",
            LeadStatus::Closed => "closed",
            LeadStatus::Lost => "lost",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ServerError> {
        match s {
            "new" => Ok(LeadStatus::New),
            "contacted" => Ok(LeadStatus::Contacted),
            "in-progress" => Ok(LeadStatus::InProgress),
            "closed" => Ok(LeadStatus::Closed),
            "lost" => Ok(LeadStatus::Lost),
            other => Err(ServerError::BadRequest(format!(
                "unknown lead status: {other}"
            ))),
        }
    }
}

/// Account roles as the auth collaborator reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Agent,
    Landlord,
    #[serde(rename = "Property Owner")]
    PropertyOwner,
    Tenant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Agent => "Agent",
            Role::Landlord => "Landlord",
            Role::PropertyOwner => "Property Owner",
            Role::Tenant => "Tenant",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ServerError> {
        match s {
            "Admin" => Ok(Role::Admin),
            "Agent" => Ok(Role::Agent),
            "Landlord" => Ok(Role::Landlord),
            "Property Owner" => Ok(Role::PropertyOwner),
            "Tenant" => Ok(Role::Tenant),
            other => Err(ServerError::BadRequest(format!("unknown role: {other}"))),
        }
    }
}

/// Point-in-time contact snapshot captured when the lead is created.
/// Later listing or profile edits never reach back into this.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub whatsapp_number: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

impl ChatRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Model => "model",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ServerError> {
        match s {
            "user" => Ok(ChatRole::User),
            "model" => Ok(ChatRole::Model),
            other => Err(ServerError::BadRequest(format!(
                "unknown chat role: {other}"
            ))),
        }
    }
}

/// Deal-closure signal attached to a chat message by the upstream
/// conversation layer. All fields optional; the classifier decides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageMetadata {
    pub deal_closure: Option<bool>,
    pub deal_type: Option<DealType>,
    pub confidence: Option<f64>,
}

/// One message of a conversation, as handed over by the chat transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub metadata: Option<MessageMetadata>,
}

/// Output of the classifier: enough to create a lead, nothing persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadDraft {
    pub deal_type: DealType,
    /// True when the draft came from an explicit dealClosure flag rather
    /// than the confidence threshold.
    pub explicit_closure: bool,
    pub confidence: Option<f64>,
}
