//! Narrow interfaces to the systems the conversation engine drives.
//!
//! The engine only sees these traits; HTTP, SQLite and Telegram adapters
//! implement them elsewhere, and tests swap in in-memory mocks.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;

use crate::chatbot::action::OutboundAction;
use crate::chatbot::profile::UserProfile;

/// Errors from the profile store.
#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    Serde(serde_json::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite(e) => write!(f, "database error: {e}"),
            Self::Serde(e) => write!(f, "corrupt profile record: {e}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sqlite(e) => Some(e),
            Self::Serde(e) => Some(e),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Sqlite(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e)
    }
}

/// Errors from the HTTP-backed services.
#[derive(Debug)]
pub enum GatewayError {
    Http(String),
    Api(String),
    Parse(String),
    Empty,
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "HTTP error: {e}"),
            Self::Api(e) => write!(f, "API error: {e}"),
            Self::Parse(e) => write!(f, "Parse error: {e}"),
            Self::Empty => write!(f, "Empty response"),
        }
    }
}

impl std::error::Error for GatewayError {}

/// Per-user record storage, keyed by sender id.
pub trait ProfileStore: Send + Sync {
    fn get(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError>;
    fn put(&self, user_id: &str, profile: &UserProfile) -> Result<(), StoreError>;
}

/// Fields of a quote request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    pub phone: String,
    /// `YYYY-MM-DD`
    pub birth_date: String,
    pub name: String,
    pub email: String,
    pub sex: String,
    pub plan: String,
    pub amounts: Vec<String>,
    /// Ask the service to drop dependents attached to earlier quotes.
    pub replace_beneficiaries: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeneficiaryRequest {
    pub owner: String,
    /// `YYYY-MM-DD`
    pub birth_date: String,
    pub relationship: String,
    pub ordinal: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentAssignment {
    pub phone: String,
    pub name: String,
    pub policy: String,
}

/// A rendered document the transport can fetch by URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLink {
    pub url: String,
    pub filename: String,
}

/// Quote engine. An empty id means the operation failed.
#[async_trait]
pub trait QuotingGateway: Send + Sync {
    async fn quote(&self, request: &QuoteRequest) -> Result<String, GatewayError>;
    async fn add_beneficiary(&self, request: &BeneficiaryRequest) -> Result<String, GatewayError>;
    async fn assign_to_agent(&self, request: &AgentAssignment) -> Result<String, GatewayError>;
    /// Render the quotation document and return where it can be downloaded.
    async fn render_quote(&self, quotation_id: &str) -> Result<DocumentLink, GatewayError>;
}

/// Folder listings of the document repository.
#[async_trait]
pub trait DocumentCatalog: Send + Sync {
    /// `label → path` for the folder, or `None` when the listing failed.
    async fn list_files(&self, folder: &str) -> Option<BTreeMap<String, String>>;
}

/// Which assistant answers free-text questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persona {
    /// Customer-facing insurance assistant.
    Advisor,
    /// Developer assistant.
    Gandalf,
}

/// Chat-completion service.
#[async_trait]
pub trait AssistantGateway: Send + Sync {
    async fn ask(&self, persona: Persona, question: &str, model: &str) -> Result<String, GatewayError>;
}

/// Errors from the messaging transport.
#[derive(Debug)]
pub struct TransportError(pub String);

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "delivery failed: {}", self.0)
    }
}

impl std::error::Error for TransportError {}

/// Outbound message delivery.
#[async_trait]
pub trait MessagingTransport: Send + Sync {
    async fn send(&self, recipient: &str, action: &OutboundAction) -> Result<(), TransportError>;
}
