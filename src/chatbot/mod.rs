//! Chatbot module - the insurance quoting conversation and its adapters.

pub mod action;
pub mod admin;
pub mod assistant;
pub mod database;
pub mod documents;
pub mod engine;
pub mod gateways;
pub mod history;
pub mod profile;
pub mod quoting;
pub mod rules;
pub mod script;
pub mod segment;
pub mod telegram;
pub mod turns;
pub mod validate;


pub use action::{Outbound, OutboundAction};
pub use assistant::Client as AssistantClient;
pub use database::Database;
pub use documents::HttpDocumentCatalog;
pub use engine::{dispatch, ConversationEngine, EngineSettings, InboundEvent, QuotePlan};
pub use gateways::{
    AgentAssignment, AssistantGateway, BeneficiaryRequest, DocumentCatalog, DocumentLink, GatewayError,
    MessagingTransport, Persona, ProfileStore, QuoteRequest, QuotingGateway, StoreError, TransportError,
};
pub use profile::{Flag, Mode, Role, StepId, UserProfile};
pub use quoting::{HttpQuotingGateway, QuotingEndpoints};
pub use telegram::TelegramClient;
pub use turns::TurnLocks;
