//! Operator commands over stored profiles.

use std::collections::BTreeMap;
use std::fmt;

use tracing::info;

use crate::chatbot::gateways::{ProfileStore, StoreError};
use crate::chatbot::profile::{Flag, Mode, Role, StepId, UserProfile};

#[derive(Debug)]
pub enum AdminError {
    NotFound(String),
    Store(StoreError),
}

impl fmt::Display for AdminError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "no profile for {id}"),
            Self::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for AdminError {}

impl From<StoreError> for AdminError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

/// Shortcut table every reset profile starts with.
pub fn seeded_history() -> BTreeMap<String, StepId> {
    BTreeMap::from([
        ("hola".to_string(), StepId::Start),
        ("/start".to_string(), StepId::Start),
    ])
}

fn load(store: &dyn ProfileStore, user_id: &str) -> Result<UserProfile, AdminError> {
    store
        .get(user_id)?
        .ok_or_else(|| AdminError::NotFound(user_id.to_string()))
}

fn save(store: &dyn ProfileStore, user_id: &str, profile: UserProfile) -> Result<UserProfile, AdminError> {
    store.put(user_id, &profile)?;
    Ok(profile)
}

/// Back to the start with the given role; shortcuts and menu state are dropped.
fn restart_as(store: &dyn ProfileStore, user_id: &str, role: Role) -> Result<UserProfile, AdminError> {
    let mut profile = load(store, user_id)?;
    profile.step = StepId::Start;
    profile.role = role;
    profile.history = seeded_history();
    profile.beneficiary_count = 0;
    profile.pending_relationship = None;
    profile.document_index = None;
    profile.base_path = None;
    info!("🔄 Reset {user_id} as {role:?}");
    save(store, user_id, profile)
}

pub fn show(store: &dyn ProfileStore, user_id: &str) -> Result<UserProfile, AdminError> {
    load(store, user_id)
}

pub fn reset(store: &dyn ProfileStore, user_id: &str) -> Result<UserProfile, AdminError> {
    restart_as(store, user_id, Role::User)
}

pub fn make_admin(store: &dyn ProfileStore, user_id: &str) -> Result<UserProfile, AdminError> {
    restart_as(store, user_id, Role::Admin)
}

pub fn set_name(store: &dyn ProfileStore, user_id: &str, name: &str) -> Result<UserProfile, AdminError> {
    let mut profile = load(store, user_id)?;
    profile.name = Some(name.trim().to_string());
    save(store, user_id, profile)
}

/// Replace whatever is stored with a fresh admin profile.
pub fn add_admin(store: &dyn ProfileStore, user_id: &str) -> Result<UserProfile, AdminError> {
    let profile = UserProfile {
        role: Role::Admin,
        history: seeded_history(),
        ..UserProfile::new_for("")
    };
    info!("➕ Added admin {user_id}");
    save(store, user_id, profile)
}

/// Replace whatever is stored with a fresh developer profile.
pub fn add_developer(store: &dyn ProfileStore, user_id: &str) -> Result<UserProfile, AdminError> {
    let profile = UserProfile {
        role: Role::Developer,
        developer_enabled: Flag::On,
        history: seeded_history(),
        ..UserProfile::new_for("")
    };
    info!("➕ Added developer {user_id}");
    save(store, user_id, profile)
}

/// Turn on the master menu for an existing profile.
pub fn enable_master(store: &dyn ProfileStore, user_id: &str) -> Result<UserProfile, AdminError> {
    let mut profile = load(store, user_id)?;
    profile.history = seeded_history();
    profile.master = Flag::On;
    profile.mode = Mode::Normal;
    info!("👑 Master menu on for {user_id}");
    save(store, user_id, profile)
}

/// Set the assistant model for a profile; blank clears the override.
pub fn set_model(store: &dyn ProfileStore, user_id: &str, model: &str) -> Result<UserProfile, AdminError> {
    let mut profile = load(store, user_id)?;
    let model = model.trim();
    profile.model_name = (!model.is_empty()).then(|| model.to_string());
    save(store, user_id, profile)
}

/// Create the operator record that holds the assistant's instructions.
///
/// Existing instructions are kept.
pub fn seed_operator(store: &dyn ProfileStore, key: &str, instructions: &str) -> Result<UserProfile, AdminError> {
    let mut record = store.get(key)?.unwrap_or_default();
    if record.instructions.is_none() {
        record.instructions = Some(instructions.to_string());
    }
    save(store, key, record)
}
