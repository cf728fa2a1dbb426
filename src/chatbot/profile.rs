//! Per-user conversation record.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Position of a user in the conversation graph.
///
/// The serialized names are the ones stored in existing profile records, so
/// they must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StepId {
    #[default]
    #[serde(rename = "start")]
    Start,
    #[serde(rename = "master")]
    Master,
    #[serde(rename = "askedWelcome")]
    AskedWelcome,
    #[serde(rename = "askedBirthdate")]
    AskedBirthdate,
    #[serde(rename = "askedOnlyName")]
    AskedOnlyName,
    #[serde(rename = "askedName")]
    AskedName,
    #[serde(rename = "askedEmail")]
    AskedEmail,
    #[serde(rename = "askedSex")]
    AskedSex,
    #[serde(rename = "askBenefit")]
    AskBenefit,
    #[serde(rename = "askedParent")]
    AskedParent,
    #[serde(rename = "askedBirthdateParent")]
    AskedBirthdateParent,
    #[serde(rename = "askedFamily")]
    AskedFamily,
    #[serde(rename = "end")]
    End,
    /// Persisted by older flows; no rule handles it, so it lands on the fallback.
    #[serde(rename = "endCotiza")]
    EndCotiza,
    #[serde(rename = "additionalHelp")]
    AdditionalHelp,
    #[serde(rename = "waitForQuestion")]
    WaitForQuestion,
    #[serde(rename = "confirmContinue")]
    ConfirmContinue,
    #[serde(rename = "askedAdmin")]
    AskedAdmin,
    #[serde(rename = "askedMaster")]
    AskedMaster,
    #[serde(rename = "askedTrainer")]
    AskedTrainer,
    #[serde(rename = "gandalf")]
    Gandalf,
    #[serde(rename = "sub_category_selection")]
    SubCategorySelection,
    #[serde(rename = "company_selection")]
    CompanySelection,
    #[serde(rename = "document_choice")]
    DocumentChoice,
    #[serde(rename = "finalizado")]
    Finished,
}

impl StepId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepId::Start => "start",
            StepId::Master => "master",
            StepId::AskedWelcome => "askedWelcome",
            StepId::AskedBirthdate => "askedBirthdate",
            StepId::AskedOnlyName => "askedOnlyName",
            StepId::AskedName => "askedName",
            StepId::AskedEmail => "askedEmail",
            StepId::AskedSex => "askedSex",
            StepId::AskBenefit => "askBenefit",
            StepId::AskedParent => "askedParent",
            StepId::AskedBirthdateParent => "askedBirthdateParent",
            StepId::AskedFamily => "askedFamily",
            StepId::End => "end",
            StepId::EndCotiza => "endCotiza",
            StepId::AdditionalHelp => "additionalHelp",
            StepId::WaitForQuestion => "waitForQuestion",
            StepId::ConfirmContinue => "confirmContinue",
            StepId::AskedAdmin => "askedAdmin",
            StepId::AskedMaster => "askedMaster",
            StepId::AskedTrainer => "askedTrainer",
            StepId::Gandalf => "gandalf",
            StepId::SubCategorySelection => "sub_category_selection",
            StepId::CompanySelection => "company_selection",
            StepId::DocumentChoice => "document_choice",
            StepId::Finished => "finalizado",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How free text is routed when no structural rule claims it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Normal,
    Chatgpt,
    Gandalf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
    Developer,
}

impl Role {
    /// Admins and developers get the staff wording and the short "Volver" button.
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::Developer)
    }
}

/// Stored as `ON`/`OFF` for compatibility with existing records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Flag {
    #[serde(rename = "ON", alias = "on")]
    On,
    #[default]
    #[serde(rename = "OFF", alias = "off")]
    Off,
}

impl Flag {
    pub fn is_on(&self) -> bool {
        matches!(self, Flag::On)
    }
}

/// Product line every quote is issued for.
pub const DEFAULT_POLICY_KIND: &str = "Salud";

/// A chat participant's conversation state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub step: StepId,
    pub mode: Mode,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
    pub policy_kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quotation_id: Option<String>,
    pub beneficiary_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_relationship: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_index: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
    /// Keyword shortcuts registered by menus. Keys are case-folded.
    pub history: BTreeMap<String, StepId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    pub master: Flag,
    pub developer_enabled: Flag,
    /// Shared trainer notes; only present on the operator record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl UserProfile {
    /// Profile for a sender seen for the first time.
    pub fn new_for(display_name: &str) -> Self {
        let display_name = display_name.trim();
        Self {
            name: (!display_name.is_empty()).then(|| display_name.to_string()),
            policy_kind: DEFAULT_POLICY_KIND.to_string(),
            ..Self::default()
        }
    }

    /// Name to address the user by: the stored one, else the transport display name.
    pub fn display_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => fallback.trim(),
        }
    }

    /// Model override, honored only when non-blank.
    pub fn model_override(&self) -> Option<&str> {
        self.model_name
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }

    /// Looks up a document entry by its case-folded label.
    pub fn document_path(&self, label: &str) -> Option<&str> {
        self.document_index.as_ref().and_then(|index| {
            index
                .iter()
                .find(|(k, _)| k.to_lowercase() == label)
                .map(|(_, v)| v.as_str())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_profile_defaults() {
        let profile = UserProfile::new_for("");
        assert_eq!(profile.step, StepId::Start);
        assert_eq!(profile.mode, Mode::Normal);
        assert_eq!(profile.role, Role::User);
        assert_eq!(profile.name, None);
        assert_eq!(profile.policy_kind, "Salud");
        assert!(profile.history.is_empty());
        assert!(!profile.master.is_on());
    }

    #[test]
    fn test_new_profile_keeps_display_name() {
        let profile = UserProfile::new_for("  Ana Pérez ");
        assert_eq!(profile.name.as_deref(), Some("Ana Pérez"));
    }

    #[test]
    fn test_step_names_round_trip_through_json() {
        let json = r#"{"step":"sub_category_selection","mode":"gandalf","role":"admin","master":"ON"}"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.step, StepId::SubCategorySelection);
        assert_eq!(profile.mode, Mode::Gandalf);
        assert_eq!(profile.role, Role::Admin);
        assert!(profile.master.is_on());
        assert!(!profile.developer_enabled.is_on());

        let out = serde_json::to_string(&profile).unwrap();
        assert!(out.contains(r#""step":"sub_category_selection""#));
        assert!(out.contains(r#""master":"ON""#));
    }

    #[test]
    fn test_unknown_step_is_rejected() {
        let json = r#"{"step":"somewhere"}"#;
        assert!(serde_json::from_str::<UserProfile>(json).is_err());
    }

    #[test]
    fn test_model_override_ignores_blank() {
        let mut profile = UserProfile::default();
        assert_eq!(profile.model_override(), None);
        profile.model_name = Some("   ".to_string());
        assert_eq!(profile.model_override(), None);
        profile.model_name = Some("gpt-4o-mini".to_string());
        assert_eq!(profile.model_override(), Some("gpt-4o-mini"));
    }

    #[test]
    fn test_document_path_is_case_insensitive() {
        let mut profile = UserProfile::default();
        profile.document_index = Some(BTreeMap::from([(
            "Tarifas 2024.pdf".to_string(),
            "https://docs.example/riesgos/Tarifas 2024.pdf".to_string(),
        )]));
        assert_eq!(
            profile.document_path("tarifas 2024.pdf"),
            Some("https://docs.example/riesgos/Tarifas 2024.pdf")
        );
        assert_eq!(profile.document_path("otro"), None);
    }

    #[test]
    fn test_display_name_falls_back() {
        let mut profile = UserProfile::default();
        assert_eq!(profile.display_name(" Luis "), "Luis");
        profile.name = Some("Marta Gil".to_string());
        assert_eq!(profile.display_name("Luis"), "Marta Gil");
    }
}
