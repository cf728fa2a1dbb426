//! Conversation engine - turns one inbound event into profile updates and outbound actions.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::chatbot::action::{Outbound, Reply};
use crate::chatbot::documents::{self, Listing};
use crate::chatbot::gateways::{
    AgentAssignment, AssistantGateway, BeneficiaryRequest, DocumentCatalog, DocumentLink, MessagingTransport,
    Persona, ProfileStore, QuoteRequest, QuotingGateway,
};
use crate::chatbot::history;
use crate::chatbot::profile::{DEFAULT_POLICY_KIND, Mode, Role, StepId, UserProfile};
use crate::chatbot::rules::{self, RuleContext, Transition};
use crate::chatbot::script;
use crate::chatbot::segment::segment;
use crate::chatbot::validate::{normalize, title_case, to_sql_date};

/// One quote the bot prepares at the end of the questionnaire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotePlan {
    pub plan: String,
    pub amounts: Vec<String>,
    /// Drop dependents attached to earlier quotes of the same customer.
    #[serde(default)]
    pub replace_beneficiaries: bool,
}

/// Tunables of the conversation.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub bot_name: String,
    pub company_name: String,
    pub developer_bot_name: String,
    /// Our own sender id; events from it are ignored.
    pub bot_user_id: Option<String>,
    /// Normalized inputs that open the assistant from any step.
    pub assistant_keywords: Vec<String>,
    pub default_model: String,
    pub max_segment_length: usize,
    pub short_pause: Duration,
    pub document_pause: Duration,
    pub quote_plans: Vec<QuotePlan>,
    /// URL prefix of the document repository.
    pub document_root: String,
    /// Extensions (without dot) that mark a catalog entry as a file.
    pub document_extensions: Vec<String>,
    pub insurers: Vec<String>,
    /// Profile key of the record holding the assistant's instructions.
    pub operator_key: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            bot_name: "TUBOT".to_string(),
            company_name: "TUEMPRESA".to_string(),
            developer_bot_name: "TUBOTSECUNDARIO".to_string(),
            bot_user_id: None,
            assistant_keywords: vec!["chatgpt".to_string(), "dr seguro".to_string()],
            default_model: "gpt-4o".to_string(),
            max_segment_length: 1000,
            short_pause: Duration::from_secs(1),
            document_pause: Duration::from_secs(15),
            quote_plans: default_quote_plans(),
            document_root: String::new(),
            document_extensions: vec!["pdf".to_string()],
            insurers: (1..=10).map(|i| format!("Compania{i}")).collect(),
            operator_key: "deyna".to_string(),
        }
    }
}

pub fn default_quote_plans() -> Vec<QuotePlan> {
    vec![
        QuotePlan {
            plan: "Amplio".to_string(),
            amounts: vec!["100000".to_string(), "200000".to_string()],
            replace_beneficiaries: false,
        },
        QuotePlan {
            plan: "Amplio".to_string(),
            amounts: vec!["50000".to_string(), "30000".to_string(), "20000".to_string()],
            replace_beneficiaries: true,
        },
    ]
}

/// An inbound message or button press, already stripped of transport details.
#[derive(Debug, Clone, Default)]
pub struct InboundEvent {
    pub sender_id: String,
    pub raw_text: String,
    pub display_name: String,
    /// Id of the pressed button; takes precedence over `raw_text`.
    pub button_payload: Option<String>,
}

impl InboundEvent {
    pub fn text(sender_id: &str, text: &str) -> Self {
        Self {
            sender_id: sender_id.to_string(),
            raw_text: text.to_string(),
            ..Self::default()
        }
    }

    pub fn button(sender_id: &str, payload: &str) -> Self {
        Self {
            sender_id: sender_id.to_string(),
            button_payload: Some(payload.to_string()),
            ..Self::default()
        }
    }

    /// What the user said: the payload if there is one, else the typed text.
    fn content(&self) -> &str {
        self.button_payload
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(&self.raw_text)
            .trim()
    }
}

/// A validated turn.
#[derive(Debug, Clone, Copy)]
pub struct TurnInput<'a> {
    pub sender_id: &'a str,
    /// Case-folded and trimmed; what rules match on.
    pub text: &'a str,
    /// Trimmed, as typed.
    pub raw_text: &'a str,
    pub display_name: &'a str,
}

/// The conversation engine.
pub struct ConversationEngine {
    settings: EngineSettings,
    store: Arc<dyn ProfileStore>,
    quoting: Arc<dyn QuotingGateway>,
    catalog: Arc<dyn DocumentCatalog>,
    assistant: Arc<dyn AssistantGateway>,
}

impl ConversationEngine {
    pub fn new(
        settings: EngineSettings,
        store: Arc<dyn ProfileStore>,
        quoting: Arc<dyn QuotingGateway>,
        catalog: Arc<dyn DocumentCatalog>,
        assistant: Arc<dyn AssistantGateway>,
    ) -> Self {
        Self {
            settings,
            store,
            quoting,
            catalog,
            assistant,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Run one turn: load the profile, resolve shortcuts, apply the matching
    /// rule and persist. Returns the actions to deliver, in order.
    ///
    /// Callers must serialize turns of the same sender.
    pub async fn handle_event(&self, event: &InboundEvent) -> Vec<Outbound> {
        let sender = event.sender_id.trim();
        let raw_text = event.content();
        if sender.is_empty() || raw_text.is_empty() {
            debug!("Dropping malformed event from {:?}", event.sender_id);
            return Vec::new();
        }
        if self.settings.bot_user_id.as_deref() == Some(sender) {
            return Vec::new();
        }

        let display_name = title_case(event.display_name.trim());
        let mut profile = match self.store.get(sender) {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                info!("👤 New profile for {sender}");
                UserProfile::new_for(&display_name)
            }
            Err(e) => {
                error!("Failed to load profile {sender}: {e}");
                return Vec::new();
            }
        };

        let text = normalize(raw_text);
        if let Some(step) = history::resolve(&mut profile, &text) {
            debug!("Shortcut {text:?} → {step}");
        }
        if profile.master.is_on() && profile.step == StepId::Start {
            profile.step = StepId::Master;
        }

        info!(
            "💬 {sender} [{} / {:?}]: \"{}\"",
            profile.step,
            profile.mode,
            text.chars().take(50).collect::<String>()
        );

        let turn = TurnInput {
            sender_id: sender,
            text: &text,
            raw_text,
            display_name: &display_name,
        };
        let outbound = self.apply(&mut profile, &turn).await;

        if let Err(e) = self.store.put(sender, &profile) {
            error!("Failed to save profile {sender}: {e}");
        }
        outbound
    }

    /// Apply the first matching rule to `profile`.
    pub async fn apply(&self, profile: &mut UserProfile, turn: &TurnInput<'_>) -> Vec<Outbound> {
        let rule = rules::select(&RuleContext {
            profile: &*profile,
            input: turn.text,
            settings: &self.settings,
        });
        debug!("Rule {} at step {}", rule.name, profile.step);

        let mut reply = Reply::new();
        match rule.transition {
            Transition::Greet => self.greet(profile, turn, &mut reply),
            Transition::MasterMenu => self.master_menu(profile, turn, &mut reply),
            Transition::OpenAssistant => {
                reply.text(script::ASSISTANT_READY);
                profile.step = StepId::WaitForQuestion;
            }
            Transition::StoreName => {
                let name = title_case(turn.text);
                reply.text(script::nice_to_meet(&name));
                profile.name = Some(name);
                profile.step = StepId::AskedBirthdate;
            }
            Transition::StoreBirthdate => {
                profile.birth_date = Some(turn.text.to_string());
                reply.text(script::ASK_EMAIL);
                profile.step = StepId::AskedEmail;
            }
            Transition::RepromptBirthdate | Transition::RepromptDependentBirthdate => {
                reply.text(script::INVALID_DATE);
            }
            Transition::AssignAnalyst => self.assign_analyst(profile, turn, &mut reply).await,
            Transition::StoreContactName => {
                profile.name = Some(title_case(turn.text));
                reply.text(script::ASK_CONTACT_EMAIL);
                profile.step = StepId::AskedEmail;
            }
            Transition::StoreEmail => {
                profile.email = Some(turn.text.to_string());
                reply.buttons(script::ASK_SEX, &script::SEX);
                profile.step = StepId::AskedSex;
            }
            Transition::RepromptEmail => reply.text(script::INVALID_EMAIL),
            Transition::StoreSex => {
                profile.sex = Some(turn.text.to_string());
                profile.beneficiary_count = 0;
                reply.buttons(script::ASK_ADD_DEPENDENT, &script::YES_NO);
                profile.step = StepId::AskBenefit;
            }
            Transition::AddDependent => {
                reply.text(script::ASK_RELATIONSHIP);
                profile.step = StepId::AskedParent;
            }
            Transition::SkipDependents => {
                reply.buttons(script::NO_MORE_DEPENDENTS, &script::CONTINUE);
                profile.step = StepId::AskedFamily;
            }
            Transition::StoreRelationship => {
                reply.text(script::ask_dependent_birthdate(turn.text));
                profile.pending_relationship = Some(turn.text.to_string());
                profile.step = StepId::AskedBirthdateParent;
            }
            Transition::RepromptRelationship => reply.text(script::INVALID_RELATIONSHIP),
            Transition::StoreDependent => self.store_dependent(profile, turn, &mut reply).await,
            Transition::BuildQuotes => self.build_quotes(profile, turn, &mut reply).await,
            Transition::OfferMoreHelp => {
                let text = if profile.policy_kind == DEFAULT_POLICY_KIND {
                    script::QUOTE_DONE
                } else {
                    script::ANYTHING_ELSE
                };
                reply.buttons(text, &script::follow_up_buttons(profile.role));
                profile.step = StepId::AdditionalHelp;
            }
            Transition::Farewell | Transition::ConfirmFarewell => {
                reply.text(script::farewell(profile.role));
                profile.step = StepId::Finished;
                profile.mode = Mode::Normal;
            }
            Transition::InviteRestart => {
                reply.text(script::restart_invite(profile.role));
                profile.step = StepId::Start;
                profile.mode = Mode::Normal;
            }
            Transition::ResumeQuestions => {
                if profile.mode == Mode::Gandalf {
                    reply.text(script::GANDALF_READY);
                } else {
                    reply.text(script::WRITE_QUESTION);
                    profile.mode = Mode::Chatgpt;
                }
                profile.step = StepId::WaitForQuestion;
            }
            Transition::ForwardFollowUp => self.forward_follow_up(profile, turn, &mut reply).await,
            Transition::KeepWaiting => {}
            Transition::AnswerQuestion => self.answer_question(profile, turn, &mut reply).await,
            Transition::ConfirmYes => {
                reply.text(script::NEXT_QUESTION);
                profile.step = StepId::AdditionalHelp;
                profile.mode = Mode::Chatgpt;
            }
            Transition::ConfirmRestart => {
                reply.text(script::CAN_QUOTE_AGAIN);
                profile.step = StepId::Start;
                profile.mode = Mode::Normal;
            }
            Transition::ChooseArea => {
                let options: Vec<String> = script::subcategories(turn.text)
                    .unwrap_or_default()
                    .iter()
                    .map(|s| s.to_string())
                    .collect();
                history::register(profile, &options, StepId::SubCategorySelection);
                profile.category = Some(turn.text.to_string());
                profile.step = StepId::SubCategorySelection;
                reply.menu(script::PICK_SUBCATEGORY, options);
            }
            Transition::TalkToAssistant => {
                reply.text(script::ASSISTANT_READY);
                profile.step = StepId::WaitForQuestion;
                profile.mode = Mode::Chatgpt;
            }
            Transition::AskSubarea => {
                reply.text(script::ASK_SUBAREA);
                profile.step = StepId::Start;
            }
            Transition::BecomeUser => {
                profile.role = Role::User;
                profile.mode = Mode::Normal;
                reply.text_then_wait(
                    script::welcome(&self.settings.bot_name, &self.settings.company_name),
                    self.settings.short_pause,
                );
                reply.text(script::ASK_FULL_NAME);
                profile.step = StepId::AskedWelcome;
            }
            Transition::BecomeAssociate => {
                profile.role = Role::Admin;
                profile.mode = Mode::Normal;
                self.area_menu(profile, &mut reply);
            }
            Transition::BecomeDeveloper => {
                profile.role = Role::Developer;
                self.developer_greeting(profile, turn, &mut reply);
            }
            Transition::BecomeTrainer => {
                reply.text(script::TRAINER_PROMPT);
                profile.step = StepId::AskedTrainer;
            }
            Transition::Train => self.train(profile, turn, &mut reply).await,
            Transition::EnterGandalf => {
                reply.text(script::ASSISTANT_READY);
                profile.step = StepId::WaitForQuestion;
                profile.mode = Mode::Gandalf;
            }
            Transition::RejectCategory => reply.text(script::UNKNOWN_SUBCATEGORY),
            Transition::ChooseSubcategory => self.choose_subcategory(profile, turn, &mut reply).await,
            Transition::ChooseInsurer => self.choose_insurer(profile, turn, &mut reply).await,
            Transition::ChooseDocument => self.choose_document(profile, turn, &mut reply).await,
            Transition::Fallback => {
                reply.text(script::NOT_UNDERSTOOD);
                profile.step = StepId::Start;
                profile.mode = Mode::Normal;
            }
        }
        reply.into_items()
    }

    fn greet(&self, profile: &mut UserProfile, turn: &TurnInput<'_>, reply: &mut Reply) {
        profile.policy_kind = DEFAULT_POLICY_KIND.to_string();
        profile.quotation_id = None;

        let name = profile.display_name(turn.display_name).to_string();
        if name.is_empty() {
            self.welcome(reply);
            reply.text(script::ASK_FULL_NAME);
            profile.step = StepId::AskedWelcome;
            return;
        }
        // Quotes are issued under the stored name
        if profile.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
            profile.name = Some(name.clone());
        }

        match profile.role {
            Role::Admin => {
                reply.text(script::greet_named(
                    &name,
                    &self.settings.bot_name,
                    &self.settings.company_name,
                ));
                self.area_menu(profile, reply);
            }
            Role::Developer => self.developer_greeting(profile, turn, reply),
            Role::User => {
                self.welcome(reply);
                reply.text(script::ASK_BIRTHDATE);
                profile.step = StepId::AskedBirthdate;
            }
        }
    }

    fn welcome(&self, reply: &mut Reply) {
        reply.text_then_wait(
            script::welcome(&self.settings.bot_name, &self.settings.company_name),
            self.settings.short_pause,
        );
    }

    fn area_menu(&self, profile: &mut UserProfile, reply: &mut Reply) {
        let options = script::area_options(&self.settings.bot_name);
        history::register(profile, &options, StepId::AskedAdmin);
        profile.step = StepId::AskedAdmin;
        reply.menu(script::ASK_AREA, options);
    }

    fn developer_greeting(&self, profile: &mut UserProfile, turn: &TurnInput<'_>, reply: &mut Reply) {
        let name = profile.display_name(turn.display_name).to_string();
        reply.text(script::greet_developer(&name, &self.settings.developer_bot_name));
        profile.step = StepId::WaitForQuestion;
        profile.mode = Mode::Gandalf;
    }

    fn master_menu(&self, profile: &mut UserProfile, turn: &TurnInput<'_>, reply: &mut Reply) {
        profile.policy_kind = DEFAULT_POLICY_KIND.to_string();
        let name = profile.display_name(turn.display_name).to_string();
        reply.text(script::greet_named(
            &name,
            &self.settings.bot_name,
            &self.settings.company_name,
        ));

        let options = script::role_options(profile.developer_enabled.is_on());
        history::register(profile, &options, StepId::AskedMaster);
        profile.step = StepId::AskedMaster;
        reply.menu(script::ASK_ROLE, options);
    }

    async fn assign_analyst(&self, profile: &mut UserProfile, turn: &TurnInput<'_>, reply: &mut Reply) {
        let name = title_case(turn.text);
        let request = AgentAssignment {
            phone: turn.sender_id.to_string(),
            name: name.clone(),
            policy: profile.policy_kind.clone(),
        };
        match self.quoting.assign_to_agent(&request).await {
            Ok(id) if !id.is_empty() => info!("📋 Assigned {} to an analyst ({id})", turn.sender_id),
            Ok(_) => {
                warn!("Agent assignment for {} returned no id", turn.sender_id);
                reply.text(script::ASSIGNMENT_FAILED);
            }
            Err(e) => {
                warn!("Agent assignment for {} failed: {e}", turn.sender_id);
                reply.text(script::ASSIGNMENT_FAILED);
            }
        }

        reply.buttons(
            script::analyst_handoff(&name, &profile.policy_kind),
            &script::follow_up_buttons(Role::User),
        );
        profile.name = Some(name);
        profile.step = StepId::AdditionalHelp;
    }

    async fn store_dependent(&self, profile: &mut UserProfile, turn: &TurnInput<'_>, reply: &mut Reply) {
        profile.beneficiary_count += 1;
        let request = BeneficiaryRequest {
            owner: turn.sender_id.to_string(),
            birth_date: to_sql_date(turn.text).unwrap_or_default(),
            relationship: profile.pending_relationship.take().unwrap_or_default(),
            ordinal: profile.beneficiary_count,
        };
        match self.quoting.add_beneficiary(&request).await {
            Ok(id) if !id.is_empty() => {
                debug!("Beneficiary {} for {} stored as {id}", request.ordinal, request.owner)
            }
            Ok(_) => {
                warn!("Beneficiary for {} returned no id", request.owner);
                reply.text(script::BENEFICIARY_FAILED);
            }
            Err(e) => {
                warn!("Beneficiary for {} failed: {e}", request.owner);
                reply.text(script::BENEFICIARY_FAILED);
            }
        }

        reply.buttons(script::ASK_ADD_ANOTHER, &script::YES_NO);
        profile.step = StepId::AskBenefit;
    }

    async fn build_quotes(&self, profile: &mut UserProfile, turn: &TurnInput<'_>, reply: &mut Reply) {
        profile.beneficiary_count = 0;
        reply.text_then_wait(script::QUOTE_STATUS, self.settings.short_pause);

        for (i, plan) in self.settings.quote_plans.iter().enumerate() {
            if i > 0 {
                reply.text_then_wait(script::QUOTE_ALTERNATIVES, self.settings.short_pause);
            }
            match self.issue_quote(profile, turn.sender_id, plan).await {
                Some((quotation_id, link)) => {
                    reply.document(
                        script::quote_ready(&quotation_id),
                        link.url,
                        link.filename,
                        self.settings.document_pause,
                    );
                    if profile.quotation_id.is_none() {
                        profile.quotation_id = Some(quotation_id);
                    }
                }
                None => reply.text(script::QUOTE_FAILED),
            }
        }

        if profile.quotation_id.is_some() {
            reply.text(script::QUOTE_DONE);
        } else {
            reply.text(script::ANYTHING_ELSE);
        }
        profile.mode = Mode::Chatgpt;
        profile.step = StepId::WaitForQuestion;
    }

    async fn issue_quote(
        &self,
        profile: &UserProfile,
        phone: &str,
        plan: &QuotePlan,
    ) -> Option<(String, DocumentLink)> {
        let Some(request) = quote_request(profile, phone, plan) else {
            warn!("Incomplete questionnaire for {phone}, skipping plan {}", plan.plan);
            return None;
        };

        let quotation_id = match self.quoting.quote(&request).await {
            Ok(id) if !id.trim().is_empty() => id.trim().to_string(),
            Ok(_) => {
                warn!("Quote for {phone} returned no id");
                return None;
            }
            Err(e) => {
                warn!("Quote for {phone} failed: {e}");
                return None;
            }
        };

        match self.quoting.render_quote(&quotation_id).await {
            Ok(link) => {
                info!("📄 Quote {quotation_id} ready for {phone}");
                Some((quotation_id, link))
            }
            Err(e) => {
                warn!("Rendering quote {quotation_id} failed: {e}");
                None
            }
        }
    }

    fn persona_for(&self, profile: &UserProfile) -> Persona {
        if profile.mode == Mode::Gandalf || profile.role == Role::Developer {
            Persona::Gandalf
        } else {
            Persona::Advisor
        }
    }

    fn model_for<'a>(&'a self, profile: &'a UserProfile) -> &'a str {
        profile.model_override().unwrap_or(&self.settings.default_model)
    }

    /// Ask the assistant, turning failures into the apology text.
    async fn ask(&self, persona: Persona, question: &str, model: &str) -> String {
        match self.assistant.ask(persona, question, model).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Assistant ({persona:?}, {model}) failed: {e}");
                script::ASSISTANT_FAILED.to_string()
            }
        }
    }

    fn push_segments(&self, answer: &str, reply: &mut Reply) {
        for chunk in segment(answer, self.settings.max_segment_length) {
            if !chunk.is_empty() {
                reply.text_then_wait(chunk, self.settings.short_pause);
            }
        }
    }

    async fn answer_question(&self, profile: &mut UserProfile, turn: &TurnInput<'_>, reply: &mut Reply) {
        let persona = self.persona_for(profile);
        let answer = self.ask(persona, turn.text, self.model_for(profile)).await;
        self.push_segments(&answer, reply);
        reply.buttons(script::ANOTHER_QUESTION, &script::follow_up_buttons(profile.role));
        profile.step = StepId::AdditionalHelp;
    }

    async fn forward_follow_up(&self, profile: &mut UserProfile, turn: &TurnInput<'_>, reply: &mut Reply) {
        let answer = self.ask(Persona::Advisor, turn.text, self.model_for(profile)).await;
        match answer.trim() {
            script::TOKEN_START => {
                reply.text(script::QUOTE_AGAIN);
                profile.step = StepId::Start;
                profile.mode = Mode::Normal;
            }
            script::TOKEN_END => {
                reply.text(script::farewell(Role::User));
                profile.step = StepId::Finished;
                profile.mode = Mode::Normal;
            }
            _ => {
                self.push_segments(&answer, reply);
                reply.buttons(script::ANOTHER_QUESTION, &script::follow_up_buttons(profile.role));
                profile.step = StepId::ConfirmContinue;
            }
        }
    }

    async fn train(&self, profile: &mut UserProfile, turn: &TurnInput<'_>, reply: &mut Reply) {
        reply.text(script::TRAINER_WORKING);
        profile.step = StepId::Master;

        let key = &self.settings.operator_key;
        let mut record = match self.store.get(key) {
            Ok(Some(record)) if record.instructions.is_some() => record,
            Ok(_) => {
                warn!("Operator record {key} has no instructions");
                reply.text(script::TRAINER_MISSING);
                return;
            }
            Err(e) => {
                error!("Failed to load operator record {key}: {e}");
                reply.text(script::TRAINER_MISSING);
                return;
            }
        };

        if let Some(instructions) = record.instructions.as_mut() {
            instructions.push('\n');
            instructions.push_str(turn.raw_text);
        }
        if let Err(e) = self.store.put(key, &record) {
            error!("Failed to save operator record {key}: {e}");
            reply.text(script::TRAINER_MISSING);
            return;
        }

        let refresh = format!("{}:reborn", self.settings.bot_name);
        if let Err(e) = self
            .assistant
            .ask(Persona::Advisor, &refresh, &self.settings.default_model)
            .await
        {
            warn!("Assistant refresh failed: {e}");
        }
        info!("🧠 Instructions updated by {}", turn.sender_id);
        reply.text(script::TRAINER_DONE);
    }

    async fn choose_subcategory(&self, profile: &mut UserProfile, turn: &TurnInput<'_>, reply: &mut Reply) {
        profile.subcategory = Some(turn.text.to_string());

        if script::has_insurer_menu(turn.text) {
            let options = self.settings.insurers.clone();
            history::register(profile, &options, StepId::CompanySelection);
            profile.step = StepId::CompanySelection;
            reply.menu(script::PICK_INSURER, options);
            return;
        }

        let category = profile.category.clone().unwrap_or_default();
        let folder = format!("{category}/{}", turn.text);
        self.offer_folder(profile, &folder, turn.raw_text, reply).await;
    }

    async fn choose_insurer(&self, profile: &mut UserProfile, turn: &TurnInput<'_>, reply: &mut Reply) {
        let category = profile.category.clone().unwrap_or_default();
        let subcategory = profile.subcategory.clone().unwrap_or_default();
        let folder = format!("{category}/{subcategory}/{}", turn.text);
        self.offer_folder(profile, &folder, turn.raw_text, reply).await;
    }

    /// Open a taxonomy folder: one file is sent straight away, several entries
    /// become a menu.
    async fn offer_folder(&self, profile: &mut UserProfile, folder: &str, name_hint: &str, reply: &mut Reply) {
        let root = &self.settings.document_root;
        let Some(listing) = documents::open_folder(self.catalog.as_ref(), root, folder).await else {
            profile.base_path = None;
            reply.text(script::INVALID_OPTION);
            return;
        };

        if let Some((_, url)) = listing.single_document(&self.settings.document_extensions) {
            let filename = documents::document_filename(name_hint, url);
            reply.document(script::DOCUMENT_CAPTION, url, filename, Duration::ZERO);
            profile.base_path = Some(listing.base_path);
            profile.step = StepId::Start;
            return;
        }

        self.present_listing(profile, listing, reply);
    }

    fn present_listing(&self, profile: &mut UserProfile, listing: Listing, reply: &mut Reply) {
        let labels = listing.labels();
        history::register(profile, &labels, StepId::DocumentChoice);
        profile.base_path = Some(listing.base_path);
        profile.document_index = Some(listing.entries);
        profile.step = StepId::DocumentChoice;
        reply.menu(script::PICK_DOCUMENT, labels);
    }

    async fn choose_document(&self, profile: &mut UserProfile, turn: &TurnInput<'_>, reply: &mut Reply) {
        let root = &self.settings.document_root;
        let folder_url = match profile.document_path(turn.text).map(str::to_string) {
            Some(url) if documents::is_document(&url, &self.settings.document_extensions) => {
                let filename = documents::document_filename(turn.raw_text, &url);
                reply.document(script::DOCUMENT_CAPTION, url, filename, Duration::ZERO);
                profile.step = StepId::Start;
                return;
            }
            Some(url) => url,
            None => {
                let base = profile.base_path.as_deref().unwrap_or(root.as_str());
                format!("{}/{}", base.trim_end_matches('/'), turn.text)
            }
        };

        let folder = documents::catalog_folder(root, &folder_url);
        match documents::open_folder(self.catalog.as_ref(), root, &folder).await {
            Some(listing) => self.present_listing(profile, listing, reply),
            None => {
                reply.text(script::EMPTY_FOLDER);
                profile.step = StepId::Start;
            }
        }
    }
}

/// Quote request from the questionnaire answers, if they are complete.
fn quote_request(profile: &UserProfile, phone: &str, plan: &QuotePlan) -> Option<QuoteRequest> {
    Some(QuoteRequest {
        phone: phone.to_string(),
        birth_date: to_sql_date(profile.birth_date.as_deref()?)?,
        name: profile.name.clone()?,
        email: profile.email.clone()?,
        sex: profile.sex.clone()?,
        plan: plan.plan.clone(),
        amounts: plan.amounts.clone(),
        replace_beneficiaries: plan.replace_beneficiaries,
    })
}

/// Deliver a turn's actions in order, waiting out each pause.
///
/// Delivery failures are logged and the remaining actions still go out.
pub async fn dispatch(transport: &dyn MessagingTransport, recipient: &str, outbound: &[Outbound]) {
    for item in outbound {
        if let Err(e) = transport.send(recipient, &item.action).await {
            warn!("Failed to deliver to {recipient}: {e}");
        }
        if !item.pause.is_zero() {
            tokio::time::sleep(item.pause).await;
        }
    }
}
