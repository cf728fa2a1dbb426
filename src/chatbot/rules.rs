//! Transition table of the conversation.
//!
//! Rules are checked in order and the first whose step and guard both match
//! wins. Step-specific rules fall through to [`FALLBACK`] when no guard
//! accepts the input.

use crate::chatbot::engine::EngineSettings;
use crate::chatbot::profile::{Mode, StepId, UserProfile};
use crate::chatbot::script;
use crate::chatbot::validate::{is_valid_email, is_valid_relationship, parse_date};

/// What a rule does once selected. Each variant has one handler in the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Greet,
    MasterMenu,
    OpenAssistant,
    StoreName,
    StoreBirthdate,
    RepromptBirthdate,
    AssignAnalyst,
    StoreContactName,
    StoreEmail,
    RepromptEmail,
    StoreSex,
    AddDependent,
    SkipDependents,
    StoreRelationship,
    RepromptRelationship,
    StoreDependent,
    RepromptDependentBirthdate,
    BuildQuotes,
    OfferMoreHelp,
    Farewell,
    InviteRestart,
    ResumeQuestions,
    ForwardFollowUp,
    KeepWaiting,
    AnswerQuestion,
    ConfirmYes,
    ConfirmRestart,
    ConfirmFarewell,
    ChooseArea,
    TalkToAssistant,
    AskSubarea,
    BecomeUser,
    BecomeAssociate,
    BecomeDeveloper,
    BecomeTrainer,
    Train,
    EnterGandalf,
    RejectCategory,
    ChooseSubcategory,
    ChooseInsurer,
    ChooseDocument,
    Fallback,
}

/// Everything a guard may look at.
pub struct RuleContext<'a> {
    pub profile: &'a UserProfile,
    /// Normalized input.
    pub input: &'a str,
    pub settings: &'a EngineSettings,
}

pub struct Rule {
    pub name: &'static str,
    /// `None` matches any step.
    pub step: Option<StepId>,
    pub guard: fn(&RuleContext) -> bool,
    pub transition: Transition,
}

impl Rule {
    fn matches(&self, ctx: &RuleContext) -> bool {
        self.step.is_none_or(|step| step == ctx.profile.step) && (self.guard)(ctx)
    }
}

fn always(_: &RuleContext) -> bool {
    true
}

fn is_assistant_keyword(ctx: &RuleContext) -> bool {
    ctx.settings.assistant_keywords.iter().any(|k| k == ctx.input)
}

fn greets(ctx: &RuleContext) -> bool {
    let p = ctx.profile;
    !p.master.is_on()
        && (p.step == StepId::Start || ctx.input == "hola" || ctx.input == "/start")
        && !is_assistant_keyword(ctx)
        && p.mode == Mode::Normal
}

fn mode_normal(ctx: &RuleContext) -> bool {
    ctx.profile.mode == Mode::Normal
}

fn mode_chatgpt(ctx: &RuleContext) -> bool {
    ctx.profile.mode == Mode::Chatgpt
}

fn valid_date(ctx: &RuleContext) -> bool {
    parse_date(ctx.input).is_some()
}

fn valid_email(ctx: &RuleContext) -> bool {
    is_valid_email(ctx.input)
}

fn valid_relationship(ctx: &RuleContext) -> bool {
    is_valid_relationship(ctx.input)
}

fn says_yes(ctx: &RuleContext) -> bool {
    ctx.input == "si"
}

fn says_no(ctx: &RuleContext) -> bool {
    ctx.input == "no"
}

fn says_continue(ctx: &RuleContext) -> bool {
    ctx.input == "continuar"
}

fn wants_restart(ctx: &RuleContext) -> bool {
    script::is_restart_request(ctx.input) || ctx.input.starts_with("hola")
}

fn wants_requote(ctx: &RuleContext) -> bool {
    script::is_restart_request(ctx.input)
}

fn known_area(ctx: &RuleContext) -> bool {
    script::subcategories(ctx.input).is_some()
}

fn talks_to_bot(ctx: &RuleContext) -> bool {
    ctx.input == script::talk_to_bot(&ctx.settings.bot_name).to_lowercase()
}

fn picks_user(ctx: &RuleContext) -> bool {
    ctx.input == "usuario"
}

fn picks_associate(ctx: &RuleContext) -> bool {
    ctx.input == "asociado"
}

fn picks_developer(ctx: &RuleContext) -> bool {
    ctx.input == "desarrollador" && ctx.profile.developer_enabled.is_on()
}

fn picks_master(ctx: &RuleContext) -> bool {
    ctx.input == "master"
}

fn unknown_area(ctx: &RuleContext) -> bool {
    ctx.profile
        .category
        .as_deref()
        .and_then(script::subcategories)
        .is_none()
}

macro_rules! rule {
    ($name:literal, any, $guard:expr, $transition:ident) => {
        Rule {
            name: $name,
            step: None,
            guard: $guard,
            transition: Transition::$transition,
        }
    };
    ($name:literal, $step:ident, $guard:expr, $transition:ident) => {
        Rule {
            name: $name,
            step: Some(StepId::$step),
            guard: $guard,
            transition: Transition::$transition,
        }
    };
}

/// Rules in priority order.
pub static RULES: &[Rule] = &[
    rule!("greet", any, greets, Greet),
    rule!("master_menu", Master, always, MasterMenu),
    rule!("assistant_keyword", any, is_assistant_keyword, OpenAssistant),
    rule!("store_name", AskedWelcome, mode_normal, StoreName),
    rule!("store_birthdate", AskedBirthdate, valid_date, StoreBirthdate),
    rule!("reprompt_birthdate", AskedBirthdate, always, RepromptBirthdate),
    rule!("assign_analyst", AskedOnlyName, always, AssignAnalyst),
    rule!("store_contact_name", AskedName, always, StoreContactName),
    rule!("store_email", AskedEmail, valid_email, StoreEmail),
    rule!("reprompt_email", AskedEmail, always, RepromptEmail),
    rule!("store_sex", AskedSex, always, StoreSex),
    rule!("add_dependent", AskBenefit, says_yes, AddDependent),
    rule!("skip_dependents", AskBenefit, always, SkipDependents),
    rule!("store_relationship", AskedParent, valid_relationship, StoreRelationship),
    rule!("reprompt_relationship", AskedParent, always, RepromptRelationship),
    rule!("store_dependent", AskedBirthdateParent, valid_date, StoreDependent),
    rule!("reprompt_dependent_birthdate", AskedBirthdateParent, always, RepromptDependentBirthdate),
    rule!("build_quotes", AskedFamily, always, BuildQuotes),
    rule!("offer_more_help", End, always, OfferMoreHelp),
    rule!("farewell", AdditionalHelp, says_no, Farewell),
    rule!("invite_restart", AdditionalHelp, wants_restart, InviteRestart),
    rule!("resume_questions", AdditionalHelp, says_yes, ResumeQuestions),
    rule!("forward_follow_up", AdditionalHelp, mode_chatgpt, ForwardFollowUp),
    rule!("keep_waiting", WaitForQuestion, says_continue, KeepWaiting),
    rule!("answer_question", WaitForQuestion, always, AnswerQuestion),
    rule!("confirm_yes", ConfirmContinue, says_yes, ConfirmYes),
    rule!("confirm_restart", ConfirmContinue, wants_requote, ConfirmRestart),
    rule!("confirm_farewell", ConfirmContinue, always, ConfirmFarewell),
    rule!("choose_area", AskedAdmin, known_area, ChooseArea),
    rule!("talk_to_assistant", AskedAdmin, talks_to_bot, TalkToAssistant),
    rule!("ask_subarea", AskedAdmin, always, AskSubarea),
    rule!("become_user", AskedMaster, picks_user, BecomeUser),
    rule!("become_associate", AskedMaster, picks_associate, BecomeAssociate),
    rule!("become_developer", AskedMaster, picks_developer, BecomeDeveloper),
    rule!("become_trainer", AskedMaster, picks_master, BecomeTrainer),
    rule!("train", AskedTrainer, always, Train),
    rule!("enter_gandalf", Gandalf, always, EnterGandalf),
    rule!("reject_category", SubCategorySelection, unknown_area, RejectCategory),
    rule!("choose_subcategory", SubCategorySelection, always, ChooseSubcategory),
    rule!("choose_insurer", CompanySelection, always, ChooseInsurer),
    rule!("choose_document", DocumentChoice, always, ChooseDocument),
];

pub static FALLBACK: Rule = rule!("fallback", any, always, Fallback);

/// First matching rule, or [`FALLBACK`].
pub fn select(ctx: &RuleContext) -> &'static Rule {
    RULES.iter().find(|rule| rule.matches(ctx)).unwrap_or(&FALLBACK)
}
