//! Keyword shortcuts registered by menus.
//!
//! Every option shown in a menu is remembered as `label → step`, so typing
//! the label later jumps straight to the step that handles it, even when the
//! stored step is stale. Registration only ever adds keys: labels from older
//! menus stay live for the life of the profile.

use std::collections::HashMap;

use crate::chatbot::profile::{StepId, UserProfile};

/// Register `options` as shortcuts to `target`, with per-option overrides.
///
/// Keys are case-folded. Existing keys for other labels are kept.
pub fn register_options<S: AsRef<str>>(
    profile: &mut UserProfile,
    options: &[S],
    target: StepId,
    overrides: &HashMap<String, StepId>,
) {
    for option in options {
        let key = option.as_ref().trim().to_lowercase();
        let step = overrides.get(&key).copied().unwrap_or(target);
        profile.history.insert(key, step);
    }
}

/// Register `options` as shortcuts to a single step.
pub fn register<S: AsRef<str>>(profile: &mut UserProfile, options: &[S], target: StepId) {
    register_options(profile, options, target, &HashMap::new());
}

/// Step registered for this normalized input, if any.
pub fn lookup(profile: &UserProfile, input: &str) -> Option<StepId> {
    profile.history.get(input).copied()
}

/// Override the stored step when the input is a registered shortcut.
///
/// Returns the step that was jumped to.
pub fn resolve(profile: &mut UserProfile, input: &str) -> Option<StepId> {
    let step = lookup(profile, input)?;
    profile.step = step;
    Some(step)
}
