//! Prompt rules and response selection

use crate::pattern::{Matcher, Trigger};
use crate::result::{Exchange, PatternError};
use tracing::debug;

/// A trigger paired with the canned response it produces.
///
/// A rule is either *guarded* (see [`Rule::once`]), in which case it fires at
/// most once per session, or unguarded, in which case it fires on every poll
/// iteration in which its trigger is present in the accumulated output.
///
/// # Examples
///
/// ```
/// use convex_deploy::{Rule, Trigger};
///
/// # fn example() -> Result<(), convex_deploy::PatternError> {
/// let rule = Rule::new("login", Trigger::exact("login?"), "n\n")?
///     .once()
///     .notice("No - Try without account");
/// assert!(rule.is_guarded());
/// # Ok(())
/// # }
/// ```
pub struct Rule {
    name: String,
    matcher: Box<dyn Matcher>,
    response: Vec<u8>,
    notice: String,
    guarded: bool,
}

impl Rule {
    /// Create an unguarded rule.
    ///
    /// The notice defaults to the rule name.
    ///
    /// # Errors
    ///
    /// Returns an error if the trigger cannot be compiled.
    pub fn new(
        name: impl Into<String>,
        trigger: Trigger,
        response: impl Into<Vec<u8>>,
    ) -> Result<Self, PatternError> {
        let name = name.into();
        Ok(Self {
            notice: name.clone(),
            name,
            matcher: trigger.to_matcher()?,
            response: response.into(),
            guarded: false,
        })
    }

    /// Fire at most once per session.
    pub fn once(mut self) -> Self {
        self.guarded = true;
        self
    }

    /// Set the text shown in the `[Auto-responding: ...]` console notice.
    pub fn notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = notice.into();
        self
    }

    /// Rule name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bytes written when the rule fires
    pub fn response(&self) -> &[u8] {
        &self.response
    }

    /// Whether the rule fires at most once
    pub fn is_guarded(&self) -> bool {
        self.guarded
    }
}

/// Ordered rule set with per-rule firing state.
///
/// Rules are tested in priority order and the first match wins for each
/// evaluation. A guarded rule that has already fired is skipped, so
/// evaluation falls through to the rules after it.
pub struct Responder {
    rules: Vec<Rule>,
    fired: Vec<usize>,
}

impl Responder {
    /// Create a responder from rules in priority order
    pub fn new(rules: Vec<Rule>) -> Self {
        let fired = vec![0; rules.len()];
        Self { rules, fired }
    }

    /// Pick the response for the current accumulated output, if any.
    ///
    /// Records the firing, so a guarded rule returned here is never returned
    /// again by this responder.
    pub fn next_exchange(&mut self, output: &str) -> Option<Exchange> {
        let (index, rule) = self.rules.iter().enumerate().find(|(index, rule)| {
            !(rule.guarded && self.fired[*index] > 0) && rule.matcher.is_match(output)
        })?;

        self.fired[index] += 1;
        debug!(rule = %rule.name, count = self.fired[index], "rule matched");

        Some(Exchange {
            rule_index: index,
            rule: rule.name.clone(),
            notice: rule.notice.clone(),
            response: rule.response.clone(),
        })
    }

    /// Whether the named rule has fired at least once
    pub fn has_fired(&self, name: &str) -> bool {
        self.fire_count(name) > 0
    }

    /// Number of times the named rule has fired
    pub fn fire_count(&self, name: &str) -> usize {
        self.rules
            .iter()
            .position(|rule| rule.name == name)
            .map_or(0, |index| self.fired[index])
    }

    /// Rules in priority order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}
