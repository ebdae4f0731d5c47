use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::admin::{QueryLogEntry, QueryStats};
use crate::captcha::CaptchaImage;
use crate::case_result::CaseResult;
use crate::config::WizardConfig;
use crate::step::{ForwardFetch, Step};

/// Monotonic id tagging each in-flight request.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// A `name → code` option, in the order the server listed it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodedOption {
    pub name: String,
    pub code: String,
}

/// Ordered `name → code` list decoded from a JSON object.
///
/// `serde_json::Map` sorts its keys, but the select has to list the
/// options in the order the server sent them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CodedOptions(pub Vec<CodedOption>);

impl CodedOptions {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CodedOption> {
        self.0.iter()
    }

    pub fn contains_code(&self, code: &str) -> bool {
        self.0.iter().any(|o| o.code == code)
    }

    pub fn name_of(&self, code: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|o| o.code == code)
            .map(|o| o.name.as_str())
    }
}

impl<'de> Deserialize<'de> for CodedOptions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = CodedOptions;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping option names to codes")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut options = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, code)) = map.next_entry::<String, serde_json::Value>()? {
                    let code = match code {
                        serde_json::Value::String(s) => s,
                        serde_json::Value::Number(n) => n.to_string(),
                        other => {
                            return Err(de::Error::custom(format!(
                                "code for '{name}' must be a string or number, got {other}"
                            )))
                        }
                    };
                    options.push(CodedOption { name, code });
                }
                Ok(CodedOptions(options))
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceData {
    pub states: Vec<String>,
    pub districts: Vec<String>,
    pub court_complexes: CodedOptions,
    pub case_types: CodedOptions,
}

/// What the user has chosen or typed so far.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selections {
    pub state: Option<String>,
    pub district: Option<String>,
    /// Court complex code, not its display name.
    pub court_complex: Option<String>,
    /// Case type code, not its display name.
    pub case_type: Option<String>,
    pub case_number: String,
    pub case_year: String,
    pub captcha_answer: String,
}

/// What an in-flight request is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingAction {
    LoadStates,
    Forward(ForwardFetch),
    LoadCourtComplexes,
    LoadCaptcha,
    Search,
    LoadLogs { limit: u32 },
    LoadStats,
}

impl PendingAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoadStates => "load_states",
            Self::Forward(ForwardFetch::Districts) => "load_districts",
            Self::Forward(ForwardFetch::Session) => "initialize_session",
            Self::Forward(ForwardFetch::CaseTypes) => "load_case_types",
            Self::LoadCourtComplexes => "load_court_complexes",
            Self::LoadCaptcha => "load_captcha",
            Self::Search => "search",
            Self::LoadLogs { .. } => "load_logs",
            Self::LoadStats => "load_stats",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pending {
    pub id: RequestId,
    pub action: PendingAction,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Non-blocking banner message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum SearchOutcome {
    #[default]
    NotStarted,
    Loading,
    Found(Box<CaseResult>),
    Failed { message: String },
}

/// What Retry would do from the current state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Retry {
    /// Back to the CAPTCHA step after a failed search.
    FreshCaptcha,
    /// Fetch what the current step is missing.
    Reload(PendingAction),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminData {
    pub logs: Vec<QueryLogEntry>,
    pub stats: Option<QueryStats>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub config: WizardConfig,

    pub step: Step,
    pub completed: BTreeSet<Step>,

    pub reference: ReferenceData,
    pub selections: Selections,
    /// Server message from a successful session initialization.
    pub session: Option<String>,

    pub captcha: Option<CaptchaImage>,
    /// Bumped every time a new CAPTCHA image replaces the old one.
    pub captcha_generation: u32,
    pub search: SearchOutcome,

    pub pending: Option<Pending>,
    pub last_request_id: RequestId,
    pub notice: Option<Notice>,

    pub admin: AdminData,
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl Model {
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_pending(&self, action: PendingAction) -> bool {
        self.pending.is_some_and(|p| p.action == action)
    }

    pub fn retry(&self) -> Option<Retry> {
        match self.step {
            Step::Results if matches!(self.search, SearchOutcome::Failed { .. }) => {
                Some(Retry::FreshCaptcha)
            }
            Step::SelectState if self.reference.states.is_empty() => {
                Some(Retry::Reload(PendingAction::LoadStates))
            }
            Step::SelectCourtComplex if self.reference.court_complexes.is_empty() => {
                Some(Retry::Reload(PendingAction::LoadCourtComplexes))
            }
            Step::SolveCaptcha if self.captcha.is_none() => {
                Some(Retry::Reload(PendingAction::LoadCaptcha))
            }
            _ => None,
        }
    }

    pub fn next_request_id(&mut self) -> RequestId {
        self.last_request_id = RequestId(self.last_request_id.0 + 1);
        self.last_request_id
    }

    /// Returns to the initial state, keeping the shell's config and the id
    /// counter so late responses from before the reset are still stale.
    pub fn reset(&mut self) {
        let config = std::mem::take(&mut self.config);
        let last_request_id = self.last_request_id;
        *self = Self {
            config,
            last_request_id,
            ..Self::default()
        };
    }

    /// Marks `from` completed when moving forward out of it.
    pub fn complete(&mut self, from: Step) {
        self.completed.insert(from);
    }

    fn forget_completed_from(&mut self, step: Step) {
        self.completed.retain(|s| *s < step);
    }

    pub fn select_state(&mut self, value: String) {
        let value = non_empty(value);
        if value == self.selections.state {
            return;
        }
        self.selections.state = value;
        self.reference.districts.clear();
        self.selections.district = None;
        self.invalidate_session();
        self.forget_completed_from(Step::SelectState);
    }

    pub fn select_district(&mut self, value: String) {
        let value = non_empty(value);
        if value == self.selections.district {
            return;
        }
        self.selections.district = value;
        self.invalidate_session();
        self.forget_completed_from(Step::SelectDistrict);
    }

    /// Returns `false` when `code` is not one of the loaded options.
    pub fn select_court_complex(&mut self, code: String) -> bool {
        let code = non_empty(code);
        if let Some(c) = &code {
            if !self.reference.court_complexes.contains_code(c) {
                return false;
            }
        }
        if code != self.selections.court_complex {
            self.selections.court_complex = code;
            self.reference.case_types = CodedOptions::default();
            self.selections.case_type = None;
            self.forget_completed_from(Step::SelectCourtComplex);
        }
        true
    }

    /// Returns `false` when `code` is not one of the loaded options.
    pub fn select_case_type(&mut self, code: String) -> bool {
        let code = non_empty(code);
        if let Some(c) = &code {
            if !self.reference.case_types.contains_code(c) {
                return false;
            }
        }
        if code != self.selections.case_type {
            self.selections.case_type = code;
            self.forget_completed_from(Step::SelectCaseType);
        }
        true
    }

    fn invalidate_session(&mut self) {
        self.session = None;
        self.reference.court_complexes = CodedOptions::default();
        self.reference.case_types = CodedOptions::default();
        self.selections.court_complex = None;
        self.selections.case_type = None;
    }

    pub fn replace_states(&mut self, states: Vec<String>) {
        let stale = self
            .selections
            .state
            .as_ref()
            .is_some_and(|s| !states.contains(s));
        if stale {
            self.select_state(String::new());
        }
        self.reference.states = states;
    }

    pub fn replace_districts(&mut self, districts: Vec<String>) {
        let stale = self
            .selections
            .district
            .as_ref()
            .is_some_and(|d| !districts.contains(d));
        if stale {
            self.select_district(String::new());
        }
        self.reference.districts = districts;
    }

    pub fn replace_court_complexes(&mut self, options: CodedOptions) {
        let stale = self
            .selections
            .court_complex
            .as_ref()
            .is_some_and(|c| !options.contains_code(c));
        if stale {
            self.selections.court_complex = None;
            self.reference.case_types = CodedOptions::default();
            self.selections.case_type = None;
        }
        self.reference.court_complexes = options;
    }

    pub fn replace_case_types(&mut self, options: CodedOptions) {
        let stale = self
            .selections
            .case_type
            .as_ref()
            .is_some_and(|c| !options.contains_code(c));
        if stale {
            self.selections.case_type = None;
        }
        self.reference.case_types = options;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(pairs: &[(&str, &str)]) -> CodedOptions {
        CodedOptions(
            pairs
                .iter()
                .map(|(n, c)| CodedOption {
                    name: n.to_string(),
                    code: c.to_string(),
                })
                .collect(),
        )
    }

    #[test]
    fn coded_options_keep_server_order() {
        let parsed: CodedOptions =
            serde_json::from_str(r#"{"Zeta Court": "9", "Alpha Court": 2}"#).unwrap();
        assert_eq!(parsed, options(&[("Zeta Court", "9"), ("Alpha Court", "2")]));
    }

    #[test]
    fn coded_options_reject_nested_codes() {
        let parsed = serde_json::from_str::<CodedOptions>(r#"{"A": {"x": 1}}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn changing_state_clears_downstream() {
        let mut model = Model::default();
        model.select_state("Delhi".into());
        model.reference.districts = vec!["Central".into()];
        model.select_district("Central".into());
        model.session = Some("ok".into());
        model.reference.court_complexes = options(&[("Tis Hazari", "1")]);
        assert!(model.select_court_complex("1".into()));
        model.complete(Step::SelectState);
        model.complete(Step::SelectDistrict);

        model.select_state("Goa".into());

        assert_eq!(model.selections.state.as_deref(), Some("Goa"));
        assert!(model.reference.districts.is_empty());
        assert_eq!(model.selections.district, None);
        assert_eq!(model.session, None);
        assert!(model.reference.court_complexes.is_empty());
        assert_eq!(model.selections.court_complex, None);
        assert!(model.completed.is_empty());
    }

    #[test]
    fn reselecting_same_state_keeps_downstream() {
        let mut model = Model::default();
        model.select_state("Delhi".into());
        model.reference.districts = vec!["Central".into()];
        model.select_district("Central".into());

        model.select_state(" Delhi ".into());

        assert_eq!(model.selections.district.as_deref(), Some("Central"));
    }

    #[test]
    fn unknown_court_complex_code_rejected() {
        let mut model = Model::default();
        model.reference.court_complexes = options(&[("Saket", "7")]);
        assert!(!model.select_court_complex("8".into()));
        assert_eq!(model.selections.court_complex, None);
        assert!(model.select_court_complex("7".into()));
        assert!(model.select_court_complex(String::new()));
        assert_eq!(model.selections.court_complex, None);
    }

    #[test]
    fn reloading_case_types_keeps_present_selection() {
        let mut model = Model::default();
        model.reference.case_types = options(&[("Civil", "1"), ("Criminal", "2")]);
        assert!(model.select_case_type("2".into()));

        model.replace_case_types(options(&[("Criminal", "2"), ("Writ", "3")]));
        assert_eq!(model.selections.case_type.as_deref(), Some("2"));

        model.replace_case_types(options(&[("Writ", "3")]));
        assert_eq!(model.selections.case_type, None);
    }

    #[test]
    fn retry_follows_what_the_step_is_missing() {
        let mut model = Model::default();
        assert_eq!(model.retry(), Some(Retry::Reload(PendingAction::LoadStates)));

        model.reference.states = vec!["Delhi".into()];
        assert_eq!(model.retry(), None);

        model.step = Step::SolveCaptcha;
        assert_eq!(model.retry(), Some(Retry::Reload(PendingAction::LoadCaptcha)));

        model.step = Step::Results;
        model.search = SearchOutcome::Loading;
        assert_eq!(model.retry(), None);
        model.search = SearchOutcome::Failed {
            message: "Invalid CAPTCHA".into(),
        };
        assert_eq!(model.retry(), Some(Retry::FreshCaptcha));
    }

    #[test]
    fn reset_keeps_config_and_request_counter() {
        let mut model = Model::default();
        model.config.request_timeout_ms = 1234;
        let id = model.next_request_id();
        model.select_state("Delhi".into());
        model.step = Step::SelectDistrict;

        model.reset();

        assert_eq!(model.config.request_timeout_ms, 1234);
        assert_eq!(model.last_request_id, id);
        assert_eq!(model.step, Step::SelectState);
        assert_eq!(model.selections, Selections::default());
    }
}
