//! Pure projection of the model into what a shell paints.

use serde::{Deserialize, Serialize};

use crate::admin::{QueryLogEntry, QueryStats};
use crate::case_result::ResultView;
use crate::html;
use crate::model::{CodedOptions, Model, Notice, PendingAction, SearchOutcome};
use crate::step::{Forward, Step, StepStatus};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectView {
    pub placeholder: String,
    pub options: Vec<SelectOption>,
    pub selected: Option<String>,
    pub enabled: bool,
    pub loading: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextInputView {
    pub value: String,
    pub enabled: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ButtonView {
    pub label: String,
    pub visible: bool,
    pub enabled: bool,
    /// Shows a spinner in place of the label.
    pub busy: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressItem {
    pub step: Step,
    pub number: u8,
    pub title: String,
    pub status: StepStatus,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaptchaView {
    pub src: String,
    pub width: u32,
    pub height: u32,
    pub generation: u32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResultsPanel {
    #[default]
    Hidden,
    Loading,
    Found {
        view: ResultView,
        html: String,
    },
    Failed {
        message: String,
        html: String,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StatsView {
    pub total_queries: u64,
    pub successful_queries: u64,
    pub failed_queries: u64,
    pub success_rate: String,
    pub top_states: Vec<(String, u64)>,
}

impl From<&QueryStats> for StatsView {
    fn from(stats: &QueryStats) -> Self {
        Self {
            total_queries: stats.total_queries,
            successful_queries: stats.successful_queries,
            failed_queries: stats.failed_queries,
            success_rate: stats.success_rate_label(),
            top_states: stats.top_states.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct AdminView {
    pub rows: Vec<QueryLogEntry>,
    pub stats: Option<StatsView>,
    pub loading: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    pub step: Step,
    pub step_number: u8,
    pub step_title: String,
    pub progress: Vec<ProgressItem>,

    pub state_select: SelectView,
    pub district_select: SelectView,
    pub court_complex_select: SelectView,
    pub case_type_select: SelectView,

    pub case_number: TextInputView,
    pub case_year: TextInputView,
    pub captcha_input: TextInputView,
    pub captcha: Option<CaptchaView>,

    pub next: ButtonView,
    pub back: ButtonView,
    pub refresh_captcha: ButtonView,
    pub cancel: ButtonView,
    pub new_search: ButtonView,
    /// Shown when Retry has something to redo.
    pub retry: ButtonView,

    pub notice: Option<Notice>,
    pub results: ResultsPanel,
    pub admin: AdminView,
    pub busy: bool,
}

fn plain_select(
    placeholder: &str,
    names: &[String],
    selected: &Option<String>,
    active: bool,
    loading: bool,
) -> SelectView {
    SelectView {
        placeholder: placeholder.to_string(),
        options: names
            .iter()
            .map(|n| SelectOption {
                label: n.clone(),
                value: n.clone(),
            })
            .collect(),
        selected: selected.clone(),
        enabled: active && !names.is_empty(),
        loading,
    }
}

fn coded_select(
    placeholder: &str,
    options: &CodedOptions,
    selected: &Option<String>,
    active: bool,
    loading: bool,
) -> SelectView {
    SelectView {
        placeholder: placeholder.to_string(),
        options: options
            .iter()
            .map(|o| SelectOption {
                label: o.name.clone(),
                value: o.code.clone(),
            })
            .collect(),
        selected: selected.clone(),
        enabled: active && !options.is_empty(),
        loading,
    }
}

/// A select takes input only on its own step and while nothing is in flight.
fn accepts_selection(model: &Model, owner: Step) -> bool {
    model.step == owner && !model.is_busy()
}

fn next_label(step: Step) -> &'static str {
    match step {
        Step::InitSession => "Initialize Session",
        Step::SolveCaptcha => "Search Case",
        _ => "Next",
    }
}

fn progress(model: &Model) -> Vec<ProgressItem> {
    Step::INDICATED
        .into_iter()
        .map(|step| ProgressItem {
            step,
            number: step.number(),
            title: step.title().to_string(),
            status: if step == model.step {
                StepStatus::Active
            } else if model.completed.contains(&step) {
                StepStatus::Completed
            } else {
                StepStatus::Pending
            },
        })
        .collect()
}

fn results(search: &SearchOutcome) -> ResultsPanel {
    match search {
        SearchOutcome::NotStarted => ResultsPanel::Hidden,
        SearchOutcome::Loading => ResultsPanel::Loading,
        SearchOutcome::Found(result) => {
            let view = result.to_view();
            let html = html::render_results(&view);
            ResultsPanel::Found { view, html }
        }
        SearchOutcome::Failed { message } => ResultsPanel::Failed {
            html: html::render_error(message),
            message: message.clone(),
        },
    }
}

pub fn project(model: &Model) -> ViewModel {
    let busy = model.is_busy();
    let rule = model.step.rule();
    let forward_pending = model
        .pending
        .is_some_and(|p| matches!(p.action, PendingAction::Forward(_) | PendingAction::Search));
    let captcha_pending = model.is_pending(PendingAction::LoadCaptcha);
    let selections = &model.selections;
    let can_retry = !busy && model.retry().is_some();

    ViewModel {
        step: model.step,
        step_number: model.step.number(),
        step_title: model.step.title().to_string(),
        progress: progress(model),

        state_select: plain_select(
            "Select a state...",
            &model.reference.states,
            &selections.state,
            accepts_selection(model, Step::SelectState),
            model.is_pending(PendingAction::LoadStates),
        ),
        district_select: plain_select(
            "Select a district...",
            &model.reference.districts,
            &selections.district,
            accepts_selection(model, Step::SelectDistrict),
            false,
        ),
        court_complex_select: coded_select(
            "Select a court complex...",
            &model.reference.court_complexes,
            &selections.court_complex,
            accepts_selection(model, Step::SelectCourtComplex),
            model.is_pending(PendingAction::LoadCourtComplexes),
        ),
        case_type_select: coded_select(
            "Select a case type...",
            &model.reference.case_types,
            &selections.case_type,
            accepts_selection(model, Step::SelectCaseType),
            false,
        ),

        case_number: TextInputView {
            value: selections.case_number.clone(),
            enabled: true,
        },
        case_year: TextInputView {
            value: selections.case_year.clone(),
            enabled: true,
        },
        captcha_input: TextInputView {
            value: selections.captcha_answer.clone(),
            enabled: !matches!(model.search, SearchOutcome::Loading),
        },
        captcha: model.captcha.as_ref().map(|c| CaptchaView {
            src: c.src.clone(),
            width: c.width,
            height: c.height,
            generation: model.captcha_generation,
        }),

        next: ButtonView {
            label: next_label(model.step).to_string(),
            visible: rule.forward != Forward::None,
            enabled: !busy && rule.guard.allows(selections),
            busy: forward_pending,
        },
        back: ButtonView {
            label: "Previous".to_string(),
            visible: rule.back.is_some(),
            enabled: !busy && rule.back.is_some(),
            busy: false,
        },
        refresh_captcha: ButtonView {
            label: "Refresh CAPTCHA".to_string(),
            visible: model.step == Step::SolveCaptcha,
            enabled: !busy && model.step == Step::SolveCaptcha,
            busy: captcha_pending,
        },
        cancel: ButtonView {
            label: "Cancel".to_string(),
            visible: busy,
            enabled: busy,
            busy: false,
        },
        new_search: ButtonView {
            label: "New Search".to_string(),
            visible: model.step == Step::Results,
            enabled: model.step == Step::Results,
            busy: false,
        },
        retry: ButtonView {
            label: "Try Again".to_string(),
            visible: can_retry,
            enabled: can_retry,
            busy: false,
        },

        notice: model.notice.clone(),
        results: results(&model.search),
        admin: AdminView {
            rows: model.admin.logs.clone(),
            stats: model.admin.stats.as_ref().map(StatsView::from),
            loading: model
                .pending
                .is_some_and(|p| matches!(p.action, PendingAction::LoadLogs { .. } | PendingAction::LoadStats)),
        },
        busy,
    }
}
