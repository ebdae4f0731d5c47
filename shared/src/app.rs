use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::admin::QueryLogEntry;
use crate::api::{
    self, ApiOutcome, CaptchaPayload, CaseTypesPayload, CourtComplexesPayload, DistrictsPayload,
    LogsPayload, SearchPayload, SessionPayload, StatesPayload, StatsPayload,
};
use crate::capabilities::{Capabilities, HttpResult};
use crate::captcha::CaptchaImage;
use crate::config::MAX_ADMIN_LOG_LIMIT;
use crate::error::ApiError;
use crate::event::Event;
use crate::model::{Model, Notice, Pending, PendingAction, Retry, SearchOutcome};
use crate::step::{fetch_target, Forward, ForwardFetch, Guard, Step};
use crate::view::{self, ViewModel};

pub const SEARCH_CANCELLED: &str = "Search cancelled.";

#[derive(Default)]
pub struct App;

impl App {
    /// Starts `action` unless another request is still in flight.
    fn dispatch(model: &mut Model, caps: &Capabilities, action: PendingAction) -> bool {
        if let Some(pending) = model.pending {
            debug!(
                action = action.name(),
                busy_with = pending.action.name(),
                request_id = %pending.id,
                "ignored while busy"
            );
            return false;
        }

        let request = match api::request_for(action, &model.selections, &model.config) {
            Ok(request) => request,
            Err(e) => {
                Self::failed(model, action, &e);
                return false;
            }
        };

        let id = model.next_request_id();
        debug!(
            request_id = %id,
            action = action.name(),
            http_request_id = request.request_id(),
            url = request.url(),
            timeout_ms = request.timeout_ms(),
            "dispatching request"
        );
        model.pending = Some(Pending { id, action });
        caps.http.send(request, move |result| Event::Response {
            id,
            result: Box::new(result),
        });
        true
    }

    fn enter(model: &mut Model, caps: &Capabilities, step: Step) {
        debug!(from = %model.step, to = %step, "entering step");
        model.step = step;
        model.notice = None;
        if step == Step::SolveCaptcha {
            Self::dispatch(model, caps, PendingAction::LoadCaptcha);
        }
    }

    fn advance(model: &mut Model, caps: &Capabilities) {
        if model.is_busy() {
            debug!(step = %model.step, "next ignored while busy");
            return;
        }

        let rule = model.step.rule();
        if !rule.guard.allows(&model.selections) {
            if rule.guard != Guard::Never {
                model.notice = Some(Notice::warning(rule.guard.hint()));
            }
            return;
        }

        match rule.forward {
            Forward::Goto(next) => {
                model.complete(rule.from);
                Self::enter(model, caps, next);
            }
            Forward::Fetch(fetch) => {
                Self::dispatch(model, caps, PendingAction::Forward(fetch));
            }
            Forward::Search => {
                model.complete(rule.from);
                Self::enter(model, caps, Step::Results);
                model.search = SearchOutcome::Loading;
                Self::dispatch(model, caps, PendingAction::Search);
            }
            Forward::None => {}
        }
    }

    fn retreat(model: &mut Model, caps: &Capabilities) {
        if model.is_busy() {
            debug!(step = %model.step, "back ignored while busy");
            return;
        }
        match model.step.rule().back {
            Some(previous) => Self::enter(model, caps, previous),
            None => debug!(step = %model.step, "no back transition"),
        }
    }

    fn retry(model: &mut Model, caps: &Capabilities) {
        match model.retry() {
            Some(Retry::FreshCaptcha) => {
                // A CAPTCHA answer is only good for one search.
                model.selections.captcha_answer.clear();
                model.search = SearchOutcome::NotStarted;
                Self::enter(model, caps, Step::SolveCaptcha);
            }
            Some(Retry::Reload(action)) => {
                Self::dispatch(model, caps, action);
            }
            None => debug!(step = %model.step, "nothing to retry"),
        }
    }

    fn cancel(model: &mut Model) {
        let Some(pending) = model.pending.take() else {
            debug!("nothing to cancel");
            return;
        };
        info!(request_id = %pending.id, action = pending.action.name(), "request cancelled");
        if pending.action == PendingAction::Search {
            model.search = SearchOutcome::Failed {
                message: SEARCH_CANCELLED.to_string(),
            };
        }
    }

    /// Decodes `result`, reporting rejections and failures for `action`.
    fn settle<T: DeserializeOwned>(
        model: &mut Model,
        action: PendingAction,
        result: HttpResult,
    ) -> Option<T> {
        match api::decode::<T>(result) {
            ApiOutcome::Success(payload) => Some(payload),
            ApiOutcome::Rejected(message) => {
                Self::rejected(model, action, &message);
                None
            }
            ApiOutcome::Failed(error) => {
                Self::failed(model, action, &error);
                None
            }
        }
    }

    fn rejected(model: &mut Model, action: PendingAction, message: &str) {
        info!(action = action.name(), %message, "request rejected");
        let text = match action {
            PendingAction::LoadStates => "Failed to load states".to_string(),
            PendingAction::Forward(ForwardFetch::Districts) => "Failed to load districts".to_string(),
            PendingAction::Forward(ForwardFetch::Session) => {
                format!("Failed to initialize session: {message}")
            }
            PendingAction::LoadCourtComplexes => "Failed to load court complexes".to_string(),
            PendingAction::Forward(ForwardFetch::CaseTypes) => {
                format!("Failed to load case types: {message}")
            }
            PendingAction::LoadCaptcha => format!("Failed to load CAPTCHA: {message}"),
            PendingAction::Search => message.to_string(),
            PendingAction::LoadLogs { .. } => format!("Failed to load query logs: {message}"),
            PendingAction::LoadStats => format!("Failed to load statistics: {message}"),
        };
        Self::show_failure(model, action, text);
    }

    fn failed(model: &mut Model, action: PendingAction, error: &ApiError) {
        warn!(
            action = action.name(),
            error = %error,
            timeout = error.is_timeout(),
            "request failed"
        );
        let text = match action {
            PendingAction::LoadStates => "Failed to load states",
            PendingAction::Forward(ForwardFetch::Districts) => "Failed to load districts",
            PendingAction::Forward(ForwardFetch::Session) => {
                "Error initializing session. Please try again."
            }
            PendingAction::LoadCourtComplexes => "Error loading court complexes. Please try again.",
            PendingAction::Forward(ForwardFetch::CaseTypes) => {
                "Error loading case types. Please try again."
            }
            PendingAction::LoadCaptcha => "Error loading CAPTCHA. Please try again.",
            PendingAction::Search => "Error searching for case. Please try again.",
            PendingAction::LoadLogs { .. } => "Error loading query logs. Please try again.",
            PendingAction::LoadStats => "Error loading statistics. Please try again.",
        };
        Self::show_failure(model, action, text.to_string());
    }

    fn show_failure(model: &mut Model, action: PendingAction, message: String) {
        if action == PendingAction::Search {
            model.search = SearchOutcome::Failed { message };
        } else {
            model.notice = Some(Notice::error(message));
        }
    }

    fn handle_response(
        model: &mut Model,
        caps: &Capabilities,
        action: PendingAction,
        result: HttpResult,
    ) {
        match action {
            PendingAction::LoadStates => {
                if let Some(p) = Self::settle::<StatesPayload>(model, action, result) {
                    info!(count = p.states.len(), "states loaded");
                    model.replace_states(p.states);
                }
            }
            PendingAction::Forward(fetch @ ForwardFetch::Districts) => {
                if let Some(p) = Self::settle::<DistrictsPayload>(model, action, result) {
                    model.replace_districts(p.districts);
                    Self::finish_forward(model, caps, fetch);
                }
            }
            PendingAction::Forward(fetch @ ForwardFetch::Session) => {
                if let Some(p) = Self::settle::<SessionPayload>(model, action, result) {
                    info!(message = p.message.as_deref().unwrap_or_default(), "session initialized");
                    model.session = Some(p.message.unwrap_or_default());
                    Self::finish_forward(model, caps, fetch);
                    Self::dispatch(model, caps, PendingAction::LoadCourtComplexes);
                }
            }
            PendingAction::LoadCourtComplexes => {
                if let Some(p) = Self::settle::<CourtComplexesPayload>(model, action, result) {
                    model.replace_court_complexes(p.court_complexes);
                }
            }
            PendingAction::Forward(fetch @ ForwardFetch::CaseTypes) => {
                if let Some(p) = Self::settle::<CaseTypesPayload>(model, action, result) {
                    model.replace_case_types(p.case_types);
                    Self::finish_forward(model, caps, fetch);
                }
            }
            PendingAction::LoadCaptcha => {
                if let Some(p) = Self::settle::<CaptchaPayload>(model, action, result) {
                    match CaptchaImage::from_data_url(
                        &p.captcha_image,
                        model.config.captcha_max_bytes,
                        model.config.captcha_max_dimension,
                    ) {
                        Ok(image) => {
                            debug!(
                                mime = %image.mime,
                                width = image.width,
                                height = image.height,
                                "captcha loaded"
                            );
                            model.captcha = Some(image);
                            model.captcha_generation = model.captcha_generation.wrapping_add(1);
                        }
                        Err(e) => Self::failed(model, action, &ApiError::from(e)),
                    }
                }
            }
            PendingAction::Search => {
                if let Some(p) = Self::settle::<SearchPayload>(model, action, result) {
                    info!("case found");
                    model.search = SearchOutcome::Found(Box::new(p.case_details));
                }
            }
            PendingAction::LoadLogs { .. } => {
                if let Some(p) = Self::settle::<LogsPayload>(model, action, result) {
                    match QueryLogEntry::from_rows(&p.logs) {
                        Ok(rows) => model.admin.logs = rows,
                        Err(e) => Self::failed(model, action, &e),
                    }
                }
            }
            PendingAction::LoadStats => {
                if let Some(p) = Self::settle::<StatsPayload>(model, action, result) {
                    model.admin.stats = Some(p.stats);
                }
            }
        }
    }

    fn finish_forward(model: &mut Model, caps: &Capabilities, fetch: ForwardFetch) {
        let from = model.step;
        model.complete(from);
        Self::enter(model, caps, fetch_target(fetch));
    }

    fn known(options: &[String], value: &str) -> bool {
        let value = value.trim();
        value.is_empty() || options.iter().any(|o| o == value)
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        let event_name = event.name();
        debug!(
            event = event_name,
            user = event.is_user_initiated(),
            step = %model.step,
            "update"
        );

        if let Some(owner) = event.select_step() {
            if model.step != owner || model.is_busy() {
                debug!(
                    event = event_name,
                    step = %model.step,
                    busy = model.is_busy(),
                    "selection ignored outside its step"
                );
                return;
            }
        }

        match event {
            Event::AppStarted => {
                Self::dispatch(model, caps, PendingAction::LoadStates);
            }

            Event::Configure(config) => match config.validate() {
                Ok(()) => {
                    info!(base_url = ?config.base_url, "configuration applied");
                    model.config = *config;
                }
                Err(e) => {
                    warn!(error = %e, "configuration rejected");
                    model.notice = Some(Notice::error(format!("Invalid configuration: {e}")));
                }
            },

            Event::StateSelected(value) => {
                if Self::known(&model.reference.states, &value) {
                    model.select_state(value);
                } else {
                    warn!(state = %value, "unknown state ignored");
                }
            }

            Event::DistrictSelected(value) => {
                if Self::known(&model.reference.districts, &value) {
                    model.select_district(value);
                } else {
                    warn!(district = %value, "unknown district ignored");
                }
            }

            Event::CourtComplexSelected(code) => {
                if model.select_court_complex(code.clone()) {
                    debug!(
                        %code,
                        name = ?model.reference.court_complexes.name_of(&code),
                        "court complex selected"
                    );
                } else {
                    warn!(%code, "unknown court complex code ignored");
                }
            }

            Event::CaseTypeSelected(code) => {
                if model.select_case_type(code.clone()) {
                    debug!(
                        %code,
                        name = ?model.reference.case_types.name_of(&code),
                        "case type selected"
                    );
                } else {
                    warn!(%code, "unknown case type code ignored");
                }
            }

            Event::CaseNumberChanged(value) => model.selections.case_number = value,
            Event::CaseYearChanged(value) => model.selections.case_year = value,
            Event::CaptchaChanged(value) => model.selections.captcha_answer = value,

            Event::NextPressed => Self::advance(model, caps),
            Event::BackPressed => Self::retreat(model, caps),

            Event::CaptchaRefreshPressed => {
                if model.step == Step::SolveCaptcha {
                    Self::dispatch(model, caps, PendingAction::LoadCaptcha);
                } else {
                    debug!(step = %model.step, "captcha refresh outside captcha step");
                }
            }

            Event::NewSearchPressed => {
                info!(step = %model.step, "starting new search");
                model.reset();
                Self::dispatch(model, caps, PendingAction::LoadStates);
            }

            Event::RetryPressed => Self::retry(model, caps),
            Event::CancelPressed => Self::cancel(model),
            Event::NoticeDismissed => model.notice = None,

            Event::AdminLogsRequested { limit } => {
                let limit = limit
                    .unwrap_or(model.config.admin_log_limit)
                    .clamp(1, MAX_ADMIN_LOG_LIMIT);
                Self::dispatch(model, caps, PendingAction::LoadLogs { limit });
            }

            Event::AdminStatsRequested => {
                Self::dispatch(model, caps, PendingAction::LoadStats);
            }

            Event::Response { id, result } => {
                match model.pending.filter(|p| p.id == id) {
                    Some(pending) => {
                        model.pending = None;
                        Self::handle_response(model, caps, pending.action, *result);
                    }
                    None => {
                        debug!(request_id = %id, "discarding stale response");
                        return;
                    }
                }
            }
        }

        caps.render.render();
    }

    fn view(&self, model: &Model) -> ViewModel {
        view::project(model)
    }
}
