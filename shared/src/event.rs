use serde::{Deserialize, Serialize};

use crate::capabilities::HttpResult;
use crate::config::WizardConfig;
use crate::model::RequestId;
use crate::step::Step;

// --- Event enum: one variant per user action or shell reply, large payloads boxed ---

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Event {
    // Lifecycle
    AppStarted,
    Configure(Box<WizardConfig>),

    // Selects
    StateSelected(String),
    DistrictSelected(String),
    CourtComplexSelected(String),
    CaseTypeSelected(String),

    // Text inputs
    CaseNumberChanged(String),
    CaseYearChanged(String),
    CaptchaChanged(String),

    // Buttons
    NextPressed,
    BackPressed,
    CaptchaRefreshPressed,
    NewSearchPressed,
    RetryPressed,
    CancelPressed,
    NoticeDismissed,

    // Admin page
    AdminLogsRequested {
        limit: Option<u32>,
    },
    AdminStatsRequested,

    // Capability responses
    Response {
        id: RequestId,
        result: Box<HttpResult>,
    },
}

impl Event {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AppStarted => "app_started",
            Self::Configure(_) => "configure",
            Self::StateSelected(_) => "state_selected",
            Self::DistrictSelected(_) => "district_selected",
            Self::CourtComplexSelected(_) => "court_complex_selected",
            Self::CaseTypeSelected(_) => "case_type_selected",
            Self::CaseNumberChanged(_) => "case_number_changed",
            Self::CaseYearChanged(_) => "case_year_changed",
            Self::CaptchaChanged(_) => "captcha_changed",
            Self::NextPressed => "next_pressed",
            Self::BackPressed => "back_pressed",
            Self::CaptchaRefreshPressed => "captcha_refresh_pressed",
            Self::NewSearchPressed => "new_search_pressed",
            Self::RetryPressed => "retry_pressed",
            Self::CancelPressed => "cancel_pressed",
            Self::NoticeDismissed => "notice_dismissed",
            Self::AdminLogsRequested { .. } => "admin_logs_requested",
            Self::AdminStatsRequested => "admin_stats_requested",
            Self::Response { .. } => "response",
        }
    }

    /// The only step on which a select event is accepted.
    pub const fn select_step(&self) -> Option<Step> {
        match self {
            Self::StateSelected(_) => Some(Step::SelectState),
            Self::DistrictSelected(_) => Some(Step::SelectDistrict),
            Self::CourtComplexSelected(_) => Some(Step::SelectCourtComplex),
            Self::CaseTypeSelected(_) => Some(Step::SelectCaseType),
            _ => None,
        }
    }

    pub const fn is_user_initiated(&self) -> bool {
        !matches!(
            self,
            Self::AppStarted | Self::Configure(_) | Self::Response { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::HttpError;

    #[test]
    fn responses_are_not_user_initiated() {
        let event = Event::Response {
            id: RequestId(1),
            result: Box::new(Err(HttpError::Cancelled)),
        };
        assert!(!event.is_user_initiated());
        assert!(Event::NextPressed.is_user_initiated());
    }

    #[test]
    fn selects_belong_to_their_step() {
        assert_eq!(
            Event::DistrictSelected("Central".into()).select_step(),
            Some(Step::SelectDistrict)
        );
        assert_eq!(Event::CaseNumberChanged("1".into()).select_step(), None);
    }

    #[test]
    fn events_cross_the_bridge_as_json() {
        let event = Event::AdminLogsRequested { limit: Some(20) };
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
        assert_eq!(back.name(), "admin_logs_requested");
    }
}
