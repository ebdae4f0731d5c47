//! The lookup service's HTTP contract.
//!
//! Every reply is a JSON object with a boolean `success`. Failed replies
//! carry a human-readable `message` and no payload.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::admin::QueryStats;
use crate::capabilities::{HttpRequest, HttpResult};
use crate::case_result::CaseResult;
use crate::config::WizardConfig;
use crate::error::{ApiError, SearchCriteriaError};
use crate::model::{CodedOptions, PendingAction, Selections};
use crate::step::ForwardFetch;

pub const STATES_PATH: &str = "/api/states";
pub const DISTRICTS_PATH: &str = "/api/districts";
pub const INITIALIZE_PATH: &str = "/api/initialize";
pub const COURT_COMPLEXES_PATH: &str = "/api/court-complexes";
pub const CASE_TYPES_PATH: &str = "/api/case-types";
pub const CAPTCHA_PATH: &str = "/api/captcha";
pub const SEARCH_PATH: &str = "/api/search";
pub const LOGS_PATH: &str = "/api/logs";
pub const STATS_PATH: &str = "/api/stats";

const DEFAULT_REJECTION: &str = "Request failed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistrictsRequest<'a> {
    pub state: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitializeRequest<'a> {
    pub state: &'a str,
    pub district: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseTypesRequest<'a> {
    pub court_complex_code: &'a str,
}

/// The full selection set submitted to the search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub state: String,
    pub district: String,
    pub court_complex: String,
    pub case_type: String,
    pub case_number: String,
    pub year: String,
    pub captcha_value: String,
}

fn required(value: Option<&str>, name: &'static str) -> Result<String, SearchCriteriaError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(SearchCriteriaError::Missing(name))
}

impl TryFrom<&Selections> for SearchCriteria {
    type Error = SearchCriteriaError;

    fn try_from(s: &Selections) -> Result<Self, Self::Error> {
        Ok(Self {
            state: required(s.state.as_deref(), "state")?,
            district: required(s.district.as_deref(), "district")?,
            court_complex: required(s.court_complex.as_deref(), "court complex")?,
            case_type: required(s.case_type.as_deref(), "case type")?,
            case_number: required(Some(s.case_number.as_str()), "case number")?,
            year: required(Some(s.case_year.as_str()), "case year")?,
            captcha_value: required(Some(s.captcha_answer.as_str()), "CAPTCHA text")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatesPayload {
    pub states: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DistrictsPayload {
    pub districts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionPayload {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CourtComplexesPayload {
    pub court_complexes: CodedOptions,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CaseTypesPayload {
    pub case_types: CodedOptions,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CaptchaPayload {
    pub captcha_image: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchPayload {
    pub case_details: CaseResult,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogsPayload {
    pub logs: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatsPayload {
    pub stats: QueryStats,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiOutcome<T> {
    Success(T),
    /// `success: false` with the server's message.
    Rejected(String),
    Failed(ApiError),
}

#[derive(Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

/// Splits a shell response into success payload, application rejection or
/// transport-level failure.
pub fn decode<T: DeserializeOwned>(result: HttpResult) -> ApiOutcome<T> {
    let response = match result {
        Ok(response) => response,
        Err(e) => return ApiOutcome::Failed(ApiError::Transport(e)),
    };
    if !response.is_success() {
        return ApiOutcome::Failed(ApiError::Status {
            status: response.status(),
        });
    }

    // Decode straight from the bytes: a `Value` round trip would sort the
    // keys of `name -> code` objects.
    let envelope: Envelope = match serde_json::from_slice(response.body()) {
        Ok(envelope) => envelope,
        Err(e) => {
            return ApiOutcome::Failed(ApiError::Malformed {
                reason: e.to_string(),
            })
        }
    };

    if !envelope.success {
        let message = envelope
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REJECTION.to_string());
        debug!(%message, "request rejected by server");
        return ApiOutcome::Rejected(message);
    }

    match serde_json::from_slice(response.body()) {
        Ok(payload) => ApiOutcome::Success(payload),
        Err(e) => ApiOutcome::Failed(ApiError::Malformed {
            reason: e.to_string(),
        }),
    }
}

fn selected<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, ApiError> {
    value
        .as_deref()
        .ok_or(ApiError::Incomplete(SearchCriteriaError::Missing(name)))
}

/// Builds the HTTP request for `action` from the current selections.
pub fn request_for(
    action: PendingAction,
    selections: &Selections,
    config: &WizardConfig,
) -> Result<HttpRequest, ApiError> {
    let timeout = config.request_timeout_ms;
    let request = match action {
        PendingAction::LoadStates => HttpRequest::get(config.endpoint_url(STATES_PATH)?)?,
        PendingAction::Forward(ForwardFetch::Districts) => {
            HttpRequest::post(config.endpoint_url(DISTRICTS_PATH)?)?.with_json(
                &DistrictsRequest {
                    state: selected(&selections.state, "state")?,
                },
            )?
        }
        PendingAction::Forward(ForwardFetch::Session) => {
            HttpRequest::post(config.endpoint_url(INITIALIZE_PATH)?)?.with_json(
                &InitializeRequest {
                    state: selected(&selections.state, "state")?,
                    district: selected(&selections.district, "district")?,
                },
            )?
        }
        PendingAction::LoadCourtComplexes => {
            HttpRequest::get(config.endpoint_url(COURT_COMPLEXES_PATH)?)?
        }
        PendingAction::Forward(ForwardFetch::CaseTypes) => {
            HttpRequest::post(config.endpoint_url(CASE_TYPES_PATH)?)?.with_json(
                &CaseTypesRequest {
                    court_complex_code: selected(&selections.court_complex, "court complex")?,
                },
            )?
        }
        PendingAction::LoadCaptcha => HttpRequest::get(config.endpoint_url(CAPTCHA_PATH)?)?,
        PendingAction::Search => {
            let criteria = SearchCriteria::try_from(selections)?;
            return Ok(HttpRequest::post(config.endpoint_url(SEARCH_PATH)?)?
                .with_json(&criteria)?
                .with_timeout_ms(config.search_timeout_ms)?);
        }
        PendingAction::LoadLogs { limit } => {
            HttpRequest::get(config.endpoint_url(&format!("{LOGS_PATH}?limit={limit}"))?)?
        }
        PendingAction::LoadStats => HttpRequest::get(config.endpoint_url(STATS_PATH)?)?,
    };
    Ok(request.with_timeout_ms(timeout)?)
}
