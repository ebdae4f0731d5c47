//! The wizard's finite-state machine.
//!
//! Each step has exactly one row in [`TRANSITIONS`]: what `Next` does, what
//! must be filled in before `Next` is allowed, and where `Back` goes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::Selections;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    SelectState,
    SelectDistrict,
    InitSession,
    SelectCourtComplex,
    SelectCaseType,
    EnterCaseNumber,
    SolveCaptcha,
    Results,
}

impl Default for Step {
    fn default() -> Self {
        Self::SelectState
    }
}

impl Step {
    pub const ALL: [Step; 8] = [
        Step::SelectState,
        Step::SelectDistrict,
        Step::InitSession,
        Step::SelectCourtComplex,
        Step::SelectCaseType,
        Step::EnterCaseNumber,
        Step::SolveCaptcha,
        Step::Results,
    ];

    /// Steps shown in the progress sidebar. Results has no indicator.
    pub const INDICATED: [Step; 7] = [
        Step::SelectState,
        Step::SelectDistrict,
        Step::InitSession,
        Step::SelectCourtComplex,
        Step::SelectCaseType,
        Step::EnterCaseNumber,
        Step::SolveCaptcha,
    ];

    pub const fn number(self) -> u8 {
        match self {
            Self::SelectState => 1,
            Self::SelectDistrict => 2,
            Self::InitSession => 3,
            Self::SelectCourtComplex => 4,
            Self::SelectCaseType => 5,
            Self::EnterCaseNumber => 6,
            Self::SolveCaptcha => 7,
            Self::Results => 8,
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::SelectState => "Select State",
            Self::SelectDistrict => "Select District",
            Self::InitSession => "Initialize Session",
            Self::SelectCourtComplex => "Court Complex",
            Self::SelectCaseType => "Case Type",
            Self::EnterCaseNumber => "Case Number",
            Self::SolveCaptcha => "CAPTCHA",
            Self::Results => "Results",
        }
    }

    pub fn rule(self) -> &'static Transition {
        // TRANSITIONS is indexed by step number; the unit test below pins that.
        &TRANSITIONS[usize::from(self.number() - 1)]
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number(), self.title())
    }
}

/// Requests that move the wizard forward once they succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForwardFetch {
    Districts,
    Session,
    CaseTypes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Forward {
    /// Pure navigation.
    Goto(Step),
    /// Advance when the request succeeds.
    Fetch(ForwardFetch),
    /// Submit the search and show the results step while it runs.
    Search,
    /// Terminal step.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Always,
    Never,
    StateChosen,
    DistrictChosen,
    CourtComplexChosen,
    CaseTypeChosen,
    CaseNumberAndYear,
    CaptchaEntered,
}

impl Guard {
    pub fn allows(self, selections: &Selections) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::StateChosen => selections.state.is_some(),
            Self::DistrictChosen => selections.district.is_some(),
            Self::CourtComplexChosen => selections.court_complex.is_some(),
            Self::CaseTypeChosen => selections.case_type.is_some(),
            Self::CaseNumberAndYear => {
                !selections.case_number.trim().is_empty() && !selections.case_year.trim().is_empty()
            }
            Self::CaptchaEntered => !selections.captcha_answer.trim().is_empty(),
        }
    }

    pub const fn hint(self) -> &'static str {
        match self {
            Self::Always | Self::Never => "",
            Self::StateChosen => "Please select a state",
            Self::DistrictChosen => "Please select a district",
            Self::CourtComplexChosen => "Please select a court complex first",
            Self::CaseTypeChosen => "Please select a case type",
            Self::CaseNumberAndYear => "Please enter both case number and year",
            Self::CaptchaEntered => "Please enter the CAPTCHA text",
        }
    }
}

#[derive(Debug)]
pub struct Transition {
    pub from: Step,
    pub forward: Forward,
    pub guard: Guard,
    pub back: Option<Step>,
}

pub static TRANSITIONS: [Transition; 8] = [
    Transition {
        from: Step::SelectState,
        forward: Forward::Fetch(ForwardFetch::Districts),
        guard: Guard::StateChosen,
        back: None,
    },
    Transition {
        from: Step::SelectDistrict,
        forward: Forward::Goto(Step::InitSession),
        guard: Guard::DistrictChosen,
        back: Some(Step::SelectState),
    },
    Transition {
        from: Step::InitSession,
        forward: Forward::Fetch(ForwardFetch::Session),
        guard: Guard::Always,
        back: Some(Step::SelectDistrict),
    },
    Transition {
        from: Step::SelectCourtComplex,
        forward: Forward::Fetch(ForwardFetch::CaseTypes),
        guard: Guard::CourtComplexChosen,
        back: None,
    },
    Transition {
        from: Step::SelectCaseType,
        forward: Forward::Goto(Step::EnterCaseNumber),
        guard: Guard::CaseTypeChosen,
        back: Some(Step::SelectCourtComplex),
    },
    Transition {
        from: Step::EnterCaseNumber,
        forward: Forward::Goto(Step::SolveCaptcha),
        guard: Guard::CaseNumberAndYear,
        back: Some(Step::SelectCaseType),
    },
    Transition {
        from: Step::SolveCaptcha,
        forward: Forward::Search,
        guard: Guard::CaptchaEntered,
        back: Some(Step::EnterCaseNumber),
    },
    Transition {
        from: Step::Results,
        forward: Forward::None,
        guard: Guard::Never,
        back: None,
    },
];

/// The step reached when a forward fetch succeeds.
pub const fn fetch_target(fetch: ForwardFetch) -> Step {
    match fetch {
        ForwardFetch::Districts => Step::SelectDistrict,
        ForwardFetch::Session => Step::SelectCourtComplex,
        ForwardFetch::CaseTypes => Step::SelectCaseType,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Active,
    Completed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_indexed_by_step_number() {
        for step in Step::ALL {
            assert_eq!(step.rule().from, step);
        }
    }

    #[test]
    fn numbers_follow_wizard_order() {
        for (i, step) in Step::ALL.into_iter().enumerate() {
            assert_eq!(usize::from(step.number()), i + 1);
        }
    }

    #[test]
    fn forward_chain_visits_every_step_in_order() {
        let mut step = Step::SelectState;
        let mut visited = vec![step];
        loop {
            step = match step.rule().forward {
                Forward::Goto(next) => next,
                Forward::Fetch(fetch) => fetch_target(fetch),
                Forward::Search => Step::Results,
                Forward::None => break,
            };
            visited.push(step);
        }
        assert_eq!(visited, Step::ALL.to_vec());
    }

    #[test]
    fn back_targets_are_previous_step() {
        for step in Step::ALL {
            if let Some(back) = step.rule().back {
                assert_eq!(back.number() + 1, step.number());
            }
        }
        assert_eq!(Step::SelectCourtComplex.rule().back, None);
        assert_eq!(Step::Results.rule().back, None);
    }

    #[test]
    fn case_number_guard_needs_both_fields() {
        let mut selections = Selections::default();
        selections.case_number = "123".into();
        assert!(!Guard::CaseNumberAndYear.allows(&selections));
        selections.case_year = "  ".into();
        assert!(!Guard::CaseNumberAndYear.allows(&selections));
        selections.case_year = "2023".into();
        assert!(Guard::CaseNumberAndYear.allows(&selections));
    }
}
