#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! Shared core of the case-lookup wizard.
//!
//! The core owns the wizard state and its transitions. Shells send
//! [`Event`]s, perform the HTTP effects the core asks for, and paint the
//! [`ViewModel`] returned by `view`.

pub mod admin;
pub mod api;
pub mod app;
pub mod capabilities;
pub mod captcha;
pub mod case_result;
pub mod config;
pub mod error;
pub mod event;
pub mod html;
pub mod model;
pub mod step;
pub mod view;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use config::WizardConfig;
pub use crux_core::{render::Render, App as CruxApp};
pub use error::ApiError;
pub use event::Event;
pub use model::Model;
pub use step::Step;
pub use view::ViewModel;
