//! Side-effect capabilities the core asks the shell to perform.
//!
//! We use Crux's built-in Render capability directly because it provides
//! all necessary functionality for triggering view updates. HTTP is a
//! custom capability so the request carries our timeout and request id.

mod http;

pub use self::http::{
    Http, HttpError, HttpMethod, HttpOperation, HttpRequest, HttpResponse, HttpResult,
    DEFAULT_TIMEOUT_MS, MAX_TIMEOUT_MS, REQUEST_ID_HEADER,
};
pub use crux_core::render::Render;

// The Effect derive refers to the app and event types by name.
#[allow(unused_imports)]
use crate::{app::App, event::Event};

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub http: Http<Event>,
    pub render: Render<Event>,
}
