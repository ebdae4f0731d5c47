//! Shared test harness and canned server replies

#![allow(dead_code)]

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use crux_core::testing::AppTester;
use crux_core::Request;
use serde_json::{json, Value};
use std::io::Cursor;

use case_lookup_core::capabilities::{
    HttpError, HttpOperation, HttpRequest, HttpResponse, HttpResult,
};
use case_lookup_core::{App, Effect, Event, Model, Step, ViewModel};

pub type HttpRequestHandle = Request<HttpOperation>;

/// Drives the app the way a shell would and keeps the model between calls.
pub struct Harness {
    pub app: AppTester<App, Effect>,
    pub model: Model,
}

fn http_requests(effects: Vec<Effect>) -> Vec<HttpRequestHandle> {
    effects
        .into_iter()
        .filter_map(|effect| match effect {
            Effect::Http(request) => Some(request),
            _ => None,
        })
        .collect()
}

impl Harness {
    pub fn new() -> Self {
        Self {
            app: AppTester::<App, Effect>::default(),
            model: Model::default(),
        }
    }

    /// Sends `event` and returns the HTTP requests it produced.
    pub fn send(&mut self, event: Event) -> Vec<HttpRequestHandle> {
        let update = self.app.update(event, &mut self.model);
        http_requests(update.effects)
    }

    /// Like [`Harness::send`] for events expected to start exactly one request.
    pub fn send_one(&mut self, event: Event) -> HttpRequestHandle {
        let mut requests = self.send(event);
        assert_eq!(requests.len(), 1, "expected exactly one request");
        requests.remove(0)
    }

    /// Resolves `request`, feeds the resulting events back and returns any
    /// follow-up requests.
    pub fn respond(
        &mut self,
        request: &mut HttpRequestHandle,
        result: HttpResult,
    ) -> Vec<HttpRequestHandle> {
        let update = self
            .app
            .resolve(request, result)
            .expect("request should resolve");
        let mut follow_ups = http_requests(update.effects);
        for event in update.events {
            follow_ups.extend(self.send(event));
        }
        follow_ups
    }

    pub fn view(&self) -> ViewModel {
        self.app.view(&self.model)
    }

    /// Boots the app and answers the state list.
    pub fn started() -> Self {
        let mut h = Self::new();
        let mut states = h.send_one(Event::AppStarted);
        assert!(h.respond(&mut states, ok(states_body())).is_empty());
        h
    }

    /// Walks to the case-type step with every reply succeeding.
    pub fn at_case_type_step() -> Self {
        let mut h = Self::started();
        h.send(Event::StateSelected("Delhi".into()));
        let mut districts = h.send_one(Event::NextPressed);
        assert!(h.respond(&mut districts, ok(districts_body())).is_empty());
        assert_eq!(h.model.step, Step::SelectDistrict);

        h.send(Event::DistrictSelected("Central".into()));
        assert!(h.send(Event::NextPressed).is_empty());
        assert_eq!(h.model.step, Step::InitSession);

        let mut session = h.send_one(Event::NextPressed);
        let mut follow_ups = h.respond(&mut session, ok(session_body()));
        assert_eq!(h.model.step, Step::SelectCourtComplex);
        assert_eq!(follow_ups.len(), 1, "court complexes load after the session");
        assert!(h
            .respond(&mut follow_ups[0], court_complexes_reply())
            .is_empty());

        h.send(Event::CourtComplexSelected("1".into()));
        let mut case_types = h.send_one(Event::NextPressed);
        assert!(h.respond(&mut case_types, case_types_reply()).is_empty());
        assert_eq!(h.model.step, Step::SelectCaseType);
        h
    }

    /// Walks to the CAPTCHA step and returns the CAPTCHA request it issued.
    pub fn entering_captcha_step() -> (Self, HttpRequestHandle) {
        let mut h = Self::at_case_type_step();
        h.send(Event::CaseTypeSelected("12".into()));
        assert!(h.send(Event::NextPressed).is_empty());
        h.send(Event::CaseNumberChanged("345".into()));
        h.send(Event::CaseYearChanged("2023".into()));
        let captcha = h.send_one(Event::NextPressed);
        assert_eq!(h.model.step, Step::SolveCaptcha);
        (h, captcha)
    }

    /// The CAPTCHA step with an image loaded and an answer typed.
    pub fn ready_to_search() -> Self {
        let (mut h, mut captcha) = Self::entering_captcha_step();
        assert!(h.respond(&mut captcha, ok(captcha_body(120, 40))).is_empty());
        h.send(Event::CaptchaChanged("x7k2".into()));
        h
    }
}

pub fn operation(request: &HttpRequestHandle) -> &HttpRequest {
    let HttpOperation::Execute(inner) = &request.operation;
    inner
}

pub fn ok(body: Value) -> HttpResult {
    Ok(HttpResponse::with_json(200, &body).expect("body serializes"))
}

pub fn rejected(message: &str) -> HttpResult {
    ok(json!({ "success": false, "message": message }))
}

pub fn status(code: u16) -> HttpResult {
    Ok(HttpResponse::with_json(code, &json!({ "detail": "Internal error" })).expect("body serializes"))
}

pub fn connection_refused() -> HttpResult {
    Err(HttpError::Connection {
        message: "connection refused".into(),
    })
}

pub fn states_body() -> Value {
    json!({ "success": true, "states": ["Delhi", "Goa"] })
}

pub fn districts_body() -> Value {
    json!({ "success": true, "districts": ["Central", "South"] })
}

pub fn session_body() -> Value {
    json!({ "success": true, "message": "Session initialized" })
}

/// Reply with a literal body, for payloads whose key order matters.
pub fn ok_raw(body: &str) -> HttpResult {
    Ok(HttpResponse::new(200, body.as_bytes().to_vec()))
}

/// Court complexes in the portal's own order, which is not alphabetical.
pub fn court_complexes_reply() -> HttpResult {
    ok_raw(r#"{"success":true,"court_complexes":{"Tis Hazari":"1","Saket":"2"}}"#)
}

pub fn case_types_reply() -> HttpResult {
    ok_raw(
        r#"{"success":true,"case_types":{"Writ Petition":"14","Civil Suit":"12","Criminal Appeal":"13"},"message":"Case types loaded"}"#,
    )
}

pub fn png_data_url(width: u32, height: u32) -> String {
    let image = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("png encodes");
    format!("data:image/png;base64,{}", STANDARD.encode(bytes))
}

pub fn captcha_body(width: u32, height: u32) -> Value {
    json!({ "success": true, "captcha_image": png_data_url(width, height) })
}

pub fn search_body() -> Value {
    json!({
        "success": true,
        "case_details": {
            "case_type": "Civil Suit",
            "filing_number": "1234/2023",
            "cnr_number": "DLCT010012342023",
            "case_status": "Pending",
            "petitioners": ["A", "B"],
            "respondents": ["C"],
            "orders": [
                {
                    "order_number": "1",
                    "order_date": "02-03-2024",
                    "download_link": "/orders/1.pdf"
                }
            ]
        },
        "message": "Case details retrieved"
    })
}
