#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, Once,
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use harvestpay::{
    config::FeedbackAddresses,
    create_app, db,
    feedback::{Mail, MailError, Mailer},
    AppState,
};
use http_body_util::BodyExt; // For Response body handling
use serde_json::{json, Value};
use tower::ServiceExt; // For oneshot

// For initializing tracing once
static INIT: Once = Once::new();

pub fn setup() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt::try_init();
    });
}

/// Mail transport that keeps what it was given instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<Mail>>,
    pub fail: AtomicBool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        let mailer = Self::default();
        mailer.fail.store(true, Ordering::SeqCst);
        mailer
    }

    pub fn sent(&self) -> Vec<Mail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: Mail) -> Result<(), MailError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MailError("535 authentication failed".to_string()));
        }
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}

pub fn feedback_addresses() -> FeedbackAddresses {
    FeedbackAddresses {
        sender: "app@harvestpay.example".to_string(),
        recipient: "ops@harvestpay.example".to_string(),
    }
}

/// Fresh in-memory store with the schema applied.
pub async fn test_state_with(mailer: Arc<RecordingMailer>) -> AppState {
    setup();
    let db = db::connect("sqlite::memory:").await.unwrap();
    AppState::new(db, mailer, feedback_addresses())
}

pub async fn test_state() -> AppState {
    test_state_with(Arc::new(RecordingMailer::default())).await
}

pub async fn test_app() -> Router {
    create_app(test_state().await)
}

/// Send a request through the router and decode the JSON body (Null when empty).
pub async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, json)
}

pub fn farmer_json(username: &str) -> Value {
    json!({
        "role": "Farmer",
        "full_name": "Asha Patil",
        "username": username,
        "password": "harvest-2025",
        "phone": "9876543210",
        "age": 34,
        "gender": "Female",
        "address": "Village Road 4, Nashik",
        "land_proof": "lease-agreement.pdf",
        "bank_details": "SBI 00012345",
        "farming_type": "Grapes",
        "credit_history": "Repaid crop loan in 2023"
    })
}

pub fn contributor_json(username: &str, rate: f64) -> Value {
    json!({
        "role": "Contributor",
        "full_name": "Ravi Kulkarni",
        "username": username,
        "password": "lend-fairly",
        "phone": "9123456780",
        "email": format!("{}@example.org", username),
        "verification_doc": "pan-card.png",
        "interests": "Organic farming",
        "agreement": true,
        "preferred_rate": rate
    })
}

pub fn admin_json(username: &str) -> Value {
    json!({
        "role": "Admin",
        "full_name": "Meera Rao",
        "username": username,
        "password": "approve-carefully",
        "phone": "022-555-0100",
        "email": "meera@bank.example",
        "org_role": "Loan officer",
        "gov_id": "gov-id.jpg"
    })
}

/// Register from a registration body and log in with its password. Returns the token.
pub async fn register_and_login(app: &Router, registration: Value) -> String {
    let (status, body) = send(app, "POST", "/register", None, Some(registration.clone())).await;
    assert_eq!(status, StatusCode::CREATED, "registration failed: {}", body);

    let credentials = json!({
        "username": registration["username"],
        "password": registration["password"],
    });
    let (status, body) = send(app, "POST", "/login", None, Some(credentials)).await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["token"].as_str().unwrap().to_string()
}

pub fn loan_json(contributor: &str, amount: f64, purpose: &str) -> Value {
    json!({
        "purpose": purpose,
        "amount": amount,
        "repayment_period": "1 year",
        "annual_income": 240000.0,
        "existing_loans": 0.0,
        "collateral": "Tractor",
        "contributor": contributor
    })
}
