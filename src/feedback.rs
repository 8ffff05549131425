//! Feedback dispatch
//!
//! Feedback is not stored. It is wrapped in a plain-text message to the operator
//! and handed to a [`Mailer`]; delivery is attempted once.

use std::fmt;

use async_trait::async_trait;
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{error, info};

use crate::config::{FeedbackAddresses, SmtpSettings};
use crate::error::AppError;

pub const FEEDBACK_SUBJECT: &str = "New Feedback from Tenant Farmer Loan App";

/// One outgoing plain-text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug)]
pub struct MailError(pub String);

impl fmt::Display for MailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mail delivery failed: {}", self.0)
    }
}

impl std::error::Error for MailError {}

/// Outbound mail transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: Mail) -> Result<(), MailError>;
}

/// STARTTLS SMTP relay with login credentials.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self, MailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .map_err(|e| MailError(e.to_string()))?
            .port(settings.port)
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .timeout(Some(settings.timeout))
            .build();

        Ok(Self { transport })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: Mail) -> Result<(), MailError> {
        let message = Message::builder()
            .from(mail.from.parse().map_err(|e| MailError(format!("sender: {e}")))?)
            .to(mail.to.parse().map_err(|e| MailError(format!("recipient: {e}")))?)
            .subject(mail.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body)
            .map_err(|e| MailError(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| MailError(e.to_string()))
    }
}

/// Stand-in used when no SMTP relay is configured. Every send fails.
pub struct UnconfiguredMailer;

#[async_trait]
impl Mailer for UnconfiguredMailer {
    async fn send(&self, _mail: Mail) -> Result<(), MailError> {
        Err(MailError("no SMTP relay configured".to_string()))
    }
}

/// Build the operator message for `feedback`, or `None` when it is blank.
pub fn compose(feedback: &str, addresses: &FeedbackAddresses) -> Option<Mail> {
    if feedback.trim().is_empty() {
        return None;
    }
    Some(Mail {
        from: addresses.sender.clone(),
        to: addresses.recipient.clone(),
        subject: FEEDBACK_SUBJECT.to_string(),
        body: format!("User Feedback:\n\n{}", feedback),
    })
}

/// Send feedback to the operator. Transport errors are logged and reported generically.
pub async fn send_feedback(
    mailer: &dyn Mailer,
    addresses: &FeedbackAddresses,
    feedback: &str,
) -> Result<(), AppError> {
    let mail = compose(feedback, addresses).ok_or_else(|| {
        AppError::Validation("Please enter feedback before submitting.".to_string())
    })?;

    match mailer.send(mail).await {
        Ok(()) => {
            info!(recipient = %addresses.recipient, "feedback delivered");
            Ok(())
        }
        Err(e) => {
            error!("Error sending feedback: {}", e);
            Err(AppError::FeedbackDelivery)
        }
    }
}
