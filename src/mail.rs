use std::sync::Mutex;

use askama::Template;
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Serialize;

use crate::config::SmtpSettings;
use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[derive(Template)]
#[template(path = "email/password_reset.txt")]
pub struct PasswordResetEmail<'a> {
    pub app_name: &'a str,
    pub link: &'a str,
    pub expires_in: &'a str,
}

#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetHtml<'a> {
    app_name: &'a str,
    link: &'a str,
    expires_in: &'a str,
}

#[derive(Template)]
#[template(path = "email/verify_email.txt")]
pub struct VerifyEmail<'a> {
    pub app_name: &'a str,
    pub link: &'a str,
}

#[derive(Template)]
#[template(path = "email/verify_email.html")]
struct VerifyEmailHtml<'a> {
    app_name: &'a str,
    link: &'a str,
}

impl PasswordResetEmail<'_> {
    pub fn subject(&self) -> String {
        format!("Password Reset for {}", self.app_name)
    }

    /// Text and HTML bodies for one recipient.
    pub fn compose(&self, from: &str, to: &str) -> Result<OutgoingEmail, AppError> {
        let html = PasswordResetHtml {
            app_name: self.app_name,
            link: self.link,
            expires_in: self.expires_in,
        };
        Ok(OutgoingEmail {
            from: from.to_string(),
            to: to.to_string(),
            subject: self.subject(),
            text: self.render()?,
            html: html.render()?,
        })
    }
}

impl VerifyEmail<'_> {
    pub fn subject(&self) -> String {
        format!("Welcome to {}! Verify Your Email", self.app_name)
    }

    pub fn compose(&self, from: &str, to: &str) -> Result<OutgoingEmail, AppError> {
        let html = VerifyEmailHtml { app_name: self.app_name, link: self.link };
        Ok(OutgoingEmail {
            from: from.to_string(),
            to: to.to_string(),
            subject: self.subject(),
            text: self.render()?,
            html: html.render()?,
        })
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), AppError>;
}

fn mail_error(e: impl std::fmt::Display) -> AppError {
    AppError::Mail(e.to_string())
}

// ============================================================================
// SMTP
// ============================================================================

/// Delivers over SMTP. `secure` selects implicit TLS (port 465), otherwise
/// the connection is upgraded with STARTTLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self, AppError> {
        let builder = if settings.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
        }
        .map_err(mail_error)?;

        let transport = builder
            .port(settings.port)
            .credentials(Credentials::new(settings.user.clone(), settings.pass.clone()))
            .build();
        Ok(Self { transport })
    }
}

/// multipart/alternative message carrying both bodies.
pub fn build_message(email: &OutgoingEmail) -> Result<Message, AppError> {
    let from: Mailbox = email.from.parse().map_err(mail_error)?;
    let to: Mailbox = email.to.parse().map_err(mail_error)?;
    Message::builder()
        .from(from)
        .to(to)
        .subject(email.subject.as_str())
        .multipart(MultiPart::alternative_plain_html(email.text.clone(), email.html.clone()))
        .map_err(mail_error)
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), AppError> {
        let message = build_message(&email)?;
        self.transport.send(message).await.map_err(mail_error)?;
        log::info!("Email sent to={} subject={:?}", email.to, email.subject);
        Ok(())
    }
}

// ============================================================================
// Without a transport
// ============================================================================

/// Used when SMTP is not configured: the message is written to the log and dropped.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), AppError> {
        log::info!(
            "Simulated email from={} to={} subject={:?}\n{}",
            email.from,
            email.to,
            email.subject,
            email.text
        );
        Ok(())
    }
}

/// Captures messages in memory instead of delivering them.
#[derive(Default)]
pub struct MemoryMailer {
    outbox: Mutex<Vec<OutgoingEmail>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.outbox.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Most recent message addressed to `to` (case-insensitive).
    pub fn last_to(&self, to: &str) -> Option<OutgoingEmail> {
        self.outbox
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .rev()
            .find(|m| m.to.eq_ignore_ascii_case(to))
            .cloned()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), AppError> {
        self.outbox.lock().unwrap_or_else(|e| e.into_inner()).push(email);
        Ok(())
    }
}

/// "1 hour", "24 hours", "90 minutes".
pub fn describe_minutes(minutes: i64) -> String {
    match minutes {
        1 => "1 minute".to_string(),
        m if m % 60 == 0 && m / 60 == 1 => "1 hour".to_string(),
        m if m % 60 == 0 => format!("{} hours", m / 60),
        m => format!("{m} minutes"),
    }
}
