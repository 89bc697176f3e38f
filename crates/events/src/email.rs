//! Booking notification delivery via SMTP.
//!
//! [`EmailNotifier`] wraps the `lettre` async SMTP transport to send
//! plain-text booking emails. If `SMTP_HOST` is not set,
//! [`EmailConfig::from_env`] returns `None` and the server falls back to
//! the tracing notifier.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::notifier::{BookingNotifier, Notification, NotifyError};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@clubstay.local";

/// Default signature when `CLUB_NAME` is not set.
const DEFAULT_CLUB_NAME: &str = "Club Reservations";

/// Configuration for the SMTP notifier.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    /// Signature line and sender display name.
    pub club_name: String,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set.
    ///
    /// | Variable        | Required | Default                   |
    /// |-----------------|----------|---------------------------|
    /// | `SMTP_HOST`     | yes      |                           |
    /// | `SMTP_PORT`     | no       | `587`                     |
    /// | `SMTP_FROM`     | no       | `noreply@clubstay.local`  |
    /// | `SMTP_USER`     | no       |                           |
    /// | `SMTP_PASSWORD` | no       |                           |
    /// | `CLUB_NAME`     | no       | `Club Reservations`       |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
            club_name: std::env::var("CLUB_NAME")
                .unwrap_or_else(|_| DEFAULT_CLUB_NAME.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// EmailNotifier
// ---------------------------------------------------------------------------

/// Sends booking notifications to the occupant (or sponsor) by email.
pub struct EmailNotifier {
    config: EmailConfig,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Assemble the message for a notification addressed to `to_email`.
    pub fn build_message(
        &self,
        to_email: &str,
        notification: &Notification,
    ) -> Result<Message, EmailError> {
        let from = format!("{} <{}>", self.config.club_name, self.config.from_address);
        Message::builder()
            .from(from.parse()?)
            .to(to_email.parse()?)
            .subject(notification.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body(&self.config.club_name))
            .map_err(|e| EmailError::Build(e.to_string()))
    }

    async fn send(&self, to_email: &str, notification: &Notification) -> Result<(), EmailError> {
        let email = self.build_message(to_email, notification)?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
                .port(self.config.smtp_port);

        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let mailer = transport_builder.build();
        mailer.send(email).await?;

        tracing::info!(
            to = to_email,
            event_type = notification.kind.event_type(),
            booking_id = notification.booking.booking_id,
            "Notification email sent"
        );
        Ok(())
    }
}

#[async_trait]
impl BookingNotifier for EmailNotifier {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        let to = notification
            .booking
            .recipient
            .as_deref()
            .ok_or(NotifyError::NoRecipient(notification.booking.booking_id))?;
        self.send(to, notification).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use clubstay_core::booking::{BookingStatus, BookingType, PaymentStatus};

    use crate::notifier::{BookingNotice, NotificationKind};

    fn config() -> EmailConfig {
        EmailConfig {
            smtp_host: "localhost".to_string(),
            smtp_port: 2525,
            from_address: "bookings@club.org".to_string(),
            smtp_user: None,
            smtp_password: None,
            club_name: "Sports Club".to_string(),
        }
    }

    fn notification(recipient: Option<&str>) -> Notification {
        Notification::new(
            NotificationKind::PaymentConfirmed,
            BookingNotice {
                booking_id: 9,
                booking_code: "SPT000001XYZ".to_string(),
                application_no: "SPRT202406010001".to_string(),
                booking_type: BookingType::Room,
                status: BookingStatus::Confirmed,
                payment_status: PaymentStatus::Paid,
                occupant_name: "Ravi".to_string(),
                recipient: recipient.map(str::to_string),
                check_in: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
                check_out: Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap(),
                total_cost: 1500,
                resource_label: None,
                resource_site: None,
            },
        )
    }

    #[test]
    fn from_env_returns_none_without_smtp_host() {
        std::env::remove_var("SMTP_HOST");
        assert!(EmailConfig::from_env().is_none());
    }

    #[test]
    fn email_error_display_build() {
        let err = EmailError::Build("missing body".to_string());
        assert_eq!(err.to_string(), "Email build error: missing body");
    }

    #[test]
    fn message_builds_for_valid_recipient() {
        let notifier = EmailNotifier::new(config());
        assert!(notifier
            .build_message("ravi@example.org", &notification(None))
            .is_ok());
    }

    #[test]
    fn invalid_recipient_is_address_error() {
        let notifier = EmailNotifier::new(config());
        let err = notifier
            .build_message("not-an-email", &notification(None))
            .unwrap_err();
        assert!(err.to_string().contains("Email address parse error"));
    }

    #[tokio::test]
    async fn missing_recipient_is_reported() {
        let notifier = EmailNotifier::new(config());
        let err = notifier.deliver(&notification(None)).await.unwrap_err();
        assert!(matches!(err, NotifyError::NoRecipient(9)));
    }
}
