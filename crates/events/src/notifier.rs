//! Booking notifications and their fire-and-forget dispatcher.
//!
//! [`NotificationDispatch`] is what the lifecycle code calls after a commit.
//! Each call spawns a task that hands a [`Notification`] to the configured
//! [`BookingNotifier`]; failures are logged there and never reach the caller.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use clubstay_core::booking::{BookingStatus, BookingType, PaymentStatus};
use clubstay_core::types::{Amount, DbId, Timestamp};
use clubstay_db::models::booking::Booking;
use clubstay_db::models::resource::Resource;
use tokio_util::task::TaskTracker;

use crate::email::EmailError;

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

/// Snapshot of the booking fields a notification needs.
#[derive(Debug, Clone, Serialize)]
pub struct BookingNotice {
    pub booking_id: DbId,
    pub booking_code: String,
    pub application_no: String,
    pub booking_type: BookingType,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub occupant_name: String,
    pub recipient: Option<String>,
    pub check_in: Timestamp,
    pub check_out: Timestamp,
    pub total_cost: Amount,
    pub resource_label: Option<String>,
    pub resource_site: Option<String>,
}

impl BookingNotice {
    pub fn new(booking: &Booking, resource: Option<&Resource>) -> Self {
        Self {
            booking_id: booking.id,
            booking_code: booking.booking_code.clone(),
            application_no: booking.application_no.clone(),
            booking_type: booking.booking_type,
            status: booking.status,
            payment_status: booking.payment_status,
            occupant_name: booking.occupant_name.clone(),
            recipient: booking.contact_email().map(str::to_string),
            check_in: booking.check_in,
            check_out: booking.check_out,
            total_cost: booking.total_cost,
            resource_label: resource.map(|r| r.label.clone()),
            resource_site: resource.map(|r| r.site.clone()),
        }
    }

    /// The identifier shown to the occupant.
    pub fn reference(&self) -> &str {
        match self.booking_type {
            BookingType::Room => &self.booking_code,
            BookingType::Service => &self.application_no,
        }
    }
}

/// What happened to the booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationKind {
    Submission,
    Confirmation,
    StatusChange { message: String },
    PaymentConfirmed,
    CheckIn,
    CheckOut,
}

impl NotificationKind {
    /// Dot-separated event name used in logs.
    pub fn event_type(&self) -> &'static str {
        match self {
            NotificationKind::Submission => "booking.submitted",
            NotificationKind::Confirmation => "booking.confirmed",
            NotificationKind::StatusChange { .. } => "booking.status_changed",
            NotificationKind::PaymentConfirmed => "booking.payment_confirmed",
            NotificationKind::CheckIn => "booking.checked_in",
            NotificationKind::CheckOut => "booking.checked_out",
        }
    }
}

/// A notification ready for delivery.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub booking: BookingNotice,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn new(kind: NotificationKind, booking: BookingNotice) -> Self {
        Self {
            kind,
            booking,
            timestamp: Utc::now(),
        }
    }

    pub fn subject(&self) -> String {
        let title = match &self.kind {
            NotificationKind::Submission => "Booking Request Received",
            NotificationKind::Confirmation => "Booking Confirmation",
            NotificationKind::StatusChange { .. } => "Booking Status Update",
            NotificationKind::PaymentConfirmed => "Payment Received",
            NotificationKind::CheckIn => "Check-in Confirmation",
            NotificationKind::CheckOut => "Check-out Confirmation",
        };
        format!("{title} ({})", self.booking.reference())
    }

    /// Plain-text body addressed to the occupant.
    pub fn body(&self, club_name: &str) -> String {
        let b = &self.booking;
        let headline = match &self.kind {
            NotificationKind::Submission => {
                "Your booking request has been received and is pending approval.".to_string()
            }
            NotificationKind::Confirmation => "Your booking has been confirmed.".to_string(),
            NotificationKind::StatusChange { message } => message.clone(),
            NotificationKind::PaymentConfirmed => {
                format!("We have received your payment of {}.", b.total_cost)
            }
            NotificationKind::CheckIn => "You have been checked in. Enjoy your stay.".to_string(),
            NotificationKind::CheckOut => {
                "You have been checked out. Thank you for staying with us.".to_string()
            }
        };

        let mut body = format!("Dear {},\n\n{headline}\n\n", b.occupant_name);
        body.push_str(&format!("Reference: {}\n", b.reference()));
        if let (Some(label), Some(site)) = (&b.resource_label, &b.resource_site) {
            let noun = match b.booking_type {
                BookingType::Room => "Room",
                BookingType::Service => "Service",
            };
            body.push_str(&format!("{noun}: {label} ({site})\n"));
        }
        body.push_str(&format!(
            "Dates: {} to {}\n",
            b.check_in.format("%Y-%m-%d"),
            b.check_out.format("%Y-%m-%d")
        ));
        body.push_str(&format!("Total cost: {}\n", b.total_cost));
        body.push_str(&format!("Status: {}\n\n{club_name}\n", b.status));
        body
    }
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// Error type for notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The booking carries no address to notify.
    #[error("No recipient for booking {0}")]
    NoRecipient(DbId),

    #[error(transparent)]
    Email(#[from] EmailError),
}

/// A delivery channel for booking notifications.
#[async_trait]
pub trait BookingNotifier: Send + Sync {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Writes notifications to the log instead of sending them.
///
/// Used when SMTP is not configured.
pub struct TracingNotifier;

#[async_trait]
impl BookingNotifier for TracingNotifier {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(
            event_type = notification.kind.event_type(),
            booking_id = notification.booking.booking_id,
            reference = notification.booking.reference(),
            subject = %notification.subject(),
            "Booking notification"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Fire-and-forget front end over a [`BookingNotifier`].
///
/// Cheap to clone; share it through application state.
#[derive(Clone)]
pub struct NotificationDispatch {
    notifier: Arc<dyn BookingNotifier>,
    deliveries: TaskTracker,
}

impl NotificationDispatch {
    pub fn new(notifier: Arc<dyn BookingNotifier>) -> Self {
        Self {
            notifier,
            deliveries: TaskTracker::new(),
        }
    }

    /// Number of deliveries spawned but not yet finished. A delivery that
    /// panicked counts as finished.
    pub fn in_flight(&self) -> usize {
        self.deliveries.len()
    }

    /// Wait until every spawned delivery has finished or `timeout` elapses.
    ///
    /// Returns `true` when nothing is left in flight. Deliveries spawned
    /// after the call are still tracked.
    pub async fn drain(&self, timeout: Duration) -> bool {
        self.deliveries.close();
        let drained = tokio::time::timeout(timeout, self.deliveries.wait())
            .await
            .is_ok();
        self.deliveries.reopen();
        drained
    }

    pub fn notify_submission(&self, booking: &Booking) {
        self.send(NotificationKind::Submission, booking, None);
    }

    pub fn notify_confirmation(&self, booking: &Booking, resource: Option<&Resource>) {
        self.send(NotificationKind::Confirmation, booking, resource);
    }

    pub fn notify_status_change(&self, booking: &Booking, message: &str) {
        self.send(
            NotificationKind::StatusChange {
                message: message.to_string(),
            },
            booking,
            None,
        );
    }

    pub fn notify_payment_confirmed(&self, booking: &Booking) {
        self.send(NotificationKind::PaymentConfirmed, booking, None);
    }

    pub fn notify_check_in(&self, booking: &Booking, resource: Option<&Resource>) {
        self.send(NotificationKind::CheckIn, booking, resource);
    }

    pub fn notify_check_out(&self, booking: &Booking, resource: Option<&Resource>) {
        self.send(NotificationKind::CheckOut, booking, resource);
    }

    fn send(&self, kind: NotificationKind, booking: &Booking, resource: Option<&Resource>) {
        self.spawn_delivery(Notification::new(kind, BookingNotice::new(booking, resource)));
    }

    /// Spawn delivery on the runtime. Never blocks, never fails.
    fn spawn_delivery(&self, notification: Notification) {
        let notifier = Arc::clone(&self.notifier);
        self.deliveries.spawn(async move {
            match notifier.deliver(&notification).await {
                Ok(()) => {}
                Err(NotifyError::NoRecipient(booking_id)) => {
                    tracing::debug!(
                        booking_id,
                        event_type = notification.kind.event_type(),
                        "Notification skipped: no recipient"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        booking_id = notification.booking.booking_id,
                        event_type = notification.kind.event_type(),
                        error = %e,
                        "Notification delivery failed"
                    );
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn notice(booking_type: BookingType) -> BookingNotice {
        BookingNotice {
            booking_id: 1,
            booking_code: "SPT123456ABC".to_string(),
            application_no: "SPRT202406011234".to_string(),
            booking_type,
            status: BookingStatus::Confirmed,
            payment_status: PaymentStatus::Pending,
            occupant_name: "Asha".to_string(),
            recipient: Some("asha@example.org".to_string()),
            check_in: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            check_out: Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap(),
            total_cost: 3000,
            resource_label: Some("201".to_string()),
            resource_site: Some("SPORTI-1".to_string()),
        }
    }

    #[test]
    fn confirmation_subject_carries_booking_code() {
        let n = Notification::new(NotificationKind::Confirmation, notice(BookingType::Room));
        assert_eq!(n.subject(), "Booking Confirmation (SPT123456ABC)");
    }

    #[test]
    fn service_notifications_use_application_number() {
        let n = Notification::new(NotificationKind::Submission, notice(BookingType::Service));
        assert_eq!(n.subject(), "Booking Request Received (SPRT202406011234)");
    }

    #[test]
    fn status_change_body_uses_message() {
        let n = Notification::new(
            NotificationKind::StatusChange {
                message: "Your booking has been cancelled.".to_string(),
            },
            notice(BookingType::Room),
        );
        let body = n.body("Club");
        assert!(body.contains("Your booking has been cancelled."));
        assert!(body.contains("Room: 201 (SPORTI-1)"));
        assert!(body.contains("2024-06-01 to 2024-06-03"));
    }

    #[test]
    fn event_types_are_distinct() {
        let kinds = [
            NotificationKind::Submission,
            NotificationKind::Confirmation,
            NotificationKind::StatusChange { message: String::new() },
            NotificationKind::PaymentConfirmed,
            NotificationKind::CheckIn,
            NotificationKind::CheckOut,
        ];
        let mut names: Vec<_> = kinds.iter().map(|k| k.event_type()).collect();
        names.dedup();
        assert_eq!(names.len(), kinds.len());
    }

    #[tokio::test]
    async fn drain_waits_for_spawned_deliveries() {
        struct Slow;

        #[async_trait]
        impl BookingNotifier for Slow {
            async fn deliver(&self, _: &Notification) -> Result<(), NotifyError> {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok(())
            }
        }

        let dispatch = NotificationDispatch::new(Arc::new(Slow));
        let n = Notification::new(NotificationKind::CheckOut, notice(BookingType::Room));
        dispatch.spawn_delivery(n);
        assert_eq!(dispatch.in_flight(), 1);
        assert!(dispatch.drain(Duration::from_secs(2)).await);
        assert_eq!(dispatch.in_flight(), 0);
    }

    #[tokio::test]
    async fn panicking_delivery_does_not_stall_drain() {
        struct Broken;

        #[async_trait]
        impl BookingNotifier for Broken {
            async fn deliver(&self, _: &Notification) -> Result<(), NotifyError> {
                panic!("transport exploded");
            }
        }

        let dispatch = NotificationDispatch::new(Arc::new(Broken));
        for kind in [NotificationKind::CheckIn, NotificationKind::CheckOut] {
            dispatch.spawn_delivery(Notification::new(kind, notice(BookingType::Room)));
        }
        assert!(dispatch.drain(Duration::from_secs(2)).await);
        assert_eq!(dispatch.in_flight(), 0);
    }

    #[tokio::test]
    async fn drain_times_out_on_stuck_delivery() {
        struct Stuck;

        #[async_trait]
        impl BookingNotifier for Stuck {
            async fn deliver(&self, _: &Notification) -> Result<(), NotifyError> {
                std::future::pending::<()>().await;
                Ok(())
            }
        }

        let dispatch = NotificationDispatch::new(Arc::new(Stuck));
        let n = Notification::new(NotificationKind::Submission, notice(BookingType::Room));
        dispatch.spawn_delivery(n);
        assert!(!dispatch.drain(Duration::from_millis(50)).await);
        assert_eq!(dispatch.in_flight(), 1);
    }

    #[tokio::test]
    async fn tracing_notifier_always_succeeds() {
        let n = Notification::new(NotificationKind::CheckIn, notice(BookingType::Room));
        assert!(TracingNotifier.deliver(&n).await.is_ok());
    }
}
