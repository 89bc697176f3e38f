//! Booking notifications.
//!
//! - [`NotificationDispatch`]: fire-and-forget entry point used after each
//!   committed booking transition.
//! - [`BookingNotifier`]: delivery channel trait, implemented by
//!   [`EmailNotifier`] (SMTP via `lettre`) and [`TracingNotifier`].

pub mod email;
pub mod notifier;

pub use email::{EmailConfig, EmailError, EmailNotifier};
pub use notifier::{
    BookingNotice, BookingNotifier, Notification, NotificationDispatch, NotificationKind,
    NotifyError, TracingNotifier,
};
