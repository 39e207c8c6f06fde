//! # dyn-ip-mailer
//!
//! Emails you when the public IP address of your network changes.
//!
//! Each run fetches the current address from an IP-echo service, compares it
//! with the address recorded by the previous run, and on a change updates the
//! record and sends one notification over SMTP. Scheduling is left to cron,
//! a systemd timer or similar.
//!
//! ## Usage
//!
//! ```bash
//! # Check and notify on change (default)
//! dyn-ip-mailer
//!
//! # Show current and cached IP without touching anything
//! dyn-ip-mailer status
//!
//! # Send the notification even if the IP is unchanged
//! dyn-ip-mailer check --force
//! ```
//!
//! ## Configuration
//!
//! `~/.dyn-ip-mailer.toml` or `./.dyn-ip-mailer.toml`:
//!
//! ```toml
//! cachefile = "/home/me/.cache/dyn-ip"
//! email = "me@example.com"
//!
//! [smtp]
//! server = "smtp.example.com"
//! port = 587
//! username = "me@example.com"
//! password = "$SMTP_PASSWORD"
//! ```

pub mod cache;
pub mod checker;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod notifier;

pub use cache::AddressCache;
pub use checker::{CheckOutcome, Checker};
pub use config::Settings;
pub use error::{MailerError, Result};
pub use fetcher::{AddressSource, IpFetcher};
pub use notifier::{Notifier, SmtpNotifier};
