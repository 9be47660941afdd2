//! Shared core for the City Doctor home-visit site.
//!
//! The core owns the lead-capture flow: the popup form, the submission to the
//! lead sheet, the thank-you redirect to WhatsApp and the popup/chatbot
//! visibility flags. Shells render [`ViewModel`] and execute [`Effect`]s.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod app;
pub mod capabilities;
pub mod config;
pub mod event;
pub mod form;
pub mod lead_client;
pub mod model;
pub mod thank_you;
pub mod visibility;

use std::time::Duration;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use config::{ConfigError, SiteConfig};
pub use crux_core::{render::Render, App as CruxApp};
pub use event::Event;
pub use form::{Emirate, FormField, FormStatus, LeadFormState, ValidationErrors};
pub use lead_client::{LeadClientError, LeadPayload, SubmissionResult};
pub use model::{Model, Route, ToastKind, ToastMessage, ViewModel};
pub use thank_you::{build_messaging_link, RedirectSequencer, ThankYouNavigationState};
pub use visibility::{Visibility, VisibilityAction, VisibilityController};

/// Advertised call-back time, shown in the form copy and the success message.
pub const ESTIMATED_RESPONSE_TIME_SEC: u32 = 30;

pub const HOME_PATH: &str = "/";
pub const THANK_YOU_PATH: &str = "/thank-you";

/// Time the success message stays on screen before the thank-you handoff.
pub const HANDOFF_DELAY: Duration = Duration::from_secs(3);
pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);
/// Pause between the countdown reaching zero and the external redirect.
pub const REDIRECT_GRACE: Duration = Duration::from_secs(1);

pub const DEFAULT_COUNTDOWN_START: u32 = 1;
pub const MAX_COUNTDOWN_START: u32 = 60;
pub const DEFAULT_HINT_INTERVAL_MS: u64 = 20_000;
pub const DEFAULT_HINT_VISIBLE_MS: u64 = 6_000;
pub const DEFAULT_MESSAGING_BASE_URL: &str = "https://wa.me/971551548684";

pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";
