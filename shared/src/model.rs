use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::capabilities::TimerId;
use crate::config::SiteConfig;
use crate::form::{LeadForm, ResponseMessage};
use crate::thank_you::{RedirectSequencer, ThankYouNavigationState};
use crate::visibility::{OnlineHint, VisibilityController};
use crate::{HOME_PATH, THANK_YOU_PATH};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Route {
    #[default]
    Home,
    ThankYou,
    Other(String),
}

impl Route {
    /// Maps a shell path (query and fragment allowed) onto a route.
    pub fn from_path(path: &str) -> Self {
        let path = path.split(|c: char| c == '?' || c == '#').next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            Self::Home
        } else if trimmed == THANK_YOU_PATH {
            Self::ThankYou
        } else {
            Self::Other(trimmed.to_string())
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Home => HOME_PATH,
            Self::ThankYou => THANK_YOU_PATH,
            Self::Other(path) => path,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    Success,
    Error,
}

impl ToastKind {
    #[must_use]
    pub const fn default_duration_ms(self) -> u64 {
        match self {
            Self::Success => 2000,
            Self::Error => 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToastMessage {
    pub message: String,
    pub kind: ToastKind,
    pub duration_ms: u64,
}

impl ToastMessage {
    #[must_use]
    pub fn new(message: impl Into<String>, kind: ToastKind) -> Self {
        Self {
            message: message.into(),
            kind,
            duration_ms: kind.default_duration_ms(),
        }
    }
}

/// Navigation to the thank-you route scheduled after a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handoff {
    pub timer: TimerId,
    pub state: ThankYouNavigationState,
}

#[derive(Debug, Default)]
pub struct Model {
    pub config: SiteConfig,
    pub route: Route,
    pub visibility: VisibilityController,
    pub hint: OnlineHint,
    /// Present for the lifetime of one popup; replaced on open and close.
    pub form: LeadForm,
    pub handoff: Option<Handoff>,
    /// Present while the thank-you route is active.
    pub thank_you: Option<RedirectSequencer>,
    pub toast: Option<ToastMessage>,
    next_timer_id: u64,
}

impl Model {
    pub fn allocate_timer_id(&mut self) -> TimerId {
        self.next_timer_id += 1;
        TimerId(self.next_timer_id)
    }
}

// --- View model ---

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PopupFormView {
    pub intro: String,
    pub name: String,
    pub phone: String,
    pub emirate: Option<String>,
    pub emirate_options: Vec<String>,
    pub symptom_options: Vec<String>,
    pub symptoms: Vec<String>,
    pub symptoms_menu_open: bool,
    pub show_symptoms_other: bool,
    pub symptoms_other: String,
    /// Keyed by the shell's field name.
    pub errors: BTreeMap<String, String>,
    pub submit_label: String,
    pub submit_enabled: bool,
    pub response: Option<ResponseMessage>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThankYouView {
    pub title: String,
    pub description: String,
    pub redirecting: bool,
    pub countdown: u32,
    pub messaging_link: Option<String>,
    pub show_open_link: bool,
    pub open_link_label: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToastView {
    pub message: String,
    pub kind: ToastKind,
    pub duration_ms: u64,
}

impl From<&ToastMessage> for ToastView {
    fn from(t: &ToastMessage) -> Self {
        Self {
            message: t.message.clone(),
            kind: t.kind,
            duration_ms: t.duration_ms,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewModel {
    pub route: String,
    pub show_floating_button: bool,
    pub online_hint_visible: bool,
    pub chatbot_open: bool,
    pub popup_form: Option<PopupFormView>,
    pub thank_you: Option<ThankYouView>,
    pub toast: Option<ToastView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_parsing() {
        assert_eq!(Route::from_path("/"), Route::Home);
        assert_eq!(Route::from_path(""), Route::Home);
        assert_eq!(Route::from_path("/thank-you"), Route::ThankYou);
        assert_eq!(Route::from_path("/thank-you/?utm_source=ads"), Route::ThankYou);
        assert_eq!(
            Route::from_path("/services#fever"),
            Route::Other("/services".into())
        );
        assert_eq!(Route::ThankYou.path(), "/thank-you");
    }

    #[test]
    fn timer_ids_are_unique() {
        let mut model = Model::default();
        let a = model.allocate_timer_id();
        let b = model.allocate_timer_id();
        assert_ne!(a, b);
    }

    #[test]
    fn toast_uses_kind_duration() {
        let toast = ToastMessage::new("Saved", ToastKind::Error);
        assert_eq!(toast.duration_ms, 5000);
        let toast = ToastMessage::new("Sent", ToastKind::Success);
        assert_eq!(toast.duration_ms, 2000);
        assert_eq!(serde_json::to_value(ToastKind::Success).unwrap(), "success");
    }
}
