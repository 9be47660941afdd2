use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::capabilities::TimerId;
use crate::config::SiteConfig;
use crate::lead_client::SubmissionResult;
use crate::visibility::VisibilityAction;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub enum Event {
    #[default]
    Noop,

    // Shell lifecycle
    AppStarted {
        config: Option<Box<SiteConfig>>,
    },
    /// Route change performed by the shell (typed URL, plain links).
    RouteEntered {
        path: String,
    },

    // Visibility
    PopupForm(VisibilityAction),
    Chatbot(VisibilityAction),

    // Lead form
    NameChanged {
        value: String,
    },
    PhoneChanged {
        value: String,
    },
    EmirateSelected {
        value: String,
    },
    /// Raw value list of the symptom multi-select, sentinel included.
    SymptomsChanged {
        selected: Vec<String>,
    },
    SymptomsMenuToggled {
        open: bool,
    },
    SymptomsOtherChanged {
        value: String,
    },
    SubmitRequested {
        page_url: String,
    },

    DismissToast,

    // Capability responses
    #[serde(skip)]
    SubmissionCompleted {
        submission_id: Uuid,
        result: SubmissionResult,
    },
    #[serde(skip)]
    TimerFired {
        id: TimerId,
    },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::AppStarted { .. } => "app_started",
            Self::RouteEntered { .. } => "route_entered",
            Self::PopupForm(_) => "popup_form",
            Self::Chatbot(_) => "chatbot",
            Self::NameChanged { .. } => "name_changed",
            Self::PhoneChanged { .. } => "phone_changed",
            Self::EmirateSelected { .. } => "emirate_selected",
            Self::SymptomsChanged { .. } => "symptoms_changed",
            Self::SymptomsMenuToggled { .. } => "symptoms_menu_toggled",
            Self::SymptomsOtherChanged { .. } => "symptoms_other_changed",
            Self::SubmitRequested { .. } => "submit_requested",
            Self::DismissToast => "dismiss_toast",
            Self::SubmissionCompleted { .. } => "submission_completed",
            Self::TimerFired { .. } => "timer_fired",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::PopupForm(_)
                | Self::Chatbot(_)
                | Self::NameChanged { .. }
                | Self::PhoneChanged { .. }
                | Self::EmirateSelected { .. }
                | Self::SymptomsChanged { .. }
                | Self::SymptomsMenuToggled { .. }
                | Self::SymptomsOtherChanged { .. }
                | Self::SubmitRequested { .. }
                | Self::DismissToast
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_events_deserialize() {
        let event: Event =
            serde_json::from_str(r#"{"SubmitRequested":{"page_url":"https://x.ae/"}}"#).unwrap();
        assert_eq!(
            event,
            Event::SubmitRequested {
                page_url: "https://x.ae/".into()
            }
        );

        let event: Event = serde_json::from_str(r#"{"PopupForm":"open"}"#).unwrap();
        assert_eq!(event, Event::PopupForm(VisibilityAction::Open));
    }

    #[test]
    fn capability_responses_are_not_accepted_from_the_shell() {
        let result = serde_json::from_str::<Event>(r#"{"TimerFired":{"id":1}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn user_initiated_classification() {
        assert!(Event::SubmitRequested {
            page_url: String::new()
        }
        .is_user_initiated());
        assert!(!Event::TimerFired { id: TimerId(1) }.is_user_initiated());
        assert_eq!(Event::default().name(), "noop");
    }

    #[test]
    fn event_size_is_reasonable() {
        let size = std::mem::size_of::<Event>();
        assert!(size <= 64, "Event enum is {size} bytes, box more variants");
    }
}
