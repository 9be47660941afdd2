//! Thank-you page: WhatsApp deep link and the countdown before redirecting.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::capabilities::TimerId;
use crate::form::{symptom_lines, LeadFormState};

pub const MESSAGE_FALLBACK: &str = "Medical service inquiry";

/// Characters left as-is by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// One-shot payload handed from the lead form to the thank-you route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThankYouNavigationState {
    pub symptoms: Vec<String>,
    pub symptoms_other: String,
}

impl From<&LeadFormState> for ThankYouNavigationState {
    fn from(state: &LeadFormState) -> Self {
        Self {
            symptoms: state.symptoms.clone(),
            symptoms_other: state.symptoms_other.trim().to_string(),
        }
    }
}

pub fn symptoms_for_message(state: &ThankYouNavigationState) -> Vec<String> {
    symptom_lines(&state.symptoms, &state.symptoms_other)
}

pub fn messaging_text(symptoms: &[String]) -> String {
    let listed = if symptoms.is_empty() {
        MESSAGE_FALLBACK.to_string()
    } else {
        symptoms.join(", ")
    };
    format!("Hi,\nI need a doctor home visit please.\n\nSymptoms: {listed}")
}

pub fn build_messaging_link(base_url: &str, symptoms: &[String]) -> String {
    let text = messaging_text(symptoms);
    format!("{base_url}?text={}", utf8_percent_encode(&text, URI_COMPONENT))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectPhase {
    /// Reached without a submission; nothing is scheduled.
    #[default]
    Static,
    CountingDown,
    AwaitingRedirect,
    Redirected,
}

/// What the owner has to do after a sequencer transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequencerStep {
    Idle,
    ScheduleTick,
    ScheduleRedirect,
    Redirect(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectSequencer {
    phase: RedirectPhase,
    countdown: u32,
    link: Option<String>,
    timer: Option<TimerId>,
}

impl RedirectSequencer {
    pub fn arrive(
        state: Option<ThankYouNavigationState>,
        countdown_start: u32,
        base_url: &str,
    ) -> (Self, SequencerStep) {
        let Some(state) = state else {
            return (Self::default(), SequencerStep::Idle);
        };

        let link = build_messaging_link(base_url, &symptoms_for_message(&state));
        let (phase, step) = if countdown_start > 0 {
            (RedirectPhase::CountingDown, SequencerStep::ScheduleTick)
        } else {
            (RedirectPhase::AwaitingRedirect, SequencerStep::ScheduleRedirect)
        };

        let sequencer = Self {
            phase,
            countdown: countdown_start,
            link: Some(link),
            timer: None,
        };
        (sequencer, step)
    }

    /// Advances on the firing of the currently owned timer.
    pub fn on_timer(&mut self) -> SequencerStep {
        self.timer = None;
        match self.phase {
            RedirectPhase::CountingDown => {
                self.countdown = self.countdown.saturating_sub(1);
                if self.countdown > 0 {
                    SequencerStep::ScheduleTick
                } else {
                    self.phase = RedirectPhase::AwaitingRedirect;
                    SequencerStep::ScheduleRedirect
                }
            }
            RedirectPhase::AwaitingRedirect => match self.link.clone() {
                Some(link) => {
                    self.phase = RedirectPhase::Redirected;
                    SequencerStep::Redirect(link)
                }
                None => SequencerStep::Idle,
            },
            RedirectPhase::Static | RedirectPhase::Redirected => SequencerStep::Idle,
        }
    }

    pub fn set_timer(&mut self, id: TimerId) {
        self.timer = Some(id);
    }

    pub fn owns_timer(&self, id: TimerId) -> bool {
        self.timer == Some(id)
    }

    pub fn take_timer(&mut self) -> Option<TimerId> {
        self.timer.take()
    }

    pub fn phase(&self) -> RedirectPhase {
        self.phase
    }

    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }

    pub fn from_submission(&self) -> bool {
        self.phase != RedirectPhase::Static
    }
}
