//! Popup lead form: field state, validation and the submit state machine.
//!
//! The form never performs I/O itself. `try_begin_submit` hands back the
//! payload to send and `complete` applies the client's answer, so every
//! transition can be exercised without a shell.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::lead_client::{LeadPayload, SubmissionResult};
use crate::thank_you::ThankYouNavigationState;
use crate::{ESTIMATED_RESPONSE_TIME_SEC, GENERIC_FAILURE_MESSAGE};

pub const OTHER_SYMPTOM: &str = "Other";

/// Injected by the multi-select's "Done" row. Closes the menu, never stored.
pub const CONFIRM_SELECTION_TAG: &str = "__confirm__";

pub const SYMPTOM_OPTIONS: &[&str] = &[
    "Fever",
    "Cough",
    "Cold & Flu",
    "Sore Throat",
    "Headache",
    "Stomach Pain",
    "Vomiting",
    "Diarrhea",
    "Body Pain",
    "Dehydration",
    OTHER_SYMPTOM,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Emirate {
    Dubai,
    #[serde(rename = "Abu Dhabi")]
    AbuDhabi,
    Sharjah,
}

impl Emirate {
    pub const ALL: [Self; 3] = [Self::Dubai, Self::AbuDhabi, Self::Sharjah];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Dubai => "Dubai",
            Self::AbuDhabi => "Abu Dhabi",
            Self::Sharjah => "Sharjah",
        }
    }
}

impl fmt::Display for Emirate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown emirate: {0}")]
pub struct UnknownEmirate(pub String);

impl FromStr for Emirate {
    type Err = UnknownEmirate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|e| e.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownEmirate(wanted.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    Name,
    Phone,
    Emirate,
    Symptoms,
    SymptomsOther,
}

impl FormField {
    /// Field name as the shell's form knows it.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Phone => "phone",
            Self::Emirate => "emirates",
            Self::Symptoms => "symptoms",
            Self::SymptomsOther => "symptomsOther",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors(BTreeMap<FormField, String>);

impl ValidationErrors {
    pub fn insert(&mut self, field: FormField, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: FormField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: FormField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn fields(&self) -> impl Iterator<Item = FormField> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormField, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }
}

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadFormState {
    pub name: String,
    /// International format as produced by the phone widget; never rewritten.
    pub phone: String,
    pub emirate: Option<Emirate>,
    /// Ordered set of tags from `SYMPTOM_OPTIONS`.
    pub symptoms: Vec<String>,
    /// Only meaningful while `symptoms` contains `OTHER_SYMPTOM`.
    pub symptoms_other: String,
}

// Name and phone are personal data; keep them out of logs.
impl fmt::Debug for LeadFormState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeadFormState")
            .field("name_present", &!self.name.trim().is_empty())
            .field("phone_present", &!self.phone.trim().is_empty())
            .field("emirate", &self.emirate)
            .field("symptoms", &self.symptoms)
            .field("symptoms_other_present", &!self.symptoms_other.trim().is_empty())
            .finish()
    }
}

impl LeadFormState {
    pub fn has_other(&self) -> bool {
        self.symptoms.iter().any(|s| s == OTHER_SYMPTOM)
    }

    /// Replaces the selection with a raw multi-select value list.
    ///
    /// Returns `true` when the list carried the confirm sentinel, i.e. the
    /// shell should close the selection menu.
    pub fn apply_symptom_selection(&mut self, raw: Vec<String>) -> bool {
        let mut close_menu = false;
        let mut selected: Vec<String> = Vec::with_capacity(raw.len());

        for tag in raw {
            if tag == CONFIRM_SELECTION_TAG {
                close_menu = true;
                continue;
            }
            if !SYMPTOM_OPTIONS.contains(&tag.as_str()) {
                warn!(tag = %tag, "Ignoring unknown symptom tag");
                continue;
            }
            if !selected.contains(&tag) {
                selected.push(tag);
            }
        }

        self.symptoms = selected;
        if !self.has_other() {
            self.symptoms_other.clear();
        }
        close_menu
    }
}

/// Symptom list with the bare `Other` tag replaced by `Other: <text>` at the
/// end, or kept as `Other` when no text was given.
pub fn symptom_lines(symptoms: &[String], symptoms_other: &str) -> Vec<String> {
    let mut lines: Vec<String> = symptoms
        .iter()
        .filter(|s| s.as_str() != OTHER_SYMPTOM)
        .cloned()
        .collect();

    if symptoms.iter().any(|s| s == OTHER_SYMPTOM) {
        let other = symptoms_other.trim();
        if other.is_empty() {
            lines.push(OTHER_SYMPTOM.to_string());
        } else {
            lines.push(format!("{OTHER_SYMPTOM}: {other}"));
        }
    }

    lines
}

pub fn validate(state: &LeadFormState) -> ValidationErrors {
    let mut errors = ValidationErrors::default();

    if state.name.trim().is_empty() {
        errors.insert(FormField::Name, "Name is required");
    }
    if state.phone.trim().is_empty() {
        errors.insert(FormField::Phone, "Phone number is required");
    }
    if state.emirate.is_none() {
        errors.insert(FormField::Emirate, "Please select your emirate");
    }
    if state.symptoms.is_empty() {
        errors.insert(FormField::Symptoms, "Please select at least one symptom");
    }
    if state.has_other() && state.symptoms_other.trim().is_empty() {
        errors.insert(FormField::SymptomsOther, "Please describe your other symptoms");
    }

    errors
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormStatus {
    #[default]
    Editing,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub text: String,
    pub is_error: bool,
}

impl ResponseMessage {
    pub fn success() -> Self {
        Self {
            text: format!(
                "Your form has been submitted successfully. Our medical team will call you back within {ESTIMATED_RESPONSE_TIME_SEC} seconds."
            ),
            is_error: false,
        }
    }

    pub fn failure() -> Self {
        Self {
            text: GENERIC_FAILURE_MESSAGE.to_string(),
            is_error: true,
        }
    }
}

/// What the form remembers about a request it is waiting on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InFlight {
    pub submission_id: Uuid,
    pub handoff: ThankYouNavigationState,
    pub emirate: Option<Emirate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitAttempt {
    AlreadySubmitting,
    Invalid,
    Ready {
        submission_id: Uuid,
        payload: LeadPayload,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The answer belongs to a request this form did not send.
    Stale,
    Accepted(InFlight),
    Rejected,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadForm {
    pub state: LeadFormState,
    pub errors: ValidationErrors,
    pub status: FormStatus,
    pub response: Option<ResponseMessage>,
    pub symptoms_menu_open: bool,
    pub in_flight: Option<InFlight>,
}

impl LeadForm {
    pub fn is_submitting(&self) -> bool {
        self.status == FormStatus::Submitting
    }

    pub fn in_flight_id(&self) -> Option<Uuid> {
        self.in_flight.as_ref().map(|f| f.submission_id)
    }

    fn edit(&mut self, apply: impl FnOnce(&mut LeadFormState)) {
        apply(&mut self.state);
        if matches!(self.status, FormStatus::Succeeded | FormStatus::Failed) {
            self.status = FormStatus::Editing;
        }
    }

    pub fn set_name(&mut self, value: String) {
        self.edit(|s| s.name = value);
    }

    pub fn set_phone(&mut self, value: String) {
        self.edit(|s| s.phone = value);
    }

    pub fn select_emirate(&mut self, value: &str) {
        let emirate = value.parse::<Emirate>().ok();
        if emirate.is_none() && !value.trim().is_empty() {
            warn!(value = %value, "Unknown emirate selected");
        }
        self.edit(|s| s.emirate = emirate);
    }

    pub fn set_symptoms(&mut self, raw: Vec<String>) {
        let mut close_menu = false;
        self.edit(|s| close_menu = s.apply_symptom_selection(raw));
        if close_menu {
            self.symptoms_menu_open = false;
        }
    }

    pub fn set_symptoms_other(&mut self, value: String) {
        self.edit(|s| s.symptoms_other = value);
    }

    pub fn set_symptoms_menu_open(&mut self, open: bool) {
        self.symptoms_menu_open = open;
    }

    /// Validates and, when valid, moves to `Submitting` and returns the
    /// payload for the submission client.
    pub fn try_begin_submit(&mut self, page_url: &str) -> SubmitAttempt {
        if self.is_submitting() {
            debug!("Submit ignored, a submission is already in flight");
            return SubmitAttempt::AlreadySubmitting;
        }

        let errors = validate(&self.state);
        if !errors.is_empty() {
            debug!(fields = ?errors.fields().collect::<Vec<_>>(), "Lead form invalid");
            self.errors = errors;
            self.status = FormStatus::Editing;
            return SubmitAttempt::Invalid;
        }

        let submission_id = Uuid::new_v4();
        self.errors.clear();
        self.response = None;
        self.status = FormStatus::Submitting;
        self.in_flight = Some(InFlight {
            submission_id,
            handoff: ThankYouNavigationState::from(&self.state),
            emirate: self.state.emirate,
        });

        SubmitAttempt::Ready {
            submission_id,
            payload: LeadPayload::from_form(&self.state, page_url),
        }
    }

    /// Applies the client's answer for `submission_id`.
    pub fn complete(&mut self, submission_id: Uuid, result: SubmissionResult) -> Completion {
        if self.in_flight_id() != Some(submission_id) {
            return Completion::Stale;
        }
        let Some(in_flight) = self.in_flight.take() else {
            return Completion::Stale;
        };

        if result.success {
            self.state = LeadFormState::default();
            self.errors.clear();
            self.symptoms_menu_open = false;
            self.status = FormStatus::Succeeded;
            self.response = Some(ResponseMessage::success());
            Completion::Accepted(in_flight)
        } else {
            self.fail();
            Completion::Rejected
        }
    }

    /// Ends the current attempt as failed, keeping the entered data.
    pub fn fail(&mut self) {
        self.in_flight = None;
        self.status = FormStatus::Failed;
        self.response = Some(ResponseMessage::failure());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn filled() -> LeadFormState {
        LeadFormState {
            name: "Ali".into(),
            phone: "+971500000000".into(),
            emirate: Some(Emirate::Dubai),
            symptoms: vec!["Fever".into()],
            symptoms_other: String::new(),
        }
    }

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn filled_form_is_valid() {
        assert!(validate(&filled()).is_empty());
    }

    #[test]
    fn blank_form_flags_every_required_field() {
        let errors = validate(&LeadFormState::default());
        let fields: Vec<_> = errors.fields().collect();
        assert_eq!(
            fields,
            vec![
                FormField::Name,
                FormField::Phone,
                FormField::Emirate,
                FormField::Symptoms
            ]
        );
        assert_eq!(errors.get(FormField::Name), Some("Name is required"));
    }

    #[test]
    fn other_without_text_is_flagged() {
        let mut state = filled();
        state.symptoms = tags(&["Fever", "Other"]);
        state.symptoms_other = "   ".into();
        let errors = validate(&state);
        assert_eq!(errors.len(), 1);
        assert!(errors.contains(FormField::SymptomsOther));

        state.symptoms_other = "rash".into();
        assert!(validate(&state).is_empty());
    }

    #[test]
    fn sentinel_closes_menu_and_is_not_stored() {
        let mut form = LeadForm::default();
        form.set_symptoms_menu_open(true);
        form.set_symptoms(tags(&["Fever", CONFIRM_SELECTION_TAG]));
        assert_eq!(form.state.symptoms, tags(&["Fever"]));
        assert!(!form.symptoms_menu_open);
    }

    #[test]
    fn selection_drops_duplicates_and_unknown_tags() {
        let mut form = LeadForm::default();
        form.set_symptoms_menu_open(true);
        form.set_symptoms(tags(&["Cough", "Fever", "Cough", "Sneezing"]));
        assert_eq!(form.state.symptoms, tags(&["Cough", "Fever"]));
        assert!(form.symptoms_menu_open);
    }

    #[test]
    fn deselecting_other_clears_free_text() {
        let mut form = LeadForm::default();
        form.set_symptoms(tags(&["Other"]));
        form.set_symptoms_other("rash".into());
        form.set_symptoms(tags(&["Fever"]));
        assert!(form.state.symptoms_other.is_empty());
    }

    #[test]
    fn emirate_parsing_accepts_labels() {
        assert_eq!("Abu Dhabi".parse::<Emirate>(), Ok(Emirate::AbuDhabi));
        assert_eq!(" sharjah ".parse::<Emirate>(), Ok(Emirate::Sharjah));
        assert!("Ajman".parse::<Emirate>().is_err());
    }

    #[test]
    fn unknown_emirate_clears_selection() {
        let mut form = LeadForm::default();
        form.select_emirate("Dubai");
        assert_eq!(form.state.emirate, Some(Emirate::Dubai));
        form.select_emirate("Ajman");
        assert_eq!(form.state.emirate, None);
    }

    #[test]
    fn symptom_lines_put_other_text_last() {
        let lines = symptom_lines(&tags(&["Other", "Fever"]), " rash ");
        assert_eq!(lines, tags(&["Fever", "Other: rash"]));
        assert_eq!(symptom_lines(&tags(&["Other"]), ""), tags(&["Other"]));
    }

    #[test]
    fn invalid_submit_records_errors_without_payload() {
        let mut form = LeadForm::default();
        assert_eq!(form.try_begin_submit("https://example.com/"), SubmitAttempt::Invalid);
        assert_eq!(form.status, FormStatus::Editing);
        assert_eq!(form.errors.len(), 4);
        assert!(form.in_flight.is_none());
    }

    #[test]
    fn second_submit_while_in_flight_is_ignored() {
        let mut form = LeadForm {
            state: filled(),
            ..LeadForm::default()
        };
        assert!(matches!(
            form.try_begin_submit("https://example.com/"),
            SubmitAttempt::Ready { .. }
        ));
        assert!(form.is_submitting());
        assert_eq!(
            form.try_begin_submit("https://example.com/"),
            SubmitAttempt::AlreadySubmitting
        );
    }

    #[test]
    fn success_resets_fields_and_keeps_submitted_symptoms() {
        let mut state = filled();
        state.symptoms = tags(&["Fever", "Other"]);
        state.symptoms_other = "rash".into();
        let mut form = LeadForm {
            state,
            ..LeadForm::default()
        };

        let SubmitAttempt::Ready { submission_id, .. } = form.try_begin_submit("https://x.ae/")
        else {
            panic!("form should be valid");
        };

        let Completion::Accepted(in_flight) =
            form.complete(submission_id, SubmissionResult { success: true })
        else {
            panic!("expected acceptance");
        };

        assert_eq!(form.state, LeadFormState::default());
        assert!(form.errors.is_empty());
        assert_eq!(form.status, FormStatus::Succeeded);
        assert!(!form.is_submitting());
        assert!(form.response.as_ref().is_some_and(|r| !r.is_error
            && r.text.contains(&ESTIMATED_RESPONSE_TIME_SEC.to_string())));
        assert_eq!(in_flight.handoff.symptoms, tags(&["Fever", "Other"]));
        assert_eq!(in_flight.handoff.symptoms_other, "rash");
    }

    #[test]
    fn rejection_keeps_fields_for_retry() {
        let mut form = LeadForm {
            state: filled(),
            ..LeadForm::default()
        };
        let SubmitAttempt::Ready { submission_id, .. } = form.try_begin_submit("https://x.ae/")
        else {
            panic!("form should be valid");
        };

        assert_eq!(
            form.complete(submission_id, SubmissionResult { success: false }),
            Completion::Rejected
        );
        assert_eq!(form.state, filled());
        assert_eq!(form.status, FormStatus::Failed);
        assert!(!form.is_submitting());
        assert_eq!(form.response, Some(ResponseMessage::failure()));

        form.set_name("Ali Hassan".into());
        assert_eq!(form.status, FormStatus::Editing);
    }

    #[test]
    fn answer_for_unknown_submission_is_stale() {
        let mut form = LeadForm {
            state: filled(),
            ..LeadForm::default()
        };
        let _ = form.try_begin_submit("https://x.ae/");
        assert_eq!(
            form.complete(Uuid::new_v4(), SubmissionResult { success: true }),
            Completion::Stale
        );
        assert!(form.is_submitting());
    }

    #[test]
    fn debug_output_redacts_contact_details() {
        let rendered = format!("{:?}", filled());
        assert!(!rendered.contains("Ali"));
        assert!(!rendered.contains("971500000000"));
    }

    proptest! {
        #[test]
        fn blank_fields_are_exactly_the_flagged_fields(
            name_blank in any::<bool>(),
            phone_blank in any::<bool>(),
            emirate_missing in any::<bool>(),
            symptoms_missing in any::<bool>(),
            padding in "[ \t]{0,3}",
        ) {
            let state = LeadFormState {
                name: if name_blank { padding.clone() } else { "Sara".into() },
                phone: if phone_blank { padding.clone() } else { "+971501234567".into() },
                emirate: if emirate_missing { None } else { Some(Emirate::Sharjah) },
                symptoms: if symptoms_missing { Vec::new() } else { vec!["Cough".into()] },
                symptoms_other: String::new(),
            };

            let errors = validate(&state);
            prop_assert_eq!(errors.contains(FormField::Name), name_blank);
            prop_assert_eq!(errors.contains(FormField::Phone), phone_blank);
            prop_assert_eq!(errors.contains(FormField::Emirate), emirate_missing);
            prop_assert_eq!(errors.contains(FormField::Symptoms), symptoms_missing);
            prop_assert!(!errors.contains(FormField::SymptomsOther));

            let any_blank = name_blank || phone_blank || emirate_missing || symptoms_missing;
            let mut form = LeadForm { state, ..LeadForm::default() };
            let attempt = form.try_begin_submit("https://example.com/");
            prop_assert_eq!(attempt == SubmitAttempt::Invalid, any_blank);
        }
    }
}
