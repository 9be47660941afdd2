//! Lead submission client.
//!
//! Callers see a two-valued [`SubmissionResult`]; the spreadsheet transport
//! stays behind [`submit`]. Only client-side failures that prevent a request
//! from being sent at all come back as [`LeadClientError`].

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::capabilities::Http;
use crate::config::{ConfigError, ValidatedUrl};
use crate::form::{symptom_lines, LeadFormState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub success: bool,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LeadClientError {
    #[error("lead endpoint is not configured")]
    EndpointNotConfigured,

    #[error("lead endpoint is invalid: {0}")]
    InvalidEndpoint(#[from] ConfigError),

    #[error("failed to serialize lead payload: {0}")]
    Serialization(String),
}

/// Normalised lead as written to the sheet.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadPayload {
    pub name: String,
    pub phone: String,
    pub emirates: String,
    /// One symptom per line.
    pub symptoms: String,
    pub page_url: String,
}

impl std::fmt::Debug for LeadPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeadPayload")
            .field("emirates", &self.emirates)
            .field("symptoms", &self.symptoms)
            .field("page_url", &self.page_url)
            .finish_non_exhaustive()
    }
}

impl LeadPayload {
    pub fn from_form(state: &LeadFormState, page_url: &str) -> Self {
        Self {
            name: state.name.trim().to_string(),
            phone: state.phone.clone(),
            emirates: state.emirate.map(|e| e.label().to_string()).unwrap_or_default(),
            symptoms: symptom_lines(&state.symptoms, &state.symptoms_other).join("\n"),
            page_url: page_url.to_string(),
        }
    }
}

/// Reply body of the sheet script. Older deployments answer
/// `{"result":"success"}`, newer ones `{"success":true}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetReply {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub result: Option<String>,
}

impl SheetReply {
    pub fn accepted(&self) -> bool {
        self.success == Some(true)
            || self
                .result
                .as_deref()
                .is_some_and(|r| r.eq_ignore_ascii_case("success"))
    }
}

pub fn classify_response(
    result: crux_http::Result<crux_http::Response<SheetReply>>,
) -> SubmissionResult {
    match result {
        Ok(mut response) => {
            let status = response.status();
            let accepted = response.take_body().is_some_and(|reply| reply.accepted());
            if !status.is_success() || !accepted {
                warn!(status = %status, accepted, "Lead rejected by sheet endpoint");
            }
            SubmissionResult {
                success: status.is_success() && accepted,
            }
        }
        Err(e) => {
            warn!(error = %e, "Lead submission transport failure");
            SubmissionResult { success: false }
        }
    }
}

/// Posts `payload` to `endpoint`; `on_done` receives the outcome.
///
/// # Errors
///
/// Returns an error, without sending anything, when the endpoint is missing
/// or malformed or the payload cannot be encoded.
#[instrument(skip(http, payload, on_done))]
pub fn submit<Ev, F>(
    http: &Http<Ev>,
    endpoint: &str,
    payload: &LeadPayload,
    on_done: F,
) -> Result<(), LeadClientError>
where
    Ev: Send + 'static,
    F: FnOnce(SubmissionResult) -> Ev + Send + 'static,
{
    if endpoint.trim().is_empty() {
        return Err(LeadClientError::EndpointNotConfigured);
    }
    let endpoint = ValidatedUrl::new(endpoint)?;

    let request = http
        .post(endpoint.as_str())
        .body_json(payload)
        .map_err(|e| LeadClientError::Serialization(e.to_string()))?;

    info!(host = %endpoint.host(), "Submitting lead");

    request
        .expect_json::<SheetReply>()
        .send(move |result| on_done(classify_response(result)));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::Emirate;

    fn state(symptoms: &[&str], other: &str) -> LeadFormState {
        LeadFormState {
            name: "  Ali ".into(),
            phone: "+971500000000".into(),
            emirate: Some(Emirate::Dubai),
            symptoms: symptoms.iter().map(|s| (*s).to_string()).collect(),
            symptoms_other: other.into(),
        }
    }

    #[test]
    fn payload_joins_symptoms_with_other_text() {
        let payload = LeadPayload::from_form(&state(&["Fever", "Other"], "rash"), "https://x.ae/");
        assert_eq!(payload.symptoms, "Fever\nOther: rash");
    }

    #[test]
    fn payload_trims_name_and_keeps_phone() {
        let payload = LeadPayload::from_form(&state(&["Cough"], ""), "https://x.ae/landing");
        assert_eq!(payload.name, "Ali");
        assert_eq!(payload.phone, "+971500000000");
        assert_eq!(payload.emirates, "Dubai");
        assert_eq!(payload.page_url, "https://x.ae/landing");
    }

    #[test]
    fn payload_wire_names_are_camel_case() {
        let payload = LeadPayload::from_form(&state(&["Cough"], ""), "https://x.ae/");
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["pageUrl"], "https://x.ae/");
        assert_eq!(json["emirates"], "Dubai");
        assert_eq!(json["symptoms"], "Cough");
    }

    #[test]
    fn payload_debug_hides_contact_details() {
        let payload = LeadPayload::from_form(&state(&["Cough"], ""), "https://x.ae/");
        let rendered = format!("{payload:?}");
        assert!(!rendered.contains("Ali"));
        assert!(!rendered.contains("+971"));
    }

    #[test]
    fn sheet_reply_acceptance() {
        let ok: SheetReply = serde_json::from_str(r#"{"result":"success"}"#).unwrap();
        assert!(ok.accepted());
        let ok: SheetReply = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(ok.accepted());
        let rejected: SheetReply = serde_json::from_str(r#"{"result":"error"}"#).unwrap();
        assert!(!rejected.accepted());
        assert!(!SheetReply::default().accepted());
    }
}
