use std::time::Duration;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::capabilities::{AnalyticsEvent, Capabilities, TimerId, TimerOutput};
use crate::event::Event;
use crate::form::{Completion, Emirate, LeadForm, SubmitAttempt, SYMPTOM_OPTIONS};
use crate::lead_client::{self, SubmissionResult};
use crate::model::{
    Handoff, Model, PopupFormView, Route, ThankYouView, ToastKind, ToastMessage, ToastView,
    ViewModel,
};
use crate::thank_you::{RedirectSequencer, SequencerStep, ThankYouNavigationState};
use crate::visibility::{HintStep, VisibilityAction};
use crate::{
    COUNTDOWN_TICK, ESTIMATED_RESPONSE_TIME_SEC, GENERIC_FAILURE_MESSAGE, HANDOFF_DELAY,
    REDIRECT_GRACE, THANK_YOU_PATH,
};

const SUCCESS_TOAST: &str = "Your form has been submitted successfully.";

#[derive(Default)]
pub struct App;

impl App {
    fn schedule(model: &mut Model, caps: &Capabilities, after: Duration) -> TimerId {
        let id = model.allocate_timer_id();
        caps.timer.start(id, after, |output| match output {
            TimerOutput::Fired { id } => Event::TimerFired { id },
            TimerOutput::Cancelled { .. } => Event::Noop,
        });
        id
    }

    fn start_hint(model: &mut Model, caps: &Capabilities) {
        let interval = Duration::from_millis(model.config.hint_interval_ms);
        if let HintStep::Schedule(after) = model.hint.start(interval) {
            let id = Self::schedule(model, caps, after);
            model.hint.set_timer(id);
        }
    }

    fn stop_hint(model: &mut Model, caps: &Capabilities) {
        if let Some(id) = model.hint.stop() {
            caps.timer.cancel(id);
        }
    }

    fn advance_hint(model: &mut Model, caps: &Capabilities) {
        let step = model.hint.on_timer(
            model.visibility.popup_form.is_open(),
            Duration::from_millis(model.config.hint_interval_ms),
            Duration::from_millis(model.config.hint_visible_ms),
        );
        if let HintStep::Schedule(after) = step {
            let id = Self::schedule(model, caps, after);
            model.hint.set_timer(id);
        }
    }

    /// Opens or closes the popup. Every opening mounts a fresh form and every
    /// closing discards the current one.
    fn apply_popup(model: &mut Model, action: VisibilityAction) {
        if !model.visibility.popup_form.apply(action) {
            return;
        }

        if model.visibility.popup_form.is_open() {
            model.hint.hide();
        } else if model.form.is_submitting() {
            info!("Popup closed during submission, its result will be dropped");
        }
        model.form = LeadForm::default();
    }

    fn submit(model: &mut Model, caps: &Capabilities, page_url: &str) {
        let SubmitAttempt::Ready {
            submission_id,
            payload,
        } = model.form.try_begin_submit(page_url)
        else {
            return;
        };

        let sent = lead_client::submit(
            &caps.http,
            &model.config.lead_endpoint,
            &payload,
            move |result| Event::SubmissionCompleted {
                submission_id,
                result,
            },
        );

        if let Err(e) = sent {
            error!(error = %e, %submission_id, "Lead could not be sent");
            model.form.fail();
            model.toast = Some(ToastMessage::new(GENERIC_FAILURE_MESSAGE, ToastKind::Error));
        }
    }

    fn complete_submission(
        model: &mut Model,
        caps: &Capabilities,
        submission_id: Uuid,
        result: SubmissionResult,
    ) {
        match model.form.complete(submission_id, result) {
            // The form is gone but the lead may still have been stored.
            Completion::Stale if result.success => {
                info!(%submission_id, "Lead submitted from a discarded form");
                model.toast = Some(ToastMessage::new(SUCCESS_TOAST, ToastKind::Success));
            }
            Completion::Stale => {
                info!(%submission_id, "Dropping result for a discarded form");
            }
            Completion::Rejected => {
                warn!(%submission_id, "Lead submission failed");
                model.toast = Some(ToastMessage::new(GENERIC_FAILURE_MESSAGE, ToastKind::Error));
            }
            Completion::Accepted(in_flight) => {
                info!(%submission_id, "Lead submitted");
                model.toast = Some(ToastMessage::new(SUCCESS_TOAST, ToastKind::Success));

                caps.analytics.push(AnalyticsEvent {
                    event: AnalyticsEvent::LEAD_SUBMITTED.to_string(),
                    event_id: submission_id.to_string(),
                    form: "popup".to_string(),
                    emirate: in_flight.emirate.map(|e| e.label().to_string()),
                    symptom_count: in_flight.handoff.symptoms.len(),
                });

                Self::schedule_handoff(model, caps, in_flight.handoff);
            }
        }
    }

    fn schedule_handoff(model: &mut Model, caps: &Capabilities, state: ThankYouNavigationState) {
        if let Some(previous) = model.handoff.take() {
            caps.timer.cancel(previous.timer);
        }
        let timer = Self::schedule(model, caps, HANDOFF_DELAY);
        model.handoff = Some(Handoff { timer, state });
    }

    fn run_handoff(model: &mut Model, caps: &Capabilities, handoff: Handoff) {
        info!("Handing off to the thank-you page");
        caps.navigation.push(THANK_YOU_PATH, Some(handoff.state.clone()));
        Self::enter_route(model, caps, Route::ThankYou, Some(handoff.state));
        Self::apply_popup(model, VisibilityAction::Close);
    }

    fn enter_route(
        model: &mut Model,
        caps: &Capabilities,
        route: Route,
        state: Option<ThankYouNavigationState>,
    ) {
        if route == model.route && state.is_none() {
            return;
        }

        if let Some(mut page) = model.thank_you.take() {
            if let Some(id) = page.take_timer() {
                caps.timer.cancel(id);
            }
        }

        debug!(from = model.route.path(), to = route.path(), "Route change");
        model.route = route;

        if model.route == Route::ThankYou {
            Self::stop_hint(model, caps);
            caps.navigation.scroll_to_top();

            let (page, step) = RedirectSequencer::arrive(
                state,
                model.config.countdown_start,
                &model.config.messaging_base_url,
            );
            model.thank_you = Some(page);
            Self::apply_sequencer_step(model, caps, step);
        } else {
            Self::start_hint(model, caps);
        }
    }

    fn apply_sequencer_step(model: &mut Model, caps: &Capabilities, step: SequencerStep) {
        let after = match step {
            SequencerStep::Idle => return,
            SequencerStep::ScheduleTick => COUNTDOWN_TICK,
            SequencerStep::ScheduleRedirect => REDIRECT_GRACE,
            SequencerStep::Redirect(url) => {
                info!("Redirecting to the messaging channel");
                caps.navigation.redirect(url);
                return;
            }
        };

        let id = Self::schedule(model, caps, after);
        if let Some(page) = model.thank_you.as_mut() {
            page.set_timer(id);
        }
    }

    fn on_timer(model: &mut Model, caps: &Capabilities, id: TimerId) {
        if model.handoff.as_ref().is_some_and(|h| h.timer == id) {
            if let Some(handoff) = model.handoff.take() {
                Self::run_handoff(model, caps, handoff);
            }
        } else if model.hint.owns_timer(id) {
            Self::advance_hint(model, caps);
        } else if let Some(page) = model.thank_you.as_mut().filter(|p| p.owns_timer(id)) {
            let step = page.on_timer();
            Self::apply_sequencer_step(model, caps, step);
        } else {
            debug!(timer = %id, "Ignoring stale timer");
        }
    }

    fn popup_form_view(form: &LeadForm) -> PopupFormView {
        let state = &form.state;
        PopupFormView {
            intro: format!(
                "Fill in your details and our medical team will contact you within {ESTIMATED_RESPONSE_TIME_SEC} seconds. Available 24/7."
            ),
            name: state.name.clone(),
            phone: state.phone.clone(),
            emirate: state.emirate.map(|e| e.label().to_string()),
            emirate_options: Emirate::ALL.iter().map(|e| e.label().to_string()).collect(),
            symptom_options: SYMPTOM_OPTIONS.iter().map(|s| (*s).to_string()).collect(),
            symptoms: state.symptoms.clone(),
            symptoms_menu_open: form.symptoms_menu_open,
            show_symptoms_other: state.has_other(),
            symptoms_other: state.symptoms_other.clone(),
            errors: form
                .errors
                .iter()
                .map(|(field, message)| (field.as_str().to_string(), message.to_string()))
                .collect(),
            submit_label: if form.is_submitting() {
                "Sending...".to_string()
            } else {
                "Submit & Get a Call Back".to_string()
            },
            submit_enabled: !form.is_submitting(),
            response: form.response.clone(),
        }
    }

    fn thank_you_view(page: Option<&RedirectSequencer>) -> ThankYouView {
        let redirecting = page.is_some_and(RedirectSequencer::from_submission);
        let countdown = page.map_or(0, RedirectSequencer::countdown);
        ThankYouView {
            title: "Thank You".to_string(),
            description: "We'll get back to you soon.".to_string(),
            redirecting,
            countdown,
            messaging_link: page.and_then(|p| p.link().map(str::to_string)),
            show_open_link: redirecting && countdown == 0,
            open_link_label: "Open WhatsApp".to_string(),
        }
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        debug!(
            event = event.name(),
            user_initiated = event.is_user_initiated(),
            "Handling event"
        );

        let form_event = matches!(
            event,
            Event::NameChanged { .. }
                | Event::PhoneChanged { .. }
                | Event::EmirateSelected { .. }
                | Event::SymptomsChanged { .. }
                | Event::SymptomsMenuToggled { .. }
                | Event::SymptomsOtherChanged { .. }
                | Event::SubmitRequested { .. }
        );
        if form_event && !model.visibility.popup_form.is_open() {
            debug!(event = event.name(), "Form event while the popup is closed");
            return;
        }

        match event {
            Event::Noop => return,

            Event::AppStarted { config } => {
                if let Some(config) = config {
                    match config.validate() {
                        Ok(()) => model.config = *config,
                        Err(e) => warn!(error = %e, "Invalid site configuration, keeping defaults"),
                    }
                }
                if model.route != Route::ThankYou {
                    Self::start_hint(model, caps);
                }
            }

            Event::RouteEntered { path } => {
                Self::enter_route(model, caps, Route::from_path(&path), None);
            }

            Event::PopupForm(action) => Self::apply_popup(model, action),

            Event::Chatbot(action) => {
                model.visibility.chatbot.apply(action);
            }

            Event::NameChanged { value } => model.form.set_name(value),
            Event::PhoneChanged { value } => model.form.set_phone(value),
            Event::EmirateSelected { value } => model.form.select_emirate(&value),
            Event::SymptomsChanged { selected } => model.form.set_symptoms(selected),
            Event::SymptomsMenuToggled { open } => model.form.set_symptoms_menu_open(open),
            Event::SymptomsOtherChanged { value } => model.form.set_symptoms_other(value),

            Event::SubmitRequested { page_url } => Self::submit(model, caps, &page_url),

            Event::SubmissionCompleted {
                submission_id,
                result,
            } => Self::complete_submission(model, caps, submission_id, result),

            Event::TimerFired { id } => Self::on_timer(model, caps, id),

            Event::DismissToast => model.toast = None,
        }

        caps.render.render();
    }

    fn view(&self, model: &Model) -> ViewModel {
        let on_thank_you = model.route == Route::ThankYou;
        let popup_open = model.visibility.popup_form.is_open();

        ViewModel {
            route: model.route.path().to_string(),
            show_floating_button: !on_thank_you,
            online_hint_visible: !on_thank_you && !popup_open && model.hint.is_visible(),
            chatbot_open: model.visibility.chatbot.is_open(),
            popup_form: popup_open.then(|| Self::popup_form_view(&model.form)),
            thank_you: on_thank_you.then(|| Self::thank_you_view(model.thank_you.as_ref())),
            toast: model.toast.as_ref().map(ToastView::from),
        }
    }
}
