//! Best-effort analytics push.
//!
//! The shell appends each event to its data layer (or drops it when no
//! listener is installed). Nothing is awaited, so a missing listener never
//! affects the app.

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub event: String,
    pub event_id: String,
    pub form: String,
    pub emirate: Option<String>,
    pub symptom_count: usize,
}

impl AnalyticsEvent {
    pub const LEAD_SUBMITTED: &'static str = "lead_form_submit";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "data", rename_all = "snake_case")]
pub enum AnalyticsOperation {
    Push(AnalyticsEvent),
}

impl Operation for AnalyticsOperation {
    type Output = ();
}

pub struct Analytics<E> {
    context: CapabilityContext<AnalyticsOperation, E>,
}

impl<Ev> Capability<Ev> for Analytics<Ev> {
    type Operation = AnalyticsOperation;
    type MappedSelf<MappedEv> = Analytics<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Analytics::new(self.context.map_event(f))
    }
}

impl<E> Analytics<E>
where
    E: Send + 'static,
{
    pub fn new(context: CapabilityContext<AnalyticsOperation, E>) -> Self {
        Self { context }
    }

    pub fn push(&self, event: AnalyticsEvent) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(AnalyticsOperation::Push(event)).await;
        });
    }
}
