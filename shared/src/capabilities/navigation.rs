use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

use crate::thank_you::ThankYouNavigationState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum NavigationOperation {
    /// In-app route change. `state` is a one-shot payload for the target
    /// route; it is not part of the address and does not survive a reload.
    Push {
        path: String,
        state: Option<ThankYouNavigationState>,
    },
    /// Full-page navigation away from the site.
    Redirect { url: String },
    ScrollToTop,
}

impl Operation for NavigationOperation {
    type Output = ();
}

pub struct Navigation<E> {
    context: CapabilityContext<NavigationOperation, E>,
}

impl<Ev> Capability<Ev> for Navigation<Ev> {
    type Operation = NavigationOperation;
    type MappedSelf<MappedEv> = Navigation<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Navigation::new(self.context.map_event(f))
    }
}

impl<E> Navigation<E>
where
    E: Send + 'static,
{
    pub fn new(context: CapabilityContext<NavigationOperation, E>) -> Self {
        Self { context }
    }

    pub fn push(&self, path: impl Into<String>, state: Option<ThankYouNavigationState>) {
        self.notify(NavigationOperation::Push {
            path: path.into(),
            state,
        });
    }

    pub fn redirect(&self, url: impl Into<String>) {
        self.notify(NavigationOperation::Redirect { url: url.into() });
    }

    pub fn scroll_to_top(&self) {
        self.notify(NavigationOperation::ScrollToTop);
    }

    fn notify(&self, operation: NavigationOperation) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(operation).await;
        });
    }
}
