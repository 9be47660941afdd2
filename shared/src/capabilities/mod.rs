mod analytics;
mod navigation;
mod timer;

pub use self::analytics::{Analytics, AnalyticsEvent, AnalyticsOperation};
pub use self::navigation::{Navigation, NavigationOperation};
pub use self::timer::{Timer, TimerId, TimerOperation, TimerOutput};

// Crux's built-in Render and Http are used directly; the rest are thin
// request/notify wrappers implemented here.
pub use crux_core::render::Render;
pub use crux_http::Http;

use crate::event::Event;

#[derive(crux_core::macros::Effect)]
#[effect(app = "crate::app::App")]
pub struct Capabilities {
    pub http: Http<Event>,
    pub render: Render<Event>,
    pub timer: Timer<Event>,
    pub navigation: Navigation<Event>,
    pub analytics: Analytics<Event>,
}
