use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::capabilities::TimerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityAction {
    Open,
    Close,
    Toggle,
}

/// A single open/closed flag. Opening an open flag (or closing a closed one)
/// changes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Visibility {
    open: bool,
}

impl Visibility {
    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    pub fn is_open(self) -> bool {
        self.open
    }

    /// Applies `action` and reports whether the flag changed.
    pub fn apply(&mut self, action: VisibilityAction) -> bool {
        let before = self.open;
        match action {
            VisibilityAction::Open => self.open(),
            VisibilityAction::Close => self.close(),
            VisibilityAction::Toggle => self.toggle(),
        }
        before != self.open
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VisibilityController {
    pub popup_form: Visibility,
    pub chatbot: Visibility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintStep {
    Idle,
    Schedule(Duration),
}

/// "We're online" bubble next to the floating button, shown periodically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OnlineHint {
    running: bool,
    visible: bool,
    timer: Option<TimerId>,
}

impl OnlineHint {
    pub fn start(&mut self, interval: Duration) -> HintStep {
        if self.running {
            return HintStep::Idle;
        }
        self.running = true;
        self.visible = false;
        HintStep::Schedule(interval)
    }

    /// Stops the loop and hands back the timer the owner must cancel.
    pub fn stop(&mut self) -> Option<TimerId> {
        self.running = false;
        self.visible = false;
        self.timer.take()
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn on_timer(
        &mut self,
        popup_open: bool,
        interval: Duration,
        visible_for: Duration,
    ) -> HintStep {
        self.timer = None;
        if !self.running {
            return HintStep::Idle;
        }

        if self.visible {
            self.visible = false;
            HintStep::Schedule(interval)
        } else if popup_open {
            HintStep::Schedule(interval)
        } else {
            self.visible = true;
            HintStep::Schedule(visible_for)
        }
    }

    pub fn set_timer(&mut self, id: TimerId) {
        self.timer = Some(id);
    }

    pub fn owns_timer(&self, id: TimerId) -> bool {
        self.timer == Some(id)
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_secs(20);
    const VISIBLE: Duration = Duration::from_secs(6);

    #[test]
    fn open_and_close_are_idempotent() {
        let mut flag = Visibility::default();
        assert!(flag.apply(VisibilityAction::Open));
        assert!(!flag.apply(VisibilityAction::Open));
        assert!(flag.is_open());
        assert!(flag.apply(VisibilityAction::Close));
        assert!(!flag.apply(VisibilityAction::Close));
        assert!(!flag.is_open());
    }

    #[test]
    fn toggle_flips() {
        let mut flag = Visibility::default();
        flag.toggle();
        assert!(flag.is_open());
        flag.toggle();
        assert!(!flag.is_open());
    }

    #[test]
    fn controller_flags_are_independent() {
        let mut controller = VisibilityController::default();
        controller.popup_form.open();
        assert!(controller.popup_form.is_open());
        assert!(!controller.chatbot.is_open());
    }

    #[test]
    fn hint_alternates_between_hidden_and_shown() {
        let mut hint = OnlineHint::default();
        assert_eq!(hint.start(INTERVAL), HintStep::Schedule(INTERVAL));
        assert_eq!(hint.start(INTERVAL), HintStep::Idle);

        assert_eq!(hint.on_timer(false, INTERVAL, VISIBLE), HintStep::Schedule(VISIBLE));
        assert!(hint.is_visible());
        assert_eq!(hint.on_timer(false, INTERVAL, VISIBLE), HintStep::Schedule(INTERVAL));
        assert!(!hint.is_visible());
    }

    #[test]
    fn hint_stays_hidden_while_popup_is_open() {
        let mut hint = OnlineHint::default();
        hint.start(INTERVAL);
        assert_eq!(hint.on_timer(true, INTERVAL, VISIBLE), HintStep::Schedule(INTERVAL));
        assert!(!hint.is_visible());
    }

    #[test]
    fn stopped_hint_ignores_timers() {
        let mut hint = OnlineHint::default();
        hint.start(INTERVAL);
        hint.set_timer(TimerId(1));
        assert_eq!(hint.stop(), Some(TimerId(1)));
        assert_eq!(hint.on_timer(false, INTERVAL, VISIBLE), HintStep::Idle);
        assert!(!hint.is_visible());
    }
}
