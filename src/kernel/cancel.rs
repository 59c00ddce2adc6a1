use tokio::sync::watch;
use tracing::{debug, info};

use crate::hardware::HardwareSnapshot;

/// Interrupt signals as seen by the dialogue loop.
///
/// `stop_epoch` counts forced stops; a reader compares it with the epoch it
/// last acknowledged, so the watcher never has to clear anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterruptState {
    pub muted: bool,
    pub stop_epoch: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    Stop,
    Mute,
    Unmute,
    ToggleMute,
}

impl ButtonAction {
    /// `BTN:<ACTION>[:<anything>]`, action case-insensitive.
    pub fn parse(token: &str) -> Option<Self> {
        let mut parts = token.trim().splitn(3, ':');
        if !parts.next()?.eq_ignore_ascii_case("BTN") {
            return None;
        }
        match parts.next()?.trim().to_ascii_uppercase().as_str() {
            "STOP" => Some(ButtonAction::Stop),
            "MUTE" => Some(ButtonAction::Mute),
            "UNMUTE" => Some(ButtonAction::Unmute),
            "TOGGLE" | "TOGGLE_MUTE" => Some(ButtonAction::ToggleMute),
            _ => None,
        }
    }
}

/// Writer side. Owned by the hardware watcher, the only task that mutates
/// interrupt state.
#[derive(Debug)]
pub struct InterruptController {
    last_button: Option<String>,
    tx: watch::Sender<InterruptState>,
}

impl InterruptController {
    pub fn new() -> (Self, InterruptHandle) {
        let (tx, rx) = watch::channel(InterruptState::default());
        (
            Self {
                last_button: None,
                tx,
            },
            InterruptHandle { rx },
        )
    }

    /// Another reader of the same signals.
    pub fn handle(&self) -> InterruptHandle {
        InterruptHandle {
            rx: self.tx.subscribe(),
        }
    }

    pub fn last_button(&self) -> Option<&str> {
        self.last_button.as_deref()
    }

    /// Edge detection: a button token different from the previous check
    /// fires its action exactly once. Repeats are ignored.
    pub fn observe(&mut self, snapshot: &HardwareSnapshot) -> Option<ButtonAction> {
        let token = snapshot.last_button_event.clone();
        if token == self.last_button {
            return None;
        }
        self.last_button = token;

        let token = self.last_button.as_deref()?;
        let Some(action) = ButtonAction::parse(token) else {
            debug!("Ignoring unknown button token {:?}", token);
            return None;
        };
        self.apply(action);
        Some(action)
    }

    pub fn apply(&mut self, action: ButtonAction) {
        self.tx.send_modify(|state| match action {
            ButtonAction::Stop => state.stop_epoch += 1,
            ButtonAction::Mute => state.muted = true,
            ButtonAction::Unmute => state.muted = false,
            ButtonAction::ToggleMute => state.muted = !state.muted,
        });
        info!("Interrupt applied: {:?} -> {:?}", action, *self.tx.borrow());
    }
}

/// Reader side, handed to the dialogue loop. Read-only by construction.
#[derive(Debug, Clone)]
pub struct InterruptHandle {
    rx: watch::Receiver<InterruptState>,
}

impl InterruptHandle {
    pub fn current(&self) -> InterruptState {
        *self.rx.borrow()
    }

    pub fn is_muted(&self) -> bool {
        self.rx.borrow().muted
    }

    pub fn stop_epoch(&self) -> u64 {
        self.rx.borrow().stop_epoch
    }

    /// Resolves once `pred` holds. Pends forever if the writer is gone and the
    /// predicate never held.
    pub async fn wait_until<F>(&mut self, pred: F)
    where
        F: Fn(&InterruptState) -> bool,
    {
        loop {
            let hit = pred(&*self.rx.borrow_and_update());
            if hit {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}
