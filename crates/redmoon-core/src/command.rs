use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;

/// A request for the filter service.
///
/// Commands are fire-and-forget: the sink consumes each one once and
/// nothing is returned to the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Suspend,
    Resume,
    TurnOn,
    TurnOff,
}

impl Command {
    pub fn as_str(self) -> &'static str {
        match self {
            Command::Suspend => "suspend",
            Command::Resume => "resume",
            Command::TurnOn => "turn_on",
            Command::TurnOff => "turn_off",
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives suspend/resume commands from the foreground monitor.
///
/// Implementations must tolerate being called from a background task.
pub trait CommandSink: Send + Sync {
    fn send(&self, command: Command);
}

impl CommandSink for mpsc::UnboundedSender<Command> {
    fn send(&self, command: Command) {
        if mpsc::UnboundedSender::send(self, command).is_err() {
            warn!(%command, "command receiver dropped");
        }
    }
}

/// Turns the filter on or off in response to an alarm.
///
/// `command` is always [`Command::TurnOn`] or [`Command::TurnOff`].
pub trait FilterService: Send + Sync {
    /// Switch immediately.
    fn toggle(&self, command: Command);

    /// Switch with a gradual transition (location-based schedules).
    fn fade(&self, command: Command);
}

/// Asks the location service for a fresh fix after an alarm fires.
pub trait LocationUpdater: Send + Sync {
    fn update(&self, foreground: bool);
}

/// A location updater for builds without location support.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLocation;

impl LocationUpdater for NoLocation {
    fn update(&self, _foreground: bool) {}
}
