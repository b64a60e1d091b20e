use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::command::Command;
use crate::storage::MonitorConfig;

/// Apps the overlay must never cover: package installers, superuser
/// prompts and file-sync clients that ask for confirmation.
pub const SUSPEND_APPS: &[&str] = &[
    "com.android.packageinstaller",
    "com.google.android.packageinstaller",
    "eu.chainfire.supersu",
    "com.koushikdutta.superuser",
    "me.phh.superuser",
    "com.owncloud.android",
];

/// Identifiers of this application itself.
///
/// Opening the notification shade reports the app as foreground, and
/// closing it does not report the previous app again, so these must not
/// resume the filter.
pub const OWN_APPS: &[&str] = &["com.jmstudios.redmoon", "com.jmstudios.redmoon.debug"];

/// Identifier of the foreground process as reported by the platform.
///
/// The empty string means "unknown" and is a normal value, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(String);

impl ProcessId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn is_unknown(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProcessId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ProcessId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            f.write_str("<unknown>")
        } else {
            f.write_str(&self.0)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppClass {
    /// Must not be obscured: suspend the filter.
    SuspendTriggering,
    /// This application: leave the filter as it is.
    OwnApp,
    /// Anything else, including unknown: resume the filter.
    Other,
}

impl AppClass {
    /// Command to emit, or `None` to leave the filter alone.
    pub fn command(self) -> Option<Command> {
        match self {
            AppClass::SuspendTriggering => Some(Command::Suspend),
            AppClass::OwnApp => None,
            AppClass::Other => Some(Command::Resume),
        }
    }
}

/// Maps identifiers onto [`AppClass`]. Total: anything not listed is
/// [`AppClass::Other`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationPolicy {
    suspend: HashSet<String>,
    own: HashSet<String>,
}

impl Default for ClassificationPolicy {
    fn default() -> Self {
        Self {
            suspend: SUSPEND_APPS.iter().map(|s| s.to_string()).collect(),
            own: OWN_APPS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ClassificationPolicy {
    /// Add identifiers to the suspend set.
    ///
    /// Own-app identifiers and the empty string are skipped so the classes
    /// stay disjoint and unknown keeps resuming.
    pub fn with_extra_suspend<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for id in ids {
            let id = id.into();
            if !id.is_empty() && !self.own.contains(&id) {
                self.suspend.insert(id);
            }
        }
        self
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::default().with_extra_suspend(config.extra_suspend_apps.iter().cloned())
    }

    pub fn classify(&self, id: &ProcessId) -> AppClass {
        if self.own.contains(id.as_str()) {
            AppClass::OwnApp
        } else if self.suspend.contains(id.as_str()) {
            AppClass::SuspendTriggering
        } else {
            AppClass::Other
        }
    }
}

/// Classify with the built-in policy.
pub fn classify(id: &ProcessId) -> AppClass {
    ClassificationPolicy::default().classify(id)
}
