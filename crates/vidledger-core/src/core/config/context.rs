use crate::config::{EnvSnapshot, Settings};
use crate::CommandGroup;

#[derive(Clone, Copy, Debug)]
pub struct CommandInfo {
    pub group: CommandGroup,
    pub name: &'static str,
}

impl CommandInfo {
    #[must_use]
    pub const fn new(group: CommandGroup, name: &'static str) -> Self {
        Self { group, name }
    }
}

pub struct CommandContext {
    settings: Settings,
}

impl CommandContext {
    /// Captures the process environment once and derives the settings from it.
    #[must_use]
    pub fn new() -> Self {
        Self::from_snapshot(&EnvSnapshot::capture())
    }

    #[must_use]
    pub fn from_snapshot(env: &EnvSnapshot) -> Self {
        Self {
            settings: Settings::from_snapshot(env),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

impl Default for CommandContext {
    fn default() -> Self {
        Self::new()
    }
}
