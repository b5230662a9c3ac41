//! In-memory collection of named commands.

use crate::command::Command;
use crate::error::{Error, Result};

/// Named commands kept for reuse, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct CommandLibrary {
    commands: Vec<Command>,
}

impl CommandLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a named command under its trimmed name.
    /// Unnamed commands and duplicate names are rejected.
    pub fn add(&mut self, mut command: Command) -> Result<()> {
        let name = command
            .name()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .ok_or_else(|| Error::Format("a saved command needs a name".to_string()))?;
        if self.get(&name).is_some() {
            return Err(Error::Format(format!("a command named '{}' already exists", name)));
        }
        command.set_name(name);
        self.commands.push(command);
        Ok(())
    }

    /// Looks a command up by exact name.
    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.name() == Some(name))
    }

    pub fn get_index(&self, index: usize) -> Option<&Command> {
        self.commands.get(index)
    }

    pub fn remove(&mut self, name: &str) -> Option<Command> {
        let pos = self.commands.iter().position(|c| c.name() == Some(name))?;
        Some(self.commands.remove(pos))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.commands.iter().filter_map(Command::name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> + '_ {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
