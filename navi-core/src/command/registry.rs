use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::command::CommandNode;
use super::errors::RegistryError;

/// Every registered command, reachable through any of its triggers.
#[derive(Default)]
pub struct CommandRegistry {
    nodes: Vec<Arc<CommandNode>>,
    by_trigger: HashMap<String, Arc<CommandNode>>,
}
impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a command. Fails without registering anything if one of its triggers is taken.
    pub fn register(&mut self, node: CommandNode) -> Result<(), RegistryError> {
        if let Some(taken) = node.triggers.iter().find(|t| self.by_trigger.contains_key(*t)) {
            return Err(RegistryError::DuplicateTrigger(taken.clone()));
        }

        let node = Arc::new(node);
        for trigger in &node.triggers {
            self.by_trigger.insert(trigger.clone(), node.clone());
        }
        self.nodes.push(node);

        Ok(())
    }

    /// Finds a command by its name or one of its aliases, ignoring case.
    pub fn find_command_by_name(&self, name: &str) -> Option<Arc<CommandNode>> {
        self.by_trigger.get(&name.to_lowercase()).cloned()
    }

    /// Commands in registration order.
    pub fn commands(&self) -> &[Arc<CommandNode>] {
        &self.nodes
    }

    /// Commands not marked hidden, grouped by their group name.
    pub fn visible_by_group(&self) -> BTreeMap<&str, Vec<&CommandNode>> {
        let mut groups = BTreeMap::<&str, Vec<&CommandNode>>::new();
        for node in self.nodes.iter().filter(|n| !n.is_hidden()) {
            groups.entry(node.group.as_str()).or_default().push(node);
        }
        groups
    }
}
