use std::collections::BTreeMap;

use shared::domain::ButtonEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binding {
    Activate,
    Deactivate,
    Toggle,
    OpenFingers,
    CloseFingers,
    ArmGraspToggle,
    CompleteGraspToggle,
}

#[derive(Debug, Clone, Default)]
pub struct ButtonBindings {
    table: BTreeMap<(ButtonEvent, String), Binding>,
}

impl ButtonBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, event: ButtonEvent, owner: &str, binding: Binding) -> Option<Binding> {
        self.table.insert((event, owner.to_string()), binding)
    }

    pub fn remove(&mut self, event: ButtonEvent, owner: &str) -> Option<Binding> {
        self.table.remove(&(event, owner.to_string()))
    }

    pub fn remove_owner(&mut self, owner: &str) -> usize {
        let before = self.table.len();
        self.table.retain(|(_, registered), _| registered != owner);
        before - self.table.len()
    }

    pub fn get(&self, event: ButtonEvent, owner: &str) -> Option<Binding> {
        self.table.get(&(event, owner.to_string())).copied()
    }

    pub fn handlers(&self, event: ButtonEvent) -> Vec<(String, Binding)> {
        self.table
            .iter()
            .filter(|((registered, _), _)| *registered == event)
            .map(|((_, owner), binding)| (owner.clone(), *binding))
            .collect()
    }

    pub fn owned_by(&self, owner: &str) -> Vec<(ButtonEvent, Binding)> {
        self.table
            .iter()
            .filter(|((_, registered), _)| registered == owner)
            .map(|((event, _), binding)| (*event, *binding))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
