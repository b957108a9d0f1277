use std::{fmt, sync::Arc};

use shared::error::{CoreError, CoreResult};
use tracing::debug;

pub const IDLE: &str = "IDLE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Any,
    States(Vec<String>),
}

impl Source {
    pub fn matches(&self, state: &str) -> bool {
        match self {
            Source::Any => true,
            Source::States(states) => states.iter().any(|s| s == state),
        }
    }

    fn overlaps(&self, other: &Source) -> bool {
        match (self, other) {
            (Source::Any, _) | (_, Source::Any) => true,
            (Source::States(a), Source::States(b)) => a.iter().any(|s| b.contains(s)),
        }
    }

    fn describe(&self) -> String {
        match self {
            Source::Any => "*".to_string(),
            Source::States(states) => states.join("|"),
        }
    }
}

impl From<&str> for Source {
    fn from(value: &str) -> Self {
        if value == "*" {
            Source::Any
        } else {
            Source::States(vec![value.to_string()])
        }
    }
}

impl From<String> for Source {
    fn from(value: String) -> Self {
        Source::from(value.as_str())
    }
}

impl From<Vec<String>> for Source {
    fn from(value: Vec<String>) -> Self {
        Source::States(value)
    }
}

type Resolver = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Destination of a transition. A computed target sees the current state and
/// may return `None` to refuse the transition.
#[derive(Clone)]
pub enum Target {
    State(String),
    Computed(Resolver),
}

impl Target {
    pub fn computed(resolve: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Target::Computed(Arc::new(resolve))
    }

    fn resolve(&self, current: &str) -> Option<String> {
        match self {
            Target::State(state) => Some(state.clone()),
            Target::Computed(resolve) => resolve(current),
        }
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::State(state) => f.debug_tuple("State").field(state).finish(),
            Target::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl From<&str> for Target {
    fn from(value: &str) -> Self {
        Target::State(value.to_string())
    }
}

impl From<String> for Target {
    fn from(value: String) -> Self {
        Target::State(value)
    }
}

#[derive(Debug, Clone)]
pub struct TransitionDef {
    pub event: String,
    pub from: Source,
    pub to: Target,
    pub owner: Option<String>,
}

impl TransitionDef {
    pub fn new(event: impl Into<String>, from: impl Into<Source>, to: impl Into<Target>) -> Self {
        Self {
            event: event.into(),
            from: from.into(),
            to: to.into(),
            owner: None,
        }
    }

    pub fn owned_by(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired {
    pub event: String,
    pub from: String,
    pub to: String,
    pub owner: Option<String>,
}

impl Fired {
    pub fn is_owned_by(&self, owner: &str) -> bool {
        self.owner.as_deref() == Some(owner)
    }
}

#[derive(Debug, Clone)]
pub struct StateMachineBuilder {
    init: String,
    transitions: Vec<TransitionDef>,
}

impl StateMachineBuilder {
    pub fn new(init: impl Into<String>) -> Self {
        Self {
            init: init.into(),
            transitions: Vec::new(),
        }
    }

    pub fn init_state(&self) -> &str {
        &self.init
    }

    pub fn transition(&mut self, def: TransitionDef) -> CoreResult<&mut Self> {
        if let Some(existing) = self
            .transitions
            .iter()
            .find(|t| t.event == def.event && t.from.overlaps(&def.from))
        {
            return Err(CoreError::DuplicateTransition {
                event: def.event,
                from: existing.from.describe(),
            });
        }
        self.transitions.push(def);
        Ok(self)
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    pub fn build(self) -> CoreResult<StateMachine> {
        if self.transitions.is_empty() {
            return Err(CoreError::EmptyStateMachine);
        }
        Ok(StateMachine {
            state: self.init.clone(),
            init: self.init,
            table: self.transitions.into(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct StateMachine {
    state: String,
    init: String,
    table: Arc<[TransitionDef]>,
}

impl StateMachine {
    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn init_state(&self) -> &str {
        &self.init
    }

    pub fn is(&self, state: &str) -> bool {
        self.state == state
    }

    pub fn index(&self) -> Option<usize> {
        self.state.parse().ok()
    }

    pub fn can(&self, event: &str) -> bool {
        self.lookup(event)
            .and_then(|def| def.to.resolve(&self.state))
            .is_some()
    }

    pub fn available(&self) -> Vec<&str> {
        self.table
            .iter()
            .filter(|def| def.from.matches(&self.state) && def.to.resolve(&self.state).is_some())
            .map(|def| def.event.as_str())
            .collect()
    }

    pub fn fire(&mut self, event: &str) -> CoreResult<Fired> {
        let Some(def) = self.lookup(event) else {
            debug!(event, state = %self.state, "fsm: no transition for event");
            return Err(CoreError::rejected(event, self.state.clone()));
        };
        let Some(to) = def.to.resolve(&self.state) else {
            debug!(event, state = %self.state, "fsm: target refused transition");
            return Err(CoreError::rejected(event, self.state.clone()));
        };
        let owner = def.owner.clone();
        let from = std::mem::replace(&mut self.state, to.clone());
        Ok(Fired {
            event: event.to_string(),
            from,
            to,
            owner,
        })
    }

    fn lookup(&self, event: &str) -> Option<&TransitionDef> {
        self.table
            .iter()
            .find(|def| def.event == event && def.from.matches(&self.state))
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
