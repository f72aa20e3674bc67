// SPDX-License-Identifier: MIT

//! Reference machine used by the test suite and the demo binary: a
//! single-owner todo list (spec §8, scenario 1 "Owner-only writes").

use ak_core::{Caller, Event, Snapshot};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::MachineError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: String,
    pub text: String,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoPublic {
    pub owner_id: String,
    pub todos: Vec<TodoItem>,
}

/// Per-caller private scratch space: an in-progress draft only the
/// drafting caller can see. Exercises the projection privacy invariant
/// (spec §4.3/§8) alongside the public todo list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TodoPrivate {
    #[serde(default)]
    pub draft: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TodoState {
    Ready,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TodoInput {}

pub type TodoSnapshot = Snapshot<TodoPublic, TodoPrivate, TodoState>;

/// A single-owner todo list. Only `owner_id` may mutate `todos`; other
/// callers' events are silently rejected by the guard in [`TodoMachine::send`].
pub struct TodoMachine {
    public: TodoPublic,
    private: std::collections::HashMap<String, TodoPrivate>,
}

impl crate::Machine for TodoMachine {
    type Public = TodoPublic;
    type Private = TodoPrivate;
    type Value = TodoState;
    type Input = TodoInput;

    fn start(initial_caller: Caller, _input: Self::Input) -> Self {
        TodoMachine {
            public: TodoPublic { owner_id: initial_caller.id, todos: Vec::new() },
            private: std::collections::HashMap::new(),
        }
    }

    fn restore(snapshot: TodoSnapshot, _initial_caller: Caller, _input: Self::Input) -> Self {
        TodoMachine { public: snapshot.context.public, private: snapshot.context.private }
    }

    fn send(&mut self, event: &Event) -> Result<(), MachineError> {
        match event.event_type.as_str() {
            "ADD_TODO" => {
                if event.caller.id != self.public.owner_id {
                    return Err(MachineError::new("ADD_TODO", "only the owner may add todos"));
                }
                let text = event
                    .payload
                    .get("text")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| MachineError::new("ADD_TODO", "missing `text` field"))?;
                self.public.todos.push(TodoItem { id: Uuid::new_v4().to_string(), text: text.to_string(), completed: false });
                Ok(())
            }
            "COMPLETE_TODO" => {
                if event.caller.id != self.public.owner_id {
                    return Err(MachineError::new("COMPLETE_TODO", "only the owner may complete todos"));
                }
                let id = event
                    .payload
                    .get("id")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| MachineError::new("COMPLETE_TODO", "missing `id` field"))?;
                let todo = self
                    .public
                    .todos
                    .iter_mut()
                    .find(|t| t.id == id)
                    .ok_or_else(|| MachineError::new("COMPLETE_TODO", "no such todo"))?;
                todo.completed = true;
                Ok(())
            }
            "SET_DRAFT" => {
                let draft = event.payload.get("draft").and_then(|v| v.as_str()).map(str::to_string);
                self.private.entry(event.caller.id.clone()).or_default().draft = draft;
                Ok(())
            }
            "CONNECT" | "DISCONNECT" | "INITIALIZE" | "RESUME" | "MIGRATE" => Ok(()),
            other => Err(MachineError::new(other, "unknown event type")),
        }
    }

    fn get_snapshot(&self) -> TodoSnapshot {
        Snapshot { context: ak_core::MachineContext { public: self.public.clone(), private: self.private.clone() }, value: TodoState::Ready }
    }
}

#[cfg(test)]
#[path = "todo_tests.rs"]
mod tests;
