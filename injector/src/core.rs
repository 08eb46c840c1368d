//! Core, non-public bookkeeping for in-flight resolutions.

use crate::error::Error;
use once_cell::sync::Lazy;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

thread_local! {
  // One stack per container, holding the names that container is currently resolving on
  // this thread. Keyed by the container's address; empty stacks are removed.
  static RESOLVING_STACKS: RefCell<HashMap<usize, Vec<String>>> = RefCell::new(HashMap::new());
}

/// An RAII guard marking a name as being resolved by one container.
///
/// Entering a name that is already on the container's stack is a circular dependency: the
/// name is pushed once more for the trail, the stack is cleared and an error is returned.
/// Dropping the guard pops the name again.
pub(crate) struct ResolutionGuard {
  scope: usize,
}

impl ResolutionGuard {
  pub(crate) fn enter(scope: usize, name: &str) -> Result<Self, Error> {
    RESOLVING_STACKS.with(|stacks| {
      let mut stacks = stacks.borrow_mut();
      let stack = stacks.entry(scope).or_default();
      let circular = stack.iter().any(|n| n == name);
      stack.push(name.to_owned());
      if circular {
        let trail = stacks.remove(&scope).unwrap_or_default();
        return Err(Error::CircularDependency { trail });
      }
      Ok(Self { scope })
    })
  }
}

impl Drop for ResolutionGuard {
  fn drop(&mut self) {
    RESOLVING_STACKS.with(|stacks| {
      let mut stacks = stacks.borrow_mut();
      if let Some(stack) = stacks.get_mut(&self.scope) {
        stack.pop();
        if stack.is_empty() {
          stacks.remove(&self.scope);
        }
      }
    });
  }
}

/// Takes the container's current trail, leaving it empty.
pub(crate) fn take_trail(scope: usize) -> Vec<String> {
  RESOLVING_STACKS
    .with(|stacks| stacks.borrow_mut().remove(&scope))
    .unwrap_or_default()
}

/// Builds the missing-provider error for `name` from the container's current trail,
/// clearing that trail.
pub(crate) fn missing_provider(scope: usize, name: &str) -> Error {
  let mut trail = take_trail(scope);
  trail.push(name.to_owned());
  Error::MissingProvider {
    name: name.to_owned(),
    trail,
  }
}

// --- Cross-thread waits ---

// Which thread is initializing which instance cell, and which cell each blocked thread
// waits for. Cells are keyed by address.
#[derive(Default)]
struct WaitGraph {
  owners: HashMap<usize, ThreadId>,
  waiting: HashMap<ThreadId, usize>,
}

impl WaitGraph {
  // Follows owner -> awaited cell -> owner links from `cell`, looking for `me`.
  fn leads_to(&self, cell: usize, me: ThreadId) -> bool {
    let mut cell = cell;
    for _ in 0..=self.waiting.len() {
      let Some(&owner) = self.owners.get(&cell) else {
        return false;
      };
      if owner == me {
        return true;
      }
      match self.waiting.get(&owner) {
        Some(&next) => cell = next,
        None => return false,
      }
    }
    false
  }
}

static WAIT_GRAPH: Lazy<Mutex<WaitGraph>> = Lazy::new(Mutex::default);

fn wait_graph() -> MutexGuard<'static, WaitGraph> {
  WAIT_GRAPH.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks the current thread as about to block on an instance cell.
///
/// Entering fails when the cell's initializer is, directly or through other blocked
/// threads, waiting for this thread: blocking would never end.
pub(crate) struct WaitGuard {
  cell: usize,
}

impl WaitGuard {
  pub(crate) fn enter(cell: usize) -> Option<Self> {
    let me = thread::current().id();
    let mut graph = wait_graph();
    if graph.leads_to(cell, me) {
      return None;
    }
    graph.waiting.insert(me, cell);
    Some(Self { cell })
  }
}

impl Drop for WaitGuard {
  fn drop(&mut self) {
    let me = thread::current().id();
    let mut graph = wait_graph();
    if graph.waiting.get(&me) == Some(&self.cell) {
      graph.waiting.remove(&me);
    }
  }
}

/// Marks the current thread as the initializer of an instance cell.
pub(crate) struct InitGuard {
  cell: usize,
}

impl InitGuard {
  pub(crate) fn enter(cell: usize) -> Self {
    let me = thread::current().id();
    let mut graph = wait_graph();
    // The thread runs the initializer itself, so it no longer waits for the cell.
    if graph.waiting.get(&me) == Some(&cell) {
      graph.waiting.remove(&me);
    }
    graph.owners.insert(cell, me);
    Self { cell }
  }
}

impl Drop for InitGuard {
  fn drop(&mut self) {
    wait_graph().owners.remove(&self.cell);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn guard_pops_on_drop() {
    {
      let _a = ResolutionGuard::enter(1, "a").unwrap();
      let _b = ResolutionGuard::enter(1, "b").unwrap();
    }
    let err = missing_provider(1, "c");
    assert_eq!(err.to_string(), "No provider for \"c\"! (Resolving: c)");
  }

  #[test]
  fn reentering_a_name_reports_the_cycle() {
    let _a = ResolutionGuard::enter(2, "a").unwrap();
    let _b = ResolutionGuard::enter(2, "b").unwrap();
    let err = ResolutionGuard::enter(2, "a").err().unwrap();
    assert_eq!(
      err.to_string(),
      "Can not resolve circular dependency! (Resolving: a -> b -> a)"
    );
  }

  #[test]
  fn stacks_are_per_container() {
    let _outer = ResolutionGuard::enter(3, "foo").unwrap();
    assert!(ResolutionGuard::enter(4, "foo").is_ok());
  }

  #[test]
  fn waiting_on_a_cell_this_thread_initializes_is_refused() {
    let _owner = InitGuard::enter(10);
    assert!(WaitGuard::enter(10).is_none());
  }

  #[test]
  fn wait_chains_through_other_threads_are_followed() {
    // Another thread initializes cell 21 and waits for cell 20, which this thread owns.
    let (ready_tx, ready_rx) = std::sync::mpsc::channel();
    let (done_tx, done_rx) = std::sync::mpsc::channel::<()>();
    let other = std::thread::spawn(move || {
      let _owner = InitGuard::enter(21);
      let _wait = WaitGuard::enter(20).unwrap();
      ready_tx.send(()).unwrap();
      done_rx.recv().unwrap();
    });
    let _owner = InitGuard::enter(20);
    ready_rx.recv().unwrap();

    assert!(WaitGuard::enter(21).is_none());
    assert!(WaitGuard::enter(22).is_some());

    done_tx.send(()).unwrap();
    other.join().unwrap();
  }
}
