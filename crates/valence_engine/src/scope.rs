//! The build context scope.
//!
//! Frontend contexts keep process-global state, so at most one of them may be
//! active at any moment. Entering the scope for a context blocks every other
//! thread until the returned guard is dropped. The owning thread may enter
//! again, but only for the context that is already active: nesting two
//! different contexts is a [`ScopeError::Conflict`].

use parking_lot::{const_reentrant_mutex, ReentrantMutex, ReentrantMutexGuard};
use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CONTEXT: AtomicU64 = AtomicU64::new(1);

static SCOPE: ReentrantMutex<RefCell<Vec<ContextId>>> = const_reentrant_mutex(RefCell::new(Vec::new()));

/// Identity of one frontend context. Every configure creates a fresh one.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ContextId(u64);

impl ContextId {
    /// Allocates an id that has never been handed out before.
    pub fn fresh() -> Self {
        Self(NEXT_CONTEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// Errors from entering the scope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScopeError {
    /// The thread tried to enter a second context while another is active.
    #[error("cannot enter {requested} while {active} is active on this thread")]
    Conflict {
        /// The context currently on top of the stack.
        active: ContextId,
        /// The context that was requested.
        requested: ContextId,
    },
}

/// Proof that the current thread holds the scope for one context.
///
/// Dropping the guard leaves the scope, including on early returns and
/// unwinding.
#[must_use = "the scope is released as soon as the guard is dropped"]
pub struct ScopeGuard {
    guard: ReentrantMutexGuard<'static, RefCell<Vec<ContextId>>>,
    id: ContextId,
}

impl ScopeGuard {
    /// The context this guard was entered for.
    pub fn id(&self) -> ContextId {
        self.id
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        self.guard.borrow_mut().pop();
    }
}

impl fmt::Debug for ScopeGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeGuard").field("id", &self.id).finish()
    }
}

/// Enters the scope for `id`, blocking while another thread holds it.
pub fn enter(id: ContextId) -> Result<ScopeGuard, ScopeError> {
    let guard = SCOPE.lock();
    {
        let mut stack = guard.borrow_mut();
        if let Some(&active) = stack.last() {
            if active != id {
                return Err(ScopeError::Conflict {
                    active,
                    requested: id,
                });
            }
        }
        stack.push(id);
    }
    Ok(ScopeGuard { guard, id })
}

/// The context active on the calling thread, if any.
pub fn current() -> Option<ContextId> {
    let guard = SCOPE.try_lock()?;
    let active = guard.borrow().last().copied();
    active
}

/// How many times the calling thread has entered the scope without leaving.
pub fn depth() -> usize {
    let Some(guard) = SCOPE.try_lock() else {
        return 0;
    };
    let depth = guard.borrow().len();
    depth
}
