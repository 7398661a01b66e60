use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::entity::EntityDescriptor;

/// An entity waiting to be fetched.
pub type Task = EntityDescriptor;

/// Pending tasks shared by every worker in the pool.
///
/// Seeded once at construction and only ever shrinks: a popped task belongs to the
/// worker that popped it and is never handed back.
#[derive(Debug, Default)]
pub struct TaskQueue {
    tasks: Mutex<VecDeque<Task>>,
}

impl TaskQueue {
    pub fn new<I>(tasks: I) -> Self
    where
        I: IntoIterator<Item = Task>,
    {
        TaskQueue {
            tasks: Mutex::new(tasks.into_iter().collect()),
        }
    }

    /// Removes and returns the head task, or `None` once the queue is drained.
    pub fn pop_or_empty(&self) -> Option<Task> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // Nothing panics while the lock is held, so a poisoned guard still holds a consistent queue.
    fn lock(&self) -> MutexGuard<'_, VecDeque<Task>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
