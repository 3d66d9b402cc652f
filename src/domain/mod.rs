//! Domain module for task management.
//!
//! This module contains the task entity, its value objects and the
//! validated inputs accepted by the repositories.

pub mod task;

pub use task::{NewTask, Priority, Task, TaskChanges, TaskId, TaskName, TaskStatus, UnknownVariant};
