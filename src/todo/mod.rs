//! Kairu domain model and business logic
//!
//! This module contains the to-do data structures and the operations on them.
//! It is split into submodules:
//! - `task`: Task, Sub-task, priority/recurrence enums, NewTask and TaskPatch
//! - `profile`: gamification profile, achievements and streak rules
//! - `todo_data`: main data container with all mutating operations
//! - `queries`: search, focus ordering, staleness, health check and stats
//! - `serde_impl`: serialization/deserialization implementations

mod profile;
mod queries;
mod serde_impl;
mod task;
mod todo_data;

// Re-export all public types
pub use profile::{Achievement, DEFAULT_THEME, Profile, StreakChange};
pub use queries::{
    HealthReport, MatchField, REST_TAG, SearchHit, SortKey, StatsView, ThemeStatus, ViewFilter,
};
pub use task::{
    GoalId, GroupId, LogEntry, NewTask, Priority, Recurrence, SubTask, Task, TaskId, TaskPatch,
    TaskStatus, local_date_today, local_now,
};
pub use todo_data::{Completion, FORMAT_VERSION, Goal, Group, PointAward, TodoData};
