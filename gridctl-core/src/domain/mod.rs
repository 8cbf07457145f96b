//! Core domain types
//!
//! This module contains the domain structures shared across gridctl crates.
//! Jobs are persisted by the job store and mutated by backend plugins; endpoints
//! and execution targets only live for the duration of one discovery round.

pub mod description;
pub mod endpoint;
pub mod job;
pub mod target;
