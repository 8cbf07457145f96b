//! Data Transfer Objects exchanged with backend services
//!
//! This module contains the flavour-neutral shapes protocol clients hand back
//! to the supervisor: raw status records from information services and the
//! receipt of a successful submission.

pub mod status;
pub mod submission;
