//! Gridctl Core
//!
//! Core types shared by the job supervisor, the backend plugins and the CLI.
//!
//! This crate contains:
//! - Domain types: Job, Endpoint, ExecutionTarget, JobDescription
//! - DTOs: Status records and submission receipts exchanged with backend services

pub mod domain;
pub mod dto;
