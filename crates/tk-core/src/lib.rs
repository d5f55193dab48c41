//! # tk-core
//!
//! Core types, identifiers, and error taxonomy for tracekit.
//!
//! This crate provides the foundational types shared across all tracekit crates:
//! - Entity structs for traces, projects, and their dependent rows
//! - Time-ordered id generation and version validation
//! - The explicit request context threaded through every operation
//! - Cross-cutting error types
//! - The collaborator contracts (`TraceStore`, `ProjectStore`, `LockService`)
//!   that storage and lock backends implement

pub mod entities;
pub mod enums;
pub mod errors;
pub mod identity;
pub mod ids;
pub mod store;
