//! Evidence checklist intake for dispute workflows.
//!
//! A party to a dispute uploads the documents its category requires; each upload
//! passes through the remote verification service (extraction, content hashing,
//! legal review) and is tracked per checklist slot.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
