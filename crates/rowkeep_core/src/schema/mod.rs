//! Declarative table schema metadata and DDL generation.
//!
//! # Responsibility
//! - Describe persisted columns as immutable descriptors.
//! - Derive CREATE TABLE statements deterministically from those descriptors.
//!
//! # Invariants
//! - DDL generation is a pure function of the descriptor set.
//! - Schema values never touch a live connection; the `db` module owns that.

pub mod column;
pub mod table;
