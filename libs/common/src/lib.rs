//! Common library for the Liftlog backend
//!
//! This crate provides shared functionality used by the Liftlog services:
//! database connectivity, migrations, and error handling.

pub mod database;
pub mod error;
