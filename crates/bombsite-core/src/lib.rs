//! Core types and definitions for the BOMBSITE battle engine.
//!
//! This crate defines the vocabulary shared across all other crates:
//! identifiers, commands, events, state exports, weapons, configuration,
//! constants and errors. It has no dependency on any runtime framework.

pub mod commands;
pub mod config;
pub mod constants;
pub mod enums;
pub mod error;
pub mod events;
pub mod setup;
pub mod state;
pub mod types;
pub mod weapons;
