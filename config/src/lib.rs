//! # Config Crate
//!
//! Centralized limits and constants for the Ruby lint pipeline.
//! Every bound that protects the engine from pathological input, and every
//! fixed piece of user-visible text, is defined here so the lexer, parser,
//! rule engine and boundary crates agree on them.
//!
//! ## Usage
//!
//! ```rust
//! use config::constants::{LintLimits, MAX_SYNTAX_ERRORS};
//!
//! let limits = LintLimits::default();
//! assert_eq!(limits.max_syntax_errors, MAX_SYNTAX_ERRORS);
//! ```
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All constants defined once, used everywhere
//! - **Browser-Safe**: No platform-specific values
//! - **Stateless**: Values are immutable; per-call settings are plain copies

pub mod constants;
