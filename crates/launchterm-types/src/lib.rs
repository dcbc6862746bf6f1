//! Foundation types for launchterm.
//!
//! This crate holds the pieces every other launchterm crate agrees on:
//! the error type, the output sink that workers push text into, and the
//! preferences model loaded from `launchterm.toml`.

pub mod config;
pub mod error;
pub mod output;
