//! Logging handle passed to the components that emit records.
//!
//! The crate never installs a logger and never logs through an implicit
//! global target: every component receives a [`Logger`] at construction and
//! tags its records with that logger's target.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Logger {
    target: &'static str,
}

impl Logger {
    pub const fn new(target: &'static str) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &'static str {
        self.target
    }

    pub fn debug(&self, args: fmt::Arguments) {
        log::debug!(target: self.target, "{}", args);
    }

    pub fn info(&self, args: fmt::Arguments) {
        log::info!(target: self.target, "{}", args);
    }

    pub fn warn(&self, args: fmt::Arguments) {
        log::warn!(target: self.target, "{}", args);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new("vc_proofs")
    }
}
