//! Logging capability handed to the parser, binner and commands.
//!
//! Nothing in the library calls the `log` macros directly; components receive
//! a `&dyn Reporter` instead.

use std::cell::RefCell;

pub const LOG_TARGET: &str = "iosnoop";

pub trait Reporter {
    fn info(&self, message: &str);
    fn debug(&self, message: &str);
    fn warn(&self, message: &str);
}

/// Forwards to the `log` facade (installed by the binary via env_logger).
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn info(&self, message: &str) {
        log::info!(target: LOG_TARGET, "{}", message);
    }

    fn debug(&self, message: &str) {
        log::debug!(target: LOG_TARGET, "{}", message);
    }

    fn warn(&self, message: &str) {
        log::warn!(target: LOG_TARGET, "{}", message);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Debug,
    Warn,
}

/// Keeps every message in memory.
#[derive(Debug, Default)]
pub struct Recorder {
    messages: RefCell<Vec<(Level, String)>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.messages
            .borrow()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }

    fn push(&self, level: Level, message: &str) {
        self.messages.borrow_mut().push((level, message.to_string()));
    }
}

impl Reporter for Recorder {
    fn info(&self, message: &str) {
        self.push(Level::Info, message);
    }

    fn debug(&self, message: &str) {
        self.push(Level::Debug, message);
    }

    fn warn(&self, message: &str) {
        self.push(Level::Warn, message);
    }
}
