//! Scheduled alerting for Covenant: the rule engine that creates alerts
//! from contract state, delivers them by email, and retires stale ones.
//!
//! The engine owns no clock and no schedule; callers pass `now` and decide
//! cadence (see `covenant-server` for the interval loops).

#![allow(async_fn_in_trait)]

mod engine;
mod mail;

pub use engine::{AlertEngine, RuleRun};
pub use mail::{DisabledMailer, EmailSender, HttpMailer};

#[cfg(test)]
mod tests;
