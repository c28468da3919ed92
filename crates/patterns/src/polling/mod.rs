//! Adaptive polling
//!
//! This module provides a poll loop that expands and contracts its waiting
//! time based on whether data keeps arriving, plus a producer filter that
//! surfaces only *changes* in a polled value.

pub mod poller;
pub mod value_changed;

pub use poller::Poller;
pub use value_changed::value_changed;
