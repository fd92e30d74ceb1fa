//! Utility modules: polling.

pub mod poll;
