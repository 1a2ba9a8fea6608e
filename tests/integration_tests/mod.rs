//! Integration tests module
//!
//! End-to-end tests of the collection loop over a scripted transport:
//! - Tier filling, quota exhaustion and attempt budgets
//! - Crash and resume from the checkpoint store

pub mod collector_test;
pub mod resume_test;
