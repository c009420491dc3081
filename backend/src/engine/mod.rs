// src/engine/mod.rs

//! Scoring and review engine for mock tests.

pub mod grading;
pub mod review;
pub mod scoring;
pub mod session;
