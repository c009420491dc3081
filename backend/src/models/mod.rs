// src/models/mod.rs

pub mod review;
pub mod submission;
