//! Crosswork Core Library
//!
//! Core domain logic for the Crosswork K12 cross-disciplinary assignment
//! management system: schema migrations, rubric normalization, evaluation
//! scoring, and the SQLite-backed assignment/submission/evaluation store.

pub mod ai;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod rubric;
pub mod scoring;
