//! quizgrade-core: answer grading, scoring, and the quiz session model.
//!
//! This crate defines the question model, the grading engine, and the
//! backend trait that the rest of quizgrade builds on.

pub mod error;
pub mod grading;
pub mod model;
pub mod parser;
pub mod report;
pub mod scoring;
pub mod session;
pub mod statistics;
pub mod traits;
