//! Core library: signal extraction, embeddings, directory catalog,
//! rule evaluation, classification pipeline, filename synthesis.

pub mod catalog;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod filename;
pub mod heuristic;
pub mod models;
pub mod pipeline;
pub mod rules;
pub mod signals;
