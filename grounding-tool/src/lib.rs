//! Tools for preparing grounding datasets and coordinating multi-node start-up.

pub mod commands;
pub mod common;
pub mod config;
pub mod dataset;
