//! Core domain types and logic.

pub mod observation;
pub mod index;
pub mod constituent;
pub mod composition;
pub mod performance;
pub mod pipeline;
pub mod summary;
pub mod split;
pub mod acquisition;
pub mod universe;
pub mod config_validation;
pub mod error;
