//! Process plugin tests
//!
//! List flattening, failure isolation and style clamping through the plugin manager.

mod isolation;
mod lists;
mod styles;
