//! Context Propagation Integration Tests
//!
//! Exercises the public facade end to end: derivation, scoped activation,
//! unbalanced detach handling, and stack-balance properties.

#[path = "../common/mod.rs"]
mod common;

mod scoped_activation;
mod stack_model;
