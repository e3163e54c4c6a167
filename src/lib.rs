//! Palisade - password-policy filter for directory services
//!
//! This library decides whether a candidate password is forbidden by site
//! policy, for use inside a directory server's password-change pipeline.
//! The host-level password hook, service registration, and transport are
//! external collaborators; this crate is the evaluation engine.

pub mod errors;
pub mod filter;
pub mod settings;
