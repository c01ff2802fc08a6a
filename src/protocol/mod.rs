//! # Protocol Layer
//!
//! Matchers, their registry and the chain that evaluates them.
//!
//! ## Components
//! - **Matcher**: the `ConnMatcher` trait and the EasyTier config-server matcher
//! - **Registry**: process-wide table of matcher factories keyed by module id
//! - **Directive**: load-time parsing of declarative matcher configuration
//! - **Chain**: ordered evaluation of matchers against a flow
//!
//! ## Error Taxonomy
//! A matcher returns `Ok(false)` for traffic that is not its protocol and
//! `Err(_)` only when the flow itself failed (short read, reset, deadline).

pub mod chain;
pub mod directive;
pub mod matcher;
pub mod registry;
