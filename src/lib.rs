//! # easytier-sniff
//!
//! Layer-4 protocol sniffer that recognises EasyTier config-server handshakes
//! on inbound UDP flows and publishes their identifying fields for later
//! routing decisions.
//!
//! ## Quick Start
//! ```rust
//! use easytier_sniff::core::metadata::{MetadataContext, KEY_MSG_TYPE};
//! use easytier_sniff::protocol::matcher::{ConnMatcher, EasyTierConfigServer};
//! use easytier_sniff::transport::Flow;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> easytier_sniff::error::Result<()> {
//! let datagram: &'static [u8] = &[
//!     0xDD, 0xCC, 0xBB, 0xAA, 0x01, 0x00, 0x08, 0x00,
//!     0xEF, 0xCD, 0xAB, 0x89, 0x67, 0x45, 0x23, 0x01,
//! ];
//! let mut flow = Flow::from_datagram(datagram, "0.0.0.0:11010".parse().unwrap(), "10.0.0.2:5000".parse().unwrap());
//! let ctx = MetadataContext::new();
//!
//! assert!(EasyTierConfigServer.matches(&mut flow, Some(&ctx)).await?);
//! assert_eq!(ctx.get_str(KEY_MSG_TYPE).as_deref(), Some("syn"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//! - [`core`]: header layout and metadata context
//! - [`transport`]: flow abstraction with record/replay
//! - [`protocol`]: matchers, registry, directives and the matcher chain
//! - [`config`]: TOML/environment configuration
//! - [`utils`]: logging, metrics and deadlines

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod transport;
pub mod utils;

pub use crate::config::{ErrorPolicy, SnifferConfig};
pub use crate::core::header::{HandshakeHeader, MessageType};
pub use crate::core::metadata::MetadataContext;
pub use crate::error::{Result, SniffError};
pub use crate::protocol::chain::MatcherChain;
pub use crate::protocol::matcher::{ConnMatcher, EasyTierConfigServer};
pub use crate::transport::{Flow, LocalAddr};
