//! # Core Components
//!
//! Wire layout of the handshake header and the metadata context that carries
//! extracted fields to later pipeline stages.
//!
//! ## Components
//! - **Header**: 16-byte handshake layout, validation and encoding
//! - **Metadata**: shared key/value context with placeholder expansion
//!
//! ## Wire Format
//! ```text
//! [ConnId(4)] [MsgType(1)] [Padding(1)] [Length(2)] [Magic(8)]
//! ```
//!
//! ## Robustness
//! - Fixed-size header: no length-driven allocation
//! - Validation never panics on arbitrary input

pub mod header;
pub mod metadata;
