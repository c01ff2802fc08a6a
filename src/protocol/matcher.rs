//! Connection matchers.
//!
//! A matcher answers one question about a flow: is it this protocol? A `false`
//! answer is the normal outcome for unrelated traffic and is never an error.
//! Errors are reserved for transport failures, which the caller decides how to
//! treat.

use crate::core::header::{HandshakeHeader, HANDSHAKE_LEN};
use crate::core::metadata::{MetadataContext, KEY_CONN_ID, KEY_MAGIC, KEY_MSG_TYPE};
use crate::error::Result;
use crate::transport::Flow;
use async_trait::async_trait;
use std::fmt;
use tokio::io::AsyncReadExt;

/// Module id of the EasyTier config-server matcher
pub const MODULE_ID: &str = "layer4.matchers.easytier_config_server";

/// Directive name used in configuration
pub const DIRECTIVE: &str = "easytier_config_server";

/// A pluggable flow classifier
#[async_trait]
pub trait ConnMatcher: Send + Sync + fmt::Debug {
    /// Decide whether `flow` belongs to this matcher's protocol.
    ///
    /// When a context is given and the flow matches, extracted fields are
    /// published to it.
    async fn matches(&self, flow: &mut Flow, ctx: Option<&MetadataContext>) -> Result<bool>;
}

/// Matches EasyTier config-server handshake packets.
///
/// Only datagram flows are considered. On a match the connection id, message
/// type name and magic are published under [`KEY_CONN_ID`], [`KEY_MSG_TYPE`]
/// and [`KEY_MAGIC`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EasyTierConfigServer;

impl EasyTierConfigServer {
    pub fn new() -> Self {
        Self
    }

    /// Registry factory
    pub fn boxed() -> Box<dyn ConnMatcher> {
        Box::new(Self)
    }
}

#[async_trait]
impl ConnMatcher for EasyTierConfigServer {
    async fn matches(&self, flow: &mut Flow, ctx: Option<&MetadataContext>) -> Result<bool> {
        if !flow.local_addr().is_datagram() {
            return Ok(false);
        }

        let mut buf = [0u8; HANDSHAKE_LEN];
        flow.read_exact(&mut buf).await?;

        let header = match HandshakeHeader::parse(&buf) {
            Ok(header) => header,
            Err(_) => return Ok(false),
        };

        if let Some(ctx) = ctx {
            ctx.set(KEY_CONN_ID, header.conn_id);
            ctx.set(KEY_MSG_TYPE, header.msg_type.name());
            ctx.set(KEY_MAGIC, header.magic);
        }

        Ok(true)
    }
}
