//! Ordered evaluation of matchers against one flow.
//!
//! Every matcher sees the flow from its first byte: the chain records while
//! matching and rewinds before each attempt. Whatever the outcome, the flow is
//! handed back rewound with recording stopped, so the next stage reads the
//! complete byte stream.

use crate::config::{ErrorPolicy, SnifferConfig};
use crate::core::metadata::MetadataContext;
use crate::error::{Result, SniffError};
use crate::protocol::directive::parse_directive;
use crate::protocol::matcher::ConnMatcher;
use crate::transport::Flow;
use crate::utils::metrics::{global_metrics, Timer};
use crate::utils::timeout::{with_timeout, DEFAULT_MATCHING_TIMEOUT};
use std::time::Duration;
use tracing::{debug, instrument, trace, warn};

/// Named matchers evaluated in insertion order
#[derive(Debug)]
pub struct MatcherChain {
    entries: Vec<(String, Box<dyn ConnMatcher>)>,
    matching_timeout: Duration,
    error_policy: ErrorPolicy,
}

impl Default for MatcherChain {
    fn default() -> Self {
        Self::new()
    }
}

impl MatcherChain {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            matching_timeout: DEFAULT_MATCHING_TIMEOUT,
            error_policy: ErrorPolicy::default(),
        }
    }

    /// Build a chain from validated configuration
    pub fn from_config(config: &SnifferConfig) -> Result<Self> {
        config.validate_strict()?;

        let mut chain = Self::new()
            .with_matching_timeout(config.pipeline.matching_timeout)
            .with_error_policy(config.pipeline.error_policy);

        for entry in &config.matchers {
            let matcher = parse_directive(&entry.directive)?;
            chain.push(entry.name.clone(), matcher);
        }

        Ok(chain)
    }

    pub fn with_matching_timeout(mut self, timeout: Duration) -> Self {
        self.matching_timeout = timeout;
        self
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    pub fn push(&mut self, name: impl Into<String>, matcher: Box<dyn ConnMatcher>) {
        self.entries.push((name.into(), matcher));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names in evaluation order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Offer `flow` to each matcher in turn.
    ///
    /// Returns the name of the first matcher that claims the flow, or `None`.
    /// I/O failures and timeouts follow the configured [`ErrorPolicy`].
    #[instrument(skip_all, fields(local = %flow.local_addr()))]
    pub async fn classify(
        &self,
        flow: &mut Flow,
        ctx: Option<&MetadataContext>,
    ) -> Result<Option<&str>> {
        let metrics = global_metrics();
        let _timer = Timer::start("classify");
        metrics.flow_offered();

        flow.record();
        let outcome = self.evaluate(flow, ctx).await;
        flow.rewind();
        flow.stop_recording();

        match &outcome {
            Ok(Some(name)) => {
                metrics.flow_matched();
                debug!(matcher = %name, "Flow matched");
            }
            Ok(None) => {
                metrics.flow_unmatched();
                trace!(buffered = flow.buffered().len(), "No matcher claimed flow");
            }
            Err(e) => debug!(error = %e, "Matching aborted"),
        }

        outcome
    }

    async fn evaluate(
        &self,
        flow: &mut Flow,
        ctx: Option<&MetadataContext>,
    ) -> Result<Option<&str>> {
        let metrics = global_metrics();

        for (name, matcher) in &self.entries {
            flow.rewind();
            metrics.matcher_evaluated();

            let result = with_timeout(self.matching_timeout, matcher.matches(flow, ctx)).await;
            match result {
                Ok(true) => return Ok(Some(name.as_str())),
                Ok(false) => trace!(matcher = %name, "Matcher declined"),
                Err(e) => {
                    match &e {
                        SniffError::Timeout => metrics.timeout(),
                        SniffError::Io(_) => metrics.io_error(),
                        _ => {}
                    }
                    if self.error_policy == ErrorPolicy::NoMatch && e.is_transport() {
                        warn!(matcher = %name, error = %e, "Matcher failed, treating as no match");
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Ok(None)
    }
}
