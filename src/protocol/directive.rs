//! Declarative matcher directives.
//!
//! Syntax:
//!
//! ```text
//! easytier_config_server
//! ```
//!
//! Matchers built from directives take no arguments and no block. Anything
//! else is reported at load time, long before a flow is classified.

use crate::error::{constants, Result, SniffError};
use crate::protocol::matcher::ConnMatcher;
use crate::protocol::registry::{global_registry, MatcherRegistry};

/// Split a directive into tokens. Braces are always their own token and
/// `#` starts a comment that runs to the end of the line.
fn tokenize(input: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    for line in input.lines() {
        let line = match line.find('#') {
            Some(idx) => &line[..idx],
            None => line,
        };
        let mut start = None;
        for (idx, ch) in line.char_indices() {
            match ch {
                '{' | '}' => {
                    if let Some(s) = start.take() {
                        tokens.push(&line[s..idx]);
                    }
                    tokens.push(&line[idx..idx + 1]);
                }
                c if c.is_whitespace() => {
                    if let Some(s) = start.take() {
                        tokens.push(&line[s..idx]);
                    }
                }
                _ => {
                    if start.is_none() {
                        start = Some(idx);
                    }
                }
            }
        }
        if let Some(s) = start {
            tokens.push(&line[s..]);
        }
    }
    tokens
}

/// Build a matcher from a directive using the process-wide registry
pub fn parse_directive(input: &str) -> Result<Box<dyn ConnMatcher>> {
    parse_directive_with(global_registry(), input)
}

/// Build a matcher from a directive using `registry`
pub fn parse_directive_with(registry: &MatcherRegistry, input: &str) -> Result<Box<dyn ConnMatcher>> {
    let tokens = tokenize(input);

    let (name, rest) = match tokens.split_first() {
        Some((name, rest)) if *name != "{" && *name != "}" => (*name, rest),
        Some((tok, _)) => {
            return Err(SniffError::ConfigError(format!(
                "unexpected token '{tok}' where a matcher name was expected"
            )))
        }
        None => return Err(SniffError::ConfigError(constants::ERR_EMPTY_DIRECTIVE.into())),
    };

    let matcher = registry.by_directive(name)?;

    match rest.first() {
        None => Ok(matcher),
        Some(&"{") => {
            if !rest.contains(&"}") {
                return Err(SniffError::ConfigError(format!(
                    "{name}: {}",
                    constants::ERR_UNCLOSED_BLOCK
                )));
            }
            Err(SniffError::ConfigError(format!(
                "malformed layer4 connection matcher '{name}': blocks are not supported"
            )))
        }
        Some(_) => Err(SniffError::ConfigError(format!(
            "{name}: {}",
            constants::ERR_WRONG_ARG_COUNT
        ))),
    }
}
