use crate::error::{constants, Result, SniffError};
use crate::protocol::matcher::{self, ConnMatcher, EasyTierConfigServer};
use once_cell::sync::Lazy;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// Zero-argument constructor for a matcher
pub type MatcherFactory = fn() -> Box<dyn ConnMatcher>;

#[derive(Clone, Copy)]
struct Registration {
    directive: &'static str,
    factory: MatcherFactory,
}

/// Matcher registry keyed by stable module id.
/// Built-in ids are borrowed statics, so lookups on the hot path never allocate.
pub struct MatcherRegistry {
    entries: RwLock<HashMap<Cow<'static, str>, Registration>>,
}

impl Default for MatcherRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MatcherRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Registry holding every built-in matcher
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        let mut entries = registry
            .entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.insert(
            Cow::Borrowed(matcher::MODULE_ID),
            Registration {
                directive: matcher::DIRECTIVE,
                factory: EasyTierConfigServer::boxed,
            },
        );
        drop(entries);
        registry
    }

    pub fn register(
        &self,
        id: &'static str,
        directive: &'static str,
        factory: MatcherFactory,
    ) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| SniffError::Custom(constants::ERR_REGISTRY_WRITE_LOCK.to_string()))?;

        if entries.contains_key(id) {
            return Err(SniffError::DuplicateMatcher(id.to_string()));
        }
        // A directive must resolve to exactly one matcher
        if entries.values().any(|reg| reg.directive == directive) {
            return Err(SniffError::DuplicateMatcher(directive.to_string()));
        }

        entries.insert(Cow::Borrowed(id), Registration { directive, factory });
        debug!(id, directive, "Registered matcher");
        Ok(())
    }

    /// Instantiate the matcher registered under `id`
    pub fn new_matcher(&self, id: &str) -> Result<Box<dyn ConnMatcher>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| SniffError::Custom(constants::ERR_REGISTRY_READ_LOCK.to_string()))?;

        entries
            .get(id)
            .map(|reg| (reg.factory)())
            .ok_or_else(|| SniffError::UnknownMatcher(id.to_string()))
    }

    /// Instantiate the matcher whose directive name is `name`
    pub fn by_directive(&self, name: &str) -> Result<Box<dyn ConnMatcher>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| SniffError::Custom(constants::ERR_REGISTRY_READ_LOCK.to_string()))?;

        entries
            .values()
            .find(|reg| reg.directive == name)
            .map(|reg| (reg.factory)())
            .ok_or_else(|| SniffError::UnknownMatcher(name.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries
            .read()
            .map(|entries| entries.contains_key(id))
            .unwrap_or(false)
    }

    /// Registered module ids, sorted
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .entries
            .read()
            .map(|entries| entries.keys().map(|k| k.to_string()).collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }
}

static REGISTRY: Lazy<MatcherRegistry> = Lazy::new(MatcherRegistry::with_builtins);

/// Process-wide registry, pre-populated with the built-in matchers
pub fn global_registry() -> &'static MatcherRegistry {
    &REGISTRY
}
