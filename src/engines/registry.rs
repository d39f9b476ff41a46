//! Engine registry mapping provider identifiers to ready adapters

use super::traits::{Engine, EngineKind};
use crate::error::{self, SearchError};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of configured search engines
///
/// Built once at startup and shared read-only afterwards. Providers that are
/// known but could not be configured are remembered with the reason, so a
/// request naming them fails with `EngineUnavailable` rather than `UnknownEngine`.
#[derive(Default)]
pub struct EngineRegistry {
    engines: HashMap<EngineKind, Arc<dyn Engine>>,
    unavailable: HashMap<EngineKind, String>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an engine, replacing any previous adapter for the same provider
    pub fn register(&mut self, engine: Arc<dyn Engine>) {
        let kind = engine.kind();
        self.unavailable.remove(&kind);
        self.engines.insert(kind, engine);
    }

    /// Record why a provider cannot serve requests
    pub fn mark_unavailable(&mut self, kind: EngineKind, reason: impl Into<String>) {
        self.engines.remove(&kind);
        self.unavailable.insert(kind, reason.into());
    }

    /// Resolve a provider identifier (case-insensitive) to its adapter
    pub fn resolve(&self, name: &str) -> error::Result<Arc<dyn Engine>> {
        self.resolve_kind(name.parse()?)
    }

    pub fn resolve_kind(&self, kind: EngineKind) -> error::Result<Arc<dyn Engine>> {
        if let Some(engine) = self.engines.get(&kind) {
            return Ok(Arc::clone(engine));
        }

        let reason = self
            .unavailable
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| "engine is not configured".to_string());
        Err(SearchError::EngineUnavailable { engine: kind, reason })
    }

    pub fn contains(&self, kind: EngineKind) -> bool {
        self.engines.contains_key(&kind)
    }

    /// Registered providers in canonical order
    pub fn available(&self) -> Vec<EngineKind> {
        let mut kinds: Vec<_> = self.engines.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Providers that failed to configure, with reasons
    pub fn unavailable(&self) -> Vec<(EngineKind, String)> {
        let mut entries: Vec<_> = self
            .unavailable
            .iter()
            .map(|(kind, reason)| (*kind, reason.clone()))
            .collect();
        entries.sort();
        entries
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::testing::StubEngine;

    #[test]
    fn test_registry() {
        let mut registry = EngineRegistry::new();
        registry.register(Arc::new(StubEngine::new(EngineKind::DuckDuckGo)));
        registry.mark_unavailable(EngineKind::Bing, "Bing API key is required");

        assert_eq!(registry.len(), 1);
        assert!(registry.contains(EngineKind::DuckDuckGo));
        assert_eq!(registry.available(), vec![EngineKind::DuckDuckGo]);

        let engine = registry.resolve("DuckDuckGo").unwrap();
        assert_eq!(engine.kind(), EngineKind::DuckDuckGo);
    }

    #[test]
    fn test_resolve_errors() {
        let mut registry = EngineRegistry::new();
        registry.mark_unavailable(EngineKind::Bing, "Bing API key is required");

        assert!(matches!(
            registry.resolve("bing"),
            Err(SearchError::EngineUnavailable { engine: EngineKind::Bing, reason })
                if reason == "Bing API key is required"
        ));
        assert!(matches!(
            registry.resolve("google"),
            Err(SearchError::EngineUnavailable { engine: EngineKind::Google, .. })
        ));
        assert!(matches!(
            registry.resolve("yandex"),
            Err(SearchError::UnknownEngine { .. })
        ));
    }

    #[test]
    fn test_register_clears_unavailable() {
        let mut registry = EngineRegistry::new();
        registry.mark_unavailable(EngineKind::Google, "disabled");
        registry.register(Arc::new(StubEngine::new(EngineKind::Google)));

        assert!(registry.unavailable().is_empty());
        assert!(registry.resolve_kind(EngineKind::Google).is_ok());
    }
}
