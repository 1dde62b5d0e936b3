//! The action trait and its registry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use pictor_core::AppResult;

use crate::context::{ImageContext, ProcessContext};

/// A single named operation in a processing chain.
///
/// Implementations are stateless per call; one instance serves every request
/// concurrently. `params` is the comma-split entry, action name at index 0.
#[async_trait]
pub trait Action: Send + Sync {
    fn name(&self) -> &'static str;

    /// Parse and range-check parameters. Never touches the image.
    fn validate(&self, params: &[&str]) -> AppResult<()>;

    /// Called once per entry before the source is fetched and decoded. May
    /// set feature flags. The default validates the parameters for their
    /// fail-fast effect.
    fn before_new_context(
        &self,
        ctx: &mut ProcessContext,
        params: &[&str],
        index: usize,
    ) -> AppResult<()> {
        let _ = (ctx, index);
        self.validate(params)
    }

    /// Called once per entry after metadata is known, for disabled entries
    /// too. May disable mask slots based on source properties.
    fn before_process(
        &self,
        ctx: &mut ImageContext,
        params: &[&str],
        index: usize,
    ) -> AppResult<()> {
        let _ = (ctx, params, index);
        Ok(())
    }

    /// Apply the operation to the working image.
    async fn process(&self, ctx: &mut ImageContext, params: &[&str]) -> AppResult<()>;
}

/// Name to action mapping. Built once at composition time and injected into
/// the image processor; read-only afterwards.
#[derive(Default)]
pub struct ActionRegistry {
    actions: HashMap<String, Arc<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an action unless its name is already taken (first wins).
    pub fn register(&mut self, action: Arc<dyn Action>) {
        self.actions
            .entry(action.name().to_string())
            .or_insert(action);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Action>> {
        self.actions.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopAction(&'static str);

    #[async_trait]
    impl Action for NoopAction {
        fn name(&self) -> &'static str {
            self.0
        }

        fn validate(&self, _params: &[&str]) -> AppResult<()> {
            Ok(())
        }

        async fn process(&self, _ctx: &mut ImageContext, _params: &[&str]) -> AppResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_first_registration_wins() {
        let mut registry = ActionRegistry::new();
        let first: Arc<dyn Action> = Arc::new(NoopAction("resize"));
        let second: Arc<dyn Action> = Arc::new(NoopAction("resize"));
        registry.register(first.clone());
        registry.register(second);
        assert_eq!(registry.len(), 1);
        let bound = registry.get("resize").unwrap();
        assert!(Arc::ptr_eq(&bound, &first));
    }

    #[test]
    fn test_lookup_missing() {
        let registry = ActionRegistry::new();
        assert!(registry.get("frobnicate").is_none());
    }
}
