//! Flavour to controller mapping

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::controller::{ControllerContext, JobController};

/// Builds a controller for one invocation
pub type ControllerFactory =
    Arc<dyn Fn(&ControllerContext) -> Arc<dyn JobController> + Send + Sync>;

/// Registered controller factories, keyed by flavour
///
/// Flavour lookup ignores ASCII case.
#[derive(Clone, Default)]
pub struct ControllerRegistry {
    factories: HashMap<String, ControllerFactory>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the factory for `flavour`, replacing any earlier one
    pub fn register(&mut self, flavour: &str, factory: ControllerFactory) {
        self.factories.insert(flavour.to_ascii_uppercase(), factory);
    }

    pub fn with(mut self, flavour: &str, factory: ControllerFactory) -> Self {
        self.register(flavour, factory);
        self
    }

    /// Build a controller for `flavour`, if one is registered
    pub fn create(
        &self,
        flavour: &str,
        context: &ControllerContext,
    ) -> Option<Arc<dyn JobController>> {
        self.factories
            .get(&flavour.to_ascii_uppercase())
            .map(|factory| factory(context))
    }

    pub fn flavours(&self) -> Vec<String> {
        let mut flavours: Vec<String> = self.factories.keys().cloned().collect();
        flavours.sort();
        flavours
    }
}

impl fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerRegistry")
            .field("flavours", &self.flavours())
            .finish()
    }
}
