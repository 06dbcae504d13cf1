use std::fmt;

use super::evaluator::EvaluatorRegistry;
use crate::geom::{DelaunayTriangulator, Triangulator};

/// Services shared by every blend-space node: the evaluator registry and the
/// triangulator used for 2D geometry.
pub struct BlendSpaceManager {
    evaluators: EvaluatorRegistry,
    triangulator: Box<dyn Triangulator + Send + Sync>,
}

impl Default for BlendSpaceManager {
    fn default() -> Self {
        Self {
            evaluators: EvaluatorRegistry::new(),
            triangulator: Box::new(DelaunayTriangulator),
        }
    }
}

impl fmt::Debug for BlendSpaceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlendSpaceManager")
            .field("evaluators", &self.evaluators)
            .finish_non_exhaustive()
    }
}

impl BlendSpaceManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_triangulator(mut self, triangulator: impl Triangulator + Send + Sync + 'static) -> Self {
        self.triangulator = Box::new(triangulator);
        self
    }

    #[must_use]
    pub fn evaluators(&self) -> &EvaluatorRegistry {
        &self.evaluators
    }

    pub fn evaluators_mut(&mut self) -> &mut EvaluatorRegistry {
        &mut self.evaluators
    }

    #[must_use]
    pub fn triangulator(&self) -> &(dyn Triangulator + Send + Sync) {
        self.triangulator.as_ref()
    }
}
