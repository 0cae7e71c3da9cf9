pub mod matcher;
pub mod queries;
pub mod types;

pub use matcher::AssignmentMatcher;
pub use queries::PgDirectory;
pub use types::*;

use async_trait::async_trait;

use crate::errors::AppError;

/// Read-only lookup into the evaluator directory.
#[async_trait]
pub trait EvaluatorDirectory: Send + Sync {
    async fn list_by_department(&self, department: &str) -> Result<Vec<Evaluator>, AppError>;
}

/// Directory backed by a fixed list, loaded from seed data or built in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    evaluators: Vec<Evaluator>,
}

impl StaticDirectory {
    pub fn new(evaluators: Vec<Evaluator>) -> Self {
        StaticDirectory { evaluators }
    }
}

#[async_trait]
impl EvaluatorDirectory for StaticDirectory {
    async fn list_by_department(&self, department: &str) -> Result<Vec<Evaluator>, AppError> {
        Ok(self
            .evaluators
            .iter()
            .filter(|e| e.department == department)
            .cloned()
            .collect())
    }
}
