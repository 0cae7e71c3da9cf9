use async_trait::async_trait;
use sqlx::PgPool;

use crate::errors::AppError;
use super::types::*;
use super::EvaluatorDirectory;

/// Evaluator directory read from the `evaluators` table.
#[derive(Debug, Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        PgDirectory { pool }
    }
}

#[derive(sqlx::FromRow)]
struct Row {
    id: String,
    name: String,
    department: String,
    specialties: Vec<String>,
    availability: String,
    current_workload: i32,
    max_workload: i32,
    rating: f32,
    completed_reviews: i32,
    agency: String,
}

fn count(value: i32, field: &str, id: &str) -> Result<u32, AppError> {
    u32::try_from(value).map_err(|_| AppError::Internal(format!("Evaluator {id} has negative {field} ({value})")))
}

impl TryFrom<Row> for Evaluator {
    type Error = AppError;

    fn try_from(row: Row) -> Result<Self, Self::Error> {
        let availability = if row.availability == "busy" {
            Availability::Busy
        } else {
            Availability::Available
        };
        Ok(Evaluator {
            current_workload: count(row.current_workload, "current_workload", &row.id)?,
            max_workload: count(row.max_workload, "max_workload", &row.id)?,
            completed_reviews: count(row.completed_reviews, "completed_reviews", &row.id)?,
            id: row.id,
            name: row.name,
            department: row.department,
            specialties: row.specialties.into_iter().collect(),
            availability,
            rating: row.rating,
            agency: row.agency,
        })
    }
}

#[async_trait]
impl EvaluatorDirectory for PgDirectory {
    async fn list_by_department(&self, department: &str) -> Result<Vec<Evaluator>, AppError> {
        let rows = sqlx::query_as::<_, Row>(
            "SELECT id, name, department, specialties, availability, \
                    current_workload, max_workload, rating, completed_reviews, agency \
             FROM evaluators \
             WHERE department = $1 \
             ORDER BY name ASC",
        )
        .bind(department)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Evaluator::try_from).collect()
    }
}
