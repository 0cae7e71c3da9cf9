use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use crate::errors::AppError;
use crate::models::decision::Decision;
use crate::models::evaluator::Assignment;
use super::types::*;
use super::{DecisionCommit, ProposalRegistry, apply_to};

/// Registry over the `proposals`, `assignments` and `decisions` tables.
#[derive(Debug, Clone)]
pub struct PgRegistry {
    pool: PgPool,
}

impl PgRegistry {
    pub fn new(pool: PgPool) -> Self {
        PgRegistry { pool }
    }
}

const SELECT_PROPOSAL: &str = "SELECT p.id, p.title, p.submitter_id, p.submitter_name, \
            p.submitter_agency, p.department, p.submitted_at, p.status, p.document_ref, \
            p.deadline, p.version, a.department AS assigned_department, a.evaluator_ids, \
            a.deadline AS assignment_deadline, a.assigned_at \
     FROM proposals p \
     LEFT JOIN assignments a ON a.proposal_id = p.id";

#[derive(sqlx::FromRow)]
struct Row {
    id: String,
    title: String,
    submitter_id: String,
    submitter_name: String,
    submitter_agency: String,
    department: String,
    submitted_at: DateTime<Utc>,
    status: String,
    document_ref: Option<String>,
    deadline: Option<DateTime<Utc>>,
    version: i64,
    assigned_department: Option<String>,
    evaluator_ids: Option<Vec<String>>,
    assignment_deadline: Option<DateTime<Utc>>,
    assigned_at: Option<DateTime<Utc>>,
}

impl TryFrom<Row> for Proposal {
    type Error = AppError;

    fn try_from(row: Row) -> Result<Self, Self::Error> {
        let status = row.status.parse::<Status>().map_err(AppError::Internal)?;
        let assignment = match (row.assigned_department, row.evaluator_ids, row.assignment_deadline, row.assigned_at) {
            (Some(department), Some(evaluator_ids), Some(deadline), Some(assigned_at)) => Some(Assignment {
                proposal_id: row.id.clone(),
                department,
                evaluator_ids,
                deadline,
                assigned_at,
            }),
            _ => None,
        };
        Ok(Proposal {
            id: row.id,
            title: row.title,
            submitter: Submitter {
                id: row.submitter_id,
                name: row.submitter_name,
                agency: row.submitter_agency,
            },
            department: row.department,
            submitted_at: row.submitted_at,
            status,
            assignment,
            document_ref: row.document_ref,
            deadline: row.deadline,
            version: row.version,
        })
    }
}

async fn find_by_id(conn: &mut PgConnection, id: &str) -> Result<Option<Proposal>, AppError> {
    let row = sqlx::query_as::<_, Row>(&format!("{SELECT_PROPOSAL} WHERE p.id = $1"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    row.map(Proposal::try_from).transpose()
}

#[async_trait]
impl ProposalRegistry for PgRegistry {
    async fn get(&self, id: &str) -> Result<Option<Proposal>, AppError> {
        let mut conn = self.pool.acquire().await?;
        find_by_id(&mut conn, id).await
    }

    async fn list(&self, filter: &ProposalFilter) -> Result<Vec<Proposal>, AppError> {
        let rows = sqlx::query_as::<_, Row>(&format!(
            "{SELECT_PROPOSAL} \
             WHERE ($1::TEXT IS NULL OR p.status = $1) \
               AND ($2::TEXT IS NULL OR p.submitter_id = $2) \
               AND ($3::TEXT IS NULL OR p.department = $3) \
             ORDER BY p.submitted_at ASC, p.id ASC"
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.submitter.as_deref())
        .bind(filter.department.as_deref())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Proposal::try_from).collect()
    }

    async fn create(&self, new: NewProposal) -> Result<Proposal, AppError> {
        let (id,): (String,) = sqlx::query_as(
            "INSERT INTO proposals \
                 (id, title, submitter_id, submitter_name, submitter_agency, department, \
                  submitted_at, status, document_ref, version) \
             VALUES ('P-' || nextval('proposal_seq'), $1, $2, $3, $4, $5, $6, $7, $8, 1) \
             RETURNING id",
        )
        .bind(&new.title)
        .bind(&new.submitter.id)
        .bind(&new.submitter.name)
        .bind(&new.submitter.agency)
        .bind(&new.department)
        .bind(new.submitted_at)
        .bind(Status::Pending.as_str())
        .bind(new.document_ref.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(Proposal {
            id,
            title: new.title,
            submitter: new.submitter,
            department: new.department,
            submitted_at: new.submitted_at,
            status: Status::Pending,
            assignment: None,
            document_ref: new.document_ref,
            deadline: None,
            version: 1,
        })
    }

    async fn apply_decision(&self, commit: DecisionCommit<'_>) -> Result<Proposal, AppError> {
        let decision = commit.decision;
        let id = decision.proposal_id.as_str();
        let mut tx = self.pool.begin().await?;

        let mut proposal = find_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Proposal {id} not found")))?;
        apply_to(&mut proposal, &commit);

        // The version guard makes a concurrent commit lose here rather than
        // overwrite.
        let updated = sqlx::query(
            "UPDATE proposals \
             SET status = $2, deadline = $3, document_ref = $4, version = version + 1 \
             WHERE id = $1 AND version = $5",
        )
        .bind(id)
        .bind(proposal.status.as_str())
        .bind(proposal.deadline)
        .bind(proposal.document_ref.as_deref())
        .bind(commit.expected_version)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(AppError::Conflict(format!(
                "Proposal {id} changed since version {}",
                commit.expected_version
            )));
        }

        sqlx::query(
            "INSERT INTO decisions \
                 (id, proposal_id, decision_kind, from_status, to_status, reviewer_id, \
                  reviewer_role, reviewed_at, record) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&decision.id)
        .bind(id)
        .bind(decision.kind().as_str())
        .bind(decision.from_status.as_str())
        .bind(decision.to_status.as_str())
        .bind(&decision.reviewer_id)
        .bind(decision.reviewer_role.as_str())
        .bind(decision.reviewed_at)
        .bind(Json(decision))
        .execute(&mut *tx)
        .await?;

        if let Some(a) = commit.assignment {
            sqlx::query("DELETE FROM assignments WHERE proposal_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            sqlx::query(
                "INSERT INTO assignments (proposal_id, department, evaluator_ids, deadline, assigned_at) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(id)
            .bind(&a.department)
            .bind(&a.evaluator_ids)
            .bind(a.deadline)
            .bind(a.assigned_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(proposal)
    }

    async fn history(&self, id: &str) -> Result<Vec<Decision>, AppError> {
        let rows: Vec<(Json<Decision>,)> =
            sqlx::query_as("SELECT record FROM decisions WHERE proposal_id = $1 ORDER BY seq ASC")
                .bind(id)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(Json(d),)| d).collect())
    }
}
