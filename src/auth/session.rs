use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Staff,
    Evaluator,
    Proponent,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Staff => "staff",
            Role::Evaluator => "evaluator",
            Role::Proponent => "proponent",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "staff" => Ok(Role::Staff),
            "evaluator" => Ok(Role::Evaluator),
            "proponent" => Ok(Role::Proponent),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Unknown role '{other}'")),
        }
    }
}

/// Set of roles an actor holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roles(pub BTreeSet<Role>);

impl Roles {
    pub fn has(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    /// Staff and admins act on triage edges and see unredacted proposals.
    pub fn is_staff(&self) -> bool {
        self.has(Role::Staff) || self.has(Role::Admin)
    }

    /// Parse a comma-separated list, ignoring blanks and unknown names.
    pub fn from_csv(csv: &str) -> Self {
        let roles = csv
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse().ok())
            .collect();
        Roles(roles)
    }
}

impl FromIterator<Role> for Roles {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        Roles(iter.into_iter().collect())
    }
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub id: String,
    pub roles: Roles,
}

impl Actor {
    pub fn new(id: &str, roles: impl IntoIterator<Item = Role>) -> Self {
        Actor {
            id: id.to_string(),
            roles: roles.into_iter().collect(),
        }
    }
}

/// Resolves an actor id to its roles. Credential checks happen upstream.
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    async fn roles_for(&self, actor_id: &str) -> Result<Roles, AppError>;
}

#[derive(Debug, Clone, Default)]
pub struct StaticRoleDirectory {
    roles: HashMap<String, Roles>,
}

impl StaticRoleDirectory {
    pub fn new(roles: HashMap<String, Roles>) -> Self {
        StaticRoleDirectory { roles }
    }

    pub fn with(mut self, actor_id: &str, roles: impl IntoIterator<Item = Role>) -> Self {
        self.roles.insert(actor_id.to_string(), roles.into_iter().collect());
        self
    }
}

#[async_trait]
impl RoleDirectory for StaticRoleDirectory {
    async fn roles_for(&self, actor_id: &str) -> Result<Roles, AppError> {
        Ok(self.roles.get(actor_id).cloned().unwrap_or_default())
    }
}

/// Roles read from the `actor_roles` table.
#[derive(Debug, Clone)]
pub struct PgRoleDirectory {
    pool: PgPool,
}

impl PgRoleDirectory {
    pub fn new(pool: PgPool) -> Self {
        PgRoleDirectory { pool }
    }
}

#[async_trait]
impl RoleDirectory for PgRoleDirectory {
    async fn roles_for(&self, actor_id: &str) -> Result<Roles, AppError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT role FROM actor_roles WHERE actor_id = $1")
                .bind(actor_id)
                .fetch_all(&self.pool)
                .await?;

        let mut roles = Roles::default();
        for (name,) in rows {
            match name.parse::<Role>() {
                Ok(role) => {
                    roles.0.insert(role);
                }
                Err(e) => log::warn!("Ignoring role for actor {actor_id}: {e}"),
            }
        }
        Ok(roles)
    }
}
