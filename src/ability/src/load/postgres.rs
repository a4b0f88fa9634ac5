//! PostgreSQL resource loader
//!
//! Each resource type is mapped explicitly to a table. Rows are fetched as
//! `to_jsonb(row)`; the `id` column becomes the instance id and every other
//! column an attribute.

use super::Loader;
use crate::error::{AuthzError, Result};
use crate::types::{Action, Instance, ResourceType};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::info;

/// Loader backed by PostgreSQL tables
pub struct PostgresLoader {
    pool: PgPool,
    tables: HashMap<ResourceType, String>,
}

impl PostgresLoader {
    /// Create a loader over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            tables: HashMap::new(),
        }
    }

    /// Connect to `database_url`
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| AuthzError::Database(format!("Failed to connect: {}", e)))?;

        info!("PostgresLoader connected");
        Ok(Self::new(pool))
    }

    /// Map `resource_type` to `table`
    pub fn table(mut self, resource_type: impl Into<ResourceType>, table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        if !is_identifier(&table) {
            return Err(AuthzError::InvalidInput(format!(
                "invalid table name `{}`",
                table
            )));
        }

        self.tables.insert(resource_type.into(), table);
        Ok(self)
    }

    fn table_for(&self, resource_type: &ResourceType) -> Result<&str> {
        self.tables
            .get(resource_type)
            .map(String::as_str)
            .ok_or_else(|| AuthzError::Loader(format!("no table mapped for `{}`", resource_type)))
    }
}

#[async_trait]
impl<A: Sync> Loader<A> for PostgresLoader {
    async fn find(&self, resource_type: &ResourceType, id: &str) -> Result<Option<Instance>> {
        let table = self.table_for(resource_type)?;
        let query = format!(
            "SELECT to_jsonb(t) FROM {} t WHERE t.id::text = $1",
            table
        );

        let row: Option<(Value,)> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthzError::Database(format!("Failed to load {}: {}", resource_type, e)))?;

        Ok(row.map(|(row,)| instance_from_row(resource_type, row)))
    }

    async fn accessible(
        &self,
        resource_type: &ResourceType,
        _actor: &A,
        _action: &Action,
    ) -> Result<Option<Vec<Instance>>> {
        let table = self.table_for(resource_type)?;
        let query = format!("SELECT to_jsonb(t) FROM {} t ORDER BY t.id", table);

        let rows: Vec<(Value,)> = sqlx::query_as(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AuthzError::Database(format!("Failed to list {}: {}", resource_type, e)))?;

        Ok(Some(
            rows.into_iter()
                .map(|(row,)| instance_from_row(resource_type, row))
                .collect(),
        ))
    }
}

fn instance_from_row(resource_type: &ResourceType, row: Value) -> Instance {
    match row {
        Value::Object(mut columns) => {
            let id = columns.remove("id").unwrap_or(Value::Null);
            Instance {
                resource_type: resource_type.clone(),
                id,
                attributes: columns,
            }
        }
        other => Instance::new(resource_type.clone(), other),
    }
}

/// Plain SQL identifier, optionally schema-qualified
fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
                && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        })
}
