use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbCategory {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<DbCategory> for Category {
    type Error = AppError;

    fn try_from(value: DbCategory) -> Result<Self, Self::Error> {
        if value.deleted_at.is_some() {
            return Err(AppError::not_found("category not found"));
        }

        Ok(Category {
            id: value.id,
            name: value.name,
            description: value.description,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CategoryCreateRequest {
    #[schema(example = "Beverages")]
    pub name: String,
    #[schema(example = "Soft drinks, coffees, teas")]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CategoryUpdateRequest {
    #[schema(example = "Drinks")]
    pub name: Option<String>,
    #[schema(example = "Anything you can pour")]
    pub description: Option<String>,
}

impl CategoryCreateRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_name(&self.name)
    }
}

impl CategoryUpdateRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        match self.name.as_deref() {
            Some(name) => validate_name(name),
            None => Ok(()),
        }
    }
}

fn validate_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::bad_request("name must not be empty"));
    }
    Ok(())
}
