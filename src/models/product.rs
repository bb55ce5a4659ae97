use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: i64,
    pub category_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbProduct {
    pub id: i64,
    pub category_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<DbProduct> for Product {
    type Error = AppError;

    fn try_from(value: DbProduct) -> Result<Self, Self::Error> {
        if value.deleted_at.is_some() {
            return Err(AppError::not_found("product not found"));
        }

        Ok(Product {
            id: value.id,
            category_id: value.category_id,
            name: value.name,
            description: value.description,
            price: value.price,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductCreateRequest {
    #[schema(example = "Cold brew, 330ml")]
    pub name: String,
    #[schema(example = "Slow steeped for 18 hours")]
    pub description: Option<String>,
    #[schema(example = 3.5)]
    pub price: f64,
    #[schema(example = 1)]
    pub category_id: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductUpdateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(example = 3.9)]
    pub price: Option<f64>,
    /// Absent leaves the category unchanged; `null` detaches the product.
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<i64>)]
    pub category_id: Option<Option<i64>>,
}

/// Distinguishes an explicit `null` (`Some(None)`) from a missing field (`None`).
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl ProductCreateRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::bad_request("name must not be empty"));
        }
        validate_price(self.price)
    }
}

impl ProductUpdateRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = self.name.as_deref() {
            if name.trim().is_empty() {
                return Err(AppError::bad_request("name must not be empty"));
            }
        }
        match self.price {
            Some(price) => validate_price(price),
            None => Ok(()),
        }
    }
}

fn validate_price(price: f64) -> Result<(), AppError> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::bad_request("price must be a non-negative number"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_price_is_rejected() {
        let req = ProductCreateRequest {
            name: "Tea".to_string(),
            description: None,
            price: -1.0,
            category_id: None,
        };
        assert!(matches!(req.validate(), Err(AppError::BadRequest(_))));

        let update = ProductUpdateRequest {
            name: None,
            description: None,
            price: Some(0.0),
            category_id: None,
        };
        assert!(update.validate().is_ok());
    }

    #[test]
    fn update_tells_null_category_from_missing() {
        let keep: ProductUpdateRequest = serde_json::from_str(r#"{"price": 2.0}"#).unwrap();
        assert_eq!(keep.category_id, None);

        let clear: ProductUpdateRequest = serde_json::from_str(r#"{"category_id": null}"#).unwrap();
        assert_eq!(clear.category_id, Some(None));

        let set: ProductUpdateRequest = serde_json::from_str(r#"{"category_id": 4}"#).unwrap();
        assert_eq!(set.category_id, Some(Some(4)));
    }
}
