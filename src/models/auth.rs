use serde::Deserialize;
use utoipa::ToSchema;

use crate::errors::AppError;

const IDENTIFIER_MIN: usize = 6;
const IDENTIFIER_MAX: usize = 255;
const PASSWORD_MIN: usize = 6;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// The identity of the user
    #[schema(example = "userone@test.com")]
    pub identifier: String,
    /// The password of the user
    #[schema(example = "123456")]
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let identifier_len = self.identifier.chars().count();
        if !(IDENTIFIER_MIN..=IDENTIFIER_MAX).contains(&identifier_len) {
            return Err(AppError::bad_request(format!(
                "identifier must be between {} and {} characters",
                IDENTIFIER_MIN, IDENTIFIER_MAX
            )));
        }

        if self.password.chars().count() < PASSWORD_MIN {
            return Err(AppError::bad_request(format!(
                "password must be at least {} characters",
                PASSWORD_MIN
            )));
        }

        Ok(())
    }
}
