use actix_web::{HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use super::error::{AppError, Res};

pub struct Success;
impl Success {
    pub fn created<T: Serialize>(body: T) -> Res<impl Responder> {
        Result::Ok(HttpResponse::Created().json(body))
    }
    pub fn ok<T: Serialize>(body: T) -> Res<impl Responder> {
        Result::Ok(HttpResponse::Ok().json(body))
    }
    pub fn no_content() -> Res<impl Responder> {
        Result::Ok(HttpResponse::NoContent().finish())
    }
}

/// Query string of destructive endpoints: `?confirm=true` must be passed explicitly.
#[derive(Debug, Default, Deserialize)]
pub struct ConfirmQuery {
    #[serde(default)]
    pub confirm: bool,
}

impl ConfirmQuery {
    pub fn require(&self, what: &str) -> Res<()> {
        if self.confirm {
            Ok(())
        } else {
            Err(AppError::BadRequest(format!(
                "Deleting a {} cannot be undone; repeat the request with confirm=true",
                what
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_is_required() {
        assert!(ConfirmQuery { confirm: true }.require("student").is_ok());

        let err = ConfirmQuery::default().require("student").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(err.to_string().contains("confirm=true"));
    }
}
