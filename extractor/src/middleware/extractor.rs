use std::{future::Future, pin::Pin, rc::Rc, sync::Arc};

use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures::future::{Ready, ok};

use common::{
    error::Res,
    jwt::{self, JwtClaims},
};

/// Parses the bearer token, when there is one, and stores the outcome as
/// `Res<JwtClaims>` in the request extensions. Nothing is rejected here; guards
/// further down decide what a missing or invalid token means for their routes.
pub struct ExtractionMiddleware {
    jwt_secret: Rc<String>,
}

impl ExtractionMiddleware {
    pub fn new(jwt_secret: String) -> Self {
        Self {
            jwt_secret: Rc::new(jwt_secret),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ExtractionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Transform = ExtractionMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(ExtractionMiddlewareService {
            service: Arc::new(service),
            jwt_secret: self.jwt_secret.clone(),
        })
    }
}

pub struct ExtractionMiddlewareService<S> {
    service: Arc<S>,
    jwt_secret: Rc<String>,
}

impl<S, B> Service<ServiceRequest> for ExtractionMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // retrieve token from authorization header
        let token = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|auth_value| auth_value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_owned());

        if let Some(token) = token {
            let claims_res = jwt::validate_jwt(&token, &self.jwt_secret);
            if let Err(e) = &claims_res {
                log::debug!("Rejected bearer token on {}: {}", req.path(), e);
            }
            req.extensions_mut().insert::<Res<JwtClaims>>(claims_res);
        }

        let srv = Arc::clone(&self.service);
        Box::pin(async move { srv.call(req).await.map(|res| res.map_into_boxed_body()) })
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{App, HttpRequest, HttpResponse, test, web};
    use common::{
        env_config::JwtConfig,
        jwt::{ClaimsSpec, generate_jwt},
    };
    use uuid::Uuid;

    use super::*;

    async fn describe(req: HttpRequest) -> HttpResponse {
        let body = match req.extensions().get::<Res<JwtClaims>>() {
            None => "none".to_string(),
            Some(Ok(claims)) => claims.email.clone().unwrap_or_default(),
            Some(Err(_)) => "invalid".to_string(),
        };
        HttpResponse::Ok().body(body)
    }

    #[actix_web::test]
    async fn test_claims_are_stored_for_later_guards() {
        let app = test::init_service(
            App::new()
                .wrap(ExtractionMiddleware::new("secret".to_string()))
                .route("/", web::get().to(describe)),
        )
        .await;

        let token = generate_jwt(
            ClaimsSpec {
                user_id: Uuid::new_v4(),
                email: Some("t@school.org".to_string()),
                name: None,
            },
            &JwtConfig {
                secret: "secret".to_string(),
                expiration_hours: 1,
            },
        )
        .unwrap();

        let cases = [
            (None, "none"),
            (Some("Basic abc".to_string()), "none"),
            (Some("Bearer garbage".to_string()), "invalid"),
            (Some(format!("Bearer {}", token)), "t@school.org"),
        ];
        for (header, expected) in cases {
            let mut req = test::TestRequest::get().uri("/");
            if let Some(header) = header {
                req = req.insert_header(("Authorization", header));
            }
            let res = test::call_service(&app, req.to_request()).await;
            assert_eq!(test::read_body(res).await, expected.as_bytes());
        }
    }
}
