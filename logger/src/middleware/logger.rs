use std::{sync::Arc, time::Instant};

use actix_web::{
    Error,
    body::{BoxBody, MessageBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::StatusCode,
};
use colored::{ColoredString, Colorize};
use common::jwt::get_jwt_claims_or_error;
use futures::future::{LocalBoxFuture, Ready, ready};
use log::{info, warn};

pub struct LoggerMiddleware {
    console_logging: bool,
}

impl LoggerMiddleware {
    pub fn new(console_logging: bool) -> Self {
        Self { console_logging }
    }
}

impl<S, B> Transform<S, ServiceRequest> for LoggerMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = LoggerMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(LoggerMiddlewareService {
            service: Arc::new(service),
            console_logging: self.console_logging,
        }))
    }
}

pub struct LoggerMiddlewareService<S> {
    service: Arc<S>,
    console_logging: bool,
}

impl<S, B> Service<ServiceRequest> for LoggerMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let started = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();
        let query_string = req.query_string().to_string();
        // set by the extraction middleware, which runs before this one
        let user_id = get_jwt_claims_or_error(&req).ok().map(|claims| claims.user_id);

        let console_logging = self.console_logging;
        let srv = Arc::clone(&self.service);

        Box::pin(async move {
            let res = srv.call(req).await?;
            let status = res.status();
            let elapsed_ms = started.elapsed().as_millis();
            let user = user_id.map_or("None".to_string(), |id| id.to_string());

            if console_logging {
                info!(
                    "[{}] {} {}{} {} user_id={}",
                    colored_status(status),
                    colored_method(&method),
                    path.bright_white(),
                    if query_string.is_empty() {
                        String::new()
                    } else {
                        format!("?{}", query_string)
                    },
                    format!("({}ms)", elapsed_ms).bright_black(),
                    user.bright_blue(),
                );
            } else if status.is_server_error() {
                warn!("{} {} {} ({}ms) user_id={}", status.as_u16(), method, path, elapsed_ms, user);
            }

            Ok(res.map_into_boxed_body())
        })
    }
}

fn colored_status(status: StatusCode) -> ColoredString {
    let code = status.as_u16().to_string();
    match status.as_u16() {
        200..=299 => code.green(),
        300..=399 => code.yellow(),
        400..=499 => code.bright_red(),
        _ => code.red(),
    }
}

fn colored_method(method: &str) -> ColoredString {
    match method {
        "GET" => method.blue(),
        "POST" => method.yellow(),
        "PUT" => method.purple(),
        "DELETE" => method.red(),
        _ => method.normal(),
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{App, HttpResponse, test, web};

    use super::*;

    #[actix_web::test]
    async fn test_responses_pass_through_unchanged() {
        let app = test::init_service(
            App::new()
                .wrap(LoggerMiddleware::new(true))
                .route("/ok", web::get().to(|| async { HttpResponse::Ok().body("fine") }))
                .route(
                    "/boom",
                    web::get().to(|| async { HttpResponse::InternalServerError().finish() }),
                ),
        )
        .await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/ok?x=1").to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(test::read_body(res).await, "fine".as_bytes());

        let app_quiet = test::init_service(
            App::new()
                .wrap(LoggerMiddleware::new(false))
                .route(
                    "/boom",
                    web::get().to(|| async { HttpResponse::InternalServerError().finish() }),
                ),
        )
        .await;
        let res = test::call_service(&app_quiet, test::TestRequest::get().uri("/boom").to_request()).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[::std::prelude::v1::test]
    fn test_method_colors_fall_back_to_plain() {
        assert_eq!(colored_method("PATCH").to_string(), "PATCH");
        assert!(colored_status(StatusCode::OK).to_string().contains("200"));
    }
}
