use actix_cors::Cors;
use actix_web::http::header;

/// The browser client sends bearer tokens, never cookies.
pub fn middleware(origin: &str) -> Cors {
    Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ])
        .allowed_origin(origin)
        .expose_headers(&[header::CONTENT_DISPOSITION])
        .max_age(3600)
}
