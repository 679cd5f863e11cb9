use actix_web::web;
use middleware::auth::AuthMiddleware;

pub mod middleware {
    pub mod auth;
}
pub mod routes {
    pub mod user;
}
pub mod services {
    pub mod user;
}
mod dtos {
    pub(crate) mod user;
}

/// Profile of the signed-in teacher, `/me`. Mount inside the guarded `/api` scope.
pub fn mount_users() -> actix_web::Scope {
    web::scope("/me").service(routes::user::get_me)
}

/// Rejects requests without valid bearer claims.
pub fn auth_middleware() -> AuthMiddleware {
    AuthMiddleware::new()
}
