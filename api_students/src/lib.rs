use actix_web::web;

pub mod routes {
    pub mod student;
}
mod services {
    pub(crate) mod student;
}

/// Roster of the signed-in teacher. Mount inside the guarded `/api` scope.
pub fn mount_students() -> actix_web::Scope {
    web::scope("/students")
        .service(routes::student::get_students)
        .service(routes::student::post_student)
        .service(routes::student::get_student)
        .service(routes::student::put_student)
        .service(routes::student::delete_student)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, HttpMessage, dev::Service, http::StatusCode, test, web};
    use common::jwt::JwtClaims;
    use schema::forms::StudentForm;
    use sqlx::PgPool;
    use uuid::Uuid;

    use super::*;

    fn new_teacher() -> JwtClaims {
        JwtClaims {
            user_id: Uuid::new_v4(),
            email: None,
            name: None,
            exp: usize::MAX,
        }
    }

    #[actix_web::test]
    async fn test_delete_without_confirmation_is_refused() {
        // never connects: the request is refused before any query runs
        let pool = PgPool::connect_lazy("postgres://planwise@127.0.0.1:1/unused").unwrap();
        let claims = new_teacher();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Arc::new(pool)))
                .wrap_fn(move |req, srv| {
                    req.extensions_mut().insert(claims.clone());
                    srv.call(req)
                })
                .service(mount_students()),
        )
        .await;

        for uri in [
            format!("/students/{}", Uuid::new_v4()),
            format!("/students/{}?confirm=false", Uuid::new_v4()),
        ] {
            let req = test::TestRequest::delete().uri(&uri).to_request();
            let res = test::call_service(&app, req).await;
            assert_eq!(res.status(), StatusCode::BAD_REQUEST);
            let body: serde_json::Value = test::read_body_json(res).await;
            assert!(body["error"].as_str().unwrap().contains("confirm=true"));
        }
    }

    #[sqlx::test(migrations = "../db/migrations")]
    #[ignore = "requires a Postgres server at DATABASE_URL"]
    async fn test_first_student_provisions_the_teacher(pool: PgPool) {
        let claims = new_teacher();
        let form = StudentForm {
            name: "Mariana".to_string(),
            email: None,
            level: "B1".to_string(),
            native_language: Some("Spanish".to_string()),
            notes: None,
        };

        let student = services::student::create(&pool, &claims, 4, form)
            .await
            .unwrap();
        assert_eq!(student.teacher_id, claims.user_id);

        let teacher = db::user::get_user_by_id(&pool, claims.user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(teacher.credits, 4);
    }
}
