use actix_web::web;

pub use services::generation::LessonServices;

pub mod routes {
    pub mod lesson;
}
pub mod services {
    pub mod generation;
    pub(crate) mod lesson;
}
mod dtos {
    pub(crate) mod lesson;
}

/// Lesson generation and the lesson library. Mount inside the guarded `/api` scope.
pub fn mount_lessons() -> actix_web::Scope {
    // literal segments before `/{id}`
    web::scope("/lessons")
        .service(routes::lesson::post_generate)
        .service(routes::lesson::get_public_lessons)
        .service(routes::lesson::get_lessons)
        .service(routes::lesson::post_lesson)
        .service(routes::lesson::get_lesson_export)
        .service(routes::lesson::get_lesson)
        .service(routes::lesson::put_lesson)
        .service(routes::lesson::delete_lesson)
}
