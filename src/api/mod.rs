pub mod chat;
pub mod courses;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// All HTTP routes. Course and chat paths answer with and without the
/// trailing slash.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/courses/",
            get(courses::list_courses).post(courses::create_course),
        )
        .route(
            "/courses",
            get(courses::list_courses).post(courses::create_course),
        )
        .route(
            "/courses/{id}/",
            get(courses::get_course)
                .patch(courses::update_course)
                .delete(courses::delete_course),
        )
        .route(
            "/courses/{id}",
            get(courses::get_course)
                .patch(courses::update_course)
                .delete(courses::delete_course),
        )
        .route("/chat/", post(chat::chat))
        .route("/chat", post(chat::chat))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
