// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::Method,
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, content, course, progress},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Matches the spreadsheet upload cap advertised to admins.
const IMPORT_BODY_LIMIT: usize = 5 * 1024 * 1024;

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, courses, admin).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state.
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let course_routes = Router::new()
        .route("/", get(course::list_courses))
        .route("/{title}", get(course::get_course))
        // Protected progression and content routes
        .merge(
            Router::new()
                .route("/{title}/progress", get(progress::get_progress))
                .route("/{title}/select", post(progress::select_lesson))
                .route("/{title}/submit", post(progress::submit_quiz))
                .route(
                    "/{title}/lessons/{lesson_id}/content",
                    get(content::get_content).post(content::generate_content),
                )
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let admin_routes = Router::new()
        .route("/courses/import", post(admin::import_courses))
        .route("/stats", get(admin::dashboard_stats))
        .layer(DefaultBodyLimit::max(IMPORT_BODY_LIMIT))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/courses", course_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
