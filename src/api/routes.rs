//! API Routes
//!
//! Configures the Axum router with all studio endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    add_transaction, assign_sheet_music, cache_stats, create_template, delete_recital,
    delete_sheet_music, delete_student, delete_template, delete_transaction, health_handler,
    invalidate_all, invalidate_dataset, list_assignments, list_recitals, list_reports,
    list_sheet_music, list_sheet_music_assignments, list_students, list_templates,
    list_textbook_sheet_music, list_transactions, list_tuition_payments, monthly_summary,
    remove_assignment, render_template, save_recital, save_report, save_sheet_music,
    save_student, save_tuition_payment, update_template, update_transaction, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/students", get(list_students).put(save_student))
        .route("/students/:id", delete(delete_student))
        .route("/transactions", get(list_transactions).post(add_transaction))
        .route(
            "/transactions/:id",
            put(update_transaction).delete(delete_transaction),
        )
        .route("/finance/summary", get(monthly_summary))
        .route("/tuition", get(list_tuition_payments).put(save_tuition_payment))
        .route("/recitals", get(list_recitals).put(save_recital))
        .route("/recitals/:id", delete(delete_recital))
        .route("/sheet-music", get(list_sheet_music).put(save_sheet_music))
        .route("/sheet-music/:id", delete(delete_sheet_music))
        .route("/textbooks/:id/sheet-music", get(list_textbook_sheet_music))
        .route("/assignments", get(list_assignments))
        .route(
            "/sheet-music/:id/assignments",
            get(list_sheet_music_assignments).post(assign_sheet_music),
        )
        .route(
            "/sheet-music/:id/assignments/:student_id",
            delete(remove_assignment),
        )
        .route("/templates", get(list_templates).post(create_template))
        .route("/templates/:id", put(update_template).delete(delete_template))
        .route("/templates/:id/render", post(render_template))
        .route("/reports", get(list_reports).post(save_report))
        .route("/cache", delete(invalidate_all))
        .route("/cache/stats", get(cache_stats))
        .route("/cache/:dataset", delete(invalidate_dataset))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        create_router(AppState::from_config(&Config::default()))
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/cache/stats")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_save_student_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/students")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"id":1,"name":"Aiko"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_update_built_in_template_forbidden() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/templates/1")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"label":"x","text":"y"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_invalidate_unknown_dataset() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/cache/unknown")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_transactions_month_query() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/transactions?year=2024&month=13")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_remove_missing_assignment() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/sheet-music/4/assignments/2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
