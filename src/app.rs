use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post, put}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::calendar_page))
        .route("/calendar", get(handlers::calendar_page))
        .route("/save-entry", post(handlers::save_entry))
        .route("/api/calendar-events", get(handlers::calendar_events))
        .route("/api/calendar-entries", get(handlers::calendar_events))
        .route("/api/entry", get(handlers::get_entry))
        .route("/api/log-activity", post(handlers::log_activity))
        .route(
            "/api/activity/:id",
            put(handlers::update_activity).delete(handlers::delete_activity_by_id),
        )
        .route("/api/delete-activity", post(handlers::delete_activity))
        .route("/api/delete-entry", post(handlers::delete_entry))
        .route("/api/report.csv", get(handlers::report_csv))
        .route("/alcohol_instructions.html", get(handlers::alcohol_instructions))
        .route("/gambling_instructions.html", get(handlers::gambling_instructions))
        .with_state(state)
}
