use crate::cache::EntryCache;
use crate::calendar::{parse_month_key, CalendarState};
use crate::entries::{self, loggable_date, parse_iso_date};
use crate::errors::AppError;
use crate::models::{
    ActivityKind, ActivityResponse, CalendarQuery, DateEntry, DeleteActivityRequest,
    DeleteEntryRequest, EntryQuery, ReportQuery, SaveEntryResponse,
};
use crate::report::render_csv;
use crate::state::AppState;
use crate::ui::{describe_entry, render_calendar_page, render_instructions_page};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    http::header,
    response::{Html, IntoResponse},
    Json,
};
use chrono::{Local, NaiveDate};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

pub async fn calendar_page(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> Result<Html<String>, AppError> {
    let mut calendar = CalendarState::new(today());

    if let Some((year, month)) = query.month.as_deref().and_then(parse_month_key) {
        calendar.set_view(year, month as i32);
    }
    if let Some(date) = query.date.as_deref().and_then(parse_iso_date) {
        if !calendar.select(date) {
            warn!("ignoring selection of future date {date}");
        }
    }

    let feed = {
        let data = state.data.lock().await;
        serde_json::to_value(entries::all_entries(&data)).map_err(AppError::internal)?
    };
    let mut cache = EntryCache::default();
    let loaded = cache.load(feed.as_array().map(Vec::as_slice).unwrap_or_default());
    debug!("rendering {} with {loaded} logged dates", calendar.month_label());
    Ok(Html(render_calendar_page(&calendar, &cache)))
}

pub async fn alcohol_instructions() -> Html<String> {
    Html(render_instructions_page(ActivityKind::Drinking))
}

pub async fn gambling_instructions() -> Html<String> {
    Html(render_instructions_page(ActivityKind::Gambling))
}

pub async fn calendar_events(State(state): State<AppState>) -> Json<Vec<DateEntry>> {
    let data = state.data.lock().await;
    Json(entries::all_entries(&data))
}

pub async fn get_entry(
    State(state): State<AppState>,
    Query(query): Query<EntryQuery>,
) -> Result<Json<DateEntry>, AppError> {
    let date = query
        .date
        .as_deref()
        .and_then(parse_iso_date)
        .ok_or_else(|| AppError::bad_request("Invalid or missing date"))?;
    let data = state.data.lock().await;
    Ok(Json(entries::entry_for_date(&data, date)))
}

pub async fn log_activity(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ActivityResponse>, AppError> {
    let payload = json_body(payload)?;
    let date = loggable_date(payload.get("date").and_then(Value::as_str), today())?;
    let activities = entries::normalize_payload(&payload)?;

    let entry = state.commit(|data| entries::log_activities(data, date, activities)).await?;
    info!("saved {}", describe_entry(&entry));
    Ok(Json(ActivityResponse::success("Activity saved successfully", entry)))
}

pub async fn save_entry(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SaveEntryResponse>, AppError> {
    let payload = json_body(payload)?;
    let raw_date = payload
        .get("entry_date")
        .or_else(|| payload.get("date"))
        .and_then(Value::as_str);
    let date = match raw_date.filter(|value| !value.trim().is_empty()) {
        Some(value) => loggable_date(Some(value), today())?,
        None => today(),
    };
    let activities = entries::normalize_payload(&payload)?;

    let entry = state.commit(|data| entries::log_activities(data, date, activities)).await?;
    info!("saved {}", describe_entry(&entry));
    Ok(Json(SaveEntryResponse {
        success: true,
        entry,
    }))
}

pub async fn update_activity(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ActivityResponse>, AppError> {
    let id = activity_id(id)?;
    let payload = json_body(payload)?;
    let entry = state.commit(|data| entries::update_activity(data, id, &payload)).await?;
    info!("updated activity {id} on {}", entry.date);
    Ok(Json(ActivityResponse::success("Activity updated", entry)))
}

pub async fn delete_activity_by_id(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<ActivityResponse>, AppError> {
    let id = activity_id(id)?;
    let entry = state.commit(|data| entries::delete_by_id(data, id)).await?;
    info!("deleted activity {id} on {}", entry.date);
    Ok(Json(ActivityResponse::success("Activity deleted", entry)))
}

pub async fn delete_activity(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ActivityResponse>, AppError> {
    let request: DeleteActivityRequest = parse_body(payload)?;
    let date = request.date.as_deref().and_then(parse_iso_date);
    let kind = request.kind.as_deref().and_then(ActivityKind::parse);
    let (Some(date), Some(kind)) = (date, kind) else {
        return Err(AppError::bad_request("Invalid date or type"));
    };

    let entry = state.commit(|data| entries::delete_activity(data, date, kind)).await?;
    info!("deleted {} entry on {date}", kind.as_str());
    Ok(Json(ActivityResponse::success(
        format!("{} entry deleted", kind.title()),
        entry,
    )))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ActivityResponse>, AppError> {
    let request: DeleteEntryRequest = parse_body(payload)?;
    let date = request
        .date
        .as_deref()
        .and_then(parse_iso_date)
        .ok_or_else(|| AppError::bad_request("Invalid or missing date"))?;

    let entry = state.commit(|data| entries::delete_date(data, date)).await?;
    info!("deleted every entry on {date}");
    Ok(Json(ActivityResponse::success("Entry deleted", entry)))
}

pub async fn report_csv(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let start = optional_date(query.start_date.as_deref(), "start_date")?;
    let end = optional_date(query.end_date.as_deref(), "end_date")?;
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(AppError::bad_request("start_date must not be after end_date"));
        }
    }

    let rows = {
        let data = state.data.lock().await;
        entries::entries_between(&data, start, end)
    };
    let body = render_csv(&rows)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"habit_report.csv\"",
            ),
        ],
        body,
    ))
}

fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    match payload {
        Ok(Json(value)) if value.is_object() => Ok(value),
        _ => Err(AppError::bad_request("No data received")),
    }
}

fn activity_id(id: Result<Path<u64>, PathRejection>) -> Result<u64, AppError> {
    match id {
        Ok(Path(id)) => Ok(id),
        Err(rejection) => {
            warn!("rejected activity id: {rejection}");
            Err(AppError::bad_request("Invalid activity id"))
        }
    }
}

fn parse_body<T: DeserializeOwned>(payload: Result<Json<Value>, JsonRejection>) -> Result<T, AppError> {
    let value = json_body(payload)?;
    serde_json::from_value(value).map_err(|err| AppError::bad_request(err.to_string()))
}

fn optional_date(value: Option<&str>, name: &str) -> Result<Option<NaiveDate>, AppError> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(value) => parse_iso_date(value)
            .map(Some)
            .ok_or_else(|| AppError::bad_request(format!("{name} must be YYYY-MM-DD"))),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
