use std::{collections::HashMap, net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::catalog::{CatalogError, LectureCatalog};
use crate::filter::{SearchOptions, filter_lectures, last_page, visible_results};
use crate::lecture::Lecture;
use crate::placement::{CellDelta, Placement, resolve_drag};
use crate::schedule::{Schedule, lecture_palette};
use crate::store::{ScheduleStore, StoreError, TableId, TableSchedules};
use crate::time_grid::{self, Day, Period};

#[derive(Clone)]
pub struct AppState {
    store: Arc<ScheduleStore>,
    catalog: Arc<LectureCatalog>,
}

impl AppState {
    pub fn new(store: ScheduleStore, catalog: LectureCatalog) -> Self {
        Self::with_shared(Arc::new(store), Arc::new(catalog))
    }

    pub fn with_shared(store: Arc<ScheduleStore>, catalog: Arc<LectureCatalog>) -> Self {
        Self { store, catalog }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
    BadGateway(String),
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }

    fn unknown_table(table_id: &str) -> Self {
        ApiError::not_found(format!("table '{table_id}' not found"))
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        ApiError::Conflict(value.to_string())
    }
}

impl From<CatalogError> for ApiError {
    fn from(value: CatalogError) -> Self {
        ApiError::BadGateway(value.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::BadGateway(message) => (StatusCode::BAD_GATEWAY, "bad_gateway", message),
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/grid", get(grid))
        .route("/lectures", get(search_lectures))
        .route("/tables", get(list_tables))
        .route("/tables/:id", get(get_table).delete(remove_table))
        .route("/tables/:id/duplicate", post(duplicate_table))
        .route("/tables/:id/lectures", post(add_lecture))
        .route("/tables/:id/slots/:day/:period", delete(delete_slot))
        .route("/tables/:id/schedules/:index/drag", post(drag_schedule))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "timetable HTTP API listening");
    axum::serve(listener, app).await
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "status": "ok", "catalog": state.catalog.status() }))
}

#[derive(Debug, Serialize)]
struct GridRow {
    period: Period,
    label: String,
    evening: bool,
}

#[derive(Debug, Serialize)]
struct GridView {
    rows: usize,
    columns: usize,
    days: Vec<Day>,
    periods: Vec<GridRow>,
}

async fn grid() -> Json<GridView> {
    let periods = time_grid::periods()
        .filter_map(|period| {
            time_grid::period_to_label(period).map(|label| GridRow {
                period,
                label,
                evening: time_grid::is_evening(period),
            })
        })
        .collect();
    Json(GridView {
        rows: time_grid::GRID_ROWS,
        columns: time_grid::GRID_COLUMNS,
        days: Day::ALL.to_vec(),
        periods,
    })
}

/// Query string of `GET /lectures`. List criteria are comma separated.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LectureQuery {
    query: Option<String>,
    grades: Option<String>,
    days: Option<String>,
    times: Option<String>,
    majors: Option<String>,
    credits: Option<f64>,
    page: Option<usize>,
}

impl LectureQuery {
    fn to_options(&self) -> Result<SearchOptions, ApiError> {
        let mut options = SearchOptions::new();
        options.query = self.query.clone().filter(|q| !q.trim().is_empty());
        options.credits = self.credits;
        for grade in split_list(&self.grades) {
            let grade = grade
                .parse::<u8>()
                .map_err(|_| ApiError::invalid(format!("invalid grade '{grade}'")))?;
            options.grades.insert(grade);
        }
        for day in split_list(&self.days) {
            let day = day.parse::<Day>().map_err(|err| ApiError::invalid(err.to_string()))?;
            options.days.insert(day);
        }
        for period in split_list(&self.times) {
            options.times.insert(parse_period(period)?);
        }
        options
            .majors
            .extend(split_list(&self.majors).map(str::to_string));
        Ok(options)
    }
}

fn split_list(raw: &Option<String>) -> impl Iterator<Item = &str> {
    raw.as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
}

fn parse_period(raw: &str) -> Result<Period, ApiError> {
    raw.parse::<Period>()
        .ok()
        .filter(|period| time_grid::is_valid_period(*period))
        .ok_or_else(|| ApiError::invalid(format!("invalid period '{raw}'")))
}

#[derive(Debug, Serialize)]
struct LecturePage {
    total: usize,
    page: usize,
    last_page: usize,
    lectures: Vec<Arc<Lecture>>,
}

async fn search_lectures(
    State(state): State<AppState>,
    Query(params): Query<LectureQuery>,
) -> Result<Json<LecturePage>, ApiError> {
    let options = params.to_options()?;
    let lectures = state.catalog.lectures().await?;
    let matches = filter_lectures(&lectures, &options);
    let page = params.page.unwrap_or(1).max(1);
    Ok(Json(LecturePage {
        total: matches.len(),
        page,
        last_page: last_page(matches.len()),
        lectures: visible_results(&matches, page).to_vec(),
    }))
}

#[derive(Debug, Serialize)]
struct TableList {
    tables: Vec<TableId>,
    can_remove: bool,
}

async fn list_tables(State(state): State<AppState>) -> Json<TableList> {
    Json(TableList {
        tables: state.store.table_keys().to_vec(),
        can_remove: state.store.can_remove_table(),
    })
}

#[derive(Debug, Serialize)]
struct TableView {
    id: TableId,
    schedules: TableSchedules,
    colours: HashMap<String, &'static str>,
}

impl TableView {
    fn new(id: TableId, schedules: TableSchedules) -> Self {
        let colours = {
            let list: &[Arc<Schedule>] = &schedules;
            lecture_palette(list)
        };
        Self {
            id,
            schedules,
            colours,
        }
    }
}

fn existing_table(state: &AppState, table_id: &str) -> Result<TableSchedules, ApiError> {
    if !state.store.contains_table(table_id) {
        return Err(ApiError::unknown_table(table_id));
    }
    Ok(state.store.table(table_id))
}

async fn get_table(
    State(state): State<AppState>,
    Path(table_id): Path<TableId>,
) -> Result<Json<TableView>, ApiError> {
    let schedules = existing_table(&state, &table_id)?;
    Ok(Json(TableView::new(table_id, schedules)))
}

async fn remove_table(
    State(state): State<AppState>,
    Path(table_id): Path<TableId>,
) -> Result<StatusCode, ApiError> {
    existing_table(&state, &table_id)?;
    state.store.remove_table(&table_id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn duplicate_table(
    State(state): State<AppState>,
    Path(table_id): Path<TableId>,
) -> Result<(StatusCode, Json<TableView>), ApiError> {
    let created = state
        .store
        .duplicate_table(&table_id)?
        .ok_or_else(|| ApiError::unknown_table(&table_id))?;
    let schedules = state.store.table(&created);
    Ok((StatusCode::CREATED, Json(TableView::new(created, schedules))))
}

#[derive(Debug, Deserialize)]
struct AddLecturePayload {
    lecture_id: String,
}

async fn add_lecture(
    State(state): State<AppState>,
    Path(table_id): Path<TableId>,
    Json(payload): Json<AddLecturePayload>,
) -> Result<(StatusCode, Json<TableView>), ApiError> {
    existing_table(&state, &table_id)?;
    let lecture = state
        .catalog
        .find(&payload.lecture_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("lecture '{}' not found", payload.lecture_id)))?;
    if lecture.segments().is_empty() {
        return Err(ApiError::invalid(format!(
            "lecture '{}' has no placeable time slots",
            lecture.id
        )));
    }
    state.store.add_lecture(&table_id, &lecture)?;
    let schedules = state.store.table(&table_id);
    Ok((StatusCode::CREATED, Json(TableView::new(table_id, schedules))))
}

#[derive(Debug, Serialize)]
struct SlotDeletion {
    removed: usize,
    table: TableView,
}

async fn delete_slot(
    State(state): State<AppState>,
    Path((table_id, day, period)): Path<(TableId, String, String)>,
) -> Result<Json<SlotDeletion>, ApiError> {
    let day = day.parse::<Day>().map_err(|err| ApiError::invalid(err.to_string()))?;
    let period = parse_period(&period)?;
    let before = existing_table(&state, &table_id)?.len();
    state.store.delete_by_slot(&table_id, day, period)?;
    let schedules = state.store.table(&table_id);
    Ok(Json(SlotDeletion {
        removed: before.saturating_sub(schedules.len()),
        table: TableView::new(table_id, schedules),
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DragPayload {
    days: i32,
    periods: i32,
    /// Apply the placement to the table.
    commit: bool,
    /// Commit even when the placement overlaps other blocks.
    force: bool,
}

#[derive(Debug, Serialize)]
struct DragOutcome {
    placement: Placement,
    committed: bool,
}

async fn drag_schedule(
    State(state): State<AppState>,
    Path((table_id, index)): Path<(TableId, usize)>,
    Json(payload): Json<DragPayload>,
) -> Result<Json<DragOutcome>, ApiError> {
    let schedules = existing_table(&state, &table_id)?;
    let placement = resolve_drag(&schedules, index, CellDelta::new(payload.days, payload.periods))
        .ok_or_else(|| ApiError::not_found(format!("table '{table_id}' has no schedule {index}")))?;

    let committed = payload.commit
        && placement.moved
        && (payload.force || !placement.has_conflicts())
        && state
            .store
            .move_schedule(&table_id, index, placement.day, placement.range)?;

    Ok(Json(DragOutcome {
        placement,
        committed,
    }))
}
