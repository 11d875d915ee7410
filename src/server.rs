use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{debug, error};

use crate::{
    AddressFields, AssetStore, Bonus, Catalog, CatalogError, ColorSelector, Config, FieldError,
    FormKind, LineChange, LineSummary, LookupError, Notice, Page, PageSession, PostalClient,
    ProductLineConfig, SelectionError, SelectorView, SessionError, SessionRegistry,
    SubmissionDesk, SubmitError, SubmitOutcome, Visualizer, WoodColor,
    pages::{GUIDE_SENT, PageShell},
    selection::SelectionSummary,
    storage::IMAGES_ROUTE,
    visualizer::{PreviewInfo, encode_png},
};

/// Shared handles for every request.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub assets: Arc<AssetStore>,
    pub visualizer: Arc<Visualizer>,
    pub postal: PostalClient,
    pub sessions: Arc<SessionRegistry>,
    pub desk: SubmissionDesk,
    pub whatsapp_url: Arc<str>,
}

impl AppState {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let catalog = Catalog::load(config.catalog.as_deref())?;
        let assets = AssetStore::new(&config.assets_dir);
        let visualizer = Visualizer::from_assets(&assets, &config.preview_image);
        let postal = PostalClient::new(&config.postal_base_url, config.postal_timeout())
            .context("Failed to build the postal lookup client")?;
        let desk = SubmissionDesk::new(
            config.form_rules(),
            config.submit_delay(),
            config.whatsapp_phone.clone(),
        );

        Ok(Self {
            catalog: Arc::new(catalog),
            assets: Arc::new(assets),
            visualizer: Arc::new(visualizer),
            postal,
            sessions: Arc::new(SessionRegistry::with_limits(config.session_ttl(), config.max_sessions)),
            desk,
            whatsapp_url: config.whatsapp_url.as_str().into(),
        })
    }
}

pub fn router(state: AppState) -> Router {
    let images = ServeDir::new(state.assets.root());

    Router::new()
        .route("/api/health", get(health))
        .route("/api/catalog", get(list_lines))
        .route("/api/catalog/{line}", get(line_config))
        .route("/api/catalog/{line}/selector", get(line_selector))
        .route("/api/pages", get(list_pages))
        .route("/api/sessions", post(open_session))
        .route("/api/sessions/{id}", get(session_view).delete(close_session))
        .route("/api/sessions/{id}/line", put(choose_line))
        .route("/api/sessions/{id}/color", put(choose_color))
        .route("/api/sessions/{id}/preview", get(preview))
        .route("/api/sessions/{id}/preview.png", get(preview_png))
        .route("/api/sessions/{id}/submit", post(submit))
        .route("/api/sessions/{id}/bonus", post(request_bonus))
        .route("/api/postal/lookup", post(postal_lookup))
        .nest_service(IMAGES_ROUTE, images)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Serialize, Debug)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<FieldError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<Notice>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, error: impl ToString) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: error.to_string(),
                fields: Vec::new(),
                notice: None,
            },
        }
    }

    fn with_notice(mut self, notice: Notice) -> Self {
        self.body.notice = Some(notice);
        self
    }

    fn not_found(error: impl ToString) -> Self {
        Self::new(StatusCode::NOT_FOUND, error)
    }

    fn internal(error: impl ToString) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, "{}", self.body.error);
        } else {
            debug!(status = %self.status, "{}", self.body.error);
        }
        (self.status, Json(self.body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        Self::not_found(e)
    }
}

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        Self::not_found(e)
    }
}

impl From<SelectionError> for ApiError {
    fn from(e: SelectionError) -> Self {
        match e {
            SelectionError::ColorNotInLine { .. } => Self::new(StatusCode::UNPROCESSABLE_ENTITY, e),
            SelectionError::NoColor => Self::new(StatusCode::BAD_REQUEST, e),
        }
    }
}

impl From<SubmitError> for ApiError {
    fn from(e: SubmitError) -> Self {
        let notice = e.notice();
        let mut api = match &e {
            SubmitError::NoForm => Self::not_found(&e),
            SubmitError::Malformed(_) | SubmitError::MissingColor => Self::new(StatusCode::BAD_REQUEST, &e),
            SubmitError::Invalid(_) => Self::new(StatusCode::UNPROCESSABLE_ENTITY, &e),
            SubmitError::InFlight => Self::new(StatusCode::CONFLICT, &e),
        };
        if let SubmitError::Invalid(fields) = e {
            api.body.fields = fields;
        }
        api.with_notice(notice)
    }
}

impl From<LookupError> for ApiError {
    fn from(e: LookupError) -> Self {
        let notice = e.notice();
        let status = match e {
            LookupError::InvalidCode => StatusCode::UNPROCESSABLE_ENTITY,
            LookupError::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, e).with_notice(notice)
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Everything a mounted page renders from its session.
#[derive(Serialize, Debug)]
pub struct SessionView {
    pub id: String,
    pub page: Page,
    pub line: LineSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<FormKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_color: Option<WoodColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<SelectorView>,
    pub summary: SelectionSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bonus: Option<Bonus>,
    pub submit_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

fn session_view_of(state: &AppState, session: &PageSession, notice: Option<Notice>) -> SessionView {
    let selection = session.snapshot();
    let page = session.page();
    let line = selection.config(&state.catalog);
    let form = page.form();

    let selector = page
        .has_configurator()
        .then(|| ColorSelector::new(line, selection.color()).view(&state.assets));
    let color_ready = form.is_some_and(|kind| !kind.needs_color() || selection.color().is_some());

    SessionView {
        id: session.id().to_string(),
        page,
        line: LineSummary::from(line),
        form,
        selected_color: selection.color().cloned(),
        selector,
        summary: selection.summary(&state.catalog),
        bonus: page.bonus(line),
        submit_enabled: color_ready && !session.is_submitting(),
        notice,
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_lines(State(state): State<AppState>) -> Json<Vec<LineSummary>> {
    Json(state.catalog.summaries())
}

async fn line_config(State(state): State<AppState>, Path(line): Path<String>) -> ApiResult<Json<ProductLineConfig>> {
    Ok(Json(state.catalog.lookup(&line)?.clone()))
}

#[derive(Deserialize)]
struct SelectorQuery {
    selected: Option<String>,
}

async fn line_selector(
    State(state): State<AppState>,
    Path(line): Path<String>,
    Query(query): Query<SelectorQuery>,
) -> ApiResult<Json<SelectorView>> {
    let config = state.catalog.lookup(&line)?;
    let selected = query.selected.as_deref().and_then(|id| config.find_color(id));
    Ok(Json(ColorSelector::new(config, selected).view(&state.assets)))
}

#[derive(Serialize)]
struct PagesView {
    whatsapp_url: String,
    pages: Vec<PageShell>,
}

async fn list_pages(State(state): State<AppState>) -> Json<PagesView> {
    Json(PagesView {
        whatsapp_url: state.whatsapp_url.to_string(),
        pages: Page::ALL.iter().map(Page::shell).collect(),
    })
}

#[derive(Deserialize)]
struct OpenSession {
    page: String,
}

async fn open_session(
    State(state): State<AppState>,
    payload: Result<Json<OpenSession>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SessionView>)> {
    let Json(body) = payload?;
    let page = Page::from_slug(&body.page).ok_or_else(|| ApiError::not_found(format!("Unknown page '{}'", body.page)))?;
    let session = state.sessions.open(page, &state.catalog);
    Ok((StatusCode::CREATED, Json(session_view_of(&state, &session, None))))
}

async fn session_view(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<SessionView>> {
    let session = state.sessions.get(&id)?;
    Ok(Json(session_view_of(&state, &session, None)))
}

async fn close_session(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.sessions.close(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct ChooseLine {
    line: String,
}

async fn choose_line(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ChooseLine>, JsonRejection>,
) -> ApiResult<Json<SessionView>> {
    let Json(body) = payload?;
    let session = state.sessions.get(&id)?;

    let change = session.selection().choose_line(&state.catalog, &body.line);
    let notice = match change {
        LineChange::Selected => None,
        LineChange::FellBack { requested } => Some(Notice::info(format!(
            "Linha '{}' indisponível, exibindo {}",
            requested,
            session.snapshot().config(&state.catalog).display_name
        ))),
    };
    Ok(Json(session_view_of(&state, &session, notice)))
}

#[derive(Deserialize)]
struct ChooseColor {
    color_id: String,
}

async fn choose_color(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ChooseColor>, JsonRejection>,
) -> ApiResult<Json<SessionView>> {
    let Json(body) = payload?;
    let session = state.sessions.get(&id)?;

    session.selection().choose_color(&state.catalog, &body.color_id)?;
    Ok(Json(session_view_of(&state, &session, None)))
}

async fn preview(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<PreviewInfo>> {
    let session = state.sessions.get(&id)?;
    let selection = session.snapshot();
    let line = selection.config(&state.catalog);
    Ok(Json(state.visualizer.info(line, selection.color(), &state.assets)))
}

async fn preview_png(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let session = state.sessions.get(&id)?;
    let color = session.snapshot().color().cloned();
    let visualizer = Arc::clone(&state.visualizer);

    let png = tokio::task::spawn_blocking(move || encode_png(&visualizer.render(color.as_ref())))
        .await
        .map_err(ApiError::internal)?
        .map_err(ApiError::internal)?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

async fn submit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<SubmitOutcome>> {
    let Json(body) = payload?;
    let session = state.sessions.get(&id)?;
    let outcome = state.desk.submit(&state.catalog, &session, body).await?;
    Ok(Json(outcome))
}

#[derive(Serialize)]
struct BonusSent {
    bonus: Bonus,
    notice: Notice,
}

async fn request_bonus(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<BonusSent>> {
    let session = state.sessions.get(&id)?;
    let selection = session.snapshot();
    let bonus = session
        .page()
        .bonus(selection.config(&state.catalog))
        .ok_or_else(|| ApiError::not_found("No bonus on offer here"))?;

    debug!(session = session.id(), title = %bonus.title, "Bonus requested");
    Ok(Json(BonusSent {
        bonus,
        notice: Notice::success(GUIDE_SENT),
    }))
}

#[derive(Deserialize)]
struct PostalLookup {
    code: String,
    #[serde(default)]
    address: AddressFields,
}

#[derive(Serialize)]
struct PostalFilled {
    address: AddressFields,
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<Notice>,
}

/// A code the service does not know is not a failure for the form: the
/// fields come back unchanged with an error notice.
async fn postal_lookup(
    State(state): State<AppState>,
    payload: Result<Json<PostalLookup>, JsonRejection>,
) -> ApiResult<Json<PostalFilled>> {
    let Json(PostalLookup { code, mut address }) = payload?;
    let notice = state.postal.fill(&code, &mut address).await?;
    Ok(Json(PostalFilled { address, notice }))
}
