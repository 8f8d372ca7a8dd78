use axum::{
    Router,
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get},
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use certview_core::{
    CertificateStore, CoreConfig, DisplayContext, FieldLine, IconKey, InMemoryCertificateStore,
    PersonView, PersonViewSnapshot, PersonWatcher, RowViewState, Section, StaticValueSets,
    ValueSetProvider, VaccinationField, ViewUpdate,
    config::{locale_from_env_value, utc_offset_from_env_value},
    person::{HeaderViewState, PersonCellViewState, QrCodeViewState, SectionRows},
};
use certview_types::PersonId;

/// Application state shared across REST handlers
///
/// The store and value sets are loaded once at startup; handlers derive a fresh view from the
/// current store snapshot on every request.
#[derive(Clone)]
struct AppState {
    store: Arc<InMemoryCertificateStore>,
    value_sets: Arc<StaticValueSets>,
    display: DisplayContext,
}

#[derive(Serialize, ToSchema)]
struct HealthRes {
    status: String,
}

#[derive(Serialize, ToSchema)]
struct PersonSummary {
    id: String,
    name: String,
    certificates: usize,
}

#[derive(Serialize, ToSchema)]
struct ListPeopleRes {
    people: Vec<PersonSummary>,
}

#[derive(Serialize, ToSchema)]
struct RemoveCertificateRes {
    removed: String,
    /// True once the person has no certificates left and their screen should close.
    dismiss: bool,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, list_people, person_view, certificate_details, remove_certificate),
    components(schemas(
        HealthRes,
        PersonSummary,
        ListPeopleRes,
        RemoveCertificateRes,
        PersonViewSnapshot,
        SectionRows,
        Section,
        HeaderViewState,
        QrCodeViewState,
        PersonCellViewState,
        RowViewState,
        IconKey,
        FieldLine,
        VaccinationField
    ))
)]
struct ApiDoc;

/// Main entry point for the certview REST service
///
/// Loads person snapshots from the data directory and serves their derived views.
///
/// # Environment Variables
/// - `CERTVIEW_REST_ADDR`: server address (default: "0.0.0.0:3000")
/// - `CERTVIEW_DATA_DIR`: directory of person snapshot files (default: "certificate_data")
/// - `CERTVIEW_VALUE_SETS`: optional value-set file
/// - `CERTVIEW_LOCALE`: display locale, `en` or `de` (default: "en")
/// - `CERTVIEW_UTC_OFFSET`: display offset for timestamps, e.g. "+02:00" (default: UTC)
///
/// # Errors
/// Returns an error if configuration is invalid, the data directory cannot be read, or the
/// server fails to bind or run.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("certview=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("CERTVIEW_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let data_dir = std::env::var("CERTVIEW_DATA_DIR")
        .unwrap_or_else(|_| certview_core::DEFAULT_DATA_DIR.into());
    let value_sets_file = std::env::var("CERTVIEW_VALUE_SETS").ok().map(PathBuf::from);

    let display = DisplayContext::new(
        locale_from_env_value(std::env::var("CERTVIEW_LOCALE").ok())?,
        utc_offset_from_env_value(std::env::var("CERTVIEW_UTC_OFFSET").ok())?,
    );
    let cfg = CoreConfig::new(PathBuf::from(data_dir), value_sets_file, display)?;

    let store = InMemoryCertificateStore::load_dir(cfg.data_dir())?;
    let value_sets = match cfg.value_sets_file() {
        Some(path) => StaticValueSets::from_file(path)?,
        None => {
            tracing::warn!("no value sets configured, coded fields will show raw codes");
            StaticValueSets::default()
        }
    };

    tracing::info!(
        "++ Loaded {} people from {}",
        store.person_ids().len(),
        cfg.data_dir().display()
    );
    tracing::info!("++ Starting certview REST on {}", addr);

    let app = router(AppState {
        store: Arc::new(store),
        value_sets: Arc::new(value_sets),
        display: *cfg.display(),
    });

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/people", get(list_people))
        .route("/people/:id/view", get(person_view))
        .route("/people/:id/certificates/:row/details", get(certificate_details))
        .route("/people/:id/certificates/:row", delete(remove_certificate))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn parse_person_id(id: &str) -> Result<PersonId, (StatusCode, &'static str)> {
    PersonId::new(id).map_err(|_| (StatusCode::BAD_REQUEST, "Invalid person id"))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint
async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        status: "ok".into(),
    })
}

#[utoipa::path(
    get,
    path = "/people",
    responses(
        (status = 200, description = "List of certified people", body = ListPeopleRes)
    )
)]
/// List every person in the store with their certificate count
async fn list_people(State(state): State<AppState>) -> Json<ListPeopleRes> {
    let people = state
        .store
        .people()
        .into_iter()
        .map(|(id, person)| PersonSummary {
            id: id.to_string(),
            name: person
                .name
                .as_ref()
                .map(|name| name.full_name())
                .unwrap_or_default(),
            certificates: person.certificates.len(),
        })
        .collect();
    Json(ListPeopleRes { people })
}

#[utoipa::path(
    get,
    path = "/people/{id}/view",
    params(("id" = String, Path, description = "Person id")),
    responses(
        (status = 200, description = "Derived sections and rows of the person's screen", body = PersonViewSnapshot),
        (status = 404, description = "Unknown person")
    )
)]
/// Derived view of one person
async fn person_view(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<PersonViewSnapshot>, (StatusCode, &'static str)> {
    let id = parse_person_id(&id)?;
    let person = state
        .store
        .person(&id)
        .ok_or((StatusCode::NOT_FOUND, "Unknown person"))?;
    let value_sets = state.value_sets.latest_value_sets();

    let view = PersonView::new(&person, value_sets.as_ref(), &state.display);
    Ok(Json(view.snapshot()))
}

#[utoipa::path(
    get,
    path = "/people/{id}/certificates/{row}/details",
    params(
        ("id" = String, Path, description = "Person id"),
        ("row" = usize, Path, description = "Row in the certificates section")
    ),
    responses(
        (status = 200, description = "Labelled fields of a vaccination certificate", body = [FieldLine]),
        (status = 404, description = "Unknown person or no vaccination certificate at this row")
    )
)]
/// Field breakdown of a vaccination certificate
async fn certificate_details(
    State(state): State<AppState>,
    AxumPath((id, row)): AxumPath<(String, usize)>,
) -> Result<Json<Vec<FieldLine>>, (StatusCode, &'static str)> {
    let id = parse_person_id(&id)?;
    let person = state
        .store
        .person(&id)
        .ok_or((StatusCode::NOT_FOUND, "Unknown person"))?;
    let value_sets = state.value_sets.latest_value_sets();

    PersonView::new(&person, value_sets.as_ref(), &state.display)
        .certificate_details(row)
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "No vaccination certificate at this row"))
}

#[utoipa::path(
    delete,
    path = "/people/{id}/certificates/{row}",
    params(
        ("id" = String, Path, description = "Person id"),
        ("row" = usize, Path, description = "Row in the certificates section")
    ),
    responses(
        (status = 200, description = "Certificate removed", body = RemoveCertificateRes),
        (status = 404, description = "Unknown person or row")
    )
)]
/// Remove the certificate shown at a row of the certificates section
///
/// The response tells the client whether the person's screen should reload or close.
async fn remove_certificate(
    State(state): State<AppState>,
    AxumPath((id, row)): AxumPath<(String, usize)>,
) -> Result<Json<RemoveCertificateRes>, (StatusCode, &'static str)> {
    let id = parse_person_id(&id)?;
    let person = state
        .store
        .person(&id)
        .ok_or((StatusCode::NOT_FOUND, "Unknown person"))?;

    let certificate = PersonView::new(&person, None, &state.display)
        .certificate_at(Section::Certificates, row)
        .cloned()
        .ok_or((StatusCode::NOT_FOUND, "No certificate at this row"))?;

    let watcher = PersonWatcher::new(&state.store, id);
    state.store.remove_certificate(&certificate);

    Ok(Json(RemoveCertificateRes {
        removed: certificate.id.to_string(),
        dismiss: watcher.poll(state.store.as_ref()) == Some(ViewUpdate::Dismiss),
    }))
}
