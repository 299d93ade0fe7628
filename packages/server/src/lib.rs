#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the London crime dashboard.
//!
//! Serves the JSON API under `/api` from a single shared record store and,
//! when `STATIC_DIR` is set, the built frontend at `/`.

pub mod config;
mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use london_crime_database::{DbError, RecordStore};
use london_crime_geography::PostcodeResolver;

use crate::config::ServerConfig;

/// Shared application state.
pub struct AppState {
    /// Record store every query runs against.
    pub store: Arc<dyn RecordStore>,
    /// Postcode table for borough rankings.
    pub resolver: &'static PostcodeResolver,
}

impl AppState {
    /// State over `store` using the built-in London postcode table.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            resolver: PostcodeResolver::london(),
        }
    }
}

/// Registers the `/api` routes.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/summary/", web::get().to(handlers::summary))
            .route("/boroughs/", web::get().to(handlers::boroughs))
            .route("/area-types/", web::get().to(handlers::area_types))
            .route("/offence-groups/", web::get().to(handlers::offence_groups))
            .route(
                "/offence-subgroups/",
                web::get().to(handlers::offence_subgroups),
            )
            .route("/date-range/", web::get().to(handlers::date_range))
            .route("/borough-totals/", web::get().to(handlers::borough_totals))
            .route("/time-series/", web::get().to(handlers::time_series))
            .route(
                "/offence-breakdown/",
                web::get().to(handlers::offence_breakdown),
            )
            .route("/borough-ranking/", web::get().to(handlers::borough_ranking)),
    );
}

/// Opens the record store named by `config`.
///
/// # Errors
///
/// Returns [`DbError`] if the CSV extract cannot be read or the `DuckDB`
/// file cannot be opened.
pub fn open_store(config: &ServerConfig) -> Result<Arc<dyn RecordStore>, DbError> {
    log::info!("Opening {} record store...", config.store);
    let store = london_crime_database::open_store(
        config.store,
        &config.csv_path,
        &config.duckdb_path,
    )?;
    Ok(Arc::from(store))
}

/// Starts the API server over `store`.
///
/// This is a regular async function; the caller provides the runtime
/// (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
pub async fn run_server(config: ServerConfig, store: Arc<dyn RecordStore>) -> std::io::Result<()> {
    let state = web::Data::new(AppState::new(store));
    let static_dir = config.static_dir.clone();

    if let Some(dir) = &static_dir {
        log::info!("Serving frontend from {}", dir.display());
    }
    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();
        let static_dir = static_dir.clone();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure_api)
            .configure(move |cfg| {
                if let Some(dir) = static_dir {
                    cfg.service(Files::new("/", dir).index_file("index.html"));
                }
            })
    })
    .bind((config.bind_addr, config.port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test;
    use london_crime_database::memory::MemoryStore;
    use london_crime_database_models::IncidentRecord;

    use super::*;

    fn record(period: &str, area: &str, group: &str, subgroup: &str, count: u64) -> IncidentRecord {
        IncidentRecord {
            period: period.to_string(),
            area_type: "Borough".to_string(),
            area_name: area.to_string(),
            offence_group: group.to_string(),
            offence_subgroup: subgroup.to_string(),
            count,
        }
    }

    fn state() -> web::Data<AppState> {
        let store = MemoryStore::new(vec![
            record("2025-05", "Tower Hamlets", "Theft", "Shoplifting", 80),
            record("2025-06", "Tower Hamlets", "Theft", "Shoplifting", 100),
            record("2025-06", "Westminster", "Theft", "Shoplifting", 300),
            record("2025-06", "Westminster", "Nfib Fraud", "Nfib Fraud", 2),
        ]);
        web::Data::new(AppState::new(Arc::new(store)))
    }

    macro_rules! app {
        () => {
            test::init_service(App::new().app_data(state()).configure(configure_api)).await
        };
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let app = app!();
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["healthy"], true);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn snapshot_summary() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/summary/?start_date=2025-06&end_date=2025-06&borough=Tower%20Hamlets&area_type=")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total_offences"], 100);
        assert_eq!(body["one_month_change_pct"], 25.0);
        assert!(body["twelve_month_change_pct"].is_null());
        assert_eq!(body["latest_month"], "2025-06");
    }

    #[actix_web::test]
    async fn offence_groups_hide_fraud() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/offence-groups/")
            .to_request();
        let body: Vec<String> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, ["Theft"]);
    }

    #[actix_web::test]
    async fn ranking_for_postcode() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/borough-ranking/?postcode=e1%206an&offence_group=OVERALL")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["borough"], "Tower Hamlets");
        assert_eq!(body["rank"], 2);
        assert_eq!(body["total_boroughs"], 2);
        assert_eq!(body["offence_group"], "Overall");
        assert_eq!(body["period"], "2025-05 to 2025-06");
        assert_eq!(body["all_boroughs"][1]["is_user_borough"], true);
    }

    #[actix_web::test]
    async fn ranking_misses_map_to_status_codes() {
        let app = app!();

        let req = test::TestRequest::get()
            .uri("/api/borough-ranking/")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri("/api/borough-ranking/?postcode=ZZ1%201ZZ")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri("/api/borough-ranking/?postcode=N1%209GU")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(
            body["error"],
            "No crime data found for Islington in the category \"Overall\"."
        );
    }

    #[actix_web::test]
    async fn breakdown_switches_to_subgroups() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/offence-breakdown/?offence_group=Theft")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body[0]["label"], "Shoplifting");
        assert_eq!(body[0]["total_count"], 480);
    }
}
