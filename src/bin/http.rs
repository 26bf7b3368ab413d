#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use timetable::{AppConfig, LectureCatalog, ScheduleStore, http_api, seed, telemetry};

    let config = AppConfig::from_env()?;
    telemetry::init(&config.log_filter);

    let catalog = LectureCatalog::from_shared(config.lecture_source()?);
    let store = ScheduleStore::new(seed::demo_schedule_map());
    tracing::info!(catalog = ?config.catalog, "starting timetable HTTP API");

    println!("timetable HTTP API listening on http://{}", config.http_addr);
    http_api::serve(config.http_addr, http_api::AppState::new(store, catalog)).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
