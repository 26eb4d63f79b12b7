use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, HttpServer, web};
use tracing::{info, warn};

use linkflow::analytics::ClickRecorder;
use linkflow::api::{self, AppStartTime};
use linkflow::config;
use linkflow::logging::init_logging;
use linkflow::services::{RedirectFlow, SlugCache};
use linkflow::storage::StorageFactory;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let app_start_time = AppStartTime {
        start_datetime: chrono::Utc::now(),
    };

    dotenvy::dotenv().ok();
    config::init_config();
    let cfg = config::get_config();

    // guard 持有到进程退出，保证缓冲日志写完
    let _log_guard = init_logging(&cfg);

    let storage = StorageFactory::create().await.map_err(|e| {
        std::io::Error::other(format!("Failed to initialize storage: {}", e))
    })?;
    info!("Using storage backend: {}", storage.backend_name());

    // 点击归因：缓冲 + 定时/阈值刷盘
    let recorder = ClickRecorder::new(
        storage.as_click_sink(),
        Duration::from_secs(cfg.analytics.flush_interval),
        cfg.analytics.max_records_before_flush,
    );
    let background_recorder = recorder.clone();
    tokio::spawn(async move {
        background_recorder.start_background_task().await;
    });

    let cache = Arc::new(SlugCache::new(
        cfg.redirect.group_cache_ttl,
        cfg.redirect.group_cache_capacity,
    ));
    let flow = Arc::new(RedirectFlow::new(
        Arc::clone(&storage),
        Arc::clone(&cache),
        recorder.clone(),
    ));

    if cfg.redirect.api_token.is_empty() {
        info!("Tenant API is disabled (redirect.api_token is empty)");
    } else {
        info!("Tenant API available at: /api");
    }

    let cpu_count = cfg.server.cpu_count.min(32);
    let bind_address = format!("{}:{}", cfg.server.host, cfg.server.port);
    warn!("Starting server at http://{}", bind_address);

    let server_storage = Arc::clone(&storage);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(Arc::clone(&server_storage)))
            .app_data(web::Data::new(Arc::clone(&cache)))
            .app_data(web::Data::new(Arc::clone(&flow)))
            .app_data(web::Data::new(app_start_time.clone()))
            .configure(api::configure_routes)
    })
    .workers(cpu_count)
    .bind(bind_address)?
    .run()
    .await?;

    // 退出前把缓冲里的点击记录刷完
    recorder.flush().await;
    info!("Shutdown complete");

    Ok(())
}
