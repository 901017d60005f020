use axum::{Router, routing::get};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use imgbed_backend::config::AppConfig;
use imgbed_backend::cors::build_cors_layer;
use imgbed_backend::features::health::handler::health_check;
use imgbed_backend::features::upload::github::GithubContentClient;
use imgbed_backend::features::upload::store::ContentStore;
use imgbed_backend::features::upload;
use imgbed_backend::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        imgbed_backend::features::upload::handler::upload_json,
        imgbed_backend::features::upload::handler::upload_form,
        imgbed_backend::features::health::handler::health_check,
    ),
    components(
        schemas(
            imgbed_backend::AppError,
            imgbed_backend::error::JsonErrorBody,
            imgbed_backend::error::FormErrorBody,
            imgbed_backend::features::upload::models::JsonUploadRequest,
            imgbed_backend::features::upload::models::JsonUploadResponse,
            imgbed_backend::features::upload::models::FormUploadResponse,
            imgbed_backend::features::health::handler::HealthResponse,
        )
    ),
    tags(
        (name = "Upload", description = "Upload APIs"),
        (name = "Health", description = "Health APIs"),
    ),
    info(
        title = "Imgbed Backend API",
        version = "0.1.0",
        description = "GitHub 图床后端服务 (Axum)"
    )
)]
pub struct ApiDoc;

/// 等待 SIGINT/SIGTERM，触发优雅关闭。
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("安装 Ctrl+C 信号处理器失败");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("安装 SIGTERM 信号处理器失败")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("接收到退出信号，开始优雅关闭HTTP服务器...");
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "imgbed_backend=info,tower_http=info".into()),
        )
        .init();

    // Load config
    if let Err(e) = AppConfig::init_global() {
        tracing::error!("Config init failed: {}", e);
        std::process::exit(1);
    }
    let config = AppConfig::global();

    if config.github.token.trim().is_empty() {
        // 启动不失败：上传请求会逐次返回配置错误，便于先拉起再补配置
        tracing::warn!("github.token 未配置，上传请求将返回配置错误");
    }
    if config.github.owner.is_empty() || config.github.repo.is_empty() {
        tracing::warn!("github.owner/github.repo 未配置完整");
    }

    // Shared state
    let content_store: Arc<dyn ContentStore> =
        match GithubContentClient::new(config.github.clone()) {
            Ok(c) => Arc::new(c),
            Err(e) => {
                tracing::error!("GitHub client init failed: {}", e);
                std::process::exit(1);
            }
        };
    let app_state = AppState {
        config: Arc::new(config.clone()),
        content_store,
    };

    // Routes
    let api_router = upload::create_upload_router(config);
    let mut app = Router::new()
        .route("/health", get(health_check))
        .nest(&config.api.prefix, api_router)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state);

    // CORS：每个响应都带上契约要求的头部；预检由该层直接应答
    if let Some(cors) = build_cors_layer(&config.cors) {
        app = app.layer(cors);
    }

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Bind address failed {}: {}", addr, e);
            std::process::exit(1);
        });

    tracing::info!("Server: http://{}", addr);
    tracing::info!("Docs: http://{}/docs", addr);
    tracing::info!("Health: http://{}/health", addr);
    tracing::info!("Upload API (JSON): http://{}{}/upload", addr, config.api.prefix);
    tracing::info!("Upload API (form): http://{}{}/v1", addr, config.api.prefix);

    let graceful = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
    if let Err(e) = graceful.await {
        tracing::error!("服务器运行错误: {}", e);
        std::process::exit(1);
    }

    tracing::info!("服务器已优雅关闭");
}
