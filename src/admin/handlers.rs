use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::admin::registry::{ModuleInfo, ModuleRegistry};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

/// Routes mounted under `/admin` when enabled.
pub fn router(registry: ModuleRegistry) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/modules", get(get_modules))
        .with_state(registry)
}

pub async fn get_status() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

pub async fn get_modules(State(registry): State<ModuleRegistry>) -> Json<Vec<ModuleInfo>> {
    Json(registry.modules())
}
