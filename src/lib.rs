//! Library catalog application
//!
//! Books with copy bookkeeping, a persisted catalog, and an admin registration log,
//! served over HTTP and driven from the CLI.

pub mod modules;
pub mod utils;

/// Re-export commonly used types
pub use modules::*;

use anyhow::Context;
use catalog_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// Boot every module, serve HTTP until shutdown, then stop the modules.
pub async fn run(settings: &Settings) -> anyhow::Result<()> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, settings).context("failed to register modules")?;

    let ctx = InitCtx { settings };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    let served = catalog_http::start_server(&registry, settings).await;

    // Stop modules even when the server failed, then report the first error
    let stopped = registry.stop_modules().await;
    served?;
    stopped
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn settings_in(dir: &TempDir) -> Settings {
        let mut settings = Settings::default();
        settings.storage.data_dir = dir.path().join("data");
        settings.admin.registrations_path = dir.path().join("data").join("users.txt");
        settings
    }

    #[tokio::test]
    async fn full_router_serves_both_modules() {
        let dir = TempDir::new().unwrap();
        let settings = settings_in(&dir);
        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry, &settings).unwrap();
        let app = catalog_http::build_router(&registry, &settings);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/books")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"title":"Dune","author":"Frank Herbert","isbn":"222"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(dir.path().join("data").join("library-books.json").exists());

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/api/admin/users").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::builder().uri("/docs/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let spec: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(spec["paths"]["/api/books/{isbn}/borrow"].is_object());
        assert!(spec["paths"]["/api/books"].is_object());
        assert!(spec["paths"]["/api/admin/users"].is_object());
    }
}
