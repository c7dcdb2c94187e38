pub mod registrations;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    routing::get,
    Form, Json, Router,
};
use catalog_http::error::AppError;
use catalog_kernel::{settings::Settings, InitCtx, Module};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub use registrations::{Registration, RegistrationError, RegistrationLog};

/// Admin module: user registrations, independent of the catalog
pub struct AdminModule {
    log: Arc<RegistrationLog>,
}

impl AdminModule {
    pub fn new(log: RegistrationLog) -> Self {
        Self { log: Arc::new(log) }
    }
}

/// Submitted registration form
#[derive(Debug, Default, Deserialize)]
pub struct RegistrationForm {
    #[serde(rename = "userName", default)]
    pub user_name: String,
    #[serde(rename = "userId", default)]
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisteredResponse {
    pub message: String,
    pub registration: Registration,
}

#[async_trait]
impl Module for AdminModule {
    fn name(&self) -> &'static str {
        "admin"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            log = %self.log.path().display(),
            "admin module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/users", get(list_users).post(register_user))
            .with_state(self.log.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/users": {
                    "get": {
                        "summary": "List registered users",
                        "tags": ["Admin"],
                        "responses": {
                            "200": {
                                "description": "Registrations in the order they were made",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Registration" }
                                        }
                                    }
                                }
                            }
                        }
                    },
                    "post": {
                        "summary": "Register a user",
                        "tags": ["Admin"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/x-www-form-urlencoded": {
                                    "schema": {
                                        "type": "object",
                                        "properties": {
                                            "userName": { "type": "string" },
                                            "userId": { "type": "string" }
                                        },
                                        "required": ["userName", "userId"]
                                    }
                                }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "User registered",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": {
                                                "message": { "type": "string" },
                                                "registration": { "$ref": "#/components/schemas/Registration" }
                                            }
                                        }
                                    }
                                }
                            },
                            "422": {
                                "description": "Name or ID missing",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Registration": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "name": { "type": "string" }
                        },
                        "required": ["id", "name"]
                    }
                }
            }
        }))
    }
}

async fn list_users(
    State(log): State<Arc<RegistrationLog>>,
) -> Result<Json<Vec<Registration>>, AppError> {
    Ok(Json(log.list().await?))
}

async fn register_user(
    State(log): State<Arc<RegistrationLog>>,
    form: Result<Form<RegistrationForm>, FormRejection>,
) -> Result<(StatusCode, Json<RegisteredResponse>), AppError> {
    let Form(form) = form?;
    let registration = log.register(&form.user_name, &form.user_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisteredResponse {
            message: registrations::REGISTERED_MESSAGE.to_string(),
            registration,
        }),
    ))
}

impl From<RegistrationError> for AppError {
    fn from(error: RegistrationError) -> Self {
        match error {
            RegistrationError::Validation(errors) => {
                let message = errors.join(" ");
                AppError::validation(
                    errors.into_iter().map(|e| json!({ "error": e })).collect(),
                    message,
                )
            }
            RegistrationError::Io(e) => {
                AppError::Internal(anyhow::Error::new(e).context("registration log unavailable"))
            }
        }
    }
}

/// Create the admin module from settings
pub fn create_module(settings: &Settings) -> Arc<dyn Module> {
    Arc::new(AdminModule::new(RegistrationLog::new(
        &settings.admin.registrations_path,
    )))
}
