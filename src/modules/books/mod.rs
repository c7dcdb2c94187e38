pub mod error;
pub mod library;
pub mod models;
pub mod notice;
pub mod routes;
pub mod storage;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use catalog_kernel::{settings::Settings, InitCtx, Module};
use tokio::sync::Mutex;

pub use error::{LibraryError, LibraryResult, StorageError};
pub use library::{AddOutcome, Library, DEFAULT_LIBRARY_NAME};
pub use models::{Book, BookRecord, NewBook, QuantityInput};
pub use notice::Notice;
pub use routes::SharedLibrary;
pub use storage::{FileSlotStore, MemorySlotStore, SlotStore};

/// Books module: owns the catalog and serves it under `/api/books`
pub struct BooksModule {
    library: SharedLibrary,
}

impl BooksModule {
    pub fn new(library: Library) -> Self {
        Self {
            library: Arc::new(Mutex::new(library)),
        }
    }

    /// Restore the catalog from the configured data directory.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self::new(open_library(settings)?))
    }

    pub fn library(&self) -> SharedLibrary {
        self.library.clone()
    }
}

/// Restore the library that the settings point at.
pub fn open_library(settings: &Settings) -> anyhow::Result<Library> {
    let store = FileSlotStore::new(&settings.storage.data_dir);
    Library::restore(settings.library.name.as_deref(), store).map_err(|e| {
        anyhow::Error::new(e).context(format!(
            "failed to restore catalog from {}",
            settings.storage.data_dir.display()
        ))
    })
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let library = self.library.lock().await;
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            library = library.name(),
            books = library.len(),
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.library.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error_response = |description: &str| {
            serde_json::json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };
        let book_response = |description: &str| {
            serde_json::json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/BookResponse" }
                    }
                }
            })
        };
        let isbn_param = serde_json::json!([{
            "name": "isbn",
            "in": "path",
            "required": true,
            "schema": { "type": "string" }
        }]);

        Some(serde_json::json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List or search books",
                        "tags": ["Books"],
                        "parameters": [{
                            "name": "q",
                            "in": "query",
                            "required": false,
                            "description": "Case-insensitive match on title, author, ISBN or genre",
                            "schema": { "type": "string" }
                        }],
                        "responses": {
                            "200": {
                                "description": "Books in insertion order",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Book" }
                                        }
                                    }
                                }
                            }
                        }
                    },
                    "post": {
                        "summary": "Add a book, or add stock to an existing ISBN",
                        "tags": ["Books"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/NewBook" }
                                }
                            }
                        },
                        "responses": {
                            "201": book_response("Book added"),
                            "200": book_response("Quantity of an existing book increased"),
                            "400": error_response("Body is not JSON"),
                            "422": error_response("Title, author or ISBN missing, or quantity below 1")
                        }
                    }
                },
                "/{isbn}": {
                    "get": {
                        "summary": "Find a book by ISBN",
                        "tags": ["Books"],
                        "parameters": isbn_param.clone(),
                        "responses": {
                            "200": {
                                "description": "The book",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            },
                            "404": error_response("Unknown ISBN")
                        }
                    },
                    "delete": {
                        "summary": "Remove a book",
                        "tags": ["Books"],
                        "parameters": isbn_param.clone(),
                        "responses": {
                            "200": book_response("Book removed"),
                            "404": error_response("Unknown ISBN")
                        }
                    }
                },
                "/{isbn}/borrow": {
                    "post": {
                        "summary": "Borrow one copy",
                        "tags": ["Books"],
                        "parameters": isbn_param.clone(),
                        "responses": {
                            "200": book_response("Copy borrowed"),
                            "404": error_response("Unknown ISBN"),
                            "409": error_response("No copies available")
                        }
                    }
                },
                "/{isbn}/return": {
                    "post": {
                        "summary": "Return one copy",
                        "tags": ["Books"],
                        "parameters": isbn_param,
                        "responses": {
                            "200": book_response("Copy returned"),
                            "404": error_response("Unknown ISBN"),
                            "409": error_response("No copies are borrowed")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "isbn": { "type": "string", "description": "Unique catalog key" },
                            "publicationYear": { "type": "string", "description": "\"N/A\" when unknown" },
                            "genre": { "type": "string", "description": "\"N/A\" when unknown" },
                            "quantity": { "type": "integer", "minimum": 1 },
                            "borrowedCopies": { "type": "integer", "minimum": 0 },
                            "availableCopies": { "type": "integer", "minimum": 0 }
                        },
                        "required": [
                            "title", "author", "isbn", "publicationYear", "genre",
                            "quantity", "borrowedCopies", "availableCopies"
                        ]
                    },
                    "NewBook": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "isbn": { "type": "string" },
                            "publicationYear": {
                                "oneOf": [{ "type": "string" }, { "type": "integer" }]
                            },
                            "genre": { "type": "string" },
                            "quantity": {
                                "description": "Number or numeric text that reads as at least 1",
                                "oneOf": [{ "type": "integer" }, { "type": "string" }]
                            }
                        },
                        "required": ["title", "author", "isbn"]
                    },
                    "Notice": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "message": { "type": "string" }
                        },
                        "required": ["title", "message"]
                    },
                    "BookResponse": {
                        "type": "object",
                        "properties": {
                            "notice": { "$ref": "#/components/schemas/Notice" },
                            "book": { "$ref": "#/components/schemas/Book" }
                        },
                        "required": ["notice", "book"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        // Changes are saved as they happen; this retries after an earlier failed save
        let mut library = self.library.lock().await;
        if library.has_unsaved_changes() {
            library
                .persist()
                .map_err(|e| anyhow::Error::new(e).context("failed to save catalog on shutdown"))?;
        }
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create the books module from settings
pub fn create_module(settings: &Settings) -> anyhow::Result<Arc<dyn Module>> {
    Ok(Arc::new(BooksModule::from_settings(settings)?))
}
