pub mod models;
pub mod routes;
pub mod service;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use serde_json::{json, Value};

use shelf_authz::JwtKeys;
use shelf_kernel::{InitCtx, Migration, Module};

pub use service::BookService;

/// Book catalog keyed by title
pub struct BooksModule {
    service: Arc<BookService>,
    keys: Arc<JwtKeys>,
}

impl BooksModule {
    pub fn new(service: Arc<BookService>, keys: Arc<JwtKeys>) -> Self {
        Self { service, keys }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ctx.settings.environment.as_str(),
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.service.clone(), self.keys.clone())
    }

    fn openapi(&self) -> Option<Value> {
        let secured = json!([{ "bearerAuth": [] }]);
        let title_param = json!([{
            "name": "title",
            "in": "path",
            "required": true,
            "schema": { "type": "string" }
        }]);
        let book = json!({
            "application/json": { "schema": { "$ref": "#/components/schemas/Book" } }
        });
        let error = json!({
            "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } }
        });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "security": secured,
                        "responses": {
                            "200": {
                                "description": "List of books",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Book" }
                                        }
                                    }
                                }
                            },
                            "401": { "description": "Missing or invalid token", "content": error }
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "security": secured,
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/CreateBook" }
                                }
                            }
                        },
                        "responses": {
                            "201": { "description": "Created book", "content": book },
                            "400": { "description": "Book already exists or title missing", "content": error },
                            "403": { "description": "Admin role required", "content": error }
                        }
                    }
                },
                "/{title}": {
                    "get": {
                        "summary": "Get a book by title",
                        "tags": ["Books"],
                        "security": secured,
                        "parameters": title_param,
                        "responses": {
                            "200": { "description": "Book", "content": book },
                            "404": { "description": "Book not found", "content": error }
                        }
                    },
                    "put": {
                        "summary": "Update a book",
                        "tags": ["Books"],
                        "security": secured,
                        "parameters": title_param,
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/UpdateBook" }
                                }
                            }
                        },
                        "responses": {
                            "200": { "description": "Updated book", "content": book },
                            "403": { "description": "Admin role required", "content": error },
                            "404": { "description": "Book not found", "content": error }
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "security": secured,
                        "parameters": title_param,
                        "responses": {
                            "200": {
                                "description": "Deletion confirmation",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": {
                                                "bookDeleted": { "type": "boolean" },
                                                "message": { "type": "string" }
                                            }
                                        }
                                    }
                                }
                            },
                            "403": { "description": "Admin role required", "content": error },
                            "404": { "description": "Book not found", "content": error }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "title": { "type": "string" },
                            "authors": { "type": "array", "items": { "type": "string" } },
                            "publisher": { "type": "string", "nullable": true },
                            "publishedDate": { "type": "string", "format": "date", "nullable": true },
                            "categories": { "type": "array", "items": { "type": "string" } },
                            "createdAt": { "type": "string", "format": "date-time" },
                            "updatedAt": { "type": "string", "format": "date-time" }
                        },
                        "required": ["id", "title", "authors", "categories"]
                    },
                    "CreateBook": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "authors": { "type": "array", "items": { "type": "string" } },
                            "publisher": { "type": "string" },
                            "publishedDate": { "type": "string", "format": "date" },
                            "categories": { "type": "array", "items": { "type": "string" } }
                        },
                        "required": ["title"]
                    },
                    "UpdateBook": {
                        "type": "object",
                        "properties": {
                            "authors": { "type": "array", "items": { "type": "string" } },
                            "publisher": { "type": "string" },
                            "publishedDate": { "type": "string", "format": "date" },
                            "categories": { "type": "array", "items": { "type": "string" } }
                        }
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration::unique(
            "title_unique",
            store::COLLECTION,
            &[("title", 1)],
        )]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

pub fn create_module(service: Arc<BookService>, keys: Arc<JwtKeys>) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(service, keys))
}
