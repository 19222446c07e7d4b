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

pub use service::ReviewService;

pub struct ReviewsModule {
    service: Arc<ReviewService>,
    keys: Arc<JwtKeys>,
}

impl ReviewsModule {
    pub fn new(service: Arc<ReviewService>, keys: Arc<JwtKeys>) -> Self {
        Self { service, keys }
    }
}

#[async_trait]
impl Module for ReviewsModule {
    fn name(&self) -> &'static str {
        "reviews"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "reviews module initialized");
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.service.clone(), self.keys.clone())
    }

    fn openapi(&self) -> Option<Value> {
        let secured = json!([{ "bearerAuth": [] }]);
        let id_param = json!([{
            "name": "id", "in": "path", "required": true, "schema": { "type": "string" }
        }]);
        let review = json!({
            "application/json": { "schema": { "$ref": "#/components/schemas/Review" } }
        });
        let error = json!({
            "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } }
        });

        Some(json!({
            "paths": {
                "/": {
                    "post": {
                        "summary": "Review a book as the authenticated user",
                        "tags": ["Reviews"],
                        "security": secured,
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/CreateReview" }
                                }
                            }
                        },
                        "responses": {
                            "201": { "description": "Created review", "content": review },
                            "400": { "description": "Malformed bookId or rating out of range", "content": error }
                        }
                    }
                },
                "/book/{bookId}": {
                    "get": {
                        "summary": "Reviews of a book, newest first",
                        "tags": ["Reviews"],
                        "security": secured,
                        "parameters": [{
                            "name": "bookId", "in": "path", "required": true, "schema": { "type": "string" }
                        }],
                        "responses": {
                            "200": {
                                "description": "Reviews",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Review" }
                                        }
                                    }
                                }
                            },
                            "400": { "description": "Malformed bookId", "content": error }
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get a review",
                        "tags": ["Reviews"],
                        "security": secured,
                        "parameters": id_param,
                        "responses": {
                            "200": { "description": "Review", "content": review },
                            "404": { "description": "Review not found", "content": error }
                        }
                    },
                    "put": {
                        "summary": "Update a review",
                        "tags": ["Reviews"],
                        "security": secured,
                        "parameters": id_param,
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/UpdateReview" }
                                }
                            }
                        },
                        "responses": {
                            "200": { "description": "Updated review", "content": review },
                            "403": { "description": "Not the author or an admin", "content": error },
                            "404": { "description": "Review not found", "content": error }
                        }
                    },
                    "delete": {
                        "summary": "Delete a review",
                        "tags": ["Reviews"],
                        "security": secured,
                        "parameters": id_param,
                        "responses": {
                            "200": {
                                "description": "Deletion confirmation",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": {
                                                "message": { "type": "string" },
                                                "id": { "type": "string" }
                                            }
                                        }
                                    }
                                }
                            },
                            "403": { "description": "Not the author or an admin", "content": error },
                            "404": { "description": "Review not found", "content": error }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Review": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "bookId": { "type": "string" },
                            "userId": { "type": "string" },
                            "rating": { "type": "integer", "minimum": 1, "maximum": 5 },
                            "title": { "type": "string", "nullable": true },
                            "content": { "type": "string", "nullable": true },
                            "createdAt": { "type": "string", "format": "date-time" },
                            "updatedAt": { "type": "string", "format": "date-time" }
                        },
                        "required": ["id", "bookId", "userId", "rating"]
                    },
                    "CreateReview": {
                        "type": "object",
                        "properties": {
                            "bookId": { "type": "string" },
                            "rating": { "type": "integer", "minimum": 1, "maximum": 5 },
                            "title": { "type": "string" },
                            "content": { "type": "string" }
                        },
                        "required": ["bookId", "rating"]
                    },
                    "UpdateReview": {
                        "type": "object",
                        "properties": {
                            "rating": { "type": "integer", "minimum": 1, "maximum": 5 },
                            "title": { "type": "string" },
                            "content": { "type": "string" }
                        }
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration::index(
            "book_recent",
            store::COLLECTION,
            &[("bookId", 1), ("createdAt", -1)],
        )]
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "reviews module stopped");
        Ok(())
    }
}

pub fn create_module(service: Arc<ReviewService>, keys: Arc<JwtKeys>) -> Arc<dyn Module> {
    Arc::new(ReviewsModule::new(service, keys))
}
