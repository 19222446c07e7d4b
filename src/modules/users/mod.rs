pub mod models;
pub mod routes;
pub mod service;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use serde_json::{json, Value};

use shelf_kernel::{InitCtx, Migration, Module};

pub use service::UserService;

/// Accounts, login and the user administration routes.
pub struct UsersModule {
    service: Arc<UserService>,
}

impl UsersModule {
    pub fn new(service: Arc<UserService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Module for UsersModule {
    fn name(&self) -> &'static str {
        "users"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = %ctx.settings.environment.as_str(),
            token_ttl_minutes = ctx.settings.auth.token_ttl_minutes,
            "users module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.service.clone())
    }

    fn openapi(&self) -> Option<Value> {
        Some(openapi())
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![
            Migration::unique("email_unique", store::COLLECTION, &[("email", 1)]),
            Migration::unique("username_unique", store::COLLECTION, &[("username", 1)]),
        ]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "users module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "users module stopped");
        Ok(())
    }
}

fn error_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn user_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/User" }
            }
        }
    })
}

fn json_body(schema: &str) -> Value {
    json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": format!("#/components/schemas/{schema}") }
            }
        }
    })
}

fn email_param() -> Value {
    json!([{
        "name": "email",
        "in": "path",
        "required": true,
        "schema": { "type": "string" }
    }])
}

fn openapi() -> Value {
    let secured = json!([{ "bearerAuth": [] }]);

    json!({
        "paths": {
            "/register": {
                "post": {
                    "summary": "Register a reader account",
                    "tags": ["Users"],
                    "requestBody": json_body("CreateUser"),
                    "responses": {
                        "201": user_response("Registered user"),
                        "400": error_response("Invalid input or duplicate email/username")
                    }
                }
            },
            "/login": {
                "post": {
                    "summary": "Exchange credentials for a bearer token",
                    "tags": ["Users"],
                    "requestBody": json_body("LoginRequest"),
                    "responses": {
                        "200": {
                            "description": "Signed token",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": { "token": { "type": "string" } },
                                        "required": ["token"]
                                    }
                                }
                            }
                        },
                        "401": error_response("Invalid credentials")
                    }
                }
            },
            "/": {
                "get": {
                    "summary": "List users",
                    "tags": ["Users"],
                    "security": secured,
                    "responses": {
                        "200": {
                            "description": "All users",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": { "$ref": "#/components/schemas/User" }
                                    }
                                }
                            }
                        },
                        "401": error_response("Missing or invalid token"),
                        "403": error_response("Admin role required")
                    }
                },
                "post": {
                    "summary": "Create a user with any role",
                    "tags": ["Users"],
                    "security": secured,
                    "requestBody": json_body("CreateUser"),
                    "responses": {
                        "201": user_response("Created user"),
                        "400": error_response("Invalid input or duplicate email/username"),
                        "403": error_response("Admin role required")
                    }
                }
            },
            "/{email}": {
                "get": {
                    "summary": "Get a user by email",
                    "tags": ["Users"],
                    "security": secured,
                    "parameters": email_param(),
                    "responses": {
                        "200": user_response("User"),
                        "403": error_response("Not the owner or an admin"),
                        "404": error_response("User not found")
                    }
                },
                "put": {
                    "summary": "Update a user",
                    "tags": ["Users"],
                    "security": secured,
                    "parameters": email_param(),
                    "requestBody": json_body("UpdateUser"),
                    "responses": {
                        "200": user_response("Updated user"),
                        "400": error_response("Email or username already taken"),
                        "403": error_response("Not the owner, or a reader changing roles"),
                        "404": error_response("User not found")
                    }
                },
                "delete": {
                    "summary": "Delete a user",
                    "tags": ["Users"],
                    "security": secured,
                    "parameters": email_param(),
                    "responses": {
                        "204": { "description": "Deleted" },
                        "403": error_response("Admin role required"),
                        "404": error_response("User not found")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Role": { "type": "string", "enum": ["reader", "admin"] },
                "User": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string" },
                        "username": { "type": "string" },
                        "email": { "type": "string" },
                        "role": { "$ref": "#/components/schemas/Role" },
                        "createdAt": { "type": "string", "format": "date-time" },
                        "updatedAt": { "type": "string", "format": "date-time" }
                    },
                    "required": ["id", "username", "email", "role"]
                },
                "CreateUser": {
                    "type": "object",
                    "properties": {
                        "username": { "type": "string" },
                        "email": { "type": "string" },
                        "password": { "type": "string" },
                        "role": { "$ref": "#/components/schemas/Role" }
                    },
                    "required": ["username", "email", "password"]
                },
                "UpdateUser": {
                    "type": "object",
                    "properties": {
                        "username": { "type": "string" },
                        "email": { "type": "string" },
                        "password": { "type": "string" },
                        "role": { "$ref": "#/components/schemas/Role" }
                    }
                },
                "LoginRequest": {
                    "type": "object",
                    "properties": {
                        "email": { "type": "string" },
                        "password": { "type": "string" }
                    },
                    "required": ["email", "password"]
                }
            }
        }
    })
}

/// Create the users module around an already wired service.
pub fn create_module(service: Arc<UserService>) -> Arc<dyn Module> {
    Arc::new(UsersModule::new(service))
}
