//! Machine-readable API description served at `GET /swagger.json`.

use axum::Json;
use serde_json::{Value, json};

use crate::domain::{Priority, TaskStatus};
use crate::infrastructure::query_builder::{DEFAULT_LIMIT, DEFAULT_PAGE};

fn status_literals() -> Vec<&'static str> {
    TaskStatus::ALL.iter().map(|status| status.as_str()).collect()
}

fn priority_literals() -> Vec<&'static str> {
    Priority::ALL.iter().map(|priority| priority.as_str()).collect()
}

fn schema_ref(name: &str) -> Value {
    json!({ "$ref": format!("#/components/schemas/{name}") })
}

fn json_content(schema: &Value) -> Value {
    json!({ "application/json": { "schema": schema } })
}

fn error_response(description: &str) -> Value {
    json!({ "description": description, "content": json_content(&schema_ref("Error")) })
}

fn id_parameter() -> Value {
    json!({
        "in": "path",
        "name": "id",
        "required": true,
        "schema": { "type": "integer" },
        "description": "Task ID"
    })
}

fn filter_parameters() -> Vec<Value> {
    vec![
        json!({
            "in": "query",
            "name": "status",
            "schema": { "type": "string", "enum": status_literals() },
            "description": "Filter by status"
        }),
        json!({
            "in": "query",
            "name": "priority",
            "schema": { "type": "string", "enum": priority_literals() },
            "description": "Filter by priority"
        }),
    ]
}

fn components() -> Value {
    json!({
        "schemas": {
            "Task": {
                "type": "object",
                "properties": {
                    "id": { "type": "integer", "example": 1 },
                    "name": { "type": "string", "example": "Buy milk" },
                    "due_date": { "type": "string", "format": "date", "nullable": true, "example": "2025-07-25" },
                    "status": { "type": "string", "enum": status_literals(), "example": TaskStatus::default().as_str() },
                    "priority": { "type": "string", "enum": priority_literals(), "example": Priority::Red.as_str() },
                    "created_at": { "type": "string", "format": "date-time" },
                    "updated_at": { "type": "string", "format": "date-time" },
                    "is_active": { "type": "boolean", "example": true }
                }
            },
            "TaskCreate": {
                "type": "object",
                "required": ["name"],
                "properties": {
                    "name": { "type": "string", "example": "Buy milk" },
                    "due_date": { "type": "string", "format": "date", "example": "2025-07-25" },
                    "status": { "type": "string", "enum": status_literals(), "default": TaskStatus::default().as_str() },
                    "priority": { "type": "string", "enum": priority_literals(), "default": Priority::default().as_str() }
                }
            },
            "TaskUpdate": {
                "type": "object",
                "description": "At least one field is required. A null due_date clears it.",
                "properties": {
                    "name": { "type": "string", "example": "Buy oat milk" },
                    "due_date": { "type": "string", "format": "date", "nullable": true },
                    "status": { "type": "string", "enum": status_literals() },
                    "priority": { "type": "string", "enum": priority_literals() }
                }
            },
            "Pagination": {
                "type": "object",
                "properties": {
                    "page": { "type": "integer", "example": 1 },
                    "limit": { "type": "integer", "example": 10 },
                    "totalTasks": { "type": "integer", "example": 25 },
                    "totalPages": { "type": "integer", "example": 3 },
                    "hasNext": { "type": "boolean", "example": true },
                    "hasPrev": { "type": "boolean", "example": false }
                }
            },
            "Error": {
                "type": "object",
                "properties": {
                    "error": { "type": "string", "example": "Task not found" },
                    "code": {
                        "type": "string",
                        "enum": ["VALIDATION_ERROR", "NOT_FOUND", "METHOD_NOT_ALLOWED", "INTERNAL_ERROR"]
                    }
                }
            }
        }
    })
}

fn paths() -> Value {
    let task = schema_ref("Task");
    let message = json!({ "type": "string" });

    let mut list_parameters = vec![
        json!({ "in": "query", "name": "page", "schema": { "type": "integer", "default": DEFAULT_PAGE } }),
        json!({ "in": "query", "name": "limit", "schema": { "type": "integer", "default": DEFAULT_LIMIT } }),
    ];
    list_parameters.extend(filter_parameters());
    list_parameters.push(json!({
        "in": "query",
        "name": "search",
        "schema": { "type": "string" },
        "description": "Case-insensitive substring of the task name"
    }));

    json!({
        "/tasks": {
            "get": {
                "summary": "List tasks with pagination, filtering and search",
                "tags": ["Tasks"],
                "parameters": list_parameters,
                "responses": {
                    "200": {
                        "description": "A page of tasks",
                        "content": json_content(&json!({
                            "type": "object",
                            "properties": {
                                "tasks": { "type": "array", "items": task },
                                "pagination": schema_ref("Pagination")
                            }
                        }))
                    },
                    "400": error_response("Invalid filter value"),
                    "500": error_response("Internal server error")
                }
            },
            "post": {
                "summary": "Create a task",
                "tags": ["Tasks"],
                "requestBody": { "required": true, "content": json_content(&schema_ref("TaskCreate")) },
                "responses": {
                    "201": {
                        "description": "Task created successfully",
                        "content": json_content(&json!({
                            "type": "object",
                            "properties": { "message": message, "task": task }
                        }))
                    },
                    "400": error_response("Validation error"),
                    "500": error_response("Internal server error")
                }
            }
        },
        "/tasks/export": {
            "get": {
                "summary": "Export every matching task",
                "tags": ["Tasks"],
                "parameters": filter_parameters(),
                "responses": {
                    "200": {
                        "description": "All matching tasks",
                        "content": json_content(&json!({
                            "type": "object",
                            "properties": {
                                "tasks": { "type": "array", "items": task },
                                "total": { "type": "integer" }
                            }
                        }))
                    },
                    "400": error_response("Invalid filter value"),
                    "500": error_response("Internal server error")
                }
            }
        },
        "/tasks/{id}": {
            "get": {
                "summary": "Get a single task by ID",
                "tags": ["Tasks"],
                "parameters": [id_parameter()],
                "responses": {
                    "200": {
                        "description": "Task details",
                        "content": json_content(&json!({ "type": "object", "properties": { "task": task } }))
                    },
                    "400": error_response("Invalid task ID"),
                    "404": error_response("Task not found"),
                    "500": error_response("Internal server error")
                }
            },
            "put": {
                "summary": "Update a task",
                "tags": ["Tasks"],
                "parameters": [id_parameter()],
                "requestBody": { "required": true, "content": json_content(&schema_ref("TaskUpdate")) },
                "responses": {
                    "200": {
                        "description": "Task updated successfully",
                        "content": json_content(&json!({
                            "type": "object",
                            "properties": { "message": message, "task": task }
                        }))
                    },
                    "400": error_response("Validation error"),
                    "404": error_response("Task not found"),
                    "500": error_response("Internal server error")
                }
            },
            "delete": {
                "summary": "Delete a task (soft delete)",
                "tags": ["Tasks"],
                "parameters": [id_parameter()],
                "responses": {
                    "200": {
                        "description": "Task deleted successfully",
                        "content": json_content(&json!({ "type": "object", "properties": { "message": message } }))
                    },
                    "400": error_response("Invalid task ID"),
                    "404": error_response("Task not found"),
                    "500": error_response("Internal server error")
                }
            }
        },
        "/health": {
            "get": {
                "summary": "Service and database health",
                "tags": ["Health"],
                "responses": {
                    "200": { "description": "Service is healthy" },
                    "500": { "description": "Database connection failed" }
                }
            }
        }
    })
}

/// Builds the OpenAPI 3.0 document.
#[must_use]
pub fn api_document() -> Value {
    json!({
        "openapi": "3.0.0",
        "info": {
            "title": "Todo Task API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "CRUD API for todo tasks with pagination, filtering, search and soft delete"
        },
        "servers": [{ "url": "/", "description": "This server" }],
        "paths": paths(),
        "components": components()
    })
}

/// `GET /swagger.json`
pub async fn swagger_document() -> Json<Value> {
    Json(api_document())
}
