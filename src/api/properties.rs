use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::api::{clamp_limit, AppState};
use crate::auth::AuthUser;
use crate::directory::Role;
use crate::error::{Error, Result};
use crate::registry::Property;

#[derive(Deserialize)]
struct CreatePropertyRequest {
    name: String,
    address: String,
}

#[derive(Deserialize)]
struct ListQuery {
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    offset: Option<usize>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/mine", get(mine))
        .route("/:id", get(get_property))
}

async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreatePropertyRequest>,
) -> Result<Json<Property>> {
    auth.require_role(&[Role::Host])?;
    let mut registry = state.registry.write().await;
    let property = registry.create(auth.id, req.name, req.address).clone();
    Ok(Json(property))
}

async fn mine(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Property>>> {
    auth.require_role(&[Role::Host])?;
    let limit = clamp_limit(query.limit);
    let offset = query.offset.unwrap_or(0);

    let registry = state.registry.read().await;
    let properties = if auth.is_admin() {
        registry.list_all()
    } else {
        registry.list_for_host(auth.id)
    };
    let page: Vec<Property> = properties
        .into_iter()
        .skip(offset)
        .take(limit)
        .cloned()
        .collect();
    Ok(Json(page))
}

async fn get_property(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<u64>,
) -> Result<Json<Property>> {
    let registry = state.registry.read().await;
    let property = registry.get(id)?;
    if property.host != auth.id && !auth.is_admin() {
        return Err(Error::Forbidden(
            "property belongs to another host".to_string(),
        ));
    }
    Ok(Json(property.clone()))
}
