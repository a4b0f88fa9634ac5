//! Demo blog server
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /:resource` - List, narrowed by the visitor's rules
//! - `POST /:resource` - Create
//! - `GET /:resource/:id` - Read
//! - `PUT|PATCH /:resource/:id` - Update
//! - `DELETE /:resource/:id` - Destroy
//!
//! The visitor comes from the `x-user-id` header; requests without it are
//! guests. Denied guests are redirected to `/login`, denied members get a
//! `403`. Every request builds exactly one [`Ability`].

pub mod fixtures;

pub use fixtures::{blog_ability, Article, Fixtures, User, Visitor};

use crate::ability::Ability;
use crate::error::{AuthzError, Result};
use crate::load::{load_and_authorize, InMemoryLoader, Loaded, Verb};
use crate::registry::ResourceRegistry;
use crate::types::{AuthorizeOptions, Instance, ResourceType};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode},
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{debug, info, Level};

/// Header carrying the id of the requesting user
pub const USER_HEADER: &str = "x-user-id";

/// Where denied guests are sent
pub const LOGIN_PATH: &str = "/login";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    loader: InMemoryLoader,
    registry: Arc<ResourceRegistry>,
    users: Arc<HashMap<u64, User>>,
    next_id: Arc<AtomicU64>,
    start_time: Instant,
}

impl AppState {
    /// Build the state from users and resources
    pub fn from_fixtures(fixtures: Fixtures) -> Result<Self> {
        let mut registry = ResourceRegistry::new();
        registry.register_type::<Article>("articles")?;

        let next_id = fixtures.next_id();
        let resource_count = fixtures.resources.len();
        let users: HashMap<u64, User> = fixtures
            .users
            .into_iter()
            .map(|user| (user.id, user))
            .collect();

        info!(
            "Loaded {} users and {} resources",
            users.len(),
            resource_count
        );

        Ok(Self {
            loader: InMemoryLoader::with_instances(fixtures.resources),
            registry: Arc::new(registry),
            users: Arc::new(users),
            next_id: Arc::new(AtomicU64::new(next_id)),
            start_time: Instant::now(),
        })
    }

    pub fn loader(&self) -> &InMemoryLoader {
        &self.loader
    }

    fn visitor(&self, headers: &HeaderMap) -> Result<Visitor> {
        let Some(raw) = headers.get(USER_HEADER) else {
            return Ok(Visitor::Guest);
        };

        let id: u64 = raw
            .to_str()
            .ok()
            .and_then(|value| value.trim().parse().ok())
            .ok_or_else(|| AuthzError::InvalidInput(format!("invalid {} header", USER_HEADER)))?;

        match self.users.get(&id) {
            Some(user) => Ok(Visitor::Member(user.clone())),
            None => {
                debug!("Unknown user {}, treating as guest", id);
                Ok(Visitor::Guest)
            }
        }
    }

    fn ability(&self, headers: &HeaderMap) -> Result<Ability<Visitor>> {
        Ability::build(self.visitor(headers)?, &blog_ability)
    }

    fn resource_type(&self, route: &str) -> Result<ResourceType> {
        self.registry
            .resolve(route)
            .cloned()
            .ok_or_else(|| AuthzError::InvalidInput(format!("unknown resource `{}`", route)))
    }
}

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    uptime_seconds: u64,
    version: String,
}

fn options_for(visitor: &Visitor) -> AuthorizeOptions {
    match visitor {
        Visitor::Guest => AuthorizeOptions::new().redirect_to(LOGIN_PATH),
        Visitor::Member(_) => AuthorizeOptions::default(),
    }
}

/// Build the visitor's ability and run `load_and_authorize`
async fn load(
    state: &AppState,
    method: &Method,
    headers: &HeaderMap,
    route: &str,
    id: Option<&str>,
) -> Result<(Ability<Visitor>, Loaded)> {
    let ability = state.ability(headers)?;
    let resource_type = state.resource_type(route)?;
    let options = options_for(ability.actor());

    let loaded = load_and_authorize(
        &ability,
        &state.loader,
        &Verb::from(method),
        &resource_type,
        id,
        options,
    )
    .await?;

    Ok((ability, loaded))
}

async fn load_member(
    state: &AppState,
    method: &Method,
    headers: &HeaderMap,
    route: &str,
    id: &str,
) -> Result<Instance> {
    let (_, loaded) = load(state, method, headers, route, Some(id)).await?;
    loaded
        .into_member()
        .ok_or_else(|| AuthzError::Loader("expected a single resource".to_string()))
}

/// GET /:resource
async fn list_resources(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    Path(route): Path<String>,
) -> Result<Json<Vec<Instance>>> {
    let (_, loaded) = load(&state, &method, &headers, &route, None).await?;
    Ok(Json(loaded.into_collection().unwrap_or_default()))
}

/// POST /:resource
async fn create_resource(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    Path(route): Path<String>,
    Json(mut attributes): Json<Map<String, Value>>,
) -> Result<(StatusCode, Json<Instance>)> {
    let (ability, loaded) = load(&state, &method, &headers, &route, None).await?;
    let Loaded::Type(resource_type) = loaded else {
        return Err(AuthzError::Loader("expected a resource type".to_string()));
    };

    attributes.remove("id");
    if let Some(user) = ability.actor().user() {
        attributes.insert("owner_id".to_string(), json!(user.id));
    }

    // Fixture ids may already occupy the counter's next values
    loop {
        let id = state.next_id.fetch_add(1, Ordering::SeqCst);
        let instance = Instance {
            resource_type: resource_type.clone(),
            id: json!(id),
            attributes: attributes.clone(),
        };

        if state.loader.create(instance.clone()).await {
            info!("Created {} {}", instance.resource_type, id);
            return Ok((StatusCode::CREATED, Json(instance)));
        }

        debug!("{} {} already exists, skipping id", resource_type, id);
    }
}

/// GET /:resource/:id
async fn show_resource(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    Path((route, id)): Path<(String, String)>,
) -> Result<Json<Instance>> {
    let instance = load_member(&state, &method, &headers, &route, &id).await?;
    Ok(Json(instance))
}

/// PUT|PATCH /:resource/:id
async fn update_resource(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    Path((route, id)): Path<(String, String)>,
    Json(changes): Json<Map<String, Value>>,
) -> Result<Json<Instance>> {
    let loaded = load_member(&state, &method, &headers, &route, &id).await?;

    let updated = state
        .loader
        .update(&loaded.resource_type, &id, |instance| {
            for (key, value) in changes {
                if key != "id" {
                    instance.attributes.insert(key, value);
                }
            }
        })
        .await
        .ok_or_else(|| AuthzError::not_found(loaded.resource_type.clone(), id.as_str()))?;

    info!("Updated {} {}", updated.resource_type, id);
    Ok(Json(updated))
}

/// DELETE /:resource/:id
async fn delete_resource(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    Path((route, id)): Path<(String, String)>,
) -> Result<StatusCode> {
    let instance = load_member(&state, &method, &headers, &route, &id).await?;

    if state.loader.remove(&instance.resource_type, &id).await.is_none() {
        return Err(AuthzError::not_found(instance.resource_type, id));
    }
    info!("Deleted {} {}", instance.resource_type, id);

    Ok(StatusCode::NO_CONTENT)
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        version: crate::VERSION.to_string(),
    })
}

/// Create the HTTP router with all endpoints
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace = TraceLayer::new_for_http()
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(health_check))
        .route("/:resource", get(list_resources).post(create_resource))
        .route(
            "/:resource/:id",
            get(show_resource)
                .put(update_resource)
                .patch(update_resource)
                .delete(delete_resource),
        )
        .layer(ServiceBuilder::new().layer(trace).layer(cors))
        .with_state(state)
}
