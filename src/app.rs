use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::handlers::{protected, public};
use crate::middleware::{session_auth_middleware, validate_user_middleware};
use crate::state::AppState;

/// Full application router with global layers applied
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let mut router = Router::new()
        .merge(public_routes())
        .merge(protected_routes(state.clone()))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if config.security.enable_cors {
        router = router.layer(cors_layer(&config));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/auth/callback", get(public::auth_callback))
}

/// `/api/*`: session authentication (401) wraps role resolution (403)
fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(auth_routes())
        .merge(resource_routes())
        .merge(service_routes())
        .merge(booking_routes())
        .route_layer(from_fn_with_state(state.clone(), validate_user_middleware))
        .route_layer(from_fn_with_state(state, session_auth_middleware))
}

fn auth_routes() -> Router<AppState> {
    use protected::{auth, profile};

    Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/password", post(auth::password))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/profile", get(profile::get).put(profile::update))
}

fn resource_routes() -> Router<AppState> {
    use protected::{clients, fields, pets, sites, staff, users, vehicles};

    Router::new()
        .route("/api/sites", get(sites::list).post(sites::create))
        .route(
            "/api/sites/:id",
            get(sites::get).patch(sites::update).delete(sites::delete),
        )
        .route("/api/fields", get(fields::list).post(fields::create))
        .route(
            "/api/fields/:id",
            get(fields::get).patch(fields::update).delete(fields::delete),
        )
        .route("/api/vehicles", get(vehicles::list).post(vehicles::create))
        .route(
            "/api/vehicles/:id",
            get(vehicles::get).patch(vehicles::update).delete(vehicles::delete),
        )
        .route("/api/staff", get(staff::list).post(staff::create))
        .route(
            "/api/staff/:id",
            get(staff::get).patch(staff::update).delete(staff::delete),
        )
        .route("/api/users", get(users::list))
        .route("/api/users/:id", get(users::get).patch(users::update))
        .route("/api/clients", get(clients::list).post(clients::create))
        .route("/api/clients/:id", get(clients::get).patch(clients::update))
        .route("/api/pets", get(pets::list).post(pets::create))
        .route(
            "/api/pets/:id",
            get(pets::get).patch(pets::update).delete(pets::delete),
        )
}

fn service_routes() -> Router<AppState> {
    use protected::services;

    Router::new()
        .route("/api/services", get(services::list).post(services::create))
        .route(
            "/api/services/:id",
            get(services::get).patch(services::update).delete(services::delete),
        )
        .route(
            "/api/services/:id/availability",
            get(services::list_availability).post(services::create_availability),
        )
        .route("/api/services/:id/slots", get(services::slots))
        .route(
            "/api/service-availability/:id",
            delete(services::delete_availability),
        )
}

fn booking_routes() -> Router<AppState> {
    use protected::bookings;

    Router::new()
        .route("/api/bookings", get(bookings::list).post(bookings::create))
        .route(
            "/api/bookings/:id",
            get(bookings::get).patch(bookings::update).delete(bookings::delete),
        )
        .route("/api/my-bookings", get(bookings::mine))
}

/// Cookie sessions need credentialed CORS, which rules out wildcard origins
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
}
