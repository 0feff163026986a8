use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::require_api_key;
use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::handlers::{admin, auth, developers, events, health_check, open_api, tickets};
use crate::state::AppState;

pub fn create_routes(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/connect-wallet", post(auth::connect_wallet));

    let event_routes = Router::new()
        .route("/", get(events::list))
        .route("/:id", get(events::get));

    let ticket_routes = Router::new()
        .route("/purchase", post(tickets::purchase))
        .route("/my-tickets", get(tickets::my_tickets))
        .route("/verify/:token_id", get(tickets::verify))
        .route("/transfer", post(tickets::transfer))
        .route("/sync-transfer", post(tickets::sync_transfer));

    let admin_routes = Router::new()
        .route("/register", post(admin::register))
        .route("/login", post(admin::login))
        .route("/events", get(admin::list_events).post(admin::create_event))
        .route(
            "/events/:id",
            put(admin::update_event).delete(admin::delete_event),
        )
        .route("/developers", get(admin::list_developers))
        .route("/usage-logs", get(admin::usage_logs));

    let developer_routes = Router::new()
        .route("/register", post(developers::register))
        .route("/login", post(developers::login))
        .route("/me", get(developers::me))
        .route("/regenerate-key", post(developers::regenerate_key))
        .route("/usage", get(developers::usage));

    // Third-party tree: every route pays quota at the API-key gate.
    let open_api_routes = Router::new()
        .route("/events", get(open_api::get_events))
        .route("/events/:id", get(open_api::get_event))
        .route("/tickets/mint", post(open_api::mint_ticket))
        .route("/tickets/verify/:token_id", get(open_api::verify_ticket))
        .route("/tickets/transfer", post(open_api::transfer_ticket))
        .route("/tickets/:token_id", get(open_api::get_ticket))
        .route("/blockchain/tx/:tx_hash", get(open_api::get_transaction))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    Router::new()
        .route("/health", get(health_check))
        // Transaction lookup is also public; wallets poll it while a
        // client-signed transfer confirms.
        .route(
            "/api/blockchain/transaction/:tx_hash",
            get(open_api::get_transaction),
        )
        .nest("/api/auth", auth_routes)
        .nest("/api/events", event_routes)
        .nest("/api/tickets", ticket_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api/developers", developer_routes)
        .nest("/api/v1", open_api_routes)
        .layer(create_security_headers_layer())
        .layer(create_cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
