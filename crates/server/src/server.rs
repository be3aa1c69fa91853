use axum::{
    Router, middleware,
    routing::{get, patch, post},
};

use std::sync::Arc;

use crate::{
    admin,
    auth::{self, AuthConfig},
    customer,
};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub auth: Arc<AuthConfig>,
}

pub fn router(state: ServerState) -> Router {
    let public = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/verify-otp", post(auth::verify_otp));

    let user = Router::new()
        .route("/api/user", get(customer::profile))
        .route("/api/user/update", post(customer::update_profile))
        .route("/api/user/deposit", post(customer::deposit))
        .route("/api/user/withdrawal", post(customer::withdrawal))
        .route(
            "/api/user/loans",
            get(customer::loans).post(customer::loan_new),
        )
        .route("/api/user/transactions", get(customer::transactions))
        .route("/api/user/transfers", get(customer::transfers))
        .route(
            "/api/user/transfer/initiate",
            post(customer::transfer_initiate),
        )
        .route("/api/user/transfer/verify", post(customer::transfer_verify))
        .route("/api/user/pin/initiate", post(customer::pin_initiate))
        .route("/api/user/pin/verify", post(customer::pin_verify))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::auth));

    let admin = Router::new()
        .route("/api/admin/customers", get(admin::customers))
        .route(
            "/api/admin/customers/{id}",
            patch(admin::customer_update).delete(admin::customer_delete),
        )
        .route(
            "/api/admin/customers/{id}/balance",
            post(admin::customer_balance),
        )
        .route("/api/admin/transactions", get(admin::transactions))
        .route(
            "/api/admin/transactions/{id}",
            get(admin::account_transactions).patch(admin::transaction_confirm),
        )
        .route("/api/admin/loans", get(admin::loans))
        .route("/api/admin/loans/{id}", patch(admin::loan_decide))
        .route(
            "/api/admin/transfers",
            get(admin::transfers).post(admin::transfer_new),
        )
        .route("/api/admin/stats", get(admin::stats))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::admin_auth,
        ));

    public.merge(user).merge(admin).with_state(state)
}

pub async fn run(engine: Engine, auth: AuthConfig, addr: &str) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, auth, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    auth: AuthConfig,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        auth: Arc::new(auth),
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    auth: AuthConfig,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, auth, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
