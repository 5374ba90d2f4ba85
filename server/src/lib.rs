//! Registration HTTP server.
//!
//! Consumes reCAPTCHA verdicts from [`crew_recaptcha`] and gates user creation
//! on them.
//!
//! # Routes
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | `POST` | `/api/auth/register` | [`register::register`] |
//! | `GET` | `/health` | liveness probe |

pub mod register;
pub mod store;

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use crew_recaptcha::{PolicyConfig, Verifier};
use tokio::net::TcpListener;

pub use store::{MemoryUserStore, Role, User, UserStore, UserSummary};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Shared, read-only request context.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<StateInner>,
}

struct StateInner {
    verifier: Verifier,
    policy: PolicyConfig,
    users: Arc<dyn UserStore>,
}

impl AppState {
    pub fn new(verifier: Verifier, policy: PolicyConfig, users: Arc<dyn UserStore>) -> Self {
        Self {
            inner: Arc::new(StateInner {
                verifier,
                policy,
                users,
            }),
        }
    }

    #[must_use]
    pub fn verifier(&self) -> &Verifier {
        &self.inner.verifier
    }

    #[must_use]
    pub fn policy(&self) -> &PolicyConfig {
        &self.inner.policy
    }

    #[must_use]
    pub fn users(&self) -> &dyn UserStore {
        self.inner.users.as_ref()
    }
}

async fn health() -> &'static str {
    "ok"
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(register::register))
        .with_state(state)
}

pub async fn bind(addr: &str) -> Result<TcpListener, ServerError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })
}

/// Serve until `shutdown` resolves or the listener fails.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, enabled = state.policy().enabled, "Registration server listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    tracing::info!("Registration server stopped");
    Ok(())
}
