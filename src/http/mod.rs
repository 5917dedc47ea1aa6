//! HTTP surface: routes, shared state and error mapping.
//!
//! | Route | Handler |
//! |---|---|
//! | `POST /enqueue` | submit an install, `400` on a bad package name |
//! | `GET /queue` | snapshot of every job |
//! | `GET /jobs/{job_id}` | one job, `404` if unknown |
//! | `GET /packages?q=&page=&size=` | catalog search |
//! | `GET /ws` | real-time event stream |
//! | `GET /`, `/static/*` | UI files, only when a static dir is configured |

mod error;
mod handlers;
mod state;
mod ws;

use std::path::Path;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

pub use error::{ApiError, ApiResult};
pub use handlers::{EnqueueRequest, EnqueueResponse, validate_package};
pub use state::AppState;

/// Builds the application router.
pub fn router(state: AppState, static_dir: Option<&Path>) -> Router {
    let mut app = Router::new()
        .route("/enqueue", post(handlers::enqueue))
        .route("/queue", get(handlers::queue))
        .route("/jobs/{job_id}", get(handlers::job))
        .route("/packages", get(handlers::packages))
        .route("/ws", get(ws::websocket_handler));

    if let Some(dir) = static_dir {
        app = app
            .nest_service("/static", ServeDir::new(dir))
            .route_service("/", ServeFile::new(dir.join("index.html")));
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}
