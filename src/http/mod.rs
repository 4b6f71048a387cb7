//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request id)
//!     → handlers.rs (decode, call JobService)
//!     → response.rs ({status, message, data} envelope, status mapping)
//!     → Send to client
//! ```
//!
//! | Method | Path                 | Success          | Failure            |
//! |--------|----------------------|------------------|--------------------|
//! | GET    | /jobs                | managed jobs     | 500, 503           |
//! | POST   | /jobs                | created job      | 400, 409, 500, 503 |
//! | DELETE | /jobs/{job_name}     | removed name     | 404, 500, 503      |
//! | GET    | /jobs/search?ip=...  | matching jobs    | 400, 404, 500, 503 |
//! | DELETE | /jobs/search         | removed "search" | 404, 500, 503      |
//! | GET    | /status              | service info     |                    |
//!
//! 503 means the document lock could not be taken in time; nothing changed.

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use handlers::AddJobRequest;
pub use request::{UuidRequestId, X_REQUEST_ID};
pub use response::{ApiError, ApiResponse};
pub use server::{AppState, HttpServer};
