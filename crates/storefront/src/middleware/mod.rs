//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Crawler tagging (sets cache headers last, so they win)
//! 2. Sentry layers (capture errors, transactions)
//! 3. `TraceLayer` (request tracing)
//! 4. Request ID (add unique ID to each request)
//! 5. Session layer (tower-sessions with the in-memory store)
//! 6. Not-found page (needs the session to render the overlays)

pub mod crawler;
pub mod not_found;
pub mod page_context;
pub mod request_id;
pub mod session;

pub use crawler::crawler_middleware;
pub use not_found::{MissingPage, not_found_middleware};
pub use page_context::{CONSENT_CLOSED_COOKIE, PageContext};
pub use request_id::{RequestId, request_id_middleware};
pub use session::create_session_layer;
