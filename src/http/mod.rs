//! HTTP/HTTPS static file server.
//!
//! - [`static_files`]: the router, with no-cache headers on every response
//! - [`server`]: port selection, TLS bootstrap, banner, and the serve loop
//! - directory listings for folders without an `index.html`
//! - graceful shutdown on Ctrl+C / SIGTERM

mod listing;
pub mod server;
mod shutdown;
pub mod static_files;

pub use listing::{render_listing, resolve_under_root, ListingEntry};
pub use server::{run, Server, ServerError, ServerUrls};
pub use static_files::create_router;
