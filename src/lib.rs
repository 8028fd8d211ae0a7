//! Bookshelf Library Catalog Client
//!
//! Typed access to the catalog REST API together with the view models of the
//! client screens: the book list with search and delete, the shared create/edit
//! form, the single-book lookup, login/register and the modal host.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod nav;
pub mod services;
pub mod session;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use services::Services;
pub use session::{Session, SharedSession};
