//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod auth;
pub mod health;
pub mod redirect;
pub mod urls;
pub mod users;

pub use auth::token_handler;
pub use health::health_handler;
pub use redirect::redirect_handler;
pub use urls::{
    create_url_handler, create_user_url_handler, delete_url_handler, get_url_handler,
    update_url_handler,
};
pub use users::{create_user_handler, delete_user_handler, get_user_handler, update_user_handler};
