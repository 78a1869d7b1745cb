//! Stockroom API Library
//!
//! HTTP surface for bulk catalog uploads: handlers, authentication and application setup.

pub mod api_doc;
pub mod auth;
pub mod constants;
pub mod error;
mod handlers;
pub mod setup;
pub mod state;
mod utils;

pub use error::{ErrorResponse, HttpAppError};
