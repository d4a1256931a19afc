//! Picture Poet - writes poems inspired by images
//!
//! An image arrives as an inline data URI or a remote URL, is normalized into
//! a base64 data URI, and is handed to a generative model that answers with a
//! poem. Successful generations can be kept in a local history.

pub mod ai;
pub mod app;
pub mod error;
pub mod history;
pub mod image;
pub mod models;
pub mod prompts;
pub mod validate;

pub use error::{Error, Result};
