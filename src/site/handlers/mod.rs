//! Request handlers, one module per resource.

pub mod analytics;
pub mod auth;
pub mod blog;
pub mod dashboard;
pub mod gallery;
pub mod testimonial;
