//! AI Book Chapter Writer
//!
//! Single-page tool that collects chapter inputs through a form, sends one
//! prompt per submission to the Gemini text-generation API, and renders the
//! reply as a structured chapter or a raw-text fallback.

pub mod error;
pub mod gemini;
pub mod models;
pub mod render;
pub mod routes;

pub use routes::{create_router, AppState};
