//! Prompt construction
//!
//! - `selector`: maps a request to one of five templates
//! - `templates`: renders a template into the final prompt text
//! - `manager`: ties selection, context optimization and rendering together

pub mod manager;
pub mod selector;
pub mod templates;

pub use manager::PromptManager;
pub use selector::{TemplateId, TemplateSelector};
pub use templates::{PromptRenderer, TemplateRenderer};
