// Handler modules
pub mod analyze;
pub mod filters;
pub mod integration;

// Re-export all handler functions
pub use analyze::{AnalyzeOptions, handle_analyze};
pub use filters::{handle_filters_add, handle_filters_list, handle_filters_remove};
pub use integration::{
    handle_integration_activate, handle_integration_deactivate, handle_integration_list,
};
