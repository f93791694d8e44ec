pub mod api;
pub mod collectors;
pub mod core;
pub mod predictors;
pub mod utils;
