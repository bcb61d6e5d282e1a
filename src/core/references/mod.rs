// Core references module - issue / pull request lookup and card building.
// Following the same pattern as the blocklist module.

pub mod reference_models;
pub mod reference_service;

pub use reference_models::*;
pub use reference_service::*;
