// Core policy module - the moderation state machine.
// Following the same pattern as the references module.

pub mod policy_models;
pub mod policy_service;

pub use policy_models::*;
pub use policy_service::*;
