// Moderation event handlers - message policy and react-remove.

pub mod message_handler;
pub mod reaction_handler;
