//! The objects passed between the HTTP surface, the agent, and the model
//! provider.
//!
//! Incoming chat payloads, the provider's wire format, and the transcript
//! log all overlap but are not identical; everything is converted into
//! these internal structs at the boundary and back out again by the
//! provider's spec helpers.
pub mod message;
pub mod role;
pub mod tool;
