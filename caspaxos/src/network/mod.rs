pub mod codec;
pub mod messages;
pub mod simulation;
pub mod tcp;
