pub mod intents;
pub mod session;
