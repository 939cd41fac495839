pub mod channel;
pub mod endpoint;
pub mod gateway;
pub mod host;
pub mod local;
pub mod message;
pub mod providers;
