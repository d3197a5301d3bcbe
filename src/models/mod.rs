pub mod application;
pub mod chat;
