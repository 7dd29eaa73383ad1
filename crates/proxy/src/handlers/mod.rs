pub mod agent;
pub mod chat;
pub mod health;
