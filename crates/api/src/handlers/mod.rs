pub mod collections;
pub mod webhook;
