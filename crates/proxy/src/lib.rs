//! AI proxy for the PagePilot dashboard.
//!
//! Holds a refreshable OAuth bearer token for the LLM API, relays chat
//! prompts, and runs the "AI Workshop" pipeline that turns a generated
//! page plan into files, registry entries, a build and a deploy.

pub mod agent;
pub mod config;
pub mod error;
pub mod handlers;
pub mod llm;
pub mod middleware;
pub mod router;
pub mod state;
pub mod token;
