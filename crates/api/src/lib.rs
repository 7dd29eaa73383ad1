//! HTTP surface of the PagePilot backend: the Facebook webhook and the
//! dashboard's collection API.

pub mod config;
pub mod error;
pub mod handlers;
pub mod ingest;
pub mod middleware;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
