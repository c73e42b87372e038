pub mod handlers;
pub mod routes;
pub mod search;
pub mod tabs;
pub mod webhook;

pub use routes::create_router;
