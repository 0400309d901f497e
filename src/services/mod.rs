//! Services.
//!
//! These contain the core business logic.
//!
//! If a service directly maps to an HTTP route, it will have an `http` module
//! containing the handlers and an `Into<axum::Router>` implementation.

pub mod steam;
pub use steam::SteamStrategy;

pub mod linker;
pub use linker::AccountLinker;

pub mod broker;
pub use broker::IdentityBroker;

pub mod admin;
pub use admin::AdminService;
