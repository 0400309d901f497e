//! HTTP plumbing shared by all services.

pub mod extract;

pub mod problem_details;
pub use problem_details::ProblemDetails;
