//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (at startup):
//!     template "/user/:id([0-9]+)"
//!     → pattern.rs (compile to anchored regex + parameter map)
//!     → route.rs (method + pattern + handler)
//!     → router.rs (append to ordered table)
//!
//! Lookup (per request):
//!     method, decoded path
//!     → router.rs (linear scan, first match wins)
//!     → Return: matched Route with captures, or None
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Registration order is match priority
//! - Deterministic: same input always matches same route

pub mod pattern;
pub mod route;
pub mod router;

pub use pattern::{CompiledPattern, ParameterMap, PatternError};
pub use route::{Handler, Method, Route};
pub use router::Router;
