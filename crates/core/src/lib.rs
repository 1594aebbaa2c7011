//! Domain primitives shared by every dealer crate.
//!
//! Lives at the bottom of the dependency graph (no internal deps) so the
//! repository layer, the event fan-out and the HTTP server can all agree on
//! what a floor is and which moves are allowed.

pub mod error;
pub mod floors;
pub mod ordering;
pub mod types;
pub mod validation;
