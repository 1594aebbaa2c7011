//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod car_repo;
pub mod ordered_car_repo;

pub use car_repo::CarRepo;
pub use ordered_car_repo::OrderedCarRepo;
