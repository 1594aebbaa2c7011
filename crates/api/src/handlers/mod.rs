pub mod cars;
pub mod floors;
pub mod ordered_cars;
