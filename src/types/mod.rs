pub mod date_range;
pub mod observation;
pub mod reading;
pub mod station;
