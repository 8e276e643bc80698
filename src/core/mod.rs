pub mod config;
pub mod geo;
pub mod geomath;
pub mod listing;
