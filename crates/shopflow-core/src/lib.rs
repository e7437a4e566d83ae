pub mod config;
pub mod dates;
pub mod db;
pub mod dimensions;
pub mod error;
pub mod facts;
pub mod generator;
pub mod quality;
pub mod staging;
pub mod types;
