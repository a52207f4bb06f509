pub mod core;
pub mod json_lines_bus;
pub mod mock;
pub mod observability;
pub mod pushgateway;

pub use json_lines_bus::JsonLinesBus;
pub use pushgateway::HttpPusher;
