pub mod errors;
pub mod export_policy;
pub mod ports;
pub mod push_target;
pub mod unit_state;
