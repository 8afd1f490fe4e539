//! Port traits at the boundaries of the domain.

pub mod config_port;
pub mod observation_port;
pub mod observer_port;
pub mod quote_port;
pub mod report_port;
