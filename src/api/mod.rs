//! This mod is meant to hold most of the code for the library's client-facing API.
mod logging;
mod options;
mod shipper;
mod wiring;

pub use logging::create_stdout_logger;
pub use options::ShippingOptions;
pub use shipper::LogShipper;
pub use shipper::LogShipperError;
pub use wiring::try_create_log_shipper;
pub use wiring::LogShipperConfig;
pub use wiring::LogShipperCreationError;
