//! Client for the Nissan Carwings (NissanConnect EV) telemetry service.
//!
//! [`services::CarwingsService`] logs in, asks the service to refresh data from the vehicle,
//! polls until that refresh completes and reads the battery status it recorded.

pub mod adapters;
pub mod app;
pub mod domain;
pub mod error;
pub mod services;

#[cfg(test)]
mod test_support;

pub use error::{CarwingsError, LoginFailure};
