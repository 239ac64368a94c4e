//! Retrieval of ERA5 archives from the Copernicus Climate Data Store.

pub mod client;
pub mod credentials;
pub mod error;
pub mod request;
