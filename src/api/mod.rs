pub mod client;
pub mod traits;
pub mod types;

pub use client::AmadeusClient;
pub use traits::FlightSearchApi;
