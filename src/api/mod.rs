// Backend access: a transport seam plus the caching analytics client.

pub mod client;
pub mod transport;

pub use client::{AnalyticsClient, Fetched};
pub use transport::{HttpTransport, Transport};
