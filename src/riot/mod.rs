pub mod client;
pub mod endpoints;
pub mod region;
pub mod types;

pub use client::RiotClient;
pub use endpoints::auth::{AuthTokens, LoginOutcome};
pub use region::{Region, Shard};
