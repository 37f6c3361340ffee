pub mod alias;
pub mod blocklist;
pub mod cache;
pub mod config;
pub mod pipeline;
pub mod zone;
pub mod zoneload;
