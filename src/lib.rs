pub mod auction;
pub mod bidding;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod message_broker;
pub mod notify;
pub mod payment;
pub mod phase;
pub mod query;
pub mod scheduler;
pub mod store;
