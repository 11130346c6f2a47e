pub mod auction;
pub mod bidding;
pub mod config;
pub mod database;
pub mod error;
pub mod gossip;
pub mod handlers;
pub mod ledger;
pub mod node;
pub mod query;
pub mod transport;
