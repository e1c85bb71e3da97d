//! StudioDesk - business management for a home recording studio.
//!
//! Clients, bookings, a service catalog, financial reports and an audit
//! trail, all persisted to a local SQLite store and opportunistically
//! synchronized with a remote document store.

pub mod commands;
pub mod config;
pub mod dedup;
pub mod documents;
pub mod models;
pub mod remote;
pub mod reports;
pub mod server;
pub mod store;
pub mod sync;
