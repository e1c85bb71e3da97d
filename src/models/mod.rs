mod audit;
mod booking;
mod client;
mod service;

pub use audit::{AuditAction, AuditEntity, AuditLogEntry, LogFilter, LogStats};
pub use booking::{Booking, BookingService, CLOSING_HOUR, OPENING_HOUR};
pub use client::{Address, Client, DocumentKind};
pub use service::Service;
