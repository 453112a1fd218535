//! Gateway contracts and vendor adapters.
//!
//! The [`gateway`] module defines the traits a reconciliation pass depends
//! on; [`graph`] and [`google`] implement them against the vendor APIs, and
//! [`memory`] provides in-memory doubles for tests.

pub mod error;
pub mod gateway;
pub mod google;
pub mod graph;
pub mod memory;
pub mod normalize;
pub mod raw_event;

pub use error::{GatewayError, GatewayErrorCode, GatewayResult};
pub use gateway::{
    CalendarGateway, CalendarSummary, DirectoryGateway, NotificationSender, PropertyMap,
};
pub use google::GoogleGateway;
pub use graph::GraphGateway;
pub use memory::{MemoryCalendar, MemoryDirectory, MemorySender, SentMail};
pub use normalize::{NormalizeError, normalize_event};
pub use raw_event::{RawEvent, RawTime};
