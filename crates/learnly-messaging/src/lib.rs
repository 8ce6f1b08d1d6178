//! Learnly Messaging — command, query, and event buses.
//!
//! Buses are plain constructed-once registry objects: build one of each
//! per process, register handlers at startup, and inject the bus by
//! reference wherever dispatch or subscription is needed. There are no
//! ambient singletons.

pub mod command_bus;
pub mod event_bus;
pub mod query_bus;

pub use command_bus::{CommandBus, CommandHandler};
pub use event_bus::{EventBus, EventHandler, ProjectionError};
pub use query_bus::{QueryBus, QueryHandler};
