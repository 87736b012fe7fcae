//! Bus core: configuration, dispatch and the façade.
//!
//! Internal modules:
//! - [`config`]: construction-time settings (shards, delivery mode, pool,
//!   shutdown policy);
//! - [`dispatch`]: the bounded worker pool, panic isolation and failure
//!   reporting;
//! - [`builder`]: optional-feature construction (failure hook);
//! - [`bus`]: the [`EventBus`] façade composing resolver, registry and
//!   dispatcher.

mod builder;
mod bus;
mod config;
mod dispatch;

pub use builder::BusBuilder;
pub use bus::EventBus;
pub use config::{BusConfig, DeliveryMode, ShutdownPolicy};
pub use dispatch::{DeliveryFailure, FailureHook, FailureReason};
