//! Event data model: type tags, subtypes and routing keys.
//!
//! This module defines the capability an event type must provide to travel on
//! the bus, and the resolver that turns an event value into the routing key
//! used for sharding and subscriber lookup.
//!
//! ## Contents
//! - [`Event`] the event capability (static kind tag + optional subtype)
//! - `routing_key` (crate-internal) the kind/subtype → key resolver

mod event;

pub use event::Event;

pub(crate) use event::routing_key;
