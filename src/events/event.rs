//! # Event trait and routing-key resolution.
//!
//! An [`Event`] identifies itself with a **static type tag** ([`Event::kind`])
//! plus an optional **subtype discriminator** ([`Event::subtype`]). The pair
//! forms the routing key that selects which subscriber set a publish reaches.
//!
//! ## Routing keys
//! - `kind = "ping"`, `subtype = ""`       → key `"ping"`
//! - `kind = "ping"`, `subtype = "urgent"` → key `"ping.urgent"`
//!
//! Keys are byte-for-byte stable: the same kind and subtype always produce the
//! same key, which is required because keys feed both the shard hash and the
//! subscriber map. Different subtypes produce fully isolated subscriber sets.
//!
//! ## Example
//! ```rust
//! use eventbus::Event;
//!
//! struct Ping {
//!     urgent: bool,
//! }
//!
//! impl Event for Ping {
//!     fn kind(&self) -> &'static str {
//!         "ping"
//!     }
//!
//!     fn subtype(&self) -> &str {
//!         if self.urgent { "urgent" } else { "" }
//!     }
//! }
//! ```

use std::any::Any;

/// An immutable value describing something that occurred.
///
/// Events are routed by `(kind, subtype)`. The bus never mutates an event and
/// holds it only for the duration of dispatch (behind an `Arc` for queued and
/// pooled deliveries).
///
/// ### Implementation requirements
/// - [`Event::kind`] must return the same tag for every value of the type.
/// - [`Event::subtype`] must be a pure function of the event value.
pub trait Event: Any + Send + Sync {
    /// Static type tag identifying this event kind.
    ///
    /// Declared explicitly by each event type; the bus never derives it from
    /// runtime type names, so renaming a Rust type does not change routing.
    fn kind(&self) -> &'static str;

    /// Optional subtype discriminator refining the routing key.
    ///
    /// An empty string (the default) means "no subtype": the event routes on
    /// its kind alone.
    fn subtype(&self) -> &str {
        ""
    }
}

impl dyn Event {
    /// Returns `true` if the boxed event is of type `T`.
    pub fn is<T: Event>(&self) -> bool {
        (self as &dyn Any).is::<T>()
    }

    /// Attempts to borrow the event as its concrete type.
    ///
    /// Handlers receive `Arc<dyn Event>` and use this to recover payloads:
    ///
    /// ```rust
    /// use eventbus::Event;
    ///
    /// struct Tick(u64);
    /// impl Event for Tick {
    ///     fn kind(&self) -> &'static str { "tick" }
    /// }
    ///
    /// let ev: Box<dyn Event> = Box::new(Tick(7));
    /// assert_eq!(ev.downcast_ref::<Tick>().map(|t| t.0), Some(7));
    /// ```
    pub fn downcast_ref<T: Event>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref::<T>()
    }
}

/// Resolves the routing key for an event: `<kind>` or `<kind>.<subtype>`.
///
/// Pure function of the event's kind and subtype; no side effects, no
/// allocation beyond the returned string.
pub(crate) fn routing_key(event: &dyn Event) -> String {
    let subtype = event.subtype();
    if subtype.is_empty() {
        event.kind().to_string()
    } else {
        format!("{}.{}", event.kind(), subtype)
    }
}
