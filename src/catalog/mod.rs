//! Channel catalog abstraction.
//!
//! A catalog is an external registry of independently activatable named
//! channels, persisted by its own backing store. The catalog API is
//! versioned independently of this crate, so no single method set can be
//! assumed: every operation that has changed shape across catalog versions
//! is modeled as a *probe* that either hits or reports the shape as
//! unsupported. [`Probe::Unsupported`] is a cheap, expected outcome, never an
//! error; it tells the caller to fall back to the next shape in its chain.
//!
//! Trait implementors expose whichever shapes their catalog version has and
//! leave the rest on the `Unsupported` defaults. The negotiation layer
//! ([`crate::negotiation`]) owns the fallback ordering.
//!
//! This module provides:
//! - [`Probe`] - hit-or-unsupported result of a single shape probe
//! - [`Channel`] - a named, activatable catalog entry
//! - [`ChannelCatalog`] - the loaded catalog and its operation shapes
//! - [`CatalogProvider`] - the two constructor shapes
//! - [`ChannelRef`] - opaque entry handle, resolved by the owning catalog
//! - [`LogSink`] - narrow logging contract for the richer constructor shape
//!
//! [`FileCatalog`](file::FileCatalog) is the YAML-file-backed implementation.

pub mod file;

pub use file::{ChannelEntry, FileCatalog, FileCatalogProvider, CATALOG_FILE_NAME};

use std::path::Path;
use std::sync::Arc;

/// Outcome of probing a single API shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe<T> {
    /// The shape exists on this catalog version and produced a value.
    Hit(T),
    /// The shape is not exposed by this catalog version. Expected; the
    /// caller falls back to the next shape in its chain.
    Unsupported,
}

impl<T> Probe<T> {
    /// The hit value, if any.
    pub fn hit(self) -> Option<T> {
        match self {
            Probe::Hit(value) => Some(value),
            Probe::Unsupported => None,
        }
    }

    /// Whether the shape was available.
    pub fn is_hit(&self) -> bool {
        matches!(self, Probe::Hit(_))
    }
}

/// Opaque handle to a catalog entry.
///
/// Produced by a catalog lookup and only meaningful to the catalog that
/// produced it. Holders must not keep it beyond a single negotiation
/// attempt; the entry itself stays owned by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRef {
    slot: usize,
}

impl ChannelRef {
    /// Build a handle for the entry at `slot`. Catalog implementors only.
    pub fn new(slot: usize) -> Self {
        Self { slot }
    }

    /// The slot index inside the owning catalog.
    pub fn slot(&self) -> usize {
        self.slot
    }
}

/// A named, independently activatable entry in a channel catalog.
///
/// The activation flag has worn three shapes across catalog versions: an
/// accessor/setter pair, and on the oldest versions nothing but the raw
/// field. Each is probed separately.
pub trait Channel {
    /// The channel's name. Stable across catalog versions.
    fn name(&self) -> &str;

    /// Accessor shape for the activation flag.
    fn is_active(&self) -> Probe<bool> {
        Probe::Unsupported
    }

    /// Setter shape for the activation flag.
    fn set_active(&mut self, active: bool) -> Probe<()> {
        let _ = active;
        Probe::Unsupported
    }

    /// Raw read of the activation field, bypassing any accessor.
    fn active_field(&self) -> Probe<bool> {
        Probe::Unsupported
    }

    /// Raw mutable access to the activation field.
    fn active_field_mut(&mut self) -> Probe<&mut bool> {
        Probe::Unsupported
    }
}

/// A loaded channel catalog.
///
/// `read` and `write` exist on every catalog version and return plain
/// results; the lookup and setter operations are shape-probed.
pub trait ChannelCatalog {
    /// Load the catalog's current contents from its backing store.
    fn read(&mut self) -> anyhow::Result<()>;

    /// Two-argument lookup shape: find a channel by name, optionally
    /// including inactive entries. Newer catalog versions only.
    fn find_filtered(&self, name: &str, include_inactive: bool) -> Probe<Option<ChannelRef>> {
        let _ = (name, include_inactive);
        Probe::Unsupported
    }

    /// One-argument lookup shape. Historically returns active entries only.
    fn find(&self, name: &str) -> Probe<Option<ChannelRef>> {
        let _ = name;
        Probe::Unsupported
    }

    /// Catalog-level activation setter taking the entry handle.
    fn set_channel_active(&mut self, handle: &ChannelRef, active: bool) -> Probe<anyhow::Result<()>> {
        let _ = (handle, active);
        Probe::Unsupported
    }

    /// Resolve a handle produced by one of this catalog's lookups.
    ///
    /// `None` only for a handle this catalog did not produce.
    fn channel_mut(&mut self, handle: &ChannelRef) -> Option<&mut dyn Channel>;

    /// Persist the catalog to its backing store. May fail, e.g. when the
    /// store sits on a read-only medium; in-memory state is unaffected.
    fn write(&self) -> anyhow::Result<()>;
}

/// The two constructor shapes for opening a catalog at a location.
pub trait CatalogProvider {
    /// Richer constructor shape: location plus a log sink.
    fn open_with_log(
        &self,
        location: &Path,
        log: Arc<dyn LogSink>,
    ) -> Probe<anyhow::Result<Box<dyn ChannelCatalog>>> {
        let _ = (location, log);
        Probe::Unsupported
    }

    /// Minimal constructor shape: location only.
    fn open(&self, location: &Path) -> Probe<anyhow::Result<Box<dyn ChannelCatalog>>> {
        let _ = location;
        Probe::Unsupported
    }
}

/// Narrow logging contract handed to catalogs opened with the richer
/// constructor shape.
pub trait LogSink: Send + Sync {
    fn debug(&self, msg: &str);
    fn info(&self, msg: &str);
    fn warn(&self, msg: &str);
}

/// Forwards catalog log output to the `tracing` subscriber.
#[derive(Debug, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn debug(&self, msg: &str) {
        tracing::debug!(target: "stile::catalog", "{msg}");
    }

    fn info(&self, msg: &str) {
        tracing::info!(target: "stile::catalog", "{msg}");
    }

    fn warn(&self, msg: &str) {
        tracing::warn!(target: "stile::catalog", "{msg}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_hit_carries_value() {
        let probe = Probe::Hit(7);
        assert!(probe.is_hit());
        assert_eq!(probe.hit(), Some(7));
    }

    #[test]
    fn probe_unsupported_is_empty() {
        let probe: Probe<u32> = Probe::Unsupported;
        assert!(!probe.is_hit());
        assert_eq!(probe.hit(), None);
    }

    #[test]
    fn channel_ref_round_trips_slot() {
        let handle = ChannelRef::new(3);
        assert_eq!(handle.slot(), 3);
        assert_eq!(handle, ChannelRef::new(3));
    }

    #[test]
    fn default_shapes_are_unsupported() {
        struct Bare;
        impl Channel for Bare {
            fn name(&self) -> &str {
                "bare"
            }
        }

        let mut ch = Bare;
        assert!(!ch.is_active().is_hit());
        assert!(!ch.set_active(true).is_hit());
        assert!(!ch.active_field().is_hit());
        assert!(!ch.active_field_mut().is_hit());
    }

    #[test]
    fn tracing_sink_accepts_all_levels() {
        let sink = TracingSink;
        sink.debug("d");
        sink.info("i");
        sink.warn("w");
    }
}
