//! Activation negotiation against a shape-varying catalog.
//!
//! The [`Negotiator`] applies a desired activation state to a named channel
//! without a compile-time commitment to any one catalog API version. Each
//! runtime-variable operation is probed through a fixed, ordered fallback
//! chain; the first structurally valid shape wins, deterministically:
//!
//! 1. open the catalog: constructor with log sink, else plain constructor;
//! 2. resolve the channel: filtered lookup, else single-argument lookup;
//! 3. apply the state: catalog-level setter, else channel-level setter,
//!    else the raw activation field;
//! 4. persist: a failed write leaves the in-memory change standing and is
//!    reported as [`NegotiationOutcome::AppliedNotPersisted`], not retried.
//!
//! A shape that is *present but fails* stops the chain: falling back after
//! a real failure could apply the change twice through divergent shapes.
//! Only [`Probe::Unsupported`](crate::catalog::Probe::Unsupported) falls
//! through.
//!
//! State queries mirror steps 1–2 plus an accessor/raw-field read pair, and
//! fail open: when the state cannot be determined the channel is treated as
//! active, so a user is never silently denied a warning they should see.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::catalog::{CatalogProvider, ChannelCatalog, ChannelRef, LogSink, Probe};
use crate::error::StileError;

/// The apply shape that won the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyShape {
    /// Catalog-level setter taking the channel handle.
    CatalogSetter,
    /// Channel-level `set_active`.
    ChannelSetter,
    /// Direct mutation of the activation field.
    DirectField,
}

/// Fixed priority order for the apply chain. Tests pin this ordering.
const APPLY_PRIORITY: [ApplyShape; 3] = [
    ApplyShape::CatalogSetter,
    ApplyShape::ChannelSetter,
    ApplyShape::DirectField,
];

/// Result of a single negotiation attempt. Constructed fresh per attempt and
/// consumed immediately by the caller; never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationOutcome {
    /// The state change succeeded and was persisted.
    Applied { via: ApplyShape },
    /// The state change succeeded in memory but the backing store could not
    /// be written (e.g. read-only medium).
    AppliedNotPersisted { via: ApplyShape, reason: String },
    /// The named channel does not exist in the catalog. Nothing was changed
    /// and nothing was written.
    NotFound,
    /// An unexpected error occurred; `reason` carries the causing condition
    /// for display.
    Failed { reason: String },
}

impl NegotiationOutcome {
    /// Whether the in-memory state change went through (persisted or not).
    pub fn is_applied(&self) -> bool {
        matches!(
            self,
            NegotiationOutcome::Applied { .. } | NegotiationOutcome::AppliedNotPersisted { .. }
        )
    }
}

impl fmt::Display for NegotiationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NegotiationOutcome::Applied { .. } => write!(f, "applied"),
            NegotiationOutcome::AppliedNotPersisted { reason, .. } => {
                write!(f, "applied but not persisted ({reason})")
            }
            NegotiationOutcome::NotFound => write!(f, "channel not found"),
            NegotiationOutcome::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// Result of an activation-state query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationState {
    Active,
    Inactive,
    /// The channel does not exist in the catalog.
    NotFound,
    /// The state could not be determined.
    Unknown { reason: String },
}

impl ActivationState {
    /// Fail-open policy: only a definite `Inactive` counts as deactivated.
    /// Everything indeterminate keeps the warning path alive.
    pub fn treat_as_active(&self) -> bool {
        !matches!(self, ActivationState::Inactive)
    }
}

/// Stateless-per-attempt negotiation component.
///
/// Holds the provider and log sink for the process lifetime, but opens a
/// fresh catalog for every call; neither the catalog nor any channel handle
/// survives a single attempt.
pub struct Negotiator {
    provider: Box<dyn CatalogProvider>,
    log: Arc<dyn LogSink>,
}

impl Negotiator {
    pub fn new(provider: Box<dyn CatalogProvider>, log: Arc<dyn LogSink>) -> Self {
        Self { provider, log }
    }

    /// Apply `desired_active` to the named channel in the catalog at
    /// `location`. Never panics and never returns `Err`: every failure mode
    /// is folded into the outcome.
    pub fn negotiate_activation(
        &self,
        channel: &str,
        desired_active: bool,
        location: Option<&Path>,
    ) -> NegotiationOutcome {
        match self.try_negotiate(channel, desired_active, location) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.log.warn(&format!(
                    "negotiation for channel '{channel}' failed: {e}"
                ));
                NegotiationOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Query the activation state of the named channel. Errors are folded
    /// into [`ActivationState::Unknown`] (fail open).
    pub fn query_activation(&self, channel: &str, location: Option<&Path>) -> ActivationState {
        match self.try_query(channel, location) {
            Ok(state) => state,
            Err(e) => {
                self.log
                    .debug(&format!("could not determine state of '{channel}': {e}"));
                ActivationState::Unknown {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn try_negotiate(
        &self,
        channel: &str,
        desired_active: bool,
        location: Option<&Path>,
    ) -> crate::Result<NegotiationOutcome> {
        let location = location.ok_or(StileError::LocationUndeterminable)?;
        let mut catalog = self.open_catalog(location)?;
        catalog.read().map_err(StileError::Other)?;

        // About to mutate: use the lookup default of active-only entries.
        let handle = match self.lookup(catalog.as_ref(), channel, false)? {
            Some(handle) => handle,
            None => return Ok(NegotiationOutcome::NotFound),
        };

        let via = self.apply(catalog.as_mut(), &handle, desired_active)?;
        self.log.debug(&format!(
            "channel '{channel}' set active={desired_active} via {via:?}"
        ));

        match catalog.write() {
            Ok(()) => Ok(NegotiationOutcome::Applied { via }),
            Err(e) => {
                // The flag change stands in memory; the store is read-only
                // or otherwise unwritable. Reported, never retried.
                let failure = StileError::PersistFailure {
                    message: e.to_string(),
                };
                self.log
                    .debug(&format!("{failure} (read-only medium?)"));
                Ok(NegotiationOutcome::AppliedNotPersisted {
                    via,
                    reason: e.to_string(),
                })
            }
        }
    }

    fn try_query(&self, channel: &str, location: Option<&Path>) -> crate::Result<ActivationState> {
        let location = location.ok_or(StileError::LocationUndeterminable)?;
        let mut catalog = self.open_catalog(location)?;
        catalog.read().map_err(StileError::Other)?;

        // Merely checking state: ask for inactive entries too, where the
        // catalog's lookup shape allows it.
        let handle = match self.lookup(catalog.as_ref(), channel, true)? {
            Some(handle) => handle,
            None => return Ok(ActivationState::NotFound),
        };

        let entry = catalog
            .channel_mut(&handle)
            .ok_or_else(|| StileError::ChannelNotFound {
                name: channel.to_string(),
            })?;

        let active = match entry.is_active() {
            Probe::Hit(active) => active,
            Probe::Unsupported => match entry.active_field() {
                Probe::Hit(active) => active,
                Probe::Unsupported => {
                    return Err(StileError::StructuralIncompatibility {
                        operation: "read activation".to_string(),
                    })
                }
            },
        };

        Ok(if active {
            ActivationState::Active
        } else {
            ActivationState::Inactive
        })
    }

    /// Constructor chain: richer shape (location + log sink) first, minimal
    /// shape second. A constructor that is present but fails stops the chain.
    fn open_catalog(&self, location: &Path) -> crate::Result<Box<dyn ChannelCatalog>> {
        match self
            .provider
            .open_with_log(location, Arc::clone(&self.log))
        {
            Probe::Hit(result) => result.map_err(StileError::Other),
            Probe::Unsupported => match self.provider.open(location) {
                Probe::Hit(result) => result.map_err(StileError::Other),
                Probe::Unsupported => Err(StileError::StructuralIncompatibility {
                    operation: "open catalog".to_string(),
                }),
            },
        }
    }

    /// Lookup chain: filtered shape first, single-argument shape second.
    fn lookup(
        &self,
        catalog: &dyn ChannelCatalog,
        channel: &str,
        include_inactive: bool,
    ) -> crate::Result<Option<ChannelRef>> {
        match catalog.find_filtered(channel, include_inactive) {
            Probe::Hit(found) => Ok(found),
            Probe::Unsupported => match catalog.find(channel) {
                Probe::Hit(found) => Ok(found),
                Probe::Unsupported => Err(StileError::StructuralIncompatibility {
                    operation: "channel lookup".to_string(),
                }),
            },
        }
    }

    /// Apply chain over [`APPLY_PRIORITY`]; returns the winning shape.
    fn apply(
        &self,
        catalog: &mut dyn ChannelCatalog,
        handle: &ChannelRef,
        active: bool,
    ) -> crate::Result<ApplyShape> {
        for shape in APPLY_PRIORITY {
            let attempt: Probe<anyhow::Result<()>> = match shape {
                ApplyShape::CatalogSetter => catalog.set_channel_active(handle, active),
                ApplyShape::ChannelSetter => match catalog.channel_mut(handle) {
                    Some(entry) => match entry.set_active(active) {
                        Probe::Hit(()) => Probe::Hit(Ok(())),
                        Probe::Unsupported => Probe::Unsupported,
                    },
                    None => Probe::Hit(Err(anyhow::anyhow!("stale channel handle"))),
                },
                ApplyShape::DirectField => match catalog.channel_mut(handle) {
                    Some(entry) => match entry.active_field_mut() {
                        Probe::Hit(slot) => {
                            *slot = active;
                            Probe::Hit(Ok(()))
                        }
                        Probe::Unsupported => Probe::Unsupported,
                    },
                    None => Probe::Hit(Err(anyhow::anyhow!("stale channel handle"))),
                },
            };

            match attempt {
                Probe::Hit(Ok(())) => return Ok(shape),
                Probe::Hit(Err(e)) => return Err(StileError::Other(e)),
                Probe::Unsupported => continue,
            }
        }

        // The chain is exhaustive over every shape a catalog can expose, so
        // reaching this point is a compatibility defect, not a runtime error.
        Err(StileError::StructuralIncompatibility {
            operation: "set activation".to_string(),
        })
    }
}
