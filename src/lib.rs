//! stile - Runtime compatibility gate for optional update channels.
//!
//! A host application that ships optional components through update channels
//! has no way to serve different artifacts per runtime version: once a
//! channel starts publishing builds for a newer runtime, older installations
//! keep pulling artifacts they cannot load. stile runs at startup, compares
//! the running environment's major version against what a guarded component
//! requires, and, when the environment is too old, offers to deactivate
//! the delivering channel and hands off to an external change reviewer.
//!
//! # Modules
//!
//! - [`catalog`] - Channel catalog traits, shape probing, and the file-backed
//!   implementation
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Gate configuration
//! - [`env`] - Access to the running environment's version
//! - [`error`] - Error types and result aliases
//! - [`gate`] - The startup state machine
//! - [`negotiation`] - Activation negotiation across catalog API shapes
//! - [`reviewer`] - Hand-off to the external change reviewer
//! - [`ui`] - Interactive prompts and terminal output
//! - [`version`] - Major-version parsing
//!
//! # Example
//!
//! ```
//! use stile::version::MajorVersion;
//!
//! // Both historical version-string shapes parse to a comparable ordinal.
//! assert_eq!(MajorVersion::parse("1.8.0_392").get(), 8);
//! assert_eq!(MajorVersion::parse("21.0.2").get(), 21);
//! assert!(MajorVersion::parse("1.8.0_392") < MajorVersion::parse("21.0.2"));
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod env;
pub mod error;
pub mod gate;
pub mod negotiation;
pub mod reviewer;
pub mod ui;
pub mod version;

pub use error::{Result, StileError};
pub use gate::{Gate, GateOutcome};
pub use negotiation::{ActivationState, ApplyShape, NegotiationOutcome, Negotiator};
pub use version::MajorVersion;
