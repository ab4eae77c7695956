//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - parsed upstream records (`RawObservation`) and named series (`NamedSeries`)
//! - source provenance (`ResolvedSource`) and fill policies (`FillPolicy`)
//! - the aligned daily table (`AlignedTable`, `Column`)
//! - the run configuration (`DashConfig`)

pub mod types;

pub use types::*;
