#![deny(missing_docs)]
#![doc = "Core data types, error surface and seeding policy shared by the strata crates."]

pub mod errors;
pub mod events;
pub mod provenance;
pub mod rng;
pub mod table;

pub use errors::{ErrorInfo, StrataError};
pub use events::{EventSink, NullSink, PipelineEvent, TracingSink};
pub use provenance::{RunProvenance, SchemaVersion};
pub use rng::{derive_substream_seed, RngHandle};
pub use table::{Cell, Column, PopulationTable, StratifyingVariable, UnitId, VariableKind};

/// Integer stratum label in `1..=k`.
pub type StratumId = u32;
