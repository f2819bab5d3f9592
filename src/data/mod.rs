/// Data layer: core types, loading, and writing.
///
/// Architecture:
/// ```text
///  axes .parquet / .json / .csv        sweep config .json
///        │                                   │
///        ▼                                   ▼
///   ┌──────────┐                       ┌────────────┐
///   │  loader   │ ──► WavelengthAxisMap │ SweepConfig │
///   └──────────┘                       └────────────┘
///
///   Vec<CollectedFrame> ──► SpectralDataset ──► writer ──► .parquet / .json / .csv
/// ```

pub mod loader;
pub mod model;
pub mod writer;
