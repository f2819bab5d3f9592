/// Frame planning and the sweep state machine.
///
/// ```text
///   FrameTable ──plan_sweep(start, end)──► SweepPlan { frames, cursor }
///                                              │ next_frame()
///                                              ▼
///   SweepController::collect ── move_to ─► acquire ─► filter_spikes ─► CollectedFrame
///                     ▲                                                   │
///                     └──────────── AxisStore::lookup(center) ────────────┘
/// ```

pub mod controller;
pub mod planner;

pub use controller::SweepController;
pub use planner::{FrameTable, SweepPlan, SweepState};
