//! Engine services
//!
//! Services hold the app's behavior and coordinate between the stores,
//! the clock and the snapshots the screens subscribe to.

pub mod clock;
pub mod data;
pub mod export;
pub mod ids;
pub mod insights;
pub mod progress;
pub mod session;
pub mod timer;

pub use clock::{Clock, FixedClock, SystemClock};
pub use data::{DataFacade, Snapshot};
pub use export::{DataExport, ExportService};
pub use ids::{IdGenerator, SequentialIds, UuidGenerator};
pub use insights::{Dashboard, MetricChart};
pub use progress::{PhotoRemoval, ProgressDraft, ProgressService};
pub use session::{FinishOutcome, SessionEditor, WorkoutSession};
pub use timer::{RestTimerService, TimerEvent};
