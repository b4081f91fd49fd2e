//! Planning core: aggregation, value spaces, the edit buffer and the sync
//! scheduler, tied together by `PlanningSession`.

pub(crate) mod analysis;
pub(crate) mod buffer;
pub(crate) mod scheduler;
pub(crate) mod session;
pub(crate) mod space;
pub(crate) mod summary;

#[cfg(test)]
pub(crate) mod testing;

pub(crate) use analysis::{CategoryRow, Period};
pub(crate) use scheduler::{SyncSettings, SyncState, SyncStatus, SystemClock};
pub(crate) use session::{LeavePolicy, PlanningSession};
pub(crate) use space::{resolve_space, PlanScope};
