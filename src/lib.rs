pub mod catalog;
pub mod config;
pub mod filter;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod lecture;
pub mod placement;
pub mod schedule;
pub mod seed;
pub mod store;
pub mod telemetry;
pub mod time_grid;

pub use catalog::{CatalogEndpoint, CatalogError, LectureCatalog, LectureSource};
pub use config::AppConfig;
pub use filter::{SearchOptions, filter_lectures};
pub use lecture::{Lecture, Segment, parse_schedule};
pub use placement::{CellDelta, DragGesture, GridMetrics, Placement, PointerDrag, resolve_drag};
pub use schedule::{PeriodRange, Schedule, find_conflicts, overlaps};
pub use store::{ScheduleAction, ScheduleMap, ScheduleStore, StoreError, TableId, TableSchedules};
pub use time_grid::{Day, Period};
