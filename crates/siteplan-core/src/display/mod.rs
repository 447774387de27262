//! Display formatting for models and operation results.
//!
//! Domain models implement [`std::fmt::Display`] directly (see [`models`]);
//! newtype wrappers cover collections and operation results. Everything is
//! written as markdown so the CLI can render it with colors or print it
//! as is.
//!
//! - [`collections`]: [`AnalysisSummaries`] and [`Tasks`]
//! - [`results`]: create/update/delete wrappers, plan outcomes, reanalysis
//! - [`status`]: one-line confirmations ([`OperationStatus`])
//! - [`datetime`]: timestamp formatting in the system time zone
//!
//! ```rust
//! use siteplan_core::display::OperationStatus;
//!
//! let status = OperationStatus::success("Deleted 3 tasks");
//! assert!(status.to_string().contains("Deleted 3 tasks"));
//! ```

pub mod collections;
pub mod datetime;
pub mod models;
pub mod results;
pub mod status;


pub use collections::{AnalysisSummaries, Tasks};
pub use datetime::{LocalDate, LocalDateTime};
pub use results::{CreateResult, DeleteResult, UpdateResult};
pub use status::OperationStatus;
