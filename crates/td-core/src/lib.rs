//! Ticket dashboard core library.
//!
//! Pipeline: [`loader`] detects and parses the export and applies the
//! [`team`] filter; [`sla`] derives classification columns; [`filter`],
//! [`aggregate`] and [`metrics`] compute the views; [`charts`] and
//! [`dashboard`] shape them for presentation; [`server`] exposes them over
//! HTTP.

pub mod aggregate;
pub mod cache;
pub mod charts;
pub mod dashboard;
pub mod exit_codes;
pub mod filter;
pub mod loader;
pub mod logging;
pub mod metrics;
pub mod pretty;
pub mod server;
pub mod sla;
pub mod table;
pub mod team;

pub use cache::{DataSource, LoadCache, LoadedDataset};
pub use dashboard::{assemble, Dashboard, DashboardRequest, Selections};
pub use exit_codes::ExitCode;
pub use filter::{DetailFilter, ViewFilter};
pub use loader::{load_bytes, load_path, LoadError, LoadReport, Loaded};
pub use table::{TicketRecord, TicketTable};
