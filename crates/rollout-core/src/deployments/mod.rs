//! Deployment results view and the status filter it shares with the dashboard.

pub mod filter;
pub mod view;

pub use filter::{FilterSelection, filter_deployments, filter_tasks};
pub use view::{DeploymentsView, DetailsJob, DetailsOutcome, ExportJob, ExportedReport};
