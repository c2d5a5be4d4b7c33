//! Application-level orchestration.
//!
//! One entry point per subcommand: the statistics pipeline over a source
//! directory, flat-table charts from a single CSV, and overlay charts across
//! glob-matched sources. Each returns a `RunReport` for the CLI layer to print.

mod discovery;
mod plot_run;
mod stats_run;
mod unified_run;

pub(crate) use plot_run::run_plot;
pub(crate) use stats_run::run_stats;
pub(crate) use unified_run::run_unified;
