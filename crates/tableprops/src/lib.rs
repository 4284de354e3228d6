//! Command-line collaborators for `tableprops-core`.
//!
//! Loads the current configuration (a snapshot file or a JSON export of
//! schema rows) and the desired configuration (YAML or JSON), hands both to
//! the statement generator and writes the result.
//!
//! # CLI Usage
//!
//! ```bash
//! # Print the statements that bring the cluster in line with desired.yaml
//! table-properties diff desired.yaml --current snapshot.yaml
//!
//! # Same, reading a row export; exit with status 1 on drift
//! table-properties diff desired.yaml --current rows.json --rows --quiet
//!
//! # Turn a row export into a reusable snapshot
//! table-properties dump --rows rows.json --timestamped
//! ```

pub mod commands;
pub mod error;
pub mod format;
pub mod loader;
pub mod logging;
pub mod source;

pub use error::{Result, ToolError};
