//! Subcommand implementations.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use clap::{Args, ValueEnum};
use tableprops_core::normalize::Normalizer;
use tableprops_core::{GeneratorOptions, MissingTablePolicy, StatementGenerator};
use tracing::info;

use crate::error::Result;
use crate::format::{timestamped_filename, write_tree, FileFormat};
use crate::loader::DesiredConfigLoader;
use crate::source::{open_source, ConfigSource, RowExportSource};

/// Prefix of timestamped dump files.
pub const DEFAULT_DUMP_PREFIX: &str = "current_config";

/// Handling of desired tables that do not exist yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum MissingTables {
    /// Warn and emit nothing for the table.
    #[default]
    Skip,
    /// Warn and emit an ALTER with every non-empty desired property.
    Alter,
}

impl From<MissingTables> for MissingTablePolicy {
    fn from(value: MissingTables) -> Self {
        match value {
            MissingTables::Skip => Self::Skip,
            MissingTables::Alter => Self::AlterAll,
        }
    }
}

/// Arguments of `diff`.
#[derive(Debug, Clone, Args)]
pub struct DiffCommand {
    /// Desired configuration (YAML or JSON).
    pub desired: PathBuf,

    /// Current configuration: a snapshot, or a row export with `--rows`.
    #[arg(short, long)]
    pub current: PathBuf,

    /// Treat `--current` as a JSON export of schema rows.
    #[arg(long)]
    pub rows: bool,

    /// Ignore table ids in the row export.
    #[arg(long, requires = "rows")]
    pub drop_ids: bool,

    /// What to do with desired tables missing from the current config.
    #[arg(long, value_enum, default_value_t = MissingTables::Skip)]
    pub missing_tables: MissingTables,

    /// Skip role and permission changes.
    #[arg(long)]
    pub no_roles: bool,

    /// Check mode: print the statements, then exit with status 1 if there
    /// are any.
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments of `dump`.
#[derive(Debug, Clone, Args)]
pub struct DumpCommand {
    /// JSON export of schema rows to normalize.
    #[arg(long)]
    pub rows: PathBuf,

    /// Output file; standard output when omitted.
    #[arg(short, long, conflicts_with = "timestamped")]
    pub output: Option<PathBuf>,

    /// Output format; detected from the output file name when omitted.
    #[arg(short, long, value_enum)]
    pub format: Option<FileFormat>,

    /// Overwrite an existing output file.
    #[arg(long)]
    pub force: bool,

    /// Write to `<prefix>_<YYYYmmdd-HHMMSS>.<ext>` in the current directory.
    #[arg(long)]
    pub timestamped: bool,

    /// Prefix of the timestamped file name.
    #[arg(long, default_value = DEFAULT_DUMP_PREFIX, requires = "timestamped")]
    pub prefix: String,

    /// Leave table ids out of the snapshot.
    #[arg(long)]
    pub drop_ids: bool,
}

/// Runs `diff` and returns the pending statements.
pub fn diff(cmd: &DiffCommand) -> Result<Vec<String>> {
    let normalizer = Normalizer::new().drop_ids(cmd.drop_ids);
    let source = open_source(&cmd.current, cmd.rows, normalizer);
    let current = source.current_config()?;
    let desired = DesiredConfigLoader::new(&cmd.desired).load()?;

    let options = GeneratorOptions::new()
        .missing_tables(cmd.missing_tables.into())
        .roles(!cmd.no_roles);
    let statements = StatementGenerator::with_options(options).generate_statements(&current, &desired)?;

    if statements.is_empty() {
        info!(source = %source.describe(), "no changes");
    } else {
        info!(count = statements.len(), "configuration drift detected");
    }
    Ok(statements)
}

/// Prints statements, one per line.
pub fn print_statements(out: &mut impl Write, statements: &[String]) -> Result<()> {
    for statement in statements {
        writeln!(out, "{}", statement)?;
    }
    Ok(())
}

/// Runs `dump`. Returns the written file, or `None` when the snapshot went
/// to `out`.
pub fn dump(cmd: &DumpCommand, out: &mut impl Write) -> Result<Option<PathBuf>> {
    let normalizer = Normalizer::new().drop_ids(cmd.drop_ids);
    let tree = RowExportSource::new(&cmd.rows)
        .with_normalizer(normalizer)
        .current_config()?;

    let target = if cmd.timestamped {
        let ext = cmd.format.unwrap_or_default().extension();
        Some(timestamped_filename(&cmd.prefix, ext, Local::now()))
    } else {
        cmd.output.clone()
    };

    match target {
        Some(path) => {
            let format = output_format(cmd.format, &path)?;
            write_tree(&path, &tree, format, cmd.force)?;
            Ok(Some(path))
        }
        None => {
            let format = cmd.format.unwrap_or_default();
            let text = format.render(&tree, Path::new("<stdout>"))?;
            out.write_all(text.as_bytes())?;
            Ok(None)
        }
    }
}

fn output_format(explicit: Option<FileFormat>, path: &Path) -> Result<FileFormat> {
    match explicit {
        Some(format) => Ok(format),
        None => FileFormat::from_path(path),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::error::ToolError;

    const EXPORT: &str = r#"{
  "keyspaces": [
    {"keyspace_name": "excalibur", "durable_writes": true,
     "replication": {"class": "org.apache.cassandra.locator.SimpleStrategy", "replication_factor": "1"}}
  ],
  "tables": [
    {"keyspace_name": "excalibur", "table_name": "widgets", "comment": "old comment"}
  ]
}"#;

    fn diff_command(dir: &TempDir, desired: &str) -> DiffCommand {
        let rows = dir.path().join("rows.json");
        let desired_path = dir.path().join("desired.yaml");
        fs::write(&rows, EXPORT).unwrap();
        fs::write(&desired_path, desired).unwrap();
        DiffCommand {
            desired: desired_path,
            current: rows,
            rows: true,
            drop_ids: false,
            missing_tables: MissingTables::Skip,
            no_roles: false,
            quiet: false,
        }
    }

    #[test]
    fn test_diff_from_rows() {
        let dir = TempDir::new().unwrap();
        let cmd = diff_command(
            &dir,
            "keyspaces:\n  - name: excalibur\n    tables:\n      - name: widgets\n        comment: new comment\n",
        );
        assert_eq!(
            diff(&cmd).unwrap(),
            vec!["ALTER TABLE \"excalibur\".\"widgets\"\nWITH comment = 'new comment';"]
        );
    }

    #[test]
    fn test_diff_missing_table_policy() {
        let dir = TempDir::new().unwrap();
        let mut cmd = diff_command(
            &dir,
            "keyspaces:\n  - name: excalibur\n    tables:\n      - name: gadgets\n        comment: new\n",
        );
        assert!(diff(&cmd).unwrap().is_empty());

        cmd.missing_tables = MissingTables::Alter;
        assert_eq!(diff(&cmd).unwrap().len(), 1);
    }

    #[test]
    fn test_diff_config_error() {
        let dir = TempDir::new().unwrap();
        let cmd = diff_command(&dir, "keyspaces:\n  - durable_writes: false\n");
        assert!(matches!(diff(&cmd), Err(ToolError::Config(_))));
    }

    #[test]
    fn test_print_statements() {
        let mut out = Vec::new();
        print_statements(&mut out, &["A;".to_string(), "B\nC;".to_string()]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "A;\nB\nC;\n");
    }

    #[test]
    fn test_dump_to_stdout_and_file() {
        let dir = TempDir::new().unwrap();
        let rows = dir.path().join("rows.json");
        fs::write(&rows, EXPORT).unwrap();

        let mut cmd = DumpCommand {
            rows,
            output: None,
            format: None,
            force: false,
            timestamped: false,
            prefix: DEFAULT_DUMP_PREFIX.to_string(),
            drop_ids: false,
        };

        let mut out = Vec::new();
        assert_eq!(dump(&cmd, &mut out).unwrap(), None);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("name: excalibur"));
        assert!(text.contains("class: SimpleStrategy"));

        let target = dir.path().join("snapshot.json");
        cmd.output = Some(target.clone());
        assert_eq!(dump(&cmd, &mut Vec::new()).unwrap(), Some(target.clone()));
        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&target).unwrap()).unwrap();
        assert_eq!(written["keyspaces"][0]["name"], "excalibur");

        assert!(matches!(
            dump(&cmd, &mut Vec::new()),
            Err(ToolError::FileExists(_))
        ));
        cmd.force = true;
        assert!(dump(&cmd, &mut Vec::new()).is_ok());
    }
}
