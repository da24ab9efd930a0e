//! Structural statistics of a hierarchical netlist.
//!
//! This module gathers the structural figures of a design into a [`StatReport`] and writes it
//! as a labeled report.
//!
//! # Report
//!
//! ```text
//! file name: top.stat
//! a: <instances in the top cell>
//! b: <nodes in the top cell, global nodes excluded>
//! c: <occurrences of the target cell in the folded hierarchy>
//! d: <occurrences of the target cell in the flattened hierarchy>
//! e: <deepest reach of a top-level node>
//! <hierarchical names at the maximum hierarchy depth, one per line>
//! ```
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use netrank::NetlistArgs;
//! use netrank::stat::{StatArgs, stat_main};
//!
//! let args = StatArgs {
//!     netlist: NetlistArgs {
//!         top: "top".into(),
//!         inputs: vec!["stdcells.v".into(), "top.v".into()],
//!         globals: vec!["VDD".into(), "VSS".into()],
//!         verbose: false,
//!     },
//!     output: None, // top.stat
//!     target: "or3".into(),
//! };
//!
//! stat_main(args)?;
//! # Ok(())
//! # }
//! ```

use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use prettytable::{Table, format, row};

use crate::{
    NetlistArgs, default_report_path, load_design,
    netlist::{CellId, Design, GlobalNodes, HierName},
};

pub mod count;
pub mod depth;
pub mod names;

/// Command-line arguments for the statistics command.
#[derive(Parser, Debug)]
pub struct StatArgs {
    #[clap(flatten)]
    pub netlist: NetlistArgs,

    /// Report file (default: <TOP>.stat)
    #[clap(long, short)]
    pub output: Option<PathBuf>,

    /// Cell type whose occurrences are counted
    #[clap(long, short, default_value = "or3")]
    pub target: String,
}

/// Structural figures of a design, computed on its top cell and on the flattened top cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatReport {
    pub top_instances: usize,
    pub top_nodes: usize,
    pub folded_matches: usize,
    pub flat_matches: usize,
    pub deepest_reach: usize,
    pub hierarchy_depth: usize,
    pub deepest_names: Vec<HierName>,
}

impl StatReport {
    /// Runs every analysis. The folded and flattened analyses only read the design and run in
    /// parallel.
    pub fn compute(
        design: &Design,
        top: CellId,
        flat: CellId,
        target: &str,
        globals: &GlobalNodes,
    ) -> StatReport {
        let cell = design.cell(top);
        let top_instances = cell.instance_count();
        let top_nodes = cell
            .nodes()
            .filter(|(_, node)| !globals.contains(node.name()))
            .count();

        let ((folded_matches, deepest_reach, hierarchy_depth), flat_matches) = rayon::join(
            || {
                (
                    count::count_matches(design, top, target),
                    depth::deepest_reach(design, top, globals),
                    depth::max_hierarchy_depth(design, top),
                )
            },
            || count::count_flat_matches(design, flat, target),
        );

        let deepest_names = names::collect_deepest_names(design, flat, hierarchy_depth);

        StatReport {
            top_instances,
            top_nodes,
            folded_matches,
            flat_matches,
            deepest_reach,
            hierarchy_depth,
            deepest_names,
        }
    }

    /// Writes the labeled report; `file_name` is echoed on the first line.
    pub fn write<W: Write + ?Sized>(&self, writer: &mut W, file_name: &str) -> std::io::Result<()> {
        writeln!(writer, "file name: {}", file_name)?;
        writeln!(writer, "a: {}", self.top_instances)?;
        writeln!(writer, "b: {}", self.top_nodes)?;
        writeln!(writer, "c: {}", self.folded_matches)?;
        writeln!(writer, "d: {}", self.flat_matches)?;
        writeln!(writer, "e: {}", self.deepest_reach)?;
        for name in self.deepest_names.iter() {
            writeln!(writer, "{}", name.to_report())?;
        }
        Ok(())
    }

    fn table(&self, target: &str) -> Table {
        let mut table = Table::new();
        table.set_titles(row!["Figure", "Value"]);
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table.add_row(row!["Top-level instances", self.top_instances]);
        table.add_row(row!["Top-level nodes", self.top_nodes]);
        table.add_row(row![format!("{} (folded)", target), self.folded_matches]);
        table.add_row(row![format!("{} (flat)", target), self.flat_matches]);
        table.add_row(row!["Deepest node reach", self.deepest_reach]);
        table.add_row(row!["Hierarchy depth", self.hierarchy_depth]);
        table.add_row(row!["Deepest names", self.deepest_names.len()]);
        table
    }
}

/// Compute the structural statistics of a design and write the `.stat` report.
///
/// This function:
/// 1. Parses the Verilog inputs and looks up the top cell
/// 2. Flattens the top cell
/// 3. Computes the [`StatReport`] on the folded and flattened views
/// 4. Writes the report to `--output` or `<TOP>.stat`
pub fn stat_main(args: StatArgs) -> Result<()> {
    let StatArgs {
        netlist,
        output,
        target,
    } = args;

    let loaded = load_design(&netlist)?;
    let report = StatReport::compute(
        &loaded.design,
        loaded.top,
        loaded.flat,
        &target,
        &loaded.globals,
    );

    let path = output.unwrap_or_else(|| default_report_path(&netlist.top, "stat"));
    write_report(&path, |w, name| report.write(w, name))?;

    if netlist.verbose {
        report.table(&target).printstd();
    }

    Ok(())
}

/// Creates `path` and hands a buffered writer to `write` along with the file name to echo.
pub(crate) fn write_report<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write, &str) -> std::io::Result<()>,
{
    let file = fs::File::create(path)
        .with_context(|| format!("Could not open file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write(&mut writer, &path.display().to_string())?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlist::flatten;
    use crate::netlist::test_helpers::*;

    fn nested_report() -> StatReport {
        let (mut design, top) = nested_design();
        let globals = GlobalNodes::default();
        let flat = flatten(&mut design, "top_flat", top, &globals).unwrap();
        StatReport::compute(&design, top, flat, "or3", &globals)
    }

    #[test]
    fn nested_design_statistics() {
        let report = nested_report();
        assert_eq!(report.top_instances, 3);
        // x, z, out, w1, w2 (VSS is global)
        assert_eq!(report.top_nodes, 5);
        assert_eq!(report.folded_matches, 2);
        assert_eq!(report.flat_matches, 3);
        assert_eq!(report.deepest_reach, 3);
        assert_eq!(report.hierarchy_depth, 3);
        assert_eq!(report.deepest_names.len(), 18);
    }

    #[test]
    fn report_layout() {
        let report = nested_report();
        let mut out = Vec::new();
        report.write(&mut out, "top.stat").unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(
            &lines[..6],
            &["file name: top.stat", "a: 3", "b: 5", "c: 2", "d: 3", "e: 3"]
        );
        assert_eq!(lines[6], "m1/g1/a");
        assert_eq!(lines.len(), 6 + 18);
    }

    #[test]
    fn report_is_written_to_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("top.stat");
        let report = nested_report();

        write_report(&path, |w, name| report.write(w, name)).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with(&format!("file name: {}\n", path.display())));
        assert!(text.contains("\ne: 3\n"));
    }
}
