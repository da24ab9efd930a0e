//! Logic-level ranking of the instances of a flattened netlist.
//!
//! # Main Operations
//!
//! - **[`rank_main`]**: Loads and flattens the design, ranks its instances with
//!   [`calculator::compute_ranks`] and writes the `.rank` report: a `file name:` line followed
//!   by one `<rank> <instance>` line per ranked instance, by increasing rank.
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use netrank::NetlistArgs;
//! use netrank::rank::{RankArgs, rank_main};
//!
//! let args = RankArgs {
//!     netlist: NetlistArgs {
//!         top: "top".into(),
//!         inputs: vec!["stdcells.v".into(), "top.v".into()],
//!         globals: vec!["VDD".into(), "VSS".into()],
//!         verbose: true,
//!     },
//!     output: Some("top.rank".into()),
//! };
//!
//! rank_main(args)?;
//! # Ok(())
//! # }
//! ```

use std::{io::Write, path::PathBuf};

use anyhow::Result;
use clap::Parser;
use prettytable::{Table, format, row};

use crate::{NetlistArgs, default_report_path, load_design, stat::write_report};

pub mod calculator;

use calculator::RankedInstance;

/// Command-line arguments for the rank command.
#[derive(Parser, Debug)]
pub struct RankArgs {
    #[clap(flatten)]
    pub netlist: NetlistArgs,

    /// Report file (default: <TOP>.rank)
    #[clap(long, short)]
    pub output: Option<PathBuf>,
}

/// Writes one `<rank> <instance>` line per ranked instance after the `file name:` line.
pub fn write_ranks<W: Write + ?Sized>(
    writer: &mut W,
    file_name: &str,
    ranks: &[RankedInstance],
) -> std::io::Result<()> {
    writeln!(writer, "file name: {}", file_name)?;
    for ranked in ranks {
        writeln!(writer, "{}", ranked)?;
    }
    Ok(())
}

/// Rank the instances of the flattened top cell and write the `.rank` report.
pub fn rank_main(args: RankArgs) -> Result<()> {
    let RankArgs { netlist, output } = args;

    let loaded = load_design(&netlist)?;
    let ranks = calculator::compute_ranks(&loaded.design, loaded.flat, &loaded.globals)?;

    let path = output.unwrap_or_else(|| default_report_path(&netlist.top, "rank"));
    write_report(&path, |w, name| write_ranks(w, name, &ranks))?;

    if netlist.verbose {
        let mut table = Table::new();
        table.set_titles(row!["Rank", "Instance", "Cell"]);
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        let flat = loaded.design.cell(loaded.flat);
        for ranked in ranks.iter() {
            let master = flat
                .instance_named(&ranked.name)
                .map(|inst| loaded.design.cell(flat.instance(inst).master()).name().to_string())
                .unwrap_or_default();
            table.add_row(row![ranked.rank, ranked.name, master]);
        }
        table.printstd();
    }

    Ok(())
}
