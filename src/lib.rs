//! Structural analysis of hierarchical gate-level netlists
//!
//! This library reads structural Verilog into a hierarchical cell/instance/node model and
//! answers structural queries about it: how many instances and nodes a cell holds, how often a
//! cell type occurs in the folded and in the flattened hierarchy, how deep signals propagate
//! through the hierarchy, and at which logic level every instance of the flattened netlist sits.
//!
//! # Main Workflows
//!
//! The library supports two main operations:
//!
//! 1. **Statistics** ([`stat`]): instance/node counts, occurrence counts, node and hierarchy
//!    depths, and the hierarchical names at the deepest level
//! 2. **Ranking** ([`rank`]): longest-path logic level of every instance of the flattened
//!    netlist, measured from the primary inputs
//!
//! # Usage Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use netrank::{read_files, netlist::{GlobalNodes, flatten}};
//! use netrank::rank::calculator::compute_ranks;
//! use std::path::PathBuf;
//!
//! let mut design = read_files("design", &[PathBuf::from("lib.v"), PathBuf::from("top.v")])?;
//! let top = design.cell_named("top").ok_or("no top cell")?;
//! let globals = GlobalNodes::default();
//! let flat = flatten(&mut design, "top_flat", top, &globals)?;
//!
//! for ranked in compute_ranks(&design, flat, &globals)? {
//!     println!("{}", ranked);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - **[`netlist`]**: the hierarchical netlist model, the structural Verilog reader and the
//!   flatten transformation
//! - **[`stat`]**: occurrence counting, depth analyses and deepest-name collection
//! - **[`rank`]**: instance rank computation over the flattened netlist

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::{error::Error, fmt, fs, path::Path, path::PathBuf};
use string_cache::DefaultAtom;

pub mod netlist;
pub mod rank;
pub mod stat;

// Re-export the main functions for easy access
pub use rank::{RankArgs, rank_main};
pub use stat::{StatArgs, stat_main};

use netlist::{CellId, Design, GlobalNodes, verilog::VerilogReader};

pub type Symbol = DefaultAtom;

/// Application-level errors.
#[derive(Debug, PartialEq, Eq)]
pub enum AppError {
    /// The requested top-level cell is not defined by any input file.
    CellNotFound(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::CellNotFound(name) => write!(f, "Could not find cell {}", name),
        }
    }
}

impl Error for AppError {}

/// Reads and elaborates structural Verilog files into one design.
///
/// Every file is parsed before elaboration, so cells may be instantiated in a file other than
/// the one defining them.
pub fn read_files<P: AsRef<Path>>(design_name: &str, files: &[P]) -> Result<Design> {
    let mut reader = VerilogReader::new();
    for file in files {
        let file = file.as_ref();
        info!("Parsing verilog {} ...", file.display());
        let source = fs::read_to_string(file)
            .with_context(|| format!("Could not read {}", file.display()))?;
        reader
            .add_source(&source)
            .with_context(|| format!("Could not parse {}", file.display()))?;
    }
    Ok(reader.elaborate(design_name)?)
}

/// Arguments shared by every command: the netlist to load and how to treat it.
#[derive(Parser, Debug)]
pub struct NetlistArgs {
    /// Name of the top-level cell
    pub top: String,

    /// Structural Verilog input files
    #[clap(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Global (power and ground) net names, excluded from propagation
    #[clap(long = "global", value_name = "NET", default_values = ["VDD", "VSS"])]
    pub globals: Vec<String>,

    /// Also print the results as a table on stdout
    #[clap(long, short)]
    pub verbose: bool,
}

/// A parsed design with its top cell and the flattened view of it.
pub struct LoadedDesign {
    pub design: Design,
    pub top: CellId,
    pub flat: CellId,
    pub globals: GlobalNodes,
}

/// Parses the inputs, looks up the top cell and flattens it into `<top>_flat`.
pub fn load_design(args: &NetlistArgs) -> Result<LoadedDesign> {
    let globals = GlobalNodes::new(args.globals.iter().map(String::as_str));
    let mut design = read_files("design", &args.inputs)?;

    let top = design
        .cell_named(&args.top)
        .ok_or_else(|| AppError::CellNotFound(args.top.clone()))?;

    let flat = netlist::flatten(&mut design, format!("{}_flat", args.top), top, &globals)?;
    info!("Top cell flattened");

    Ok(LoadedDesign {
        design,
        top,
        flat,
        globals,
    })
}

/// Report path used when none is given: `<top>.<extension>` in the working directory.
pub fn default_report_path(top: &str, extension: &str) -> PathBuf {
    PathBuf::from(format!("{}.{}", top, extension))
}

/// Command-line interface arguments for the netrank tools.
///
/// This enum defines the main commands available:
/// - `Stat`: Structural statistics of the hierarchy
/// - `Rank`: Logic level of every instance of the flattened netlist
#[derive(Debug, Parser)]
#[clap(
    name = "netrank",
    about = "Structural analysis of hierarchical gate-level netlists"
)]
pub enum CLIArguments {
    /// Count instances, nodes and target cells, and measure hierarchy depths.
    Stat(StatArgs),
    /// Rank the instances of the flattened netlist by logic level.
    Rank(RankArgs),
}
