//! Structural Verilog reader.
//!
//! Reads the gate-level subset of Verilog produced by synthesis tools into a [`Design`]:
//! module definitions (with either plain or ANSI port headers), `input`/`output`/`inout`
//! declarations, `wire`/`tri`/`supply0`/`supply1` nets and cell instances with named or
//! positional connections. Nets used without a declaration are created implicitly.
//!
//! Sources are elaborated in two passes so that modules can be instantiated before their
//! definition, or from another file: every module is first declared with its ports, then the
//! instances of every module are connected. Finally the hierarchy is checked for recursion.
//!
//! # Example
//!
//! ```
//! use netrank::netlist::verilog::parse;
//!
//! let design = parse(r#"
//!     module inv(a, y); input a; output y; endmodule
//!     module top(input x, output z);
//!         wire n;
//!         inv u1 (.a(x), .y(n));
//!         inv u2 (n, z);
//!     endmodule
//! "#).unwrap();
//!
//! let top = design.cell_named("top").unwrap();
//! assert_eq!(design.cell(top).instance_count(), 2);
//! ```

mod ast;

lalrpop_util::lalrpop_mod! {parser, "/netlist/verilog/parser.rs"}

use ast::{Connections, HeaderPort, Item, Module};
use log::debug;
use std::{collections::HashMap, error::Error, fmt};

use crate::Symbol;
use crate::netlist::{CellId, Design, InstId, NetlistError, PortDirection};

type LarlPopError<'a> = lalrpop_util::ParseError<usize, parser::Token<'a>, &'static str>;

/// Error Response of the Verilog reader
#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    SyntaxError(String),
    Netlist(NetlistError),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::SyntaxError(err) => write!(f, "{}", err),
            ParseError::Netlist(err) => write!(f, "{}", err),
        }
    }
}

impl Error for ParseError {}

impl From<LarlPopError<'_>> for ParseError {
    fn from(err: LarlPopError) -> Self {
        ParseError::SyntaxError(format!("{}", err))
    }
}

impl From<NetlistError> for ParseError {
    fn from(err: NetlistError) -> Self {
        ParseError::Netlist(err)
    }
}

/// Accumulates parsed sources until they are elaborated into a [`Design`].
#[derive(Debug, Default)]
pub struct VerilogReader {
    modules: Vec<Module>,
}

impl VerilogReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses one source text. Nothing is resolved until [`VerilogReader::elaborate`].
    pub fn add_source(&mut self, input: &str) -> Result<(), ParseError> {
        let modules = parser::SourceParser::new().parse(input)?;
        debug!("Parsed {} modules", modules.len());
        self.modules.extend(modules);
        Ok(())
    }

    /// Builds the design from every source added so far.
    pub fn elaborate(self, name: impl Into<Symbol>) -> Result<Design, ParseError> {
        let mut design = Design::new(name);

        let mut cells = Vec::with_capacity(self.modules.len());
        for module in self.modules.iter() {
            let cell = design.add_cell(module.name.clone())?;
            declare_ports(&mut design, cell, module)?;
            cells.push(cell);
        }

        for (module, cell) in self.modules.iter().zip(cells) {
            for item in module.items.iter() {
                match item {
                    Item::Ports(_, names) | Item::Nets(names) => {
                        for name in names {
                            design.add_node(cell, name.clone());
                        }
                    }
                    Item::Instance {
                        master,
                        name,
                        connections,
                    } => {
                        let master = design
                            .cell_named(master)
                            .ok_or_else(|| NetlistError::UndefinedCell(master.clone()))?;
                        let inst = design.add_instance(cell, name.clone(), master)?;
                        connect_instance(&mut design, cell, inst, master, connections)?;
                    }
                }
            }
            debug!(
                "Elaborated {}: {} instances, {} nodes",
                module.name,
                design.cell(cell).instance_count(),
                design.cell(cell).node_count()
            );
        }

        design.validate_hierarchy()?;
        Ok(design)
    }
}

/// Parse a single Verilog source into a design named after its first module.
pub fn parse(input: &str) -> Result<Design, ParseError> {
    let mut reader = VerilogReader::new();
    reader.add_source(input)?;
    let name = reader
        .modules
        .first()
        .map(|m| m.name.clone())
        .unwrap_or_default();
    reader.elaborate(name)
}

fn declare_ports(design: &mut Design, cell: CellId, module: &Module) -> Result<(), ParseError> {
    let body: HashMap<&Symbol, PortDirection> = module
        .items
        .iter()
        .filter_map(|item| match item {
            Item::Ports(dir, names) => Some(names.iter().map(move |n| (n, *dir))),
            _ => None,
        })
        .flatten()
        .collect();

    let mut ansi = None;
    for port in module.header.iter() {
        let (name, direction) = match port {
            HeaderPort::Declared(dir, name) => {
                ansi = Some(*dir);
                (name, Some(*dir))
            }
            HeaderPort::Named(name) => (name, ansi.or_else(|| body.get(name).copied())),
        };
        let direction = direction.ok_or_else(|| NetlistError::MissingDirection {
            cell: module.name.clone(),
            port: name.clone(),
        })?;
        design.add_port(cell, name.clone(), direction)?;
        design.add_node(cell, name.clone());
    }

    Ok(())
}

fn connect_instance(
    design: &mut Design,
    cell: CellId,
    inst: InstId,
    master: CellId,
    connections: &Connections,
) -> Result<(), NetlistError> {
    match connections {
        Connections::Named(pairs) => {
            for (port, net) in pairs {
                match net {
                    Some(net) => {
                        let node = design.add_node(cell, net.clone());
                        design.connect(cell, inst, port.clone(), node)?;
                    }
                    None => {
                        let master = design.cell(master);
                        if master.port_named(port).is_none() {
                            return Err(NetlistError::UndefinedPort {
                                cell: master.name().clone(),
                                port: port.clone(),
                            });
                        }
                    }
                }
            }
        }
        Connections::Ordered(nets) => {
            for (i, net) in nets.iter().enumerate() {
                let master = design.cell(master);
                let port = master
                    .ports()
                    .get(i)
                    .map(|p| p.name().clone())
                    .ok_or_else(|| NetlistError::UndefinedPort {
                        cell: master.name().clone(),
                        port: format!("#{}", i + 1).into(),
                    })?;
                let node = design.add_node(cell, net.clone());
                design.connect(cell, inst, port, node)?;
            }
        }
    }
    Ok(())
}
