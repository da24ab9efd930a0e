//! Instance rank computation.
//!
//! The rank of an instance of a flattened cell is the length, in instance hops, of the longest
//! path reaching it from a primary input:
//!
//! - every input port driven by no instance and not tied to a global node makes the instance a
//!   first logic level (rank 0)
//! - every input port driven by the output of another instance `D` gives a rank of at least
//!   `rank(D) + 1`, provided `D` has a rank itself
//! - instances reaching no primary input keep an undefined rank and are left out of the result
//!
//! The dependencies (instance to driving instance) are collected in a graph first. Ranks are
//! then resolved by an iterative depth-first traversal with an explicit stack, so long
//! combinational chains do not grow the native stack. Each rank is computed once and reused by
//! every downstream instance. A dependency cycle is reported as
//! [`AnalysisError::CycleDetected`].

use std::{error::Error, fmt};

use log::{debug, warn};
use petgraph::graph::{DiGraph, NodeIndex};

use crate::Symbol;
use crate::netlist::{CellId, Design, GlobalNodes, InstId, InstPortId, PortDirection};

/// Errors raised by the rank analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// The instance takes part in a combinational loop.
    CycleDetected(Symbol),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::CycleDetected(name) => {
                write!(f, "Combinational cycle through instance {}", name)
            }
        }
    }
}

impl Error for AnalysisError {}

/// An instance with its rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedInstance {
    pub rank: usize,
    pub name: Symbol,
}

impl fmt::Display for RankedInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.rank, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Pending,
    InProgress,
    Computed,
}

/// Dependency graph of the instances of a flattened cell.
///
/// Nodes are instances, an edge `I -> D` means an input of `I` is driven by an output of `D`.
pub struct DependencyGraph {
    graph: DiGraph<InstId, ()>,
    /// Rank contributed by primary inputs alone: `Some(0)` when fed by one.
    base: Vec<Option<usize>>,
}

impl DependencyGraph {
    /// Collects the dependencies of every instance of `cell`.
    pub fn new(design: &Design, cell: CellId, globals: &GlobalNodes) -> Self {
        let c = design.cell(cell);
        let mut graph = DiGraph::with_capacity(c.instance_count(), c.instance_count());
        let mut index = vec![NodeIndex::end(); c.instance_count()];
        for (id, _) in c.instances() {
            index[id.index()] = graph.add_node(id);
        }

        let mut base = vec![None; graph.node_count()];
        for (id, instance) in c.instances() {
            let ix = index[id.index()];
            for ip in instance.inst_ports().values() {
                if design.inst_port_port(cell, *ip).direction() != PortDirection::In {
                    continue;
                }

                let node = c.inst_port(*ip).node();
                match driver(design, cell, *ip) {
                    Some(d) => {
                        graph.update_edge(ix, index[d.index()], ());
                    }
                    None if !globals.contains(c.node(node).name()) => {
                        base[ix.index()] = Some(0);
                    }
                    None => {}
                }
            }
        }

        debug!(
            "Dependency graph of {}: {} instances, {} edges",
            c.name(),
            graph.node_count(),
            graph.edge_count()
        );
        DependencyGraph { graph, base }
    }

    /// Resolves the rank of every instance. `None` marks an instance with no rank.
    fn ranks(&self) -> Result<Vec<Option<usize>>, NodeIndex> {
        let mut rank = self.base.clone();
        let mut state = vec![State::Pending; self.graph.node_count()];

        for start in self.graph.node_indices() {
            if state[start.index()] == State::Computed {
                continue;
            }

            let mut stack = vec![(start, false)];
            while let Some((v, expanded)) = stack.pop() {
                if expanded {
                    let r = self
                        .graph
                        .neighbors(v)
                        .filter_map(|d| rank[d.index()].map(|r| Some(r + 1)))
                        .fold(rank[v.index()], Option::max);
                    rank[v.index()] = r;
                    state[v.index()] = State::Computed;
                    continue;
                }

                match state[v.index()] {
                    State::Computed => continue,
                    State::InProgress => return Err(v),
                    State::Pending => {}
                }

                state[v.index()] = State::InProgress;
                stack.push((v, true));
                for d in self.graph.neighbors(v) {
                    match state[d.index()] {
                        State::Computed => {}
                        State::InProgress => return Err(d),
                        State::Pending => stack.push((d, false)),
                    }
                }
            }
        }

        Ok(rank)
    }
}

/// Instance owning the first output port, other than `ip`, attached to the node of `ip`.
fn driver(design: &Design, cell: CellId, ip: InstPortId) -> Option<InstId> {
    let c = design.cell(cell);
    let node = c.node(c.inst_port(ip).node());
    let mut drivers = node
        .inst_ports()
        .iter()
        .filter(|other| **other != ip)
        .filter(|other| design.inst_port_port(cell, **other).direction() == PortDirection::Out)
        .map(|other| c.inst_port(*other).inst());

    let first = drivers.next();
    if first.is_some() && drivers.next().is_some() {
        warn!("Node {} of {} has multiple drivers", node.name(), c.name());
    }
    first
}

/// Compute the rank of every instance of the flattened cell `flat`.
///
/// The result is sorted by rank, then by instance name. Instances without a rank (no input fed
/// by a primary input or by another instance) are omitted.
///
/// # Example
///
/// ```
/// use netrank::netlist::{GlobalNodes, verilog::parse};
/// use netrank::rank::calculator::compute_ranks;
///
/// let design = parse(r#"
///     module top(input a, output y);
///         inv u2 (.a(n), .y(y));
///         inv u1 (.a(a), .y(n));
///     endmodule
///     module inv(input a, output y); endmodule
/// "#).unwrap();
/// let top = design.cell_named("top").unwrap();
///
/// let ranks = compute_ranks(&design, top, &GlobalNodes::default()).unwrap();
/// let ranks: Vec<_> = ranks.iter().map(|r| r.to_string()).collect();
/// assert_eq!(ranks, vec!["0 u1", "1 u2"]);
/// ```
pub fn compute_ranks(
    design: &Design,
    flat: CellId,
    globals: &GlobalNodes,
) -> Result<Vec<RankedInstance>, AnalysisError> {
    let c = design.cell(flat);
    let deps = DependencyGraph::new(design, flat, globals);
    let instance_name = |ix: NodeIndex| c.instance(deps.graph[ix]).name().clone();

    let ranks = deps
        .ranks()
        .map_err(|ix| AnalysisError::CycleDetected(instance_name(ix)))?;

    let mut ranked: Vec<_> = deps
        .graph
        .node_indices()
        .filter_map(|ix| {
            ranks[ix.index()].map(|rank| RankedInstance {
                rank,
                name: instance_name(ix),
            })
        })
        .collect();
    ranked.sort_by(|a, b| (a.rank, a.name.as_ref()).cmp(&(b.rank, b.name.as_ref())));

    debug!(
        "Ranked {} of {} instances of {}",
        ranked.len(),
        c.instance_count(),
        c.name()
    );
    Ok(ranked)
}
