//! Depth analyses over the folded hierarchy.
//!
//! Two different depths are measured:
//!
//! - **Node depth** ([`node_depth`], [`deepest_reach`]): how many hierarchy levels the
//!   connectivity of a net can be chased through. From a node, every attached instance port is
//!   followed into the master cell, to the node named after the formal port, until no further
//!   node exists. Global nodes stop the descent.
//! - **Hierarchy depth** ([`max_hierarchy_depth`]): the nesting depth of the instantiation tree,
//!   regardless of connectivity.
//!
//! Both recurse one hierarchy level per step, so the recursion is bounded by the depth of the
//! (acyclic) master-cell graph. Memo tables live for a single call.

use std::collections::HashMap;

use log::debug;

use crate::netlist::{CellId, Design, GlobalNodes, NodeId};

struct NodeDepth<'a> {
    design: &'a Design,
    globals: &'a GlobalNodes,
    memo: HashMap<(CellId, NodeId), usize>,
}

impl<'a> NodeDepth<'a> {
    fn new(design: &'a Design, globals: &'a GlobalNodes) -> Self {
        NodeDepth {
            design,
            globals,
            memo: HashMap::new(),
        }
    }

    fn depth(&mut self, cell: CellId, node: NodeId) -> usize {
        if let Some(depth) = self.memo.get(&(cell, node)) {
            return *depth;
        }

        let design = self.design;
        let globals = self.globals;
        let c = design.cell(cell);
        let inner: Vec<(CellId, NodeId)> = c
            .node(node)
            .inst_ports()
            .iter()
            .filter_map(|ip| {
                let ip = c.inst_port(*ip);
                let master = c.instance(ip.inst()).master();
                let master_cell = design.cell(master);
                let inner = master_cell.node_named(ip.port_name())?;
                if globals.contains(master_cell.node(inner).name()) {
                    None
                } else {
                    Some((master, inner))
                }
            })
            .collect();

        let depth = 1 + inner
            .into_iter()
            .map(|(master, inner)| self.depth(master, inner))
            .max()
            .unwrap_or(0);

        self.memo.insert((cell, node), depth);
        depth
    }
}

/// Number of hierarchy levels reachable from `node` of `cell`; 1 when nothing leads further.
///
/// # Example
///
/// ```
/// use netrank::netlist::{GlobalNodes, verilog::parse};
/// use netrank::stat::depth::node_depth;
///
/// let design = parse(r#"
///     module top(input a); inv u (.a(a)); endmodule
///     module inv(input a); endmodule
/// "#).unwrap();
/// let top = design.cell_named("top").unwrap();
/// let a = design.cell(top).node_named("a").unwrap();
/// assert_eq!(node_depth(&design, top, a, &GlobalNodes::default()), 2);
/// ```
pub fn node_depth(design: &Design, cell: CellId, node: NodeId, globals: &GlobalNodes) -> usize {
    NodeDepth::new(design, globals).depth(cell, node)
}

/// Deepest [`node_depth`] over the non-global nodes of `top`, at least 1.
pub fn deepest_reach(design: &Design, top: CellId, globals: &GlobalNodes) -> usize {
    let mut analysis = NodeDepth::new(design, globals);
    let reach = design
        .cell(top)
        .nodes()
        .filter(|(_, node)| !globals.contains(node.name()))
        .map(|(id, _)| analysis.depth(top, id))
        .fold(1, usize::max);

    debug!(
        "Deepest reach of {}: {} ({} nodes visited)",
        design.cell(top).name(),
        reach,
        analysis.memo.len()
    );
    reach
}

/// Nesting depth of the instantiation tree below `cell`: 1 for a leaf cell, otherwise one more
/// than its deepest master cell.
pub fn max_hierarchy_depth(design: &Design, cell: CellId) -> usize {
    fn visit(design: &Design, cell: CellId, memo: &mut HashMap<CellId, usize>) -> usize {
        if let Some(depth) = memo.get(&cell) {
            return *depth;
        }
        let depth = 1 + design
            .cell(cell)
            .instances()
            .map(|(_, instance)| visit(design, instance.master(), memo))
            .max()
            .unwrap_or(0);
        memo.insert(cell, depth);
        depth
    }

    visit(design, cell, &mut HashMap::new())
}
