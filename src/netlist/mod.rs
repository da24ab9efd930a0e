//! Hierarchical netlist model.
//!
//! A [`Design`] owns every [`Cell`] in an arena addressed by [`CellId`]. Each cell in turn owns
//! its [`Port`]s, [`Instance`]s, [`Node`]s and [`InstPort`]s in per-cell vectors addressed by
//! [`PortId`], [`InstId`], [`NodeId`] and [`InstPortId`]. All cross references (instance to
//! master cell, instance port to node, node to instance ports) are stored as identifiers, so the
//! model can be navigated in O(1) without shared ownership.
//!
//! # Structure
//!
//! - **Cell**: a module definition with formal ports, instances and nodes
//! - **Instance**: a usage of a master cell inside another cell
//! - **Node**: a named net, holding the instance ports attached to it
//! - **InstPort**: the binding of one formal port of one instance to one node
//!
//! Instances and nodes are iterated in name order, which makes every analysis built on top of
//! the model deterministic.
//!
//! # Example
//!
//! ```
//! use netrank::netlist::{Design, PortDirection};
//!
//! let mut design = Design::new("demo");
//! let inv = design.add_cell("inv").unwrap();
//! design.add_port(inv, "a", PortDirection::In).unwrap();
//! design.add_port(inv, "y", PortDirection::Out).unwrap();
//!
//! let top = design.add_cell("top").unwrap();
//! let n = design.add_node(top, "n");
//! let u1 = design.add_instance(top, "u1", inv).unwrap();
//! design.connect(top, u1, "a", n).unwrap();
//!
//! assert_eq!(design.cell(top).instance_count(), 1);
//! assert_eq!(design.cell(top).node(n).inst_ports().len(), 1);
//! ```

pub mod flatten;
pub mod hier_name;
#[cfg(test)]
pub mod test_helpers;
pub mod verilog;

pub use flatten::flatten;
pub use hier_name::HierName;

use crate::Symbol;
use petgraph::{algo::toposort, graph::DiGraph};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::{error::Error, fmt};

/// Net names treated as power and ground when none are configured.
pub const DEFAULT_GLOBAL_NODES: &[&str] = &["VDD", "VSS"];

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(usize);

        impl $name {
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

arena_id!(
    /// Identifier of a cell inside a [`Design`].
    CellId
);
arena_id!(
    /// Identifier of an instance inside its containing [`Cell`].
    InstId
);
arena_id!(
    /// Identifier of a node inside its containing [`Cell`].
    NodeId
);
arena_id!(
    /// Identifier of a formal port inside the [`Cell`] that declares it.
    PortId
);
arena_id!(
    /// Identifier of an instance port inside the [`Cell`] holding the instance.
    InstPortId
);

/// Direction of a formal port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortDirection {
    In,
    Out,
    InOut,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortDirection::In => write!(f, "input"),
            PortDirection::Out => write!(f, "output"),
            PortDirection::InOut => write!(f, "inout"),
        }
    }
}

/// Formal terminal of a cell definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    name: Symbol,
    direction: PortDirection,
}

impl Port {
    pub fn name(&self) -> &Symbol {
        &self.name
    }

    pub fn direction(&self) -> PortDirection {
        self.direction
    }
}

/// A named net of a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    name: Symbol,
    inst_ports: Vec<InstPortId>,
}

impl Node {
    pub fn name(&self) -> &Symbol {
        &self.name
    }

    /// Instance ports attached to this node, in connection order.
    pub fn inst_ports(&self) -> &[InstPortId] {
        &self.inst_ports
    }
}

/// A usage of a master cell inside another cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    name: Symbol,
    master: CellId,
    inst_ports: BTreeMap<Symbol, InstPortId>,
}

impl Instance {
    pub fn name(&self) -> &Symbol {
        &self.name
    }

    pub fn master(&self) -> CellId {
        self.master
    }

    /// Connected instance ports keyed by formal port name.
    pub fn inst_ports(&self) -> &BTreeMap<Symbol, InstPortId> {
        &self.inst_ports
    }
}

/// Binding of one formal port of one instance to one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstPort {
    inst: InstId,
    port: PortId,
    port_name: Symbol,
    node: NodeId,
}

impl InstPort {
    pub fn inst(&self) -> InstId {
        self.inst
    }

    /// Formal port, addressed inside the instance's master cell.
    pub fn port(&self) -> PortId {
        self.port
    }

    pub fn port_name(&self) -> &Symbol {
        &self.port_name
    }

    pub fn node(&self) -> NodeId {
        self.node
    }
}

/// A module definition: formal ports, instances and nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    name: Symbol,
    ports: Vec<Port>,
    port_lut: HashMap<Symbol, PortId>,
    instances: Vec<Instance>,
    instance_lut: BTreeMap<Symbol, InstId>,
    nodes: Vec<Node>,
    node_lut: BTreeMap<Symbol, NodeId>,
    inst_ports: Vec<InstPort>,
}

impl Cell {
    pub fn new(name: impl Into<Symbol>) -> Self {
        Cell {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &Symbol {
        &self.name
    }

    /// Formal ports in declaration order.
    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn port(&self, id: PortId) -> &Port {
        &self.ports[id.0]
    }

    pub fn port_named(&self, name: &str) -> Option<PortId> {
        self.port_lut.get(&Symbol::from(name)).copied()
    }

    pub fn instance(&self, id: InstId) -> &Instance {
        &self.instances[id.0]
    }

    pub fn instance_named(&self, name: &str) -> Option<InstId> {
        self.instance_lut.get(&Symbol::from(name)).copied()
    }

    /// Instances ordered by name.
    pub fn instances(&self) -> impl Iterator<Item = (InstId, &Instance)> + '_ {
        self.instance_lut
            .values()
            .map(move |&id| (id, &self.instances[id.0]))
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// A leaf cell has no instances.
    pub fn is_leaf(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_named(&self, name: &str) -> Option<NodeId> {
        self.node_lut.get(&Symbol::from(name)).copied()
    }

    /// Nodes ordered by name.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.node_lut
            .values()
            .map(move |&id| (id, &self.nodes[id.0]))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn inst_port(&self, id: InstPortId) -> &InstPort {
        &self.inst_ports[id.0]
    }

    fn add_port(&mut self, name: Symbol, direction: PortDirection) -> Result<PortId, NetlistError> {
        if self.port_lut.contains_key(&name) {
            return Err(NetlistError::MultipleDefinitions {
                kind: "port",
                name,
            });
        }
        let id = PortId(self.ports.len());
        self.ports.push(Port {
            name: name.clone(),
            direction,
        });
        self.port_lut.insert(name, id);
        Ok(id)
    }

    /// Returns the node called `name`, creating it when missing.
    pub(crate) fn add_node(&mut self, name: Symbol) -> NodeId {
        if let Some(id) = self.node_lut.get(&name) {
            return *id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.clone(),
            inst_ports: Vec::new(),
        });
        self.node_lut.insert(name, id);
        id
    }

    pub(crate) fn add_instance(&mut self, name: Symbol, master: CellId) -> Result<InstId, NetlistError> {
        if self.instance_lut.contains_key(&name) {
            return Err(NetlistError::MultipleDefinitions {
                kind: "instance",
                name,
            });
        }
        let id = InstId(self.instances.len());
        self.instances.push(Instance {
            name: name.clone(),
            master,
            inst_ports: BTreeMap::new(),
        });
        self.instance_lut.insert(name, id);
        Ok(id)
    }

    /// Binds `port` of `inst` to `node`. The port must already be resolved against the
    /// instance's master cell.
    pub(crate) fn connect(
        &mut self,
        inst: InstId,
        port: PortId,
        port_name: Symbol,
        node: NodeId,
    ) -> Result<InstPortId, NetlistError> {
        let id = InstPortId(self.inst_ports.len());
        let instance = &mut self.instances[inst.0];
        if instance.inst_ports.contains_key(&port_name) {
            return Err(NetlistError::DuplicateConnection {
                instance: instance.name.clone(),
                port: port_name,
            });
        }
        instance.inst_ports.insert(port_name.clone(), id);
        self.nodes[node.0].inst_ports.push(id);
        self.inst_ports.push(InstPort {
            inst,
            port,
            port_name,
            node,
        });
        Ok(id)
    }
}

/// Set of net names excluded from propagation (power and ground).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalNodes(HashSet<Symbol>);

impl GlobalNodes {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        GlobalNodes(names.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, name: &Symbol) -> bool {
        self.0.contains(name)
    }
}

impl Default for GlobalNodes {
    fn default() -> Self {
        GlobalNodes::new(DEFAULT_GLOBAL_NODES.iter().copied())
    }
}

/// Errors raised while building or validating a [`Design`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetlistError {
    MultipleDefinitions { kind: &'static str, name: Symbol },
    UndefinedCell(Symbol),
    UndefinedPort { cell: Symbol, port: Symbol },
    DuplicateConnection { instance: Symbol, port: Symbol },
    MissingDirection { cell: Symbol, port: Symbol },
    RecursiveHierarchy(Symbol),
}

impl fmt::Display for NetlistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetlistError::MultipleDefinitions { kind, name } => {
                write!(f, "Multiple Definitions of {} {}", kind, name)
            }
            NetlistError::UndefinedCell(name) => write!(f, "Undefined Cell: {}", name),
            NetlistError::UndefinedPort { cell, port } => {
                write!(f, "Undefined Port: {} has no port {}", cell, port)
            }
            NetlistError::DuplicateConnection { instance, port } => {
                write!(f, "Port {} of instance {} connected twice", port, instance)
            }
            NetlistError::MissingDirection { cell, port } => {
                write!(f, "Port {} of {} has no direction", port, cell)
            }
            NetlistError::RecursiveHierarchy(name) => {
                write!(f, "Cell {} instantiates itself", name)
            }
        }
    }
}

impl Error for NetlistError {}

/// Arena of cells forming a hierarchical design.
#[derive(Debug, Clone, Default)]
pub struct Design {
    name: Symbol,
    cells: Vec<Cell>,
    cell_lut: HashMap<Symbol, CellId>,
}

impl Design {
    pub fn new(name: impl Into<Symbol>) -> Self {
        Design {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &Symbol {
        &self.name
    }

    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id.0]
    }

    pub fn cell_named(&self, name: &str) -> Option<CellId> {
        self.cell_lut.get(&Symbol::from(name)).copied()
    }

    pub fn cells(&self) -> impl Iterator<Item = (CellId, &Cell)> {
        self.cells.iter().enumerate().map(|(i, c)| (CellId(i), c))
    }

    pub fn add_cell(&mut self, name: impl Into<Symbol>) -> Result<CellId, NetlistError> {
        self.insert_cell(Cell::new(name))
    }

    /// Moves a fully built cell into the design.
    pub fn insert_cell(&mut self, cell: Cell) -> Result<CellId, NetlistError> {
        if self.cell_lut.contains_key(&cell.name) {
            return Err(NetlistError::MultipleDefinitions {
                kind: "cell",
                name: cell.name,
            });
        }
        let id = CellId(self.cells.len());
        self.cell_lut.insert(cell.name.clone(), id);
        self.cells.push(cell);
        Ok(id)
    }

    pub fn add_port(
        &mut self,
        cell: CellId,
        name: impl Into<Symbol>,
        direction: PortDirection,
    ) -> Result<PortId, NetlistError> {
        self.cells[cell.0].add_port(name.into(), direction)
    }

    /// Returns the node called `name` in `cell`, creating it when missing.
    pub fn add_node(&mut self, cell: CellId, name: impl Into<Symbol>) -> NodeId {
        self.cells[cell.0].add_node(name.into())
    }

    pub fn add_instance(
        &mut self,
        cell: CellId,
        name: impl Into<Symbol>,
        master: CellId,
    ) -> Result<InstId, NetlistError> {
        self.cells[cell.0].add_instance(name.into(), master)
    }

    /// Connects the formal port `port_name` of `inst` to `node`, resolving the port against the
    /// instance's master cell.
    pub fn connect(
        &mut self,
        cell: CellId,
        inst: InstId,
        port_name: impl Into<Symbol>,
        node: NodeId,
    ) -> Result<InstPortId, NetlistError> {
        let port_name = port_name.into();
        let master = &self.cells[self.cells[cell.0].instance(inst).master.0];
        let port = master
            .port_named(&port_name)
            .ok_or_else(|| NetlistError::UndefinedPort {
                cell: master.name.clone(),
                port: port_name.clone(),
            })?;
        self.cells[cell.0].connect(inst, port, port_name, node)
    }

    /// Formal port bound by an instance port of `cell`.
    pub fn inst_port_port(&self, cell: CellId, id: InstPortId) -> &Port {
        let cell = self.cell(cell);
        let ip = cell.inst_port(id);
        let master = cell.instance(ip.inst).master;
        self.cell(master).port(ip.port)
    }

    /// Rejects designs whose master-cell graph contains a cycle.
    pub fn validate_hierarchy(&self) -> Result<(), NetlistError> {
        let mut graph = DiGraph::<CellId, ()>::with_capacity(self.cells.len(), 0);
        let ix: Vec<_> = self.cells().map(|(id, _)| graph.add_node(id)).collect();
        for (id, cell) in self.cells() {
            for instance in cell.instances.iter() {
                graph.update_edge(ix[id.0], ix[instance.master.0], ());
            }
        }

        toposort(&graph, None)
            .map(|_| ())
            .map_err(|cycle| NetlistError::RecursiveHierarchy(self.cell(graph[cycle.node_id()]).name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instances_and_nodes_iterate_by_name() {
        let mut d = Design::new("d");
        let leaf = d.add_cell("leaf").unwrap();
        let top = d.add_cell("top").unwrap();
        d.add_instance(top, "z", leaf).unwrap();
        d.add_instance(top, "a", leaf).unwrap();
        d.add_node(top, "n2");
        d.add_node(top, "n1");

        let cell = d.cell(top);
        let insts: Vec<_> = cell.instances().map(|(_, i)| i.name().to_string()).collect();
        let nodes: Vec<_> = cell.nodes().map(|(_, n)| n.name().to_string()).collect();
        assert_eq!(insts, vec!["a", "z"]);
        assert_eq!(nodes, vec!["n1", "n2"]);
    }

    #[test]
    fn add_node_is_idempotent() {
        let mut d = Design::new("d");
        let top = d.add_cell("top").unwrap();
        let a = d.add_node(top, "a");
        assert_eq!(d.add_node(top, "a"), a);
        assert_eq!(d.cell(top).node_count(), 1);
    }

    #[test]
    fn duplicate_definitions_are_rejected() {
        let mut d = Design::new("d");
        let leaf = d.add_cell("leaf").unwrap();
        assert!(matches!(
            d.add_cell("leaf"),
            Err(NetlistError::MultipleDefinitions { kind: "cell", .. })
        ));
        d.add_port(leaf, "a", PortDirection::In).unwrap();
        assert!(matches!(
            d.add_port(leaf, "a", PortDirection::Out),
            Err(NetlistError::MultipleDefinitions { kind: "port", .. })
        ));
        let top = d.add_cell("top").unwrap();
        d.add_instance(top, "u1", leaf).unwrap();
        assert!(matches!(
            d.add_instance(top, "u1", leaf),
            Err(NetlistError::MultipleDefinitions { kind: "instance", .. })
        ));
    }

    #[test]
    fn connect_resolves_master_ports() {
        let mut d = Design::new("d");
        let leaf = d.add_cell("leaf").unwrap();
        d.add_port(leaf, "a", PortDirection::In).unwrap();
        let top = d.add_cell("top").unwrap();
        let n = d.add_node(top, "n");
        let u1 = d.add_instance(top, "u1", leaf).unwrap();

        let ip = d.connect(top, u1, "a", n).unwrap();
        assert_eq!(d.inst_port_port(top, ip).direction(), PortDirection::In);
        assert_eq!(d.cell(top).inst_port(ip).node(), n);
        assert_eq!(d.cell(top).inst_port(ip).inst(), u1);

        assert!(matches!(
            d.connect(top, u1, "b", n),
            Err(NetlistError::UndefinedPort { .. })
        ));
        assert!(matches!(
            d.connect(top, u1, "a", n),
            Err(NetlistError::DuplicateConnection { .. })
        ));
    }

    #[test]
    fn recursive_hierarchy_is_detected() {
        let mut d = Design::new("d");
        let a = d.add_cell("a").unwrap();
        let b = d.add_cell("b").unwrap();
        d.add_instance(a, "u1", b).unwrap();
        assert!(d.validate_hierarchy().is_ok());

        d.add_instance(b, "u2", a).unwrap();
        assert!(matches!(
            d.validate_hierarchy(),
            Err(NetlistError::RecursiveHierarchy(_))
        ));
    }

    #[test]
    fn default_global_nodes() {
        let globals = GlobalNodes::default();
        assert!(globals.contains(&Symbol::from("VDD")));
        assert!(globals.contains(&Symbol::from("VSS")));
        assert!(!globals.contains(&Symbol::from("CLK")));
    }
}
