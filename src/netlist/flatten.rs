//! Hierarchy flattening.
//!
//! [`flatten`] collapses the hierarchy below a top cell into a single cell that only instantiates
//! leaf cells. Every leaf occurrence becomes one instance named after its instance path, and
//! every net becomes one node:
//!
//! - top-level nodes keep their names
//! - internal nodes are named `<instance path>/<node>`
//! - a node bound to a port of its parent instance is merged with the parent's actual node
//! - global nodes are merged into one node of the flat cell, whatever the level they appear at

use std::collections::HashMap;

use log::{debug, info};

use super::{Cell, CellId, Design, GlobalNodes, HierName, NetlistError, NodeId};
use crate::Symbol;

struct Frame {
    cell: CellId,
    path: HierName,
    bindings: HashMap<NodeId, NodeId>,
}

/// Flattens `top` into a new cell called `name`, adds it to `design` and returns its identifier.
///
/// # Example
///
/// ```
/// use netrank::netlist::{Design, GlobalNodes, PortDirection, flatten};
///
/// let mut design = Design::new("demo");
/// let inv = design.add_cell("inv").unwrap();
/// design.add_port(inv, "a", PortDirection::In).unwrap();
/// let buf = design.add_cell("buf").unwrap();
/// design.add_port(buf, "a", PortDirection::In).unwrap();
/// let a = design.add_node(buf, "a");
/// let u = design.add_instance(buf, "u", inv).unwrap();
/// design.connect(buf, u, "a", a).unwrap();
///
/// let flat = flatten(&mut design, "buf_flat", buf, &GlobalNodes::default()).unwrap();
/// assert!(design.cell(flat).instance_named("u").is_some());
/// ```
pub fn flatten(
    design: &mut Design,
    name: impl Into<Symbol>,
    top: CellId,
    globals: &GlobalNodes,
) -> Result<CellId, NetlistError> {
    let flat = flatten_cell(design, name.into(), top, globals)?;
    info!(
        "Flattened {} into {} ({} instances, {} nodes)",
        design.cell(top).name(),
        flat.name(),
        flat.instance_count(),
        flat.node_count()
    );
    design.insert_cell(flat)
}

fn flatten_cell(
    design: &Design,
    name: Symbol,
    top: CellId,
    globals: &GlobalNodes,
) -> Result<Cell, NetlistError> {
    let mut flat = Cell::new(name);
    for port in design.cell(top).ports() {
        flat.add_port(port.name().clone(), port.direction())?;
    }

    let mut stack = vec![Frame {
        cell: top,
        path: HierName::default(),
        bindings: HashMap::new(),
    }];

    while let Some(Frame {
        cell,
        path,
        bindings,
    }) = stack.pop()
    {
        let cell = design.cell(cell);
        debug!("Flattening {} at {}", cell.name(), path);

        let local: HashMap<NodeId, NodeId> = cell
            .nodes()
            .map(|(id, node)| {
                let flat_node = match bindings.get(&id) {
                    Some(bound) => *bound,
                    None if globals.contains(node.name()) => flat.add_node(node.name().clone()),
                    None => flat.add_node(path.child(node.name().clone()).encode().into()),
                };
                (id, flat_node)
            })
            .collect();

        for (_, instance) in cell.instances() {
            let inst_path = path.child(instance.name().clone());
            let master = design.cell(instance.master());

            if master.is_leaf() {
                let fi = flat.add_instance(inst_path.encode().into(), instance.master())?;
                for (port_name, ip) in instance.inst_ports() {
                    let ip = cell.inst_port(*ip);
                    flat.connect(fi, ip.port(), port_name.clone(), local[&ip.node()])?;
                }
            } else {
                let bindings = instance
                    .inst_ports()
                    .iter()
                    .filter_map(|(port_name, ip)| {
                        let inner = master.node_named(port_name)?;
                        Some((inner, local[&cell.inst_port(*ip).node()]))
                    })
                    .collect();
                stack.push(Frame {
                    cell: instance.master(),
                    path: inst_path,
                    bindings,
                });
            }
        }
    }

    Ok(flat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlist::test_helpers::*;

    #[test]
    fn leaf_instances_are_named_by_path() {
        let (mut design, top) = nested_design();
        let flat = flatten(&mut design, "top_flat", top, &GlobalNodes::default()).unwrap();
        let flat = design.cell(flat);

        let names: Vec<_> = flat.instances().map(|(_, i)| i.name().to_string()).collect();
        assert_eq!(
            names,
            vec!["m1/g1", "m1/g2", "m1/o1", "m2/g1", "m2/g2", "m2/o1", "o0"]
        );
        assert!(flat.instances().all(|(_, i)| design.cell(i.master()).is_leaf()));
    }

    #[test]
    fn port_nodes_merge_with_parent_nets() {
        let (mut design, top) = nested_design();
        let flat = flatten(&mut design, "top_flat", top, &GlobalNodes::default()).unwrap();
        let flat = design.cell(flat);

        // top net "x" drives the "a" port of m1 which feeds m1/g1
        let x = flat.node_named("x").unwrap();
        let g1 = flat.instance_named("m1/g1").unwrap();
        let attached: Vec<_> = flat
            .node(x)
            .inst_ports()
            .iter()
            .map(|ip| flat.inst_port(*ip).inst())
            .collect();
        assert!(attached.contains(&g1));
        assert!(flat.node_named("m1/a").is_none());
        assert!(flat.node_named("m1/t").is_some());
    }

    #[test]
    fn global_nodes_are_shared() {
        let (mut design, top) = nested_design();
        let flat = flatten(&mut design, "top_flat", top, &GlobalNodes::default()).unwrap();
        let flat = design.cell(flat);

        assert!(flat.node_named("VDD").is_some());
        assert!(flat.node_named("m1/VDD").is_none());
        assert!(flat.node_named("m2/VDD").is_none());
    }

    #[test]
    fn flat_cell_is_registered_in_design() {
        let (mut design, top) = nested_design();
        let flat = flatten(&mut design, "top_flat", top, &GlobalNodes::default()).unwrap();
        assert_eq!(design.cell_named("top_flat"), Some(flat));
        assert_eq!(design.cell(flat).ports().len(), design.cell(top).ports().len());
        assert!(matches!(
            flatten(&mut design, "top_flat", top, &GlobalNodes::default()),
            Err(NetlistError::MultipleDefinitions { kind: "cell", .. })
        ));
    }
}
