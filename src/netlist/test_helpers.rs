//! Test helpers for building small designs.
//!
//! Leaf cells created here declare a node for every port, like modules read from Verilog do.

use crate::netlist::*;

/// Declare a leaf cell with the given input and output ports.
pub fn leaf_cell(design: &mut Design, name: &str, inputs: &[&str], outputs: &[&str]) -> CellId {
    let cell = design.add_cell(name).unwrap();
    for port in inputs {
        design.add_port(cell, *port, PortDirection::In).unwrap();
        design.add_node(cell, *port);
    }
    for port in outputs {
        design.add_port(cell, *port, PortDirection::Out).unwrap();
        design.add_node(cell, *port);
    }
    cell
}

/// Instantiate `master` in `cell` as `name`, connecting `(port, node)` pairs. Nodes are created
/// as needed.
pub fn place(
    design: &mut Design,
    cell: CellId,
    name: &str,
    master: CellId,
    connections: &[(&str, &str)],
) -> InstId {
    let inst = design.add_instance(cell, name, master).unwrap();
    for (port, node) in connections {
        let node = design.add_node(cell, *node);
        design.connect(cell, inst, *port, node).unwrap();
    }
    inst
}

/// Declare ports on a hierarchical cell, with their nodes.
pub fn ports(design: &mut Design, cell: CellId, inputs: &[&str], outputs: &[&str]) {
    for port in inputs {
        design.add_port(cell, *port, PortDirection::In).unwrap();
        design.add_node(cell, *port);
    }
    for port in outputs {
        design.add_port(cell, *port, PortDirection::Out).unwrap();
        design.add_node(cell, *port);
    }
}

/// Standard cells used by the fixtures: `and2`, `inv` and `or3`.
pub struct Library {
    pub and2: CellId,
    pub inv: CellId,
    pub or3: CellId,
}

pub fn library(design: &mut Design) -> Library {
    Library {
        and2: leaf_cell(design, "and2", &["a", "b"], &["y"]),
        inv: leaf_cell(design, "inv", &["a"], &["y"]),
        or3: leaf_cell(design, "or3", &["a", "b", "c"], &["y"]),
    }
}

/// Two-level design.
///
/// ```text
/// mid (a, b -> y):  g1 = and2(a, b) -> t
///                   g2 = inv(t) -> u
///                   o1 = or3(u, b, VDD) -> y
///
/// top (x, z -> out): m1 = mid(x, z) -> w1
///                    m2 = mid(w1, z) -> w2
///                    o0 = or3(w2, x, VSS) -> out
/// ```
pub fn nested_design() -> (Design, CellId) {
    let mut d = Design::new("nested");
    let lib = library(&mut d);

    let mid = d.add_cell("mid").unwrap();
    ports(&mut d, mid, &["a", "b"], &["y"]);
    place(&mut d, mid, "g1", lib.and2, &[("a", "a"), ("b", "b"), ("y", "t")]);
    place(&mut d, mid, "g2", lib.inv, &[("a", "t"), ("y", "u")]);
    place(
        &mut d,
        mid,
        "o1",
        lib.or3,
        &[("a", "u"), ("b", "b"), ("c", "VDD"), ("y", "y")],
    );

    let top = d.add_cell("top").unwrap();
    ports(&mut d, top, &["x", "z"], &["out"]);
    place(&mut d, top, "m1", mid, &[("a", "x"), ("b", "z"), ("y", "w1")]);
    place(&mut d, top, "m2", mid, &[("a", "w1"), ("b", "z"), ("y", "w2")]);
    place(
        &mut d,
        top,
        "o0",
        lib.or3,
        &[("a", "w2"), ("b", "x"), ("c", "VSS"), ("y", "out")],
    );

    d.validate_hierarchy().unwrap();
    (d, top)
}

/// Flat three-stage chain: `A = and2(i1, i2)`, `B = and2(A, i3)`, `C = inv(B)`.
pub fn chain_design() -> (Design, CellId) {
    let mut d = Design::new("chain");
    let lib = library(&mut d);

    let top = d.add_cell("chain").unwrap();
    ports(&mut d, top, &["i1", "i2", "i3"], &["o"]);
    place(&mut d, top, "C", lib.inv, &[("a", "n2"), ("y", "o")]);
    place(&mut d, top, "B", lib.and2, &[("a", "n1"), ("b", "i3"), ("y", "n2")]);
    place(&mut d, top, "A", lib.and2, &[("a", "i1"), ("b", "i2"), ("y", "n1")]);

    (d, top)
}
