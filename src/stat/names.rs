//! Collection of the hierarchical names found at a given depth of a flattened cell.

use itertools::Itertools;
use log::debug;

use crate::netlist::{CellId, Design, HierName};

/// Hierarchical names of the instance ports of `flat` that are exactly `target_depth` levels
/// deep, sorted by their display form.
///
/// The name of an instance port is its instance path followed by the formal port name, so a
/// port of a leaf instance nested `k` levels below the top has depth `k + 1`. The target depth
/// is usually [`max_hierarchy_depth`](super::depth::max_hierarchy_depth) of the unflattened top
/// cell. Identical names are kept.
pub fn collect_deepest_names(design: &Design, flat: CellId, target_depth: usize) -> Vec<HierName> {
    let cell = design.cell(flat);
    let names = cell
        .instances()
        .flat_map(|(_, instance)| {
            let path = HierName::parse(instance.name());
            instance
                .inst_ports()
                .keys()
                .map(move |port| path.child(port.clone()))
        })
        .filter(|name| name.depth() == target_depth)
        .map(|name| (name.to_string(), name))
        .sorted_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, name)| name)
        .collect::<Vec<_>>();

    debug!(
        "{} names at depth {} in {}",
        names.len(),
        target_depth,
        cell.name()
    );
    names
}
