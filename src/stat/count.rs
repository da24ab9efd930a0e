//! Occurrence counting of a target cell type.
//!
//! - [`count_matches`] walks the folded hierarchy and scans every distinct cell body once, so a
//!   target instantiated inside a cell that is itself used `k` times is counted once.
//! - [`count_flat_matches`] scans a flattened cell, where each occurrence is its own instance.

use std::collections::HashSet;

use log::debug;

use crate::netlist::{CellId, Design};

/// Count instances of `target` in the folded hierarchy below `root`.
///
/// Matching instances are not descended into. Every other master cell is pushed on a work-list
/// and scanned at most once, however many times it is instantiated.
///
/// # Example
///
/// ```
/// use netrank::netlist::verilog::parse;
/// use netrank::stat::count::count_matches;
///
/// let design = parse(r#"
///     module top(input a); inv u (.a(a)); endmodule
///     module inv(input a); endmodule
/// "#).unwrap();
/// let top = design.cell_named("top").unwrap();
/// assert_eq!(count_matches(&design, top, "inv"), 1);
/// assert_eq!(count_matches(&design, top, "or3"), 0);
/// ```
pub fn count_matches(design: &Design, root: CellId, target: &str) -> usize {
    let mut count = 0;
    let mut visited = HashSet::new();
    let mut stack = vec![root];

    while let Some(cell) = stack.pop() {
        if !visited.insert(cell) {
            continue;
        }

        for (_, instance) in design.cell(cell).instances() {
            let master = instance.master();
            if design.cell(master).name().as_ref() == target {
                count += 1;
            } else if !visited.contains(&master) {
                stack.push(master);
            }
        }
    }

    debug!(
        "{} folded occurrences of {} in {} cells",
        count,
        target,
        visited.len()
    );
    count
}

/// Count instances of `target` in a flattened cell.
pub fn count_flat_matches(design: &Design, flat: CellId, target: &str) -> usize {
    design
        .cell(flat)
        .instances()
        .filter(|(_, instance)| design.cell(instance.master()).name().as_ref() == target)
        .count()
}
