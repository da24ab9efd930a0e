use crate::Symbol;
use crate::netlist::PortDirection;

#[derive(PartialEq, Eq, Debug)]
pub enum HeaderPort {
    /// Bare name; the direction comes from a preceding ANSI declaration or from the body.
    Named(Symbol),
    Declared(PortDirection, Symbol),
}

#[derive(PartialEq, Eq, Debug)]
pub enum Connections {
    Named(Vec<(Symbol, Option<Symbol>)>),
    Ordered(Vec<Symbol>),
}

#[derive(PartialEq, Eq, Debug)]
pub enum Item {
    Ports(PortDirection, Vec<Symbol>),
    Nets(Vec<Symbol>),
    Instance {
        master: Symbol,
        name: Symbol,
        connections: Connections,
    },
}

#[derive(PartialEq, Eq, Debug)]
pub struct Module {
    pub name: Symbol,
    pub header: Vec<HeaderPort>,
    pub items: Vec<Item>,
}

impl Module {
    pub fn new(name: Symbol, header: Vec<HeaderPort>, items: Vec<Item>) -> Module {
        Module {
            name,
            header,
            items,
        }
    }
}
