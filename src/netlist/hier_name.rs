//! Hierarchical names.
//!
//! Flattening encodes the instance path in plain cell-local names, with path segments joined by
//! [`PATH_SEPARATOR`]. [`HierName`] keeps the path as a sequence of segments instead.
//! [`HierName::encode`] only ever writes [`PATH_SEPARATOR`]; [`PORT_SEPARATOR`] is accepted by
//! [`HierName::parse`] so that names written as `<instance path>%<port>` decode to the same
//! segments.

use crate::Symbol;
use itertools::Itertools;
use std::fmt;

/// Separator between hierarchy levels in flattened names.
pub const PATH_SEPARATOR: char = '/';
/// Separator between an instance path and a formal port name, accepted on parse only.
pub const PORT_SEPARATOR: char = '%';

/// Ordered sequence of hierarchy segments, outermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HierName {
    segments: Vec<Symbol>,
}

impl HierName {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        HierName {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Splits an encoded name on both reserved separators. Empty segments are dropped.
    pub fn parse(encoded: &str) -> Self {
        HierName::new(
            encoded
                .split([PATH_SEPARATOR, PORT_SEPARATOR])
                .filter(|s| !s.is_empty()),
        )
    }

    /// Returns a new name with `segment` appended.
    pub fn child(&self, segment: impl Into<Symbol>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        HierName { segments }
    }

    /// Number of hierarchy levels in the name.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Encodes the path as a cell-local name, segments joined with [`PATH_SEPARATOR`].
    pub fn encode(&self) -> String {
        self.segments.iter().join(&PATH_SEPARATOR.to_string())
    }

    /// Report form: the display form without its leading separator.
    pub fn to_report(&self) -> String {
        self.encode()
    }
}

/// Display form, with a leading separator: `/i1/i2/n`.
impl fmt::Display for HierName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in self.segments.iter() {
            write!(f, "{}{}", PATH_SEPARATOR, segment)?;
        }
        Ok(())
    }
}
