use crate::editing::range::Range;

/// Result of committing a range through [`Change::apply`](crate::editing::Change::apply)
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub range: Range,
    pub version: u64,
}
