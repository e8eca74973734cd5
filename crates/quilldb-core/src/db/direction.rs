use serde::{Deserialize, Serialize};
use std::fmt;

///
/// Direction
///
/// Canonical traversal direction shared by slice bounds, page requests, and
/// bound validation.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Asc => "ascending",
            Self::Desc => "descending",
        };
        write!(f, "{label}")
    }
}
