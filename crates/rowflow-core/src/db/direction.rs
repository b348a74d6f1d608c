use serde::{Deserialize, Serialize};

///
/// Direction
///
/// Sort direction of one ordering key part.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}
