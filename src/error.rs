use std::error::Error;
use std::fmt;

/// Error returned by checked indexed access when the key is not in the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyNotFound;

impl fmt::Display for KeyNotFound {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("key not found")
    }
}

impl Error for KeyNotFound {}
