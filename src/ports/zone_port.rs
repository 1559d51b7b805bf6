//! Zone table access port trait.

use crate::domain::error::ZonetraderError;
use crate::domain::zone::ZoneSet;

pub trait ZonePort {
    /// The validated zone set for `code`. Instruments without configured
    /// zones get an empty set, not an error.
    fn zones_for(&self, code: &str) -> Result<ZoneSet, ZonetraderError>;
}
