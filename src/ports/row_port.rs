//! Row source port trait.

use crate::domain::error::ConvertError;
use crate::domain::raw_row::RawRow;
use std::path::Path;

pub trait RowPort {
    /// Reads every usable row from `path`, in file order.
    fn read_rows(&self, path: &Path) -> Result<Vec<RawRow>, ConvertError>;
}
