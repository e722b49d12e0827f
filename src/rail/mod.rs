//! Multi-rail NIC identification and canonical ordering.
//!
//! Multi-rail platforms expose their NICs in discovery order, which differs
//! between hosts. Striping only lines up across peers when every process
//! assigns the same rail to the same logical slot, so discovered NICs are
//! rewritten into a canonical order derived from their hardware identifiers.

pub mod guid;
pub mod sorter;

pub use guid::{parse_vf_index, GuidSource, SysfsGuidSource};
pub use sorter::{sort_rails, RailNic};
