//! NIC hardware identifiers and virtual-function index extraction.

use std::path::PathBuf;

use crate::constants::guid::{GUID_LEN, LAST_COLON_OFFSET, VF_DIGITS_OFFSET};
use crate::constants::identity::{INFINIBAND_CLASS_DIR, NODE_GUID_FILE};
use crate::error::{PlatformError, Result};
use crate::sysfs::read_first_line;
use crate::types::VfIndex;

/// Source of per-device node GUIDs.
///
/// Injected into the sorter so tests and non-sysfs hosts can supply
/// identifiers directly.
pub trait GuidSource {
    /// The node GUID string for a device, first line only.
    fn node_guid(&self, device: &str) -> Result<String>;
}

/// [`GuidSource`] reading `<root>/<device>/node_guid` from sysfs.
#[derive(Debug)]
pub struct SysfsGuidSource {
    root: PathBuf,
}

impl Default for SysfsGuidSource {
    fn default() -> Self {
        Self {
            root: PathBuf::from(INFINIBAND_CLASS_DIR),
        }
    }
}

impl SysfsGuidSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source rooted at an alternate class directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl GuidSource for SysfsGuidSource {
    fn node_guid(&self, device: &str) -> Result<String> {
        let path = self.root.join(device).join(NODE_GUID_FILE);
        read_first_line(&path).map_err(PlatformError::Io)
    }
}

/// Extract the virtual-function index from a node GUID.
///
/// The GUID is a 64-bit hex number formatted `XXXX:XXXX:XXXX:XXXX`; its
/// lowest byte is the VF index. Any format violation is fatal, since a
/// best-effort ordering would silently break rail-to-peer correspondence.
pub fn parse_vf_index(guid: &str) -> Result<VfIndex> {
    if guid.len() != GUID_LEN {
        return Err(PlatformError::Guid(format!(
            "wrong size: {:?}",
            guid
        )));
    }

    if guid.as_bytes()[LAST_COLON_OFFSET] != b':' {
        return Err(PlatformError::Guid(format!(
            "wrong colon position: {:?}",
            guid
        )));
    }

    let idx: u8 = guid
        .get(VF_DIGITS_OFFSET..)
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(|| PlatformError::Guid(format!("cannot locate vf_idx in {:?}", guid)))?;

    VfIndex::new(idx)
}
