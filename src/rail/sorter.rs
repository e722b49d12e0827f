//! Deterministic assignment of discovered rails to canonical slots.

use tracing::trace;

use super::guid::{parse_vf_index, GuidSource};
use crate::constants::rail::VF_GROUP_COUNT;
use crate::error::{PlatformError, Result};

/// A discovered NIC the sorter can place. The transport's device structures
/// stay opaque; only the device name is needed to look up the identifier.
pub trait RailNic {
    fn device_name(&self) -> &str;
}

impl RailNic for String {
    fn device_name(&self) -> &str {
        self
    }
}

/// Reorder discovered rails into canonical slots.
///
/// Rails alternate between two physical NIC groups; group 0 occupies the
/// first half of the slots and group 1 the second half, so peers that
/// discovered their rails in different orders still stripe rail-for-rail.
/// The output is rebuilt into a fresh buffer. Every failure aborts the
/// whole sort; there is no partial or best-effort ordering.
pub fn sort_rails<N: RailNic>(nics: Vec<N>, guids: &impl GuidSource) -> Result<Vec<N>> {
    let num_rails = nics.len();
    if num_rails == 0 {
        return Ok(nics);
    }

    let mut slots: Vec<Option<N>> = Vec::with_capacity(num_rails);
    slots.resize_with(num_rails, || None);

    // Group 0 fills slots from 0, group 1 from the midpoint.
    let mut next_slot = [0, num_rails / 2];
    debug_assert_eq!(next_slot.len(), VF_GROUP_COUNT);

    for (input_idx, nic) in nics.into_iter().enumerate() {
        let guid = guids.node_guid(nic.device_name())?;
        let vf_idx = parse_vf_index(&guid)?;

        let slot = next_slot[vf_idx.value()];
        next_slot[vf_idx.value()] += 1;

        trace!("Assigning rail index {} to input index {}", slot, input_idx);

        if slot >= num_rails {
            return Err(PlatformError::RailTopology(format!(
                "Rail group {} has more than {} members",
                vf_idx,
                num_rails / 2
            )));
        }
        if slots[slot].is_some() {
            return Err(PlatformError::RailTopology(format!(
                "Duplicate rail for slot {} ({})",
                slot, vf_idx
            )));
        }
        slots[slot] = Some(nic);
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(slot, nic)| {
            nic.ok_or_else(|| {
                PlatformError::RailTopology(format!("Rail slot {} was never filled", slot))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapGuidSource(HashMap<String, String>);

    impl MapGuidSource {
        fn new(entries: &[(&str, &str)]) -> Self {
            Self(
                entries
                    .iter()
                    .map(|(d, g)| (d.to_string(), g.to_string()))
                    .collect(),
            )
        }
    }

    impl GuidSource for MapGuidSource {
        fn node_guid(&self, device: &str) -> crate::error::Result<String> {
            self.0.get(device).cloned().ok_or_else(|| {
                PlatformError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    device.to_string(),
                ))
            })
        }
    }

    fn devices(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_empty_input_is_a_noop() {
        let guids = MapGuidSource::new(&[]);
        let sorted = sort_rails(Vec::<String>::new(), &guids).unwrap();
        assert!(sorted.is_empty());
    }

    #[test]
    fn test_interleaved_rails_sort_into_contiguous_halves() {
        // Discovery order alternates groups: vf indices [0, 1, 0, 1].
        let guids = MapGuidSource::new(&[
            ("rdmap0", "0000:1111:2222:0000"),
            ("rdmap1", "0000:1111:2222:0001"),
            ("rdmap2", "3333:4444:5555:0000"),
            ("rdmap3", "3333:4444:5555:0001"),
        ]);
        let sorted = sort_rails(devices(&["rdmap0", "rdmap1", "rdmap2", "rdmap3"]), &guids)
            .unwrap();

        // Group 0 rails land in slots 0..2, group 1 rails in slots 2..4.
        assert_eq!(sorted, devices(&["rdmap0", "rdmap2", "rdmap1", "rdmap3"]));
    }

    #[test]
    fn test_already_grouped_input_is_stable() {
        let guids = MapGuidSource::new(&[
            ("a", "0000:1111:2222:0000"),
            ("b", "3333:4444:5555:0000"),
            ("c", "0000:1111:2222:0001"),
            ("d", "3333:4444:5555:0001"),
        ]);
        let sorted = sort_rails(devices(&["a", "b", "c", "d"]), &guids).unwrap();
        assert_eq!(sorted, devices(&["a", "b", "c", "d"]));
    }

    #[test]
    fn test_two_rail_pair_sorts_by_group() {
        let guids = MapGuidSource::new(&[
            ("x", "0000:1111:2222:0001"),
            ("y", "0000:1111:2222:0000"),
        ]);
        let sorted = sort_rails(devices(&["x", "y"]), &guids).unwrap();
        assert_eq!(sorted, devices(&["y", "x"]));
    }

    #[test]
    fn test_unbalanced_groups_leave_a_slot_unfilled() {
        // Three group-0 rails and one group-1 rail: group 0 overflows into
        // the group-1 half and the sort must fail, never degrade.
        let guids = MapGuidSource::new(&[
            ("a", "0000:1111:2222:0000"),
            ("b", "3333:4444:5555:0000"),
            ("c", "6666:7777:8888:0000"),
            ("d", "0000:1111:2222:0001"),
        ]);
        let err = sort_rails(devices(&["a", "b", "c", "d"]), &guids).unwrap_err();
        assert!(matches!(err, PlatformError::RailTopology(_)));
    }

    #[test]
    fn test_malformed_guid_aborts_sort() {
        let guids = MapGuidSource::new(&[
            ("a", "0000:1111:2222:0000"),
            ("b", "not-a-guid"),
        ]);
        let err = sort_rails(devices(&["a", "b"]), &guids).unwrap_err();
        assert!(matches!(err, PlatformError::Guid(_)));
    }

    #[test]
    fn test_unreadable_guid_aborts_sort() {
        let guids = MapGuidSource::new(&[("a", "0000:1111:2222:0000")]);
        let err = sort_rails(devices(&["a", "missing"]), &guids).unwrap_err();
        assert!(matches!(err, PlatformError::Io(_)));
    }

    #[test]
    fn test_out_of_range_vf_index_aborts_sort() {
        let guids = MapGuidSource::new(&[
            ("a", "0000:1111:2222:0000"),
            ("b", "0000:1111:2222:0007"),
        ]);
        let err = sort_rails(devices(&["a", "b"]), &guids).unwrap_err();
        assert!(matches!(err, PlatformError::RailTopology(_)));
    }
}
