use serde::Serialize;
use std::collections::BTreeMap;

/// A whole-disk block device visible to the host, as reported by lsblk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockDeviceEntry {
    /// Device path, e.g. `/dev/sdc`.
    pub name:       String,
    pub size_bytes: u64,
}

/// Device path → size in bytes, snapshotted once per run.
///
/// Backed by a `BTreeMap` so iteration is in device-name order; the
/// capacity matcher relies on this for its tie-break.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CapacityIndex {
    devices: BTreeMap<String, u64>,
}

impl CapacityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: BlockDeviceEntry) {
        self.devices.insert(entry.name, entry.size_bytes);
    }

    /// Drop a device from the candidate set.
    pub fn remove(&mut self, name: &str) -> Option<u64> {
        self.devices.remove(name)
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<u64> {
        self.devices.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.devices.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize { self.devices.len() }
    pub fn is_empty(&self) -> bool { self.devices.is_empty() }
}

impl FromIterator<BlockDeviceEntry> for CapacityIndex {
    fn from_iter<I: IntoIterator<Item = BlockDeviceEntry>>(iter: I) -> Self {
        let mut idx = CapacityIndex::new();
        for entry in iter {
            idx.insert(entry);
        }
        idx
    }
}
