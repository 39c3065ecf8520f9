use crate::error::SetupError;
use crate::models::drive::DriveRecord;
use std::collections::HashMap;

/// Drives keyed by serial, kept in discovery order.
#[derive(Debug, Default)]
pub struct DriveSet {
    drives:     Vec<DriveRecord>,
    by_serial:  HashMap<String, usize>,
    /// Records dropped because their serial was already seen.
    pub duplicates: Vec<DriveRecord>,
}

impl DriveSet {
    pub fn get(&self, serial: &str) -> Option<&DriveRecord> {
        self.by_serial.get(serial).map(|&i| &self.drives[i])
    }

    pub fn drives(&self) -> &[DriveRecord] { &self.drives }
    pub fn len(&self) -> usize { self.drives.len() }
    pub fn is_empty(&self) -> bool { self.drives.is_empty() }

    pub fn require_non_empty(self) -> Result<Self, SetupError> {
        if self.is_empty() { Err(SetupError::NoDrives) } else { Ok(self) }
    }

    fn push(&mut self, rec: DriveRecord) {
        if let Some(&i) = self.by_serial.get(&rec.serial) {
            println!(
                "  Note: S/N {} seen again at {}, keeping {}",
                rec.serial, rec.address, self.drives[i].address
            );
            self.duplicates.push(rec);
            return;
        }
        self.by_serial.insert(rec.serial.clone(), self.drives.len());
        self.drives.push(rec);
    }
}

/// Keep the first record for each serial. Some bridges expose the same
/// disk through both bay addresses when only one bay is populated.
pub fn dedup(records: impl IntoIterator<Item = DriveRecord>) -> DriveSet {
    let mut set = DriveSet::default();
    for rec in records {
        set.push(rec);
    }
    set
}
