pub mod badblocks;
pub mod exec;
pub mod inventory;
pub mod lsblk;
pub mod smart;
pub mod smartctl;
