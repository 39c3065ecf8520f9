pub mod device;
pub mod drive;
pub mod selftest;
pub mod smart;
