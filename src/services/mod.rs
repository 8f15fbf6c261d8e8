//! Accessory services
//!
//! The directory owns the accessory cache; the writer resolves, coerces and
//! writes characteristic values through it.

pub mod accessory_directory;
pub mod value_writer;

pub use accessory_directory::AccessoryDirectory;
pub use value_writer::{ValueWriter, WriteOutcome, WriteRequest};
