#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

mod file;
mod memory;

pub use file::JsonFileTaskStore;
pub use memory::MemoryTaskStore;
