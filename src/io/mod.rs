//! File I/O module
//!
//! Temporary data file handling and the `.npy` array format.

pub mod npy;
pub mod temp_file;

pub use npy::{payload_bytes, read_array, write_array};
pub use temp_file::{random_suffix, temp_file_path, TempFile};
