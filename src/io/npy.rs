//! `.npy` encoding of sample buffers

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use ndarray::Array1;
use ndarray_npy::{ReadNpyExt, WriteNpyExt};

use crate::Result;

const WRITE_BUFFER_SIZE: usize = 8 * 1024 * 1024;

/// Serialize `data` as a NumPy `.npy` array and flush it to `writer`.
pub fn write_array<W: Write>(writer: W, data: &Array1<f64>) -> Result<()> {
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, writer);
    data.write_npy(&mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Read back a one-dimensional `f64` array
pub fn read_array(path: &Path) -> Result<Array1<f64>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(Array1::<f64>::read_npy(reader)?)
}

/// In-memory size of the array payload in bytes
pub fn payload_bytes(data: &Array1<f64>) -> u64 {
    (data.len() * std::mem::size_of::<f64>()) as u64
}
