use crate::error::{EtlError, Result};
use crate::utils::filename::decompressed_name;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Inflate a single-member `.gz` file into `dest_dir`, dropping the `.gz` suffix
pub fn decompress_gz(src: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let file_name = src
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| EtlError::InvalidFileName(src.display().to_string()))?;
    let dest_path = dest_dir.join(decompressed_name(file_name));

    decompress_gz_to(src, &dest_path)?;
    Ok(dest_path)
}

pub fn decompress_gz_to(src: &Path, dest_path: &Path) -> Result<u64> {
    let mut decoder = GzDecoder::new(BufReader::new(File::open(src)?));

    let mut writer = BufWriter::new(File::create(dest_path)?);
    let bytes = std::io::copy(&mut decoder, &mut writer)?;
    writer.flush()?;

    Ok(bytes)
}
