use crate::error::{EtlError, Result};
use crate::models::{GeoRaster, RasterData};
use crate::readers::geotiff_reader::tag;
use crate::utils::constants::{
    TAG_GDAL_NODATA, TAG_GEO_ASCII_PARAMS, TAG_GEO_DOUBLE_PARAMS, TAG_GEO_KEY_DIRECTORY,
    TAG_MODEL_PIXEL_SCALE, TAG_MODEL_TIEPOINT,
};
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tiff::encoder::colortype::{self, ColorType};
use tiff::encoder::{TiffEncoder, TiffValue};
use tracing::debug;

/// Writes a `GeoRaster` back out as a single-band GeoTIFF, keeping sample type and georeferencing
pub struct GeoTiffWriter;

impl GeoTiffWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write through a temporary file in the destination directory, then rename into place
    pub fn write(&self, raster: &GeoRaster, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let temp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            self.write_to(raster, &mut writer)?;
            writer.flush()?;
        }
        temp.persist(path).map_err(|e| EtlError::Io(e.error))?;

        debug!(
            "wrote {}x{} {} raster to {}",
            raster.width,
            raster.height,
            raster.data.dtype(),
            path.display()
        );
        Ok(())
    }

    pub fn write_to<W: Write + Seek>(&self, raster: &GeoRaster, writer: W) -> Result<()> {
        let expected = raster.width as usize * raster.height as usize;
        if raster.data.len() != expected {
            return Err(EtlError::InvalidRaster(format!(
                "buffer holds {} samples, raster is {}x{}",
                raster.data.len(),
                raster.width,
                raster.height
            )));
        }

        let mut encoder = TiffEncoder::new(writer)?;
        match &raster.data {
            RasterData::U8(v) => write_band::<colortype::Gray8, _>(&mut encoder, raster, v),
            RasterData::U16(v) => write_band::<colortype::Gray16, _>(&mut encoder, raster, v),
            RasterData::I16(v) => write_band::<colortype::GrayI16, _>(&mut encoder, raster, v),
            RasterData::I32(v) => write_band::<colortype::GrayI32, _>(&mut encoder, raster, v),
            RasterData::F32(v) => write_band::<colortype::Gray32Float, _>(&mut encoder, raster, v),
            RasterData::F64(v) => write_band::<colortype::Gray64Float, _>(&mut encoder, raster, v),
        }
    }
}

impl Default for GeoTiffWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn write_band<C, W>(encoder: &mut TiffEncoder<W>, raster: &GeoRaster, data: &[C::Inner]) -> Result<()>
where
    C: ColorType,
    [C::Inner]: TiffValue,
    W: Write + Seek,
{
    let mut image = encoder.new_image::<C>(raster.width, raster.height)?;
    {
        let dir = image.encoder();
        dir.write_tag(tag(TAG_MODEL_PIXEL_SCALE), &raster.transform.pixel_scale()[..])?;
        dir.write_tag(tag(TAG_MODEL_TIEPOINT), &raster.transform.tiepoint()[..])?;

        let keys = &raster.geo_keys;
        if !keys.directory.is_empty() {
            dir.write_tag(tag(TAG_GEO_KEY_DIRECTORY), &keys.directory[..])?;
        }
        if let Some(params) = &keys.double_params {
            dir.write_tag(tag(TAG_GEO_DOUBLE_PARAMS), &params[..])?;
        }
        if let Some(params) = &keys.ascii_params {
            dir.write_tag(tag(TAG_GEO_ASCII_PARAMS), params.as_str())?;
        }
        if let Some(nodata) = raster.nodata {
            dir.write_tag(tag(TAG_GDAL_NODATA), format_nodata(nodata).as_str())?;
        }
    }
    image.write_data(data)?;
    Ok(())
}

fn format_nodata(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GeoKeys, GeoTransform};
    use crate::readers::GeoTiffReader;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample_raster() -> GeoRaster {
        GeoRaster {
            width: 3,
            height: 2,
            transform: GeoTransform::new(34.0, 5.0, 0.05, -0.05),
            nodata: Some(-9999.0),
            geo_keys: GeoKeys {
                directory: vec![1, 1, 0, 3, 1024, 0, 1, 2, 1025, 0, 1, 1, 2048, 0, 1, 4326],
                double_params: None,
                ascii_params: Some("WGS 84|".to_string()),
            },
            data: RasterData::F32(vec![1.0, 2.5, -9999.0, 0.0, 12.25, 3.0]),
        }
    }

    #[test]
    fn test_written_raster_reads_back_identically() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/out.tif");
        let raster = sample_raster();

        GeoTiffWriter::new().write(&raster, &path).unwrap();
        let read_back = GeoTiffReader::new().read(&path).unwrap();

        assert_eq!(read_back, raster);
    }

    #[test]
    fn test_integer_sample_type_is_preserved() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("int.tif");
        let mut raster = sample_raster();
        raster.nodata = None;
        raster.data = RasterData::I16(vec![-1, 0, 1, 2, 3, 4]);

        GeoTiffWriter::new().write(&raster, &path).unwrap();
        let read_back = GeoTiffReader::new().read(&path).unwrap();

        assert_eq!(read_back.data, RasterData::I16(vec![-1, 0, 1, 2, 3, 4]));
        assert_eq!(read_back.nodata, None);
    }

    #[test]
    fn test_mismatched_buffer_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.tif");
        let mut raster = sample_raster();
        raster.width = 4;

        let result = GeoTiffWriter::new().write(&raster, &path);
        assert!(matches!(result, Err(EtlError::InvalidRaster(_))));
        assert!(!path.exists());
    }
}
