use crate::error::{EtlError, Result};
use crate::models::{GeoKeys, GeoRaster, GeoTransform, RasterData};
use crate::utils::constants::{
    TAG_GDAL_NODATA, TAG_GEO_ASCII_PARAMS, TAG_GEO_DOUBLE_PARAMS, TAG_GEO_KEY_DIRECTORY,
    TAG_MODEL_PIXEL_SCALE, TAG_MODEL_TIEPOINT,
};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;

/// Reads single-band GeoTIFFs with ModelTiepoint/ModelPixelScale georeferencing
pub struct GeoTiffReader;

impl GeoTiffReader {
    pub fn new() -> Self {
        Self
    }

    pub fn read(&self, path: &Path) -> Result<GeoRaster> {
        let file = File::open(path)?;
        let mut decoder = Decoder::new(BufReader::new(file))?;

        self.read_from_decoder(&mut decoder)
            .map_err(|e| match e {
                EtlError::InvalidRaster(msg) => {
                    EtlError::InvalidRaster(format!("{}: {}", path.display(), msg))
                }
                other => other,
            })
    }

    fn read_from_decoder<R: Read + Seek>(&self, decoder: &mut Decoder<R>) -> Result<GeoRaster> {
        let (width, height) = decoder.dimensions()?;

        let scale = find_f64_vec(decoder, TAG_MODEL_PIXEL_SCALE)?
            .ok_or_else(|| EtlError::InvalidRaster("missing ModelPixelScale tag".to_string()))?;
        let tiepoint = find_f64_vec(decoder, TAG_MODEL_TIEPOINT)?
            .ok_or_else(|| EtlError::InvalidRaster("missing ModelTiepoint tag".to_string()))?;
        let transform = GeoTransform::from_tiepoint(&tiepoint, &scale).ok_or_else(|| {
            EtlError::InvalidRaster("unusable ModelTiepoint/ModelPixelScale values".to_string())
        })?;

        let geo_keys = GeoKeys {
            directory: match decoder.find_tag(tag(TAG_GEO_KEY_DIRECTORY))? {
                Some(value) => value.into_u16_vec()?,
                None => Vec::new(),
            },
            double_params: find_f64_vec(decoder, TAG_GEO_DOUBLE_PARAMS)?,
            ascii_params: match decoder.find_tag(tag(TAG_GEO_ASCII_PARAMS))? {
                Some(value) => Some(value.into_string()?),
                None => None,
            },
        };

        let nodata = match decoder.find_tag(tag(TAG_GDAL_NODATA))? {
            Some(value) => parse_nodata(&value.into_string()?),
            None => None,
        };

        let data = match decoder.read_image()? {
            DecodingResult::U8(v) => RasterData::U8(v),
            DecodingResult::U16(v) => RasterData::U16(v),
            DecodingResult::I16(v) => RasterData::I16(v),
            DecodingResult::I32(v) => RasterData::I32(v),
            DecodingResult::F32(v) => RasterData::F32(v),
            DecodingResult::F64(v) => RasterData::F64(v),
            _ => {
                return Err(EtlError::InvalidRaster(
                    "unsupported sample format".to_string(),
                ))
            }
        };

        if data.len() != width as usize * height as usize {
            return Err(EtlError::InvalidRaster(format!(
                "expected a single band of {}x{} samples, got {}",
                width,
                height,
                data.len()
            )));
        }

        Ok(GeoRaster {
            width,
            height,
            transform,
            nodata,
            geo_keys,
            data,
        })
    }
}

impl Default for GeoTiffReader {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

fn find_f64_vec<R: Read + Seek>(decoder: &mut Decoder<R>, code: u16) -> Result<Option<Vec<f64>>> {
    match decoder.find_tag(tag(code))? {
        Some(value) => Ok(Some(value.into_f64_vec()?)),
        None => Ok(None),
    }
}

/// GDAL stores nodata as ASCII, e.g. "-9999" or "nan"
fn parse_nodata(text: &str) -> Option<f64> {
    let trimmed = text.trim_matches(char::from(0)).trim();
    if trimmed.eq_ignore_ascii_case("nan") {
        return Some(f64::NAN);
    }
    trimmed.parse::<f64>().ok()
}
