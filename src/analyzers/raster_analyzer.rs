use crate::error::Result;
use crate::models::{GeoRaster, GeoTransform};
use crate::readers::GeoTiffReader;
use std::path::Path;

#[derive(Debug)]
pub struct RasterStatistics {
    pub width: u32,
    pub height: u32,
    pub dtype: &'static str,
    pub transform: GeoTransform,
    pub bounds: (f64, f64, f64, f64),
    pub nodata: Option<f64>,
    pub total_pixels: usize,
    pub valid_pixels: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

impl RasterStatistics {
    pub fn valid_percentage(&self) -> f64 {
        if self.total_pixels == 0 {
            return 0.0;
        }
        (self.valid_pixels as f64 / self.total_pixels as f64) * 100.0
    }

    pub fn summary(&self) -> String {
        let (min_x, min_y, max_x, max_y) = self.bounds;
        let mut summary = format!(
            "Raster:\n  Size: {} x {} ({})\n  Transform: {}\n  Bounds: [{:.4}, {:.4}, {:.4}, {:.4}]\n",
            self.width, self.height, self.dtype, self.transform, min_x, min_y, max_x, max_y
        );

        match self.nodata {
            Some(nodata) => summary.push_str(&format!("  NoData: {}\n", nodata)),
            None => summary.push_str("  NoData: not set\n"),
        }

        summary.push_str(&format!(
            "  Valid pixels: {} / {} ({:.1}%)\n",
            self.valid_pixels,
            self.total_pixels,
            self.valid_percentage()
        ));

        if let (Some(min), Some(max), Some(mean)) = (self.min, self.max, self.mean) {
            summary.push_str(&format!(
                "  Min: {:.2}\n  Max: {:.2}\n  Mean: {:.2}\n",
                min, max, mean
            ));
        }

        summary
    }
}

pub struct RasterAnalyzer;

impl RasterAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze_file(&self, path: &Path) -> Result<RasterStatistics> {
        let raster = GeoTiffReader::new().read(path)?;
        Ok(self.analyze(&raster))
    }

    /// Statistics over pixels that are neither NaN nor the nodata value
    pub fn analyze(&self, raster: &GeoRaster) -> RasterStatistics {
        let values = raster.data.to_f64_vec();
        let is_valid = |v: f64| {
            !v.is_nan()
                && match raster.nodata {
                    Some(nodata) => v != nodata,
                    None => true,
                }
        };

        let mut valid_pixels = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &v in values.iter().filter(|&&v| is_valid(v)) {
            valid_pixels += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }

        let has_values = valid_pixels > 0;
        RasterStatistics {
            width: raster.width,
            height: raster.height,
            dtype: raster.data.dtype(),
            transform: raster.transform,
            bounds: raster.bounds(),
            nodata: raster.nodata,
            total_pixels: values.len(),
            valid_pixels,
            min: has_values.then_some(min),
            max: has_values.then_some(max),
            mean: has_values.then(|| sum / valid_pixels as f64),
        }
    }
}

impl Default for RasterAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GeoKeys, RasterData};

    fn raster(data: Vec<f32>, nodata: Option<f64>) -> GeoRaster {
        GeoRaster {
            width: 2,
            height: 2,
            transform: GeoTransform::new(34.0, 5.0, 0.05, -0.05),
            nodata,
            geo_keys: GeoKeys::default(),
            data: RasterData::F32(data),
        }
    }

    #[test]
    fn test_statistics_skip_nodata_and_nan() {
        let stats = RasterAnalyzer::new().analyze(&raster(
            vec![10.0, -9999.0, f32::NAN, 30.0],
            Some(-9999.0),
        ));

        assert_eq!(stats.total_pixels, 4);
        assert_eq!(stats.valid_pixels, 2);
        assert_eq!(stats.min, Some(10.0));
        assert_eq!(stats.max, Some(30.0));
        assert_eq!(stats.mean, Some(20.0));
        assert_eq!(stats.valid_percentage(), 50.0);
        assert!(stats.summary().contains("Valid pixels: 2 / 4 (50.0%)"));
    }

    #[test]
    fn test_statistics_all_nodata() {
        let stats = RasterAnalyzer::new().analyze(&raster(vec![-9999.0; 4], Some(-9999.0)));
        assert_eq!(stats.valid_pixels, 0);
        assert_eq!(stats.mean, None);
        assert!(!stats.summary().contains("Mean"));
    }
}
