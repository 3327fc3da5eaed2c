use crate::error::{EtlError, Result};
use crate::models::{GeoRaster, GeoTransform, RasterData, Window};
use crate::readers::GeoTiffReader;
use crate::utils::constants::DEFAULT_FILL_VALUE;
use crate::writers::GeoTiffWriter;
use geo::{BoundingRect, Contains, MultiPolygon, Point};
use std::path::Path;

// Absorbs float noise when a boundary edge sits exactly on a pixel edge.
const SNAP_EPSILON: f64 = 1e-9;

/// Masks and crops rasters to a boundary polygon.
///
/// The output window is the boundary's bounding box snapped outward to whole
/// pixels and intersected with the raster. Inside that window a pixel keeps
/// its value only when its centre falls inside the boundary; every other
/// pixel becomes the source nodata (or 0 without one).
///
/// A centre lying exactly on a boundary edge counts as outside. GDAL's
/// scanline rasterizer treats edges half-open instead, so for such pixels
/// along some edges the result can differ from a GDAL-based mask by one pixel.
pub struct Clipper<'a> {
    boundary: &'a MultiPolygon<f64>,
}

impl<'a> Clipper<'a> {
    pub fn new(boundary: &'a MultiPolygon<f64>) -> Self {
        Self { boundary }
    }

    pub fn clip(&self, raster: &GeoRaster) -> Result<GeoRaster> {
        let window = self.window_for(raster)?;
        let mask = self.pixel_mask(&raster.transform, &window);
        let fill = raster.nodata.unwrap_or(DEFAULT_FILL_VALUE);
        let width = raster.width as usize;

        let data = match &raster.data {
            RasterData::U8(v) => RasterData::U8(crop(v, width, &window, &mask, fill as u8)),
            RasterData::U16(v) => RasterData::U16(crop(v, width, &window, &mask, fill as u16)),
            RasterData::I16(v) => RasterData::I16(crop(v, width, &window, &mask, fill as i16)),
            RasterData::I32(v) => RasterData::I32(crop(v, width, &window, &mask, fill as i32)),
            RasterData::F32(v) => RasterData::F32(crop(v, width, &window, &mask, fill as f32)),
            RasterData::F64(v) => RasterData::F64(crop(v, width, &window, &mask, fill)),
        };

        Ok(GeoRaster {
            width: window.width,
            height: window.height,
            transform: raster.transform.shifted(&window),
            nodata: raster.nodata,
            geo_keys: raster.geo_keys.clone(),
            data,
        })
    }

    /// Pixel window covering the boundary, clamped to the raster
    pub fn window_for(&self, raster: &GeoRaster) -> Result<Window> {
        let rect = self.boundary.bounding_rect().ok_or(EtlError::NoOverlap)?;
        let t = &raster.transform;

        let (c0, r0) = t.invert(rect.min().x, rect.max().y);
        let (c1, r1) = t.invert(rect.max().x, rect.min().y);

        let col_start = (c0.min(c1) + SNAP_EPSILON).floor().max(0.0);
        let row_start = (r0.min(r1) + SNAP_EPSILON).floor().max(0.0);
        let col_stop = (c0.max(c1) - SNAP_EPSILON).ceil().min(raster.width as f64);
        let row_stop = (r0.max(r1) - SNAP_EPSILON).ceil().min(raster.height as f64);

        if col_stop <= col_start || row_stop <= row_start {
            return Err(EtlError::NoOverlap);
        }

        Ok(Window {
            col_off: col_start as u32,
            row_off: row_start as u32,
            width: (col_stop - col_start) as u32,
            height: (row_stop - row_start) as u32,
        })
    }

    /// Row-major flags for the window: true where the pixel centre is inside the boundary
    fn pixel_mask(&self, transform: &GeoTransform, window: &Window) -> Vec<bool> {
        let mut mask = Vec::with_capacity(window.width as usize * window.height as usize);
        for row in 0..window.height {
            for col in 0..window.width {
                let (x, y) = transform.apply(
                    (window.col_off + col) as f64 + 0.5,
                    (window.row_off + row) as f64 + 0.5,
                );
                mask.push(self.boundary.contains(&Point::new(x, y)));
            }
        }
        mask
    }
}

/// Read `input`, clip it to `boundary` and write the result to `output`
pub fn clip_file(input: &Path, output: &Path, boundary: &MultiPolygon<f64>) -> Result<GeoRaster> {
    let raster = GeoTiffReader::new().read(input)?;
    let clipped = Clipper::new(boundary).clip(&raster)?;
    GeoTiffWriter::new().write(&clipped, output)?;
    Ok(clipped)
}

fn crop<T: Copy>(data: &[T], src_width: usize, window: &Window, mask: &[bool], fill: T) -> Vec<T> {
    let width = window.width as usize;
    let mut out = Vec::with_capacity(mask.len());

    for row in 0..window.height as usize {
        let start = (window.row_off as usize + row) * src_width + window.col_off as usize;
        let src_row = &data[start..start + width];
        let mask_row = &mask[row * width..(row + 1) * width];
        out.extend(
            src_row
                .iter()
                .zip(mask_row)
                .map(|(&value, &inside)| if inside { value } else { fill }),
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeoKeys;
    use geo::{polygon, MultiPolygon};
    use pretty_assertions::assert_eq;

    /// 10x10 grid of 1-degree pixels spanning x 0..10, y 0..10; value = row * 10 + col
    fn grid(nodata: Option<f64>) -> GeoRaster {
        GeoRaster {
            width: 10,
            height: 10,
            transform: GeoTransform::new(0.0, 10.0, 1.0, -1.0),
            nodata,
            geo_keys: GeoKeys::default(),
            data: RasterData::F32((0..100).map(|v| v as f32).collect()),
        }
    }

    fn rectangle(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: x0, y: y0),
            (x: x1, y: y0),
            (x: x1, y: y1),
            (x: x0, y: y1),
        ]])
    }

    #[test]
    fn test_window_snaps_outward_to_pixels() {
        let boundary = rectangle(2.5, 3.2, 5.5, 6.8);
        let window = Clipper::new(&boundary).window_for(&grid(None)).unwrap();
        // cols floor(2.5)=2 .. ceil(5.5)=6, rows floor(10-6.8)=3 .. ceil(10-3.2)=7
        assert_eq!(
            window,
            Window {
                col_off: 2,
                row_off: 3,
                width: 4,
                height: 4
            }
        );
    }

    #[test]
    fn test_window_on_exact_pixel_edges() {
        let boundary = rectangle(2.0, 3.0, 5.0, 6.0);
        let window = Clipper::new(&boundary).window_for(&grid(None)).unwrap();
        assert_eq!(
            window,
            Window {
                col_off: 2,
                row_off: 4,
                width: 3,
                height: 3
            }
        );
    }

    #[test]
    fn test_window_is_clamped_to_raster() {
        let boundary = rectangle(-5.0, 8.0, 3.0, 20.0);
        let window = Clipper::new(&boundary).window_for(&grid(None)).unwrap();
        assert_eq!(
            window,
            Window {
                col_off: 0,
                row_off: 0,
                width: 3,
                height: 2
            }
        );
    }

    #[test]
    fn test_disjoint_boundary_is_no_overlap() {
        let boundary = rectangle(20.0, 20.0, 30.0, 30.0);
        let result = Clipper::new(&boundary).clip(&grid(None));
        assert!(matches!(result, Err(EtlError::NoOverlap)));
    }

    #[test]
    fn test_clip_rectangle_keeps_all_values() {
        let boundary = rectangle(2.0, 3.0, 5.0, 6.0);
        let clipped = Clipper::new(&boundary).clip(&grid(Some(-9999.0))).unwrap();

        assert_eq!(clipped.width, 3);
        assert_eq!(clipped.height, 3);
        assert_eq!(clipped.transform, GeoTransform::new(2.0, 6.0, 1.0, -1.0));
        assert_eq!(
            clipped.data,
            RasterData::F32(vec![42.0, 43.0, 44.0, 52.0, 53.0, 54.0, 62.0, 63.0, 64.0])
        );
    }

    #[test]
    fn test_clip_triangle_masks_outside_pixels() {
        // Right triangle with the hypotenuse running from (0, 10) to (4, 6);
        // centres lying exactly on the hypotenuse are outside
        let boundary = MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 6.0),
            (x: 4.0, y: 6.0),
            (x: 0.0, y: 10.0),
        ]]);
        let clipped = Clipper::new(&boundary).clip(&grid(Some(-9999.0))).unwrap();

        assert_eq!((clipped.width, clipped.height), (4, 4));
        let n = -9999.0;
        assert_eq!(
            clipped.data,
            RasterData::F32(vec![
                n, n, n, n, //
                10.0, n, n, n, //
                20.0, 21.0, n, n, //
                30.0, 31.0, 32.0, n,
            ])
        );
    }

    #[test]
    fn test_centre_on_vertical_edge_is_masked() {
        // Left edge at x = 0.5 passes through every centre of column 0
        let boundary = rectangle(0.5, 7.0, 3.0, 10.0);
        let clipped = Clipper::new(&boundary).clip(&grid(Some(-9999.0))).unwrap();

        assert_eq!((clipped.width, clipped.height), (3, 3));
        let n = -9999.0;
        assert_eq!(
            clipped.data,
            RasterData::F32(vec![
                n, 1.0, 2.0, //
                n, 11.0, 12.0, //
                n, 21.0, 22.0,
            ])
        );
    }

    #[test]
    fn test_clip_without_nodata_fills_zero() {
        // L-shape leaving out the top-right pixel of its 2x2 window
        let boundary = MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 8.0),
            (x: 2.0, y: 8.0),
            (x: 2.0, y: 9.0),
            (x: 1.0, y: 9.0),
            (x: 1.0, y: 10.0),
            (x: 0.0, y: 10.0),
        ]]);
        let mut raster = grid(None);
        raster.data = RasterData::U8((1..=100).collect());

        let clipped = Clipper::new(&boundary).clip(&raster).unwrap();
        assert_eq!(clipped.nodata, None);
        assert_eq!(clipped.data, RasterData::U8(vec![1, 0, 11, 12]));
    }
}
