//! Native GeoTIFF reading/writing on top of the `tiff` crate.
//!
//! Georeferencing is taken from ModelTransformationTag when present, else
//! from ModelTiepointTag + ModelPixelScaleTag. The EPSG code is read from
//! the GeoKey directory and nodata from GDAL_NODATA.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_KEY: u16 = 3072;

/// Options for writing GeoTIFF files
#[derive(Debug, Clone)]
pub struct GeoTiffOptions {
    /// EPSG code written to the GeoKey directory, if known
    pub epsg: Option<u32>,
    /// Write GDAL_NODATA = "nan" so NaN cells read back as nodata
    pub nan_nodata: bool,
}

impl Default for GeoTiffOptions {
    fn default() -> Self {
        Self {
            epsg: None,
            nan_nodata: true,
        }
    }
}

/// Read one band of a GeoTIFF file.
///
/// `band` selects a sample of a multi-sample (chunky) image; `None` reads
/// the first.
pub fn read_geotiff<T, P>(path: P, band: Option<usize>) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    decode_geotiff(BufReader::new(file), band)
}

/// Same as [`read_geotiff`] on an in-memory buffer.
pub fn read_geotiff_from_buffer<T>(data: &[u8], band: Option<usize>) -> Result<Raster<T>>
where
    T: RasterElement,
{
    decode_geotiff(Cursor::new(data), band)
}

fn tiff_err(context: &str) -> impl Fn(tiff::TiffError) -> Error + '_ {
    move |e| Error::Other(format!("{context}: {e}"))
}

pub(crate) fn open_decoder<R: Read + Seek>(reader: R) -> Result<Decoder<R>> {
    Ok(Decoder::new(reader)
        .map_err(tiff_err("TIFF decode error"))?
        .with_limits(Limits::unlimited()))
}

/// Dimensions `(rows, cols)` and georeferencing without decoding pixels.
pub(crate) fn read_header<R: Read + Seek>(
    reader: R,
) -> Result<((usize, usize), GeoTransform, Option<CRS>)> {
    let mut decoder = open_decoder(reader)?;
    let (width, height) = decoder
        .dimensions()
        .map_err(tiff_err("Cannot read dimensions"))?;
    let transform = read_geotransform(&mut decoder).unwrap_or_default();
    let crs = read_epsg(&mut decoder).map(CRS::from_epsg);
    Ok(((height as usize, width as usize), transform, crs))
}

fn decode_geotiff<T, R>(reader: R, band: Option<usize>) -> Result<Raster<T>>
where
    T: RasterElement,
    R: Read + Seek,
{
    let mut decoder = open_decoder(reader)?;

    let (width, height) = decoder
        .dimensions()
        .map_err(tiff_err("Cannot read dimensions"))?;
    let rows = height as usize;
    let cols = width as usize;

    let transform = read_geotransform(&mut decoder);
    let crs = read_epsg(&mut decoder).map(CRS::from_epsg);
    let nodata = read_nodata(&mut decoder);

    let image = decoder
        .read_image()
        .map_err(tiff_err("Cannot read image data"))?;

    macro_rules! cast_all {
        ($buf:expr) => {
            $buf.iter()
                .map(|&v| num_traits::cast(v).unwrap_or_else(T::fill_value))
                .collect::<Vec<T>>()
        };
    }

    let samples: Vec<T> = match image {
        DecodingResult::U8(buf) => cast_all!(buf),
        DecodingResult::U16(buf) => cast_all!(buf),
        DecodingResult::U32(buf) => cast_all!(buf),
        DecodingResult::U64(buf) => cast_all!(buf),
        DecodingResult::I8(buf) => cast_all!(buf),
        DecodingResult::I16(buf) => cast_all!(buf),
        DecodingResult::I32(buf) => cast_all!(buf),
        DecodingResult::I64(buf) => cast_all!(buf),
        DecodingResult::F32(buf) => cast_all!(buf),
        DecodingResult::F64(buf) => cast_all!(buf),
        #[allow(unreachable_patterns)]
        _ => {
            return Err(Error::UnsupportedDataType(
                "Unsupported TIFF pixel format".to_string(),
            ))
        }
    };

    let cells = rows * cols;
    if cells == 0 || samples.len() % cells != 0 {
        return Err(Error::InvalidDimensions {
            width: cols,
            height: rows,
        });
    }
    let per_pixel = samples.len() / cells;
    let band = band.unwrap_or(0);
    if band >= per_pixel {
        return Err(Error::InvalidParameter {
            name: "band",
            value: band.to_string(),
            reason: format!("image has {per_pixel} sample(s) per pixel"),
        });
    }

    let data = if per_pixel == 1 {
        samples
    } else {
        samples.into_iter().skip(band).step_by(per_pixel).collect()
    };

    let mut raster = Raster::from_vec(data, rows, cols)?;
    match transform {
        Some(t) => raster.set_transform(t),
        None => tracing::debug!("no georeferencing tags, using identity transform"),
    }
    raster.set_crs(crs);
    raster.set_nodata(nodata.and_then(num_traits::cast));
    Ok(raster)
}

fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    if let Ok(m) = decoder.get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_TRANSFORMATION)) {
        // Row-major 4x4 matrix
        if m.len() >= 8 {
            return Some(GeoTransform::from_gdal([m[3], m[0], m[1], m[7], m[4], m[5]]));
        }
    }

    let scale = decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE))
        .ok()?;
    let tiepoint = decoder.get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_TIEPOINT)).ok()?;

    if scale.len() >= 2 && tiepoint.len() >= 6 {
        // tiepoint: [I, J, K, X, Y, Z]
        let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
        let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
        return Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]));
    }
    None
}

fn read_epsg<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<u32> {
    let keys = decoder
        .get_tag_u16_vec(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY))
        .ok()?;
    // Header is 4 shorts, then 4 shorts per key: id, location, count, value
    keys.get(4..)?
        .chunks_exact(4)
        .filter(|k| k[1] == 0)
        .find(|k| k[0] == PROJECTED_CS_TYPE_KEY)
        .or_else(|| {
            keys[4..]
                .chunks_exact(4)
                .filter(|k| k[1] == 0)
                .find(|k| k[0] == GEOGRAPHIC_TYPE_KEY)
        })
        .map(|k| k[3] as u32)
}

fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<f64> {
    let text = decoder
        .get_tag_ascii_string(Tag::from_u16_exhaustive(GDAL_NODATA))
        .ok()?;
    text.trim_matches(|c: char| c.is_whitespace() || c == '\0')
        .parse()
        .ok()
}

/// Write a raster as a single-band 32-bit float GeoTIFF.
pub fn write_geotiff<T, P>(
    raster: &Raster<T>,
    path: P,
    options: Option<GeoTiffOptions>,
) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref())?;
    encode_geotiff(raster, file, &options.unwrap_or_default())
}

/// Same as [`write_geotiff`] into a byte buffer.
pub fn write_geotiff_to_buffer<T>(
    raster: &Raster<T>,
    options: Option<GeoTiffOptions>,
) -> Result<Vec<u8>>
where
    T: RasterElement,
{
    let mut buf = Vec::new();
    encode_geotiff(raster, Cursor::new(&mut buf), &options.unwrap_or_default())?;
    Ok(buf)
}

fn encode_geotiff<T, W>(raster: &Raster<T>, writer: W, options: &GeoTiffOptions) -> Result<()>
where
    T: RasterElement,
    W: Write + Seek,
{
    let mut encoder = TiffEncoder::new(writer).map_err(tiff_err("TIFF encoder error"))?;

    let (rows, cols) = raster.shape();
    let nodata = raster.nodata();
    let data: Vec<f32> = raster
        .data()
        .iter()
        .map(|&v| {
            if v.is_nodata(nodata) {
                f32::NAN
            } else {
                num_traits::cast(v).unwrap_or(f32::NAN)
            }
        })
        .collect();

    let mut image = encoder
        .new_image::<Gray32Float>(cols as u32, rows as u32)
        .map_err(tiff_err("Cannot create TIFF image"))?;

    let gt = raster.transform();
    let write_err = tiff_err("Cannot write GeoTIFF tag");

    if gt.row_rotation == 0.0 && gt.col_rotation == 0.0 {
        let scale = [gt.pixel_width, -gt.pixel_height, 0.0];
        let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
        image
            .encoder()
            .write_tag(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE), &scale[..])
            .map_err(&write_err)?;
        image
            .encoder()
            .write_tag(Tag::from_u16_exhaustive(MODEL_TIEPOINT), &tiepoint[..])
            .map_err(&write_err)?;
    } else {
        let matrix = [
            gt.pixel_width, gt.row_rotation, 0.0, gt.origin_x,
            gt.col_rotation, gt.pixel_height, 0.0, gt.origin_y,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        image
            .encoder()
            .write_tag(Tag::from_u16_exhaustive(MODEL_TRANSFORMATION), &matrix[..])
            .map_err(&write_err)?;
    }

    let epsg = options.epsg.or_else(|| raster.crs().map(|c| c.epsg()));
    let mut geokeys: Vec<u16> = vec![
        1, 1, 0, 2,
        1024, 0, 1, 1, // GTModelTypeGeoKey = projected
        1025, 0, 1, 1, // GTRasterTypeGeoKey = pixel is area
    ];
    if let Some(code) = epsg.and_then(|c| u16::try_from(c).ok()) {
        let key = if code == 4326 {
            geokeys[7] = 2; // geographic model
            GEOGRAPHIC_TYPE_KEY
        } else {
            PROJECTED_CS_TYPE_KEY
        };
        geokeys.extend_from_slice(&[key, 0, 1, code]);
        geokeys[3] = 3;
    }
    image
        .encoder()
        .write_tag(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY), &geokeys[..])
        .map_err(&write_err)?;

    if options.nan_nodata {
        image
            .encoder()
            .write_tag(Tag::from_u16_exhaustive(GDAL_NODATA), "nan")
            .map_err(&write_err)?;
    }

    image
        .write_data(&data)
        .map_err(tiff_err("Cannot write image data"))?;
    Ok(())
}
