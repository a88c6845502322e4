use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat};

/// Edge length of a cropped tile image: the hex box plus ten percent bleed.
pub const TILE_IMAGE_SIZE: u32 = 121;
pub const ZOOM_MIN: f32 = 1.0;
pub const ZOOM_MAX: f32 = 8.0;
pub const ZOOM_STEP: f32 = 0.1;
pub const FALLBACK_MIME: &str = "application/octet-stream";

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("image decode failed: {0}")]
    Decode(String),
    #[error("image encode failed: {0}")]
    Encode(String),
    #[error("not a data URI")]
    NotDataUri,
    #[error("malformed data URI: {0}")]
    MalformedDataUri(String),
    #[error("unrecognised image format")]
    UnknownFormat,
    #[error("invalid image dimensions")]
    Dimensions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub bytes: Vec<u8>,
}

pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    let mime = if mime.trim().is_empty() { FALLBACK_MIME } else { mime.trim() };
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

pub fn parse_data_uri(value: &str) -> Result<DataUri, PipelineError> {
    let rest = value
        .trim()
        .strip_prefix("data:")
        .ok_or(PipelineError::NotDataUri)?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| PipelineError::MalformedDataUri("missing ','".to_string()))?;
    let mut params = header.split(';');
    let mime = params.next().unwrap_or_default().trim();
    let is_base64 = params.any(|param| param.trim().eq_ignore_ascii_case("base64"));
    let bytes = if is_base64 {
        STANDARD
            .decode(payload.trim())
            .map_err(|err| PipelineError::MalformedDataUri(err.to_string()))?
    } else {
        percent_decode(payload)?
    };
    Ok(DataUri {
        mime: if mime.is_empty() {
            "text/plain".to_string()
        } else {
            mime.to_string()
        },
        bytes,
    })
}

fn percent_decode(payload: &str) -> Result<Vec<u8>, PipelineError> {
    let raw = payload.as_bytes();
    let mut out = Vec::with_capacity(raw.len());
    let mut idx = 0;
    while idx < raw.len() {
        if raw[idx] == b'%' {
            let hex = raw
                .get(idx + 1..idx + 3)
                .and_then(|pair| std::str::from_utf8(pair).ok())
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| PipelineError::MalformedDataUri(format!("bad escape at {idx}")))?;
            out.push(hex);
            idx += 3;
        } else {
            out.push(raw[idx]);
            idx += 1;
        }
    }
    Ok(out)
}

pub fn sniff_format(bytes: &[u8]) -> Result<ImageFormat, PipelineError> {
    image::guess_format(bytes).map_err(|_| PipelineError::UnknownFormat)
}

pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    sniff_format(bytes).ok().map(|format| format.to_mime_type())
}

/// Encodes raw file bytes as a data URI, trusting the bytes over any
/// declared content type.
pub fn inline_bytes(bytes: &[u8], declared_mime: Option<&str>) -> String {
    let mime = match sniff_mime(bytes) {
        Some(mime) => mime,
        None => {
            log::debug!("image format not recognised, using declared type {declared_mime:?}");
            declared_mime.unwrap_or(FALLBACK_MIME)
        }
    };
    data_uri(mime, bytes)
}

/// Crop-box state of the tile image editor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropParams {
    /// Clockwise quarter turns; negative values turn counter-clockwise.
    pub rotate_quarters: i32,
    /// `1.0` frames the largest centred square; larger values zoom in.
    pub zoom: f32,
    /// Crop centre in normalised image coordinates (after rotation).
    pub center: (f32, f32),
}

impl Default for CropParams {
    fn default() -> Self {
        Self {
            rotate_quarters: 0,
            zoom: ZOOM_MIN,
            center: (0.5, 0.5),
        }
    }
}

impl CropParams {
    pub fn rotate_left(&mut self) {
        self.rotate_quarters = (self.rotate_quarters - 1).rem_euclid(4);
    }

    pub fn rotate_right(&mut self) {
        self.rotate_quarters = (self.rotate_quarters + 1).rem_euclid(4);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom + ZOOM_STEP).clamp(ZOOM_MIN, ZOOM_MAX);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom - ZOOM_STEP).clamp(ZOOM_MIN, ZOOM_MAX);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub side: u32,
}

/// Square crop window for an image of `width x height`, kept inside the image.
pub fn crop_rect(width: u32, height: u32, params: &CropParams) -> Result<CropRect, PipelineError> {
    if width == 0 || height == 0 {
        return Err(PipelineError::Dimensions);
    }
    let zoom = params.zoom.clamp(ZOOM_MIN, ZOOM_MAX);
    let side = ((width.min(height) as f32) / zoom).round().max(1.0) as u32;
    let center_x = params.center.0.clamp(0.0, 1.0) * width as f32;
    let center_y = params.center.1.clamp(0.0, 1.0) * height as f32;
    let max_x = (width - side) as f32;
    let max_y = (height - side) as f32;
    let x = (center_x - side as f32 * 0.5).clamp(0.0, max_x).round() as u32;
    let y = (center_y - side as f32 * 0.5).clamp(0.0, max_y).round() as u32;
    Ok(CropRect { x, y, side })
}

pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, PipelineError> {
    image::load_from_memory(bytes).map_err(|err| PipelineError::Decode(err.to_string()))
}

pub fn rotate_quarters(image: DynamicImage, quarters: i32) -> DynamicImage {
    match quarters.rem_euclid(4) {
        1 => image.rotate90(),
        2 => image.rotate180(),
        3 => image.rotate270(),
        _ => image,
    }
}

/// Produces the square PNG stored on an image tile.
pub fn crop_tile_image(bytes: &[u8], params: &CropParams) -> Result<Vec<u8>, PipelineError> {
    let image = rotate_quarters(decode_image(bytes)?, params.rotate_quarters);
    let rect = crop_rect(image.width(), image.height(), params)?;
    log::debug!(
        "cropping {}x{} image to {}px square at ({}, {})",
        image.width(),
        image.height(),
        rect.side,
        rect.x,
        rect.y
    );
    let cropped = image.crop_imm(rect.x, rect.y, rect.side, rect.side);
    let resized = cropped.resize_exact(TILE_IMAGE_SIZE, TILE_IMAGE_SIZE, FilterType::Lanczos3);
    encode_png(&resized)
}

pub fn crop_tile_data_uri(bytes: &[u8], params: &CropParams) -> Result<String, PipelineError> {
    let png = crop_tile_image(bytes, params)?;
    Ok(data_uri(ImageFormat::Png.to_mime_type(), &png))
}

pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, PipelineError> {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(PipelineError::Dimensions);
    }
    let mut out = Cursor::new(Vec::new());
    PngEncoder::new(&mut out)
        .write_image(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)
        .map_err(|err| PipelineError::Encode(err.to_string()))?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn sample_png(width: u32, height: u32) -> Vec<u8> {
        let mut image = RgbaImage::new(width, height);
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            let red = if x < width / 2 { 255 } else { 0 };
            let blue = if y < height / 2 { 255 } else { 0 };
            *pixel = Rgba([red, 0, blue, 255]);
        }
        encode_png(&DynamicImage::ImageRgba8(image)).expect("encode")
    }

    #[test]
    fn data_uri_round_trips() {
        let bytes = sample_png(4, 4);
        let uri = inline_bytes(&bytes, None);
        assert!(uri.starts_with("data:image/png;base64,"));
        let parsed = parse_data_uri(&uri).expect("parse");
        assert_eq!(parsed.mime, "image/png");
        assert_eq!(parsed.bytes, bytes);
    }

    #[test]
    fn parses_percent_encoded_payload() {
        let parsed = parse_data_uri("data:text/plain,hello%20hex").expect("parse");
        assert_eq!(parsed.bytes, b"hello hex");
        assert!(matches!(parse_data_uri("blob:abc"), Err(PipelineError::NotDataUri)));
        assert!(matches!(
            parse_data_uri("data:text/plain,%zz"),
            Err(PipelineError::MalformedDataUri(_))
        ));
    }

    #[test]
    fn unknown_bytes_keep_declared_mime() {
        let uri = inline_bytes(b"not an image", Some("image/x-custom"));
        assert!(uri.starts_with("data:image/x-custom;base64,"));
    }

    #[test]
    fn crop_rect_stays_inside_image() {
        let rect = crop_rect(400, 200, &CropParams::default()).expect("rect");
        assert_eq!(rect, CropRect { x: 100, y: 0, side: 200 });

        let params = CropParams {
            zoom: 2.0,
            center: (1.0, 1.0),
            ..CropParams::default()
        };
        let rect = crop_rect(400, 200, &params).expect("rect");
        assert_eq!(rect, CropRect { x: 300, y: 100, side: 100 });
        assert!(matches!(crop_rect(0, 10, &params), Err(PipelineError::Dimensions)));
    }

    #[test]
    fn crop_outputs_tile_sized_png() {
        let png = crop_tile_image(&sample_png(64, 32), &CropParams::default()).expect("crop");
        let image = decode_image(&png).expect("decode");
        assert_eq!(image.width(), TILE_IMAGE_SIZE);
        assert_eq!(image.height(), TILE_IMAGE_SIZE);
    }

    #[test]
    fn rotation_wraps_in_quarters() {
        let mut params = CropParams::default();
        params.rotate_left();
        assert_eq!(params.rotate_quarters, 3);
        params.rotate_right();
        params.rotate_right();
        assert_eq!(params.rotate_quarters, 1);
        let rotated = rotate_quarters(decode_image(&sample_png(8, 4)).unwrap(), params.rotate_quarters);
        assert_eq!((rotated.width(), rotated.height()), (4, 8));
    }

    #[test]
    fn zoom_is_clamped() {
        let mut params = CropParams::default();
        params.zoom_out();
        assert_eq!(params.zoom, ZOOM_MIN);
        for _ in 0..200 {
            params.zoom_in();
        }
        assert_eq!(params.zoom, ZOOM_MAX);
    }
}
