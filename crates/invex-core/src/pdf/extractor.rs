//! Per-page text and image extraction using lopdf.

use image::{DynamicImage, GenericImageView, ImageBuffer, Rgba};
use image::imageops::FilterType;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use super::Result;
use crate::error::DocumentReadError;

/// Form XObjects nested deeper than this are not searched for images.
const MAX_FORM_DEPTH: usize = 3;

/// Largest image width or height decoded for recognition.
const MAX_IMAGE_DIMENSION: u32 = 20_000;

/// PDF content extractor using lopdf.
pub struct PdfExtractor {
    document: Document,
}

impl PdfExtractor {
    /// Parse a PDF from bytes.
    ///
    /// Encrypted files are opened with the empty password when possible.
    pub fn load(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(DocumentReadError::Empty);
        }

        let mut document =
            Document::load_mem(data).map_err(|e| DocumentReadError::Parse(e.to_string()))?;

        if document.is_encrypted() {
            if document.decrypt("").is_err() {
                return Err(DocumentReadError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");
        }

        let page_count = document.get_pages().len();
        if page_count == 0 {
            return Err(DocumentReadError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        Ok(Self { document })
    }

    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// Extract the text layer of one page (1-indexed).
    pub fn extract_page_text(&self, page: u32) -> Result<String> {
        if !self.document.get_pages().contains_key(&page) {
            return Err(DocumentReadError::InvalidPage(page));
        }

        let text = self
            .document
            .extract_text(&[page])
            .map_err(|e| DocumentReadError::Parse(format!("page {}: {}", page, e)))?;

        trace!("Page {} text layer: {} chars", page, text.len());
        Ok(text.trim_end().to_string())
    }

    /// Rasterize a page for recognition.
    ///
    /// Uses the page's largest decodable image, downscaled so its longer side is at
    /// most `max_dimension` pixels.
    pub fn render_page(&self, page: u32, max_dimension: u32) -> Result<DynamicImage> {
        let image = self
            .extract_images(page)?
            .into_iter()
            .max_by_key(|img| u64::from(img.width()) * u64::from(img.height()))
            .ok_or(DocumentReadError::NoImage(page))?;

        let (width, height) = image.dimensions();
        if max_dimension > 0 && width.max(height) > max_dimension {
            debug!(
                "Downscaling page {} image from {}x{} to fit {}px",
                page, width, height, max_dimension
            );
            return Ok(image.resize(max_dimension, max_dimension, FilterType::Triangle));
        }

        Ok(image)
    }

    /// Decode every image XObject referenced by a page.
    pub fn extract_images(&self, page: u32) -> Result<Vec<DynamicImage>> {
        let pages = self.document.get_pages();
        let page_id = pages.get(&page).ok_or(DocumentReadError::InvalidPage(page))?;

        let mut images = Vec::new();
        if let Some(resources) = self.get_page_resources(*page_id) {
            self.collect_images(&resources, 0, &mut images);
        }

        debug!("Extracted {} images from page {}", images.len(), page);
        Ok(images)
    }

    fn collect_images(&self, resources: &Dictionary, depth: usize, images: &mut Vec<DynamicImage>) {
        let doc = &self.document;
        let Ok(xobjects) = resources.get(b"XObject") else {
            return;
        };
        let Ok((_, Object::Dictionary(xobj_dict))) = doc.dereference(xobjects) else {
            return;
        };

        for (name, obj_ref) in xobj_dict.iter() {
            let Ok((_, Object::Stream(stream))) = doc.dereference(obj_ref) else {
                continue;
            };
            let subtype = stream
                .dict
                .get(b"Subtype")
                .ok()
                .and_then(|o| o.as_name().ok());

            match subtype {
                Some(b"Image") => {
                    if let Some(img) = self.try_extract_image(stream) {
                        images.push(img);
                    } else {
                        trace!("Skipping undecodable image {}", String::from_utf8_lossy(name));
                    }
                }
                Some(b"Form") if depth < MAX_FORM_DEPTH => {
                    let nested = stream
                        .dict
                        .get(b"Resources")
                        .ok()
                        .and_then(|r| doc.dereference(r).ok())
                        .and_then(|(_, r)| r.as_dict().ok().cloned());
                    if let Some(nested) = nested {
                        self.collect_images(&nested, depth + 1, images);
                    }
                }
                _ => {}
            }
        }
    }

    fn try_extract_image(&self, stream: &lopdf::Stream) -> Option<DynamicImage> {
        let dict = &stream.dict;
        let width = image_dimension(dict.get(b"Width").ok()?.as_i64().ok()?)?;
        let height = image_dimension(dict.get(b"Height").ok()?.as_i64().ok()?)?;

        trace!("Found image object: {}x{}", width, height);

        if let Ok(filter) = dict.get(b"Filter") {
            let filter_name = match filter {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.last().and_then(|o| o.as_name().ok()),
                _ => None,
            };

            match filter_name {
                Some(b"DCTDecode") => {
                    return image::load_from_memory_with_format(
                        &stream.content,
                        image::ImageFormat::Jpeg,
                    )
                    .ok();
                }
                Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                    trace!("Unsupported image filter");
                    return None;
                }
                _ => {}
            }
        }

        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        let color_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|o| match o {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                Object::Reference(r) => self
                    .document
                    .get_object(*r)
                    .ok()
                    .and_then(|o| o.as_name().ok()),
                _ => None,
            })
            .unwrap_or(b"DeviceRGB");

        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8);

        image_from_raw(&data, width, height, color_space, bits)
    }

    /// Get the resources dictionary for a page, following `Parent` inheritance.
    fn get_page_resources(&self, node_id: ObjectId) -> Option<Dictionary> {
        let doc = &self.document;
        let Object::Dictionary(dict) = doc.get_object(node_id).ok()? else {
            return None;
        };

        if let Ok(resources) = dict.get(b"Resources") {
            if let Ok((_, Object::Dictionary(res_dict))) = doc.dereference(resources) {
                return Some(res_dict.clone());
            }
        }

        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => self.get_page_resources(*parent_id),
            _ => None,
        }
    }
}

/// Validate a declared image dimension; negative, zero and oversized values are rejected.
fn image_dimension(value: i64) -> Option<u32> {
    u32::try_from(value)
        .ok()
        .filter(|&v| v > 0 && v <= MAX_IMAGE_DIMENSION)
}

/// Build an RGBA image from raw 8-bit RGB or grayscale samples.
fn image_from_raw(
    data: &[u8],
    width: u32,
    height: u32,
    color_space: &[u8],
    bits_per_component: i64,
) -> Option<DynamicImage> {
    if bits_per_component != 8 || width == 0 || height == 0 {
        return None;
    }

    let pixels = (width as usize).checked_mul(height as usize)?;
    let rgb_len = pixels.checked_mul(3)?;
    let rgba: Vec<u8> = match color_space {
        b"DeviceRGB" | b"RGB" if data.len() >= rgb_len => data[..rgb_len]
            .chunks_exact(3)
            .flat_map(|c| [c[0], c[1], c[2], 255])
            .collect(),
        b"DeviceGray" | b"G" if data.len() >= pixels => {
            data[..pixels].iter().flat_map(|&g| [g, g, g, 255]).collect()
        }
        _ => {
            trace!(
                "Could not decode image: colorspace={:?}, data_len={}",
                String::from_utf8_lossy(color_space),
                data.len()
            );
            return None;
        }
    };

    ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, rgba).map(DynamicImage::ImageRgba8)
}
