//! Flattened-PDF output writer.
//!
//! The export artifact carries one page per source page, each page's
//! content a single full-page image XObject at the editing canvas's pixel
//! dimensions. Raster-only output is a deliberate tradeoff: vector
//! fidelity is lost in exchange for WYSIWYG parity with the canvas the
//! user edited.

use crate::{EngineError, EngineResult};
use image::{Pixel, Rgb, RgbImage, Rgba, RgbaImage};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::io::Cursor;

/// Handle to an image embedded in the output document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRef(ObjectId);

/// Sink consuming composited pages during export.
///
/// The export pipeline pushes pages strictly in document order and calls
/// [`finish`](Self::finish) exactly once after the last page.
pub trait PageSink {
    fn push_page(&mut self, page: &RgbaImage) -> EngineResult<()>;
    fn finish(&mut self) -> EngineResult<Vec<u8>>;
}

/// `lopdf`-backed PDF builder embedding pages as JPEG image XObjects.
///
/// JPEG (`DCTDecode`) streams pass through `lopdf` untouched, which keeps
/// serialization simple and the output small. Alpha is composited over
/// white first, the PDF page background, so erased regions read as blank
/// paper in the output.
pub struct RasterPdfBuilder {
    doc: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
}

impl RasterPdfBuilder {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            page_ids: Vec::new(),
        }
    }

    /// Number of pages added so far.
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Embed `page` as a DCTDecode image object and return its handle.
    pub fn embed_image(&mut self, page: &RgbaImage) -> EngineResult<ImageRef> {
        let rgb = flatten_over_white(page);

        let mut jpeg = Vec::new();
        rgb.write_to(&mut Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)?;

        let (width, height) = page.dimensions();
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(width),
                "Height" => i64::from(height),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg,
        );

        Ok(ImageRef(self.doc.add_object(stream)))
    }

    /// Append a `width_px` x `height_px` page drawing `image` full-page.
    ///
    /// The page MediaBox is in pixel units: the output page matches the
    /// editing canvas pixel-for-pixel.
    pub fn add_image_page(
        &mut self,
        width_px: u32,
        height_px: u32,
        image: ImageRef,
    ) -> EngineResult<()> {
        let name = format!("Im{}", self.page_ids.len());

        let content = format!(
            "q\n{width_px} 0 0 {height_px} 0 0 cm\n/{name} Do\nQ\n"
        );
        let content_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        let mut xobjects = Dictionary::new();
        xobjects.set(name.into_bytes(), Object::Reference(image.0));
        let mut resources = Dictionary::new();
        resources.set("XObject", Object::Dictionary(xobjects));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                i64::from(width_px).into(),
                i64::from(height_px).into(),
            ],
            "Contents" => content_id,
            "Resources" => Object::Dictionary(resources),
        });
        self.page_ids.push(page_id);

        Ok(())
    }

    /// Finalize the page tree and serialize the document.
    pub fn serialize(&mut self) -> EngineResult<Vec<u8>> {
        let kids: Vec<Object> = self
            .page_ids
            .iter()
            .map(|id| Object::Reference(*id))
            .collect();

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => self.page_ids.len() as i64,
        };
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let mut cursor = Cursor::new(Vec::new());
        self.doc.save_to(&mut cursor)?;
        Ok(cursor.into_inner())
    }
}

impl Default for RasterPdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PageSink for RasterPdfBuilder {
    fn push_page(&mut self, page: &RgbaImage) -> EngineResult<()> {
        let image = self.embed_image(page)?;
        let (width, height) = page.dimensions();
        self.add_image_page(width, height, image)
    }

    fn finish(&mut self) -> EngineResult<Vec<u8>> {
        self.serialize()
    }
}

/// Composite RGBA pixels over a white background.
fn flatten_over_white(page: &RgbaImage) -> RgbImage {
    let (width, height) = page.dimensions();
    let mut rgb = RgbImage::new(width, height);
    for (x, y, px) in page.enumerate_pixels() {
        let mut base = Rgba([255u8, 255, 255, 255]);
        base.blend(px);
        rgb.put_pixel(x, y, Rgb([base[0], base[1], base[2]]));
    }
    rgb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_composites_alpha_over_white() {
        let mut page = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 0]));
        page.put_pixel(1, 0, Rgba([200, 40, 40, 255]));

        let rgb = flatten_over_white(&page);
        assert_eq!(*rgb.get_pixel(0, 0), Rgb([255, 255, 255]));
        assert_eq!(*rgb.get_pixel(1, 0), Rgb([200, 40, 40]));
    }

    #[test]
    fn output_parses_and_counts_pages() {
        let mut builder = RasterPdfBuilder::new();
        builder
            .push_page(&RgbaImage::from_pixel(80, 60, Rgba([255, 0, 0, 255])))
            .expect("first page");
        builder
            .push_page(&RgbaImage::from_pixel(40, 20, Rgba([0, 255, 0, 255])))
            .expect("second page");

        let bytes = builder.finish().expect("serialize");
        assert!(bytes.starts_with(b"%PDF-"));

        let doc = Document::load_mem(&bytes).expect("output must parse");
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn pages_carry_pixel_media_boxes_and_image_resources() {
        let mut builder = RasterPdfBuilder::new();
        builder
            .push_page(&RgbaImage::from_pixel(80, 60, Rgba([9, 9, 9, 255])))
            .expect("page");
        let bytes = builder.finish().expect("serialize");

        let doc = Document::load_mem(&bytes).expect("parse");
        let (_, page_id) = doc.get_pages().into_iter().next().expect("one page");
        let page = doc.get_dictionary(page_id).expect("page dict");

        let media_box = page
            .get(b"MediaBox")
            .and_then(|obj| obj.as_array())
            .expect("media box");
        assert_eq!(media_box.len(), 4);
        assert_eq!(media_box[2].as_i64().expect("width"), 80);
        assert_eq!(media_box[3].as_i64().expect("height"), 60);

        let resources = page
            .get(b"Resources")
            .and_then(|obj| obj.as_dict())
            .expect("resources");
        let xobjects = resources
            .get(b"XObject")
            .and_then(|obj| obj.as_dict())
            .expect("xobject dict");
        assert_eq!(xobjects.len(), 1);

        let (_, image_ref) = xobjects.iter().next().expect("one image");
        let image_id = image_ref.as_reference().expect("reference");
        let image = doc.get_object(image_id).expect("image object");
        let stream = image.as_stream().expect("stream");
        assert!(matches!(
            stream.dict.get(b"Filter"),
            Ok(Object::Name(name)) if name == b"DCTDecode"
        ));
        assert!(!stream.content.is_empty());
    }

    #[test]
    fn embed_then_draw_are_separable() {
        // The granular API lets one raster back multiple pages.
        let mut builder = RasterPdfBuilder::new();
        let raster = RgbaImage::from_pixel(30, 30, Rgba([1, 2, 3, 255]));
        let image = builder.embed_image(&raster).expect("embed");
        builder.add_image_page(30, 30, image).expect("first");
        builder.add_image_page(30, 30, image).expect("second");
        assert_eq!(builder.page_count(), 2);

        let bytes = builder.serialize().expect("serialize");
        let doc = Document::load_mem(&bytes).expect("parse");
        assert_eq!(doc.get_pages().len(), 2);
    }
}
