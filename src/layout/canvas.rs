use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::mem;
use std::path::Path;

use super::geometry::Rect;
use crate::error::Result;

/// Page-by-page PDF writer that places JPEG images.
///
/// There is always one open page; `show_page` closes it and opens the next,
/// `save` closes the last one and writes the file.
pub struct PdfCanvas {
    doc: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    page_width: f64,
    page_height: f64,
    operations: Vec<Operation>,
    xobjects: Dictionary,
    image_count: usize,
}

impl PdfCanvas {
    pub fn new(page_width: f64, page_height: f64) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            page_ids: Vec::new(),
            page_width,
            page_height,
            operations: Vec::new(),
            xobjects: Dictionary::new(),
            image_count: 0,
        }
    }

    /// Draw baseline JPEG data of `width_px` x `height_px` RGB pixels into `rect`
    pub fn draw_jpeg(&mut self, jpeg: Vec<u8>, width_px: u32, height_px: u32, rect: Rect) {
        let image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width_px as i64,
                "Height" => height_px as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg,
        );
        let image_id = self.doc.add_object(image);

        self.image_count += 1;
        let name = format!("Im{}", self.image_count);
        self.xobjects.set(name.as_bytes().to_vec(), image_id);

        self.operations.push(Operation::new("q", vec![]));
        self.operations.push(Operation::new(
            "cm",
            vec![
                (rect.width as f32).into(),
                0.into(),
                0.into(),
                (rect.height as f32).into(),
                (rect.x as f32).into(),
                (rect.y as f32).into(),
            ],
        ));
        self.operations
            .push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
        self.operations.push(Operation::new("Q", vec![]));
    }

    /// Close the current page and start a new one
    pub fn show_page(&mut self) -> Result<()> {
        let content = Content {
            operations: mem::take(&mut self.operations),
        };
        let content_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), content.encode()?));

        let resources = dictionary! {
            "XObject" => mem::take(&mut self.xobjects),
        };
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                (self.page_width as f32).into(),
                (self.page_height as f32).into(),
            ],
            "Contents" => content_id,
            "Resources" => resources,
        });
        self.page_ids.push(page_id);
        Ok(())
    }

    /// Pages written so far, counting the open one
    pub fn page_count(&self) -> usize {
        self.page_ids.len() + 1
    }

    /// Close the open page, build the page tree and write the document.
    /// Returns the number of pages written.
    pub fn save(mut self, path: &Path) -> Result<usize> {
        self.show_page()?;

        let kids: Vec<Object> = self.page_ids.iter().map(|id| Object::Reference(*id)).collect();
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => self.page_ids.len() as i64,
        };
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        self.doc.save(path)?;
        Ok(self.page_ids.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_writes_one_page_per_show_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");

        let mut canvas = PdfCanvas::new(612.0, 792.0);
        canvas.show_page().unwrap();
        canvas.show_page().unwrap();
        assert_eq!(canvas.page_count(), 3);
        assert_eq!(canvas.save(&path).unwrap(), 3);

        let doc = Document::load(&path).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn test_draw_jpeg_registers_xobject() {
        let mut jpeg = Vec::new();
        image::RgbImage::from_pixel(4, 3, image::Rgb([200, 10, 10]))
            .write_to(&mut std::io::Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img.pdf");
        let mut canvas = PdfCanvas::new(612.0, 792.0);
        canvas.draw_jpeg(
            jpeg,
            4,
            3,
            Rect { x: 9.0, y: 567.0, width: 288.0, height: 216.0 },
        );
        canvas.save(&path).unwrap();

        let doc = Document::load(&path).unwrap();
        let pages = doc.get_pages();
        let page_id = pages[&1];
        let content = doc.get_page_content(page_id).unwrap();
        let text = String::from_utf8_lossy(&content);
        assert!(text.contains("/Im1 Do"));

        let page = doc.get_dictionary(page_id).unwrap();
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
        assert!(xobjects.has(b"Im1"));
    }
}
