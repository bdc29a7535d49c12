//! In-memory PDF fixtures built with lopdf.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// Page content for [`PdfBuilder`].
pub enum TestPage {
    /// One text line per entry, each in its own text object.
    Text(Vec<String>),
    /// A single image XObject and no text layer. Dimensions are written as declared.
    Image {
        width: i64,
        height: i64,
        color_space: &'static str,
        data: Vec<u8>,
    },
}

pub fn text_page(lines: &[&str]) -> TestPage {
    TestPage::Text(lines.iter().map(|l| l.to_string()).collect())
}

/// A light-gray DeviceGray scan.
pub fn image_page(width: u32, height: u32) -> TestPage {
    TestPage::Image {
        width: width as i64,
        height: height as i64,
        color_space: "DeviceGray",
        data: vec![200u8; (width as usize) * (height as usize)],
    }
}

/// An image whose dictionary may disagree with its samples.
pub fn raw_image_page(width: i64, height: i64, color_space: &'static str, data: Vec<u8>) -> TestPage {
    TestPage::Image {
        width,
        height,
        color_space,
        data,
    }
}

#[derive(Default)]
pub struct PdfBuilder {
    pages: Vec<TestPage>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: TestPage) -> Self {
        self.pages.push(page);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });

        let mut kids: Vec<Object> = Vec::new();
        for page in &self.pages {
            let (resources, operations) = match page {
                TestPage::Text(lines) => {
                    let mut ops = Vec::new();
                    for (i, line) in lines.iter().enumerate() {
                        let y = 720 - 20 * i as i64;
                        ops.push(Operation::new("BT", vec![]));
                        ops.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
                        ops.push(Operation::new("Td", vec![72.into(), y.into()]));
                        ops.push(Operation::new("Tj", vec![Object::string_literal(line.as_str())]));
                        ops.push(Operation::new("ET", vec![]));
                    }
                    (dictionary! { "Font" => dictionary! { "F1" => font_id } }, ops)
                }
                TestPage::Image {
                    width,
                    height,
                    color_space,
                    data,
                } => {
                    let image_id = doc.add_object(Stream::new(
                        dictionary! {
                            "Type" => "XObject",
                            "Subtype" => "Image",
                            "Width" => *width,
                            "Height" => *height,
                            "ColorSpace" => *color_space,
                            "BitsPerComponent" => 8,
                        },
                        data.clone(),
                    ));
                    let ops = vec![
                        Operation::new("q", vec![]),
                        Operation::new(
                            "cm",
                            vec![
                                width.abs().into(),
                                0.into(),
                                0.into(),
                                height.abs().into(),
                                72.into(),
                                400.into(),
                            ],
                        ),
                        Operation::new("Do", vec!["Im1".into()]),
                        Operation::new("Q", vec![]),
                    ];
                    (dictionary! { "XObject" => dictionary! { "Im1" => image_id } }, ops)
                }
            };

            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }
}

/// A two-page invoice: a text page and a scanned continuation page.
pub fn mixed_invoice() -> Vec<u8> {
    PdfBuilder::new()
        .page(text_page(&[
            "ACME Supplies Ltd",
            "Invoice Number: INV-2024-001",
            "Invoice Date: 03/15/2024",
        ]))
        .page(image_page(64, 32))
        .build()
}
