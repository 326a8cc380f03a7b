use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

use super::layout::{DrawOp, FontWeight, TicketLayout};
use super::TicketError;

const REGULAR_FONT: &str = "F1";
const BOLD_FONT: &str = "F2";

/// Serializes a laid-out ticket into a single-page PDF.
pub fn render_pdf(layout: &TicketLayout, title: &str) -> Result<Vec<u8>, TicketError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(builtin_font("Helvetica"));
    let bold_id = doc.add_object(builtin_font("Helvetica-Bold"));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            REGULAR_FONT => regular_id,
            BOLD_FONT => bold_id,
        },
    });

    let content = Content {
        operations: operations(layout),
    };
    let encoded = content
        .encode()
        .map_err(|e| TicketError::Pdf(e.to_string()))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => Object::Integer(1),
        "Resources" => resources_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(layout.width.into()),
            Object::Real(layout.height.into()),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::String(win_ansi(title), StringFormat::Literal),
        "Producer" => Object::string_literal("evntos"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| TicketError::Pdf(e.to_string()))?;
    Ok(bytes)
}

fn builtin_font(base_font: &str) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => Object::Name(base_font.as_bytes().to_vec()),
        "Encoding" => "WinAnsiEncoding",
    }
}

fn operations(layout: &TicketLayout) -> Vec<Operation> {
    let flip = |y: f32| layout.height - y;
    let mut ops = vec![Operation::new("g", vec![Object::Integer(0)])];

    for op in &layout.ops {
        match op {
            DrawOp::Text {
                x,
                y,
                size,
                weight,
                text,
            } => {
                let font = match weight {
                    FontWeight::Regular => REGULAR_FONT,
                    FontWeight::Bold => BOLD_FONT,
                };
                ops.extend([
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec![font.into(), real(*size)]),
                    Operation::new("Td", vec![real(*x), real(flip(*y))]),
                    Operation::new(
                        "Tj",
                        vec![Object::String(win_ansi(text), StringFormat::Literal)],
                    ),
                    Operation::new("ET", vec![]),
                ]);
            }
            DrawOp::Rect {
                x,
                y,
                width,
                height,
            } => {
                ops.push(Operation::new(
                    "re",
                    vec![real(*x), real(flip(*y + *height)), real(*width), real(*height)],
                ));
                ops.push(Operation::new("f", vec![]));
            }
        }
    }
    ops
}

fn real(value: f32) -> Object {
    Object::Real(value.into())
}

/// Latin-1 range maps straight onto WinAnsi; anything else becomes `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match u8::try_from(u32::from(c)) {
            Ok(byte) if byte >= 0x20 && byte != 0x7f && !(0x80..0xa0).contains(&byte) => byte,
            _ => b'?',
        })
        .collect()
}
