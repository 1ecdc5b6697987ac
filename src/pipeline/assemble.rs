//! Document assembly: slot images → one printable PDF.
//!
//! A4 landscape throughout, matching the aspect ratio the image model is
//! asked for. Page 1 is the title page; every slot then gets its own page
//! with the image scaled to fit the content area (aspect ratio preserved,
//! centred) and a small footer label.
//!
//! Per-page failure policy mirrors the rest of the pipeline: bytes that
//! won't decode leave that page blank (the footer is still drawn) instead of
//! aborting the document. Only the PDF writer itself failing is fatal.
//!
//! Decoding goes through printpdf's `image_crate` re-export so the decoded
//! type matches what the embedded-images API expects.

use crate::error::BookError;
use crate::output::ColoringBook;
use printpdf::image_crate::{self, DynamicImage, GenericImageView};
use printpdf::{BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use tracing::{debug, warn};

const PAGE_W_MM: f32 = 297.0;
const PAGE_H_MM: f32 = 210.0;
const MM_PER_PT: f32 = 25.4 / 72.0;
/// 40 pt page margin, as printed.
const MARGIN_MM: f32 = 40.0 * MM_PER_PT;
/// Images are embedded at this DPI; scale factors are relative to it.
const IMAGE_DPI: f32 = 300.0;

/// Build the finished PDF for a fully rendered book.
pub fn assemble(book: &ColoringBook) -> Result<Vec<u8>, BookError> {
    let title = format!("{}'s Coloring Adventure", book.child_name);
    let (doc, first_page, first_layer) =
        PdfDocument::new(&title, Mm(PAGE_W_MM), Mm(PAGE_H_MM), "content");

    let bold = add_font(&doc, BuiltinFont::HelveticaBold)?;
    let regular = add_font(&doc, BuiltinFont::Helvetica)?;

    // ── Title page ───────────────────────────────────────────────────────
    let layer = doc.get_page(first_page).get_layer(first_layer);
    let mid = PAGE_H_MM / 2.0;
    draw_centered(&layer, &title, 40.0, mid + 60.0 * MM_PER_PT, &bold);
    draw_centered(
        &layer,
        "A special gift coloring book",
        24.0,
        mid + 10.0 * MM_PER_PT,
        &regular,
    );
    draw_centered(
        &layer,
        &format!("Theme: {}", book.theme),
        20.0,
        mid - 30.0 * MM_PER_PT,
        &regular,
    );

    // ── One page per slot, cover first ───────────────────────────────────
    for (i, slot) in book.slots().enumerate() {
        let (page, layer_index) = doc.add_page(Mm(PAGE_W_MM), Mm(PAGE_H_MM), "content");
        let layer = doc.get_page(page).get_layer(layer_index);

        match image_crate::load_from_memory(&slot.image) {
            Ok(img) => place_image(&layer, img),
            Err(e) => {
                warn!("Slot {}: image unreadable ({e}); leaving page blank", slot.slot);
            }
        }

        let label = if i == 0 {
            "Cover Page".to_string()
        } else {
            format!("Page {i}")
        };
        draw_centered(&layer, &label, 10.0, 20.0 * MM_PER_PT, &regular);
    }

    doc.save_to_bytes().map_err(|e| BookError::AssemblyFailed {
        detail: e.to_string(),
    })
}

fn add_font(
    doc: &printpdf::PdfDocumentReference,
    font: BuiltinFont,
) -> Result<IndirectFontRef, BookError> {
    doc.add_builtin_font(font).map_err(|e| BookError::AssemblyFailed {
        detail: format!("builtin font unavailable: {e}"),
    })
}

/// Scale the image to the content area and centre it on the page.
fn place_image(layer: &PdfLayerReference, img: DynamicImage) {
    let (px_w, px_h) = img.dimensions();
    // Native print size at the embedding DPI.
    let native_w = px_w as f32 * 25.4 / IMAGE_DPI;
    let native_h = px_h as f32 * 25.4 / IMAGE_DPI;

    let content_w = PAGE_W_MM - 2.0 * MARGIN_MM;
    let content_h = PAGE_H_MM - 2.0 * MARGIN_MM;
    let (target_w, target_h) = fit_rect(native_w, native_h, content_w, content_h);
    let scale = target_w / native_w;

    let x = (PAGE_W_MM - target_w) / 2.0;
    let y = (PAGE_H_MM - target_h) / 2.0;
    debug!("Placing {px_w}x{px_h} px image at {target_w:.1}x{target_h:.1} mm");

    Image::from_dynamic_image(&img).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x)),
            translate_y: Some(Mm(y)),
            scale_x: Some(scale),
            scale_y: Some(scale),
            dpi: Some(IMAGE_DPI),
            ..Default::default()
        },
    );
}

/// Largest `(w, h)` with the source aspect ratio that fits the content box.
fn fit_rect(src_w: f32, src_h: f32, max_w: f32, max_h: f32) -> (f32, f32) {
    let scale = (max_w / src_w).min(max_h / src_h);
    (src_w * scale, src_h * scale)
}

/// Draw text horizontally centred on the page.
///
/// Builtin fonts expose no metrics through printpdf, so the line width is
/// estimated at half an em per character — close enough for Helvetica at
/// title sizes.
fn draw_centered(
    layer: &PdfLayerReference,
    text: &str,
    font_size_pt: f32,
    y_mm: f32,
    font: &IndirectFontRef,
) {
    let x = centered_x(text, font_size_pt, PAGE_W_MM);
    layer.use_text(text, font_size_pt, Mm(x), Mm(y_mm), font);
}

/// Left edge for a horizontally centred line, clamped to the page margin.
fn centered_x(text: &str, font_size_pt: f32, page_w_mm: f32) -> f32 {
    let est_width_mm = text.chars().count() as f32 * font_size_pt * 0.5 * MM_PER_PT;
    ((page_w_mm - est_width_mm) / 2.0).max(MARGIN_MM)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{IdeaSet, SlotResult};

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        use image::{ImageBuffer, Rgb};
        let img = ImageBuffer::from_pixel(w, h, Rgb::<u8>([255, 255, 255]));
        let mut bytes = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .unwrap();
        bytes
    }

    fn slot(i: usize, image: Vec<u8>) -> SlotResult {
        SlotResult {
            slot: i,
            idea: format!("idea {i}"),
            image_bytes: image.len(),
            image,
            retries: 0,
            used_placeholder: false,
            duration_ms: 1,
            error: None,
        }
    }

    fn book(pages: Vec<SlotResult>, cover: SlotResult) -> ColoringBook {
        ColoringBook {
            child_name: "Lily".into(),
            theme: "Space Dinosaurs".into(),
            ideas: IdeaSet {
                cover_idea: "cover".into(),
                page_ideas: pages.iter().map(|s| s.idea.clone()).collect(),
            },
            cover,
            pages,
        }
    }

    #[test]
    fn fit_rect_letterboxes_wide_images() {
        let (w, h) = fit_rect(200.0, 100.0, 100.0, 100.0);
        assert!((w - 100.0).abs() < 1e-4);
        assert!((h - 50.0).abs() < 1e-4);
    }

    #[test]
    fn fit_rect_pillarboxes_tall_images() {
        let (w, h) = fit_rect(100.0, 200.0, 100.0, 100.0);
        assert!((w - 50.0).abs() < 1e-4);
        assert!((h - 100.0).abs() < 1e-4);
    }

    #[test]
    fn fit_rect_upscales_small_images() {
        let (w, h) = fit_rect(10.0, 5.0, 100.0, 100.0);
        assert!((w - 100.0).abs() < 1e-4);
        assert!((h - 50.0).abs() < 1e-4);
    }

    #[test]
    fn centered_x_clamps_long_lines_to_margin() {
        let long = "x".repeat(400);
        assert!((centered_x(&long, 40.0, PAGE_W_MM) - MARGIN_MM).abs() < 1e-4);
        // Short lines land right of the margin.
        assert!(centered_x("Hi", 10.0, PAGE_W_MM) > MARGIN_MM);
    }

    #[test]
    fn assemble_produces_a_pdf() {
        let b = book(
            vec![slot(1, png_bytes(80, 60)), slot(2, png_bytes(60, 80))],
            slot(0, png_bytes(80, 60)),
        );
        let pdf = assemble(&b).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
        assert!(pdf.len() > 500);
    }

    #[test]
    fn garbage_image_bytes_leave_page_blank_not_fatal() {
        let b = book(
            vec![slot(1, b"not an image at all".to_vec()), slot(2, png_bytes(40, 40))],
            slot(0, png_bytes(40, 40)),
        );
        let pdf = assemble(&b).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[test]
    fn empty_page_list_still_yields_title_and_cover() {
        let b = book(vec![], slot(0, png_bytes(40, 40)));
        let pdf = assemble(&b).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }
}
