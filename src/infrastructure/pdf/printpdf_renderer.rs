use chrono::Utc;
use printpdf::{
  BuiltinFont, Color, Greyscale, Image, ImageTransform, IndirectFontRef, Line, Mm,
  PdfDocument, PdfLayerReference, Point,
};
use std::path::Path;

use super::font_metrics::{ASCENT, FontWeight};
use super::layout::{self, DrawOp, InvoiceLayout, PAGE_HEIGHT, PAGE_WIDTH};
use crate::domain::invoice::{BrandConfig, InvoicePayload, errors::InvoiceError, ports::PdfRenderer};

const POINTS_PER_INCH: f32 = 72.0;

fn mm(points: f32) -> Mm {
  Mm(points * 25.4 / POINTS_PER_INCH)
}

fn pdf_error(e: impl std::fmt::Display) -> InvoiceError {
  InvoiceError::PdfRender(e.to_string())
}

struct Fonts {
  regular: IndirectFontRef,
  bold: IndirectFontRef,
}

impl Fonts {
  fn get(&self, weight: FontWeight) -> &IndirectFontRef {
    match weight {
      FontWeight::Regular => &self.regular,
      FontWeight::Bold => &self.bold,
    }
  }
}

/// Renders invoices with the PDF standard Helvetica faces, so no font files
/// are needed at runtime.
pub struct PrintPdfRenderer {
  brand: BrandConfig,
}

impl PrintPdfRenderer {
  pub fn new(brand: BrandConfig) -> Self {
    Self { brand }
  }

  fn draw(&self, layout: &InvoiceLayout) -> Result<Vec<u8>, InvoiceError> {
    let (doc, first_page, first_layer) =
      PdfDocument::new(layout.title.as_str(), mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Layer 1");
    let fonts = Fonts {
      regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?,
      bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?,
    };

    for (index, page) in layout.pages.iter().enumerate() {
      let layer = if index == 0 {
        doc.get_page(first_page).get_layer(first_layer)
      } else {
        let (page_index, layer_index) = doc.add_page(mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Layer 1");
        doc.get_page(page_index).get_layer(layer_index)
      };

      for op in &page.ops {
        draw_op(&layer, &fonts, op);
      }
    }

    doc.save_to_bytes().map_err(pdf_error)
  }
}

fn draw_op(layer: &PdfLayerReference, fonts: &Fonts, op: &DrawOp) {
  match op {
    DrawOp::Text {
      text,
      x,
      y,
      size,
      weight,
      gray,
    } => {
      layer.set_fill_color(Color::Greyscale(Greyscale::new(*gray, None)));
      let baseline = PAGE_HEIGHT - (y + size * ASCENT);
      layer.use_text(text.as_str(), *size, mm(*x), mm(baseline), fonts.get(*weight));
    }
    DrawOp::Rule { x1, x2, y, gray } => {
      layer.set_outline_color(Color::Greyscale(Greyscale::new(*gray, None)));
      layer.set_outline_thickness(1.0);
      layer.add_line(Line {
        points: vec![
          (Point::new(mm(*x1), mm(PAGE_HEIGHT - y)), false),
          (Point::new(mm(*x2), mm(PAGE_HEIGHT - y)), false),
        ],
        is_closed: false,
      });
    }
    DrawOp::Image { path, x, y, width } => draw_logo(layer, path, *x, *y, *width),
  }
}

/// A missing or unreadable logo never fails the document.
fn draw_logo(layer: &PdfLayerReference, path: &Path, x: f32, y: f32, width: f32) {
  let decoded = match printpdf::image_crate::open(path) {
    Ok(decoded) => decoded,
    Err(e) => {
      tracing::warn!(path = %path.display(), error = %e, "Skipping invoice logo");
      return;
    }
  };

  let (pixels_wide, pixels_high) = (decoded.width() as f32, decoded.height() as f32);
  if pixels_wide <= 0.0 || pixels_high <= 0.0 {
    tracing::warn!(path = %path.display(), "Skipping empty invoice logo");
    return;
  }
  // dpi that makes the image exactly `width` points wide
  let dpi = pixels_wide * POINTS_PER_INCH / width;
  let height = pixels_high * width / pixels_wide;

  Image::from_dynamic_image(&decoded).add_to_layer(
    layer.clone(),
    ImageTransform {
      translate_x: Some(mm(x)),
      translate_y: Some(mm(PAGE_HEIGHT - (y + height))),
      dpi: Some(dpi),
      ..Default::default()
    },
  );
}

impl PdfRenderer for PrintPdfRenderer {
  fn render(&self, payload: &InvoicePayload) -> Result<Vec<u8>, InvoiceError> {
    let layout = layout::layout_invoice(payload, &self.brand, Utc::now().date_naive());
    self.draw(&layout)
  }
}
