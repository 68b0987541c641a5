//! pdfium-backed page rasterizer.

use crate::error::RenderError;
use crate::geometry::Page;
use pdfium_render::prelude::*;
use std::path::Path;

use super::Renderer;

/// Renders pages through a dynamically loaded pdfium library.
///
/// The library is looked up next to the executable first, then in the
/// system library path.
pub struct PdfiumRenderer {
    pdfium: Pdfium,
    dpi: f32,
}

impl PdfiumRenderer {
    /// Bind to pdfium and render at `dpi`.
    pub fn new(dpi: f32) -> Result<Self, RenderError> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| RenderError::Backend(format!("could not find pdfium library: {}", e)))?;

        Ok(Self {
            pdfium: Pdfium::new(bindings),
            dpi,
        })
    }

    /// Rendering resolution in dots per inch.
    pub fn dpi(&self) -> f32 {
        self.dpi
    }

    fn render_page(&self, page: &PdfPage, index: usize) -> Result<Page, RenderError> {
        let config = PdfRenderConfig::new()
            .scale_page_by_factor(self.dpi / 72.0)
            .render_form_data(true)
            .render_annotations(true);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| RenderError::Page {
                page: index,
                reason: e.to_string(),
            })?;

        Ok(Page::new(bitmap.as_image()))
    }
}

fn classify_load_error(error: PdfiumError) -> RenderError {
    match error {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
            RenderError::PasswordRequired
        },
        other => RenderError::Unreadable(other.to_string()),
    }
}

impl Renderer for PdfiumRenderer {
    fn render(&self, path: &Path) -> Result<Vec<Page>, RenderError> {
        let document = self
            .pdfium
            .load_pdf_from_file(path, None)
            .map_err(classify_load_error)?;

        let pages = document.pages();
        let mut rendered = Vec::with_capacity(pages.len() as usize);

        for (index, page) in pages.iter().enumerate() {
            let image = self.render_page(&page, index)?;
            log::debug!("Rendered page {} at {}x{}", index, image.width, image.height);
            rendered.push(image);
        }

        log::info!("Rendered {} pages from {}", rendered.len(), path.display());
        Ok(rendered)
    }
}
