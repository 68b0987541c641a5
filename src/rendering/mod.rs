//! Page rendering for widget detection.
//!
//! Detectors work on raster images, so every page of the input document is
//! rendered once up front. The [`Renderer`] trait is the seam: the pipeline
//! depends only on it, tests substitute in-memory pages, and the `rendering`
//! feature provides [`PdfiumRenderer`].
//!
//! ## Example
//!
//! ```ignore
//! use commonforms::rendering::{PdfiumRenderer, Renderer};
//!
//! let renderer = PdfiumRenderer::new(144.0)?;
//! let pages = renderer.render("form.pdf".as_ref())?;
//! println!("{} pages at {}x{}", pages.len(), pages[0].width, pages[0].height);
//! ```

#[cfg(feature = "rendering")]
mod page_renderer;

#[cfg(feature = "rendering")]
pub use page_renderer::PdfiumRenderer;

use crate::error::RenderError;
use crate::geometry::Page;
use std::path::Path;

/// Renders every page of a document to a raster image.
pub trait Renderer {
    /// Render all pages of the document at `path`, in page order.
    ///
    /// A password-protected document must fail with
    /// [`RenderError::PasswordRequired`].
    fn render(&self, path: &Path) -> Result<Vec<Page>, RenderError>;
}

/// Renderer used when no rasterizer is compiled in.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRenderer;

impl Renderer for NoRenderer {
    fn render(&self, _path: &Path) -> Result<Vec<Page>, RenderError> {
        Err(RenderError::Backend(
            "built without the `rendering` feature".to_string(),
        ))
    }
}

/// The renderer for this build, rendering at `dpi`.
pub fn default_renderer(dpi: f32) -> Result<Box<dyn Renderer>, RenderError> {
    #[cfg(feature = "rendering")]
    {
        Ok(Box::new(PdfiumRenderer::new(dpi)?))
    }
    #[cfg(not(feature = "rendering"))]
    {
        log::debug!("No rasterizer available for {} dpi rendering", dpi);
        Ok(Box::new(NoRenderer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_renderer_reports_backend_error() {
        let err = NoRenderer.render(Path::new("form.pdf")).unwrap_err();
        assert!(matches!(err, RenderError::Backend(_)));
    }
}
