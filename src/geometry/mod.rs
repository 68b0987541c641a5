//! Geometric primitives shared by detection, ordering and field writing.
//!
//! Three coordinate spaces meet here:
//!
//! - **image space**: pixels of a rendered page, origin top-left
//! - **normalized space**: [`BoundingBox`], page fractions in `[0, 1]`, origin top-left
//! - **PDF user space**: [`Rect`], points, origin bottom-left
//!
//! Detectors convert image space into normalized space; the field writer converts
//! normalized space into PDF user space through [`PageGeometry`].

use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// A rectangle in PDF user space (points, origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// X coordinate of the lower-left corner
    pub x: f32,
    /// Y coordinate of the lower-left corner
    pub y: f32,
    /// Width of rectangle
    pub width: f32,
    /// Height of rectangle
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle from position and dimensions.
    ///
    /// # Examples
    ///
    /// ```
    /// use commonforms::geometry::Rect;
    ///
    /// let rect = Rect::new(0.0, 0.0, 100.0, 50.0);
    /// assert_eq!(rect.width, 100.0);
    /// assert_eq!(rect.height, 50.0);
    /// ```
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from two corner points.
    ///
    /// # Examples
    ///
    /// ```
    /// use commonforms::geometry::Rect;
    ///
    /// let rect = Rect::from_points(10.0, 20.0, 110.0, 70.0);
    /// assert_eq!(rect.x, 10.0);
    /// assert_eq!(rect.width, 100.0);
    /// assert_eq!(rect.height, 50.0);
    /// ```
    pub fn from_points(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        }
    }

    /// Get the right edge x-coordinate.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Get the top edge y-coordinate.
    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    /// Compute the area of the rectangle.
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// The `[llx lly urx ury]` array used for `/Rect` entries.
    pub fn to_pdf_array(&self) -> [f32; 4] {
        [self.x, self.y, self.right(), self.top()]
    }
}

/// A rectangle in normalized page-fraction coordinates.
///
/// `x0,y0,x1,y1` are fractions of the page width/height with the origin at the
/// top-left corner, `x1 >= x0` and `y1 >= y0`. Normalization decouples the
/// resolution a detector ran at from the resolution fields are placed at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge
    pub x0: f32,
    /// Top edge
    pub y0: f32,
    /// Right edge
    pub x1: f32,
    /// Bottom edge
    pub y1: f32,
}

impl BoundingBox {
    /// Create a box from normalized corners.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Create a box from pixel corners on an image of the given size.
    ///
    /// # Examples
    ///
    /// ```
    /// use commonforms::geometry::BoundingBox;
    ///
    /// let bbox = BoundingBox::from_pixels(100.0, 50.0, 300.0, 150.0, 1000, 500);
    /// assert_eq!(bbox.x0, 0.1);
    /// assert_eq!(bbox.y1, 0.3);
    /// ```
    pub fn from_pixels(x0: f32, y0: f32, x1: f32, y1: f32, width: u32, height: u32) -> Self {
        let w = width as f32;
        let h = height as f32;
        Self {
            x0: x0 / w,
            y0: y0 / h,
            x1: x1 / w,
            y1: y1 / h,
        }
    }

    /// Create a box from a normalized center/size tuple (YOLO `xywhn`).
    ///
    /// # Examples
    ///
    /// ```
    /// use commonforms::geometry::BoundingBox;
    ///
    /// let bbox = BoundingBox::from_center(0.5, 0.5, 0.25, 0.5);
    /// assert_eq!(bbox.x0, 0.375);
    /// assert_eq!(bbox.y0, 0.25);
    /// assert_eq!(bbox.x1, 0.625);
    /// assert_eq!(bbox.y1, 0.75);
    /// ```
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self {
            x0: cx - w / 2.0,
            y0: cy - h / 2.0,
            x1: cx + w / 2.0,
            y1: cy + h / 2.0,
        }
    }

    /// Convert back to pixel corners `[x0, y0, x1, y1]` for an image of the given size.
    pub fn to_pixels(&self, width: u32, height: u32) -> [f32; 4] {
        let w = width as f32;
        let h = height as f32;
        [self.x0 * w, self.y0 * h, self.x1 * w, self.y1 * h]
    }

    /// Width as a page fraction.
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    /// Height as a page fraction.
    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Area as a fraction of the page.
    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// True when the box covers no area (or is inverted / NaN).
    pub fn is_degenerate(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }

    /// Clamp all edges into the unit square.
    pub fn clamped(&self) -> Self {
        Self {
            x0: self.x0.clamp(0.0, 1.0),
            y0: self.y0.clamp(0.0, 1.0),
            x1: self.x1.clamp(0.0, 1.0),
            y1: self.y1.clamp(0.0, 1.0),
        }
    }

    /// Shift the box by a constant offset.
    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self {
            x0: self.x0 + dx,
            y0: self.y0 + dy,
            x1: self.x1 + dx,
            y1: self.y1 + dy,
        }
    }

    /// Intersection over union with another box.
    ///
    /// # Examples
    ///
    /// ```
    /// use commonforms::geometry::BoundingBox;
    ///
    /// let a = BoundingBox::new(0.0, 0.0, 0.2, 0.2);
    /// let b = BoundingBox::new(0.1, 0.0, 0.3, 0.2);
    /// assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-6);
    /// ```
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix0 = self.x0.max(other.x0);
        let iy0 = self.y0.max(other.y0);
        let ix1 = self.x1.min(other.x1);
        let iy1 = self.y1.min(other.y1);

        let intersection = (ix1 - ix0).max(0.0) * (iy1 - iy0).max(0.0);
        let union = self.area() + other.area() - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }
}

/// One rendered document page.
///
/// The raster is transient working memory: it is dropped as soon as detection
/// on the page is done.
#[derive(Debug, Clone)]
pub struct Page {
    /// Rendered raster
    pub image: DynamicImage,
    /// Pixel width of `image`
    pub width: u32,
    /// Pixel height of `image`
    pub height: u32,
}

impl Page {
    /// Wrap a rendered image, taking its dimensions.
    pub fn new(image: DynamicImage) -> Self {
        let width = image.width();
        let height = image.height();
        Self {
            image,
            width,
            height,
        }
    }
}

/// Visible area and orientation of a PDF page.
///
/// Maps normalized boxes measured on the page *as displayed* (what the
/// renderer rasterized) to unrotated PDF user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// Visible box (CropBox, falling back to MediaBox) in user space
    pub visible: Rect,
    /// `/Rotate` value normalized to 0, 90, 180 or 270
    pub rotation: u16,
}

impl PageGeometry {
    /// Create page geometry, normalizing the rotation to a multiple of 90 in `[0, 360)`.
    pub fn new(visible: Rect, rotation: i64) -> Self {
        let rotation = (((rotation % 360) + 360) % 360) as u16;
        let rotation = match rotation {
            90 | 180 | 270 => rotation,
            _ => 0,
        };
        Self { visible, rotation }
    }

    /// Map a normalized display point `(u, v)` to user space.
    fn map_point(&self, u: f32, v: f32) -> (f32, f32) {
        let Rect {
            x: llx,
            y: lly,
            width: w,
            height: h,
        } = self.visible;
        let urx = llx + w;
        let ury = lly + h;

        match self.rotation {
            // Displayed rotated clockwise: the page's left edge is on top.
            90 => (llx + v * w, lly + u * h),
            180 => (urx - u * w, lly + v * h),
            270 => (urx - v * w, ury - u * h),
            _ => (llx + u * w, ury - v * h),
        }
    }

    /// Convert a normalized display-space box to a user-space rectangle.
    ///
    /// # Examples
    ///
    /// ```
    /// use commonforms::geometry::{BoundingBox, PageGeometry, Rect};
    ///
    /// let page = PageGeometry::new(Rect::new(0.0, 0.0, 600.0, 800.0), 0);
    /// let rect = page.to_pdf_rect(&BoundingBox::new(0.1, 0.1, 0.5, 0.2));
    /// assert_eq!(rect.x, 60.0);
    /// assert_eq!(rect.y, 640.0);
    /// assert_eq!(rect.width, 240.0);
    /// assert_eq!(rect.height, 80.0);
    /// ```
    pub fn to_pdf_rect(&self, bbox: &BoundingBox) -> Rect {
        let (ax, ay) = self.map_point(bbox.x0, bbox.y0);
        let (bx, by) = self.map_point(bbox.x1, bbox.y1);
        Rect::from_points(ax.min(bx), ay.min(by), ax.max(bx), ay.max(by))
    }
}
