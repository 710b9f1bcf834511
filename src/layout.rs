//! Page layout calculations

/// Simple length type in millimeters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length(pub f64);

impl Length {
    /// Create a length from millimeters
    pub fn from_mm(mm: f64) -> Self {
        Length(mm)
    }

    /// Create a length from inches
    pub fn from_inches(inches: f64) -> Self {
        Length(inches * 25.4)
    }

    /// Create a length from points (1/72 inch)
    pub fn from_pt(pt: f64) -> Self {
        Length(pt * 25.4 / 72.0)
    }

    /// Get the value in millimeters
    pub fn mm(&self) -> f64 {
        self.0
    }

    /// Get the value in points (1/72 inch)
    pub fn pt(&self) -> f64 {
        self.0 * 72.0 / 25.4
    }

    /// Get the value in CSS pixels (1/96 inch)
    pub fn css_px(&self) -> f64 {
        self.0 * 96.0 / 25.4
    }
}

/// Page dimensions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageDimensions {
    pub width: Length,
    pub height: Length,
}

impl PageDimensions {
    /// US Letter size (8.5" × 11")
    pub fn letter() -> Self {
        Self {
            width: Length::from_mm(215.9),
            height: Length::from_mm(279.4),
        }
    }

    /// A4 size (210mm × 297mm)
    pub fn a4() -> Self {
        Self {
            width: Length::from_mm(210.0),
            height: Length::from_mm(297.0),
        }
    }

    /// Look up a named page size ("a4", "letter"), case-insensitive
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "a4" => Some(Self::a4()),
            "letter" | "us-letter" => Some(Self::letter()),
            _ => None,
        }
    }

    /// Width and height in points, rounded to 1/100 pt
    pub fn size_pt(&self) -> (f64, f64) {
        let round = |v: f64| (v * 100.0).round() / 100.0;
        (round(self.width.pt()), round(self.height.pt()))
    }
}

impl Default for PageDimensions {
    fn default() -> Self {
        Self::a4()
    }
}

/// Margins for page content
#[derive(Debug, Clone, Copy)]
pub struct Margins {
    pub top: Length,
    pub bottom: Length,
    pub left: Length,
    pub right: Length,
}

impl Margins {
    /// Create margins with same value on all sides
    pub fn uniform(margin: Length) -> Self {
        Self {
            top: margin,
            bottom: margin,
            left: margin,
            right: margin,
        }
    }

    /// Standard 1-inch margins on all sides
    pub fn standard() -> Self {
        Self::uniform(Length::from_inches(1.0))
    }
}

/// Where a bitmap lands on a page, in points from the bottom-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub scale: f64,
}

/// Scale an image to fit the page while keeping its aspect ratio, then centre it
///
/// `scale = min(page_width / image_width, page_height / image_height)`.
/// Image pixels are treated as points, so small images are scaled up.
/// Returns `None` for an image with a zero dimension.
pub fn fit_centered(image_width: u32, image_height: u32, page: &PageDimensions) -> Option<Placement> {
    if image_width == 0 || image_height == 0 {
        return None;
    }

    let (page_width, page_height) = page.size_pt();
    let image_width = f64::from(image_width);
    let image_height = f64::from(image_height);

    let scale = (page_width / image_width).min(page_height / image_height);
    let width = image_width * scale;
    let height = image_height * scale;

    Some(Placement {
        x: (page_width - width) / 2.0,
        y: (page_height - height) / 2.0,
        width,
        height,
        scale,
    })
}
