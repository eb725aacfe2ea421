use crate::constants::{BRUSH_COLOR, DEFAULT_BRUSH_SIZE};
use crate::error::{AtomError, Result};
use image::{Rgba, RgbaImage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Brush,
    Eraser,
}

/// A freehand polyline drawn with round caps and joins
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub tool: Tool,
    pub width: f32,
    pub points: Vec<(f32, f32)>,
}

impl Stroke {
    pub fn new(tool: Tool, width: f32) -> Self {
        Self {
            tool,
            width,
            points: Vec::new(),
        }
    }

    pub fn brush(width: f32) -> Self {
        Self::new(Tool::Brush, width)
    }

    pub fn eraser(width: f32) -> Self {
        Self::new(Tool::Eraser, width)
    }

    pub fn line_to(mut self, x: f32, y: f32) -> Self {
        self.points.push((x, y));
        self
    }

    /// Append points written as `"x,y x,y ..."`
    pub fn with_path(mut self, path: &str) -> Result<Self> {
        for pair in path.split_whitespace() {
            let (x, y) = pair
                .split_once(',')
                .ok_or_else(|| AtomError::invalid(format!("expected x,y but got {:?}", pair)))?;
            let coord = |v: &str| {
                v.trim()
                    .parse::<f32>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .ok_or_else(|| AtomError::invalid(format!("bad coordinate {:?}", v)))
            };
            self.points.push((coord(x)?, coord(y)?));
        }
        Ok(self)
    }

    /// Pixel-space bounds touched by the stroke, inclusive of the antialiased edge
    fn bounds(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        if self.points.is_empty() || width == 0 || height == 0 {
            return None;
        }
        let reach = self.width / 2.0 + 1.0;
        let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
        let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
        for &(x, y) in &self.points {
            min_x = min_x.min(x - reach);
            min_y = min_y.min(y - reach);
            max_x = max_x.max(x + reach);
            max_y = max_y.max(y + reach);
        }
        if max_x < 0.0 || max_y < 0.0 || min_x >= width as f32 || min_y >= height as f32 {
            return None;
        }
        let clamp = |v: f32, hi: u32| (v.floor().max(0.0) as u32).min(hi - 1);
        Some((
            clamp(min_x, width),
            clamp(min_y, height),
            clamp(max_x, width),
            clamp(max_y, height),
        ))
    }

    /// Fraction of the pixel centred at `(px, py)` covered by the stroke, in [0, 1]
    fn coverage_at(&self, px: f32, py: f32) -> f32 {
        let radius = self.width / 2.0;
        let distance = match self.points.as_slice() {
            [] => return 0.0,
            [only] => distance(px, py, *only),
            points => points
                .windows(2)
                .map(|seg| segment_distance(px, py, seg[0], seg[1]))
                .fold(f32::MAX, f32::min),
        };
        (radius + 0.5 - distance).clamp(0.0, 1.0)
    }
}

fn distance(px: f32, py: f32, (x, y): (f32, f32)) -> f32 {
    ((px - x).powi(2) + (py - y).powi(2)).sqrt()
}

fn segment_distance(px: f32, py: f32, a: (f32, f32), b: (f32, f32)) -> f32 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return distance(px, py, a);
    }
    let t = (((px - a.0) * dx + (py - a.1) * dy) / len_sq).clamp(0.0, 1.0);
    distance(px, py, (a.0 + t * dx, a.1 + t * dy))
}

/// Translucent drawing surface the user paints a selection on.
///
/// Starts fully transparent. Brush strokes composite source-over, eraser
/// strokes remove alpha in proportion to their coverage.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeLayer {
    surface: RgbaImage,
    brush_size: f32,
}

impl StrokeLayer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            surface: RgbaImage::new(width, height),
            brush_size: DEFAULT_BRUSH_SIZE,
        }
    }

    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    pub fn brush_size(&self) -> f32 {
        self.brush_size
    }

    pub fn set_brush_size(&mut self, size: f32) {
        self.brush_size = size.max(1.0);
    }

    /// Start a stroke with the current brush size
    pub fn stroke(&self, tool: Tool) -> Stroke {
        Stroke::new(tool, self.brush_size)
    }

    #[inline]
    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.surface.get_pixel(x, y)[3]
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.surface
    }

    /// Wipe every stroke
    pub fn clear(&mut self) {
        for pixel in self.surface.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    pub fn paint(&mut self, stroke: &Stroke) {
        let Some((x0, y0, x1, y1)) = stroke.bounds(self.width(), self.height()) else {
            return;
        };

        for y in y0..=y1 {
            for x in x0..=x1 {
                let coverage = stroke.coverage_at(x as f32 + 0.5, y as f32 + 0.5);
                if coverage <= 0.0 {
                    continue;
                }
                let pixel = self.surface.get_pixel_mut(x, y);
                match stroke.tool {
                    Tool::Brush => source_over(pixel, BRUSH_COLOR, coverage),
                    Tool::Eraser => destination_out(pixel, coverage),
                }
            }
        }
    }
}

fn source_over(dst: &mut Rgba<u8>, color: [u8; 4], coverage: f32) {
    let src_a = color[3] as f32 / 255.0 * coverage;
    let dst_a = dst[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        return;
    }
    for c in 0..3 {
        let blended =
            (color[c] as f32 * src_a + dst[c] as f32 * dst_a * (1.0 - src_a)) / out_a;
        dst[c] = blended.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

fn destination_out(dst: &mut Rgba<u8>, coverage: f32) {
    let remaining = dst[3] as f32 * (1.0 - coverage);
    dst[3] = remaining.round().clamp(0.0, 255.0) as u8;
    if dst[3] == 0 {
        *dst = Rgba([0, 0, 0, 0]);
    }
}
