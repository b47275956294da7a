//! Lateral surface materials
//!
//! A material is a small parameter block plus a shader variant. The sensor
//! shader is assembled around the variant's fragment, so two materials of the
//! same kind share one linked program and differ only in their uniforms.

use serde::{Deserialize, Serialize};

use super::uniforms::{UniformMap, UniformValue};

/// Linear RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
    /// Alpha, `1.0` is fully opaque
    pub a: f32,
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Color {
    /// Opaque white
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    /// Opaque black
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    /// Opaque red
    pub const RED: Self = Self::new(1.0, 0.0, 0.0, 1.0);

    /// Create a color from components in `[0, 1]`
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create a color from 8-bit components
    pub fn from_bytes(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            f32::from(a) / 255.0,
        )
    }

    /// Same color with a different alpha
    #[must_use]
    pub const fn with_alpha(self, a: f32) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }

    /// Whether blending is needed to draw this color
    pub fn is_translucent(&self) -> bool {
        self.a < 1.0
    }

    /// Components as an array
    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Uniform names used by the material fragments
pub mod names {
    /// Solid color
    pub const COLOR: &str = "color";
    /// Stripe color on even bands
    pub const EVEN_COLOR: &str = "evenColor";
    /// Stripe color on odd bands
    pub const ODD_COLOR: &str = "oddColor";
    /// Stripe band count
    pub const REPEAT: &str = "repeat";
    /// Stripe band offset
    pub const OFFSET: &str = "offset";
    /// Non-zero for horizontal stripes
    pub const HORIZONTAL: &str = "horizontal";
    /// Alpha inside grid cells
    pub const CELL_ALPHA: &str = "cellAlpha";
    /// Grid line count along each axis
    pub const LINE_COUNT: &str = "lineCount";
    /// Grid line thickness along each axis
    pub const LINE_THICKNESS: &str = "lineThickness";
    /// Grid line offset along each axis
    pub const LINE_OFFSET: &str = "lineOffset";
}

/// Shader variant of a material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialKind {
    /// Single color
    Color,
    /// Alternating bands
    Stripe,
    /// Line grid over a translucent cell fill
    Grid,
}

/// Parameters of a stripe material
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StripeParams {
    /// Color on even bands
    pub even_color: Color,
    /// Color on odd bands
    pub odd_color: Color,
    /// Number of bands
    pub repeat: f64,
    /// Band offset in band widths
    pub offset: f64,
    /// Bands run horizontally when set
    pub horizontal: bool,
}

impl Default for StripeParams {
    fn default() -> Self {
        Self {
            even_color: Color::WHITE.with_alpha(0.5),
            odd_color: Color::new(0.0, 0.0, 1.0, 0.5),
            repeat: 5.0,
            offset: 0.0,
            horizontal: true,
        }
    }
}

/// Parameters of a grid material
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridParams {
    /// Line color
    pub color: Color,
    /// Alpha applied to the cell fill
    pub cell_alpha: f64,
    /// Lines along each axis
    pub line_count: [f64; 2],
    /// Line thickness in pixels along each axis
    pub line_thickness: [f64; 2],
    /// Line offset along each axis
    pub line_offset: [f64; 2],
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            color: Color::new(0.0, 1.0, 0.0, 1.0),
            cell_alpha: 0.1,
            line_count: [8.0, 8.0],
            line_thickness: [1.0, 1.0],
            line_offset: [0.0, 0.0],
        }
    }
}

/// Enumeration of supported material types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MaterialType {
    /// Single color fill
    Color(Color),
    /// Alternating bands
    Stripe(StripeParams),
    /// Line grid
    Grid(GridParams),
}

/// Lateral surface material of a sensor volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Material type and parameters
    pub material_type: MaterialType,
}

impl Default for Material {
    /// Half-transparent red, the stock color material
    fn default() -> Self {
        Self::color(Color::new(1.0, 0.0, 0.0, 0.5))
    }
}

impl Material {
    /// Create a solid color material
    pub const fn color(color: Color) -> Self {
        Self {
            material_type: MaterialType::Color(color),
        }
    }

    /// Create a stripe material
    pub const fn stripe(params: StripeParams) -> Self {
        Self {
            material_type: MaterialType::Stripe(params),
        }
    }

    /// Create a grid material
    pub const fn grid(params: GridParams) -> Self {
        Self {
            material_type: MaterialType::Grid(params),
        }
    }

    /// Shader variant selected by this material
    pub const fn kind(&self) -> MaterialKind {
        match self.material_type {
            MaterialType::Color(_) => MaterialKind::Color,
            MaterialType::Stripe(_) => MaterialKind::Stripe,
            MaterialType::Grid(_) => MaterialKind::Grid,
        }
    }

    /// Whether any output fragment can be partially transparent
    pub fn is_translucent(&self) -> bool {
        match &self.material_type {
            MaterialType::Color(color) => color.is_translucent(),
            MaterialType::Stripe(params) => {
                params.even_color.is_translucent() || params.odd_color.is_translucent()
            }
            MaterialType::Grid(params) => params.color.is_translucent() || params.cell_alpha < 1.0,
        }
    }

    /// Uniform bindings consumed by the material fragment
    pub fn uniforms(&self) -> UniformMap {
        match &self.material_type {
            MaterialType::Color(color) => {
                UniformMap::new().with(names::COLOR, UniformValue::Color(*color))
            }
            MaterialType::Stripe(params) => UniformMap::new()
                .with(names::EVEN_COLOR, UniformValue::Color(params.even_color))
                .with(names::ODD_COLOR, UniformValue::Color(params.odd_color))
                .with(names::REPEAT, UniformValue::Float(params.repeat))
                .with(names::OFFSET, UniformValue::Float(params.offset))
                .with(names::HORIZONTAL, UniformValue::Bool(params.horizontal)),
            MaterialType::Grid(params) => UniformMap::new()
                .with(names::COLOR, UniformValue::Color(params.color))
                .with(names::CELL_ALPHA, UniformValue::Float(params.cell_alpha))
                .with(names::LINE_COUNT, UniformValue::Vec2(params.line_count))
                .with(names::LINE_THICKNESS, UniformValue::Vec2(params.line_thickness))
                .with(names::LINE_OFFSET, UniformValue::Vec2(params.line_offset)),
        }
    }
}
