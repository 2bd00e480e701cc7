use serde::{Deserialize, Serialize};

use crate::offset::OffsetId;

/// Horizontal text alignment
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Alignment {
    #[default]
    General,
    Left,
    Center,
    Right,
}

/// An RGB color triple. Serializes as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(0xFF, 0xFF, 0xFF);
    pub const RED: Rgb = Rgb(0xFF, 0x00, 0x00);

    /// Parse `#RRGGBB` or `RRGGBB` (case-insensitive).
    pub fn parse_hex(input: &str) -> Option<Self> {
        let hex = input.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// `#RRGGBB`, upper-case.
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }

    /// Packed `0xRRGGBB`, the layout xlsx writers expect.
    pub fn to_u32(self) -> u32 {
        ((self.0 as u32) << 16) | ((self.1 as u32) << 8) | (self.2 as u32)
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Rgb {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Rgb::parse_hex(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid color '{s}'")))
    }
}

/// Cell formatting options
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CellFormat {
    pub bold: bool,
    pub font_size: Option<f32>,
    pub font_color: Option<Rgb>,
    pub background_color: Option<Rgb>,
    pub alignment: Alignment,
    pub wrap: bool,
    pub border: bool,
}

impl CellFormat {
    pub fn bold() -> Self {
        Self { bold: true, ..Self::default() }
    }

    pub fn with_fill(mut self, color: Rgb) -> Self {
        self.background_color = Some(color);
        self
    }

    pub fn with_border(mut self) -> Self {
        self.border = true;
        self
    }

    pub fn centered(mut self) -> Self {
        self.alignment = Alignment::Center;
        self
    }

    pub fn wrapped(mut self) -> Self {
        self.wrap = true;
        self
    }

    pub fn is_default(&self) -> bool {
        *self == CellFormat::default()
    }
}

/// How an adjusted cell combines its literal with the referenced offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetOp {
    Add,
    Subtract,
}

impl OffsetOp {
    pub fn apply(self, base: f64, offset: f64) -> f64 {
        match self {
            OffsetOp::Add => base + offset,
            OffsetOp::Subtract => base - offset,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            OffsetOp::Add => '+',
            OffsetOp::Subtract => '-',
        }
    }
}

/// Tagged cell content.
///
/// Formulas are not stored as text: an `Adjusted` cell keeps its literal and
/// the offset it depends on, and the output adapter decides the concrete
/// formula syntax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CellValue {
    Empty,
    Text { text: String },
    Number { value: f64 },
    /// Explicit "no value" marker, distinct from both empty and zero.
    Absent,
    /// The slot holding an offset's current value.
    Offset { id: OffsetId },
    /// `base <op> offset`, evaluated against the offset's current value.
    Adjusted { base: f64, offset: OffsetId, op: OffsetOp },
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Empty
    }
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text { text: s.into() }
    }

    pub fn number(value: f64) -> Self {
        CellValue::Number { value }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Display without evaluating references.
    pub fn raw_display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text { text } => text.clone(),
            CellValue::Number { value } => format_number(*value),
            CellValue::Absent => "-".to_string(),
            CellValue::Offset { id } => format!("<offset {}>", id.0),
            CellValue::Adjusted { base, offset, op } => {
                format!("{}{}<offset {}>", format_number(*base), op.symbol(), offset.0)
            }
        }
    }
}

/// Integers render without a fraction, everything else with two decimals.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{:.2}", n)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub value: CellValue,
    pub format: CellFormat,
}

impl Cell {
    pub fn new(value: CellValue) -> Self {
        Self { value, format: CellFormat::default() }
    }

    pub fn with_format(value: CellValue, format: CellFormat) -> Self {
        Self { value, format }
    }
}
