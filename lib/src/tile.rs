use crate::Error;
use std::fmt;

/// Number of distinct colors, and of distinct shapes, in a tile set.
pub const LABELS_PER_KIND: usize = 6;

/// One of the six color slots of a tile set.
///
/// The variant names follow the classic tile set. A physical set with other
/// colors maps its own labels onto these slots through a [TileSet].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Color {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
}

/// One of the six shape slots of a tile set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Shape {
    Circle,
    Square,
    Diamond,
    Star,
    Clover,
    Cross,
}

impl Color {
    pub const ALL: [Color; LABELS_PER_KIND] = [
        Color::Red,
        Color::Orange,
        Color::Yellow,
        Color::Green,
        Color::Blue,
        Color::Purple,
    ];

    /// The slot index (0..6)
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Color> {
        Color::ALL.get(index).copied()
    }
}

impl Shape {
    pub const ALL: [Shape; LABELS_PER_KIND] = [
        Shape::Circle,
        Shape::Square,
        Shape::Diamond,
        Shape::Star,
        Shape::Clover,
        Shape::Cross,
    ];

    /// The slot index (0..6)
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Shape> {
        Shape::ALL.get(index).copied()
    }
}

/// The labels of the physical tile set in use.
///
/// Slot `i` of `colors` names [Color::from_index]`(i)`, and likewise for shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSet {
    pub colors: [String; LABELS_PER_KIND],
    pub shapes: [String; LABELS_PER_KIND],
}

const CLASSIC_COLORS: [&str; LABELS_PER_KIND] = ["red", "orange", "yellow", "green", "blue", "purple"];
const PRINTED_COLORS: [&str; LABELS_PER_KIND] =
    ["silver", "purple", "orange", "blue", "pink", "purple-blue"];
const SHAPES: [&str; LABELS_PER_KIND] = ["circle", "square", "diamond", "star", "clover", "cross"];

fn labels(names: &[&str; LABELS_PER_KIND]) -> [String; LABELS_PER_KIND] {
    [
        names[0].to_string(),
        names[1].to_string(),
        names[2].to_string(),
        names[3].to_string(),
        names[4].to_string(),
        names[5].to_string(),
    ]
}

impl Default for TileSet {
    fn default() -> Self {
        TileSet::classic()
    }
}

impl TileSet {
    /// The retail tile set.
    pub fn classic() -> TileSet {
        TileSet {
            colors: labels(&CLASSIC_COLORS),
            shapes: labels(&SHAPES),
        }
    }

    /// A custom 3D-printed tile set with its own palette.
    pub fn printed() -> TileSet {
        TileSet {
            colors: labels(&PRINTED_COLORS),
            shapes: labels(&SHAPES),
        }
    }

    pub fn color_label(&self, color: Color) -> &str {
        &self.colors[color.index()]
    }

    pub fn shape_label(&self, shape: Shape) -> &str {
        &self.shapes[shape.index()]
    }

    /// Look up a color by label, ignoring case and surrounding whitespace.
    /// # Errors
    /// If the label is not one of the six colors of this set.
    pub fn parse_color(&self, label: &str) -> Result<Color, Error> {
        let label = label.trim();
        self.colors
            .iter()
            .position(|c| c.eq_ignore_ascii_case(label))
            .and_then(Color::from_index)
            .ok_or_else(|| Error::UnknownColor(label.to_string()))
    }

    /// Look up a shape by label, ignoring case and surrounding whitespace.
    /// # Errors
    /// If the label is not one of the six shapes of this set.
    pub fn parse_shape(&self, label: &str) -> Result<Shape, Error> {
        let label = label.trim();
        self.shapes
            .iter()
            .position(|s| s.eq_ignore_ascii_case(label))
            .and_then(Shape::from_index)
            .ok_or_else(|| Error::UnknownShape(label.to_string()))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", CLASSIC_COLORS[self.index()])
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", SHAPES[self.index()])
    }
}
