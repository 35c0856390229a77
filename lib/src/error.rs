use crate::board::Axis;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unknown color label {0:?}")]
    UnknownColor(String),
    #[error("Unknown shape label {0:?}")]
    UnknownShape(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// Error decoding an image held in memory
    #[error("Image could not be decoded")]
    Image(#[from] image::error::ImageError),
    /// Error opening or decoding an image file
    #[error("Image {path} could not be decoded")]
    ImageError {
        path: String,
        source: image::error::ImageError,
    },
}

/// Why a move was rejected by the rule engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("No tiles placed")]
    NoTiles,
    #[error("Tiles must be placed in a single unbroken line")]
    NotALine,
    #[error("Position ({x}, {y}) is already occupied")]
    PositionOccupied { x: i32, y: i32 },
    #[error("Tiles must connect to existing tiles")]
    NotConnected,
    #[error("Invalid {axis} line: tiles must share a color or a shape, without duplicates")]
    InvalidLine { axis: Axis },
    #[error("Line of {length} tiles exceeds the maximum length of 6")]
    LineTooLong { length: usize },
}

/// Failure of the external tile classifier for one tile image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifierError {
    #[error("Model not trained yet")]
    ModelNotReady,
    #[error("Classification failed: {0}")]
    Failed(String),
}
