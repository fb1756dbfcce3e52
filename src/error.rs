use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The image or landmark layout is not one the engine supports.
    #[error("Unsupported shape: {0}")]
    Shape(String),

    /// A sampling window around a landmark falls outside the image.
    /// The engine never clips or pads; callers must keep landmarks at
    /// least `radius` pixels away from every edge.
    #[error("Sampling window of radius {radius} around ({x}, {y}) exceeds {width}x{height} image")]
    OutOfBounds {
        x: i64,
        y: i64,
        radius: usize,
        width: u32,
        height: u32,
    },

    /// A configuration parameter violates its stated constraint.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The regression solver could not produce a fit.
    #[error("Solver failure: {0}")]
    Solver(String),

    /// A caller-supplied data source could not produce an input.
    #[error("Data source error: {0}")]
    Source(String),
}

pub type Result<T> = std::result::Result<T, Error>;
