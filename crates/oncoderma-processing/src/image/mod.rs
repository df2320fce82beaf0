pub mod probe;
pub mod reader;

pub use probe::{probe_image, read_dimensions, ProbeError, ProbedImage};
pub use reader::{DimensionReader, HeaderDimensionReader};
