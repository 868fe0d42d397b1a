//! LEF Parser Library
//!
//! This library parses LEF (Library Exchange Format) files used in Electronic
//! Design Automation (EDA) workflows into a typed in-memory model: a library
//! of layers, macros, pins and bus-aggregated ports, plus unit conversion
//! factors, for consumption by downstream place-and-route tooling.

pub mod lef;

// Re-export commonly used types
pub use lef::error::{LefError, LefResult};
pub use lef::{
    BusBitPattern, Lef, LefLayer, LefMacro, LefPin, LefPort, LefReader, PinDirection, PinKind,
    Symmetry, UnitConversionFactors,
};
