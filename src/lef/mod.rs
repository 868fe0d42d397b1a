// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! LEF document model
//!
//! Typed output of the parse pipeline: a [`Lef`] library owning layers and
//! macros, macros owning pins and their derived ports. Also home to the two
//! derived-data algorithms: bus-index extraction from pin names
//! ([`BusBitPattern`]) and pin-to-port aggregation at macro close.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use self::error::{LefError, LefResult};

pub mod builder;
pub mod error;
pub mod reader;
pub mod syntax;
pub mod token;
pub mod tracker;

pub use reader::LefReader;

/// Signal flow of a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum PinDirection {
    Input,
    Output,
    #[default]
    Inout,
    Feedthru,
}

impl PinDirection {
    fn from_keyword(word: &str) -> Option<Self> {
        Some(match word {
            "INPUT" => Self::Input,
            "OUTPUT" => Self::Output,
            "INOUT" => Self::Inout,
            "FEEDTHRU" => Self::Feedthru,
            _ => return None,
        })
    }
}

/// Electrical role of a pin (the LEF `USE` clause)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum PinKind {
    #[default]
    Signal,
    Clock,
    Power,
    Ground,
}

impl PinKind {
    fn from_keyword(word: &str) -> Option<Self> {
        Some(match word {
            "SIGNAL" => Self::Signal,
            "CLOCK" => Self::Clock,
            "POWER" => Self::Power,
            "GROUND" => Self::Ground,
            _ => return None,
        })
    }
}

/// Placement symmetry operation a macro permits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Symmetry {
    X,
    Y,
    R90,
}

impl Symmetry {
    fn from_keyword(word: &str) -> Option<Self> {
        Some(match word {
            "X" => Self::X,
            "Y" => Self::Y,
            "R90" => Self::R90,
            _ => return None,
        })
    }
}

/// A routing/cut layer; only its name is modeled
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LefLayer {
    pub name: String,
}

/// A single electrical terminal on a macro, possibly one bit of a bus
///
/// `basename` and `index` are derived exactly once when the pin block closes:
/// `x[3]` yields basename `x` and index `3`, a scalar name yields itself and
/// no index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LefPin {
    pub name: String,
    pub direction: PinDirection,
    /// Only meaningful for OUTPUT pins; `None` for every other direction
    pub tristate: Option<bool>,
    pub kind: PinKind,
    pub antenna_gate_area: Option<f64>,
    pub antenna_diff_area: Option<f64>,
    pub basename: String,
    pub index: Option<u32>,
}

/// Aggregated, possibly bus-ranged view over same-basename pins
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LefPort {
    pub direction: PinDirection,
    pub kind: PinKind,
    pub tristate: Option<bool>,
    pub msb: Option<u32>,
    pub lsb: Option<u32>,
}

/// A standard-cell template: footprint attributes plus its pins and ports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LefMacro {
    pub name: String,
    pub class: String,
    pub site: String,
    pub foreign: bool,
    pub origin: (f64, f64),
    pub size: (f64, f64),
    pub symmetry: BTreeSet<Symmetry>,
    /// Pins in declaration order
    pub pins: IndexMap<String, LefPin>,
    /// Ports keyed by basename, in first-seen order
    pub ports: IndexMap<String, LefPort>,
}

/// Scale factors from the UNITS block
///
/// Only `DATABASE MICRONS` is captured; the other unit kinds are parsed and
/// discarded, as the format allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitConversionFactors {
    pub capacitance_pf: u32,
    pub current_ma: u32,
    pub database_microns: u32,
    pub frequency_mhz: u32,
    pub power_mw: u32,
    pub resistance_ohms: u32,
    pub time_ns: u32,
    pub voltage_v: u32,
}

impl Default for UnitConversionFactors {
    fn default() -> Self {
        Self {
            capacitance_pf: 1,
            current_ma: 1,
            database_microns: 100,
            frequency_mhz: 1,
            power_mw: 1,
            resistance_ohms: 1,
            time_ns: 1,
            voltage_v: 1,
        }
    }
}

/// Root of the document model: one library, possibly merged from several files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lef {
    pub version: String,
    /// The two characters delimiting a bus-index suffix, e.g. `[]`
    pub busbitchars: String,
    pub dividerchar: String,
    pub units: UnitConversionFactors,
    pub layers: IndexMap<String, LefLayer>,
    pub macros: IndexMap<String, LefMacro>,
}

impl Default for Lef {
    fn default() -> Self {
        Self {
            version: "5.8".to_string(),
            busbitchars: "[]".to_string(),
            dividerchar: "/".to_string(),
            units: UnitConversionFactors::default(),
            layers: IndexMap::new(),
            macros: IndexMap::new(),
        }
    }
}

/// Split a busbitchars value into its open/close pair, or `None` if it is not
/// exactly two characters
pub(crate) fn busbit_pair(busbitchars: &str) -> Option<(char, char)> {
    let mut chars = busbitchars.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(open), Some(close), None) => Some((open, close)),
        _ => None,
    }
}

/// Compiled matcher for trailing bus-index suffixes like `[5]`
///
/// Recompiled whenever the library's busbitchars change; pins processed under
/// an earlier pattern keep their derived fields.
#[derive(Debug, Clone)]
pub struct BusBitPattern {
    re: Regex,
}

impl BusBitPattern {
    pub fn new(open: char, close: char) -> LefResult<Self> {
        let pattern = format!(
            "^(.*){}([0-9]+){}$",
            regex::escape(&open.to_string()),
            regex::escape(&close.to_string())
        );
        let re = Regex::new(&pattern)
            .map_err(|e| LefError::internal(format!("bus index pattern failed to compile: {e}")))?;
        Ok(Self { re })
    }

    /// Split a pin name into its basename and bus index
    ///
    /// Names not ending in `<open><digits><close>` come back whole, with no
    /// index.
    pub fn split(&self, name: &str) -> (String, Option<u32>) {
        if let Some(captures) = self.re.captures(name) {
            if let (Some(base), Some(digits)) = (captures.get(1), captures.get(2)) {
                if let Ok(index) = digits.as_str().parse::<u32>() {
                    return (base.as_str().to_string(), Some(index));
                }
            }
        }
        (name.to_string(), None)
    }
}

/// Collapse same-basename pins into ranged ports, in first-seen order
///
/// The port is seeded from the first contributing pin; index bounds widen
/// from a floor/ceiling of 0, matching the format's zero-based buses.
pub(crate) fn aggregate_ports(pins: &IndexMap<String, LefPin>) -> IndexMap<String, LefPort> {
    let mut ports: IndexMap<String, LefPort> = IndexMap::new();
    for pin in pins.values() {
        let port = ports.entry(pin.basename.clone()).or_insert_with(|| LefPort {
            direction: pin.direction,
            kind: pin.kind,
            tristate: pin.tristate,
            msb: None,
            lsb: None,
        });
        if let Some(index) = pin.index {
            port.msb = Some(index.max(port.msb.unwrap_or(0)));
            port.lsb = Some(index.min(port.lsb.unwrap_or(0)));
        }
    }
    ports
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(open: char, close: char) -> BusBitPattern {
        BusBitPattern::new(open, close).expect("pattern failed to compile")
    }

    fn pin(name: &str, index: Option<u32>) -> LefPin {
        let (basename, _) = pattern('[', ']').split(name);
        LefPin {
            name: name.to_string(),
            direction: PinDirection::default(),
            tristate: None,
            kind: PinKind::default(),
            antenna_gate_area: None,
            antenna_diff_area: None,
            basename,
            index,
        }
    }

    #[test]
    fn test_bus_index_extraction() {
        let p = pattern('[', ']');
        assert_eq!(p.split("x[0]"), ("x".to_string(), Some(0)));
        assert_eq!(p.split("x[31]"), ("x".to_string(), Some(31)));
        assert_eq!(p.split("data_in[7]"), ("data_in".to_string(), Some(7)));
        // nested suffixes strip only the last one
        assert_eq!(p.split("x[0][1]"), ("x[0]".to_string(), Some(1)));
    }

    #[test]
    fn test_scalar_names_pass_through() {
        let p = pattern('[', ']');
        assert_eq!(p.split("clk"), ("clk".to_string(), None));
        assert_eq!(p.split("x[a]"), ("x[a]".to_string(), None));
        assert_eq!(p.split("x[]"), ("x[]".to_string(), None));
        assert_eq!(p.split("x[3]y"), ("x[3]y".to_string(), None));
    }

    #[test]
    fn test_alternate_delimiters() {
        let p = pattern('<', '>');
        assert_eq!(p.split("y<12>"), ("y".to_string(), Some(12)));
        assert_eq!(p.split("y[12]"), ("y[12]".to_string(), None));
    }

    #[test]
    fn test_port_bounds_widen_from_zero() {
        let mut pins = IndexMap::new();
        for i in [5u32, 9, 7] {
            let name = format!("x[{i}]");
            pins.insert(name.clone(), pin(&name, Some(i)));
        }
        let ports = aggregate_ports(&pins);
        let port = &ports["x"];
        // bounds seed at 0, so a bus starting at 5 still floors lsb at 0
        assert_eq!(port.msb, Some(9));
        assert_eq!(port.lsb, Some(0));
    }

    #[test]
    fn test_scalar_port_has_no_bounds() {
        let mut pins = IndexMap::new();
        pins.insert("clk".to_string(), pin("clk", None));
        let ports = aggregate_ports(&pins);
        assert_eq!(ports["clk"].msb, None);
        assert_eq!(ports["clk"].lsb, None);
    }

    #[test]
    fn test_ports_in_first_seen_order() {
        let mut pins = IndexMap::new();
        for name in ["b[1]", "a", "b[0]", "c[2]"] {
            let index = pattern('[', ']').split(name).1;
            pins.insert(name.to_string(), pin(name, index));
        }
        let ports = aggregate_ports(&pins);
        let names: Vec<&str> = ports.keys().map(|s| s.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
        assert_eq!(ports["b"].msb, Some(1));
        assert_eq!(ports["b"].lsb, Some(0));
    }

    #[test]
    fn test_busbit_pair() {
        assert_eq!(busbit_pair("[]"), Some(('[', ']')));
        assert_eq!(busbit_pair("<>"), Some(('<', '>')));
        assert_eq!(busbit_pair("["), None);
        assert_eq!(busbit_pair("[]("), None);
    }
}
