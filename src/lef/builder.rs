// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! Tree-walk assembler
//!
//! [`LefBuilder`] listens to the statement tree and assembles the document
//! model. Macro and pin data accumulate in draft form and are sealed into the
//! model when their block closes: pin finalization derives `basename`/`index`
//! from the active busbitchars pattern, macro finalization aggregates pins
//! into ports. The cursor type makes invalid macro/pin nesting
//! unrepresentable; hitting one of its error arms means the walker and the
//! grammar went out of sync.

use std::collections::BTreeSet;
use std::mem;

use indexmap::IndexMap;
use log::debug;

use super::error::{LefError, LefResult};
use super::syntax::{LefListener, SyntaxNode};
use super::token::{Token, TokenKind};
use super::{
    aggregate_ports, busbit_pair, BusBitPattern, Lef, LefLayer, LefMacro, LefPin, PinDirection,
    PinKind, Symmetry,
};

/// Macro attributes accumulated while its block is open
#[derive(Debug)]
struct MacroDraft {
    name: String,
    class: String,
    site: String,
    foreign: bool,
    origin: (f64, f64),
    size: (f64, f64),
    symmetry: BTreeSet<Symmetry>,
    pins: IndexMap<String, LefPin>,
}

impl MacroDraft {
    fn new(name: String) -> Self {
        Self {
            name,
            class: "Core".to_string(),
            site: String::new(),
            foreign: false,
            origin: (0.0, 0.0),
            size: (0.0, 0.0),
            symmetry: BTreeSet::new(),
            pins: IndexMap::new(),
        }
    }

    fn finish(self) -> LefMacro {
        let ports = aggregate_ports(&self.pins);
        LefMacro {
            name: self.name,
            class: self.class,
            site: self.site,
            foreign: self.foreign,
            origin: self.origin,
            size: self.size,
            symmetry: self.symmetry,
            pins: self.pins,
            ports,
        }
    }
}

/// Pin attributes accumulated while its block is open
#[derive(Debug)]
struct PinDraft {
    name: String,
    direction: PinDirection,
    tristate: Option<bool>,
    kind: PinKind,
    antenna_gate_area: Option<f64>,
    antenna_diff_area: Option<f64>,
}

impl PinDraft {
    fn new(name: String) -> Self {
        Self {
            name,
            direction: PinDirection::default(),
            tristate: None,
            kind: PinKind::default(),
            antenna_gate_area: None,
            antenna_diff_area: None,
        }
    }

    fn finish(self, pattern: &BusBitPattern) -> LefPin {
        let (basename, index) = pattern.split(&self.name);
        LefPin {
            name: self.name,
            direction: self.direction,
            tristate: self.tristate,
            kind: self.kind,
            antenna_gate_area: self.antenna_gate_area,
            antenna_diff_area: self.antenna_diff_area,
            basename,
            index,
        }
    }
}

/// Which entity the assembler is currently filling in
#[derive(Debug)]
enum Cursor {
    Idle,
    Macro(MacroDraft),
    Pin { owner: MacroDraft, pin: PinDraft },
}

/// Assembles a [`Lef`] library while walking the statement tree
pub struct LefBuilder {
    file: String,
    lef: Lef,
    pattern: BusBitPattern,
    current_layer: Option<String>,
    cursor: Cursor,
}

impl LefBuilder {
    /// Start assembling, merging into `lef` (whose busbitchars seed the
    /// bus-index pattern)
    pub fn new(file: &str, lef: Lef) -> LefResult<Self> {
        let (open, close) = busbit_pair(&lef.busbitchars).ok_or_else(|| {
            LefError::internal(format!(
                "library busbitchars {:?} is not a two-character pair",
                lef.busbitchars
            ))
        })?;
        let pattern = BusBitPattern::new(open, close)?;
        Ok(Self {
            file: file.to_string(),
            lef,
            pattern,
            current_layer: None,
            cursor: Cursor::Idle,
        })
    }

    pub fn finish(self) -> Lef {
        self.lef
    }

    fn node_err(&self, node: &SyntaxNode, message: String) -> LefError {
        let (line, column) = node.position();
        LefError::syntax(&self.file, line, column, message)
    }

    fn token_text<'n>(node: &'n SyntaxNode, index: usize) -> LefResult<&'n str> {
        node.tokens
            .get(index)
            .map(|t| t.text.as_str())
            .ok_or_else(|| {
                LefError::internal(format!("{:?} node is missing token {index}", node.kind))
            })
    }

    fn number(&self, node: &SyntaxNode, index: usize) -> LefResult<f64> {
        let text = Self::token_text(node, index)?;
        text.parse()
            .map_err(|_| self.node_err(node, format!("expected a number, found {text:?}")))
    }

    fn close_token<'n>(node: &'n SyntaxNode) -> LefResult<&'n Token> {
        node.tokens.last().ok_or_else(|| {
            LefError::internal(format!("{:?} node has no closing token", node.kind))
        })
    }

    /// Validate the closing name a block's grammar captured against the name
    /// it opened with
    fn check_close(&self, node: &SyntaxNode, kind: &'static str, expected: &str) -> LefResult<()> {
        let close = Self::close_token(node)?;
        if close.text != expected {
            return Err(LefError::NameMismatch {
                file: self.file.clone(),
                line: close.line,
                column: close.column,
                kind,
                expected: expected.to_string(),
                found: close.text.clone(),
            });
        }
        Ok(())
    }

    fn macro_mut(&mut self) -> LefResult<&mut MacroDraft> {
        match &mut self.cursor {
            Cursor::Macro(draft) => Ok(draft),
            _ => Err(LefError::internal(
                "macro statement with no open MACRO block",
            )),
        }
    }

    fn pin_mut(&mut self) -> LefResult<&mut PinDraft> {
        match &mut self.cursor {
            Cursor::Pin { pin, .. } => Ok(pin),
            _ => Err(LefError::internal("pin statement with no open PIN block")),
        }
    }
}

impl LefListener for LefBuilder {
    fn exit_version(&mut self, node: &SyntaxNode) -> LefResult<()> {
        self.lef.version = Self::token_text(node, 1)?.to_string();
        Ok(())
    }

    fn exit_busbitchars(&mut self, node: &SyntaxNode) -> LefResult<()> {
        let value = Self::token_text(node, 1)?.to_string();
        let Some((open, close)) = busbit_pair(&value) else {
            return Err(self.node_err(
                node,
                format!("BUSBITCHARS must be exactly two characters, got {value:?}"),
            ));
        };
        self.pattern = BusBitPattern::new(open, close)?;
        self.lef.busbitchars = value;
        Ok(())
    }

    fn exit_dividerchar(&mut self, node: &SyntaxNode) -> LefResult<()> {
        let value = Self::token_text(node, 1)?;
        if value.chars().count() != 1 {
            return Err(self.node_err(
                node,
                format!("DIVIDERCHAR must be exactly one character, got {value:?}"),
            ));
        }
        self.lef.dividerchar = value.to_string();
        Ok(())
    }

    fn exit_unit_declaration(&mut self, node: &SyntaxNode) -> LefResult<()> {
        // Everything but the DATABASE factor is ignored per the standard.
        if Self::token_text(node, 0)? == "DATABASE" {
            let text = Self::token_text(node, 2)?;
            let factor = text
                .parse()
                .map_err(|_| self.node_err(node, format!("invalid DATABASE factor {text:?}")))?;
            self.lef.units.database_microns = factor;
        }
        Ok(())
    }

    fn enter_layer(&mut self, node: &SyntaxNode) -> LefResult<()> {
        let name = Self::token_text(node, 1)?.to_string();
        self.lef
            .layers
            .insert(name.clone(), LefLayer { name: name.clone() });
        self.current_layer = Some(name);
        Ok(())
    }

    fn exit_layer(&mut self, node: &SyntaxNode) -> LefResult<()> {
        let name = self
            .current_layer
            .take()
            .ok_or_else(|| LefError::internal("LAYER close with no open layer"))?;
        self.check_close(node, "layer", &name)
    }

    fn enter_macro(&mut self, node: &SyntaxNode) -> LefResult<()> {
        let name = Self::token_text(node, 1)?.to_string();
        if !matches!(self.cursor, Cursor::Idle) {
            return Err(LefError::internal(
                "MACRO opened while another block is still open",
            ));
        }
        self.cursor = Cursor::Macro(MacroDraft::new(name));
        Ok(())
    }

    fn exit_macro(&mut self, node: &SyntaxNode) -> LefResult<()> {
        let draft = match mem::replace(&mut self.cursor, Cursor::Idle) {
            Cursor::Macro(draft) => draft,
            _ => return Err(LefError::internal("MACRO close with no open macro")),
        };
        self.check_close(node, "macro", &draft.name)?;
        let sealed = draft.finish();
        debug!(
            "sealed macro {} ({} pins, {} ports)",
            sealed.name,
            sealed.pins.len(),
            sealed.ports.len()
        );
        self.lef.macros.insert(sealed.name.clone(), sealed);
        Ok(())
    }

    fn enter_macro_property(&mut self, node: &SyntaxNode) -> LefResult<()> {
        match Self::token_text(node, 0)? {
            "CLASS" => {
                let value = Self::token_text(node, 1)?.to_string();
                self.macro_mut()?.class = value;
            }
            "SITE" => {
                let value = Self::token_text(node, 1)?.to_string();
                self.macro_mut()?.site = value;
            }
            "FOREIGN" => {
                self.macro_mut()?.foreign = true;
            }
            "ORIGIN" => {
                let x = self.number(node, 1)?;
                let y = self.number(node, 2)?;
                self.macro_mut()?.origin = (x, y);
            }
            "SIZE" => {
                let x = self.number(node, 1)?;
                let by = Self::token_text(node, 2)?;
                if by != "BY" {
                    return Err(
                        self.node_err(node, format!("expected BY in SIZE statement, found {by:?}"))
                    );
                }
                let y = self.number(node, 3)?;
                self.macro_mut()?.size = (x, y);
            }
            "SYMMETRY" => {
                for token in node.tokens.iter().skip(1) {
                    if token.kind == TokenKind::Semi {
                        break;
                    }
                    if let Some(op) = Symmetry::from_keyword(&token.text) {
                        self.macro_mut()?.symmetry.insert(op);
                    }
                }
            }
            // Unknown macro directives are accepted and ignored.
            _ => {}
        }
        Ok(())
    }

    fn enter_pin(&mut self, node: &SyntaxNode) -> LefResult<()> {
        let name = Self::token_text(node, 1)?.to_string();
        match mem::replace(&mut self.cursor, Cursor::Idle) {
            Cursor::Macro(owner) => {
                self.cursor = Cursor::Pin {
                    owner,
                    pin: PinDraft::new(name),
                };
                Ok(())
            }
            _ => Err(LefError::internal("PIN declared with no open MACRO block")),
        }
    }

    fn exit_pin(&mut self, node: &SyntaxNode) -> LefResult<()> {
        let (mut owner, pin) = match mem::replace(&mut self.cursor, Cursor::Idle) {
            Cursor::Pin { owner, pin } => (owner, pin),
            _ => return Err(LefError::internal("PIN close with no open pin")),
        };
        self.check_close(node, "pin", &pin.name)?;
        let sealed = pin.finish(&self.pattern);
        owner.pins.insert(sealed.name.clone(), sealed);
        self.cursor = Cursor::Macro(owner);
        Ok(())
    }

    fn enter_pin_direction(&mut self, node: &SyntaxNode) -> LefResult<()> {
        self.pin_mut()?;
        let value = Self::token_text(node, 1)?;
        let Some(direction) = PinDirection::from_keyword(value) else {
            return Ok(());
        };
        // TRISTATE is tracked for outputs only; other directions reset it.
        let tristate = if direction == PinDirection::Output {
            Some(node.tokens.get(2).map(|t| t.text == "TRISTATE").unwrap_or(false))
        } else {
            None
        };
        let pin = self.pin_mut()?;
        pin.direction = direction;
        pin.tristate = tristate;
        Ok(())
    }

    fn enter_pin_property(&mut self, node: &SyntaxNode) -> LefResult<()> {
        self.pin_mut()?;
        match Self::token_text(node, 0)? {
            "USE" => {
                let value = Self::token_text(node, 1)?;
                if let Some(kind) = PinKind::from_keyword(value) {
                    self.pin_mut()?.kind = kind;
                }
            }
            "ANTENNAGATEAREA" => {
                let area = self.number(node, 1)?;
                self.pin_mut()?.antenna_gate_area = Some(area);
            }
            "ANTENNADIFFAREA" => {
                let area = self.number(node, 1)?;
                self.pin_mut()?.antenna_diff_area = Some(area);
            }
            // Unknown pin directives are accepted and ignored.
            _ => {}
        }
        Ok(())
    }
}
