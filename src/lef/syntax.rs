// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! Syntax tree for LEF statements
//!
//! Recursive-descent builder over the tracker-corrected token stream. Each
//! statement becomes a [`SyntaxNode`] carrying its literal tokens; block
//! statements also carry child nodes. Blocks whose contents are not modeled
//! (layer bodies, sites, vias, property definitions, port/obs geometry) are
//! still traversed so their `END` terminators are validated, but their tokens
//! are kept unanalyzed.
//!
//! [`walk`] drives a [`LefListener`] over the finished tree with enter/exit
//! callbacks per node kind, mirroring the order statements appear in the
//! source.

use super::error::{LefError, LefResult};
use super::token::{Token, TokenKind, TokenSource};
use super::tracker::BlockTracker;

/// Statement kinds of the LEF grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Library,
    VersionStatement,
    BusBitCharsStatement,
    DividerCharStatement,
    UnitsBlock,
    UnitDeclaration,
    PropertyDefinitionsBlock,
    LayerStatement,
    SiteStatement,
    ViaStatement,
    ViaRuleStatement,
    MacroStatement,
    MacroProperty,
    PinDeclaration,
    PinDirection,
    PinProperty,
    PortBlock,
    ObsBlock,
}

/// A parsed statement: its literal tokens plus any nested statements
///
/// For named block statements, `tokens[1]` is the declared name and the last
/// token is the closing match token (already checked against the opener by
/// the block tracker).
#[derive(Debug, Clone)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    pub tokens: Vec<Token>,
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    /// Source position of the statement's first token
    pub fn position(&self) -> (u32, u32) {
        self.tokens
            .first()
            .map(|t| (t.line, t.column))
            .unwrap_or((0, 0))
    }
}

/// Builds the statement tree from a tracked token stream
pub struct SyntaxTreeBuilder<S> {
    tokens: BlockTracker<S>,
    file: String,
    last_position: (u32, u32),
}

impl<S: TokenSource> SyntaxTreeBuilder<S> {
    pub fn new(tokens: BlockTracker<S>, file: &str) -> Self {
        Self {
            tokens,
            file: file.to_string(),
            last_position: (1, 1),
        }
    }

    fn next(&mut self) -> LefResult<Option<Token>> {
        let token = self.tokens.next_token()?;
        if let Some(token) = &token {
            self.last_position = (token.line, token.column);
        }
        Ok(token)
    }

    fn bump(&mut self) -> LefResult<Token> {
        self.next()?.ok_or_else(|| {
            let (line, column) = self.last_position;
            LefError::syntax(&self.file, line, column, "unexpected end of file")
        })
    }

    /// Parse a whole library; EOF at the top level ends the document, and a
    /// top-level `END LIBRARY` must be the last thing in the file.
    pub fn parse(mut self) -> LefResult<SyntaxNode> {
        let mut tokens = Vec::new();
        let mut children = Vec::new();
        loop {
            let Some(token) = self.next()? else {
                break;
            };
            match token.kind {
                TokenKind::End => {
                    let close = self.bump()?;
                    tokens.push(token);
                    tokens.push(close);
                    if let Some(extra) = self.next()? {
                        return Err(LefError::syntax(
                            &self.file,
                            extra.line,
                            extra.column,
                            "expected end of file after END LIBRARY",
                        ));
                    }
                    break;
                }
                TokenKind::Version => {
                    children.push(self.directive_statement(token, NodeKind::VersionStatement)?)
                }
                TokenKind::BusBitChars => {
                    children.push(self.directive_statement(token, NodeKind::BusBitCharsStatement)?)
                }
                TokenKind::DividerChar => {
                    children.push(self.directive_statement(token, NodeKind::DividerCharStatement)?)
                }
                TokenKind::Units => children.push(self.units_block(token)?),
                TokenKind::PropertyDefinitions => children.push(
                    self.identified_block(token, NodeKind::PropertyDefinitionsBlock)?,
                ),
                TokenKind::Layer => {
                    children.push(self.named_block(token, NodeKind::LayerStatement)?)
                }
                TokenKind::Site => children.push(self.named_block(token, NodeKind::SiteStatement)?),
                TokenKind::Via => children.push(self.named_block(token, NodeKind::ViaStatement)?),
                TokenKind::ViaRule => {
                    children.push(self.named_block(token, NodeKind::ViaRuleStatement)?)
                }
                TokenKind::Macro => children.push(self.macro_statement(token)?),
                // Unknown top-level directives (NAMESCASESENSITIVE and
                // friends) are skipped through their semicolon.
                _ => self.skip_statement()?,
            }
        }
        Ok(SyntaxNode {
            kind: NodeKind::Library,
            tokens,
            children,
        })
    }

    /// Discard tokens through the next semicolon
    fn skip_statement(&mut self) -> LefResult<()> {
        while self.bump()?.kind != TokenKind::Semi {}
        Ok(())
    }

    /// Collect a `KEYWORD value… ;` statement including its semicolon
    fn directive_statement(&mut self, first: Token, kind: NodeKind) -> LefResult<SyntaxNode> {
        let mut tokens = vec![first];
        loop {
            let token = self.bump()?;
            let done = token.kind == TokenKind::Semi;
            tokens.push(token);
            if done {
                break;
            }
        }
        Ok(SyntaxNode {
            kind,
            tokens,
            children: Vec::new(),
        })
    }

    /// `UNITS … END UNITS`, each body statement a unit declaration
    fn units_block(&mut self, keyword: Token) -> LefResult<SyntaxNode> {
        let mut tokens = vec![keyword];
        let mut children = Vec::new();
        loop {
            let token = self.bump()?;
            if token.kind == TokenKind::End {
                let close = self.bump()?;
                tokens.push(token);
                tokens.push(close);
                break;
            }
            children.push(self.directive_statement(token, NodeKind::UnitDeclaration)?);
        }
        Ok(SyntaxNode {
            kind: NodeKind::UnitsBlock,
            tokens,
            children,
        })
    }

    /// A keyword-matched block whose body is kept unanalyzed
    fn identified_block(&mut self, keyword: Token, kind: NodeKind) -> LefResult<SyntaxNode> {
        let mut tokens = vec![keyword];
        loop {
            let token = self.bump()?;
            if token.kind == TokenKind::End {
                let close = self.bump()?;
                tokens.push(token);
                tokens.push(close);
                break;
            }
            tokens.push(token);
        }
        Ok(SyntaxNode {
            kind,
            tokens,
            children: Vec::new(),
        })
    }

    /// A named block whose body is kept unanalyzed (LAYER, SITE, VIA, VIARULE)
    fn named_block(&mut self, keyword: Token, kind: NodeKind) -> LefResult<SyntaxNode> {
        let name = self.bump()?;
        let mut tokens = vec![keyword, name];
        loop {
            let token = self.bump()?;
            if token.kind == TokenKind::End {
                let close = self.bump()?;
                tokens.push(token);
                tokens.push(close);
                break;
            }
            tokens.push(token);
        }
        Ok(SyntaxNode {
            kind,
            tokens,
            children: Vec::new(),
        })
    }

    /// An anonymous block closing with a bare `END` (PORT, OBS)
    fn anonymous_block(&mut self, keyword: Token, kind: NodeKind) -> LefResult<SyntaxNode> {
        let mut tokens = vec![keyword];
        loop {
            let token = self.bump()?;
            let done = token.kind == TokenKind::End;
            tokens.push(token);
            if done {
                break;
            }
        }
        Ok(SyntaxNode {
            kind,
            tokens,
            children: Vec::new(),
        })
    }

    fn macro_statement(&mut self, keyword: Token) -> LefResult<SyntaxNode> {
        let name = self.bump()?;
        let mut tokens = vec![keyword, name];
        let mut children = Vec::new();
        loop {
            let token = self.bump()?;
            match token.kind {
                TokenKind::End => {
                    let close = self.bump()?;
                    tokens.push(token);
                    tokens.push(close);
                    break;
                }
                TokenKind::Pin => children.push(self.pin_declaration(token)?),
                TokenKind::Obs => children.push(self.anonymous_block(token, NodeKind::ObsBlock)?),
                _ => children.push(self.directive_statement(token, NodeKind::MacroProperty)?),
            }
        }
        Ok(SyntaxNode {
            kind: NodeKind::MacroStatement,
            tokens,
            children,
        })
    }

    fn pin_declaration(&mut self, keyword: Token) -> LefResult<SyntaxNode> {
        let name = self.bump()?;
        let mut tokens = vec![keyword, name];
        let mut children = Vec::new();
        loop {
            let token = self.bump()?;
            match token.kind {
                TokenKind::End => {
                    let close = self.bump()?;
                    tokens.push(token);
                    tokens.push(close);
                    break;
                }
                TokenKind::Port => {
                    children.push(self.anonymous_block(token, NodeKind::PortBlock)?)
                }
                _ => {
                    let kind = if token.text == "DIRECTION" {
                        NodeKind::PinDirection
                    } else {
                        NodeKind::PinProperty
                    };
                    children.push(self.directive_statement(token, kind)?);
                }
            }
        }
        Ok(SyntaxNode {
            kind: NodeKind::PinDeclaration,
            tokens,
            children,
        })
    }
}

/// Enter/exit callbacks over the statement tree
///
/// Every method defaults to a no-op so implementors handle only the node
/// kinds they care about.
pub trait LefListener {
    fn exit_version(&mut self, node: &SyntaxNode) -> LefResult<()> {
        let _ = node;
        Ok(())
    }
    fn exit_busbitchars(&mut self, node: &SyntaxNode) -> LefResult<()> {
        let _ = node;
        Ok(())
    }
    fn exit_dividerchar(&mut self, node: &SyntaxNode) -> LefResult<()> {
        let _ = node;
        Ok(())
    }
    fn exit_unit_declaration(&mut self, node: &SyntaxNode) -> LefResult<()> {
        let _ = node;
        Ok(())
    }
    fn enter_layer(&mut self, node: &SyntaxNode) -> LefResult<()> {
        let _ = node;
        Ok(())
    }
    fn exit_layer(&mut self, node: &SyntaxNode) -> LefResult<()> {
        let _ = node;
        Ok(())
    }
    fn enter_macro(&mut self, node: &SyntaxNode) -> LefResult<()> {
        let _ = node;
        Ok(())
    }
    fn exit_macro(&mut self, node: &SyntaxNode) -> LefResult<()> {
        let _ = node;
        Ok(())
    }
    fn enter_macro_property(&mut self, node: &SyntaxNode) -> LefResult<()> {
        let _ = node;
        Ok(())
    }
    fn enter_pin(&mut self, node: &SyntaxNode) -> LefResult<()> {
        let _ = node;
        Ok(())
    }
    fn exit_pin(&mut self, node: &SyntaxNode) -> LefResult<()> {
        let _ = node;
        Ok(())
    }
    fn enter_pin_direction(&mut self, node: &SyntaxNode) -> LefResult<()> {
        let _ = node;
        Ok(())
    }
    fn enter_pin_property(&mut self, node: &SyntaxNode) -> LefResult<()> {
        let _ = node;
        Ok(())
    }
}

/// Depth-first traversal dispatching enter/exit callbacks per node kind
pub fn walk<L: LefListener>(listener: &mut L, node: &SyntaxNode) -> LefResult<()> {
    match node.kind {
        NodeKind::LayerStatement => listener.enter_layer(node)?,
        NodeKind::MacroStatement => listener.enter_macro(node)?,
        NodeKind::MacroProperty => listener.enter_macro_property(node)?,
        NodeKind::PinDeclaration => listener.enter_pin(node)?,
        NodeKind::PinDirection => listener.enter_pin_direction(node)?,
        NodeKind::PinProperty => listener.enter_pin_property(node)?,
        _ => {}
    }
    for child in &node.children {
        walk(listener, child)?;
    }
    match node.kind {
        NodeKind::VersionStatement => listener.exit_version(node)?,
        NodeKind::BusBitCharsStatement => listener.exit_busbitchars(node)?,
        NodeKind::DividerCharStatement => listener.exit_dividerchar(node)?,
        NodeKind::UnitDeclaration => listener.exit_unit_declaration(node)?,
        NodeKind::LayerStatement => listener.exit_layer(node)?,
        NodeKind::MacroStatement => listener.exit_macro(node)?,
        NodeKind::PinDeclaration => listener.exit_pin(node)?,
        _ => {}
    }
    Ok(())
}
