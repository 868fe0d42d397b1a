// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! Block-structure tracker for the LEF token stream
//!
//! LEF closes blocks in three different ways:
//!
//! - "identified" blocks repeat their keyword: `UNITS … END UNITS`
//! - "named" blocks repeat their name: `MACRO x … END x`
//! - "anonymous" blocks close bare: `OBS … END`
//!
//! Which style applies depends on which block is currently open, which a
//! context-free grammar cannot see. The tracker wraps a [`TokenSource`] with
//! an explicit stack of open blocks and a three-state machine so that every
//! `END` is checked against its opener and block names are lexed as plain
//! identifiers rather than keywords.

use super::error::{LefError, LefResult};
use super::token::{Token, TokenKind, TokenSource};

/// Block kinds that participate in `END` matching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Synthetic root; the whole file closes with `END LIBRARY`
    Library,
    Layer,
    Site,
    Via,
    ViaRule,
    Macro,
    Pin,
    Port,
    Obs,
    Units,
    PropertyDefinitions,
}

impl BlockKind {
    fn from_token(kind: TokenKind) -> Option<Self> {
        Some(match kind {
            TokenKind::Layer => Self::Layer,
            TokenKind::Site => Self::Site,
            TokenKind::Via => Self::Via,
            TokenKind::ViaRule => Self::ViaRule,
            TokenKind::Macro => Self::Macro,
            TokenKind::Pin => Self::Pin,
            TokenKind::Port => Self::Port,
            TokenKind::Obs => Self::Obs,
            TokenKind::Units => Self::Units,
            TokenKind::PropertyDefinitions => Self::PropertyDefinitions,
            _ => return None,
        })
    }

    /// Closes with its own name: `END <name>`
    fn is_named(self) -> bool {
        matches!(
            self,
            Self::Site | Self::Layer | Self::Via | Self::ViaRule | Self::Macro | Self::Pin
        )
    }

    /// Closes by repeating its keyword: `END UNITS`
    fn is_identified(self) -> bool {
        matches!(self, Self::Units | Self::PropertyDefinitions)
    }

    /// May open only directly under the library root
    fn is_top_level(self) -> bool {
        matches!(
            self,
            Self::Layer
                | Self::Site
                | Self::Macro
                | Self::Via
                | Self::ViaRule
                | Self::Units
                | Self::PropertyDefinitions
        )
    }

    /// May open only inside another block
    fn is_nested(self) -> bool {
        matches!(self, Self::Pin | Self::Port | Self::Obs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockState {
    Default,
    AwaitingName,
    AwaitingMatch,
}

/// Stateful wrapper that validates `END` terminators against their openers
pub struct BlockTracker<S> {
    source: S,
    file: String,
    stack: Vec<(BlockKind, Option<String>)>,
    state: BlockState,
    pending_kind: Option<BlockKind>,
    pending_match: Option<String>,
}

impl<S: TokenSource> BlockTracker<S> {
    pub fn new(source: S, file: &str) -> Self {
        Self {
            source,
            file: file.to_string(),
            stack: vec![(BlockKind::Library, Some("LIBRARY".to_string()))],
            state: BlockState::Default,
            pending_kind: None,
            pending_match: None,
        }
    }

    pub fn next_token(&mut self) -> LefResult<Option<Token>> {
        let Some(token) = self.source.next_token()? else {
            return Ok(None);
        };

        match self.state {
            BlockState::AwaitingName => {
                let kind = self.pending_kind.take().ok_or_else(|| {
                    LefError::internal("tracker awaiting a block name with no pending kind")
                })?;
                self.stack.push((kind, Some(token.text.clone())));
                self.state = BlockState::Default;
                return Ok(Some(token));
            }
            BlockState::AwaitingMatch => {
                let expected = self.pending_match.take().ok_or_else(|| {
                    LefError::internal("tracker awaiting a block match with no expected text")
                })?;
                if token.text != expected {
                    return Err(LefError::syntax(
                        &self.file,
                        token.line,
                        token.column,
                        format!("invalid end for block: expecting {expected}"),
                    ));
                }
                self.state = BlockState::Default;
                return Ok(Some(token));
            }
            BlockState::Default => {}
        }

        if token.kind == TokenKind::End {
            let Some((kind, matching)) = self.stack.pop() else {
                return Err(LefError::syntax(
                    &self.file,
                    token.line,
                    token.column,
                    "unmatched END",
                ));
            };
            if let Some(matching) = matching {
                if kind.is_named() {
                    self.source.push_name_mode();
                }
                self.pending_match = Some(matching);
                self.state = BlockState::AwaitingMatch;
            }
            return Ok(Some(token));
        }

        // Names after these keywords must never re-lex as keywords. A VIARULE
        // mentioned inside a VIA block is a reference, not a declaration.
        match token.kind {
            TokenKind::Foreign | TokenKind::Property => self.source.push_name_mode(),
            TokenKind::ViaRule => {
                if !matches!(self.stack.last(), Some((BlockKind::Via, _))) {
                    self.source.push_name_mode();
                }
            }
            kind if BlockKind::from_token(kind).is_some_and(BlockKind::is_named) => {
                self.source.push_name_mode();
            }
            _ => {}
        }

        if let Some(kind) = BlockKind::from_token(token.kind) {
            let opens = (self.stack.len() == 1 && kind.is_top_level())
                || (self.stack.len() >= 2 && kind.is_nested());
            if opens {
                if kind.is_named() {
                    self.pending_kind = Some(kind);
                    self.state = BlockState::AwaitingName;
                } else if kind.is_identified() {
                    self.stack.push((kind, Some(token.text.clone())));
                } else {
                    self.stack.push((kind, None));
                }
            }
        }

        Ok(Some(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Scripted token source; records name-mode pushes instead of lexing
    struct Scripted {
        tokens: VecDeque<Token>,
        name_mode_pushes: usize,
    }

    impl Scripted {
        fn new(script: &[(TokenKind, &str)]) -> Self {
            let tokens = script
                .iter()
                .enumerate()
                .map(|(i, (kind, text))| Token {
                    kind: *kind,
                    text: text.to_string(),
                    line: 1,
                    column: i as u32 + 1,
                })
                .collect();
            Self {
                tokens,
                name_mode_pushes: 0,
            }
        }
    }

    impl TokenSource for Scripted {
        fn next_token(&mut self) -> LefResult<Option<Token>> {
            Ok(self.tokens.pop_front())
        }

        fn push_name_mode(&mut self) {
            self.name_mode_pushes += 1;
        }
    }

    fn drain<S: TokenSource>(mut tracker: BlockTracker<S>) -> LefResult<Vec<Token>> {
        let mut out = Vec::new();
        while let Some(token) = tracker.next_token()? {
            out.push(token);
        }
        Ok(out)
    }

    #[test]
    fn test_named_block_match() {
        let source = Scripted::new(&[
            (TokenKind::Macro, "MACRO"),
            (TokenKind::Ident, "and2"),
            (TokenKind::End, "END"),
            (TokenKind::Ident, "and2"),
        ]);
        assert!(drain(BlockTracker::new(source, "<test>")).is_ok());
    }

    #[test]
    fn test_named_block_mismatch() {
        let source = Scripted::new(&[
            (TokenKind::Macro, "MACRO"),
            (TokenKind::Ident, "and2"),
            (TokenKind::End, "END"),
            (TokenKind::Ident, "or2"),
        ]);
        let err = drain(BlockTracker::new(source, "<test>")).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("expecting and2"), "bad error: {message}");
    }

    #[test]
    fn test_anonymous_block_closes_bare() {
        // OBS only nests, so open a macro first; its END carries no name.
        let source = Scripted::new(&[
            (TokenKind::Macro, "MACRO"),
            (TokenKind::Ident, "buf"),
            (TokenKind::Obs, "OBS"),
            (TokenKind::End, "END"),
            (TokenKind::End, "END"),
            (TokenKind::Ident, "buf"),
        ]);
        assert!(drain(BlockTracker::new(source, "<test>")).is_ok());
    }

    #[test]
    fn test_identified_block_repeats_keyword() {
        let source = Scripted::new(&[
            (TokenKind::Units, "UNITS"),
            (TokenKind::End, "END"),
            (TokenKind::Units, "UNITS"),
        ]);
        assert!(drain(BlockTracker::new(source, "<test>")).is_ok());
    }

    #[test]
    fn test_library_root_match() {
        let source = Scripted::new(&[
            (TokenKind::End, "END"),
            (TokenKind::Ident, "LIBRARY"),
        ]);
        assert!(drain(BlockTracker::new(source, "<test>")).is_ok());

        let source = Scripted::new(&[
            (TokenKind::End, "END"),
            (TokenKind::Ident, "NOTLIBRARY"),
        ]);
        assert!(drain(BlockTracker::new(source, "<test>")).is_err());
    }

    #[test]
    fn test_nested_blocks_only_open_inside_blocks() {
        // A stray PIN at top level must not open a block; the following END
        // then closes the library root.
        let source = Scripted::new(&[
            (TokenKind::Pin, "PIN"),
            (TokenKind::Ident, "a"),
            (TokenKind::End, "END"),
            (TokenKind::Ident, "LIBRARY"),
        ]);
        assert!(drain(BlockTracker::new(source, "<test>")).is_ok());
    }

    #[test]
    fn test_viarule_reference_inside_via() {
        let mut tracker = BlockTracker::new(
            Scripted::new(&[
                (TokenKind::Via, "VIA"),
                (TokenKind::Ident, "via1"),
                (TokenKind::ViaRule, "VIARULE"),
                (TokenKind::Ident, "gen1"),
                (TokenKind::Semi, ";"),
                (TokenKind::End, "END"),
                (TokenKind::Ident, "via1"),
            ]),
            "<test>",
        );
        let mut pushes_at_viarule = None;
        while let Some(token) = tracker.next_token().expect("tracking failed") {
            if token.kind == TokenKind::ViaRule {
                pushes_at_viarule = Some(tracker.source.name_mode_pushes);
            }
        }
        // VIA pushed name mode once; the VIARULE reference must not have.
        assert_eq!(pushes_at_viarule, Some(1));
    }

    #[test]
    fn test_unmatched_end() {
        let source = Scripted::new(&[
            (TokenKind::End, "END"),
            (TokenKind::Ident, "LIBRARY"),
            (TokenKind::End, "END"),
        ]);
        let err = drain(BlockTracker::new(source, "<test>")).unwrap_err();
        assert!(err.to_string().contains("unmatched END"));
    }
}
