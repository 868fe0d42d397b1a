// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! Entry points for reading LEF sources into the document model

use std::fs;
use std::path::Path;

use log::{debug, info};

use super::builder::LefBuilder;
use super::error::{LefError, LefResult};
use super::syntax::{walk, SyntaxTreeBuilder};
use super::token::Lexer;
use super::tracker::BlockTracker;
use super::Lef;

/// Reads LEF files into a [`Lef`] library model
pub struct LefReader;

impl LefReader {
    pub fn new() -> Self {
        Self
    }

    /// Parse a single file into a fresh library
    pub fn read<P: AsRef<Path>>(&self, path: P) -> LefResult<Lef> {
        self.read_into(path, Lef::default())
    }

    /// Parse a single file, merging into an existing library
    pub fn read_into<P: AsRef<Path>>(&self, path: P, lef: Lef) -> LefResult<Lef> {
        let name = path.as_ref().display().to_string();
        debug!("loading LEF file: {name}");
        let content = fs::read_to_string(&path).map_err(|source| LefError::Io {
            file: name.clone(),
            source,
        })?;
        self.read_str(&content, &name, lef)
    }

    /// Parse in-memory LEF text, merging into an existing library
    ///
    /// `name` identifies the source in error messages.
    pub fn read_str(&self, text: &str, name: &str, lef: Lef) -> LefResult<Lef> {
        let lexer = Lexer::new(text, name);
        let tracker = BlockTracker::new(lexer, name);
        let tree = SyntaxTreeBuilder::new(tracker, name).parse()?;
        let mut builder = LefBuilder::new(name, lef)?;
        walk(&mut builder, &tree)?;
        let lef = builder.finish();
        info!(
            "parsed {name}: {} layers, {} macros",
            lef.layers.len(),
            lef.macros.len()
        );
        Ok(lef)
    }

    /// Parse an ordered list of files, merging sequentially into one library
    ///
    /// An empty list is an error, not an empty library.
    pub fn read_files<P: AsRef<Path>>(&self, paths: &[P]) -> LefResult<Lef> {
        if paths.is_empty() {
            return Err(LefError::NoInput);
        }
        let mut lef = Lef::default();
        for path in paths {
            lef = self.read_into(path, lef)?;
        }
        Ok(lef)
    }
}

impl Default for LefReader {
    fn default() -> Self {
        Self::new()
    }
}
