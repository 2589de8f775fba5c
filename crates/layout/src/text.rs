//! Text spans, measurement and splitting into flowable pieces.

use crate::cache::GlyphCache;
use crate::justify::BreakOrder;
use crate::perf::Profiler;
use folio_style::{FontModel, TextWrap};
use folio_traits::{FontMetrics, ProviderError};
use std::ops::Range;
use std::sync::Arc;

/// A run of text sharing one source string.
///
/// Splitting a span into pieces does not copy the text: every piece points
/// at a byte range of the same source.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    source: Arc<str>,
    range: Range<usize>,
    /// Index of the first character of this span within the source.
    char_start: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceKind {
    Word,
    Space,
    Newline,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextPiece {
    pub span: TextSpan,
    pub kind: PieceKind,
    /// The break opportunity after this piece.
    pub order: Option<BreakOrder>,
}

impl TextSpan {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        let source: Arc<str> = text.into();
        let len = source.len();
        Self {
            source,
            range: 0..len,
            char_start: 0,
        }
    }

    /// A sub-span; `range` is in bytes relative to this span.
    pub fn slice(&self, range: Range<usize>) -> TextSpan {
        let text = self.as_str();
        let skipped = text[..range.start].chars().count();
        TextSpan {
            source: Arc::clone(&self.source),
            range: (self.range.start + range.start)..(self.range.start + range.end),
            char_start: self.char_start + skipped,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source[self.range.clone()]
    }

    pub fn source(&self) -> &Arc<str> {
        &self.source
    }

    pub fn char_start(&self) -> usize {
        self.char_start
    }

    pub fn char_count(&self) -> usize {
        self.as_str().chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// True for spans made only of whitespace (spaces and newlines).
    pub fn is_whitespace(&self) -> bool {
        !self.is_empty() && self.as_str().chars().all(char::is_whitespace)
    }

    pub fn width(
        &self,
        font: &FontModel,
        metrics: &dyn FontMetrics,
        glyphs: &mut GlyphCache,
        profiler: &dyn Profiler,
    ) -> Result<f32, ProviderError> {
        self.as_str()
            .chars()
            .try_fold(0.0, |w, ch| Ok(w + glyphs.advance(metrics, font, ch, profiler)?))
    }

    /// Per-character positions: (index in source, character, x, advance).
    pub fn glyphs(
        &self,
        font: &FontModel,
        metrics: &dyn FontMetrics,
        glyphs: &mut GlyphCache,
        profiler: &dyn Profiler,
    ) -> Result<Vec<(usize, char, f32, f32)>, ProviderError> {
        let mut x = 0.0;
        let mut out = Vec::with_capacity(self.range.len());
        for (i, ch) in self.as_str().chars().enumerate() {
            let adv = glyphs.advance(metrics, font, ch, profiler)?;
            out.push((self.char_start + i, ch, x, adv));
            x += adv;
        }
        Ok(out)
    }

    /// Splits the span into words, spaces and newlines.
    ///
    /// Spaces offer a word break, or a sentence break after a word ending in
    /// terminal punctuation; each newline is a line break of its own. In
    /// character wrapping mode every character of a word but the last also
    /// offers a character break.
    pub fn pieces(&self, wrap: TextWrap) -> Vec<TextPiece> {
        let text = self.as_str();
        let mut pieces = Vec::new();
        let mut start = 0;
        let mut current: Option<PieceKind> = None;

        let classify = |ch: char| match ch {
            '\n' => PieceKind::Newline,
            c if c.is_whitespace() => PieceKind::Space,
            _ => PieceKind::Word,
        };

        for (i, ch) in text.char_indices() {
            let kind = classify(ch);
            match current {
                Some(k) if k == kind && kind != PieceKind::Newline => {}
                Some(k) => {
                    self.push_piece(&mut pieces, start..i, k, wrap);
                    start = i;
                    current = Some(kind);
                }
                None => current = Some(kind),
            }
        }
        if let Some(k) = current {
            self.push_piece(&mut pieces, start..text.len(), k, wrap);
        }
        pieces
    }

    fn push_piece(&self, pieces: &mut Vec<TextPiece>, range: Range<usize>, kind: PieceKind, wrap: TextWrap) {
        match kind {
            PieceKind::Newline => pieces.push(TextPiece {
                span: self.slice(range),
                kind,
                order: Some(BreakOrder::Line),
            }),
            PieceKind::Space => {
                let after_sentence = pieces
                    .last()
                    .filter(|p| p.kind == PieceKind::Word)
                    .is_some_and(|p| p.span.as_str().ends_with(['.', '!', '?']));
                pieces.push(TextPiece {
                    span: self.slice(range),
                    kind,
                    order: Some(if after_sentence {
                        BreakOrder::Sentence
                    } else {
                        BreakOrder::Word
                    }),
                });
            }
            PieceKind::Word => match wrap {
                TextWrap::Word => pieces.push(TextPiece {
                    span: self.slice(range),
                    kind,
                    order: None,
                }),
                TextWrap::Character => {
                    let word = &self.as_str()[range.clone()];
                    let count = word.chars().count();
                    for (n, (i, ch)) in word.char_indices().enumerate() {
                        let at = range.start + i;
                        pieces.push(TextPiece {
                            span: self.slice(at..at + ch.len_utf8()),
                            kind,
                            order: (n + 1 < count).then_some(BreakOrder::Character),
                        });
                    }
                }
            },
        }
    }
}
