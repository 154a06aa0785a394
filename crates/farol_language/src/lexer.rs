//! Two-stage lexer for farol source text.
//!
//! ## Stage 1: word scanner
//!
//! farol tokens are whitespace-delimited: a token is a maximal run of
//! non-whitespace characters, except that `(` `)` `{` `}` `;` `λ` `\` and
//! `.` always lex alone. This is what makes mixfix operator parts ordinary
//! tokens: in `a <> b` the part `<>` is just a word, and in
//! `_<>_ : a → a → a` the full operator name `_<>_` is a single word.
//!
//! Words are then classified: keywords, `=`, `:`, `_`, numbers, and
//! everything else an interned identifier. `--` starts a comment running to
//! the end of the line.
//!
//! ## Stage 2: layout resolver
//!
//! The parser consumes declaration lists as explicit
//! `BEGIN (DELIM item)* END` envelopes. The resolver produces them from
//! either source form:
//!
//! - **Explicit blocks**: `{` → `BEGIN`, `;` → `DELIM`, `}` → `END`.
//! - **Indentation blocks**: a block opens at the start of the file and
//!   after `where`. The column of the first token becomes the block column;
//!   every later line starting at exactly that column emits `DELIM`, and a
//!   line starting left of it closes the block, cascading outward.
//!
//! A stack of open blocks tracks the enclosure state. Tokens inside
//! parentheses never close blocks, so expressions may span lines. A `where`
//! whose next token does not sit right of the enclosing block column opens
//! an empty block.

use farol_base::{Interner, Span};

use crate::error::{ParseError, ParseErrorKind};
use crate::token::{Token, TokenKind};

/// Raw tokens before layout resolution. Braces and semicolons exist only at
/// this stage; the resolver turns them into block envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RawKind {
    LBrace,
    RBrace,
    Semi,
    Plain(TokenKind),
}

#[derive(Debug, Clone, Copy)]
struct RawToken {
    kind: RawKind,
    span: Span,
    line: usize,
    col: usize,
}

/// An open block being tracked by the layout resolver.
#[derive(Debug, Clone, Copy)]
enum Block {
    /// Indentation block with its item column.
    Layout(usize),
    /// Explicit `{ ... }` block.
    Explicit,
}

/// The farol lexer. Create one per source text and call [`Lexer::tokenize`].
pub struct Lexer<'s, 'i> {
    source: &'s str,
    interner: &'i mut Interner,
}

impl<'s, 'i> Lexer<'s, 'i> {
    pub fn new(source: &'s str, interner: &'i mut Interner) -> Self {
        Self { source, interner }
    }

    /// Lexes the whole source into a layout-resolved token stream ending in
    /// [`TokenKind::Eof`].
    pub fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let raw = self.scan()?;
        resolve_layout(&raw, self.source.len())
    }

    /// Stage 1: split the source into classified words with line/column info.
    fn scan(&mut self) -> Result<Vec<RawToken>, ParseError> {
        let source = self.source;
        let chars: Vec<(usize, char)> = source.char_indices().collect();
        let n = chars.len();
        let mut raw = Vec::new();
        let mut i = 0;
        let mut line = 1;
        let mut col = 1;

        while i < n {
            let (off, c) = chars[i];
            if c == '\n' {
                i += 1;
                line += 1;
                col = 1;
                continue;
            }
            if c.is_whitespace() {
                i += 1;
                col += 1;
                continue;
            }
            // Comment from `--` at token position to end of line.
            if c == '-' && i + 1 < n && chars[i + 1].1 == '-' {
                while i < n && chars[i].1 != '\n' {
                    i += 1;
                }
                continue;
            }
            if let Some(kind) = delimiter_kind(c) {
                raw.push(RawToken {
                    kind,
                    span: Span::new(off, off + c.len_utf8()),
                    line,
                    col,
                });
                i += 1;
                col += 1;
                continue;
            }
            // A word: maximal run of non-breaking characters.
            let start = i;
            let mut j = i;
            while j < n && !is_word_break(chars[j].1) {
                j += 1;
            }
            let end_off = if j < n { chars[j].0 } else { source.len() };
            let span = Span::new(off, end_off);
            let word = &source[off..end_off];
            let kind = self.classify(word, span)?;
            raw.push(RawToken {
                kind: RawKind::Plain(kind),
                span,
                line,
                col,
            });
            col += j - start;
            i = j;
        }
        Ok(raw)
    }

    fn classify(&mut self, word: &str, span: Span) -> Result<TokenKind, ParseError> {
        let kind = match word {
            "data" => TokenKind::Data,
            "where" => TokenKind::Where,
            "infix" => TokenKind::Infix,
            "infixl" => TokenKind::Infixl,
            "infixr" => TokenKind::Infixr,
            "fresh" => TokenKind::Fresh,
            "=" => TokenKind::Eq,
            ":" => TokenKind::Colon,
            "_" => TokenKind::Underscore,
            _ if word.chars().all(|c| c.is_ascii_digit()) => {
                let value = word.parse::<i64>().map_err(|_| {
                    ParseError::new(
                        ParseErrorKind::InvalidInteger {
                            word: word.to_string(),
                        },
                        span,
                    )
                })?;
                TokenKind::Num(value)
            }
            _ => TokenKind::Ident(self.interner.intern(word)),
        };
        Ok(kind)
    }
}

fn delimiter_kind(c: char) -> Option<RawKind> {
    match c {
        '(' => Some(RawKind::Plain(TokenKind::LParen)),
        ')' => Some(RawKind::Plain(TokenKind::RParen)),
        '{' => Some(RawKind::LBrace),
        '}' => Some(RawKind::RBrace),
        ';' => Some(RawKind::Semi),
        'λ' | '\\' => Some(RawKind::Plain(TokenKind::Lambda)),
        '.' => Some(RawKind::Plain(TokenKind::Dot)),
        _ => None,
    }
}

fn is_word_break(c: char) -> bool {
    c.is_whitespace() || delimiter_kind(c).is_some()
}

/// Stage 2: wrap declaration lists in `BEGIN`/`DELIM`/`END` envelopes.
fn resolve_layout(raw: &[RawToken], source_len: usize) -> Result<Vec<Token>, ParseError> {
    let eof_span = Span::new(source_len, source_len);
    let mut out = Vec::with_capacity(raw.len() + 8);
    let mut stack: Vec<Block> = Vec::new();
    let mut paren = 0usize;
    let mut i = 0usize;
    let mut last_line = 0usize;

    open_block(&mut out, &mut stack, raw, &mut i, &mut last_line, eof_span);

    while i < raw.len() {
        let t = raw[i];
        if paren == 0 && t.line > last_line {
            // A fresh line: close blocks the token sits left of, separate
            // items of the block it aligns with.
            while matches!(stack.last(), Some(Block::Layout(c)) if t.col < *c) {
                out.push(Token::new(TokenKind::End, t.span));
                stack.pop();
            }
            if matches!(stack.last(), Some(Block::Layout(c)) if t.col == *c) {
                out.push(Token::new(TokenKind::Delim, t.span));
            }
        }
        last_line = t.line;
        match t.kind {
            RawKind::LBrace => {
                return Err(ParseError::new(ParseErrorKind::MisplacedBrace, t.span));
            }
            RawKind::RBrace => {
                if matches!(stack.last(), Some(Block::Explicit)) {
                    out.push(Token::new(TokenKind::End, t.span));
                    stack.pop();
                    i += 1;
                } else {
                    return Err(ParseError::new(ParseErrorKind::UnmatchedBrace, t.span));
                }
            }
            RawKind::Semi => {
                out.push(Token::new(TokenKind::Delim, t.span));
                i += 1;
            }
            RawKind::Plain(kind) => {
                match kind {
                    TokenKind::LParen => paren += 1,
                    TokenKind::RParen => paren = paren.saturating_sub(1),
                    _ => {}
                }
                out.push(Token::new(kind, t.span));
                i += 1;
                if kind == TokenKind::Where {
                    open_block(&mut out, &mut stack, raw, &mut i, &mut last_line, eof_span);
                }
            }
        }
    }

    while let Some(block) = stack.pop() {
        match block {
            Block::Layout(_) => out.push(Token::new(TokenKind::End, eof_span)),
            Block::Explicit => {
                return Err(ParseError::new(ParseErrorKind::UnclosedBrace, eof_span));
            }
        }
    }
    out.push(Token::new(TokenKind::Eof, eof_span));
    Ok(out)
}

/// Opens a block at `raw[*i]`: explicit if the next token is `{`, an
/// indentation block anchored at its column otherwise. A block whose first
/// token does not sit right of the enclosing block column is empty.
fn open_block(
    out: &mut Vec<Token>,
    stack: &mut Vec<Block>,
    raw: &[RawToken],
    i: &mut usize,
    last_line: &mut usize,
    eof_span: Span,
) {
    let Some(t) = raw.get(*i).copied() else {
        out.push(Token::new(TokenKind::Begin, eof_span));
        out.push(Token::new(TokenKind::End, eof_span));
        return;
    };
    if t.kind == RawKind::LBrace {
        out.push(Token::new(TokenKind::Begin, t.span));
        stack.push(Block::Explicit);
        *i += 1;
        if let Some(next) = raw.get(*i) {
            if !matches!(next.kind, RawKind::RBrace | RawKind::Semi) {
                out.push(Token::new(TokenKind::Delim, next.span));
            }
            *last_line = next.line;
        }
        return;
    }
    let enclosing = stack.iter().rev().find_map(|b| match b {
        Block::Layout(c) => Some(*c),
        Block::Explicit => None,
    });
    if let Some(c) = enclosing {
        if t.col <= c {
            out.push(Token::new(TokenKind::Begin, t.span));
            out.push(Token::new(TokenKind::End, t.span));
            return;
        }
    }
    out.push(Token::new(TokenKind::Begin, t.span));
    stack.push(Block::Layout(t.col));
    out.push(Token::new(TokenKind::Delim, t.span));
    *last_line = t.line;
}
