use logos::{FilterResult, Lexer, Logos};
use serde::Serialize;

use crate::error::LexError;

/// Token categories. Only the coarse class is kept; the matched text lives on [`Token`].
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
pub enum TokenKind {
    #[token("int")]
    #[token("float")]
    #[token("char")]
    #[token("double")]
    #[token("void")]
    #[token("if")]
    #[token("else")]
    #[token("for")]
    #[token("while")]
    #[token("do")]
    #[token("return")]
    #[token("break")]
    #[token("continue")]
    #[token("struct")]
    #[token("printf")]
    Keyword,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", priority = 1)]
    Identifier,

    #[regex(r"[0-9]+")]
    #[regex(r"[0-9]+\.[0-9]+")]
    Number,

    #[token("+")]
    #[token("-")]
    #[token("*")]
    #[token("/")]
    #[token("%")]
    #[token("=")]
    #[token("==")]
    #[token("!=")]
    #[token("<")]
    #[token("<=")]
    #[token(">")]
    #[token(">=")]
    #[token("&&")]
    #[token("||")]
    #[token("!")]
    #[token("&")]
    #[token("|")]
    #[token("^")]
    #[token("~")]
    #[token("++")]
    #[token("--")]
    #[token("+=")]
    #[token("-=")]
    #[token("*=")]
    #[token("/=")]
    #[token("->")]
    #[token(".")]
    #[token("?")]
    #[token(":")]
    Operator,

    #[token("(")]
    #[token(")")]
    #[token("{")]
    #[token("}")]
    #[token("[")]
    #[token("]")]
    #[token(",")]
    #[token(";")]
    Separator,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    String,

    #[regex(r"'([^'\\\n]|\\.)'")]
    Char,

    /// Preprocessor line, kept whole.
    #[regex(r"#[^\n]*")]
    Directive,

    /// `/* ... */`, consumed by [`block_comment`] and never emitted.
    #[token("/*", block_comment)]
    BlockComment,
}

/// Skip to the closing `*/`; an unterminated comment is a lex error.
fn block_comment(lex: &mut Lexer<TokenKind>) -> FilterResult<(), ()> {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            FilterResult::Skip
        }
        None => FilterResult::Error(()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub line: usize,
}

/// Tokenize `source`, stopping at the first character no token class accepts.
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut line = 1usize;
    let mut line_start = 0usize;
    let mut cursor = 0usize;

    let mut lexer = TokenKind::lexer(source);

    while let Some(result) = lexer.next() {
        let span = lexer.span();

        // Skipped text (whitespace and comments) may span lines
        for (offset, ch) in source[cursor..span.start].char_indices() {
            if ch == '\n' {
                line += 1;
                line_start = cursor + offset + 1;
            }
        }
        cursor = span.start;

        match result {
            Ok(kind) => tokens.push(Token {
                kind,
                value: lexer.slice().to_string(),
                line,
            }),
            Err(()) => {
                let col = source[line_start..span.start].chars().count() + 1;
                return Err(LexError::UnexpectedToken {
                    line,
                    col,
                    token: lexer.slice().to_string(),
                });
            }
        }
    }

    Ok(tokens)
}
