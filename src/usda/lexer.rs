//! Tokenizer for USDA text documents.

use crate::util::{Error, Result};

/// Token kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum Tok {
    /// Identifier or keyword; may contain `:` and `.` after the first char.
    Ident(String),
    /// Quoted string (single, double or triple quoted).
    Str(String),
    /// Asset path `@...@`.
    Asset(String),
    /// Path reference `<...>`.
    PathRef(String),
    /// Numeric literal; the flag is true for integer literals.
    Number(f64, bool),
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Equals,
    Comma,
    Colon,
    Semicolon,
}

/// A token with its source position (1-based).
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub tok: Tok,
    pub line: usize,
    pub column: usize,
}

struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    line: usize,
    column: usize,
}

/// Tokenize a document body (the `#usda` header line already stripped).
pub fn tokenize(src: &str, first_line: usize) -> Result<Vec<Token>> {
    let mut lx = Lexer {
        src: src.as_bytes(),
        pos: 0,
        line: first_line,
        column: 1,
    };
    let mut out = Vec::new();
    while let Some(t) = lx.next_token()? {
        out.push(t);
    }
    Ok(out)
}

impl<'a> Lexer<'a> {
    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        if c == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::Parse {
            line: self.line,
            column: self.column,
            message: message.into(),
        }
    }

    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if c.is_ascii_whitespace() => {
                    self.bump();
                }
                (Some(b'#'), _) | (Some(b'/'), Some(b'/')) => {
                    while let Some(c) = self.peek() {
                        if c == b'\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                (Some(b'/'), Some(b'*')) => {
                    self.bump();
                    self.bump();
                    loop {
                        match (self.peek(), self.peek_at(1)) {
                            (Some(b'*'), Some(b'/')) => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            (Some(_), _) => {
                                self.bump();
                            }
                            (None, _) => return Err(self.error("unterminated block comment")),
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        self.skip_trivia()?;
        let (line, column) = (self.line, self.column);
        let Some(c) = self.peek() else { return Ok(None) };

        let tok = match c {
            b'(' => self.single(Tok::LParen),
            b')' => self.single(Tok::RParen),
            b'[' => self.single(Tok::LBracket),
            b']' => self.single(Tok::RBracket),
            b'{' => self.single(Tok::LBrace),
            b'}' => self.single(Tok::RBrace),
            b'=' => self.single(Tok::Equals),
            b',' => self.single(Tok::Comma),
            b':' => self.single(Tok::Colon),
            b';' => self.single(Tok::Semicolon),
            b'"' | b'\'' => Tok::Str(self.string(c)?),
            b'@' => Tok::Asset(self.delimited(b'@', b'@', "asset path")?),
            b'<' => Tok::PathRef(self.delimited(b'<', b'>', "path reference")?),
            b'-' | b'+' | b'.' | b'0'..=b'9' => self.number()?,
            c if c.is_ascii_alphabetic() || c == b'_' => self.ident_or_special(),
            other => return Err(self.error(format!("unexpected character {:?}", other as char))),
        };
        Ok(Some(Token { tok, line, column }))
    }

    fn single(&mut self, tok: Tok) -> Tok {
        self.bump();
        tok
    }

    fn delimited(&mut self, open: u8, close: u8, what: &str) -> Result<String> {
        debug_assert_eq!(self.peek(), Some(open));
        self.bump();
        let start = self.pos;
        loop {
            match self.peek() {
                Some(c) if c == close => break,
                Some(b'\n') | None => return Err(self.error(format!("unterminated {what}"))),
                Some(_) => {
                    self.bump();
                }
            }
        }
        let text = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
        self.bump();
        Ok(text)
    }

    fn string(&mut self, quote: u8) -> Result<String> {
        let triple = self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote);
        let n = if triple { 3 } else { 1 };
        for _ in 0..n {
            self.bump();
        }
        let mut bytes = Vec::new();
        loop {
            let Some(c) = self.peek() else {
                return Err(self.error("unterminated string"));
            };
            if c == quote
                && (!triple || (self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote)))
            {
                for _ in 0..n {
                    self.bump();
                }
                break;
            }
            if c == b'\n' && !triple {
                return Err(self.error("newline in string"));
            }
            self.bump();
            if c == b'\\' {
                let esc = self.bump().ok_or_else(|| self.error("unterminated escape"))?;
                bytes.push(match esc {
                    b'n' => b'\n',
                    b't' => b'\t',
                    b'r' => b'\r',
                    other => other,
                });
            } else {
                bytes.push(c);
            }
        }
        String::from_utf8(bytes).map_err(|_| self.error("invalid UTF-8 in string"))
    }

    fn ident_or_special(&mut self) -> Tok {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == b'_' || c == b':' || c == b'.' {
                self.bump();
            } else {
                break;
            }
        }
        let text = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
        match text.as_str() {
            "inf" => Tok::Number(f64::INFINITY, false),
            "nan" | "NaN" => Tok::Number(f64::NAN, false),
            _ => Tok::Ident(text),
        }
    }

    fn number(&mut self) -> Result<Tok> {
        let start = self.pos;
        let negative = match self.peek() {
            Some(b'-') => {
                self.bump();
                true
            }
            Some(b'+') => {
                self.bump();
                false
            }
            _ => false,
        };
        if matches!(self.peek(), Some(b'i' | b'n' | b'N')) {
            return match self.ident_or_special() {
                Tok::Number(x, _) if x.is_infinite() && negative => Ok(Tok::Number(f64::NEG_INFINITY, false)),
                Tok::Number(x, _) => Ok(Tok::Number(x, false)),
                _ => Err(self.error("malformed number")),
            };
        }
        let mut integer = true;
        while let Some(c) = self.peek() {
            match c {
                b'0'..=b'9' => {}
                b'.' => integer = false,
                b'e' | b'E' => {
                    integer = false;
                    if matches!(self.peek_at(1), Some(b'-' | b'+')) {
                        self.bump();
                    }
                }
                _ => break,
            }
            self.bump();
        }
        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap_or("");
        text.parse::<f64>()
            .map(|x| Tok::Number(x, integer))
            .map_err(|_| self.error(format!("malformed number {text:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(src: &str) -> Vec<Tok> {
        tokenize(src, 1).unwrap().into_iter().map(|t| t.tok).collect()
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(
            toks(r#"def Mesh "box" { int[] faceVertexCounts = [4, 4] }"#),
            vec![
                Tok::Ident("def".into()),
                Tok::Ident("Mesh".into()),
                Tok::Str("box".into()),
                Tok::LBrace,
                Tok::Ident("int".into()),
                Tok::LBracket,
                Tok::RBracket,
                Tok::Ident("faceVertexCounts".into()),
                Tok::Equals,
                Tok::LBracket,
                Tok::Number(4.0, true),
                Tok::Comma,
                Tok::Number(4.0, true),
                Tok::RBracket,
                Tok::RBrace,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let t = toks("-1.5 2e-3 +7 -inf nan 1.2E+5");
        assert_eq!(t[0], Tok::Number(-1.5, false));
        assert_eq!(t[1], Tok::Number(0.002, false));
        assert_eq!(t[2], Tok::Number(7.0, true));
        assert_eq!(t[3], Tok::Number(f64::NEG_INFINITY, false));
        assert!(matches!(t[4], Tok::Number(x, false) if x.is_nan()));
        assert_eq!(t[5], Tok::Number(120000.0, false));
    }

    #[test]
    fn test_strings_paths_comments() {
        assert_eq!(
            toks("# comment\n\"a\\\"b\" '''multi\nline''' </a/b> @./x.usda@ // tail\nxformOp:translate.timeSamples"),
            vec![
                Tok::Str("a\"b".into()),
                Tok::Str("multi\nline".into()),
                Tok::PathRef("/a/b".into()),
                Tok::Asset("./x.usda".into()),
                Tok::Ident("xformOp:translate.timeSamples".into()),
            ]
        );
    }

    #[test]
    fn test_positions_and_errors() {
        let t = tokenize("a\n  b", 3).unwrap();
        assert_eq!((t[1].line, t[1].column), (4, 3));

        let err = tokenize("\"open", 1).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
        assert!(tokenize("$", 1).is_err());
        assert!(tokenize("/* never closed", 1).is_err());
    }
}
