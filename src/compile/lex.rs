use std::sync::Arc;

use crate::types::span::Span;
use crate::{Error, Result};

/// A scanner that tokenizes the template source so that the parser doesn't
/// have to operate on raw text.
///
/// The scanner has two modes. In plain mode everything is literal text until
/// a directive opener `<%`, an inline reference `$Name` or a brace reference
/// `{$Name}`. In directive mode whitespace is skipped and identifiers,
/// numbers, strings and operators are recognized until the directive closer
/// `%>` switches back to plain mode.
///
/// Tokens can be pushed back with [`.put_back()`][Scanner::put_back]. Doing so
/// restores the cursor and the mode that were active before the token was
/// scanned, and the token itself is buffered so that it is replayed exactly
/// rather than re-lexed.
pub struct Scanner<'source> {
    /// The name of the template, used in errors.
    pub file: Arc<str>,

    /// The original template source.
    pub source: &'source str,

    /// A cursor over the template source.
    cursor: usize,

    /// The current mode of the scanner.
    mode: Mode,

    /// Tokens that have been put back, together with the cursor and mode to
    /// restore when they are scanned again. The last one is replayed first.
    putback: Vec<(Token, usize, Mode)>,
}

/// The lexical mode of the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Within raw template text.
    Plain,
    /// Between `<%` and `%>`, or within an inline reference.
    Directive,
}

/// The unit yielded by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// The meaningful text of the token.
    pub span: Span,
    /// Everything consumed to produce the token, including skipped whitespace
    /// and comments.
    consumed: Span,
    /// The mode the scanner was in before scanning the token.
    mode: Mode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Raw template text, possibly empty.
    Literal,
    /// Begin directive, i.e. `<%`.
    Open,
    /// End directive, i.e. `%>`.
    Close,
    /// An identifier, e.g. `Title` or `end_if`.
    Ident,
    /// An integer or float literal, e.g. `19` or `0.5`.
    Number,
    /// A quoted string literal, e.g. `"style.css"`.
    String,
    /// An operator or punctuation, e.g. `$`, `{`, `==` or `(`.
    Symbol,
    /// The end of the template source. Scanning past it yields it again.
    EndSource,
}

impl<'source> Scanner<'source> {
    /// Construct a new scanner.
    pub fn new(file: Arc<str>, source: &'source str) -> Self {
        Self {
            file,
            source,
            cursor: 0,
            mode: Mode::Plain,
            putback: Vec::new(),
        }
    }

    /// Returns the next token.
    pub fn scan(&mut self) -> Result<Token> {
        if let Some((tk, cursor, mode)) = self.putback.pop() {
            self.cursor = cursor;
            self.mode = mode;
            return Ok(tk);
        }

        let start = self.cursor;
        let mode = self.mode;
        let (kind, span) = match self.mode {
            Mode::Plain => self.scan_plain()?,
            Mode::Directive => self.scan_directive()?,
        };
        Ok(Token {
            kind,
            span,
            consumed: Span::from(start..self.cursor),
            mode,
        })
    }

    /// Returns the next token without consuming it.
    pub fn peek(&mut self) -> Result<Token> {
        let tk = self.scan()?;
        self.put_back(tk.clone());
        Ok(tk)
    }

    /// Pushes a token back onto the stream, restoring the source it consumed
    /// and the mode that was active before it was scanned.
    pub fn put_back(&mut self, tk: Token) {
        let cursor = self.cursor;
        let mode = self.mode;
        self.cursor = tk.consumed.m;
        self.mode = tk.mode;
        self.putback.push((tk, cursor, mode));
    }

    /// Switches the scanner mode. Only valid when nothing is buffered.
    pub fn set_mode(&mut self, mode: Mode) {
        debug_assert!(self.putback.is_empty());
        self.mode = mode;
    }

    /// Returns `true` if the unscanned source starts exactly with `c`, no
    /// whitespace skipped.
    pub fn is_next_char(&self, c: char) -> bool {
        self.putback.is_empty() && self.source[self.cursor..].starts_with(c)
    }

    /// Returns `true` if the unscanned source is a `.` directly followed by an
    /// identifier, e.g. `.Title` but not `. ` or `.5`.
    pub fn is_next_chain(&self) -> bool {
        let mut chars = self.source[self.cursor..].chars();
        self.putback.is_empty()
            && chars.next() == Some('.')
            && chars.next().map(is_ident_start).unwrap_or(false)
    }

    /// Returns the text of a token.
    pub fn text(&self, tk: &Token) -> &'source str {
        &self.source[tk.span]
    }

    fn scan_plain(&mut self) -> Result<(TokenKind, Span)> {
        loop {
            let i = self.cursor;
            let rest = &self.source[i..];

            if rest.is_empty() {
                return Ok((TokenKind::EndSource, Span::from(i..i)));
            }

            if rest.starts_with("<%--") {
                self.skip_comment(i)?;
                continue;
            }

            if rest.starts_with("<%") {
                self.cursor = i + 2;
                self.mode = Mode::Directive;
                return Ok((TokenKind::Open, Span::from(i..i + 2)));
            }

            if is_reference_start(rest) {
                self.cursor = i + 1;
                self.mode = Mode::Directive;
                return Ok((TokenKind::Symbol, Span::from(i..i + 1)));
            }

            if rest.starts_with('{') && is_reference_start(&rest[1..]) {
                self.cursor = i + 1;
                return Ok((TokenKind::Symbol, Span::from(i..i + 1)));
            }

            return Ok(self.scan_literal(i));
        }
    }

    fn scan_literal(&mut self, i: usize) -> (TokenKind, Span) {
        // Consume text up to the next trigger. A `$$` is consumed as a pair
        // so that the second `$` can't start a reference.
        //
        // xxxx$$xxxx<%xxx
        // ^         ^
        // i         j
        let bytes = self.source.as_bytes();
        let mut j = i;
        while j < bytes.len() {
            let rest = &self.source[j..];
            if rest.starts_with("<%") || is_reference_start(rest) {
                break;
            }
            if rest.starts_with('{') && is_reference_start(&rest[1..]) {
                break;
            }
            if rest.starts_with("$$") {
                j += 2;
                continue;
            }
            j += rest.chars().next().map(char::len_utf8).unwrap_or(1);
        }
        self.cursor = j;
        (TokenKind::Literal, Span::from(i..j))
    }

    fn skip_comment(&mut self, i: usize) -> Result<()> {
        match self.source[i + 4..].find("--%>") {
            Some(d) => {
                self.cursor = i + 4 + d + 4;
                Ok(())
            }
            None => Err(Error::scan(
                "unterminated comment",
                &self.file,
                self.source,
                i..i + 4,
            )),
        }
    }

    fn scan_directive(&mut self) -> Result<(TokenKind, Span)> {
        let rest = &self.source[self.cursor..];
        let i = self.cursor + (rest.len() - rest.trim_start().len());
        self.cursor = i;

        // We iterate over chars because that is nicer than operating on raw
        // bytes. The map call here fixes the index to be relative to the
        // actual template source.
        let mut iter = self.source[i..].char_indices().map(|(d, c)| (i + d, c));

        let c = match iter.next() {
            Some((_, c)) => c,
            None => return Ok((TokenKind::EndSource, Span::from(i..i))),
        };

        let (kind, j) = match c {
            '%' if self.source[i..].starts_with("%>") => {
                self.mode = Mode::Plain;
                (TokenKind::Close, i + 2)
            }
            '"' | '\'' => self.scan_string(iter, i, c)?,
            c if c.is_ascii_digit() => self.scan_number(iter),
            c if is_ident_start(c) => (TokenKind::Ident, self.scan_while(iter, is_ident)),
            _ => {
                let two = self.source.get(i..i + 2);
                match two {
                    Some("==" | "!=" | ">=" | "<=" | "&&" | "||") => (TokenKind::Symbol, i + 2),
                    _ => (TokenKind::Symbol, i + c.len_utf8()),
                }
            }
        };

        self.cursor = j;
        Ok((kind, Span::from(i..j)))
    }

    fn scan_string<I>(&mut self, mut iter: I, i: usize, quote: char) -> Result<(TokenKind, usize)>
    where
        I: Iterator<Item = (usize, char)>,
    {
        let mut escaped = false;
        loop {
            match iter.next() {
                None => {
                    return Err(self.err_unterminated_string(i..self.source.len()));
                }
                Some((j, '\r' | '\n')) => {
                    return Err(self.err_unterminated_string(i..j));
                }
                Some((j, c)) if c == quote && !escaped => {
                    return Ok((TokenKind::String, j + 1));
                }
                Some((_, c)) => {
                    escaped = c == '\\' && !escaped;
                }
            }
        }
    }

    fn scan_number<I>(&mut self, iter: I) -> (TokenKind, usize)
    where
        I: Iterator<Item = (usize, char)> + Clone,
    {
        let j = self.scan_while(iter, |c| c.is_ascii_digit());
        let mut frac = self.source[j..].chars();
        if frac.next() == Some('.') && frac.next().map(|c| c.is_ascii_digit()).unwrap_or(false) {
            let iter = self.source[j + 1..]
                .char_indices()
                .map(|(d, c)| (j + 1 + d, c));
            return (TokenKind::Number, self.scan_while(iter, |c| c.is_ascii_digit()));
        }
        (TokenKind::Number, j)
    }

    fn scan_while<I, P>(&self, mut iter: I, pred: P) -> usize
    where
        I: Iterator<Item = (usize, char)> + Clone,
        P: Fn(char) -> bool,
    {
        loop {
            match iter.clone().next() {
                Some((_, c)) if pred(c) => {
                    iter.next();
                }
                Some((j, _)) => return j,
                None => return self.source.len(),
            }
        }
    }

    fn err_unterminated_string(&self, span: impl Into<Span>) -> Error {
        Error::scan("unterminated string", &self.file, self.source, span)
    }
}

impl Token {
    /// Returns `true` if this token is the given symbol.
    pub fn is_symbol(&self, source: &str, sym: &str) -> bool {
        self.kind == TokenKind::Symbol && &source[self.span] == sym
    }

    /// Returns `true` if this token is the given identifier.
    pub fn is_ident(&self, source: &str, ident: &str) -> bool {
        self.kind == TokenKind::Ident && &source[self.span] == ident
    }
}

impl TokenKind {
    pub fn human(&self) -> &'static str {
        match self {
            Self::Literal => "literal",
            Self::Open => "begin directive",
            Self::Close => "end directive",
            Self::Ident => "identifier",
            Self::Number => "number",
            Self::String => "string",
            Self::Symbol => "symbol",
            Self::EndSource => "end of source",
        }
    }
}

/// Returns `true` if the text starts a `$Name` reference.
fn is_reference_start(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next() == Some('$') && chars.next().map(is_ident_start).unwrap_or(false)
}

#[cfg(feature = "unicode")]
fn is_ident_start(c: char) -> bool {
    c == '_' || unicode_ident::is_xid_start(c)
}

#[cfg(feature = "unicode")]
fn is_ident(c: char) -> bool {
    unicode_ident::is_xid_continue(c)
}

#[cfg(not(feature = "unicode"))]
fn is_ident_start(c: char) -> bool {
    matches!(c, 'A'..='Z' | 'a'..='z' | '_')
}

#[cfg(not(feature = "unicode"))]
fn is_ident(c: char) -> bool {
    matches!(c, '0'..='9' | 'A'..='Z' | 'a'..='z' | '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::ErrorKind;

    #[test]
    fn scan_empty() {
        let tokens = scan_all("").unwrap();
        assert_eq!(tokens, []);
    }

    #[test]
    fn scan_literal() {
        let tokens = scan_all("lorem ipsum").unwrap();
        assert_eq!(tokens, [(TokenKind::Literal, "lorem ipsum")]);
    }

    #[test]
    fn scan_end_source_is_repeatable() {
        let mut scanner = Scanner::new(Arc::from(""), "x");
        assert_eq!(scanner.scan().unwrap().kind, TokenKind::Literal);
        for _ in 0..3 {
            assert_eq!(scanner.scan().unwrap().kind, TokenKind::EndSource);
        }
    }

    #[test]
    fn scan_directive() {
        let tokens = scan_all("a <% if $Foo == 'bar' && 12 >= 1.5 %>b").unwrap();
        assert_eq!(
            tokens,
            [
                (TokenKind::Literal, "a "),
                (TokenKind::Open, "<%"),
                (TokenKind::Ident, "if"),
                (TokenKind::Symbol, "$"),
                (TokenKind::Ident, "Foo"),
                (TokenKind::Symbol, "=="),
                (TokenKind::String, "'bar'"),
                (TokenKind::Symbol, "&&"),
                (TokenKind::Number, "12"),
                (TokenKind::Symbol, ">="),
                (TokenKind::Number, "1.5"),
                (TokenKind::Close, "%>"),
                (TokenKind::Literal, "b"),
            ]
        );
    }

    #[test]
    fn scan_inline_reference() {
        let tokens = scan_all("Hello $Name").unwrap();
        assert_eq!(
            tokens,
            [
                (TokenKind::Literal, "Hello "),
                (TokenKind::Symbol, "$"),
                (TokenKind::Ident, "Name"),
            ]
        );
    }

    #[test]
    fn scan_brace_reference() {
        let mut scanner = Scanner::new(Arc::from(""), "a{$Name}b");
        let expected = [
            (TokenKind::Literal, "a"),
            (TokenKind::Symbol, "{"),
            (TokenKind::Symbol, "$"),
            (TokenKind::Ident, "Name"),
            (TokenKind::Symbol, "}"),
        ];
        for (kind, text) in expected {
            let tk = scanner.scan().unwrap();
            assert_eq!((tk.kind, scanner.text(&tk)), (kind, text));
        }
        scanner.set_mode(Mode::Plain);
        let tk = scanner.scan().unwrap();
        assert_eq!((tk.kind, scanner.text(&tk)), (TokenKind::Literal, "b"));
    }

    #[test]
    fn scan_escaped_dollar() {
        let tokens = scan_all("costs $$5 or $ 6").unwrap();
        assert_eq!(tokens, [(TokenKind::Literal, "costs $$5 or $ 6")]);
    }

    #[test]
    fn scan_comment() {
        let tokens = scan_all("abc<%-- c --%>def").unwrap();
        assert_eq!(
            tokens,
            [(TokenKind::Literal, "abc"), (TokenKind::Literal, "def")]
        );
    }

    #[test]
    fn scan_comment_unterminated() {
        let err = scan_all("abc<%-- comment").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Scan);
    }

    #[test]
    fn scan_string_unterminated() {
        let err = scan_all("<% include \"x %>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Scan);
    }

    #[test]
    fn scan_put_back_restores_mode() {
        let mut scanner = Scanner::new(Arc::from(""), "<% end_if %>$x");
        let open = scanner.scan().unwrap();
        let ident = scanner.scan().unwrap();
        assert_eq!(ident.kind, TokenKind::Ident);
        scanner.put_back(ident.clone());
        scanner.put_back(open.clone());
        assert_eq!(scanner.scan().unwrap(), open);
        assert_eq!(scanner.scan().unwrap(), ident);
        assert_eq!(scanner.scan().unwrap().kind, TokenKind::Close);
        let tk = scanner.scan().unwrap();
        assert!(tk.is_symbol(scanner.source, "$"));
    }

    #[test]
    fn scan_peek() {
        let mut scanner = Scanner::new(Arc::from(""), "<% a b %>");
        scanner.scan().unwrap();
        let peeked = scanner.peek().unwrap();
        assert!(peeked.is_ident(scanner.source, "a"));
        assert_eq!(scanner.scan().unwrap(), peeked);
        assert!(scanner.scan().unwrap().is_ident(scanner.source, "b"));
    }

    fn scan_all(source: &str) -> Result<Vec<(TokenKind, &str)>> {
        let mut scanner = Scanner::new(Arc::from("test"), source);
        let mut tokens = Vec::new();
        loop {
            let tk = scanner.scan()?;
            if tk.kind == TokenKind::EndSource {
                break;
            }
            tokens.push((tk.kind, &source[tk.span]));
        }
        Ok(tokens)
    }
}
