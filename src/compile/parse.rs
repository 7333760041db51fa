use std::fmt::Display;
use std::sync::Arc;

use crate::compile::lex::{Mode, Scanner, Token, TokenKind};
use crate::config::INCLUDES_PATH;
use crate::error::Location;
use crate::types::chunk::{Chunk, ChunkKind, CompareOp, RequireKind};
use crate::types::span::Span;
use crate::{Engine, Error, Result, Value};

/// A recursive descent parser that constructs a chunk tree from a token
/// stream.
///
/// Nested constructs are parsed by recursing into
/// [`parse_content`][Parser::parse_content], which stops at any directive
/// that closes or continues an enclosing construct and leaves it for the
/// caller.
pub struct Parser<'engine, 'source> {
    /// The engine, used to compile included templates.
    engine: &'engine Engine,

    /// A scanner that tokenizes the template source.
    tokens: Scanner<'source>,

    /// Whether this is the main template, where `$Layout` is special.
    is_main: bool,

    /// How many includes deep this template is.
    depth: usize,
}

/// The binary boolean operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoolOp {
    And,
    Or,
}

/// Directives that end or continue an enclosing construct.
const TERMINATORS: &[&str] = &[
    "else",
    "else_if",
    "end_if",
    "end_loop",
    "end_with",
    "end_cached",
];

impl<'engine, 'source> Parser<'engine, 'source> {
    /// Construct a new parser.
    pub fn new(
        engine: &'engine Engine,
        file: Arc<str>,
        source: &'source str,
        is_main: bool,
        depth: usize,
    ) -> Self {
        Self {
            engine,
            tokens: Scanner::new(file, source),
            is_main,
            depth,
        }
    }

    /// Parses a whole template, requiring that the token stream is exhausted.
    pub fn parse_source(mut self) -> Result<Chunk> {
        let root = self.parse_content()?;
        let tk = self.tokens.scan()?;
        match tk.kind {
            TokenKind::EndSource => Ok(root),
            TokenKind::Open => {
                let next = self.tokens.scan()?;
                let span = tk.span.combine(next.span);
                Err(self.err_unexpected("directive", span))
            }
            _ => Err(self.err_unexpected(tk.kind.human(), tk.span)),
        }
    }

    /// Parses a sequence of literals, references and directives into a block.
    ///
    /// Stops at the end of the source or at a terminating directive such as
    /// `<% end_if %>`, which is put back for the enclosing construct.
    fn parse_content(&mut self) -> Result<Chunk> {
        let span = self.tokens.peek()?.span;
        let location = self.location(span);
        let mut chunks = Vec::new();

        loop {
            let tk = self.tokens.scan()?;
            match tk.kind {
                TokenKind::Literal => {
                    let text = self.tokens.text(&tk).replace("$$", "$");
                    if !text.is_empty() {
                        let location = self.location(tk.span);
                        chunks.push(Chunk::new(ChunkKind::Literal(text), location));
                    }
                }

                TokenKind::Open => {
                    let next = self.tokens.scan()?;
                    let is_terminator = next.kind == TokenKind::Ident
                        && TERMINATORS.contains(&self.tokens.text(&next));
                    self.tokens.put_back(next);
                    if is_terminator {
                        self.tokens.put_back(tk);
                        break;
                    }
                    if let Some(chunk) = self.parse_tag(&tk)? {
                        chunks.push(chunk);
                    }
                    self.expect(TokenKind::Close)?;
                }

                // The `{$Name}` form. The reference is delimited by the brace
                // so whitespace and lookahead are fine here.
                TokenKind::Symbol if self.is_symbol(&tk, "{") => {
                    self.expect_symbol("$")?;
                    let chunk = self.parse_reference(false)?;
                    self.expect_symbol("}")?;
                    self.tokens.set_mode(Mode::Plain);
                    chunks.push(chunk);
                }

                // The `$Name` form. The reference ends at the first character
                // that can't continue it, so no lookahead is allowed.
                TokenKind::Symbol if self.is_symbol(&tk, "$") => {
                    let chunk = self.parse_reference(true)?;
                    self.tokens.set_mode(Mode::Plain);
                    chunks.push(chunk);
                }

                TokenKind::EndSource => {
                    self.tokens.put_back(tk);
                    break;
                }

                kind => return Err(self.err_unexpected(kind.human(), tk.span)),
            }
        }

        Ok(Chunk::new(ChunkKind::Block(chunks), location))
    }

    /// Parses what is between `<%` and `%>`, excluding the closing `%>`.
    ///
    /// Returns `None` for directives that produce nothing, e.g. `<% t %>`.
    fn parse_tag(&mut self, open: &Token) -> Result<Option<Chunk>> {
        let tk = self.expect(TokenKind::Ident)?;
        let span = open.span.combine(tk.span);
        let location = self.location(span);

        let chunk = match self.tokens.text(&tk) {
            "include" => self.parse_include(location)?,
            "if" => self.parse_if(location)?,
            "loop" => {
                let (context, body) = self.parse_scoped("end_loop")?;
                Chunk::new(ChunkKind::Loop { context, body }, location)
            }
            "with" => {
                let (context, body) = self.parse_scoped("end_with")?;
                Chunk::new(ChunkKind::With { context, body }, location)
            }
            "require" => self.parse_require(location)?,
            "base_tag" => Chunk::new(ChunkKind::BaseTag, location),
            "cached" => self.parse_cached()?,
            "t" => {
                self.parse_translation()?;
                return Ok(None);
            }
            "else_if" => {
                return Err(self.err("`else_if` is not supported", span));
            }
            name => {
                return Err(self.err(format!("unknown directive `{name}`"), span));
            }
        };
        Ok(Some(chunk))
    }

    /// Parses `include NAME`, compiling the included template now.
    fn parse_include(&mut self, location: Location) -> Result<Chunk> {
        let tk = self.expect(TokenKind::Ident)?;
        let path = format!("{INCLUDES_PATH}{}", self.tokens.text(&tk));
        tracing::debug!(
            file = %self.tokens.file,
            include = %path,
            "resolving include"
        );
        let compiled = crate::compile::compile(self.engine, &path, false, self.depth + 1)
            .map_err(|err| Error::include(&path, err, location.clone()))?;
        Ok(Chunk::new(ChunkKind::Include(compiled), location))
    }

    /// Parses `if COND %> ... [<% else %> ...] <% end_if`.
    fn parse_if(&mut self, location: Location) -> Result<Chunk> {
        let condition = Box::new(self.parse_expr()?);
        self.expect(TokenKind::Close)?;
        let then_part = Box::new(self.parse_content()?);

        self.expect(TokenKind::Open)?;
        let tk = self.expect(TokenKind::Ident)?;
        let else_part = match self.tokens.text(&tk) {
            "end_if" => None,
            "else" => {
                self.expect(TokenKind::Close)?;
                let else_part = self.parse_content()?;
                self.expect_tag("end_if")?;
                Some(Box::new(else_part))
            }
            "else_if" => return Err(self.err("`else_if` is not supported", tk.span)),
            _ => return Err(self.err_expected("`end_if`", &tk)),
        };

        Ok(Chunk::new(
            ChunkKind::If {
                condition,
                then_part,
                else_part,
            },
            location,
        ))
    }

    /// Parses the common shape of `loop` and `with`: a context expression, a
    /// body and the given closing directive.
    fn parse_scoped(&mut self, end: &str) -> Result<(Box<Chunk>, Box<Chunk>)> {
        let context = self.parse_expr()?;
        self.expect(TokenKind::Close)?;
        let body = self.parse_content()?;
        self.expect_tag(end)?;
        Ok((Box::new(context), Box::new(body)))
    }

    /// Parses `require KIND("path")`.
    fn parse_require(&mut self, location: Location) -> Result<Chunk> {
        let tk = self.expect(TokenKind::Ident)?;
        let kind = RequireKind::from_ident(self.tokens.text(&tk))
            .ok_or_else(|| self.err_expected("one of `css`, `themedCSS` or `javascript`", &tk))?;
        self.expect_symbol("(")?;
        let path = self.expect(TokenKind::String)?;
        let path = self.parse_string(path.span)?;
        self.expect_symbol(")")?;
        Ok(Chunk::new(ChunkKind::Require { kind, path }, location))
    }

    /// Parses `cached EXPR, ... %> ... <% end_cached`. Caching isn't
    /// supported so the expressions are discarded and the body is returned.
    fn parse_cached(&mut self) -> Result<Chunk> {
        if self.tokens.peek()?.kind != TokenKind::Close {
            loop {
                self.parse_expr()?;
                if !self.is_next_symbol(",")? {
                    break;
                }
                self.tokens.scan()?;
            }
        }
        self.expect(TokenKind::Close)?;
        let body = self.parse_content()?;
        self.expect_tag("end_cached")?;
        Ok(body)
    }

    /// Skips the arguments of a translation directive.
    fn parse_translation(&mut self) -> Result<()> {
        loop {
            let tk = self.tokens.peek()?;
            match tk.kind {
                TokenKind::Close => return Ok(()),
                TokenKind::EndSource => return Err(self.err_expected("`%>`", &tk)),
                _ => {
                    self.tokens.scan()?;
                }
            }
        }
    }

    /// Parses an expression.
    ///
    /// A single expression may combine operands with `&&` or with `||` but
    /// not both, parentheses are required to mix them.
    fn parse_expr(&mut self) -> Result<Chunk> {
        let first = self.parse_comparison()?;

        let op = match self.peek_bool_op()? {
            Some(op) => op,
            None => return Ok(first),
        };

        let location = first.location.clone();
        let mut operands = vec![first];
        while let Some(next) = self.peek_bool_op()? {
            let tk = self.tokens.scan()?;
            if next != op {
                return Err(self.err(
                    "cannot mix `&&` and `||` without parentheses",
                    tk.span,
                ));
            }
            operands.push(self.parse_comparison()?);
        }

        let kind = match op {
            BoolOp::And => ChunkKind::And(operands),
            BoolOp::Or => ChunkKind::Or(operands),
        };
        Ok(Chunk::new(kind, location))
    }

    /// Parses a term optionally compared with exactly one other term.
    fn parse_comparison(&mut self) -> Result<Chunk> {
        let lhs = self.parse_term()?;

        let op = match self.peek_compare_op()? {
            Some(op) => op,
            None => return Ok(lhs),
        };
        self.tokens.scan()?;
        let rhs = self.parse_term()?;

        if self.peek_compare_op()?.is_some() {
            let tk = self.tokens.scan()?;
            return Err(self.err("comparison operators cannot be chained", tk.span));
        }

        let location = lhs.location.clone();
        Ok(Chunk::new(
            ChunkKind::Compare {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            location,
        ))
    }

    /// Parses a literal, a parenthesized expression, a negation or a
    /// reference.
    fn parse_term(&mut self) -> Result<Chunk> {
        let tk = self.tokens.scan()?;
        let location = self.location(tk.span);
        match tk.kind {
            TokenKind::Number => {
                let value = self.parse_number(&tk)?;
                Ok(Chunk::new(ChunkKind::Number(value), location))
            }
            TokenKind::String => {
                let value = self.parse_string(tk.span)?;
                Ok(Chunk::new(ChunkKind::String(value), location))
            }
            TokenKind::Symbol if self.is_symbol(&tk, "(") => {
                let expr = self.parse_expr()?;
                self.expect_symbol(")")?;
                Ok(expr)
            }
            TokenKind::Symbol if self.is_symbol(&tk, "$") => self.parse_reference(false),
            TokenKind::Ident if self.tokens.text(&tk) == "not" => {
                let operand = self.parse_comparison()?;
                Ok(Chunk::new(ChunkKind::Not(Box::new(operand)), location))
            }
            TokenKind::Ident => {
                self.tokens.put_back(tk);
                self.parse_reference(false)
            }
            _ => Err(self.err_expected("expression", &tk)),
        }
    }

    /// Parses a variable or function reference, turning a bare `Layout` in
    /// the main template into a layout substitution.
    fn parse_reference(&mut self, inline: bool) -> Result<Chunk> {
        let chunk = self.parse_var_func(inline)?;
        let is_layout = self.is_main
            && matches!(
                &chunk.kind,
                ChunkKind::VarFunc { name, args: None, chained: None } if name == "Layout"
            );
        if is_layout {
            return Ok(Chunk::new(ChunkKind::Layout, chunk.location));
        }
        Ok(chunk)
    }

    /// Parses `Name`, `Name(args)` and their dotted continuations.
    ///
    /// When `inline` is set the reference is embedded in plain text, so an
    /// argument list or continuation must follow immediately.
    fn parse_var_func(&mut self, inline: bool) -> Result<Chunk> {
        let tk = self.expect(TokenKind::Ident)?;
        let name = self.tokens.text(&tk).to_owned();
        let location = self.location(tk.span);

        let has_args = match inline {
            true => self.tokens.is_next_char('('),
            false => self.is_next_symbol("(")?,
        };
        let args = match has_args {
            true => {
                self.tokens.scan()?;
                Some(self.parse_args()?)
            }
            false => None,
        };

        let has_chain = match inline {
            true => self.tokens.is_next_chain(),
            false => self.is_next_symbol(".")?,
        };
        let chained = match has_chain {
            true => {
                self.tokens.scan()?;
                Some(Box::new(self.parse_var_func(inline)?))
            }
            false => None,
        };

        Ok(Chunk::new(
            ChunkKind::VarFunc {
                name,
                args,
                chained,
            },
            location,
        ))
    }

    /// Parses a comma separated, possibly empty, argument list up to and
    /// including the closing parenthesis.
    fn parse_args(&mut self) -> Result<Vec<Chunk>> {
        let mut args = Vec::new();
        if self.is_next_symbol(")")? {
            self.tokens.scan()?;
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            let tk = self.tokens.scan()?;
            match self.tokens.text(&tk) {
                "," if tk.kind == TokenKind::Symbol => continue,
                ")" if tk.kind == TokenKind::Symbol => return Ok(args),
                _ => return Err(self.err_expected("`,` or `)`", &tk)),
            }
        }
    }

    fn parse_number(&self, tk: &Token) -> Result<Value> {
        let raw = self.tokens.text(tk);
        let value = match raw.contains('.') {
            true => raw.parse().map(Value::Float).ok(),
            false => raw.parse().map(Value::Integer).ok(),
        };
        value.ok_or_else(|| self.err("invalid number", tk.span))
    }

    /// Parses a string and handles escape characters.
    fn parse_string(&self, span: Span) -> Result<String> {
        let raw = &self.tokens.source[span];
        let inner = &raw[1..raw.len() - 1];
        if !inner.contains('\\') {
            return Ok(inner.to_owned());
        }

        let mut iter = inner.char_indices().map(|(i, c)| (span.m + 1 + i, c));
        let mut string = String::new();
        while let Some((i, c)) = iter.next() {
            match c {
                '\\' => {
                    let (j, esc) = match iter.next() {
                        Some(next) => next,
                        None => return Err(self.err("unknown escape character", i..i + 1)),
                    };
                    let c = match esc {
                        'n' => '\n',
                        'r' => '\r',
                        't' => '\t',
                        '\\' => '\\',
                        '"' => '"',
                        '\'' => '\'',
                        _ => {
                            return Err(self.err(
                                "unknown escape character",
                                i..j + esc.len_utf8(),
                            ));
                        }
                    };
                    string.push(c);
                }
                c => string.push(c),
            }
        }
        Ok(string)
    }

    fn peek_bool_op(&mut self) -> Result<Option<BoolOp>> {
        let tk = self.tokens.peek()?;
        Ok(match (tk.kind, self.tokens.text(&tk)) {
            (TokenKind::Symbol, "&&") => Some(BoolOp::And),
            (TokenKind::Symbol, "||") => Some(BoolOp::Or),
            _ => None,
        })
    }

    fn peek_compare_op(&mut self) -> Result<Option<CompareOp>> {
        let tk = self.tokens.peek()?;
        Ok(match tk.kind {
            TokenKind::Symbol => CompareOp::from_symbol(self.tokens.text(&tk)),
            _ => None,
        })
    }

    /// Expects `<% NAME`, leaving the closing `%>` for the caller.
    fn expect_tag(&mut self, name: &str) -> Result<()> {
        let open = self.expect(TokenKind::Open)?;
        let tk = self.tokens.scan()?;
        if !tk.is_ident(self.tokens.source, name) {
            let span = open.span.combine(tk.span);
            return Err(self.err(format!("expected `<% {name} %>`"), span));
        }
        Ok(())
    }

    /// Expects the given symbol.
    fn expect_symbol(&mut self, sym: &str) -> Result<Token> {
        let tk = self.tokens.scan()?;
        if !self.is_symbol(&tk, sym) {
            return Err(self.err_expected(format!("`{sym}`"), &tk));
        }
        Ok(tk)
    }

    /// Expects a token of the given kind.
    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        let tk = self.tokens.scan()?;
        if tk.kind != kind {
            return Err(self.err_expected(kind.human(), &tk));
        }
        Ok(tk)
    }

    /// Returns `true` if the next token is the given symbol.
    fn is_next_symbol(&mut self, sym: &str) -> Result<bool> {
        let tk = self.tokens.peek()?;
        Ok(self.is_symbol(&tk, sym))
    }

    fn is_symbol(&self, tk: &Token, sym: &str) -> bool {
        tk.is_symbol(self.tokens.source, sym)
    }

    fn location(&self, span: Span) -> Location {
        Location::new(self.tokens.file.clone(), span.line(self.tokens.source))
    }

    fn err(&self, msg: impl Into<String>, span: impl Into<Span>) -> Error {
        Error::syntax(msg, &self.tokens.file, self.tokens.source, span)
    }

    fn err_expected(&self, exp: impl Display, got: &Token) -> Error {
        let msg = match got.kind {
            TokenKind::EndSource => format!("expected {exp}, found end of source"),
            kind => format!(
                "expected {exp}, found {} `{}`",
                kind.human(),
                self.tokens.text(got)
            ),
        };
        self.err(msg, got.span)
    }

    fn err_unexpected(&self, what: impl Display, span: Span) -> Error {
        self.err(format!("unexpected {what}"), span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{Config, ErrorKind, MemoryLoader};

    #[test]
    fn parse_literal_only() {
        let root = parse("<p>lorem ipsum</p>").unwrap();
        match &root.kind {
            ChunkKind::Block(chunks) => {
                assert_eq!(chunks.len(), 1);
                assert!(
                    matches!(&chunks[0].kind, ChunkKind::Literal(s) if s == "<p>lorem ipsum</p>")
                );
            }
            kind => panic!("expected block, got {kind:?}"),
        }
    }

    #[test]
    fn parse_equal_synonyms() {
        for source in ["<% if $a == 1 %><% end_if %>", "<% if $a = 1 %><% end_if %>"] {
            let root = parse(source).unwrap();
            let cond = first_if_condition(&root);
            assert!(matches!(
                cond.kind,
                ChunkKind::Compare {
                    op: CompareOp::Equal,
                    ..
                }
            ));
        }
    }

    #[test]
    fn parse_inline_reference_stops_at_prose() {
        let root = parse("$Title's page. Done").unwrap();
        let chunks = block(&root);
        assert_eq!(chunks.len(), 2);
        assert!(matches!(
            &chunks[0].kind,
            ChunkKind::VarFunc { name, args: None, chained: None } if name == "Title"
        ));
        assert!(matches!(&chunks[1].kind, ChunkKind::Literal(s) if s == "'s page. Done"));
    }

    #[test]
    fn parse_inline_reference_chained_call() {
        let root = parse("$Menu(1).First.Title!").unwrap();
        let chunks = block(&root);
        match &chunks[0].kind {
            ChunkKind::VarFunc {
                name,
                args: Some(args),
                chained: Some(chained),
            } => {
                assert_eq!(name, "Menu");
                assert_eq!(args.len(), 1);
                assert!(matches!(&chained.kind, ChunkKind::VarFunc { name, .. } if name == "First"));
            }
            kind => panic!("unexpected {kind:?}"),
        }
        assert!(matches!(&chunks[1].kind, ChunkKind::Literal(s) if s == "!"));
    }

    #[test]
    fn parse_layout_only_in_main() {
        let root = parse_main("<body>$Layout</body>", true).unwrap();
        assert!(matches!(block(&root)[1].kind, ChunkKind::Layout));
        let root = parse_main("<body>$Layout</body>", false).unwrap();
        assert!(matches!(block(&root)[1].kind, ChunkKind::VarFunc { .. }));
    }

    #[test]
    fn parse_mixed_bool_ops_is_error() {
        let err = parse("<% if $a && $b || $c %>x<% end_if %>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        parse("<% if ($a && $b) || $c %>x<% end_if %>").unwrap();
    }

    #[test]
    fn parse_chained_comparison_is_error() {
        let err = parse("<% if 1 < 2 < 3 %>x<% end_if %>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn parse_else_if_is_error() {
        let err = parse("<% if $a %>a<% else_if $b %>b<% end_if %>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("`else_if` is not supported"));
    }

    #[test]
    fn parse_unclosed_if_is_error() {
        let err = parse("<% if $a %>a").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn parse_stray_end_tag_is_error() {
        let err = parse("a<% end_loop %>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn parse_error_has_line() {
        let err = parse("one\ntwo\n<% bogus %>").unwrap_err();
        let location = err.location().unwrap();
        assert_eq!(location.file(), "test");
        assert_eq!(location.line(), 3);
    }

    #[test]
    fn parse_require() {
        let root = parse("<% require themedCSS('layout') %>").unwrap();
        assert!(matches!(
            &block(&root)[0].kind,
            ChunkKind::Require { kind: RequireKind::ThemedCss, path } if path == "layout"
        ));
        let err = parse("<% require image(\"x.png\") %>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn parse_cached_returns_body() {
        let root = parse("<% cached 'key', $ID %>body<% end_cached %>").unwrap();
        let chunks = block(&root);
        assert!(matches!(&block(&chunks[0])[0].kind, ChunkKind::Literal(s) if s == "body"));
    }

    #[test]
    fn parse_translation_renders_nothing() {
        let root = parse("a<% t Page.TITLE \"Title\" %>b").unwrap();
        assert_eq!(block(&root).len(), 2);
    }

    #[test]
    fn parse_string_escapes() {
        let root = parse(r#"<% if $a == "say \"hi\"" %><% end_if %>"#).unwrap();
        match &first_if_condition(&root).kind {
            ChunkKind::Compare { rhs, .. } => {
                assert!(matches!(&rhs.kind, ChunkKind::String(s) if s == "say \"hi\""));
            }
            kind => panic!("unexpected {kind:?}"),
        }
    }

    fn block(chunk: &Chunk) -> &[Chunk] {
        match &chunk.kind {
            ChunkKind::Block(chunks) => chunks,
            kind => panic!("expected block, got {kind:?}"),
        }
    }

    fn first_if_condition(root: &Chunk) -> &Chunk {
        match &block(root)[0].kind {
            ChunkKind::If { condition, .. } => condition,
            kind => panic!("expected if, got {kind:?}"),
        }
    }

    fn parse(source: &str) -> Result<Chunk> {
        parse_main(source, true)
    }

    fn parse_main(source: &str, is_main: bool) -> Result<Chunk> {
        let config = Config::new("/srv", "simple").unwrap();
        let engine = Engine::with_loader(config, MemoryLoader::new());
        Parser::new(&engine, Arc::from("test"), source, is_main, 0).parse_source()
    }
}
