use crate::ast::*;
use crate::error::Diagnostic;

/// Parser state: tracks position in the input string.
///
/// Whitespace and comments are never consumed eagerly. Every token reader
/// looks past the trivia in front of it and only moves `pos` when the token
/// matches, so `pos` always sits right after the last consumed token and the
/// trivia before the next statement stays available for blank-line counting
/// and automatic semicolon insertion.
struct Parser<'a> {
    source: &'a SourceFile,
    input: &'a str,
    pos: usize,
}

/// Parse a TypeScript source file into a module.
/// A syntax error is fatal for the whole file.
pub fn parse(source: &SourceFile) -> Result<Module, Diagnostic> {
    let mut parser = Parser {
        source,
        input: &source.text,
        pos: 0,
    };
    let mut items = Vec::new();

    while !parser.at_end() {
        items.push(parser.parse_item()?);
    }

    Ok(Module { items })
}

/// Punctuators, longest first so a prefix scan finds the longest match.
const PUNCTUATORS: &[&str] = &[
    ">>>=", "...", "===", "!==", "**=", "<<=", ">>=", ">>>", "&&=", "||=", "??=", "=>", "==",
    "!=", "<=", ">=", "&&", "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=",
    "|=", "^=", "**", "<<", ">>", "{", "}", "(", ")", "[", "]", ";", ",", "<", ">", "+", "-",
    "*", "/", "%", "&", "|", "^", "!", "~", "?", ":", "=", ".", "@", "#",
];

const RESERVED_WORDS: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
    "do", "else", "enum", "export", "extends", "false", "finally", "for", "function", "if",
    "import", "in", "instanceof", "new", "null", "return", "super", "switch", "this", "throw",
    "true", "try", "typeof", "var", "void", "while", "with",
];

/// Binary operators by precedence, lowest first.
const BINARY_PRECEDENCE: &[(&str, BinaryOp, u8)] = &[
    ("??", BinaryOp::NullishCoalescing, 1),
    ("||", BinaryOp::Or, 1),
    ("&&", BinaryOp::And, 2),
    ("|", BinaryOp::BitOr, 3),
    ("^", BinaryOp::BitXor, 4),
    ("&", BinaryOp::BitAnd, 5),
    ("==", BinaryOp::Eq, 6),
    ("!=", BinaryOp::NotEq, 6),
    ("===", BinaryOp::StrictEq, 6),
    ("!==", BinaryOp::StrictNotEq, 6),
    ("<", BinaryOp::Lt, 7),
    ("<=", BinaryOp::LtEq, 7),
    (">", BinaryOp::Gt, 7),
    (">=", BinaryOp::GtEq, 7),
    ("<<", BinaryOp::Shl, 8),
    (">>", BinaryOp::Shr, 8),
    (">>>", BinaryOp::UnsignedShr, 8),
    ("+", BinaryOp::Add, 9),
    ("-", BinaryOp::Sub, 9),
    ("*", BinaryOp::Mul, 10),
    ("/", BinaryOp::Div, 10),
    ("%", BinaryOp::Rem, 10),
    ("**", BinaryOp::Exp, 11),
];

const ASSIGNMENT_OPERATORS: &[(&str, AssignOp)] = &[
    ("=", AssignOp::Assign),
    ("+=", AssignOp::AddAssign),
    ("-=", AssignOp::SubAssign),
    ("*=", AssignOp::MulAssign),
    ("/=", AssignOp::DivAssign),
    ("%=", AssignOp::RemAssign),
    ("**=", AssignOp::Other("AsteriskAsteriskEqualsToken")),
    ("&&=", AssignOp::Other("AmpersandAmpersandEqualsToken")),
    ("||=", AssignOp::Other("BarBarEqualsToken")),
    ("??=", AssignOp::Other("QuestionQuestionEqualsToken")),
    ("&=", AssignOp::Other("AmpersandEqualsToken")),
    ("|=", AssignOp::Other("BarEqualsToken")),
    ("^=", AssignOp::Other("CaretEqualsToken")),
    ("<<=", AssignOp::Other("LessThanLessThanEqualsToken")),
    (">>=", AssignOp::Other("GreaterThanGreaterThanEqualsToken")),
    (">>>=", AssignOp::Other("GreaterThanGreaterThanGreaterThanEqualsToken")),
];

impl<'a> Parser<'a> {
    // ── Helpers ──────────────────────────────────────────────────────

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    fn starts_with(&self, s: &str) -> bool {
        self.remaining().starts_with(s)
    }

    fn eat_char(&mut self, ch: char) -> bool {
        if self.peek_char() == Some(ch) {
            self.advance(ch.len_utf8());
            true
        } else {
            false
        }
    }

    /// Create an error at the start of the next token.
    fn error_point(&self, message: String) -> Diagnostic {
        let at = self.token_start();
        self.error_span(message, at, at)
    }

    fn error_span(&self, message: String, begin: usize, end: usize) -> Diagnostic {
        Diagnostic::syntax_error(message, self.source.location(Span::new(begin, end)))
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.pos)
    }

    // ── Whitespace & Comments ───────────────────────────────────────

    /// Position after the whitespace and comments starting at `from`.
    fn ws_end(&self, from: usize) -> usize {
        let bytes = self.input.as_bytes();
        let mut at = from;
        loop {
            while let Some(ch) = self.input[at..].chars().next() {
                if ch.is_whitespace() || ch == '\u{feff}' {
                    at += ch.len_utf8();
                } else {
                    break;
                }
            }
            if bytes.get(at) == Some(&b'/') && bytes.get(at + 1) == Some(&b'/') {
                while at < bytes.len() && bytes[at] != b'\n' {
                    at += 1;
                }
            } else if bytes.get(at) == Some(&b'/') && bytes.get(at + 1) == Some(&b'*') {
                at = match self.input[at + 2..].find("*/") {
                    Some(close) => at + 2 + close + 2,
                    None => bytes.len(),
                };
            } else {
                return at;
            }
        }
    }

    fn skip_ws(&mut self) {
        self.pos = self.ws_end(self.pos);
    }

    fn token_start(&self) -> usize {
        self.ws_end(self.pos)
    }

    fn at_end(&self) -> bool {
        self.token_start() >= self.input.len()
    }

    /// Newlines between the last consumed token and the next one.
    fn leading_newlines(&self) -> usize {
        self.input[self.pos..self.token_start()].matches('\n').count()
    }

    fn newline_before_next(&self) -> bool {
        self.leading_newlines() > 0
    }

    // ── Tokens ──────────────────────────────────────────────────────

    fn punct_at(&self, at: usize) -> Option<&'static str> {
        let rest = &self.input[at..];
        PUNCTUATORS.iter().copied().find(|p| rest.starts_with(p))
    }

    fn peek_punct(&self, punct: &str) -> bool {
        self.punct_at(self.token_start()) == Some(punct)
    }

    fn eat_punct(&mut self, punct: &str) -> bool {
        let at = self.token_start();
        if self.punct_at(at) == Some(punct) {
            self.pos = at + punct.len();
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, punct: &str) -> Result<(), Diagnostic> {
        if self.eat_punct(punct) {
            Ok(())
        } else {
            Err(self.error_point(format!("Expected '{}'", punct)))
        }
    }

    fn word_at(&self, at: usize) -> Option<&'a str> {
        let rest = &self.input[at..];
        let mut chars = rest.char_indices();
        match chars.next() {
            Some((_, ch)) if is_id_start(ch) => {}
            _ => return None,
        }
        let end = chars
            .find(|(_, ch)| !is_id_continue(*ch))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        Some(&rest[..end])
    }

    fn peek_word(&self) -> Option<&'a str> {
        self.word_at(self.token_start())
    }

    /// The word after the next one, if the next token is a word.
    fn peek_second_word(&self) -> Option<&'a str> {
        let at = self.token_start();
        let word = self.word_at(at)?;
        self.word_at(self.ws_end(at + word.len()))
    }

    /// The punctuator after the next word.
    fn punct_after_word(&self) -> Option<&'static str> {
        let at = self.token_start();
        let word = self.word_at(at)?;
        self.punct_at(self.ws_end(at + word.len()))
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        self.peek_word() == Some(keyword)
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let at = self.token_start();
        if self.word_at(at) == Some(keyword) {
            self.pos = at + keyword.len();
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), Diagnostic> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error_point(format!("Expected '{}'", keyword)))
        }
    }

    /// Any word, keywords included (property names after `.`).
    fn parse_word(&mut self) -> Result<Ident, Diagnostic> {
        let at = self.token_start();
        match self.word_at(at) {
            Some(word) => {
                self.pos = at + word.len();
                Ok(Ident::new(word, self.span_from(at)))
            }
            None => Err(self.error_point("Expected an identifier".to_string())),
        }
    }

    fn parse_identifier(&mut self) -> Result<Ident, Diagnostic> {
        let at = self.token_start();
        match self.word_at(at) {
            Some(word) if !RESERVED_WORDS.contains(&word) => {
                self.pos = at + word.len();
                Ok(Ident::new(word, self.span_from(at)))
            }
            Some(word) => Err(self.error_span(
                format!("'{}' is a reserved word", word),
                at,
                at + word.len(),
            )),
            None => Err(self.error_point("Expected an identifier".to_string())),
        }
    }

    fn peek_identifier(&self) -> bool {
        matches!(self.peek_word(), Some(word) if !RESERVED_WORDS.contains(&word))
    }

    /// Automatic semicolon insertion: a missing `;` is fine before `}`, at
    /// the end of input, or when a line break follows the statement.
    fn eat_semicolon(&mut self) -> Result<(), Diagnostic> {
        if self.eat_punct(";") || self.peek_punct("}") || self.at_end() || self.newline_before_next()
        {
            Ok(())
        } else {
            Err(self.error_point("Expected ';'".to_string()))
        }
    }

    // ── Skipping (types and unsupported constructs) ─────────────────

    /// Skip a string, template or comment starting at `pos`, if any.
    fn skip_quoted(&mut self) -> Result<bool, Diagnostic> {
        match self.peek_char() {
            Some(quote @ ('"' | '\'' | '`')) => {
                let begin = self.pos;
                self.advance(1);
                loop {
                    match self.peek_char() {
                        None => {
                            return Err(self.error_span(
                                "Unterminated string".to_string(),
                                begin,
                                self.pos,
                            ))
                        }
                        Some('\\') => {
                            self.advance(1);
                            if let Some(ch) = self.peek_char() {
                                self.advance(ch.len_utf8());
                            }
                        }
                        Some(ch) => {
                            self.advance(ch.len_utf8());
                            if ch == quote {
                                return Ok(true);
                            }
                        }
                    }
                }
            }
            Some('/') if self.starts_with("//") || self.starts_with("/*") => {
                self.skip_ws();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Skip from the next token, which must be `open`, to its matching `close`.
    fn skip_balanced(&mut self, open: char, close: char) -> Result<(), Diagnostic> {
        self.skip_ws();
        let begin = self.pos;
        if !self.eat_char(open) {
            return Err(self.error_point(format!("Expected '{}'", open)));
        }
        let mut depth = 1usize;
        while depth > 0 {
            if self.skip_quoted()? {
                continue;
            }
            if open == '<' && self.starts_with("=>") {
                self.advance(2);
                continue;
            }
            match self.peek_char() {
                None => {
                    return Err(self.error_span(
                        format!("Unclosed '{}'", open),
                        begin,
                        self.pos,
                    ))
                }
                Some(ch) => {
                    if ch == open {
                        depth += 1;
                    } else if ch == close {
                        depth -= 1;
                    }
                    self.advance(ch.len_utf8());
                }
            }
        }
        Ok(())
    }

    /// Skip a type annotation. Stops before a `,`, `;`, `=` or closing
    /// bracket at nesting depth 0. With `body_follows`, a `{` after a
    /// complete type also ends it (function return types). With
    /// `until_newline`, a line break after a complete type ends it
    /// (type aliases without semicolon).
    fn skip_type(&mut self, body_follows: bool, until_newline: bool) -> Result<(), Diagnostic> {
        let begin = self.token_start();
        let mut depth = 0usize;
        // Whether the tokens so far form a complete type.
        let mut complete = false;
        loop {
            let trivia_end = self.ws_end(self.pos);
            if depth == 0 && until_newline && complete && self.newline_before_next() {
                let next = self.punct_at(trivia_end);
                if !matches!(next, Some("|") | Some("&") | Some(".")) {
                    return Ok(());
                }
            }
            self.pos = trivia_end;
            if self.skip_quoted()? {
                complete = true;
                continue;
            }
            if self.starts_with("=>") {
                self.advance(2);
                complete = false;
                continue;
            }
            let ch = match self.peek_char() {
                Some(ch) => ch,
                None if depth == 0 && complete => return Ok(()),
                None => {
                    return Err(self.error_span(
                        "Unterminated type annotation".to_string(),
                        begin,
                        self.pos,
                    ))
                }
            };
            match ch {
                '(' | '[' | '<' => {
                    depth += 1;
                    complete = false;
                }
                '{' => {
                    if depth == 0 && body_follows && complete {
                        return Ok(());
                    }
                    depth += 1;
                    complete = false;
                }
                ')' | ']' | '}' | '>' => {
                    if depth == 0 {
                        return Ok(());
                    }
                    depth -= 1;
                    complete = true;
                }
                ',' | ';' if depth == 0 => return Ok(()),
                '=' if depth == 0 => return Ok(()),
                _ => {
                    complete = is_id_continue(ch);
                }
            }
            self.advance(ch.len_utf8());
        }
    }

    // ── Module items ────────────────────────────────────────────────

    fn parse_item(&mut self) -> Result<Item, Diagnostic> {
        let start = self.token_start();

        match self.peek_word() {
            Some("import") if !matches!(self.punct_after_word(), Some("(") | Some(".")) => {
                self.parse_import().map(Item::Import)
            }
            Some("export") => {
                let leading_newlines = self.leading_newlines();
                self.expect_keyword("export")?;
                let mut modifiers = vec![Modifier::Export];
                if self.eat_keyword("default") {
                    modifiers.push(Modifier::Default);
                }
                match self.peek_word() {
                    Some("function") | Some("async") | Some("declare")
                        if self.function_follows() =>
                    {
                        self.parse_function(modifiers, start).map(Item::Function)
                    }
                    Some("interface") | Some("type")
                        if !modifiers.contains(&Modifier::Default) =>
                    {
                        self.skip_type_declaration()?;
                        Ok(Item::TypeDeclaration {
                            span: self.span_from(start),
                        })
                    }
                    _ if self.peek_punct("{") || self.peek_punct("*") => {
                        self.skip_export_clause()?;
                        Ok(Item::Statement(Statement {
                            kind: StatementKind::Other("ExportDeclaration"),
                            span: self.span_from(start),
                            leading_newlines,
                        }))
                    }
                    _ if modifiers.contains(&Modifier::Default) => {
                        self.parse_assignment()?;
                        self.eat_semicolon()?;
                        Ok(Item::Statement(Statement {
                            kind: StatementKind::Other("ExportAssignment"),
                            span: self.span_from(start),
                            leading_newlines,
                        }))
                    }
                    _ => {
                        let mut statement = self.parse_statement()?;
                        statement.span = self.span_from(start);
                        statement.leading_newlines = leading_newlines;
                        Ok(Item::Statement(statement))
                    }
                }
            }
            Some("function") | Some("async") | Some("declare") if self.function_follows() => {
                self.parse_function(Vec::new(), start).map(Item::Function)
            }
            Some("interface") => {
                self.skip_type_declaration()?;
                Ok(Item::TypeDeclaration {
                    span: self.span_from(start),
                })
            }
            Some("type") if self.peek_second_word().is_some() => {
                self.skip_type_declaration()?;
                Ok(Item::TypeDeclaration {
                    span: self.span_from(start),
                })
            }
            _ => self.parse_statement().map(Item::Statement),
        }
    }

    /// Whether the next tokens are `[async|declare]* function`.
    fn function_follows(&self) -> bool {
        let mut at = self.token_start();
        while let Some(word) = self.word_at(at) {
            match word {
                "function" => return true,
                "async" | "declare" => at = self.ws_end(at + word.len()),
                _ => return false,
            }
        }
        false
    }

    fn parse_import(&mut self) -> Result<ImportDeclaration, Diagnostic> {
        let start = self.token_start();
        self.expect_keyword("import")?;

        let mut specifiers = Vec::new();

        // import "module";
        if self.peek_string_start() {
            let module = self.parse_string_literal()?;
            self.eat_semicolon()?;
            return Ok(ImportDeclaration {
                module,
                specifiers,
                span: self.span_from(start),
            });
        }

        // `import type X from` but not `import type from "..."`
        if self.peek_keyword("type") && self.peek_second_word() != Some("from") {
            self.expect_keyword("type")?;
        }

        if self.peek_identifier() {
            let local = self.parse_identifier()?;
            specifiers.push(ImportSpecifier::Default { local: local.name });
            if !self.eat_punct(",") {
                return self.finish_import(start, specifiers);
            }
        }

        if self.eat_punct("*") {
            self.expect_keyword("as")?;
            let local = self.parse_identifier()?;
            specifiers.push(ImportSpecifier::Namespace { local: local.name });
        } else if self.eat_punct("{") {
            while !self.eat_punct("}") {
                if self.peek_keyword("type")
                    && !matches!(self.punct_after_word(), Some(",") | Some("}"))
                    && self.peek_second_word() != Some("as")
                {
                    self.expect_keyword("type")?;
                }
                let imported = self.parse_word()?;
                let local = if self.eat_keyword("as") {
                    self.parse_identifier()?.name
                } else {
                    imported.name.clone()
                };
                specifiers.push(ImportSpecifier::Named {
                    imported: imported.name,
                    local,
                });
                if !self.eat_punct(",") {
                    self.expect_punct("}")?;
                    break;
                }
            }
        }

        self.finish_import(start, specifiers)
    }

    fn finish_import(
        &mut self,
        start: usize,
        specifiers: Vec<ImportSpecifier>,
    ) -> Result<ImportDeclaration, Diagnostic> {
        self.expect_keyword("from")?;
        let module = self.parse_string_literal()?;
        self.eat_semicolon()?;
        Ok(ImportDeclaration {
            module,
            specifiers,
            span: self.span_from(start),
        })
    }

    /// `export { a, b as c } [from "..."];` and `export * from "...";`
    fn skip_export_clause(&mut self) -> Result<(), Diagnostic> {
        if self.eat_punct("*") {
            if self.eat_keyword("as") {
                self.parse_word()?;
            }
        } else {
            self.skip_balanced('{', '}')?;
        }
        if self.eat_keyword("from") {
            self.parse_string_literal()?;
        }
        self.eat_semicolon()
    }

    /// `interface X<T> extends Y { ... }` or `type X<T> = ...;`
    fn skip_type_declaration(&mut self) -> Result<(), Diagnostic> {
        if self.eat_keyword("interface") {
            self.parse_identifier()?;
            if self.peek_punct("<") {
                self.skip_balanced('<', '>')?;
            }
            while !self.peek_punct("{") {
                if self.at_end() {
                    return Err(self.error_point("Expected '{'".to_string()));
                }
                self.skip_type_token()?;
            }
            self.skip_balanced('{', '}')
        } else {
            self.expect_keyword("type")?;
            self.parse_identifier()?;
            if self.peek_punct("<") {
                self.skip_balanced('<', '>')?;
            }
            self.expect_punct("=")?;
            self.skip_type(false, true)?;
            self.eat_semicolon()
        }
    }

    /// Skip one token of an `extends` clause.
    fn skip_type_token(&mut self) -> Result<(), Diagnostic> {
        if self.peek_punct("<") {
            return self.skip_balanced('<', '>');
        }
        let at = self.token_start();
        if let Some(word) = self.word_at(at) {
            self.pos = at + word.len();
        } else if let Some(punct) = self.punct_at(at) {
            self.pos = at + punct.len();
        } else {
            return Err(self.error_point("Unexpected character".to_string()));
        }
        Ok(())
    }

    // ── Functions ───────────────────────────────────────────────────

    fn parse_function(
        &mut self,
        mut modifiers: Vec<Modifier>,
        start: usize,
    ) -> Result<FunctionDeclaration, Diagnostic> {
        loop {
            if self.eat_keyword("async") {
                modifiers.push(Modifier::Async);
            } else if self.eat_keyword("declare") {
                modifiers.push(Modifier::Declare);
            } else {
                break;
            }
        }
        self.expect_keyword("function")?;
        let generator = self.eat_punct("*");

        let name = if self.peek_identifier() {
            Some(self.parse_identifier()?)
        } else {
            None
        };

        if self.peek_punct("<") {
            self.skip_balanced('<', '>')?;
        }

        let params = self.parse_parameters()?;

        if self.eat_punct(":") {
            self.skip_type(true, false)?;
        }

        let body = if self.peek_punct("{") {
            Some(self.parse_block()?)
        } else {
            self.eat_semicolon()?;
            None
        };

        Ok(FunctionDeclaration {
            name,
            modifiers,
            params,
            body,
            generator,
            span: self.span_from(start),
        })
    }

    fn parse_parameters(&mut self) -> Result<Vec<Parameter>, Diagnostic> {
        self.expect_punct("(")?;
        let mut params = Vec::new();

        while !self.eat_punct(")") {
            let start = self.token_start();

            // Constructor-style accessibility modifiers.
            while matches!(
                self.peek_word(),
                Some("public") | Some("private") | Some("protected") | Some("readonly")
            ) && self.word_follows_word()
            {
                self.parse_word()?;
            }
            self.eat_punct("...");

            let is_this = self.peek_keyword("this");
            let name = if is_this {
                BindingName::Identifier(self.parse_word()?)
            } else {
                self.parse_binding_name()?
            };

            self.eat_punct("?");
            if self.eat_punct(":") {
                self.skip_type(false, false)?;
            }
            if self.eat_punct("=") {
                self.parse_assignment()?;
            }

            params.push(Parameter {
                name,
                is_this,
                span: self.span_from(start),
            });

            if !self.eat_punct(",") {
                self.expect_punct(")")?;
                break;
            }
        }

        Ok(params)
    }

    fn word_follows_word(&self) -> bool {
        self.peek_second_word().is_some() || {
            let at = self.token_start();
            self.word_at(at)
                .map(|word| {
                    let next = self.ws_end(at + word.len());
                    matches!(self.punct_at(next), Some("[") | Some("{"))
                })
                .unwrap_or(false)
        }
    }

    // ── Statements ──────────────────────────────────────────────────

    fn parse_block(&mut self) -> Result<Block, Diagnostic> {
        let start = self.token_start();
        self.expect_punct("{")?;
        let mut statements = Vec::new();
        loop {
            if self.eat_punct("}") {
                break;
            }
            if self.at_end() {
                return Err(self.error_span(
                    "Unclosed '{'".to_string(),
                    start,
                    self.input.len(),
                ));
            }
            statements.push(self.parse_statement()?);
        }
        Ok(Block {
            statements,
            span: self.span_from(start),
        })
    }

    fn parse_statement(&mut self) -> Result<Statement, Diagnostic> {
        let leading_newlines = self.leading_newlines();
        let start = self.token_start();
        let kind = self.parse_statement_kind()?;
        Ok(Statement {
            kind,
            span: self.span_from(start),
            leading_newlines,
        })
    }

    fn parse_statement_kind(&mut self) -> Result<StatementKind, Diagnostic> {
        if self.peek_punct("{") {
            return self.parse_block().map(StatementKind::Block);
        }
        if self.eat_punct(";") {
            return Ok(StatementKind::Other("EmptyStatement"));
        }

        match self.peek_word() {
            Some("const") if self.peek_second_word() != Some("enum") => {
                self.parse_word()?;
                self.parse_variable_statement(DeclarationKind::Const)
            }
            Some("var") => {
                self.parse_word()?;
                self.parse_variable_statement(DeclarationKind::Var)
            }
            Some("let") if self.peek_second_word().is_some() || self.binding_pattern_after_word() => {
                self.parse_word()?;
                self.parse_variable_statement(DeclarationKind::Let)
            }
            Some("if") => self.parse_if_statement(),
            Some("for") => self.parse_for_statement(),
            Some("return") => {
                self.parse_word()?;
                let value = if self.peek_punct(";")
                    || self.peek_punct("}")
                    || self.at_end()
                    || self.newline_before_next()
                {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.eat_semicolon()?;
                Ok(StatementKind::Return(value))
            }
            Some("while") => {
                self.parse_word()?;
                self.parse_paren_expression()?;
                self.parse_statement()?;
                Ok(StatementKind::Other("WhileStatement"))
            }
            Some("do") => {
                self.parse_word()?;
                self.parse_statement()?;
                self.expect_keyword("while")?;
                self.parse_paren_expression()?;
                self.eat_punct(";");
                Ok(StatementKind::Other("DoStatement"))
            }
            Some("throw") => {
                self.parse_word()?;
                self.parse_expression()?;
                self.eat_semicolon()?;
                Ok(StatementKind::Other("ThrowStatement"))
            }
            Some(word @ ("break" | "continue")) => {
                self.parse_word()?;
                if !self.newline_before_next() && self.peek_identifier() {
                    self.parse_identifier()?;
                }
                self.eat_semicolon()?;
                Ok(StatementKind::Other(if word == "break" {
                    "BreakStatement"
                } else {
                    "ContinueStatement"
                }))
            }
            Some("switch") => {
                self.parse_word()?;
                self.parse_paren_expression()?;
                self.skip_balanced('{', '}')?;
                Ok(StatementKind::Other("SwitchStatement"))
            }
            Some("try") => {
                self.parse_word()?;
                self.parse_block()?;
                if self.eat_keyword("catch") {
                    if self.peek_punct("(") {
                        self.skip_balanced('(', ')')?;
                    }
                    self.parse_block()?;
                }
                if self.eat_keyword("finally") {
                    self.parse_block()?;
                }
                Ok(StatementKind::Other("TryStatement"))
            }
            Some("debugger") => {
                self.parse_word()?;
                self.eat_semicolon()?;
                Ok(StatementKind::Other("DebuggerStatement"))
            }
            Some("function") | Some("async") if self.function_follows() => {
                let start = self.token_start();
                self.parse_function(Vec::new(), start)?;
                Ok(StatementKind::Other("FunctionDeclaration"))
            }
            Some("class") => {
                self.skip_class()?;
                Ok(StatementKind::Other("ClassDeclaration"))
            }
            Some("interface") => {
                self.skip_type_declaration()?;
                Ok(StatementKind::Other("InterfaceDeclaration"))
            }
            Some("type") if self.peek_second_word().is_some() => {
                self.skip_type_declaration()?;
                Ok(StatementKind::Other("TypeAliasDeclaration"))
            }
            Some("enum") | Some("const") => {
                self.eat_keyword("const");
                self.expect_keyword("enum")?;
                self.parse_identifier()?;
                self.skip_balanced('{', '}')?;
                Ok(StatementKind::Other("EnumDeclaration"))
            }
            Some("namespace") | Some("module") | Some("declare")
                if self.peek_second_word().is_some() =>
            {
                while !self.peek_punct("{") {
                    if self.at_end() {
                        return Err(self.error_point("Expected '{'".to_string()));
                    }
                    self.skip_type_token()?;
                }
                self.skip_balanced('{', '}')?;
                Ok(StatementKind::Other("ModuleDeclaration"))
            }
            Some(_) if self.peek_identifier() && self.punct_after_word() == Some(":") => {
                self.parse_identifier()?;
                self.expect_punct(":")?;
                self.parse_statement()?;
                Ok(StatementKind::Other("LabeledStatement"))
            }
            _ => {
                let expression = self.parse_expression()?;
                self.eat_semicolon()?;
                Ok(StatementKind::Expression(expression))
            }
        }
    }

    fn binding_pattern_after_word(&self) -> bool {
        matches!(self.punct_after_word(), Some("[") | Some("{"))
    }

    fn parse_paren_expression(&mut self) -> Result<Expr, Diagnostic> {
        self.expect_punct("(")?;
        let expression = self.parse_expression()?;
        self.expect_punct(")")?;
        Ok(expression)
    }

    fn skip_class(&mut self) -> Result<(), Diagnostic> {
        self.expect_keyword("class")?;
        while !self.peek_punct("{") {
            if self.at_end() {
                return Err(self.error_point("Expected '{'".to_string()));
            }
            self.skip_type_token()?;
        }
        self.skip_balanced('{', '}')
    }

    fn parse_variable_statement(
        &mut self,
        kind: DeclarationKind,
    ) -> Result<StatementKind, Diagnostic> {
        let mut declarations = vec![self.parse_variable_declaration()?];
        while self.eat_punct(",") {
            declarations.push(self.parse_variable_declaration()?);
        }
        self.eat_semicolon()?;
        Ok(StatementKind::Variable(VariableStatement { kind, declarations }))
    }

    fn parse_variable_declaration(&mut self) -> Result<VariableDeclaration, Diagnostic> {
        let start = self.token_start();
        let name = self.parse_binding_name()?;
        self.eat_punct("!");
        if self.eat_punct(":") {
            self.skip_type(false, false)?;
        }
        let initializer = if self.eat_punct("=") {
            Some(self.parse_assignment()?)
        } else {
            None
        };
        Ok(VariableDeclaration {
            name,
            initializer,
            span: self.span_from(start),
        })
    }

    fn parse_binding_name(&mut self) -> Result<BindingName, Diagnostic> {
        let start = self.token_start();

        if self.eat_punct("[") {
            let mut elements = Vec::new();
            loop {
                if self.eat_punct("]") {
                    break;
                }
                if self.eat_punct(",") {
                    elements.push(None);
                    continue;
                }
                self.eat_punct("...");
                let element = self.parse_binding_name()?;
                if self.eat_punct("=") {
                    self.parse_assignment()?;
                }
                elements.push(Some(element));
                if !self.eat_punct(",") {
                    self.expect_punct("]")?;
                    break;
                }
            }
            return Ok(BindingName::Array {
                elements,
                span: self.span_from(start),
            });
        }

        if self.eat_punct("{") {
            let mut properties = Vec::new();
            loop {
                if self.eat_punct("}") {
                    break;
                }
                let binding = if self.eat_punct("...") {
                    BindingName::Identifier(self.parse_identifier()?)
                } else {
                    let key = self.parse_property_name()?;
                    if self.eat_punct(":") {
                        self.parse_binding_name()?
                    } else {
                        match key {
                            PropertyName::Identifier(ident) => BindingName::Identifier(ident),
                            other => {
                                return Err(self.error_span(
                                    "Expected ':' in the binding pattern".to_string(),
                                    other.span().start,
                                    other.span().end,
                                ))
                            }
                        }
                    }
                };
                if self.eat_punct("=") {
                    self.parse_assignment()?;
                }
                properties.push(binding);
                if !self.eat_punct(",") {
                    self.expect_punct("}")?;
                    break;
                }
            }
            return Ok(BindingName::Object {
                properties,
                span: self.span_from(start),
            });
        }

        self.parse_identifier().map(BindingName::Identifier)
    }

    fn parse_if_statement(&mut self) -> Result<StatementKind, Diagnostic> {
        self.expect_keyword("if")?;
        let condition = self.parse_paren_expression()?;
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.eat_keyword("else") {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(StatementKind::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_for_statement(&mut self) -> Result<StatementKind, Diagnostic> {
        self.expect_keyword("for")?;
        if self.eat_keyword("await") {
            self.skip_balanced('(', ')')?;
            self.parse_statement()?;
            return Ok(StatementKind::Other("ForOfStatement"));
        }

        let header_start = self.token_start();
        self.expect_punct("(")?;

        let initializer = match self.peek_word() {
            Some("const") | Some("let") | Some("var") => {
                self.parse_word()?;
                let start = self.token_start();
                let name = self.parse_binding_name()?;
                if self.eat_punct(":") {
                    self.skip_type(false, false)?;
                }
                Some(ForOfInitializer::Declaration(VariableDeclaration {
                    name,
                    initializer: None,
                    span: self.span_from(start),
                }))
            }
            _ if self.peek_punct(";") => None,
            _ => Some(ForOfInitializer::Expression(self.parse_left_hand_side()?)),
        };

        let mut kind = "ForStatement";
        if let Some(initializer) = initializer {
            if self.eat_keyword("of") {
                let iterable = self.parse_assignment()?;
                self.expect_punct(")")?;
                let body = Box::new(self.parse_statement()?);
                return Ok(StatementKind::ForOf {
                    initializer,
                    iterable,
                    body,
                });
            }
            if self.peek_keyword("in") {
                kind = "ForInStatement";
            }
        }

        // The rest of the header is not translated; skip it as a whole.
        self.pos = header_start;
        self.skip_balanced('(', ')')?;
        self.parse_statement()?;
        Ok(StatementKind::Other(kind))
    }

    // ── Expressions ─────────────────────────────────────────────────

    fn parse_expression(&mut self) -> Result<Expr, Diagnostic> {
        let start = self.token_start();
        let first = self.parse_assignment()?;
        if !self.peek_punct(",") {
            return Ok(first);
        }
        while self.eat_punct(",") {
            self.parse_assignment()?;
        }
        Ok(self.other_expr("CommaListExpression", start))
    }

    fn other_expr(&self, name: &'static str, start: usize) -> Expr {
        Expr {
            kind: ExprKind::Other(name),
            span: self.span_from(start),
        }
    }

    fn parse_assignment(&mut self) -> Result<Expr, Diagnostic> {
        let start = self.token_start();

        if self.skip_arrow_function()? {
            return Ok(self.other_expr("ArrowFunction", start));
        }

        let target = self.parse_conditional()?;

        let at = self.token_start();
        let op = self.punct_at(at).and_then(|punct| {
            ASSIGNMENT_OPERATORS
                .iter()
                .find(|(token, _)| *token == punct)
                .map(|(token, op)| (*token, *op))
        });

        match op {
            Some((token, op)) => {
                self.pos = at + token.len();
                let value = self.parse_assignment()?;
                Ok(Expr {
                    kind: ExprKind::Assign {
                        op,
                        target: Box::new(target),
                        value: Box::new(value),
                    },
                    span: self.span_from(start),
                })
            }
            None => Ok(target),
        }
    }

    /// Consume an arrow function if one starts here.
    fn skip_arrow_function(&mut self) -> Result<bool, Diagnostic> {
        let saved = self.pos;

        if self.peek_keyword("async")
            && (self.peek_second_word().is_some() || self.punct_after_word() == Some("("))
        {
            self.parse_word()?;
        }

        let head = if self.peek_identifier() && self.punct_after_word() == Some("=>") {
            self.parse_identifier().map(|_| ())
        } else if self.peek_punct("(") {
            self.skip_balanced('(', ')')
        } else {
            self.pos = saved;
            return Ok(false);
        };

        if head.is_err() {
            self.pos = saved;
            return Ok(false);
        }
        if self.eat_punct(":") && self.skip_type(false, false).is_err() {
            self.pos = saved;
            return Ok(false);
        }
        if !self.eat_punct("=>") {
            self.pos = saved;
            return Ok(false);
        }

        if self.peek_punct("{") {
            self.parse_block()?;
        } else {
            self.parse_assignment()?;
        }
        Ok(true)
    }

    fn parse_conditional(&mut self) -> Result<Expr, Diagnostic> {
        let start = self.token_start();
        let condition = self.parse_binary(1)?;
        if !self.eat_punct("?") {
            return Ok(condition);
        }
        self.parse_assignment()?;
        self.expect_punct(":")?;
        self.parse_assignment()?;
        Ok(self.other_expr("ConditionalExpression", start))
    }

    /// The binary operator at the next token, with its source length.
    fn peek_binary_operator(&self) -> Option<(usize, BinaryOp, u8)> {
        let at = self.token_start();
        if let Some(word) = self.word_at(at) {
            return match word {
                "instanceof" => Some((word.len(), BinaryOp::InstanceOf, 7)),
                "in" => Some((word.len(), BinaryOp::In, 7)),
                _ => None,
            };
        }
        let rest = &self.input[at..];
        // Assignment operators share prefixes with binary ones.
        if ASSIGNMENT_OPERATORS
            .iter()
            .any(|(token, _)| rest.starts_with(token) && *token != "=")
            || rest.starts_with("=>")
        {
            return None;
        }
        BINARY_PRECEDENCE
            .iter()
            .filter(|(token, _, _)| rest.starts_with(token))
            .max_by_key(|(token, _, _)| token.len())
            .map(|(token, op, prec)| (token.len(), *op, *prec))
    }

    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, Diagnostic> {
        let start = self.token_start();
        let mut left = self.parse_unary()?;

        loop {
            // `x as T` / `x satisfies T` bind at the relational level.
            if min_prec <= 7
                && !self.newline_before_next()
                && matches!(self.peek_word(), Some("as") | Some("satisfies"))
            {
                let name = if self.peek_keyword("as") {
                    "AsExpression"
                } else {
                    "SatisfiesExpression"
                };
                self.parse_word()?;
                self.skip_type(false, false)?;
                left = self.other_expr(name, start);
                continue;
            }

            let (len, op, prec) = match self.peek_binary_operator() {
                Some(found) if found.2 >= min_prec => found,
                _ => break,
            };
            self.pos = self.token_start() + len;

            // `**` is right-associative.
            let next_min = if op == BinaryOp::Exp { prec } else { prec + 1 };
            let right = self.parse_binary(next_min)?;
            left = Expr {
                kind: ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span: self.span_from(start),
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, Diagnostic> {
        let start = self.token_start();

        let op = match self.punct_at(start) {
            Some("!") => Some((1, UnaryOp::Not)),
            Some("-") => Some((1, UnaryOp::Minus)),
            Some("+") => Some((1, UnaryOp::Plus)),
            Some("~") => Some((1, UnaryOp::BitNot)),
            Some("++") => Some((2, UnaryOp::PreIncrement)),
            Some("--") => Some((2, UnaryOp::PreDecrement)),
            _ => match self.word_at(start) {
                Some("typeof") => Some((6, UnaryOp::TypeOf)),
                Some("void") => Some((4, UnaryOp::Void)),
                Some("delete") => Some((6, UnaryOp::Delete)),
                _ => None,
            },
        };

        if let Some((len, op)) = op {
            self.pos = start + len;
            let operand = self.parse_unary()?;
            return Ok(Expr {
                kind: ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span: self.span_from(start),
            });
        }

        if self.peek_keyword("await") && self.peek_second_word_or_operand() {
            self.parse_word()?;
            self.parse_unary()?;
            return Ok(self.other_expr("AwaitExpression", start));
        }

        // `<T>expr` type assertion
        if self.peek_punct("<") {
            self.skip_balanced('<', '>')?;
            self.parse_unary()?;
            return Ok(self.other_expr("TypeAssertionExpression", start));
        }

        self.parse_postfix()
    }

    fn peek_second_word_or_operand(&self) -> bool {
        let at = self.token_start();
        match self.word_at(at) {
            Some(word) => {
                let next = self.ws_end(at + word.len());
                next < self.input.len()
                    && !matches!(
                        self.punct_at(next),
                        Some(";") | Some(")") | Some("]") | Some("}") | Some(",") | Some("=")
                            | Some(".")
                    )
            }
            None => false,
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, Diagnostic> {
        let start = self.token_start();
        let expression = self.parse_left_hand_side()?;
        if !self.newline_before_next() && (self.peek_punct("++") || self.peek_punct("--")) {
            self.pos = self.token_start() + 2;
            return Ok(self.other_expr("PostfixUnaryExpression", start));
        }
        Ok(expression)
    }

    /// Member accesses, index accesses and calls on a primary expression.
    fn parse_left_hand_side(&mut self) -> Result<Expr, Diagnostic> {
        let start = self.token_start();

        let mut expression = if self.eat_keyword("new") {
            if self.eat_punct(".") {
                self.parse_word()?;
            } else {
                self.parse_primary()?;
                while self.eat_punct(".") {
                    self.parse_word()?;
                }
                if self.peek_punct("(") {
                    self.parse_arguments()?;
                }
            }
            self.other_expr("NewExpression", start)
        } else {
            self.parse_primary()?
        };

        loop {
            if self.eat_punct(".") || self.eat_optional_dot() {
                let private = self.eat_punct("#");
                let property = self.parse_word()?;
                expression = Expr {
                    kind: ExprKind::Member {
                        object: Box::new(expression),
                        property,
                        private,
                    },
                    span: self.span_from(start),
                };
            } else if self.eat_punct("?.") || self.peek_punct("[") {
                if self.eat_punct("(") {
                    self.pos -= 1;
                    let args = self.parse_arguments()?;
                    expression = self.call(expression, args, start);
                    continue;
                }
                self.expect_punct("[")?;
                let index = self.parse_expression()?;
                self.expect_punct("]")?;
                expression = Expr {
                    kind: ExprKind::Index {
                        object: Box::new(expression),
                        index: Box::new(index),
                    },
                    span: self.span_from(start),
                };
            } else if self.peek_punct("(") {
                let args = self.parse_arguments()?;
                expression = self.call(expression, args, start);
            } else if self.peek_punct("!") && !self.peek_punct("!=") && !self.newline_before_next()
            {
                // Non-null assertion: no runtime meaning.
                self.expect_punct("!")?;
            } else if self.peek_char_after_ws() == Some('`') {
                self.skip_ws();
                self.parse_template()?;
                expression = self.other_expr("TaggedTemplateExpression", start);
            } else {
                break;
            }
        }

        Ok(expression)
    }

    fn call(&self, callee: Expr, args: Vec<Expr>, start: usize) -> Expr {
        Expr {
            kind: ExprKind::Call {
                callee: Box::new(callee),
                args,
                returns: ReturnKind::Unknown,
            },
            span: self.span_from(start),
        }
    }

    /// `?.name` (but not `?.[` or `?.(`, handled by the caller).
    fn eat_optional_dot(&mut self) -> bool {
        let at = self.token_start();
        if self.punct_at(at) != Some("?.") {
            return false;
        }
        let next = self.ws_end(at + 2);
        if self.word_at(next).is_some() || self.input[next..].starts_with('#') {
            self.pos = at + 2;
            true
        } else {
            false
        }
    }

    fn peek_char_after_ws(&self) -> Option<char> {
        self.input[self.token_start()..].chars().next()
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>, Diagnostic> {
        self.expect_punct("(")?;
        let mut args = Vec::new();
        while !self.eat_punct(")") {
            let start = self.token_start();
            if self.eat_punct("...") {
                self.parse_assignment()?;
                args.push(self.other_expr("SpreadElement", start));
            } else {
                args.push(self.parse_assignment()?);
            }
            if !self.eat_punct(",") {
                self.expect_punct(")")?;
                break;
            }
        }
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr, Diagnostic> {
        self.skip_ws();
        let start = self.pos;

        let ch = match self.peek_char() {
            Some(ch) => ch,
            None => return Err(self.error_point("Unexpected end of input".to_string())),
        };

        let kind = match ch {
            '0'..='9' => self.parse_number()?,
            '.' if self.remaining()[1..].starts_with(|c: char| c.is_ascii_digit()) => {
                self.parse_number()?
            }
            '"' | '\'' => ExprKind::String(self.parse_string_literal()?),
            '`' => self.parse_template()?,
            '(' => {
                self.advance(1);
                let inner = self.parse_expression()?;
                self.expect_punct(")")?;
                ExprKind::Paren(Box::new(inner))
            }
            '[' => self.parse_array_literal()?,
            '{' => self.parse_object_literal()?,
            '/' => {
                self.skip_regex()?;
                ExprKind::Other("RegularExpressionLiteral")
            }
            _ => match self.word_at(start) {
                Some("this") => {
                    self.advance(4);
                    ExprKind::This
                }
                Some("true") => {
                    self.advance(4);
                    ExprKind::Bool(true)
                }
                Some("false") => {
                    self.advance(5);
                    ExprKind::Bool(false)
                }
                Some("null") => {
                    self.advance(4);
                    ExprKind::Other("NullKeyword")
                }
                Some("super") => {
                    self.advance(5);
                    ExprKind::Other("SuperKeyword")
                }
                Some("function") => {
                    self.parse_function(Vec::new(), start)?;
                    ExprKind::Other("FunctionExpression")
                }
                Some("class") => {
                    self.skip_class()?;
                    ExprKind::Other("ClassExpression")
                }
                Some(_) => ExprKind::Identifier(self.parse_identifier()?),
                None => {
                    return Err(self.error_point(format!("Unexpected character '{}'", ch)));
                }
            },
        };

        Ok(Expr {
            kind,
            span: self.span_from(start),
        })
    }

    fn skip_regex(&mut self) -> Result<(), Diagnostic> {
        let begin = self.pos;
        self.advance(1);
        let mut in_class = false;
        loop {
            match self.peek_char() {
                None | Some('\n') => {
                    return Err(self.error_span(
                        "Unterminated regular expression".to_string(),
                        begin,
                        self.pos,
                    ))
                }
                Some('\\') => {
                    self.advance(1);
                    if let Some(ch) = self.peek_char() {
                        self.advance(ch.len_utf8());
                    }
                }
                Some(ch) => {
                    self.advance(ch.len_utf8());
                    match ch {
                        '[' => in_class = true,
                        ']' => in_class = false,
                        '/' if !in_class => break,
                        _ => {}
                    }
                }
            }
        }
        while matches!(self.peek_char(), Some(ch) if ch.is_ascii_alphabetic()) {
            self.advance(1);
        }
        Ok(())
    }

    fn parse_array_literal(&mut self) -> Result<ExprKind, Diagnostic> {
        self.expect_punct("[")?;
        let mut elements = Vec::new();
        loop {
            if self.eat_punct("]") {
                break;
            }
            let start = self.token_start();
            if self.eat_punct(",") {
                elements.push(self.other_expr("OmittedExpression", start));
                continue;
            }
            if self.eat_punct("...") {
                self.parse_assignment()?;
                elements.push(self.other_expr("SpreadElement", start));
            } else {
                elements.push(self.parse_assignment()?);
            }
            if !self.eat_punct(",") {
                self.expect_punct("]")?;
                break;
            }
        }
        Ok(ExprKind::Array(elements))
    }

    fn parse_object_literal(&mut self) -> Result<ExprKind, Diagnostic> {
        self.expect_punct("{")?;
        let mut members = Vec::new();
        loop {
            if self.eat_punct("}") {
                break;
            }
            members.push(self.parse_object_member()?);
            if !self.eat_punct(",") {
                self.expect_punct("}")?;
                break;
            }
        }
        Ok(ExprKind::Object(members))
    }

    fn parse_object_member(&mut self) -> Result<ObjectMember, Diagnostic> {
        let start = self.token_start();

        if self.eat_punct("...") {
            self.parse_assignment()?;
            return Ok(ObjectMember::Other {
                kind: "SpreadAssignment",
                span: self.span_from(start),
            });
        }

        // `get x() {}`, `set x(v) {}`, `async x() {}`, `*x() {}`
        let accessor = match self.peek_word() {
            Some(word @ ("get" | "set" | "async"))
                if !matches!(
                    self.punct_after_word(),
                    Some(":") | Some("(") | Some(",") | Some("}") | Some("=") | Some("<")
                ) =>
            {
                Some(word)
            }
            _ => None,
        };
        if let Some(word) = accessor {
            self.parse_word()?;
            self.eat_punct("*");
            self.parse_property_name()?;
            self.skip_method_rest()?;
            return Ok(ObjectMember::Other {
                kind: match word {
                    "get" => "GetAccessor",
                    "set" => "SetAccessor",
                    _ => "MethodDeclaration",
                },
                span: self.span_from(start),
            });
        }
        if self.eat_punct("*") {
            self.parse_property_name()?;
            self.skip_method_rest()?;
            return Ok(ObjectMember::Other {
                kind: "MethodDeclaration",
                span: self.span_from(start),
            });
        }

        let name = self.parse_property_name()?;

        if self.eat_punct(":") {
            let value = self.parse_assignment()?;
            return Ok(ObjectMember::Property {
                name,
                value,
                span: self.span_from(start),
            });
        }

        if self.peek_punct("(") || self.peek_punct("<") {
            self.skip_method_rest()?;
            return Ok(ObjectMember::Other {
                kind: "MethodDeclaration",
                span: self.span_from(start),
            });
        }

        match name {
            PropertyName::Identifier(ident) => {
                if self.eat_punct("=") {
                    self.parse_assignment()?;
                    return Ok(ObjectMember::Other {
                        kind: "ShorthandPropertyAssignment",
                        span: self.span_from(start),
                    });
                }
                Ok(ObjectMember::Shorthand(ident))
            }
            other => Err(self.error_span(
                "Expected ':' after the property name".to_string(),
                other.span().start,
                other.span().end,
            )),
        }
    }

    /// Parameters, optional return type and body of a method.
    fn skip_method_rest(&mut self) -> Result<(), Diagnostic> {
        if self.peek_punct("<") {
            self.skip_balanced('<', '>')?;
        }
        self.parse_parameters()?;
        if self.eat_punct(":") {
            self.skip_type(true, false)?;
        }
        self.parse_block()?;
        Ok(())
    }

    fn parse_property_name(&mut self) -> Result<PropertyName, Diagnostic> {
        self.skip_ws();
        let start = self.pos;
        match self.peek_char() {
            Some('"') | Some('\'') => {
                let value = self.parse_string_literal()?;
                Ok(PropertyName::String(value, self.span_from(start)))
            }
            Some(ch) if ch.is_ascii_digit() || ch == '.' => {
                self.parse_number()?;
                let text = self.input[start..self.pos].to_string();
                Ok(PropertyName::Number(text, self.span_from(start)))
            }
            Some('[') => {
                self.advance(1);
                let key = self.parse_assignment()?;
                self.expect_punct("]")?;
                Ok(PropertyName::Computed(Box::new(key), self.span_from(start)))
            }
            Some('#') => {
                self.advance(1);
                let name = self.parse_word()?;
                Ok(PropertyName::Private(name.name, self.span_from(start)))
            }
            _ => self.parse_word().map(PropertyName::Identifier),
        }
    }

    // ── Numbers ─────────────────────────────────────────────────────

    /// Scan a numeric literal and keep its source text; conversion happens
    /// during lowering so malformed text can be reported there.
    fn parse_number(&mut self) -> Result<ExprKind, Diagnostic> {
        let start = self.pos;

        let radix_prefix = ["0x", "0X", "0o", "0O", "0b", "0B"]
            .iter()
            .any(|prefix| self.starts_with(prefix));

        if radix_prefix {
            self.advance(2);
            while matches!(self.peek_char(), Some(ch) if ch.is_ascii_alphanumeric() || ch == '_')
            {
                self.advance(1);
            }
        } else {
            self.consume_digits();
            if self.peek_char() == Some('.') {
                self.advance(1);
                self.consume_digits();
            }
            if let Some('e' | 'E') = self.peek_char() {
                self.advance(1);
                if let Some('+' | '-') = self.peek_char() {
                    self.advance(1);
                }
                let exp_start = self.pos;
                self.consume_digits();
                if self.pos == exp_start {
                    return Err(self.error_span(
                        "Expected exponent digits".to_string(),
                        start,
                        self.pos,
                    ));
                }
            }
        }

        if self.eat_char('n') {
            return Ok(ExprKind::Other("BigIntLiteral"));
        }

        if let Some(ch) = self.peek_char() {
            if is_id_start(ch) {
                return Err(self.error_span(
                    "An identifier cannot immediately follow a numeric literal".to_string(),
                    start,
                    self.pos + ch.len_utf8(),
                ));
            }
        }

        Ok(ExprKind::Number(self.input[start..self.pos].to_string()))
    }

    fn consume_digits(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_digit() || ch == '_' {
                self.advance(1);
            } else {
                break;
            }
        }
    }

    // ── Strings ─────────────────────────────────────────────────────

    fn peek_string_start(&self) -> bool {
        matches!(self.peek_char_after_ws(), Some('"') | Some('\''))
    }

    /// Parse a single- or double-quoted string and return its cooked value.
    fn parse_string_literal(&mut self) -> Result<String, Diagnostic> {
        self.skip_ws();
        let begin = self.pos;
        let quote = match self.peek_char() {
            Some(quote @ ('"' | '\'')) => quote,
            _ => return Err(self.error_point("Expected a string".to_string())),
        };
        self.advance(1);
        let mut result = String::new();
        loop {
            match self.peek_char() {
                None | Some('\r') | Some('\n') => {
                    return Err(self.error_span(
                        "Unterminated string".to_string(),
                        begin,
                        self.pos,
                    ));
                }
                Some('\\') => {
                    self.advance(1);
                    self.parse_escape_char(&mut result)?;
                }
                Some(ch) => {
                    self.advance(ch.len_utf8());
                    if ch == quote {
                        return Ok(result);
                    }
                    result.push(ch);
                }
            }
        }
    }

    /// Parse a template literal: `head${expr}literal${expr}literal`.
    fn parse_template(&mut self) -> Result<ExprKind, Diagnostic> {
        let begin = self.pos;
        if !self.eat_char('`') {
            return Err(self.error_point("Expected '`'".to_string()));
        }

        let mut head = String::new();
        let mut parts: Vec<TemplatePart> = Vec::new();
        let mut text = String::new();

        loop {
            match self.peek_char() {
                None => {
                    return Err(self.error_span(
                        "Unterminated template literal".to_string(),
                        begin,
                        self.pos,
                    ));
                }
                Some('`') => {
                    self.advance(1);
                    break;
                }
                Some('\\') => {
                    self.advance(1);
                    self.parse_escape_char(&mut text)?;
                }
                Some('$') if self.starts_with("${") => {
                    self.advance(2);
                    let finished = std::mem::take(&mut text);
                    match parts.last_mut() {
                        Some(part) => part.literal = finished,
                        None => head = finished,
                    }
                    let expression = self.parse_expression()?;
                    self.expect_punct("}")?;
                    parts.push(TemplatePart {
                        expression,
                        literal: String::new(),
                    });
                }
                Some('\r') if self.starts_with("\r\n") => {
                    // Template text normalizes line endings.
                    self.advance(2);
                    text.push('\n');
                }
                Some(ch) => {
                    self.advance(ch.len_utf8());
                    text.push(ch);
                }
            }
        }

        match parts.last_mut() {
            Some(part) => part.literal = text,
            None => head = text,
        }

        Ok(ExprKind::Template { head, parts })
    }

    fn parse_escape_char(&mut self, out: &mut String) -> Result<(), Diagnostic> {
        let begin = self.pos.saturating_sub(1);
        match self.peek_char() {
            None => Err(self.error_point("Unterminated escape sequence".to_string())),
            Some('b') => {
                self.advance(1);
                out.push('\u{0008}');
                Ok(())
            }
            Some('f') => {
                self.advance(1);
                out.push('\u{000C}');
                Ok(())
            }
            Some('n') => {
                self.advance(1);
                out.push('\n');
                Ok(())
            }
            Some('r') => {
                self.advance(1);
                out.push('\r');
                Ok(())
            }
            Some('t') => {
                self.advance(1);
                out.push('\t');
                Ok(())
            }
            Some('v') => {
                self.advance(1);
                out.push('\u{000B}');
                Ok(())
            }
            Some('0') if !matches!(self.remaining()[1..].chars().next(), Some('0'..='9')) => {
                self.advance(1);
                out.push('\0');
                Ok(())
            }
            Some('\r') => {
                // Line continuation
                self.advance(1);
                self.eat_char('\n');
                Ok(())
            }
            Some('\n') => {
                self.advance(1);
                Ok(())
            }
            Some('x') => {
                self.advance(1);
                let code_point = self.parse_hex_digits(2, begin)?;
                self.push_code_point(out, code_point, begin)
            }
            Some('u') => {
                self.advance(1);
                let code_point = if self.eat_char('{') {
                    let start = self.pos;
                    while matches!(self.peek_char(), Some(ch) if ch.is_ascii_hexdigit()) {
                        self.advance(1);
                    }
                    let hex = &self.input[start..self.pos];
                    if hex.is_empty() || !self.eat_char('}') {
                        return Err(self.error_span(
                            "Expected hex digits in \\u{...}".to_string(),
                            begin,
                            self.pos,
                        ));
                    }
                    u32::from_str_radix(hex, 16).map_err(|_| {
                        self.error_span(format!("Invalid hex in \\u escape: {}", hex), begin, self.pos)
                    })?
                } else {
                    self.parse_hex_digits(4, begin)?
                };
                self.push_code_point(out, code_point, begin)
            }
            Some(ch) => {
                // Passthrough: \x -> x
                self.advance(ch.len_utf8());
                out.push(ch);
                Ok(())
            }
        }
    }

    fn parse_hex_digits(&mut self, count: usize, begin: usize) -> Result<u32, Diagnostic> {
        let start = self.pos;
        for _ in 0..count {
            match self.peek_char() {
                Some(ch) if ch.is_ascii_hexdigit() => self.advance(1),
                _ => {
                    return Err(self.error_span(
                        format!("Expected {} hex digits in escape sequence", count),
                        begin,
                        self.pos,
                    ))
                }
            }
        }
        let hex = &self.input[start..self.pos];
        u32::from_str_radix(hex, 16).map_err(|_| {
            self.error_span(format!("Invalid hex in escape: {}", hex), begin, self.pos)
        })
    }

    fn push_code_point(
        &self,
        out: &mut String,
        code_point: u32,
        begin: usize,
    ) -> Result<(), Diagnostic> {
        match char::from_u32(code_point) {
            Some(ch) => {
                out.push(ch);
                Ok(())
            }
            None => Err(self.error_span(
                format!("Invalid unicode code point: {:X}", code_point),
                begin,
                self.pos,
            )),
        }
    }
}

fn is_id_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '$' || (!ch.is_ascii() && ch.is_alphabetic())
}

fn is_id_continue(ch: char) -> bool {
    is_id_start(ch) || ch.is_ascii_digit() || (!ch.is_ascii() && ch.is_alphanumeric())
}
