/// Source syntax tree produced by the parser and annotated by the resolver.
/// Covers the TypeScript subset that mapping-template functions are written in.
use crate::error::{Location, Position};

/// A half-open byte range `start..end` into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// The smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A source text together with its path, answering position lookups.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: String,
    pub text: String,
    line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        SourceFile {
            path: path.into(),
            text,
            line_starts,
        }
    }

    /// Line and column of a byte offset.
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.text.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let line_start = self.line_starts[line];
        let column = self.text[line_start..offset].chars().count();
        Position {
            line,
            column,
            offset,
        }
    }

    pub fn location(&self, span: Span) -> Location {
        Location {
            file: self.path.clone(),
            begin: self.position(span.start),
            end: self.position(span.end),
        }
    }
}

// ── Module level ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Import(ImportDeclaration),
    Function(FunctionDeclaration),
    /// `interface` / `type` declarations carry no runtime behavior.
    TypeDeclaration { span: Span },
    /// Any other top-level statement.
    Statement(Statement),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDeclaration {
    pub module: String,
    pub specifiers: Vec<ImportSpecifier>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportSpecifier {
    /// `import { imported as local }`
    Named { imported: String, local: String },
    /// `import local from "..."`
    Default { local: String },
    /// `import * as local from "..."`
    Namespace { local: String },
}

impl ImportSpecifier {
    pub fn local(&self) -> &str {
        match self {
            ImportSpecifier::Named { local, .. }
            | ImportSpecifier::Default { local }
            | ImportSpecifier::Namespace { local } => local,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Export,
    Default,
    Async,
    Declare,
}

impl Modifier {
    pub fn as_str(self) -> &'static str {
        match self {
            Modifier::Export => "export",
            Modifier::Default => "default",
            Modifier::Async => "async",
            Modifier::Declare => "declare",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub name: Option<Ident>,
    pub modifiers: Vec<Modifier>,
    pub params: Vec<Parameter>,
    /// `None` for overload signatures and `declare function`.
    pub body: Option<Block>,
    pub generator: bool,
    pub span: Span,
}

impl FunctionDeclaration {
    pub fn has_modifier(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: BindingName,
    /// The `this: Context` pseudo parameter.
    pub is_this: bool,
    pub span: Span,
}

// ── Statements ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub span: Span,
    /// Newlines in the whitespace and comments before this statement.
    pub leading_newlines: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    Block(Block),
    Expression(Expr),
    If {
        condition: Expr,
        then_branch: Box<Statement>,
        else_branch: Option<Box<Statement>>,
    },
    ForOf {
        initializer: ForOfInitializer,
        iterable: Expr,
        body: Box<Statement>,
    },
    Return(Option<Expr>),
    Variable(VariableStatement),
    /// A statement the front end recognizes but the lowering does not
    /// translate, named by its TypeScript syntax kind (`WhileStatement`, ...).
    Other(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForOfInitializer {
    Declaration(VariableDeclaration),
    Expression(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Const,
    Let,
    Var,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableStatement {
    pub kind: DeclarationKind,
    pub declarations: Vec<VariableDeclaration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub name: BindingName,
    pub initializer: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BindingName {
    Identifier(Ident),
    /// `[a, , b]`; `None` marks a hole.
    Array {
        elements: Vec<Option<BindingName>>,
        span: Span,
    },
    Object {
        properties: Vec<BindingName>,
        span: Span,
    },
}

impl BindingName {
    pub fn span(&self) -> Span {
        match self {
            BindingName::Identifier(ident) => ident.span,
            BindingName::Array { span, .. } | BindingName::Object { span, .. } => *span,
        }
    }

    /// Every identifier this binding introduces, in source order.
    pub fn identifiers_mut(&mut self) -> Vec<&mut Ident> {
        let mut out = Vec::new();
        collect_binding_idents(self, &mut out);
        out
    }
}

fn collect_binding_idents<'a>(name: &'a mut BindingName, out: &mut Vec<&'a mut Ident>) {
    match name {
        BindingName::Identifier(ident) => out.push(ident),
        BindingName::Array { elements, .. } => {
            for element in elements.iter_mut().flatten() {
                collect_binding_idents(element, out);
            }
        }
        BindingName::Object { properties, .. } => {
            for property in properties {
                collect_binding_idents(property, out);
            }
        }
    }
}

// ── Expressions ─────────────────────────────────────────────────────

/// What an identifier reference was resolved to.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Binding {
    #[default]
    Unresolved,
    Parameter,
    Local,
    /// Declared by one of the helper libraries.
    Helper(HelperSymbol),
}

/// A symbol exported from a helper-library module.
#[derive(Debug, Clone, PartialEq)]
pub struct HelperSymbol {
    pub module: String,
    pub export: String,
    pub kind: HelperKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelperKind {
    /// A receiver-first collection helper such as `add` or `entrySet`.
    Function,
    /// The string-utility class (`String.join`, `String.format`).
    StringUtility,
    /// A value such as `$util` or `$ctx`.
    Value,
    /// Types and interfaces.
    Type,
}

/// The declared return kind of a call, as far as ambient declarations know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnKind {
    #[default]
    Unknown,
    Void,
    Never,
    Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
    pub binding: Binding,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Ident {
            name: name.into(),
            span,
            binding: Binding::Unresolved,
        }
    }

    pub fn is_helper(&self) -> bool {
        matches!(self.binding, Binding::Helper(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Exp,
    Eq,
    StrictEq,
    NotEq,
    StrictNotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    NullishCoalescing,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UnsignedShr,
    InstanceOf,
    In,
}

impl BinaryOp {
    /// TypeScript token name, used in diagnostics.
    pub fn token_name(self) -> &'static str {
        match self {
            BinaryOp::Add => "PlusToken",
            BinaryOp::Sub => "MinusToken",
            BinaryOp::Mul => "AsteriskToken",
            BinaryOp::Div => "SlashToken",
            BinaryOp::Rem => "PercentToken",
            BinaryOp::Exp => "AsteriskAsteriskToken",
            BinaryOp::Eq => "EqualsEqualsToken",
            BinaryOp::StrictEq => "EqualsEqualsEqualsToken",
            BinaryOp::NotEq => "ExclamationEqualsToken",
            BinaryOp::StrictNotEq => "ExclamationEqualsEqualsToken",
            BinaryOp::Lt => "LessThanToken",
            BinaryOp::LtEq => "LessThanEqualsToken",
            BinaryOp::Gt => "GreaterThanToken",
            BinaryOp::GtEq => "GreaterThanEqualsToken",
            BinaryOp::And => "AmpersandAmpersandToken",
            BinaryOp::Or => "BarBarToken",
            BinaryOp::NullishCoalescing => "QuestionQuestionToken",
            BinaryOp::BitAnd => "AmpersandToken",
            BinaryOp::BitOr => "BarToken",
            BinaryOp::BitXor => "CaretToken",
            BinaryOp::Shl => "LessThanLessThanToken",
            BinaryOp::Shr => "GreaterThanGreaterThanToken",
            BinaryOp::UnsignedShr => "GreaterThanGreaterThanGreaterThanToken",
            BinaryOp::InstanceOf => "InstanceOfKeyword",
            BinaryOp::In => "InKeyword",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    RemAssign,
    /// `**=`, `&&=`, `||=`, `??=`, `&=`, `|=`, `^=`, `<<=`, `>>=`, `>>>=`
    Other(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Minus,
    Plus,
    BitNot,
    TypeOf,
    Void,
    Delete,
    PreIncrement,
    PreDecrement,
}

impl UnaryOp {
    pub fn token_name(self) -> &'static str {
        match self {
            UnaryOp::Not => "ExclamationToken",
            UnaryOp::Minus => "MinusToken",
            UnaryOp::Plus => "PlusToken",
            UnaryOp::BitNot => "TildeToken",
            UnaryOp::TypeOf => "TypeOfKeyword",
            UnaryOp::Void => "VoidKeyword",
            UnaryOp::Delete => "DeleteKeyword",
            UnaryOp::PreIncrement => "PlusPlusToken",
            UnaryOp::PreDecrement => "MinusMinusToken",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplatePart {
    pub expression: Expr,
    /// Cooked text following the `${...}` up to the next one or the end.
    pub literal: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyName {
    Identifier(Ident),
    String(String, Span),
    Number(String, Span),
    Computed(Box<Expr>, Span),
    Private(String, Span),
}

impl PropertyName {
    pub fn span(&self) -> Span {
        match self {
            PropertyName::Identifier(ident) => ident.span,
            PropertyName::String(_, span)
            | PropertyName::Number(_, span)
            | PropertyName::Computed(_, span)
            | PropertyName::Private(_, span) => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectMember {
    /// `{ name }`
    Shorthand(Ident),
    /// `{ name: value }`
    Property {
        name: PropertyName,
        value: Expr,
        span: Span,
    },
    /// Spreads, methods and accessors, named by syntax kind.
    Other { kind: &'static str, span: Span },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Identifier(Ident),
    This,
    /// Numeric literal source text.
    Number(String),
    /// Cooked string value.
    String(String),
    Bool(bool),
    Template {
        head: String,
        parts: Vec<TemplatePart>,
    },
    Array(Vec<Expr>),
    Object(Vec<ObjectMember>),
    Paren(Box<Expr>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Member {
        object: Box<Expr>,
        property: Ident,
        private: bool,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        returns: ReturnKind,
    },
    /// Anything outside the translatable subset, named by its TypeScript
    /// syntax kind (`ConditionalExpression`, `ArrowFunction`, ...).
    Other(&'static str),
}

impl ExprKind {
    /// TypeScript syntax kind name, used in diagnostics.
    pub fn syntax_name(&self) -> &'static str {
        match self {
            ExprKind::Identifier(_) => "Identifier",
            ExprKind::This => "ThisKeyword",
            ExprKind::Number(_) => "NumericLiteral",
            ExprKind::String(_) => "StringLiteral",
            ExprKind::Bool(true) => "TrueKeyword",
            ExprKind::Bool(false) => "FalseKeyword",
            ExprKind::Template { .. } => "TemplateExpression",
            ExprKind::Array(_) => "ArrayLiteralExpression",
            ExprKind::Object(_) => "ObjectLiteralExpression",
            ExprKind::Paren(_) => "ParenthesizedExpression",
            ExprKind::Unary { .. } => "PrefixUnaryExpression",
            ExprKind::Binary { .. } | ExprKind::Assign { .. } => "BinaryExpression",
            ExprKind::Member { .. } => "PropertyAccessExpression",
            ExprKind::Index { .. } => "ElementAccessExpression",
            ExprKind::Call { .. } => "CallExpression",
            ExprKind::Other(name) => name,
        }
    }
}

impl StatementKind {
    pub fn syntax_name(&self) -> &'static str {
        match self {
            StatementKind::Block(_) => "Block",
            StatementKind::Expression(_) => "ExpressionStatement",
            StatementKind::If { .. } => "IfStatement",
            StatementKind::ForOf { .. } => "ForOfStatement",
            StatementKind::Return(_) => "ReturnStatement",
            StatementKind::Variable(_) => "VariableStatement",
            StatementKind::Other(name) => name,
        }
    }
}
