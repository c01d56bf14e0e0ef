use crate::ast::Span;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// The source construct a node was generated from. Used for diagnostics only.
pub type Origin = Option<Span>;

/// Every kind of VTL node. The reserved directive kinds are never produced
/// by the lowering engine but belong to the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    File,

    SetDirective,
    IfDirective,
    ForeachDirective,
    IncludeDirective,
    ParseDirective,
    StopDirective,
    BreakDirective,
    EvaluateDirective,
    DefineDirective,
    MacroDirective,

    Identifier,
    VariableReference,
    PropertyReference,
    MethodReference,

    Block,
    ConditionAndBlock,

    NumericLiteral,
    StringLiteral,
    TemplateLiteral,
    BooleanLiteral,
    ListLiteral,
    RangeLiteral,
    MapLiteral,
    TextNode,

    PropertyNotation,
    IndexNotation,
    PropertyAssignment,
    CallExpression,
    BinaryExpression,
    PrefixUnaryExpression,
    NewLine,
    TemplateSpan,
    ParenthesizedExpression,
}

impl SyntaxKind {
    pub fn is_directive(self) -> bool {
        matches!(
            self,
            SyntaxKind::SetDirective
                | SyntaxKind::IfDirective
                | SyntaxKind::ForeachDirective
                | SyntaxKind::IncludeDirective
                | SyntaxKind::ParseDirective
                | SyntaxKind::StopDirective
                | SyntaxKind::BreakDirective
                | SyntaxKind::EvaluateDirective
                | SyntaxKind::DefineDirective
                | SyntaxKind::MacroDirective
        )
    }

    pub fn is_reference(self) -> bool {
        matches!(
            self,
            SyntaxKind::VariableReference
                | SyntaxKind::PropertyReference
                | SyntaxKind::MethodReference
        )
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            SyntaxKind::NumericLiteral
                | SyntaxKind::StringLiteral
                | SyntaxKind::TemplateLiteral
                | SyntaxKind::BooleanLiteral
                | SyntaxKind::ListLiteral
                | SyntaxKind::RangeLiteral
                | SyntaxKind::MapLiteral
        )
    }

    /// References and literals are expressions too.
    pub fn is_expression(self) -> bool {
        self.is_reference()
            || self.is_literal()
            || matches!(
                self,
                SyntaxKind::Identifier
                    | SyntaxKind::PropertyNotation
                    | SyntaxKind::IndexNotation
                    | SyntaxKind::CallExpression
                    | SyntaxKind::BinaryExpression
                    | SyntaxKind::PrefixUnaryExpression
                    | SyntaxKind::ParenthesizedExpression
            )
    }
}

impl fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Plus,
    Minus,
    Asterisk,
    Slash,
    Percent,
    EqualsEquals,
    ExclamationEquals,
    LessThan,
    LessThanEquals,
    GreaterThan,
    GreaterThanEquals,
    AmpersandAmpersand,
    BarBar,
}

impl BinaryOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOperator::Plus => "+",
            BinaryOperator::Minus => "-",
            BinaryOperator::Asterisk => "*",
            BinaryOperator::Slash => "/",
            BinaryOperator::Percent => "%",
            BinaryOperator::EqualsEquals => "==",
            BinaryOperator::ExclamationEquals => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanEquals => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanEquals => ">=",
            BinaryOperator::AmpersandAmpersand => "&&",
            BinaryOperator::BarBar => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixUnaryOperator {
    Minus,
    Exclamation,
}

impl PrefixUnaryOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            PrefixUnaryOperator::Minus => "-",
            PrefixUnaryOperator::Exclamation => "!",
        }
    }
}

// ── File & blocks ───────────────────────────────────────────────────

/// One VTL template, generated from one function declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct File {
    /// The name of the function the template was generated from.
    pub name: String,
    pub block: Block,
    pub origin: Origin,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub elements: Vec<BlockElement>,
    pub origin: Origin,
}

impl Block {
    pub fn new(elements: Vec<BlockElement>, origin: Origin) -> Self {
        Block { elements, origin }
    }

    /// Splice `elements` in front of the existing ones.
    pub fn prepend(&mut self, elements: Vec<BlockElement>) {
        self.elements.splice(0..0, elements);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockElement {
    Directive(Directive),
    Reference(Reference),
    Literal(Literal),
    Text(TextNode),
    NewLine,
}

/// Verbatim template text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub text: String,
    pub origin: Origin,
}

// ── Directives ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Set(SetDirective),
    If(IfDirective),
    Foreach(ForeachDirective),
}

/// The target of `#set`: the language cannot assign into a call result.
#[derive(Debug, Clone, PartialEq)]
pub enum LeftHandSide {
    Variable(VariableReference),
    Property(PropertyReference),
}

/// `#set(<target> = <value>)`
#[derive(Debug, Clone, PartialEq)]
pub struct SetDirective {
    pub target: LeftHandSide,
    pub value: Expression,
    pub origin: Origin,
}

/// `#if(...) ... #elseif(...) ... #else ... #end`
#[derive(Debug, Clone, PartialEq)]
pub struct IfDirective {
    pub if_clause: ConditionAndBlock,
    pub else_if_clauses: Vec<ConditionAndBlock>,
    pub else_clause: Option<Block>,
    pub origin: Origin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionAndBlock {
    pub condition: Expression,
    pub block: Block,
    pub origin: Origin,
}

/// `#foreach(<variable> in <iterable>) ... #end`
#[derive(Debug, Clone, PartialEq)]
pub struct ForeachDirective {
    pub variable: VariableReference,
    pub iterable: Value,
    pub block: Block,
    pub origin: Origin,
}

// ── References ──────────────────────────────────────────────────────

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\$?[a-zA-Z][a-zA-Z0-9_-]*$").expect("identifier pattern compiles"));

/// Whether `text` is usable as a VTL identifier. A leading `$` is allowed.
pub fn is_valid_identifier(text: &str) -> bool {
    IDENTIFIER.is_match(text)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub text: String,
    pub origin: Origin,
}

impl Identifier {
    pub fn new(text: impl Into<String>, origin: Origin) -> Self {
        Identifier {
            text: text.into(),
            origin,
        }
    }
}

/// Anything printable as a direct interpolation.
#[derive(Debug, Clone, PartialEq)]
pub enum Reference {
    Variable(VariableReference),
    Property(PropertyReference),
    Method(MethodReference),
}

/// `$name`
#[derive(Debug, Clone, PartialEq)]
pub struct VariableReference {
    pub name: Identifier,
    pub origin: Origin,
}

impl VariableReference {
    pub fn new(name: Identifier) -> Self {
        let origin = name.origin;
        VariableReference { name, origin }
    }
}

/// `${a.b}` or `${a[b]}`
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyReference {
    pub notation: Notation,
    pub origin: Origin,
}

/// `${a.b(c)}`
#[derive(Debug, Clone, PartialEq)]
pub struct MethodReference {
    pub call: CallExpression,
    pub origin: Origin,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notation {
    Property(PropertyNotation),
    Index(IndexNotation),
}

// ── Literals ────────────────────────────────────────────────────────

/// Anything printable as literal VTL syntax.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Numeric(NumericLiteral),
    String(StringLiteral),
    Template(TemplateLiteral),
    Boolean(BooleanLiteral),
    List(ListLiteral),
    Range(RangeLiteral),
    Map(MapLiteral),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumericLiteral {
    pub value: f64,
    pub origin: Origin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuoteKind {
    #[default]
    Double,
    Single,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringLiteral {
    /// Printed verbatim between the quotes.
    pub value: String,
    pub quote: QuoteKind,
    pub origin: Origin,
}

impl StringLiteral {
    pub fn new(value: impl Into<String>, origin: Origin) -> Self {
        StringLiteral {
            value: value.into(),
            quote: QuoteKind::Double,
            origin,
        }
    }

    /// A literal for a decoded source string. Double quotes unless the
    /// text holds `"` and no `'`; otherwise embedded `"` are doubled.
    pub fn quoted(value: &str, origin: Origin) -> Self {
        if value.contains('"') && !value.contains('\'') {
            return StringLiteral {
                value: value.to_string(),
                quote: QuoteKind::Single,
                origin,
            };
        }
        StringLiteral::new(value.replace('"', "\"\""), origin)
    }
}

/// A double-quoted string with interpolations: `"head${a}rest"`.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateLiteral {
    pub head: String,
    pub spans: Vec<TemplateSpan>,
    pub origin: Origin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSpan {
    pub expression: Value,
    /// Text following the interpolation.
    pub literal: String,
    pub origin: Origin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BooleanLiteral {
    pub value: bool,
    pub origin: Origin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListLiteral {
    pub elements: Vec<Value>,
    pub origin: Origin,
}

/// `[begin..end]`
#[derive(Debug, Clone, PartialEq)]
pub struct RangeLiteral {
    pub begin: RangeBound,
    pub end: RangeBound,
    pub origin: Origin,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RangeBound {
    Numeric(NumericLiteral),
    Reference(Reference),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapLiteral {
    pub properties: Vec<PropertyAssignment>,
    pub origin: Origin,
}

/// One `name: initializer` entry of a map literal.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyAssignment {
    pub name: Value,
    pub initializer: Value,
    pub origin: Origin,
}

/// The positions that accept only a literal or a reference: list elements,
/// map entries, call arguments, indices, template spans, `#foreach` subjects.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Literal(Literal),
    Reference(Reference),
}

// ── Expressions ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Identifier(Identifier),
    PropertyNotation(PropertyNotation),
    IndexNotation(IndexNotation),
    Call(CallExpression),
    Binary(BinaryExpression),
    PrefixUnary(PrefixUnaryExpression),
    Parenthesized(ParenthesizedExpression),
    Reference(Reference),
    Literal(Literal),
}

/// What a property or index notation, or a method call, is applied to.
#[derive(Debug, Clone, PartialEq)]
pub enum NotationBase {
    Identifier(Identifier),
    PropertyNotation(Box<PropertyNotation>),
    IndexNotation(Box<IndexNotation>),
    Call(Box<CallExpression>),
}

/// `base.name`
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyNotation {
    pub base: NotationBase,
    pub name: Identifier,
    pub origin: Origin,
}

impl PropertyNotation {
    pub fn new(base: NotationBase, name: Identifier, origin: Origin) -> Self {
        PropertyNotation { base, name, origin }
    }

    /// `a.b.c` from `["a", "b", "c"]`; needs at least two segments.
    pub fn chain(first: &str, rest: &[&str], origin: Origin) -> Option<Self> {
        let (last, middle) = rest.split_last()?;
        let mut base = NotationBase::Identifier(Identifier::new(first, origin));
        for segment in middle {
            base = NotationBase::PropertyNotation(Box::new(PropertyNotation::new(
                base,
                Identifier::new(*segment, origin),
                origin,
            )));
        }
        Some(PropertyNotation::new(base, Identifier::new(*last, origin), origin))
    }
}

/// `base[index]`
#[derive(Debug, Clone, PartialEq)]
pub struct IndexNotation {
    pub base: NotationBase,
    pub index: Box<Value>,
    pub origin: Origin,
}

/// `callee(arguments...)`; the callee is always a method notation.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
    pub callee: PropertyNotation,
    pub arguments: Vec<Value>,
    pub origin: Origin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    pub left: Box<Expression>,
    pub operator: BinaryOperator,
    pub right: Box<Expression>,
    pub origin: Origin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrefixUnaryExpression {
    pub operator: PrefixUnaryOperator,
    pub operand: Box<Expression>,
    pub origin: Origin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParenthesizedExpression {
    pub expression: Box<Expression>,
    pub origin: Origin,
}

// ── Classification ──────────────────────────────────────────────────

impl Expression {
    pub fn kind(&self) -> SyntaxKind {
        NodeRef::from(self).kind()
    }

    pub fn origin(&self) -> Origin {
        match self {
            Expression::Identifier(n) => n.origin,
            Expression::PropertyNotation(n) => n.origin,
            Expression::IndexNotation(n) => n.origin,
            Expression::Call(n) => n.origin,
            Expression::Binary(n) => n.origin,
            Expression::PrefixUnary(n) => n.origin,
            Expression::Parenthesized(n) => n.origin,
            Expression::Reference(n) => n.origin(),
            Expression::Literal(n) => n.origin(),
        }
    }

    /// The interpolation form of identifiers, notations and calls.
    /// Anything else is handed back unchanged.
    pub fn into_reference(self) -> Result<Reference, Expression> {
        match self {
            Expression::Identifier(name) => {
                Ok(Reference::Variable(VariableReference::new(name)))
            }
            Expression::PropertyNotation(notation) => {
                let origin = notation.origin;
                Ok(Reference::Property(PropertyReference {
                    notation: Notation::Property(notation),
                    origin,
                }))
            }
            Expression::IndexNotation(notation) => {
                let origin = notation.origin;
                Ok(Reference::Property(PropertyReference {
                    notation: Notation::Index(notation),
                    origin,
                }))
            }
            Expression::Call(call) => {
                let origin = call.origin;
                Ok(Reference::Method(MethodReference { call, origin }))
            }
            Expression::Reference(reference) => Ok(reference),
            other => Err(other),
        }
    }

    /// References where possible, the expression itself otherwise.
    pub fn into_reference_or_self(self) -> Expression {
        match self.into_reference() {
            Ok(reference) => Expression::Reference(reference),
            Err(expression) => expression,
        }
    }

    /// Literals stay literals, everything reference-like becomes a reference.
    pub fn into_value(self) -> Result<Value, Expression> {
        match self {
            Expression::Literal(literal) => Ok(Value::Literal(literal)),
            other => other.into_reference().map(Value::Reference),
        }
    }

    /// Identifiers, notations and calls can carry a further `.name` or `[index]`.
    pub fn into_notation_base(self) -> Result<NotationBase, Expression> {
        match self {
            Expression::Identifier(n) => Ok(NotationBase::Identifier(n)),
            Expression::PropertyNotation(n) => Ok(NotationBase::PropertyNotation(Box::new(n))),
            Expression::IndexNotation(n) => Ok(NotationBase::IndexNotation(Box::new(n))),
            Expression::Call(n) => Ok(NotationBase::Call(Box::new(n))),
            other => Err(other),
        }
    }
}

impl Reference {
    pub fn origin(&self) -> Origin {
        match self {
            Reference::Variable(n) => n.origin,
            Reference::Property(n) => n.origin,
            Reference::Method(n) => n.origin,
        }
    }

    pub fn into_left_hand_side(self) -> Result<LeftHandSide, Reference> {
        match self {
            Reference::Variable(n) => Ok(LeftHandSide::Variable(n)),
            Reference::Property(n) => Ok(LeftHandSide::Property(n)),
            other => Err(other),
        }
    }
}

impl Literal {
    pub fn origin(&self) -> Origin {
        match self {
            Literal::Numeric(n) => n.origin,
            Literal::String(n) => n.origin,
            Literal::Template(n) => n.origin,
            Literal::Boolean(n) => n.origin,
            Literal::List(n) => n.origin,
            Literal::Range(n) => n.origin,
            Literal::Map(n) => n.origin,
        }
    }
}

impl Value {
    pub fn origin(&self) -> Origin {
        match self {
            Value::Literal(n) => n.origin(),
            Value::Reference(n) => n.origin(),
        }
    }
}

impl From<Reference> for Expression {
    fn from(reference: Reference) -> Self {
        Expression::Reference(reference)
    }
}

impl From<Literal> for Expression {
    fn from(literal: Literal) -> Self {
        Expression::Literal(literal)
    }
}

impl From<Value> for Expression {
    fn from(value: Value) -> Self {
        match value {
            Value::Literal(literal) => Expression::Literal(literal),
            Value::Reference(reference) => Expression::Reference(reference),
        }
    }
}

impl From<LeftHandSide> for Reference {
    fn from(target: LeftHandSide) -> Self {
        match target {
            LeftHandSide::Variable(n) => Reference::Variable(n),
            LeftHandSide::Property(n) => Reference::Property(n),
        }
    }
}

impl From<Directive> for BlockElement {
    fn from(directive: Directive) -> Self {
        BlockElement::Directive(directive)
    }
}

impl From<SetDirective> for BlockElement {
    fn from(directive: SetDirective) -> Self {
        BlockElement::Directive(Directive::Set(directive))
    }
}

impl From<Value> for BlockElement {
    fn from(value: Value) -> Self {
        match value {
            Value::Literal(literal) => BlockElement::Literal(literal),
            Value::Reference(reference) => BlockElement::Reference(reference),
        }
    }
}

// ── Uniform traversal ───────────────────────────────────────────────

/// A borrowed view of any node, for kind-based dispatch and generic walks.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    File(&'a File),
    Block(&'a Block),
    SetDirective(&'a SetDirective),
    IfDirective(&'a IfDirective),
    ConditionAndBlock(&'a ConditionAndBlock),
    ForeachDirective(&'a ForeachDirective),
    Identifier(&'a Identifier),
    VariableReference(&'a VariableReference),
    PropertyReference(&'a PropertyReference),
    MethodReference(&'a MethodReference),
    NumericLiteral(&'a NumericLiteral),
    StringLiteral(&'a StringLiteral),
    TemplateLiteral(&'a TemplateLiteral),
    TemplateSpan(&'a TemplateSpan),
    BooleanLiteral(&'a BooleanLiteral),
    ListLiteral(&'a ListLiteral),
    RangeLiteral(&'a RangeLiteral),
    MapLiteral(&'a MapLiteral),
    PropertyAssignment(&'a PropertyAssignment),
    TextNode(&'a TextNode),
    NewLine,
    PropertyNotation(&'a PropertyNotation),
    IndexNotation(&'a IndexNotation),
    CallExpression(&'a CallExpression),
    BinaryExpression(&'a BinaryExpression),
    PrefixUnaryExpression(&'a PrefixUnaryExpression),
    ParenthesizedExpression(&'a ParenthesizedExpression),
}

impl<'a> NodeRef<'a> {
    pub fn kind(&self) -> SyntaxKind {
        match self {
            NodeRef::File(_) => SyntaxKind::File,
            NodeRef::Block(_) => SyntaxKind::Block,
            NodeRef::SetDirective(_) => SyntaxKind::SetDirective,
            NodeRef::IfDirective(_) => SyntaxKind::IfDirective,
            NodeRef::ConditionAndBlock(_) => SyntaxKind::ConditionAndBlock,
            NodeRef::ForeachDirective(_) => SyntaxKind::ForeachDirective,
            NodeRef::Identifier(_) => SyntaxKind::Identifier,
            NodeRef::VariableReference(_) => SyntaxKind::VariableReference,
            NodeRef::PropertyReference(_) => SyntaxKind::PropertyReference,
            NodeRef::MethodReference(_) => SyntaxKind::MethodReference,
            NodeRef::NumericLiteral(_) => SyntaxKind::NumericLiteral,
            NodeRef::StringLiteral(_) => SyntaxKind::StringLiteral,
            NodeRef::TemplateLiteral(_) => SyntaxKind::TemplateLiteral,
            NodeRef::TemplateSpan(_) => SyntaxKind::TemplateSpan,
            NodeRef::BooleanLiteral(_) => SyntaxKind::BooleanLiteral,
            NodeRef::ListLiteral(_) => SyntaxKind::ListLiteral,
            NodeRef::RangeLiteral(_) => SyntaxKind::RangeLiteral,
            NodeRef::MapLiteral(_) => SyntaxKind::MapLiteral,
            NodeRef::PropertyAssignment(_) => SyntaxKind::PropertyAssignment,
            NodeRef::TextNode(_) => SyntaxKind::TextNode,
            NodeRef::NewLine => SyntaxKind::NewLine,
            NodeRef::PropertyNotation(_) => SyntaxKind::PropertyNotation,
            NodeRef::IndexNotation(_) => SyntaxKind::IndexNotation,
            NodeRef::CallExpression(_) => SyntaxKind::CallExpression,
            NodeRef::BinaryExpression(_) => SyntaxKind::BinaryExpression,
            NodeRef::PrefixUnaryExpression(_) => SyntaxKind::PrefixUnaryExpression,
            NodeRef::ParenthesizedExpression(_) => SyntaxKind::ParenthesizedExpression,
        }
    }

    /// Address of the node in memory; `None` for the payload-free `NewLine`.
    pub fn address(&self) -> Option<usize> {
        fn addr<T>(node: &T) -> Option<usize> {
            Some(node as *const T as usize)
        }
        match *self {
            NodeRef::File(n) => addr(n),
            NodeRef::Block(n) => addr(n),
            NodeRef::SetDirective(n) => addr(n),
            NodeRef::IfDirective(n) => addr(n),
            NodeRef::ConditionAndBlock(n) => addr(n),
            NodeRef::ForeachDirective(n) => addr(n),
            NodeRef::Identifier(n) => addr(n),
            NodeRef::VariableReference(n) => addr(n),
            NodeRef::PropertyReference(n) => addr(n),
            NodeRef::MethodReference(n) => addr(n),
            NodeRef::NumericLiteral(n) => addr(n),
            NodeRef::StringLiteral(n) => addr(n),
            NodeRef::TemplateLiteral(n) => addr(n),
            NodeRef::TemplateSpan(n) => addr(n),
            NodeRef::BooleanLiteral(n) => addr(n),
            NodeRef::ListLiteral(n) => addr(n),
            NodeRef::RangeLiteral(n) => addr(n),
            NodeRef::MapLiteral(n) => addr(n),
            NodeRef::PropertyAssignment(n) => addr(n),
            NodeRef::TextNode(n) => addr(n),
            NodeRef::NewLine => None,
            NodeRef::PropertyNotation(n) => addr(n),
            NodeRef::IndexNotation(n) => addr(n),
            NodeRef::CallExpression(n) => addr(n),
            NodeRef::BinaryExpression(n) => addr(n),
            NodeRef::PrefixUnaryExpression(n) => addr(n),
            NodeRef::ParenthesizedExpression(n) => addr(n),
        }
    }

    /// Direct children in printing order.
    pub fn children(&self) -> Vec<NodeRef<'a>> {
        match *self {
            NodeRef::File(n) => vec![NodeRef::Block(&n.block)],
            NodeRef::Block(n) => n.elements.iter().map(NodeRef::from).collect(),
            NodeRef::SetDirective(n) => vec![NodeRef::from(&n.target), NodeRef::from(&n.value)],
            NodeRef::IfDirective(n) => {
                let mut out = vec![NodeRef::ConditionAndBlock(&n.if_clause)];
                out.extend(n.else_if_clauses.iter().map(NodeRef::ConditionAndBlock));
                out.extend(n.else_clause.iter().map(NodeRef::Block));
                out
            }
            NodeRef::ConditionAndBlock(n) => {
                vec![NodeRef::from(&n.condition), NodeRef::Block(&n.block)]
            }
            NodeRef::ForeachDirective(n) => vec![
                NodeRef::VariableReference(&n.variable),
                NodeRef::from(&n.iterable),
                NodeRef::Block(&n.block),
            ],
            NodeRef::VariableReference(n) => vec![NodeRef::Identifier(&n.name)],
            NodeRef::PropertyReference(n) => vec![NodeRef::from(&n.notation)],
            NodeRef::MethodReference(n) => vec![NodeRef::CallExpression(&n.call)],
            NodeRef::TemplateLiteral(n) => n.spans.iter().map(NodeRef::TemplateSpan).collect(),
            NodeRef::TemplateSpan(n) => vec![NodeRef::from(&n.expression)],
            NodeRef::ListLiteral(n) => n.elements.iter().map(NodeRef::from).collect(),
            NodeRef::RangeLiteral(n) => vec![NodeRef::from(&n.begin), NodeRef::from(&n.end)],
            NodeRef::MapLiteral(n) => n.properties.iter().map(NodeRef::PropertyAssignment).collect(),
            NodeRef::PropertyAssignment(n) => {
                vec![NodeRef::from(&n.name), NodeRef::from(&n.initializer)]
            }
            NodeRef::PropertyNotation(n) => {
                vec![NodeRef::from(&n.base), NodeRef::Identifier(&n.name)]
            }
            NodeRef::IndexNotation(n) => vec![NodeRef::from(&n.base), NodeRef::from(&*n.index)],
            NodeRef::CallExpression(n) => {
                let mut out = vec![NodeRef::PropertyNotation(&n.callee)];
                out.extend(n.arguments.iter().map(NodeRef::from));
                out
            }
            NodeRef::BinaryExpression(n) => vec![NodeRef::from(&*n.left), NodeRef::from(&*n.right)],
            NodeRef::PrefixUnaryExpression(n) => vec![NodeRef::from(&*n.operand)],
            NodeRef::ParenthesizedExpression(n) => vec![NodeRef::from(&*n.expression)],
            NodeRef::Identifier(_)
            | NodeRef::NumericLiteral(_)
            | NodeRef::StringLiteral(_)
            | NodeRef::BooleanLiteral(_)
            | NodeRef::TextNode(_)
            | NodeRef::NewLine => Vec::new(),
        }
    }
}

/// Depth-first pre-order walk over `node` and all its descendants.
pub fn walk<'a>(node: NodeRef<'a>, visit: &mut impl FnMut(NodeRef<'a>)) {
    visit(node);
    for child in node.children() {
        walk(child, visit);
    }
}

macro_rules! node_ref_from {
    ($($ty:ident),* $(,)?) => {
        $(
            impl<'a> From<&'a $ty> for NodeRef<'a> {
                fn from(node: &'a $ty) -> Self {
                    NodeRef::$ty(node)
                }
            }
        )*
    };
}

node_ref_from!(
    File,
    Block,
    SetDirective,
    IfDirective,
    ConditionAndBlock,
    ForeachDirective,
    Identifier,
    VariableReference,
    PropertyReference,
    MethodReference,
    NumericLiteral,
    StringLiteral,
    TemplateLiteral,
    TemplateSpan,
    BooleanLiteral,
    ListLiteral,
    RangeLiteral,
    MapLiteral,
    PropertyAssignment,
    TextNode,
    PropertyNotation,
    IndexNotation,
    BinaryExpression,
    PrefixUnaryExpression,
    ParenthesizedExpression,
);

impl<'a> From<&'a CallExpression> for NodeRef<'a> {
    fn from(node: &'a CallExpression) -> Self {
        NodeRef::CallExpression(node)
    }
}

impl<'a> From<&'a Expression> for NodeRef<'a> {
    fn from(node: &'a Expression) -> Self {
        match node {
            Expression::Identifier(n) => NodeRef::Identifier(n),
            Expression::PropertyNotation(n) => NodeRef::PropertyNotation(n),
            Expression::IndexNotation(n) => NodeRef::IndexNotation(n),
            Expression::Call(n) => NodeRef::CallExpression(n),
            Expression::Binary(n) => NodeRef::BinaryExpression(n),
            Expression::PrefixUnary(n) => NodeRef::PrefixUnaryExpression(n),
            Expression::Parenthesized(n) => NodeRef::ParenthesizedExpression(n),
            Expression::Reference(n) => NodeRef::from(n),
            Expression::Literal(n) => NodeRef::from(n),
        }
    }
}

impl<'a> From<&'a Reference> for NodeRef<'a> {
    fn from(node: &'a Reference) -> Self {
        match node {
            Reference::Variable(n) => NodeRef::VariableReference(n),
            Reference::Property(n) => NodeRef::PropertyReference(n),
            Reference::Method(n) => NodeRef::MethodReference(n),
        }
    }
}

impl<'a> From<&'a Literal> for NodeRef<'a> {
    fn from(node: &'a Literal) -> Self {
        match node {
            Literal::Numeric(n) => NodeRef::NumericLiteral(n),
            Literal::String(n) => NodeRef::StringLiteral(n),
            Literal::Template(n) => NodeRef::TemplateLiteral(n),
            Literal::Boolean(n) => NodeRef::BooleanLiteral(n),
            Literal::List(n) => NodeRef::ListLiteral(n),
            Literal::Range(n) => NodeRef::RangeLiteral(n),
            Literal::Map(n) => NodeRef::MapLiteral(n),
        }
    }
}

impl<'a> From<&'a Value> for NodeRef<'a> {
    fn from(node: &'a Value) -> Self {
        match node {
            Value::Literal(n) => NodeRef::from(n),
            Value::Reference(n) => NodeRef::from(n),
        }
    }
}

impl<'a> From<&'a Directive> for NodeRef<'a> {
    fn from(node: &'a Directive) -> Self {
        match node {
            Directive::Set(n) => NodeRef::SetDirective(n),
            Directive::If(n) => NodeRef::IfDirective(n),
            Directive::Foreach(n) => NodeRef::ForeachDirective(n),
        }
    }
}

impl<'a> From<&'a BlockElement> for NodeRef<'a> {
    fn from(node: &'a BlockElement) -> Self {
        match node {
            BlockElement::Directive(n) => NodeRef::from(n),
            BlockElement::Reference(n) => NodeRef::from(n),
            BlockElement::Literal(n) => NodeRef::from(n),
            BlockElement::Text(n) => NodeRef::TextNode(n),
            BlockElement::NewLine => NodeRef::NewLine,
        }
    }
}

impl<'a> From<&'a LeftHandSide> for NodeRef<'a> {
    fn from(node: &'a LeftHandSide) -> Self {
        match node {
            LeftHandSide::Variable(n) => NodeRef::VariableReference(n),
            LeftHandSide::Property(n) => NodeRef::PropertyReference(n),
        }
    }
}

impl<'a> From<&'a Notation> for NodeRef<'a> {
    fn from(node: &'a Notation) -> Self {
        match node {
            Notation::Property(n) => NodeRef::PropertyNotation(n),
            Notation::Index(n) => NodeRef::IndexNotation(n),
        }
    }
}

impl<'a> From<&'a NotationBase> for NodeRef<'a> {
    fn from(node: &'a NotationBase) -> Self {
        match node {
            NotationBase::Identifier(n) => NodeRef::Identifier(n),
            NotationBase::PropertyNotation(n) => NodeRef::PropertyNotation(n),
            NotationBase::IndexNotation(n) => NodeRef::IndexNotation(n),
            NotationBase::Call(n) => NodeRef::CallExpression(n),
        }
    }
}

impl<'a> From<&'a RangeBound> for NodeRef<'a> {
    fn from(node: &'a RangeBound) -> Self {
        match node {
            RangeBound::Numeric(n) => NodeRef::NumericLiteral(n),
            RangeBound::Reference(n) => NodeRef::from(n),
        }
    }
}
