use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ambient;
use crate::ast::{self, Binding, ExprKind, HelperKind, ReturnKind, SourceFile, Span, StatementKind};
use crate::error::{Diagnostic, DiagnosticKind};
use crate::vtl::*;

/// The service a template is written for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    #[default]
    Appsync,
    Apigateway,
}

impl Target {
    /// The variable `this` stands for.
    pub fn receiver(self) -> &'static str {
        match self {
            Target::Appsync => "ctx",
            Target::Apigateway => "context",
        }
    }
}

const DISCARD: &str = "discard";
const TEMPORARY_PREFIX: &str = "local_";

/// Lower every exported function of a module.
///
/// Imports and type declarations are skipped. A body-less overload
/// signature is skipped when an implementation with the same name follows.
pub fn transpile(
    module: &ast::Module,
    source: &SourceFile,
    target: Target,
) -> (Vec<File>, Vec<Diagnostic>) {
    let mut files = Vec::new();
    let mut diagnostics = Vec::new();

    for (index, item) in module.items.iter().enumerate() {
        match item {
            ast::Item::Import(_) | ast::Item::TypeDeclaration { .. } => {}
            ast::Item::Statement(statement) => diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::NotImplementedSyntax,
                    format!(
                        "Syntax {} not implemented under the top level",
                        statement.kind.syntax_name()
                    ),
                )
                .at(source.location(statement.span)),
            ),
            ast::Item::Function(function) => {
                if function.body.is_none() && has_implementation(&module.items[index + 1..], function)
                {
                    continue;
                }
                let (file, function_diagnostics) = lower_function(function, source, target);
                files.extend(file);
                diagnostics.extend(function_diagnostics);
            }
        }
    }

    (files, diagnostics)
}

fn has_implementation(rest: &[ast::Item], signature: &ast::FunctionDeclaration) -> bool {
    let name = signature.name.as_ref().map(|ident| ident.name.as_str());
    rest.iter().any(|item| match item {
        ast::Item::Function(function) => {
            function.body.is_some()
                && function.name.as_ref().map(|ident| ident.name.as_str()) == name
        }
        _ => false,
    })
}

/// Lower one function declaration into a template.
///
/// Never fails outright: problems are returned as diagnostics, and any
/// diagnostic means the returned file must not be used.
pub fn lower_function(
    function: &ast::FunctionDeclaration,
    source: &SourceFile,
    target: Target,
) -> (Option<File>, Vec<Diagnostic>) {
    let mut context = FunctionContext::new(source, target);
    let file = context.function(function);
    (file, context.diagnostics)
}

/// Per-function lowering state: temporary counter, prelude flags and the
/// diagnostics collected so far.
///
/// Lowering methods return `None` once they have reported a diagnostic.
/// Directives that must run before a lowered expression are appended to a
/// `hoisted` list supplied by the enclosing statement.
struct FunctionContext<'a> {
    source: &'a SourceFile,
    target: Target,
    counter: usize,
    esc: bool,
    string_class: bool,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> FunctionContext<'a> {
    fn new(source: &'a SourceFile, target: Target) -> Self {
        FunctionContext {
            source,
            target,
            counter: 0,
            esc: false,
            string_class: false,
            diagnostics: Vec::new(),
        }
    }

    // ── Diagnostics ─────────────────────────────────────────────────

    fn report(&mut self, kind: DiagnosticKind, message: String, span: Span) {
        debug!(code = kind.code(), %message, "diagnostic");
        let diagnostic = Diagnostic::new(kind, message).at(self.source.location(span));
        self.diagnostics.push(diagnostic);
    }

    fn unsupported(&mut self, syntax: &str, context: &str, span: Span) {
        self.report(
            DiagnosticKind::UnsupportedSyntax,
            format!("Syntax {} not supported{}", syntax, with_context(context)),
            span,
        );
    }

    fn not_implemented(&mut self, syntax: &str, context: &str, span: Span) {
        self.report(
            DiagnosticKind::NotImplementedSyntax,
            format!("Syntax {} not implemented{}", syntax, with_context(context)),
            span,
        );
    }

    fn structural(&mut self, message: &str, span: Span) {
        self.report(DiagnosticKind::StructuralError, message.to_string(), span);
    }

    // ── Functions ───────────────────────────────────────────────────

    fn function(&mut self, function: &ast::FunctionDeclaration) -> Option<File> {
        let name = function
            .name
            .as_ref()
            .map(|ident| ident.name.clone())
            .unwrap_or_else(|| "default".to_string());
        debug!(function = %name, target = ?self.target, "lowering function");

        if !function.has_modifier(ast::Modifier::Export) {
            self.structural(
                "Function without the export modifier not supported yet",
                function.span,
            );
            return None;
        }
        if function
            .modifiers
            .iter()
            .any(|m| !matches!(m, ast::Modifier::Export | ast::Modifier::Default))
        {
            self.structural(
                "Function with modifiers except the export modifier and the default modifier, not supported",
                function.span,
            );
            return None;
        }
        if function.generator {
            self.structural("Generator function not supported", function.span);
            return None;
        }
        let body = match &function.body {
            Some(body) => body,
            None => {
                self.structural("Function requires the body", function.span);
                return None;
            }
        };

        let mut elements = Vec::new();
        self.statements(&body.statements, &mut elements);

        let mut block = Block::new(elements, Some(body.span));
        block.prepend(self.prelude());

        Some(File {
            name,
            block,
            origin: Some(function.span),
        })
    }

    /// Directives the function needs before anything else: the quote escape
    /// map first, then the string-utility class.
    fn prelude(&self) -> Vec<BlockElement> {
        let mut elements = Vec::new();

        if self.esc {
            debug!("adding quote escape prelude");
            let quote = StringLiteral {
                value: "\"".to_string(),
                quote: QuoteKind::Single,
                origin: None,
            };
            elements.push(
                SetDirective {
                    target: LeftHandSide::Variable(variable("esc")),
                    value: Expression::Literal(Literal::Map(MapLiteral {
                        properties: vec![PropertyAssignment {
                            name: Value::Literal(Literal::String(StringLiteral::new("q", None))),
                            initializer: Value::Literal(Literal::String(quote)),
                            origin: None,
                        }],
                        origin: None,
                    })),
                    origin: None,
                }
                .into(),
            );
            elements.push(BlockElement::NewLine);
        }

        if self.string_class {
            debug!("adding string class prelude");
            elements.push(
                SetDirective {
                    target: LeftHandSide::Variable(variable(ambient::STRING_CLASS)),
                    value: Expression::Literal(Literal::String(StringLiteral::new("", None))),
                    origin: None,
                }
                .into(),
            );
            if let Some(class) = PropertyNotation::chain(ambient::STRING_CLASS, &["class"], None) {
                elements.push(
                    SetDirective {
                        target: LeftHandSide::Variable(variable(ambient::STRING_CLASS)),
                        value: Expression::PropertyNotation(class).into_reference_or_self(),
                        origin: None,
                    }
                    .into(),
                );
            }
            elements.push(BlockElement::NewLine);
        }

        elements
    }

    /// A fresh `local_N` variable.
    fn temporary(&mut self, origin: Origin) -> VariableReference {
        let name = format!("{}{}", TEMPORARY_PREFIX, self.counter);
        self.counter += 1;
        debug!(%name, "allocated temporary");
        VariableReference::new(Identifier::new(name, origin))
    }

    /// Materialize an expression into a temporary and return its reference.
    fn hoist(&mut self, expression: Expression, hoisted: &mut Vec<BlockElement>) -> Reference {
        let origin = expression.origin();
        let temporary = self.temporary(origin);
        hoisted.push(
            SetDirective {
                target: LeftHandSide::Variable(temporary.clone()),
                value: expression,
                origin,
            }
            .into(),
        );
        Reference::Variable(temporary)
    }

    // ── Statements ──────────────────────────────────────────────────

    fn statements(&mut self, statements: &[ast::Statement], out: &mut Vec<BlockElement>) {
        for statement in statements {
            self.statement(statement, out);
        }
    }

    fn statement(&mut self, statement: &ast::Statement, out: &mut Vec<BlockElement>) {
        for _ in 1..statement.leading_newlines {
            out.push(BlockElement::NewLine);
        }

        match &statement.kind {
            StatementKind::Block(block) => self.statements(&block.statements, out),
            StatementKind::Expression(expression) => self.expression_statement(expression, out),
            StatementKind::If { .. } => {
                let mut hoisted = Vec::new();
                let directive = self.if_directive(statement, &mut hoisted);
                out.extend(hoisted);
                if let Some(directive) = directive {
                    out.push(Directive::If(directive).into());
                }
            }
            StatementKind::ForOf {
                initializer,
                iterable,
                body,
            } => self.for_of(initializer, iterable, body, statement.span, out),
            StatementKind::Return(value) => self.return_statement(value.as_ref(), out),
            StatementKind::Variable(variable) => self.variable_statement(variable, out),
            StatementKind::Other(kind) => {
                self.not_implemented(kind, "in the statement", statement.span);
                out.push(BlockElement::Text(TextNode {
                    text: format!("## {}\n", kind),
                    origin: Some(statement.span),
                }));
            }
        }
    }

    /// A statement in branch position, as its own block.
    fn branch(&mut self, statement: &ast::Statement) -> Block {
        let mut elements = Vec::new();
        self.statement(statement, &mut elements);
        Block::new(elements, Some(statement.span))
    }

    fn expression_statement(&mut self, expression: &ast::Expr, out: &mut Vec<BlockElement>) {
        let mut hoisted = Vec::new();

        match &expression.kind {
            ExprKind::Assign { op, target, value } => {
                self.assignment(*op, target, value, expression.span, &mut hoisted);
                out.extend(hoisted);
                return;
            }
            ExprKind::Binary { op, .. } => {
                self.report(
                    DiagnosticKind::UnsupportedSyntax,
                    format!(
                        "Operator {} not supported for VTL in the expression statement",
                        op.token_name()
                    ),
                    expression.span,
                );
                return;
            }
            _ => {}
        }

        let lowered = match self.expression(expression, &mut hoisted) {
            Some(lowered) => lowered,
            None => {
                out.extend(hoisted);
                return;
            }
        };

        let reference = match lowered.into_reference() {
            Ok(reference) => reference,
            Err(_) => {
                self.not_implemented(
                    expression.kind.syntax_name(),
                    "in the expression statement",
                    expression.span,
                );
                out.extend(hoisted);
                return;
            }
        };
        out.extend(hoisted);

        let void_call = matches!(
            expression.kind,
            ExprKind::Call {
                returns: ReturnKind::Void,
                ..
            }
        );

        match reference {
            Reference::Method(method) if !void_call => self.discard(method, out),
            reference => {
                out.push(BlockElement::Reference(reference));
                out.push(BlockElement::NewLine);
            }
        }
    }

    /// Evaluate a call for its side effect without printing its result.
    fn discard(&mut self, method: MethodReference, out: &mut Vec<BlockElement>) {
        let origin = method.origin;
        match self.target {
            Target::Appsync => {
                let quiet = PropertyNotation::chain("util", &["qr"], origin).map(|callee| {
                    MethodReference {
                        call: CallExpression {
                            callee,
                            arguments: vec![Value::Reference(Reference::Method(method))],
                            origin,
                        },
                        origin,
                    }
                });
                if let Some(quiet) = quiet {
                    out.push(BlockElement::Reference(Reference::Method(quiet)));
                    out.push(BlockElement::NewLine);
                }
            }
            Target::Apigateway => {
                // `#set` already ends its line.
                out.push(
                    SetDirective {
                        target: LeftHandSide::Variable(variable(DISCARD)),
                        value: Expression::Reference(Reference::Method(method)),
                        origin,
                    }
                    .into(),
                );
            }
        }
    }

    /// Lowers `if`/`else if`/`else` chains into one directive. Directives
    /// hoisted by any condition of the chain are emitted before it.
    fn if_directive(
        &mut self,
        statement: &ast::Statement,
        hoisted: &mut Vec<BlockElement>,
    ) -> Option<IfDirective> {
        let (condition, then_branch, else_branch) = match &statement.kind {
            StatementKind::If {
                condition,
                then_branch,
                else_branch,
            } => (condition, then_branch, else_branch),
            _ => return None,
        };

        let lowered_condition = self
            .expression(condition, hoisted)
            .map(Expression::into_reference_or_self);
        let then_block = self.branch(then_branch);

        let mut else_if_clauses = Vec::new();
        let mut else_clause = None;
        let mut else_failed = false;

        if let Some(else_branch) = else_branch {
            if let StatementKind::If { .. } = else_branch.kind {
                match self.if_directive(else_branch, hoisted) {
                    Some(nested) => {
                        else_if_clauses.push(nested.if_clause);
                        else_if_clauses.extend(nested.else_if_clauses);
                        else_clause = nested.else_clause;
                    }
                    None => else_failed = true,
                }
            } else {
                else_clause = Some(self.branch(else_branch));
            }
        }

        let condition = lowered_condition?;
        if else_failed {
            return None;
        }

        Some(IfDirective {
            if_clause: ConditionAndBlock {
                condition,
                block: then_block,
                origin: Some(then_branch.span),
            },
            else_if_clauses,
            else_clause,
            origin: Some(statement.span),
        })
    }

    fn for_of(
        &mut self,
        initializer: &ast::ForOfInitializer,
        iterable: &ast::Expr,
        body: &ast::Statement,
        span: Span,
        out: &mut Vec<BlockElement>,
    ) {
        let declaration = match initializer {
            ast::ForOfInitializer::Declaration(declaration) => declaration,
            ast::ForOfInitializer::Expression(expression) => {
                self.structural(
                    "The initializer of the for-of statement is not variable declaration",
                    expression.span,
                );
                return;
            }
        };

        let mut prefix = Vec::new();
        let variable = match &declaration.name {
            ast::BindingName::Identifier(ident) => {
                self.identifier_text(&ident.name, ident.span).map(VariableReference::new)
            }
            ast::BindingName::Array { elements, span } => {
                self.entry_binding(elements, *span, &mut prefix)
            }
            ast::BindingName::Object { span, .. } => {
                self.structural(
                    "The binding of the for-of statement must be an identifier or a [key, value] array",
                    *span,
                );
                None
            }
        };

        let mut hoisted = Vec::new();
        let iterable = self.value(iterable, &mut hoisted);

        let mut block = self.branch(body);
        block.prepend(prefix);

        out.extend(hoisted);
        if let (Some(variable), Some(iterable)) = (variable, iterable) {
            out.push(
                Directive::Foreach(ForeachDirective {
                    variable,
                    iterable,
                    block,
                    origin: Some(span),
                })
                .into(),
            );
        }
    }

    /// `for (const [key, value] of map.entrySet())`: loop over a hidden entry
    /// variable and bind the two names from its key and value.
    fn entry_binding(
        &mut self,
        elements: &[Option<ast::BindingName>],
        span: Span,
        prefix: &mut Vec<BlockElement>,
    ) -> Option<VariableReference> {
        if elements.len() != 2 {
            self.structural(
                "The array binding of the for-of statement must have 2 elements",
                span,
            );
            return None;
        }

        let mut names = Vec::new();
        for element in elements {
            match element {
                Some(ast::BindingName::Identifier(ident)) => names.push(ident),
                _ => {
                    self.structural(
                        "The array binding of the for-of statement must have identifiers",
                        span,
                    );
                    return None;
                }
            }
        }

        let entry = self.temporary(Some(span));

        for (ident, property) in names.into_iter().zip(["key", "value"]) {
            let target = self.identifier_text(&ident.name, ident.span)?;
            let value = PropertyNotation::new(
                NotationBase::Identifier(entry.name.clone()),
                Identifier::new(property, Some(ident.span)),
                Some(ident.span),
            );
            prefix.push(
                SetDirective {
                    target: LeftHandSide::Variable(VariableReference::new(target)),
                    value: Expression::PropertyNotation(value).into_reference_or_self(),
                    origin: Some(ident.span),
                }
                .into(),
            );
        }
        prefix.push(BlockElement::NewLine);

        Some(entry)
    }

    fn return_statement(&mut self, value: Option<&ast::Expr>, out: &mut Vec<BlockElement>) {
        let expression = match value {
            Some(expression) => expression,
            None => return,
        };

        let mut hoisted = Vec::new();
        let value = self.value(expression, &mut hoisted);

        if !hoisted.is_empty() {
            out.extend(hoisted);
            out.push(BlockElement::NewLine);
        }
        if let Some(value) = value {
            out.push(value.into());
        }
    }

    fn variable_statement(
        &mut self,
        statement: &ast::VariableStatement,
        out: &mut Vec<BlockElement>,
    ) {
        for declaration in &statement.declarations {
            let initializer = match &declaration.initializer {
                Some(initializer) => initializer,
                None => continue,
            };

            let ident = match &declaration.name {
                ast::BindingName::Identifier(ident) => ident,
                other => {
                    self.structural("Destructuring not implemented", other.span());
                    continue;
                }
            };

            let mut hoisted = Vec::new();
            let target = self.identifier_text(&ident.name, ident.span);
            let value = self
                .expression(initializer, &mut hoisted)
                .map(Expression::into_reference_or_self);

            out.extend(hoisted);
            if let (Some(target), Some(value)) = (target, value) {
                out.push(
                    SetDirective {
                        target: LeftHandSide::Variable(VariableReference::new(target)),
                        value,
                        origin: Some(declaration.span),
                    }
                    .into(),
                );
            }
        }
    }

    // ── Expressions ─────────────────────────────────────────────────

    /// Lower an expression in a position that needs a literal or a
    /// reference, hoisting anything else into a temporary.
    fn value(&mut self, expression: &ast::Expr, hoisted: &mut Vec<BlockElement>) -> Option<Value> {
        let lowered = self.expression(expression, hoisted)?;
        Some(match lowered.into_value() {
            Ok(value) => value,
            Err(other) => Value::Reference(self.hoist(other, hoisted)),
        })
    }

    /// Lower the object of a notation or the receiver of a method call.
    fn notation_base(
        &mut self,
        expression: &ast::Expr,
        hoisted: &mut Vec<BlockElement>,
    ) -> Option<NotationBase> {
        let lowered = self.expression(expression, hoisted)?;
        Some(match lowered.into_notation_base() {
            Ok(base) => base,
            Err(other) => match self.hoist(other, hoisted) {
                Reference::Variable(temporary) => NotationBase::Identifier(temporary.name),
                _ => return None,
            },
        })
    }

    fn expression(
        &mut self,
        expression: &ast::Expr,
        hoisted: &mut Vec<BlockElement>,
    ) -> Option<Expression> {
        let origin = Some(expression.span);

        match &expression.kind {
            ExprKind::Identifier(ident) => self.identifier(ident),
            ExprKind::This => Some(Expression::Identifier(Identifier::new(
                self.target.receiver(),
                origin,
            ))),
            ExprKind::Number(text) => match parse_numeric(text) {
                Some(value) => Some(Expression::Literal(Literal::Numeric(NumericLiteral {
                    value,
                    origin,
                }))),
                None => {
                    self.report(
                        DiagnosticKind::UnsupportedSyntax,
                        format!("Invalid numeric text {}", text),
                        expression.span,
                    );
                    None
                }
            },
            ExprKind::String(value) => Some(Expression::Literal(Literal::String(
                StringLiteral::quoted(value, origin),
            ))),
            ExprKind::Bool(value) => Some(Expression::Literal(Literal::Boolean(BooleanLiteral {
                value: *value,
                origin,
            }))),
            ExprKind::Template { head, parts } => {
                let head = self.escape_quotes(head);
                let spans: Vec<Option<TemplateSpan>> = parts
                    .iter()
                    .map(|part| {
                        let value = self.value(&part.expression, hoisted)?;
                        Some(TemplateSpan {
                            expression: value,
                            literal: self.escape_quotes(&part.literal),
                            origin: Some(part.expression.span),
                        })
                    })
                    .collect();
                let spans = spans.into_iter().collect::<Option<Vec<_>>>()?;
                Some(Expression::Literal(Literal::Template(TemplateLiteral {
                    head,
                    spans,
                    origin,
                })))
            }
            ExprKind::Array(elements) => {
                let elements = self.values(elements, hoisted)?;
                Some(Expression::Literal(Literal::List(ListLiteral {
                    elements,
                    origin,
                })))
            }
            ExprKind::Object(members) => self.object(members, origin, hoisted),
            ExprKind::Paren(inner) => {
                let inner = self.expression(inner, hoisted)?.into_reference_or_self();
                Some(Expression::Parenthesized(ParenthesizedExpression {
                    expression: Box::new(inner),
                    origin,
                }))
            }
            ExprKind::Unary { op, operand } => {
                let operator = match op {
                    ast::UnaryOp::Not => PrefixUnaryOperator::Exclamation,
                    ast::UnaryOp::Minus => PrefixUnaryOperator::Minus,
                    other => {
                        self.report(
                            DiagnosticKind::UnsupportedSyntax,
                            format!("Operator {} not supported in VTL", other.token_name()),
                            expression.span,
                        );
                        return None;
                    }
                };
                let operand = self.expression(operand, hoisted)?.into_reference_or_self();
                Some(Expression::PrefixUnary(PrefixUnaryExpression {
                    operator,
                    operand: Box::new(operand),
                    origin,
                }))
            }
            ExprKind::Binary { op, left, right } => {
                let operator = match binary_operator(*op) {
                    Some(operator) => operator,
                    None => {
                        self.unsupported(op.token_name(), "in the binary expression", expression.span);
                        return None;
                    }
                };
                let left = self.expression(left, hoisted).map(Expression::into_reference_or_self);
                let right = self.expression(right, hoisted).map(Expression::into_reference_or_self);
                Some(Expression::Binary(BinaryExpression {
                    left: Box::new(left?),
                    operator,
                    right: Box::new(right?),
                    origin,
                }))
            }
            ExprKind::Assign { op, target, value } => self
                .assignment(*op, target, value, expression.span, hoisted)
                .map(Expression::Reference),
            ExprKind::Member {
                object,
                property,
                private,
            } => {
                if *private {
                    self.unsupported("PrivateIdentifier", "in the property access", property.span);
                    return None;
                }
                let base = self.notation_base(object, hoisted);
                let name = self.identifier_text(&property.name, property.span);
                Some(Expression::PropertyNotation(PropertyNotation::new(
                    base?, name?, origin,
                )))
            }
            ExprKind::Index { object, index } => {
                let base = self.notation_base(object, hoisted);
                let index = self.value(index, hoisted);
                Some(Expression::IndexNotation(IndexNotation {
                    base: base?,
                    index: Box::new(index?),
                    origin,
                }))
            }
            ExprKind::Call { callee, args, .. } => self.call(callee, args, expression.span, hoisted),
            ExprKind::Other(kind) => {
                self.not_implemented(kind, "in the expression", expression.span);
                None
            }
        }
    }

    /// Lower every element, reporting all failures before giving up.
    fn values(&mut self, elements: &[ast::Expr], hoisted: &mut Vec<BlockElement>) -> Option<Vec<Value>> {
        let values: Vec<Option<Value>> = elements
            .iter()
            .map(|element| self.value(element, hoisted))
            .collect();
        values.into_iter().collect()
    }

    fn identifier(&mut self, ident: &ast::Ident) -> Option<Expression> {
        let origin = Some(ident.span);

        if self.target == Target::Appsync && ident.binding == Binding::Parameter {
            // `id` is `ctx.arguments.id` in a resolver template.
            let name = self.identifier_text(&ident.name, ident.span)?;
            return PropertyNotation::chain("ctx", &["arguments", name.text.as_str()], origin)
                .map(Expression::PropertyNotation);
        }

        if let Binding::Helper(symbol) = &ident.binding {
            if symbol.kind == HelperKind::StringUtility {
                self.string_class = true;
            }
        }

        self.identifier_text(&ident.name, ident.span)
            .map(Expression::Identifier)
    }

    /// A VTL identifier from source text; a leading `$` is dropped.
    fn identifier_text(&mut self, text: &str, span: Span) -> Option<Identifier> {
        if !is_valid_identifier(text) {
            self.report(
                DiagnosticKind::InvalidIdentifier,
                format!("The identifier '{}' is an invalid name for VTL", text),
                span,
            );
            return None;
        }
        let name = text.strip_prefix('$').unwrap_or(text);
        Some(Identifier::new(name, Some(span)))
    }

    fn escape_quotes(&mut self, text: &str) -> String {
        if !text.contains('"') {
            return text.to_string();
        }
        self.esc = true;
        text.replace('"', "${esc.q}")
    }

    fn assignment(
        &mut self,
        op: ast::AssignOp,
        target: &ast::Expr,
        value: &ast::Expr,
        span: Span,
        hoisted: &mut Vec<BlockElement>,
    ) -> Option<Reference> {
        let operator = match op {
            ast::AssignOp::Assign => None,
            ast::AssignOp::AddAssign => Some(BinaryOperator::Plus),
            ast::AssignOp::SubAssign => Some(BinaryOperator::Minus),
            ast::AssignOp::MulAssign => Some(BinaryOperator::Asterisk),
            ast::AssignOp::DivAssign => Some(BinaryOperator::Slash),
            ast::AssignOp::RemAssign => Some(BinaryOperator::Percent),
            ast::AssignOp::Other(token) => {
                self.report(
                    DiagnosticKind::UnsupportedSyntax,
                    format!("Operator {} not supported for VTL in the assignment", token),
                    span,
                );
                return None;
            }
        };

        let left = self.expression(target, hoisted);
        let right = self
            .expression(value, hoisted)
            .map(Expression::into_reference_or_self);

        let left = match left?.into_reference().map(Reference::into_left_hand_side) {
            Ok(Ok(left)) => left,
            _ => {
                self.unsupported(
                    target.kind.syntax_name(),
                    "for left of the assignment operator",
                    target.span,
                );
                return None;
            }
        };
        let right = right?;

        let value = match operator {
            None => right,
            Some(operator) => Expression::Binary(BinaryExpression {
                left: Box::new(Expression::Reference(left.clone().into())),
                operator,
                right: Box::new(right),
                origin: Some(span),
            }),
        };

        hoisted.push(
            SetDirective {
                target: left.clone(),
                value,
                origin: Some(span),
            }
            .into(),
        );

        Some(left.into())
    }

    fn call(
        &mut self,
        callee: &ast::Expr,
        args: &[ast::Expr],
        span: Span,
        hoisted: &mut Vec<BlockElement>,
    ) -> Option<Expression> {
        let origin = Some(span);

        match &callee.kind {
            ExprKind::Identifier(ident) => {
                let symbol = match &ident.binding {
                    Binding::Helper(symbol) => symbol,
                    _ => {
                        self.unsupported("Identifier", "in the call expression", callee.span);
                        return None;
                    }
                };

                if symbol.export == ambient::RANGE_HELPER {
                    return self.range(args, span, hoisted);
                }

                // Receiver-first helper: `add(list, x)` is `list.add(x)`.
                let (receiver, rest) = match args.split_first() {
                    Some(split) => split,
                    None => {
                        self.structural(
                            "Arguments require at least one for calling the function",
                            span,
                        );
                        return None;
                    }
                };
                let base = self.notation_base(receiver, hoisted);
                let name = self.identifier_text(&symbol.export, ident.span);
                let arguments = self.values(rest, hoisted);
                Some(Expression::Call(CallExpression {
                    callee: PropertyNotation::new(base?, name?, Some(callee.span)),
                    arguments: arguments?,
                    origin,
                }))
            }
            ExprKind::Member { .. } => {
                let callee_expression = self.expression(callee, hoisted);
                let arguments = self.values(args, hoisted);
                match callee_expression? {
                    Expression::PropertyNotation(notation) => Some(Expression::Call(CallExpression {
                        callee: notation,
                        arguments: arguments?,
                        origin,
                    })),
                    other => {
                        self.unsupported(
                            &other.kind().to_string(),
                            "in the call expression",
                            callee.span,
                        );
                        None
                    }
                }
            }
            other => {
                self.unsupported(other.syntax_name(), "in the call expression", callee.span);
                None
            }
        }
    }

    /// `Range(a, b)` is the range literal `[a..b]`.
    fn range(
        &mut self,
        args: &[ast::Expr],
        span: Span,
        hoisted: &mut Vec<BlockElement>,
    ) -> Option<Expression> {
        let begin = match args.first() {
            Some(begin) => self.range_bound(begin, "begin", hoisted),
            None => {
                self.structural("Missing begin value of Range", span);
                return None;
            }
        };
        let end = match args.get(1) {
            Some(end) => self.range_bound(end, "end", hoisted),
            None => {
                self.structural("Missing end value of Range", span);
                None
            }
        };
        Some(Expression::Literal(Literal::Range(RangeLiteral {
            begin: begin?,
            end: end?,
            origin: Some(span),
        })))
    }

    /// A bound is a number or a reference; computed bounds are hoisted.
    fn range_bound(
        &mut self,
        expression: &ast::Expr,
        which: &str,
        hoisted: &mut Vec<BlockElement>,
    ) -> Option<RangeBound> {
        match self.value(expression, hoisted)? {
            Value::Literal(Literal::Numeric(numeric)) => Some(RangeBound::Numeric(numeric)),
            Value::Reference(reference) => Some(RangeBound::Reference(reference)),
            Value::Literal(_) => {
                self.structural(
                    &format!("The {} value of Range must be a number or a reference", which),
                    expression.span,
                );
                None
            }
        }
    }

    fn object(
        &mut self,
        members: &[ast::ObjectMember],
        origin: Origin,
        hoisted: &mut Vec<BlockElement>,
    ) -> Option<Expression> {
        let properties: Vec<Option<PropertyAssignment>> = members
            .iter()
            .map(|member| self.object_member(member, hoisted))
            .collect();
        let properties = properties.into_iter().collect::<Option<Vec<_>>>()?;
        Some(Expression::Literal(Literal::Map(MapLiteral {
            properties,
            origin,
        })))
    }

    fn object_member(
        &mut self,
        member: &ast::ObjectMember,
        hoisted: &mut Vec<BlockElement>,
    ) -> Option<PropertyAssignment> {
        match member {
            ast::ObjectMember::Shorthand(ident) => {
                let origin = Some(ident.span);
                let name = Value::Literal(Literal::String(StringLiteral::new(
                    ident.name.clone(),
                    origin,
                )));
                let initializer = match self.identifier(ident)?.into_value() {
                    Ok(value) => value,
                    Err(other) => Value::Reference(self.hoist(other, hoisted)),
                };
                Some(PropertyAssignment {
                    name,
                    initializer,
                    origin,
                })
            }
            ast::ObjectMember::Property { name, value, span } => {
                let origin = Some(*span);
                let name = match name {
                    ast::PropertyName::Identifier(ident) => Some(Value::Literal(Literal::String(
                        StringLiteral::new(ident.name.clone(), Some(ident.span)),
                    ))),
                    ast::PropertyName::String(text, span) => Some(Value::Literal(
                        Literal::String(StringLiteral::quoted(text, Some(*span))),
                    )),
                    ast::PropertyName::Number(text, span) => match parse_numeric(text) {
                        Some(value) => Some(Value::Literal(Literal::Numeric(NumericLiteral {
                            value,
                            origin: Some(*span),
                        }))),
                        None => {
                            self.report(
                                DiagnosticKind::UnsupportedSyntax,
                                format!("Invalid numeric text {}", text),
                                *span,
                            );
                            None
                        }
                    },
                    ast::PropertyName::Computed(_, span) => {
                        self.not_implemented("ComputedPropertyName", "for the property name", *span);
                        None
                    }
                    ast::PropertyName::Private(_, span) => {
                        self.unsupported("PrivateIdentifier", "for the property name", *span);
                        None
                    }
                };
                let initializer = self.value(value, hoisted);
                Some(PropertyAssignment {
                    name: name?,
                    initializer: initializer?,
                    origin,
                })
            }
            ast::ObjectMember::Other { kind, span } => {
                self.not_implemented(kind, "in the object literal", *span);
                None
            }
        }
    }
}

fn with_context(context: &str) -> String {
    if context.is_empty() {
        String::new()
    } else {
        format!(" {}", context)
    }
}

fn variable(name: &str) -> VariableReference {
    VariableReference::new(Identifier::new(name, None))
}

/// Strict and loose comparisons print the same; VTL has only one equality.
fn binary_operator(op: ast::BinaryOp) -> Option<BinaryOperator> {
    use ast::BinaryOp::*;
    Some(match op {
        Add => BinaryOperator::Plus,
        Sub => BinaryOperator::Minus,
        Mul => BinaryOperator::Asterisk,
        Div => BinaryOperator::Slash,
        Rem => BinaryOperator::Percent,
        Eq | StrictEq => BinaryOperator::EqualsEquals,
        NotEq | StrictNotEq => BinaryOperator::ExclamationEquals,
        Lt => BinaryOperator::LessThan,
        LtEq => BinaryOperator::LessThanEquals,
        Gt => BinaryOperator::GreaterThan,
        GtEq => BinaryOperator::GreaterThanEquals,
        And => BinaryOperator::AmpersandAmpersand,
        Or => BinaryOperator::BarBar,
        _ => return None,
    })
}

/// The value of numeric literal text: decimal with optional fraction and
/// exponent, or `0x`/`0o`/`0b` integers, with `_` separators.
pub fn parse_numeric(text: &str) -> Option<f64> {
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();
    let radix = match cleaned.get(..2).map(|prefix| prefix.to_ascii_lowercase()) {
        Some(prefix) if prefix == "0x" => Some(16),
        Some(prefix) if prefix == "0o" => Some(8),
        Some(prefix) if prefix == "0b" => Some(2),
        _ => None,
    };
    match radix {
        Some(radix) => u64::from_str_radix(&cleaned[2..], radix)
            .ok()
            .map(|value| value as f64),
        None => cleaned.parse::<f64>().ok().filter(|value| value.is_finite()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_text() {
        assert_eq!(parse_numeric("42"), Some(42.0));
        assert_eq!(parse_numeric("1_000"), Some(1000.0));
        assert_eq!(parse_numeric("0x1F"), Some(31.0));
        assert_eq!(parse_numeric("0o17"), Some(15.0));
        assert_eq!(parse_numeric("0b101"), Some(5.0));
        assert_eq!(parse_numeric(".5"), Some(0.5));
        assert_eq!(parse_numeric("1e3"), Some(1000.0));
        assert_eq!(parse_numeric("0x"), None);
        assert_eq!(parse_numeric("0b2"), None);
    }

    #[test]
    fn receivers_per_target() {
        assert_eq!(Target::Appsync.receiver(), "ctx");
        assert_eq!(Target::Apigateway.receiver(), "context");
    }
}
