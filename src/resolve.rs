use std::collections::HashMap;

use tracing::warn;

use crate::ambient;
use crate::ast::*;

/// Binds identifier references and annotates calls with their declared
/// return kind.
///
/// Scoping is lexical: imports and top-level declarations form the module
/// scope, each function adds its parameters and `var` declarations, and
/// every block adds its `let`/`const` declarations. Declarations are visible
/// throughout their scope (no temporal dead zone).
pub fn resolve_module(module: &mut Module) {
    let mut resolver = Resolver { scopes: Vec::new() };
    let mut top = HashMap::new();

    for item in &module.items {
        match item {
            Item::Import(import) => declare_import(&mut top, import),
            Item::Statement(statement) => declare_statement(&mut top, statement, true),
            _ => {}
        }
    }
    resolver.scopes.push(top);

    for item in &mut module.items {
        match item {
            Item::Function(function) => resolver.function(function),
            Item::Statement(statement) => resolver.statement(statement),
            _ => {}
        }
    }
}

type Scope = HashMap<String, Binding>;

struct Resolver {
    scopes: Vec<Scope>,
}

fn declare_import(scope: &mut Scope, import: &ImportDeclaration) {
    if !ambient::is_helper_module(&import.module) {
        return;
    }
    for specifier in &import.specifiers {
        let export = match specifier {
            ImportSpecifier::Named { imported, .. } => imported.as_str(),
            ImportSpecifier::Default { .. } => "default",
            ImportSpecifier::Namespace { .. } => "*",
        };
        if let ImportSpecifier::Named { .. } = specifier {
            let mut known = ambient::exports(&import.module).peekable();
            if known.peek().is_some() && !known.any(|name| name == export) {
                warn!(module = %import.module, export, "import is not declared by the helper module");
            }
        }
        let kind = match specifier {
            ImportSpecifier::Namespace { .. } => HelperKind::Value,
            _ => ambient::export_kind(&import.module, export),
        };
        scope.insert(
            specifier.local().to_string(),
            Binding::Helper(HelperSymbol {
                module: import.module.clone(),
                export: export.to_string(),
                kind,
            }),
        );
    }
}

fn declare_binding(scope: &mut Scope, name: &BindingName, binding: &Binding) {
    match name {
        BindingName::Identifier(ident) => {
            scope.insert(ident.name.clone(), binding.clone());
        }
        BindingName::Array { elements, .. } => {
            for element in elements.iter().flatten() {
                declare_binding(scope, element, binding);
            }
        }
        BindingName::Object { properties, .. } => {
            for property in properties {
                declare_binding(scope, property, binding);
            }
        }
    }
}

/// Declare the names a statement introduces into the current block scope.
/// With `include_var`, `var` declarations count too.
fn declare_statement(scope: &mut Scope, statement: &Statement, include_var: bool) {
    if let StatementKind::Variable(variable) = &statement.kind {
        if variable.kind != DeclarationKind::Var || include_var {
            for declaration in &variable.declarations {
                declare_binding(scope, &declaration.name, &Binding::Local);
            }
        }
    }
}

/// `var` declarations anywhere in a function body are function-scoped.
fn declare_vars(scope: &mut Scope, statements: &[Statement]) {
    for statement in statements {
        match &statement.kind {
            StatementKind::Variable(variable) if variable.kind == DeclarationKind::Var => {
                for declaration in &variable.declarations {
                    declare_binding(scope, &declaration.name, &Binding::Local);
                }
            }
            StatementKind::Block(block) => declare_vars(scope, &block.statements),
            StatementKind::If {
                then_branch,
                else_branch,
                ..
            } => {
                declare_vars(scope, std::slice::from_ref(then_branch.as_ref()));
                if let Some(else_branch) = else_branch {
                    declare_vars(scope, std::slice::from_ref(else_branch.as_ref()));
                }
            }
            StatementKind::ForOf { body, .. } => {
                declare_vars(scope, std::slice::from_ref(body.as_ref()));
            }
            _ => {}
        }
    }
}

impl Resolver {
    fn lookup(&self, name: &str) -> Binding {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .cloned()
            .unwrap_or_default()
    }

    fn function(&mut self, function: &mut FunctionDeclaration) {
        let mut scope = Scope::new();
        for param in &function.params {
            if !param.is_this {
                declare_binding(&mut scope, &param.name, &Binding::Parameter);
            }
        }
        if let Some(body) = &function.body {
            declare_vars(&mut scope, &body.statements);
        }
        self.scopes.push(scope);
        if let Some(body) = &mut function.body {
            self.block(body);
        }
        self.scopes.pop();
    }

    fn block(&mut self, block: &mut Block) {
        let mut scope = Scope::new();
        for statement in &block.statements {
            declare_statement(&mut scope, statement, false);
        }
        self.scopes.push(scope);
        for statement in &mut block.statements {
            self.statement(statement);
        }
        self.scopes.pop();
    }

    fn statement(&mut self, statement: &mut Statement) {
        match &mut statement.kind {
            StatementKind::Block(block) => self.block(block),
            StatementKind::Expression(expression) => self.expression(expression),
            StatementKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.expression(condition);
                self.nested_statement(then_branch);
                if let Some(else_branch) = else_branch {
                    self.nested_statement(else_branch);
                }
            }
            StatementKind::ForOf {
                initializer,
                iterable,
                body,
            } => {
                self.expression(iterable);
                let mut scope = Scope::new();
                match initializer {
                    ForOfInitializer::Declaration(declaration) => {
                        declare_binding(&mut scope, &declaration.name, &Binding::Local);
                        self.scopes.push(scope);
                        self.binding_name(&mut declaration.name);
                    }
                    ForOfInitializer::Expression(expression) => {
                        self.scopes.push(scope);
                        self.expression(expression);
                    }
                }
                self.nested_statement(body);
                self.scopes.pop();
            }
            StatementKind::Return(Some(expression)) => self.expression(expression),
            StatementKind::Return(None) | StatementKind::Other(_) => {}
            StatementKind::Variable(variable) => {
                for declaration in &mut variable.declarations {
                    self.binding_name(&mut declaration.name);
                    if let Some(initializer) = &mut declaration.initializer {
                        self.expression(initializer);
                    }
                }
            }
        }
    }

    /// A single statement in branch position gets its own scope.
    fn nested_statement(&mut self, statement: &mut Statement) {
        let mut scope = Scope::new();
        declare_statement(&mut scope, statement, false);
        self.scopes.push(scope);
        self.statement(statement);
        self.scopes.pop();
    }

    fn binding_name(&mut self, name: &mut BindingName) {
        for ident in name.identifiers_mut() {
            ident.binding = self.lookup(&ident.name);
        }
    }

    fn expression(&mut self, expression: &mut Expr) {
        match &mut expression.kind {
            ExprKind::Identifier(ident) => ident.binding = self.lookup(&ident.name),
            ExprKind::This
            | ExprKind::Number(_)
            | ExprKind::String(_)
            | ExprKind::Bool(_)
            | ExprKind::Other(_) => {}
            ExprKind::Template { parts, .. } => {
                for part in parts {
                    self.expression(&mut part.expression);
                }
            }
            ExprKind::Array(elements) => {
                for element in elements {
                    self.expression(element);
                }
            }
            ExprKind::Object(members) => {
                for member in members {
                    match member {
                        ObjectMember::Shorthand(ident) => {
                            ident.binding = self.lookup(&ident.name);
                        }
                        ObjectMember::Property { name, value, .. } => {
                            if let PropertyName::Computed(key, _) = name {
                                self.expression(key);
                            }
                            self.expression(value);
                        }
                        ObjectMember::Other { .. } => {}
                    }
                }
            }
            ExprKind::Paren(inner) => self.expression(inner),
            ExprKind::Unary { operand, .. } => self.expression(operand),
            ExprKind::Binary { left, right, .. } => {
                self.expression(left);
                self.expression(right);
            }
            ExprKind::Assign { target, value, .. } => {
                self.expression(target);
                self.expression(value);
            }
            ExprKind::Member { object, .. } => self.expression(object),
            ExprKind::Index { object, index } => {
                self.expression(object);
                self.expression(index);
            }
            ExprKind::Call {
                callee,
                args,
                returns,
            } => {
                self.expression(callee);
                for arg in args.iter_mut() {
                    self.expression(arg);
                }
                *returns = call_return_kind(callee, args.len());
            }
        }
    }
}

/// The declared return kind of a call, from the helper declarations.
fn call_return_kind(callee: &Expr, arity: usize) -> ReturnKind {
    let mut path = Vec::new();
    let mut current = callee;
    loop {
        match &current.kind {
            ExprKind::Member {
                object, property, ..
            } => {
                path.push(property.name.as_str());
                current = object;
            }
            ExprKind::Paren(inner) => current = inner,
            ExprKind::Identifier(ident) => {
                let symbol = match &ident.binding {
                    Binding::Helper(symbol) => symbol,
                    _ => return ReturnKind::Unknown,
                };
                if path.is_empty() {
                    return match symbol.kind {
                        HelperKind::Function => ambient::function_return(&symbol.export, arity),
                        _ => ReturnKind::Unknown,
                    };
                }
                path.reverse();
                return ambient::method_return(&symbol.module, &symbol.export, &path);
            }
            _ => return ReturnKind::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn resolved(text: &str) -> Module {
        let source = SourceFile::new("test.ts", text);
        let mut module = parse(&source).expect("parses");
        resolve_module(&mut module);
        module
    }

    fn function_body(module: &Module) -> &Block {
        module
            .items
            .iter()
            .find_map(|item| match item {
                Item::Function(function) => function.body.as_ref(),
                _ => None,
            })
            .expect("function with body")
    }

    fn returned(block: &Block) -> &Expr {
        block
            .statements
            .iter()
            .find_map(|statement| match &statement.kind {
                StatementKind::Return(Some(expression)) => Some(expression),
                _ => None,
            })
            .expect("return statement")
    }

    #[test]
    fn parameters_locals_and_helpers() {
        let module = resolved(
            r#"import { add } from "@ts2vtl/java-types";
export function f(this: C, p: string) {
    const l = [];
    return [p, l, add, other];
}"#,
        );
        let elements = match &returned(function_body(&module)).kind {
            ExprKind::Array(elements) => elements,
            other => panic!("unexpected {:?}", other),
        };
        let bindings: Vec<&Binding> = elements
            .iter()
            .map(|element| match &element.kind {
                ExprKind::Identifier(ident) => &ident.binding,
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(bindings[0], &Binding::Parameter);
        assert_eq!(bindings[1], &Binding::Local);
        assert!(matches!(bindings[2], Binding::Helper(symbol) if symbol.export == "add"));
        assert_eq!(bindings[3], &Binding::Unresolved);
    }

    #[test]
    fn undeclared_helper_import_is_a_value() {
        let module = resolved(
            r#"import { nope } from "@ts2vtl/java-types";
export function f() {
    return nope;
}"#,
        );
        match &returned(function_body(&module)).kind {
            ExprKind::Identifier(ident) => assert!(matches!(
                &ident.binding,
                Binding::Helper(symbol) if symbol.export == "nope" && symbol.kind == HelperKind::Value
            )),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn block_scoped_shadowing() {
        let module = resolved(
            r#"export function f(x: string) {
    if (true) {
        const x = 1;
    }
    return x;
}"#,
        );
        match &returned(function_body(&module)).kind {
            ExprKind::Identifier(ident) => assert_eq!(ident.binding, Binding::Parameter),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn call_return_kinds() {
        let module = resolved(
            r#"import { add, clear } from "@ts2vtl/java-types";
import { $util } from "@ts2vtl/aws-appsync";
export function f() {
    add(a, 0, b);
    add(a, b);
    clear(a);
    $util.error("x");
    a.b();
}"#,
        );
        let kinds: Vec<ReturnKind> = function_body(&module)
            .statements
            .iter()
            .filter_map(|statement| match &statement.kind {
                StatementKind::Expression(Expr {
                    kind: ExprKind::Call { returns, .. },
                    ..
                }) => Some(*returns),
                _ => None,
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                ReturnKind::Void,
                ReturnKind::Value,
                ReturnKind::Void,
                ReturnKind::Never,
                ReturnKind::Unknown,
            ]
        );
    }
}
