use crate::vtl::*;
use std::collections::HashSet;

// ── Error types ─────────────────────────────────────────────────────

/// A violated invariant of a generated template tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub message: String,
    /// Directive kinds enclosing the offending node (e.g. ["IfDirective", "SetDirective"]).
    pub path: Vec<String>,
    /// Machine-readable error code.
    pub code: &'static str,
}

// ── Tree validation ─────────────────────────────────────────────────

/// Re-check a lowered template:
///
/// - every identifier fits the VTL identifier grammar (`invalid-identifier`);
/// - every `local_N` temporary is assigned by a `#set` or `#foreach`
///   before it is read, in document order (`unassigned-temporary`);
/// - no node is reachable twice (`shared-node`).
///
/// Returns an empty vec when the tree is sound.
pub fn validate_file(file: &File) -> Vec<ValidationError> {
    let mut validator = Validator {
        seen: HashSet::new(),
        assigned: HashSet::new(),
        path: Vec::new(),
        errors: Vec::new(),
    };
    validator.visit(NodeRef::File(file));
    validator.errors
}

struct Validator<'a> {
    seen: HashSet<(usize, SyntaxKind)>,
    assigned: HashSet<&'a str>,
    path: Vec<String>,
    errors: Vec<ValidationError>,
}

fn is_temporary(name: &str) -> bool {
    name.strip_prefix("local_")
        .map(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

impl<'a> Validator<'a> {
    fn error(&mut self, code: &'static str, message: String) {
        self.errors.push(ValidationError {
            message,
            path: self.path.clone(),
            code,
        });
    }

    /// Record a node visit; false when the same node was seen already.
    fn first_visit(&mut self, node: NodeRef<'a>) -> bool {
        let address = match node.address() {
            Some(address) => address,
            None => return true,
        };
        if self.seen.insert((address, node.kind())) {
            return true;
        }
        self.error(
            "shared-node",
            format!("{} node is reachable more than once", node.kind()),
        );
        false
    }

    fn check_identifier(&mut self, identifier: &Identifier) {
        if !is_valid_identifier(&identifier.text) {
            self.error(
                "invalid-identifier",
                format!("The identifier '{}' is an invalid name for VTL", identifier.text),
            );
        }
    }

    /// Declare a variable written by a directive; not a read.
    fn assign(&mut self, variable: &'a VariableReference) {
        if !self.first_visit(NodeRef::VariableReference(variable)) {
            return;
        }
        self.check_identifier(&variable.name);
        self.assigned.insert(&variable.name.text);
    }

    fn visit(&mut self, node: NodeRef<'a>) {
        if !self.first_visit(node) {
            return;
        }

        match node {
            NodeRef::SetDirective(set) => {
                self.path.push(node.kind().to_string());
                self.visit(NodeRef::from(&set.value));
                match &set.target {
                    LeftHandSide::Variable(variable) => self.assign(variable),
                    LeftHandSide::Property(property) => {
                        self.visit(NodeRef::PropertyReference(property))
                    }
                }
                self.path.pop();
            }
            NodeRef::ForeachDirective(directive) => {
                self.path.push(node.kind().to_string());
                self.visit(NodeRef::from(&directive.iterable));
                self.assign(&directive.variable);
                self.visit(NodeRef::Block(&directive.block));
                self.path.pop();
            }
            NodeRef::IfDirective(_) => {
                self.path.push(node.kind().to_string());
                for child in node.children() {
                    self.visit(child);
                }
                self.path.pop();
            }
            NodeRef::Identifier(identifier) => {
                self.check_identifier(identifier);
                if is_temporary(&identifier.text) && !self.assigned.contains(identifier.text.as_str())
                {
                    self.error(
                        "unassigned-temporary",
                        format!("The temporary '{}' is read before it is set", identifier.text),
                    );
                }
            }
            _ => {
                for child in node.children() {
                    self.visit(child);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> VariableReference {
        VariableReference::new(Identifier::new(name, None))
    }

    fn file(elements: Vec<BlockElement>) -> File {
        File {
            name: "f".to_string(),
            block: Block::new(elements, None),
            origin: None,
        }
    }

    #[test]
    fn temporaries_must_be_set_first() {
        let read = BlockElement::Reference(Reference::Variable(var("local_0")));
        let set = SetDirective {
            target: LeftHandSide::Variable(var("local_0")),
            value: Expression::Literal(Literal::Numeric(NumericLiteral {
                value: 1.0,
                origin: None,
            })),
            origin: None,
        };

        let errors = validate_file(&file(vec![read.clone()]));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, "unassigned-temporary");

        assert!(validate_file(&file(vec![set.into(), read])).is_empty());
    }

    #[test]
    fn foreach_variable_counts_as_assignment() {
        let key = PropertyNotation::new(
            NotationBase::Identifier(Identifier::new("local_0", None)),
            Identifier::new("key", None),
            None,
        );
        let body = SetDirective {
            target: LeftHandSide::Variable(var("k")),
            value: Expression::PropertyNotation(key).into_reference_or_self(),
            origin: None,
        };
        let directive = ForeachDirective {
            variable: var("local_0"),
            iterable: Value::Reference(Reference::Variable(var("map"))),
            block: Block::new(vec![body.into()], None),
            origin: None,
        };
        assert!(validate_file(&file(vec![Directive::Foreach(directive).into()])).is_empty());
    }

    #[test]
    fn invalid_identifier_reports_path() {
        let set = SetDirective {
            target: LeftHandSide::Variable(var("ok")),
            value: Expression::Reference(Reference::Variable(var("_bad"))),
            origin: None,
        };
        let errors = validate_file(&file(vec![set.into()]));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, "invalid-identifier");
        assert_eq!(errors[0].path, vec!["SetDirective".to_string()]);
    }

    #[test]
    fn revisiting_a_node_is_reported() {
        let tree = file(vec![BlockElement::Reference(Reference::Variable(var("a")))]);
        let mut validator = Validator {
            seen: HashSet::new(),
            assigned: HashSet::new(),
            path: Vec::new(),
            errors: Vec::new(),
        };
        validator.visit(NodeRef::Block(&tree.block));
        validator.visit(NodeRef::Block(&tree.block));
        assert_eq!(validator.errors.len(), 1);
        assert_eq!(validator.errors[0].code, "shared-node");
    }
}
