use serde::{Deserialize, Serialize};

use crate::vtl::*;

/// Layout options for printed templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorOptions {
    /// Indent directive bodies and literal entries.
    pub indent_enabled: bool,
    /// Text of one indentation level.
    pub indent_text: String,
    /// Omit the `## Function: <name>` banner.
    pub strip_comments: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        GeneratorOptions {
            indent_enabled: true,
            indent_text: "  ".to_string(),
            strip_comments: false,
        }
    }
}

/// Serializes VTL nodes to template text.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    options: GeneratorOptions,
}

impl Generator {
    pub fn new(options: GeneratorOptions) -> Self {
        Generator { options }
    }

    /// Print `node` and everything below it. Never fails: nodes without a
    /// standalone textual form print as a VTL comment.
    pub fn generate<'a>(&self, node: impl Into<NodeRef<'a>>) -> String {
        let mut writer = TemplateWriter::new(&self.options);
        writer.print(node.into());
        writer.buf
    }
}

/// Layout state for one `generate` call.
struct TemplateWriter<'o> {
    options: &'o GeneratorOptions,
    buf: String,
    depth: usize,
    /// Indentation is written lazily, before the first text of a line.
    line_start: bool,
}

impl<'o> TemplateWriter<'o> {
    fn new(options: &'o GeneratorOptions) -> Self {
        TemplateWriter {
            options,
            buf: String::new(),
            depth: 0,
            line_start: true,
        }
    }

    fn write(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.line_start {
            if self.options.indent_enabled {
                for _ in 0..self.depth {
                    self.buf.push_str(&self.options.indent_text);
                }
            }
            self.line_start = false;
        }
        self.buf.push_str(text);
    }

    fn newline(&mut self) {
        self.buf.push('\n');
        self.line_start = true;
    }

    fn indent(&mut self) {
        self.depth += 1;
    }

    fn unindent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Verbatim text whose lines follow the current indentation.
    fn write_lines(&mut self, text: &str) {
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                self.newline();
            }
            self.write(line);
        }
    }

    fn write_number(&mut self, n: f64) {
        // Integral values print without a decimal point while f64 still
        // represents every integer exactly (2^53).
        if n.is_finite() && n.fract() == 0.0 && n.abs() < (1u64 << 53) as f64 {
            self.write(&(n as i64).to_string());
        } else {
            self.write(&n.to_string());
        }
    }

    fn not_implemented(&mut self, kind: SyntaxKind) {
        self.write(&format!("### {} not implemented ###", kind));
    }

    fn print(&mut self, node: NodeRef<'_>) {
        match node {
            NodeRef::File(file) => {
                if !self.options.strip_comments {
                    self.write(&format!("## Function: {}", file.name));
                    self.newline();
                }
                self.print_block(&file.block);
            }
            NodeRef::Block(block) => self.print_block(block),
            NodeRef::SetDirective(set) => {
                self.write("#set(");
                self.print(NodeRef::from(&set.target));
                self.write(" = ");
                self.print(NodeRef::from(&set.value));
                self.write(")");
                self.newline();
            }
            NodeRef::IfDirective(directive) => {
                self.write("#if(");
                self.print(NodeRef::from(&directive.if_clause.condition));
                self.write(")");
                self.newline();
                self.print_body(&directive.if_clause.block);

                for clause in &directive.else_if_clauses {
                    self.write("#elseif(");
                    self.print(NodeRef::from(&clause.condition));
                    self.write(")");
                    self.newline();
                    self.print_body(&clause.block);
                }

                if let Some(block) = &directive.else_clause {
                    self.write("#else");
                    self.newline();
                    self.print_body(block);
                }

                self.write("#end");
                self.newline();
            }
            NodeRef::ForeachDirective(directive) => {
                self.write("#foreach(");
                self.print(NodeRef::from(&directive.variable));
                self.write(" in ");
                self.print(NodeRef::from(&directive.iterable));
                self.write(")");
                self.newline();
                self.print_body(&directive.block);
                self.write("#end");
                self.newline();
            }
            NodeRef::Identifier(identifier) => self.write(&identifier.text),
            NodeRef::VariableReference(reference) => {
                self.write("$");
                self.write(&reference.name.text);
            }
            NodeRef::PropertyReference(reference) => {
                self.write("${");
                self.print(NodeRef::from(&reference.notation));
                self.write("}");
            }
            NodeRef::MethodReference(reference) => {
                self.write("${");
                self.print(NodeRef::from(&reference.call));
                self.write("}");
            }
            NodeRef::NumericLiteral(literal) => self.write_number(literal.value),
            NodeRef::StringLiteral(literal) => {
                let quote = match literal.quote {
                    QuoteKind::Double => "\"",
                    QuoteKind::Single => "'",
                };
                self.write(quote);
                self.write(&literal.value);
                self.write(quote);
            }
            NodeRef::TemplateLiteral(literal) => {
                self.write("\"");
                self.write(&literal.head);
                for span in &literal.spans {
                    self.print(NodeRef::from(&span.expression));
                    self.write(&span.literal);
                }
                self.write("\"");
            }
            NodeRef::BooleanLiteral(literal) => {
                self.write(if literal.value { "true" } else { "false" })
            }
            NodeRef::ListLiteral(list) => {
                if list.elements.is_empty() {
                    self.write("[]");
                    return;
                }
                self.write("[");
                self.newline();
                self.indent();
                for (i, element) in list.elements.iter().enumerate() {
                    self.print(NodeRef::from(element));
                    self.entry_end(i + 1 == list.elements.len());
                }
                self.unindent();
                self.write("]");
            }
            NodeRef::RangeLiteral(range) => {
                self.write("[");
                self.print(NodeRef::from(&range.begin));
                self.write("..");
                self.print(NodeRef::from(&range.end));
                self.write("]");
            }
            NodeRef::MapLiteral(map) => {
                if map.properties.is_empty() {
                    self.write("{}");
                    return;
                }
                self.write("{");
                self.newline();
                self.indent();
                for (i, property) in map.properties.iter().enumerate() {
                    self.print(NodeRef::from(&property.name));
                    self.write(": ");
                    self.print(NodeRef::from(&property.initializer));
                    self.entry_end(i + 1 == map.properties.len());
                }
                self.unindent();
                self.write("}");
            }
            NodeRef::TextNode(text) => self.write_lines(&text.text),
            NodeRef::NewLine => self.newline(),
            NodeRef::PropertyNotation(notation) => {
                self.print(NodeRef::from(&notation.base));
                self.write(".");
                self.write(&notation.name.text);
            }
            NodeRef::IndexNotation(notation) => {
                self.print(NodeRef::from(&notation.base));
                self.write("[");
                self.print(NodeRef::from(&*notation.index));
                self.write("]");
            }
            NodeRef::CallExpression(call) => {
                self.print(NodeRef::from(&call.callee));
                self.write("(");
                for (i, argument) in call.arguments.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.print(NodeRef::from(argument));
                }
                self.write(")");
            }
            NodeRef::BinaryExpression(binary) => {
                self.print(NodeRef::from(&*binary.left));
                self.write(" ");
                self.write(binary.operator.as_str());
                self.write(" ");
                self.print(NodeRef::from(&*binary.right));
            }
            NodeRef::PrefixUnaryExpression(unary) => {
                self.write(unary.operator.as_str());
                self.print(NodeRef::from(&*unary.operand));
            }
            NodeRef::ParenthesizedExpression(paren) => {
                self.write("(");
                self.print(NodeRef::from(&*paren.expression));
                self.write(")");
            }
            NodeRef::ConditionAndBlock(_)
            | NodeRef::TemplateSpan(_)
            | NodeRef::PropertyAssignment(_) => self.not_implemented(node.kind()),
        }
    }

    fn print_block(&mut self, block: &Block) {
        for element in &block.elements {
            self.print(NodeRef::from(element));
        }
    }

    /// A directive body, one level deeper.
    fn print_body(&mut self, block: &Block) {
        self.indent();
        self.print_block(block);
        self.unindent();
    }

    /// Entries of list and map literals are comma separated, one per line.
    fn entry_end(&mut self, last: bool) {
        if !last {
            self.write(",");
        }
        self.newline();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> VariableReference {
        VariableReference::new(Identifier::new(name, None))
    }

    fn string(value: &str) -> Value {
        Value::Literal(Literal::String(StringLiteral::new(value, None)))
    }

    #[test]
    fn map_literal_entries() {
        let map = MapLiteral {
            properties: vec![PropertyAssignment {
                name: string("json"),
                initializer: Value::Reference(Reference::Variable(var("json"))),
                origin: None,
            }],
            origin: None,
        };
        assert_eq!(Generator::default().generate(&map), "{\n  \"json\": $json\n}");
    }

    #[test]
    fn empty_literals() {
        let list = ListLiteral {
            elements: vec![],
            origin: None,
        };
        let map = MapLiteral {
            properties: vec![],
            origin: None,
        };
        let generator = Generator::default();
        assert_eq!(generator.generate(&list), "[]");
        assert_eq!(generator.generate(&map), "{}");
    }

    #[test]
    fn numbers_print_like_decimal_text() {
        let generator = Generator::default();
        let number = |value| NumericLiteral {
            value,
            origin: None,
        };
        assert_eq!(generator.generate(&number(1.0)), "1");
        assert_eq!(generator.generate(&number(1.5)), "1.5");
        assert_eq!(generator.generate(&number(-3.0)), "-3");
    }

    #[test]
    fn indentation_is_configurable() {
        let directive = ForeachDirective {
            variable: var("x"),
            iterable: Value::Reference(Reference::Variable(var("xs"))),
            block: Block::new(
                vec![
                    BlockElement::Reference(Reference::Variable(var("x"))),
                    BlockElement::NewLine,
                ],
                None,
            ),
            origin: None,
        };

        let tabs = Generator::new(GeneratorOptions {
            indent_text: "\t".to_string(),
            ..GeneratorOptions::default()
        });
        assert_eq!(tabs.generate(&directive), "#foreach($x in $xs)\n\t$x\n#end\n");

        let flat = Generator::new(GeneratorOptions {
            indent_enabled: false,
            ..GeneratorOptions::default()
        });
        assert_eq!(flat.generate(&directive), "#foreach($x in $xs)\n$x\n#end\n");
    }

    #[test]
    fn blank_lines_carry_no_indentation() {
        let directive = IfDirective {
            if_clause: ConditionAndBlock {
                condition: Expression::Reference(Reference::Variable(var("a"))),
                block: Block::new(
                    vec![
                        BlockElement::NewLine,
                        BlockElement::Reference(Reference::Variable(var("b"))),
                        BlockElement::NewLine,
                    ],
                    None,
                ),
                origin: None,
            },
            else_if_clauses: vec![],
            else_clause: Some(Block::new(
                vec![BlockElement::Text(TextNode {
                    text: "## WhileStatement\n".to_string(),
                    origin: None,
                })],
                None,
            )),
            origin: None,
        };
        assert_eq!(
            Generator::default().generate(&directive),
            "#if($a)\n\n  $b\n#else\n  ## WhileStatement\n#end\n"
        );
    }

    #[test]
    fn clause_nodes_print_as_comments() {
        let clause = ConditionAndBlock {
            condition: Expression::Literal(Literal::Boolean(BooleanLiteral {
                value: true,
                origin: None,
            })),
            block: Block::default(),
            origin: None,
        };
        assert_eq!(
            Generator::default().generate(&clause),
            "### ConditionAndBlock not implemented ###"
        );
    }

    #[test]
    fn file_banner_can_be_stripped() {
        let file = File {
            name: "request".to_string(),
            block: Block::new(vec![BlockElement::Reference(Reference::Variable(var("a")))], None),
            origin: None,
        };
        assert_eq!(Generator::default().generate(&file), "## Function: request\n$a");
        let stripped = Generator::new(GeneratorOptions {
            strip_comments: true,
            ..GeneratorOptions::default()
        });
        assert_eq!(stripped.generate(&file), "$a");
    }
}
