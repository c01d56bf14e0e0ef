use proptest::prelude::*;

use crate::error::DiagnosticKind;
use crate::generator::{Generator, GeneratorOptions};
use crate::lower::Target;
use crate::validate::validate_file;
use crate::vtl::*;
use crate::{transpile_source, TranspileResult};

// ── Shared fixture runners ──────────────────────────────────────────

/// Embed fixture files at compile time.
const UPDATE_ITEM_SOURCE: &str = include_str!("../test-data/Query_updateItem.ts");
const UPDATE_ITEM_REQUEST: &str = include_str!("../test-data/Query_updateItem.request.vtl");
const UPDATE_ITEM_RESPONSE: &str = include_str!("../test-data/Query_updateItem.response.vtl");
const APIGATEWAY_SOURCE: &str = include_str!("../test-data/apigateway-template.ts");
const APIGATEWAY_REQUEST: &str = include_str!("../test-data/apigateway-template.request.vtl");
const APIGATEWAY_TEST_SOURCE: &str = include_str!("../test-data/apigateway/test.ts");
const APIGATEWAY_TEST_RESPONSE: &str = include_str!("../test-data/apigateway/test.response.vtl");

fn lower(text: &str, target: Target) -> TranspileResult {
    transpile_source("test.ts", text, target)
}

/// Templates of a source that must lower without diagnostics.
fn templates(text: &str, target: Target) -> Vec<String> {
    let result = lower(text, target);
    assert!(
        result.is_ok(),
        "unexpected diagnostics: {:?}",
        result.diagnostics
    );
    result
        .render(&GeneratorOptions::default())
        .into_iter()
        .map(|(_, template)| template)
        .collect()
}

fn template(text: &str, target: Target) -> String {
    let mut all = templates(text, target);
    assert_eq!(all.len(), 1, "expected exactly one template");
    all.remove(0)
}

fn messages(text: &str, target: Target) -> Vec<String> {
    lower(text, target)
        .diagnostics
        .into_iter()
        .map(|diagnostic| diagnostic.message)
        .collect()
}

// ── Golden templates ────────────────────────────────────────────────

#[test]
fn test_golden_update_item_appsync() {
    let result = transpile_source("Query_updateItem.ts", UPDATE_ITEM_SOURCE, Target::Appsync);
    assert!(result.is_ok(), "{:?}", result.diagnostics);

    let rendered = result.render(&GeneratorOptions::default());
    let names: Vec<&str> = rendered.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["request", "response"]);
    assert_eq!(rendered[0].1, UPDATE_ITEM_REQUEST);
    assert_eq!(rendered[1].1, UPDATE_ITEM_RESPONSE);
}

#[test]
fn test_golden_update_item_apigateway() {
    let all = templates(UPDATE_ITEM_SOURCE, Target::Apigateway);
    let request = &all[0];

    assert!(!request.contains("util.qr"));
    assert!(request.contains("      #set($discard = ${expRemove.add(${entry.key})})\n"));
    assert!(request.contains("#foreach($entry in ${input.entrySet()})"));
    assert!(request.contains("\"id\": ${util.dynamodb.toDynamoDBJson($id)}"));
    assert_eq!(
        all[1],
        "## Function: response\n\
         #if(${context.error})\n  \
         #set($discard = ${util.error(${context.error.message}, ${context.error.type})})\n\
         #end\n\
         \n\
         ${context.result}"
    );
}

#[test]
fn test_golden_apigateway_request() {
    assert_eq!(template(APIGATEWAY_SOURCE, Target::Apigateway), APIGATEWAY_REQUEST);
}

#[test]
fn test_golden_apigateway_context_response() {
    assert_eq!(
        template(APIGATEWAY_TEST_SOURCE, Target::Apigateway),
        APIGATEWAY_TEST_RESPONSE
    );
}

#[test]
fn test_goldens_pass_validation() {
    for (source, target) in [
        (UPDATE_ITEM_SOURCE, Target::Appsync),
        (UPDATE_ITEM_SOURCE, Target::Apigateway),
        (APIGATEWAY_SOURCE, Target::Apigateway),
        (APIGATEWAY_TEST_SOURCE, Target::Apigateway),
    ] {
        let result = lower(source, target);
        assert!(result.is_ok());
        for file in &result.files {
            assert_eq!(validate_file(file), vec![], "function {}", file.name);
        }
    }
}

// ── Front end ───────────────────────────────────────────────────────

fn parse_module(text: &str) -> crate::ast::Module {
    let source = crate::ast::SourceFile::new("test.ts", text);
    match crate::parser::parse(&source) {
        Ok(module) => module,
        Err(err) => panic!("parse failed: {}", err),
    }
}

fn first_function(module: &crate::ast::Module) -> &crate::ast::FunctionDeclaration {
    module
        .items
        .iter()
        .find_map(|item| match item {
            crate::ast::Item::Function(function) => Some(function),
            _ => None,
        })
        .unwrap()
}

#[test]
fn test_parse_imports() {
    use crate::ast::{ImportSpecifier, Item};

    let module = parse_module(
        "import { a as b, c } from \"@ts2vtl/java-types\";\nimport d from \"x\";\nimport * as e from 'y';",
    );
    let imports: Vec<_> = module
        .items
        .iter()
        .filter_map(|item| match item {
            Item::Import(import) => Some(import),
            _ => None,
        })
        .collect();
    assert_eq!(imports.len(), 3);
    assert_eq!(imports[0].module, "@ts2vtl/java-types");
    assert_eq!(
        imports[0].specifiers,
        vec![
            ImportSpecifier::Named {
                imported: "a".to_string(),
                local: "b".to_string()
            },
            ImportSpecifier::Named {
                imported: "c".to_string(),
                local: "c".to_string()
            },
        ]
    );
    assert_eq!(imports[1].specifiers[0].local(), "d");
    assert_eq!(
        imports[2].specifiers,
        vec![ImportSpecifier::Namespace {
            local: "e".to_string()
        }]
    );
}

#[test]
fn test_parse_skips_type_syntax() {
    use crate::ast::Item;

    let module = parse_module(
        r#"interface A { x: string }
type B = { [k: string]: Array<number> };
export function f(this: C, a?: string, b: number = 1): { x: number } {
    const m: { [key: string]: any } = {};
    return a as string;
}"#,
    );
    assert!(matches!(module.items[0], Item::TypeDeclaration { .. }));
    assert!(matches!(module.items[1], Item::TypeDeclaration { .. }));

    let function = first_function(&module);
    assert_eq!(function.params.len(), 3);
    assert!(function.params[0].is_this);
    assert!(!function.params[1].is_this);
    assert_eq!(function.body.as_ref().map(|b| b.statements.len()), Some(2));
}

#[test]
fn test_parse_semicolon_insertion_and_leading_newlines() {
    let module = parse_module(
        "export function f() {\n  const a = 1\n\n  // note\n  return a\n}",
    );
    let body = first_function(&module).body.as_ref().unwrap();
    let newlines: Vec<usize> = body.statements.iter().map(|s| s.leading_newlines).collect();
    assert_eq!(newlines, vec![1, 3]);
}

#[test]
fn test_parse_template_parts_are_cooked() {
    use crate::ast::{ExprKind, StatementKind};

    let module = parse_module("export function f() {\n  return `a\\n${b}c${d}`;\n}");
    let body = first_function(&module).body.as_ref().unwrap();
    match &body.statements[0].kind {
        StatementKind::Return(Some(expr)) => match &expr.kind {
            ExprKind::Template { head, parts } => {
                assert_eq!(head, "a\n");
                let literals: Vec<&str> = parts.iter().map(|p| p.literal.as_str()).collect();
                assert_eq!(literals, vec!["c", ""]);
            }
            other => panic!("unexpected {:?}", other),
        },
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_parse_error_unclosed_block() {
    let source = crate::ast::SourceFile::new("test.ts", "export function f() {\n  return 1;\n");
    let err = crate::parser::parse(&source).unwrap_err();
    assert_eq!(err.kind, DiagnosticKind::SyntaxError);
    assert!(err.location.is_some());
}

// ── Statements ──────────────────────────────────────────────────────

#[test]
fn test_standalone_calls_per_target() {
    let source = r#"import { $util } from "@ts2vtl/aws-appsync";
export function f() {
    $util.toJson(1);
}"#;
    assert_eq!(
        template(source, Target::Appsync),
        "## Function: f\n${util.qr(${util.toJson(1)})}\n"
    );
    assert_eq!(
        template(source, Target::Apigateway),
        "## Function: f\n#set($discard = ${util.toJson(1)})\n"
    );
}

#[test]
fn test_void_calls_are_emitted_bare() {
    let source = r#"import { add, clear } from "@ts2vtl/java-types";
export function f() {
    const l = [];
    add(l, 0, 1);
    clear(l);
}"#;
    assert_eq!(
        template(source, Target::Appsync),
        "## Function: f\n#set($l = [])\n${l.add(0, 1)}\n${l.clear()}\n"
    );
}

#[test]
fn test_assignment_hoisting() {
    let source = r#"export function f() {
    let a = 1;
    a = a + 1;
    a += 2;
    return a;
}"#;
    assert_eq!(
        template(source, Target::Apigateway),
        "## Function: f\n#set($a = 1)\n#set($a = $a + 1)\n#set($a = $a + 2)\n$a"
    );
}

#[test]
fn test_assignment_as_argument_precedes_call() {
    let source = r#"import { add } from "@ts2vtl/java-types";
export function f() {
    let a = 1;
    const l = [];
    add(l, a = 2);
}"#;
    assert_eq!(
        template(source, Target::Appsync),
        "## Function: f\n#set($a = 1)\n#set($l = [])\n#set($a = 2)\n${util.qr(${l.add($a)})}\n"
    );
}

#[test]
fn test_values_are_hoisted_into_temporaries() {
    let source = r#"export function f() {
    const x = [1 + 2];
    return x;
}"#;
    assert_eq!(
        template(source, Target::Appsync),
        "## Function: f\n#set($local_0 = 1 + 2)\n#set($x = [\n  $local_0\n])\n$x"
    );
}

#[test]
fn test_returned_value_follows_its_hoisted_directives() {
    let source = r#"export function f() {
    return { "sum": 1 + 2 };
}"#;
    assert_eq!(
        template(source, Target::Appsync),
        "## Function: f\n#set($local_0 = 1 + 2)\n\n{\n  \"sum\": $local_0\n}"
    );
}

#[test]
fn test_temporaries_restart_per_function() {
    let source = r#"export function a() {
    return [1 + 1];
}

export function b() {
    return [2 + 2];
}"#;
    let all = templates(source, Target::Appsync);
    assert!(all[0].contains("#set($local_0 = 1 + 1)"));
    assert!(all[1].contains("#set($local_0 = 2 + 2)"));
    assert!(!all[1].contains("local_1"));
    assert_eq!(all, templates(source, Target::Appsync));
}

#[test]
fn test_blank_lines_are_kept() {
    let source = "export function f() {\n    const a = 1;\n\n\n    const b = 2;\n}";
    assert_eq!(
        template(source, Target::Appsync),
        "## Function: f\n#set($a = 1)\n\n\n#set($b = 2)\n"
    );
}

#[test]
fn test_destructured_for_of() {
    let source = r#"import { entrySet } from "@ts2vtl/java-types";
export function f(m: any) {
    for (const [k, v] of entrySet(m)) {
        const x = k;
    }
}"#;
    assert_eq!(
        template(source, Target::Appsync),
        "## Function: f\n\
         #foreach($local_0 in ${ctx.arguments.m.entrySet()})\n  \
         #set($k = ${local_0.key})\n  \
         #set($v = ${local_0.value})\n\
         \n  \
         #set($x = $k)\n\
         #end\n"
    );
}

#[test]
fn test_for_of_binding_errors() {
    let source = r#"export function f(m: any) {
    for (const [a, b, c] of m) {}
    for (const { a } of m) {}
}"#;
    assert_eq!(
        messages(source, Target::Appsync),
        vec![
            "The array binding of the for-of statement must have 2 elements".to_string(),
            "The binding of the for-of statement must be an identifier or a [key, value] array"
                .to_string(),
        ]
    );
    assert!(lower(source, Target::Appsync)
        .diagnostics
        .iter()
        .all(|d| d.kind == DiagnosticKind::StructuralError));
}

#[test]
fn test_else_if_chain_is_one_directive() {
    let source = r#"export function f(x: number) {
    let r = "";
    if (x == 1) {
        r = "one";
    } else if (x === [1 + 1]) {
        r = "two";
    } else {
        r = "many";
    }
}"#;
    assert_eq!(
        template(source, Target::Apigateway),
        "## Function: f\n\
         #set($r = \"\")\n\
         #set($local_0 = 1 + 1)\n\
         #if($x == 1)\n  \
         #set($r = \"one\")\n\
         #elseif($x == [\n  \
         $local_0\n\
         ])\n  \
         #set($r = \"two\")\n\
         #else\n  \
         #set($r = \"many\")\n\
         #end\n"
    );
}

#[test]
fn test_unsupported_statements_leave_placeholders() {
    let source = r#"export function f() {
    while (true) {}
    return 1;
}"#;
    let result = lower(source, Target::Appsync);
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(
        result.diagnostics[0].kind,
        DiagnosticKind::NotImplementedSyntax
    );
    assert_eq!(
        result.diagnostics[0].message,
        "Syntax WhileStatement not implemented in the statement"
    );

    let text = Generator::default().generate(&result.files[0]);
    assert_eq!(text, "## Function: f\n## WhileStatement\n1");
}

// ── Expressions ─────────────────────────────────────────────────────

#[test]
fn test_single_prelude_before_everything() {
    let source = r#"import { String } from "@ts2vtl/java-types";
export function f() {
    const a = `"a"`;
    const b = `"b"`;
    return String.join(",", [a, b]);
}"#;
    let text = template(source, Target::Appsync);
    assert_eq!(text.matches("#set($esc = ").count(), 1);
    assert_eq!(text.matches("#set($String = \"\")").count(), 1);

    let esc = text.find("#set($esc").unwrap_or(usize::MAX);
    let class = text.find("#set($String").unwrap_or(usize::MAX);
    let first = text.find("#set($a").unwrap_or(usize::MAX);
    assert!(esc < class && class < first);
    assert!(text.contains("#set($a = \"${esc.q}a${esc.q}\")"));
}

#[test]
fn test_parameters_rewrite_once() {
    let source = r#"export function f(id: string) {
    const a = id;
    return id.length;
}"#;
    assert_eq!(
        template(source, Target::Appsync),
        "## Function: f\n#set($a = ${ctx.arguments.id})\n${ctx.arguments.id.length}"
    );
    assert_eq!(
        template(source, Target::Apigateway),
        "## Function: f\n#set($a = $id)\n${id.length}"
    );
}

#[test]
fn test_this_maps_to_target_context() {
    let source = r#"export function f(this: any) {
    return this.identity;
}"#;
    assert_eq!(
        template(source, Target::Appsync),
        "## Function: f\n${ctx.identity}"
    );
    assert_eq!(
        template(source, Target::Apigateway),
        "## Function: f\n${context.identity}"
    );
}

#[test]
fn test_range_literals() {
    let source = r#"import { Range } from "@ts2vtl/java-types";
export function f(n: number) {
    for (const i of Range(0, n)) {
        const x = i;
    }
}"#;
    assert_eq!(
        template(source, Target::Appsync),
        "## Function: f\n#foreach($i in [0..${ctx.arguments.n}])\n  #set($x = $i)\n#end\n"
    );
}

#[test]
fn test_range_computed_bound_is_hoisted() {
    let source = r#"import { Range } from "@ts2vtl/java-types";
export function f() {
    const list = [];
    for (const i of Range(0, list.size() - 1)) {
        const x = i;
    }
}"#;
    assert!(template(source, Target::Appsync).contains(
        "#set($local_0 = ${list.size()} - 1)\n#foreach($i in [0..$local_0])\n  #set($x = $i)\n#end\n"
    ));
}

#[test]
fn test_range_without_arguments_reports_once() {
    let source = r#"import { Range } from "@ts2vtl/java-types";
export function f() {
    const a = Range();
}"#;
    assert_eq!(
        messages(source, Target::Appsync),
        vec!["Missing begin value of Range".to_string()]
    );
}

#[test]
fn test_range_errors() {
    let source = r#"import { Range } from "@ts2vtl/java-types";
export function f() {
    const a = Range(0);
    const b = Range("a", 1);
}"#;
    let result = lower(source, Target::Appsync);
    assert!(result
        .diagnostics
        .iter()
        .all(|d| d.kind == DiagnosticKind::StructuralError));
    let messages: Vec<&str> = result
        .diagnostics
        .iter()
        .map(|d| d.message.as_str())
        .collect();
    assert_eq!(
        messages,
        vec![
            "Missing end value of Range",
            "The begin value of Range must be a number or a reference",
        ]
    );
}

#[test]
fn test_string_quotes_follow_content() {
    let single = r#"export function f() {
    return 'say "hi"';
}"#;
    assert_eq!(
        template(single, Target::Appsync),
        "## Function: f\n'say \"hi\"'"
    );

    let double = r#"export function f() {
    return "it's";
}"#;
    assert_eq!(template(double, Target::Appsync), "## Function: f\n\"it's\"");

    let both = r#"export function f() {
    return { 'k"1': "it's \"x\"" };
}"#;
    let rendered = template(both, Target::Apigateway);
    assert!(rendered.contains(r#"'k"1': "it's ""x""""#), "{}", rendered);
}

#[test]
fn test_strict_and_loose_equality_print_alike() {
    let source = r#"export function f(a: number, b: number) {
    return [a === b, a != b];
}"#;
    assert_eq!(
        template(source, Target::Apigateway),
        "## Function: f\n#set($local_0 = $a == $b)\n#set($local_1 = $a != $b)\n\n[\n  $local_0,\n  $local_1\n]"
    );
}

#[test]
fn test_shorthand_and_nested_maps() {
    let source = r#"export function f(json: string) {
    return { json, nested: { ok: true } };
}"#;
    assert_eq!(
        template(source, Target::Apigateway),
        "## Function: f\n{\n  \"json\": $json,\n  \"nested\": {\n    \"ok\": true\n  }\n}"
    );
}

// ── Diagnostics ─────────────────────────────────────────────────────

#[test]
fn test_diagnostic_positions() {
    let source = "export function f() {\n  const _x = 1;\n}";
    let result = lower(source, Target::Appsync);
    assert_eq!(result.diagnostics.len(), 1);

    let diagnostic = &result.diagnostics[0];
    assert_eq!(diagnostic.kind, DiagnosticKind::InvalidIdentifier);
    let location = diagnostic.location.as_ref().unwrap();
    assert_eq!(location.begin.line, 1);
    assert_eq!(location.begin.column, 8);
    assert_eq!(location.end.column, 10);
    assert_eq!(
        diagnostic.to_string(),
        "test.ts:2:9: The identifier '_x' is an invalid name for VTL (invalid-identifier)"
    );
}

#[test]
fn test_syntax_error_stops_at_the_parser() {
    let result = lower("export function f() {\n  const = 1;\n}", Target::Appsync);
    assert!(result.files.is_empty());
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].kind, DiagnosticKind::SyntaxError);
    assert_eq!(result.diagnostics[0].code(), "syntax-error");
    assert_eq!(result.diagnostics[0].location.as_ref().unwrap().begin.line, 1);
}

#[test]
fn test_diagnostics_serialize_to_json() {
    let result = lower("export function f() {\n  const _x = 1;\n}", Target::Appsync);
    let json = serde_json::to_value(&result.diagnostics).unwrap();
    assert_eq!(json[0]["kind"], "invalid-identifier");
    assert_eq!(json[0]["location"]["file"], "test.ts");
    assert_eq!(json[0]["location"]["begin"]["line"], 1);
}

#[test]
fn test_structural_errors() {
    assert_eq!(
        messages("function f() { return 1; }", Target::Appsync),
        vec!["Function without the export modifier not supported yet".to_string()]
    );
    assert_eq!(
        messages("export async function f() { return 1; }", Target::Appsync),
        vec![
            "Function with modifiers except the export modifier and the default modifier, not supported"
                .to_string()
        ]
    );
    assert_eq!(
        messages("export function* f() {}", Target::Appsync),
        vec!["Generator function not supported".to_string()]
    );
    assert_eq!(
        messages("export function f() {\n  const [a, b] = c;\n}", Target::Appsync),
        vec!["Destructuring not implemented".to_string()]
    );
}

#[test]
fn test_top_level_statements_are_reported() {
    assert_eq!(
        messages("const x = 1;\nexport function f() {}", Target::Appsync),
        vec!["Syntax VariableStatement not implemented under the top level".to_string()]
    );
}

#[test]
fn test_plain_function_calls_are_unsupported() {
    assert_eq!(
        messages("export function f() {\n  g();\n}", Target::Appsync),
        vec!["Syntax Identifier not supported in the call expression".to_string()]
    );
}

#[test]
fn test_binary_expression_statement_is_unsupported() {
    let result = lower("export function f(a: number) {\n  a + 1;\n}", Target::Appsync);
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].kind, DiagnosticKind::UnsupportedSyntax);
    assert!(result.diagnostics[0]
        .message
        .ends_with("not supported for VTL in the expression statement"));
}

#[test]
fn test_default_export_and_overloads() {
    let all = templates("export default function () {\n  return 1;\n}", Target::Appsync);
    assert_eq!(all, vec!["## Function: default\n1".to_string()]);

    let result = lower(
        "export function f(a: string): string;\nexport function f(a: any) {\n  return a;\n}",
        Target::Apigateway,
    );
    assert!(result.is_ok());
    assert_eq!(result.files.len(), 1);
}

// ── Properties ──────────────────────────────────────────────────────

fn numbered_source(names: &[String], numbers: &[u32]) -> String {
    let mut body = String::new();
    let mut previous: Option<String> = None;
    for (i, (name, number)) in names.iter().zip(numbers).enumerate() {
        let local = format!("v_{}{}", name, i);
        let elements = match &previous {
            Some(previous) => format!("[{} + {}, {}]", number, i, previous),
            None => format!("[{} + {}]", number, i),
        };
        body.push_str(&format!("    const {} = {};\n", local, elements));
        previous = Some(local);
    }
    let last = previous.unwrap_or_else(|| "0".to_string());
    format!("export function f() {{\n{}    return {};\n}}", body, last)
}

proptest! {
    #[test]
    fn prop_lowering_is_deterministic(
        names in prop::collection::vec("[a-z]{1,5}", 1..6),
        numbers in prop::collection::vec(0u32..1000, 1..6),
    ) {
        let source = numbered_source(&names, &numbers);
        let first = transpile_source("prop.ts", &source, Target::Appsync);
        let second = transpile_source("prop.ts", &source, Target::Appsync);
        prop_assert!(first.is_ok(), "{:?}", first.diagnostics);

        let options = GeneratorOptions::default();
        prop_assert_eq!(first.render(&options), second.render(&options));
        for file in &first.files {
            prop_assert!(validate_file(file).is_empty());
        }
    }

    #[test]
    fn prop_printer_is_idempotent(
        sets in prop::collection::vec(("[a-z][a-z0-9_]{0,5}", -1000i64..1000), 0..8),
    ) {
        let elements: Vec<BlockElement> = sets
            .iter()
            .map(|(name, value)| {
                SetDirective {
                    target: LeftHandSide::Variable(VariableReference::new(Identifier::new(
                        name.as_str(),
                        None,
                    ))),
                    value: Expression::Literal(Literal::Numeric(NumericLiteral {
                        value: *value as f64,
                        origin: None,
                    })),
                    origin: None,
                }
                .into()
            })
            .collect();
        let file = File {
            name: "f".to_string(),
            block: Block::new(elements, None),
            origin: None,
        };

        let generator = Generator::default();
        let text = generator.generate(&file);
        prop_assert_eq!(&text, &generator.generate(&file));
        prop_assert_eq!(text.lines().count(), sets.len() + 1);
        for (name, value) in &sets {
            let line = format!("#set(${} = {})", name, value);
            prop_assert!(text.contains(&line));
        }
    }
}
