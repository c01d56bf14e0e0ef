//! Declarations of the helper libraries a template source may import.
//!
//! Names imported from any module under the `@ts2vtl` scope denote VTL
//! built-ins rather than user code. The tables below describe what each
//! known module exports and, where it matters for statement emission, what
//! its calls return.

use crate::ast::{HelperKind, ReturnKind};

/// The package scope reserved for helper libraries.
pub const HELPER_SCOPE: &str = "@ts2vtl";

pub const JAVA_TYPES: &str = "@ts2vtl/java-types";
pub const AWS_APPSYNC: &str = "@ts2vtl/aws-appsync";
pub const AWS_APIGATEWAY: &str = "@ts2vtl/aws-apigateway";

/// The receiver-first helper that builds a range literal instead of a call.
pub const RANGE_HELPER: &str = "Range";

/// The string-utility class; using it requires the `$String` prelude.
pub const STRING_CLASS: &str = "String";

struct HelperModule {
    name: &'static str,
    exports: &'static [(&'static str, HelperKind)],
}

static MODULES: &[HelperModule] = &[
    HelperModule {
        name: JAVA_TYPES,
        exports: &[
            ("Range", HelperKind::Function),
            ("add", HelperKind::Function),
            ("addAll", HelperKind::Function),
            ("clear", HelperKind::Function),
            ("clone", HelperKind::Function),
            ("contains", HelperKind::Function),
            ("containsKey", HelperKind::Function),
            ("containsValue", HelperKind::Function),
            ("entrySet", HelperKind::Function),
            ("get", HelperKind::Function),
            ("getOrDefault", HelperKind::Function),
            ("isEmpty", HelperKind::Function),
            ("keySet", HelperKind::Function),
            ("values", HelperKind::Function),
            ("foreach", HelperKind::Value),
            ("Entry", HelperKind::Type),
            ("String", HelperKind::StringUtility),
        ],
    },
    HelperModule {
        name: AWS_APPSYNC,
        exports: &[
            ("$util", HelperKind::Value),
            ("$context", HelperKind::Value),
            ("$ctx", HelperKind::Value),
            ("RequestContext", HelperKind::Type),
            ("ResponseContext", HelperKind::Type),
            ("Error", HelperKind::Type),
            ("Util", HelperKind::Type),
        ],
    },
    HelperModule {
        name: AWS_APIGATEWAY,
        exports: &[
            ("$method", HelperKind::Value),
            ("$integration", HelperKind::Value),
            ("$context", HelperKind::Value),
            ("$input", HelperKind::Value),
            ("$stageVariables", HelperKind::Value),
            ("$util", HelperKind::Value),
            ("Context", HelperKind::Type),
        ],
    },
];

/// Declared return kinds of receiver-first helper functions, by total
/// argument count (receiver included). `None` matches any count.
static FUNCTION_RETURNS: &[(&str, Option<usize>, ReturnKind)] = &[
    ("add", Some(3), ReturnKind::Void),
    ("add", None, ReturnKind::Value),
    ("clear", None, ReturnKind::Void),
    ("addAll", None, ReturnKind::Value),
    ("clone", None, ReturnKind::Value),
    ("contains", None, ReturnKind::Value),
    ("containsKey", None, ReturnKind::Value),
    ("containsValue", None, ReturnKind::Value),
    ("entrySet", None, ReturnKind::Value),
    ("get", None, ReturnKind::Value),
    ("getOrDefault", None, ReturnKind::Value),
    ("isEmpty", None, ReturnKind::Value),
    ("keySet", None, ReturnKind::Value),
    ("values", None, ReturnKind::Value),
    ("Range", None, ReturnKind::Value),
];

/// Declared return kinds of methods reached through a helper value, keyed by
/// module, exported root and property path.
static METHOD_RETURNS: &[(&str, &str, &[&str], ReturnKind)] = &[
    (AWS_APPSYNC, "$util", &["error"], ReturnKind::Never),
    (AWS_APPSYNC, "$util", &["unauthorized"], ReturnKind::Never),
    (AWS_APPSYNC, "$util", &["appendError"], ReturnKind::Void),
    (AWS_APPSYNC, "$util", &["isNull"], ReturnKind::Value),
    (AWS_APPSYNC, "$util", &["isNullOrEmpty"], ReturnKind::Value),
    (AWS_APPSYNC, "$util", &["isNullOrBlank"], ReturnKind::Value),
    (AWS_APPSYNC, "$util", &["toJson"], ReturnKind::Value),
    (AWS_APPSYNC, "$util", &["autoId"], ReturnKind::Value),
    (AWS_APPSYNC, "$util", &["qr"], ReturnKind::Value),
    (AWS_APPSYNC, "$util", &["dynamodb", "toDynamoDB"], ReturnKind::Value),
    (AWS_APPSYNC, "$util", &["dynamodb", "toDynamoDBJson"], ReturnKind::Value),
    (AWS_APPSYNC, "$util", &["dynamodb", "toMapValues"], ReturnKind::Value),
    (AWS_APPSYNC, "$util", &["time", "nowISO8601"], ReturnKind::Value),
    (AWS_APPSYNC, "$util", &["time", "nowEpochSeconds"], ReturnKind::Value),
    (AWS_APPSYNC, "$util", &["time", "nowEpochMilliSeconds"], ReturnKind::Value),
    (AWS_APIGATEWAY, "$util", &["escapeJavaScript"], ReturnKind::Value),
    (AWS_APIGATEWAY, "$util", &["parseJson"], ReturnKind::Value),
    (AWS_APIGATEWAY, "$util", &["urlEncode"], ReturnKind::Value),
    (AWS_APIGATEWAY, "$util", &["urlDecode"], ReturnKind::Value),
    (AWS_APIGATEWAY, "$util", &["base64Encode"], ReturnKind::Value),
    (AWS_APIGATEWAY, "$util", &["base64Decode"], ReturnKind::Value),
    (AWS_APIGATEWAY, "$input", &["body"], ReturnKind::Value),
    (AWS_APIGATEWAY, "$input", &["json"], ReturnKind::Value),
    (AWS_APIGATEWAY, "$input", &["params"], ReturnKind::Value),
    (AWS_APIGATEWAY, "$input", &["path"], ReturnKind::Value),
    (JAVA_TYPES, "String", &["join"], ReturnKind::Value),
    (JAVA_TYPES, "String", &["format"], ReturnKind::Value),
];

/// Whether a module specifier or file path lies under the helper scope.
pub fn is_helper_module(specifier: &str) -> bool {
    specifier
        .split(|c| c == '/' || c == '\\')
        .any(|segment| segment == HELPER_SCOPE)
}

/// The kind of an export of a helper module. Unknown modules and names
/// under the helper scope are still helpers; they are treated as values.
pub fn export_kind(module: &str, export: &str) -> HelperKind {
    MODULES
        .iter()
        .find(|m| m.name == module)
        .and_then(|m| m.exports.iter().find(|(name, _)| *name == export))
        .map(|(_, kind)| *kind)
        .unwrap_or(HelperKind::Value)
}

/// Exported names of a known helper module.
pub fn exports(module: &str) -> impl Iterator<Item = &'static str> + '_ {
    MODULES
        .iter()
        .filter(move |m| m.name == module)
        .flat_map(|m| m.exports.iter().map(|(name, _)| *name))
}

/// Return kind of a receiver-first helper call with `arity` arguments.
pub fn function_return(export: &str, arity: usize) -> ReturnKind {
    FUNCTION_RETURNS
        .iter()
        .find(|(name, count, _)| *name == export && count.map_or(true, |c| c == arity))
        .map(|(_, _, kind)| *kind)
        .unwrap_or(ReturnKind::Unknown)
}

/// Return kind of `root.path[0].path[1]...(...)` where `root` is a helper value.
pub fn method_return(module: &str, root: &str, path: &[&str]) -> ReturnKind {
    METHOD_RETURNS
        .iter()
        .find(|(m, r, p, _)| *m == module && *r == root && *p == path)
        .map(|(_, _, _, kind)| *kind)
        .unwrap_or(ReturnKind::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helper_scope_matches_segments_only() {
        assert!(is_helper_module("@ts2vtl/java-types"));
        assert!(is_helper_module("node_modules/@ts2vtl/aws-appsync/index.ts"));
        assert!(is_helper_module("node_modules\\@ts2vtl\\x.ts"));
        assert!(!is_helper_module("@ts2vtl-extra/java-types"));
        assert!(!is_helper_module("./templates/request.ts"));
    }

    #[test]
    fn add_with_index_is_void() {
        assert_eq!(function_return("add", 3), ReturnKind::Void);
        assert_eq!(function_return("add", 2), ReturnKind::Value);
        assert_eq!(function_return("clear", 1), ReturnKind::Void);
        assert_eq!(function_return("unknownThing", 1), ReturnKind::Unknown);
    }

    #[test]
    fn util_error_never_returns() {
        assert_eq!(method_return(AWS_APPSYNC, "$util", &["error"]), ReturnKind::Never);
        assert_eq!(method_return(AWS_APPSYNC, "$util", &["appendError"]), ReturnKind::Void);
        assert_eq!(method_return(AWS_APIGATEWAY, "$util", &["error"]), ReturnKind::Unknown);
    }

    #[test]
    fn unknown_exports_are_values() {
        assert_eq!(export_kind(JAVA_TYPES, "String"), HelperKind::StringUtility);
        assert_eq!(export_kind("@ts2vtl/custom", "thing"), HelperKind::Value);
        assert!(exports(AWS_APIGATEWAY).any(|name| name == "$input"));
    }

    #[test]
    fn exports_of_unknown_module_are_empty() {
        assert!(exports(JAVA_TYPES).any(|name| name == "Range"));
        assert_eq!(exports("@ts2vtl/custom").count(), 0);
    }
}
