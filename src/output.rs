use std::path::{Component, Path, PathBuf};

use tracing::info;

use crate::error::{CliError, CliResult};

/// The deepest directory containing every path. Absolute paths always share
/// at least the root; relative paths with nothing in common yield an empty
/// path (the working directory).
pub fn base_dir<I, P>(paths: I) -> PathBuf
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut paths = paths.into_iter();
    let first = match paths.next() {
        Some(first) => first,
        None => return PathBuf::new(),
    };
    let mut base: Vec<Component> = first
        .as_ref()
        .parent()
        .map(|parent| parent.components().collect())
        .unwrap_or_default();

    for path in paths {
        let shared = base
            .iter()
            .zip(path.as_ref().components())
            .take_while(|(a, b)| *a == b)
            .count();
        base.truncate(shared);
    }

    base.iter().collect()
}

/// Where the templates of one source go under `out_dir`.
///
/// A source whose only function is the default export maps to
/// `<rel>.vtl`; otherwise each function gets `<rel-without-ext>/<name>.vtl`.
/// `rel` is the source path relative to `base`.
pub fn plan_outputs(out_dir: &Path, base: &Path, source: &Path, names: &[&str]) -> Vec<PathBuf> {
    let rel = match source.strip_prefix(base) {
        Ok(rel) => rel.to_path_buf(),
        Err(_) => source
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| source.to_path_buf()),
    };

    if let [only] = names {
        if *only == "default" {
            return vec![out_dir.join(rel.with_extension("vtl"))];
        }
    }

    let stem = out_dir.join(rel.with_extension(""));
    names
        .iter()
        .map(|name| stem.join(format!("{}.vtl", name)))
        .collect()
}

/// Write a template, creating parent directories as needed.
pub fn write_template(path: &Path, template: &str) -> CliResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| CliError::io(parent, e))?;
        }
    }
    std::fs::write(path, template).map_err(|e| CliError::io(path, e))?;
    info!(path = %path.display(), "wrote template");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_dir_of_siblings_and_nested() {
        let paths = [
            "/work/templates/Query_getItem.ts",
            "/work/templates/apigateway/test.ts",
        ];
        assert_eq!(base_dir(paths), PathBuf::from("/work/templates"));
        assert_eq!(base_dir(["/a.ts", "/b/c.ts"]), PathBuf::from("/"));
        assert_eq!(base_dir(["a.ts", "b/c.ts"]), PathBuf::new());
        assert_eq!(base_dir(Vec::<&str>::new()), PathBuf::new());
    }

    #[test]
    fn single_default_function_keeps_source_name() {
        let planned = plan_outputs(
            Path::new("out"),
            Path::new("/src"),
            Path::new("/src/apigateway/test.ts"),
            &["default"],
        );
        assert_eq!(planned, vec![PathBuf::from("out/apigateway/test.vtl")]);
    }

    #[test]
    fn named_functions_get_a_directory() {
        let planned = plan_outputs(
            Path::new("out"),
            Path::new("/src"),
            Path::new("/src/Query_updateItem.ts"),
            &["request", "response"],
        );
        assert_eq!(
            planned,
            vec![
                PathBuf::from("out/Query_updateItem/request.vtl"),
                PathBuf::from("out/Query_updateItem/response.vtl"),
            ]
        );
    }

    #[test]
    fn write_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/request.vtl");
        write_template(&path, "#set($x = 1)").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "#set($x = 1)");
    }
}
