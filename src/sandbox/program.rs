//! Wraps a fragment into a standalone Python program.

use std::path::Path;

/// Indentation used for the body of the generated entry point.
const INDENT: &str = "    ";

/// Builds the program executed by the child interpreter.
///
/// The fragment runs inside `async def main()` so it may `await` directly.
/// `project_dir` is prepended to `sys.path` so the fragment can import the
/// caller's own helper modules.
pub fn synthesize(fragment: &str, project_dir: &Path) -> String {
    let project_dir = python_string_literal(&project_dir.to_string_lossy());

    format!(
        r#"import asyncio
import sys
import json
from pathlib import Path

sys.path.insert(0, {project_dir})

async def main():
{body}
    pass

if __name__ == "__main__":
    asyncio.run(main())
"#,
        project_dir = project_dir,
        body = indent(fragment),
    )
}

/// Indents every non-blank line by one level. Blank lines stay empty.
fn indent(fragment: &str) -> String {
    fragment
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{}{}", INDENT, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// JSON string escaping yields a valid Python string literal.
fn python_string_literal(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_fragment_in_async_main() {
        let program = synthesize("print('hi')\nx = 1", Path::new("/srv/agent"));

        assert!(program.contains("async def main():\n    print('hi')\n    x = 1\n    pass\n"));
        assert!(program.contains("asyncio.run(main())"));
    }

    #[test]
    fn includes_prelude_imports() {
        let program = synthesize("pass", Path::new("/tmp"));

        for line in [
            "import asyncio",
            "import sys",
            "import json",
            "from pathlib import Path",
        ] {
            assert!(program.lines().any(|l| l == line), "missing {}", line);
        }
    }

    #[test]
    fn inserts_project_dir_on_sys_path() {
        let program = synthesize("pass", Path::new("/srv/agent"));
        assert!(program.contains(r#"sys.path.insert(0, "/srv/agent")"#));
    }

    #[test]
    fn escapes_quotes_and_backslashes_in_project_dir() {
        let program = synthesize("pass", Path::new(r#"/tmp/we"ird\dir"#));
        assert!(program.contains(r#"sys.path.insert(0, "/tmp/we\"ird\\dir")"#));
    }

    #[test]
    fn leaves_blank_lines_unindented() {
        assert_eq!(indent("a = 1\n\n  \nb = 2"), "    a = 1\n\n\n    b = 2");
    }

    #[test]
    fn preserves_nested_indentation() {
        assert_eq!(
            indent("for i in range(2):\n    print(i)"),
            "    for i in range(2):\n        print(i)"
        );
    }

    #[test]
    fn comment_only_fragment_still_has_a_body() {
        let program = synthesize("# nothing to do", Path::new("/tmp"));
        assert!(program.contains("async def main():\n    # nothing to do\n    pass\n"));
    }
}
