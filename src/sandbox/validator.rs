//! Static import denylist over the Python syntax tree.
//!
//! This filter only looks at `import` and `from ... import` statements. It
//! does not see `getattr(__builtins__, ...)`, `importlib`, aliasing through
//! already-imported modules, or bare calls such as `eval(...)`. Passing it is
//! a necessary condition for execution, never a proof of safety.

use rustpython_parser::{ast, Parse};

use super::policy::{IsolationPolicy, Rejection, ValidationVerdict};

/// Tokens that must not appear anywhere in an imported module name.
///
/// Matching is by substring, so `osprey` and `myopener` are refused along
/// with `os` and `open`.
pub const DENYLIST: &[&str] = &[
    "os",
    "subprocess",
    "sys",
    "__import__",
    "eval",
    "exec",
    "open",
    "file",
    "input",
    "compile",
    "reload",
];

/// Source path reported by the parser in error locations.
const SOURCE_PATH: &str = "<fragment>";

/// Denylist-based [`IsolationPolicy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator;

impl Validator {
    /// Creates a validator over [`DENYLIST`].
    pub fn new() -> Self {
        Self
    }

    /// Parses the source and scans its imports.
    pub fn inspect(&self, source: &str) -> Result<(), Rejection> {
        let suite = ast::Suite::parse(source, SOURCE_PATH)
            .map_err(|e| Rejection::Syntax(e.to_string()))?;

        match self.find_forbidden(&suite) {
            Some(module) => Err(Rejection::ForbiddenImport(module)),
            None => Ok(()),
        }
    }

    /// Returns true if the module name contains any denylisted token.
    pub fn is_denied(&self, module: &str) -> bool {
        DENYLIST.iter().any(|token| module.contains(token))
    }

    /// Depth-first walk returning the first forbidden module in source order.
    fn find_forbidden(&self, body: &[ast::Stmt]) -> Option<String> {
        body.iter().find_map(|stmt| self.find_in_stmt(stmt))
    }

    fn find_in_blocks<'a>(
        &self,
        blocks: impl IntoIterator<Item = &'a [ast::Stmt]>,
    ) -> Option<String> {
        blocks
            .into_iter()
            .find_map(|block| self.find_forbidden(block))
    }

    fn find_in_stmt(&self, stmt: &ast::Stmt) -> Option<String> {
        match stmt {
            ast::Stmt::Import(node) => node
                .names
                .iter()
                .map(|alias| alias.name.as_str())
                .find(|name| self.is_denied(name))
                .map(str::to_string),
            // A relative `from . import x` carries no module name.
            ast::Stmt::ImportFrom(node) => node
                .module
                .as_ref()
                .map(|module| module.as_str())
                .filter(|module| self.is_denied(module))
                .map(str::to_string),
            ast::Stmt::FunctionDef(node) => self.find_forbidden(&node.body),
            ast::Stmt::AsyncFunctionDef(node) => self.find_forbidden(&node.body),
            ast::Stmt::ClassDef(node) => self.find_forbidden(&node.body),
            ast::Stmt::For(node) => self.find_in_blocks([&node.body[..], &node.orelse[..]]),
            ast::Stmt::AsyncFor(node) => {
                self.find_in_blocks([&node.body[..], &node.orelse[..]])
            }
            ast::Stmt::While(node) => self.find_in_blocks([&node.body[..], &node.orelse[..]]),
            ast::Stmt::If(node) => self.find_in_blocks([&node.body[..], &node.orelse[..]]),
            ast::Stmt::With(node) => self.find_forbidden(&node.body),
            ast::Stmt::AsyncWith(node) => self.find_forbidden(&node.body),
            ast::Stmt::Try(node) => self
                .find_forbidden(&node.body)
                .or_else(|| self.find_in_handlers(&node.handlers))
                .or_else(|| self.find_in_blocks([&node.orelse[..], &node.finalbody[..]])),
            ast::Stmt::TryStar(node) => self
                .find_forbidden(&node.body)
                .or_else(|| self.find_in_handlers(&node.handlers))
                .or_else(|| self.find_in_blocks([&node.orelse[..], &node.finalbody[..]])),
            ast::Stmt::Match(node) => node
                .cases
                .iter()
                .find_map(|case| self.find_forbidden(&case.body)),
            _ => None,
        }
    }

    fn find_in_handlers(&self, handlers: &[ast::ExceptHandler]) -> Option<String> {
        handlers.iter().find_map(|handler| match handler {
            ast::ExceptHandler::ExceptHandler(handler) => self.find_forbidden(&handler.body),
        })
    }
}

impl IsolationPolicy for Validator {
    fn check(&self, source: &str) -> ValidationVerdict {
        ValidationVerdict::from(self.inspect(source))
    }

    fn name(&self) -> &str {
        "import-denylist"
    }
}
