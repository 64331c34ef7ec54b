//! Python source parsing
//!
//! Wraps a tree-sitter parse of an application module and exposes typed views over
//! the handful of constructs the diagnostic passes inspect. The views are syntactic:
//! names are compared as written, nothing is resolved or type-checked.

use tree_sitter::{Node, Parser, Tree};

use crate::error::{ParseError, SyntaxError};

/// Node kinds that open a new Python scope
const SCOPE_KINDS: &[&str] = &["function_definition", "class_definition", "lambda"];

/// Parsed Python module
///
/// Owns the source text and its syntax tree. Dropped once the passes that borrow it
/// have finished.
pub struct SourceTree {
    source: String,
    tree: Tree,
}

impl std::fmt::Debug for SourceTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceTree")
            .field("bytes", &self.source.len())
            .field("root", &self.tree.root_node().kind())
            .finish()
    }
}

impl SourceTree {
    /// Parse source text
    ///
    /// # Errors
    /// Returns [`ParseError::Syntax`] positioned at the first malformed construct when
    /// the module does not parse cleanly.
    pub fn parse(source: impl Into<String>) -> Result<Self, ParseError> {
        let source = source.into();

        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| ParseError::ParserInit(e.to_string()))?;

        let tree = parser.parse(&source, None).ok_or(ParseError::ParseFailed)?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(first_syntax_error(root, &source).into());
        }

        Ok(Self { source, tree })
    }

    /// Source text
    #[inline]
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Module node
    #[inline]
    #[must_use]
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Text covered by a node
    #[inline]
    #[must_use]
    pub fn text<'a>(&'a self, node: Node<'_>) -> &'a str {
        node_text(node, &self.source)
    }

    /// Every node of the module, preorder
    #[must_use]
    pub fn walk(&self) -> Preorder<'_> {
        Preorder::new(self.root(), false)
    }

    /// All class definitions, in source order, including nested ones
    #[must_use]
    pub fn classes(&self) -> Vec<ClassDef<'_>> {
        self.walk()
            .filter(|n| n.kind() == "class_definition")
            .filter_map(|n| ClassDef::from_node(n, &self.source))
            .collect()
    }

    /// All function definitions, in source order
    #[must_use]
    pub fn functions(&self) -> Vec<FunctionDef<'_>> {
        self.walk()
            .filter(|n| n.kind() == "function_definition")
            .filter_map(|n| FunctionDef::from_node(n, &self.source))
            .collect()
    }

    /// Names bound by `import` and `from … import` statements anywhere in the module
    #[must_use]
    pub fn imports(&self) -> Vec<ImportedName> {
        let mut names = Vec::new();
        for node in self.walk() {
            match node.kind() {
                "import_from_statement" => {
                    let module = node
                        .child_by_field_name("module_name")
                        .map(|m| self.text(m).to_string());
                    collect_imported(node, &self.source, module.as_deref(), &mut names);

                    let mut cursor = node.walk();
                    let wildcard = node
                        .named_children(&mut cursor)
                        .any(|c| c.kind() == "wildcard_import");
                    if wildcard {
                        names.push(ImportedName {
                            module,
                            name: "*".to_string(),
                            alias: None,
                            line: line_of(node),
                        });
                    }
                }
                "import_statement" => collect_imported(node, &self.source, None, &mut names),
                _ => {}
            }
        }
        names
    }

    /// String literals assigned to one of `targets` (`CSS = """…"""`)
    #[must_use]
    pub fn string_assignments(&self, targets: &[&str]) -> Vec<StringAssignment> {
        let mut found = Vec::new();
        for node in self.walk().filter(|n| n.kind() == "assignment") {
            let Some(left) = node.child_by_field_name("left") else {
                continue;
            };
            if left.kind() != "identifier" || !targets.contains(&self.text(left)) {
                continue;
            }
            let Some(right) = node.child_by_field_name("right") else {
                continue;
            };

            let pieces: Vec<Node<'_>> = match right.kind() {
                "string" => vec![right],
                "concatenated_string" => {
                    let mut cursor = right.walk();
                    right
                        .named_children(&mut cursor)
                        .filter(|c| c.kind() == "string")
                        .collect()
                }
                _ => Vec::new(),
            };

            for piece in pieces {
                if let Some(value) = string_literal(piece, &self.source) {
                    found.push(StringAssignment {
                        target: self.text(left).to_string(),
                        value,
                        line: line_of(piece),
                    });
                }
            }
        }
        found
    }

    /// 0-based line before which a new top-level import may be inserted
    ///
    /// Skips leading comments (shebang, encoding, license), the module docstring and
    /// `from __future__` imports, all of which must stay ahead of other statements.
    #[must_use]
    pub fn preamble_end_line(&self) -> usize {
        let root = self.root();
        let mut cursor = root.walk();
        let mut insert_at = 0;
        let mut seen_statement = false;

        for child in root.named_children(&mut cursor) {
            let skip = match child.kind() {
                "comment" => true,
                "expression_statement" if !seen_statement => child
                    .named_child(0)
                    .is_some_and(|c| c.kind() == "string"),
                "future_import_statement" => true,
                "import_from_statement" => child
                    .child_by_field_name("module_name")
                    .is_some_and(|m| self.text(m) == "__future__"),
                _ => false,
            };
            if !skip {
                break;
            }
            if child.kind() != "comment" {
                seen_statement = true;
            }
            insert_at = child.end_position().row + 1;
        }

        insert_at
    }
}

/// Preorder traversal over a subtree
///
/// With scoping enabled, nested function, class and lambda bodies below the starting
/// node are yielded but not descended into.
pub struct Preorder<'t> {
    stack: Vec<Node<'t>>,
    root_id: usize,
    scoped: bool,
}

impl<'t> Preorder<'t> {
    fn new(root: Node<'t>, scoped: bool) -> Self {
        Self {
            stack: vec![root],
            root_id: root.id(),
            scoped,
        }
    }
}

impl<'t> Iterator for Preorder<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Node<'t>> {
        let node = self.stack.pop()?;

        let opens_scope = node.id() != self.root_id && SCOPE_KINDS.contains(&node.kind());
        if !(self.scoped && opens_scope) {
            for i in (0..node.child_count()).rev() {
                if let Some(child) = node.child(i) {
                    self.stack.push(child);
                }
            }
        }

        Some(node)
    }
}

/// All nodes below `node`, preorder
#[must_use]
pub fn descendants(node: Node<'_>) -> Preorder<'_> {
    Preorder::new(node, false)
}

/// Nodes below `node` that belong to the same scope
#[must_use]
pub fn scope_descendants(node: Node<'_>) -> Preorder<'_> {
    Preorder::new(node, true)
}

/// 1-based line of a node's first byte
#[inline]
#[must_use]
pub fn line_of(node: Node<'_>) -> usize {
    node.start_position().row + 1
}

/// Class definition view
#[derive(Debug, Clone)]
pub struct ClassDef<'t> {
    /// Underlying node
    pub node: Node<'t>,
    /// Class name
    pub name: String,
    /// Base expressions as written (`App`, `textual.app.App`, `App[None]`)
    pub bases: Vec<String>,
    /// 1-based line of the `class` keyword
    pub line: usize,
    source: &'t str,
}

impl<'t> ClassDef<'t> {
    /// Build view from a `class_definition` node
    #[must_use]
    pub fn from_node(node: Node<'t>, source: &'t str) -> Option<Self> {
        if node.kind() != "class_definition" {
            return None;
        }
        let name = node_text(node.child_by_field_name("name")?, source).to_string();

        let mut bases = Vec::new();
        if let Some(args) = node.child_by_field_name("superclasses") {
            let mut cursor = args.walk();
            for arg in args.named_children(&mut cursor) {
                if matches!(arg.kind(), "keyword_argument" | "comment") {
                    continue;
                }
                bases.push(node_text(arg, source).to_string());
            }
        }

        Some(Self {
            node,
            name,
            bases,
            line: line_of(node),
            source,
        })
    }

    /// Whether any base names `base`, ignoring qualification and subscripts
    ///
    /// `App`, `textual.app.App` and `App[None]` all name `App`.
    #[must_use]
    pub fn inherits_from(&self, base: &str) -> bool {
        self.bases.iter().any(|b| base_name(b) == base)
    }

    /// Methods defined directly in the class body, decorated ones included
    #[must_use]
    pub fn methods(&self) -> Vec<FunctionDef<'t>> {
        let Some(body) = self.node.child_by_field_name("body") else {
            return Vec::new();
        };
        let mut cursor = body.walk();
        body.named_children(&mut cursor)
            .filter_map(|stmt| match stmt.kind() {
                "function_definition" => Some(stmt),
                "decorated_definition" => stmt.child_by_field_name("definition"),
                _ => None,
            })
            .filter_map(|def| FunctionDef::from_node(def, self.source))
            .collect()
    }

    /// Method by name
    #[must_use]
    pub fn method(&self, name: &str) -> Option<FunctionDef<'t>> {
        self.methods().into_iter().find(|m| m.name == name)
    }
}

/// Function or method definition view
#[derive(Debug, Clone)]
pub struct FunctionDef<'t> {
    /// Underlying node
    pub node: Node<'t>,
    /// Function name
    pub name: String,
    /// Parameter names as declared, receiver included (`self`, `event`, `*args`)
    pub params: Vec<String>,
    /// Return annotation text, if any
    pub returns: Option<String>,
    /// Name of the directly enclosing class, for methods
    pub class: Option<String>,
    /// 1-based line of the `def` keyword
    pub line: usize,
    source: &'t str,
}

impl<'t> FunctionDef<'t> {
    /// Build view from a `function_definition` node
    #[must_use]
    pub fn from_node(node: Node<'t>, source: &'t str) -> Option<Self> {
        if node.kind() != "function_definition" {
            return None;
        }
        let name = node_text(node.child_by_field_name("name")?, source).to_string();

        let params = node
            .child_by_field_name("parameters")
            .map(|p| parameter_names(p, source))
            .unwrap_or_default();

        let returns = node
            .child_by_field_name("return_type")
            .map(|r| node_text(r, source).to_string());

        Some(Self {
            node,
            name,
            params,
            returns,
            class: enclosing_class(node, source),
            line: line_of(node),
            source,
        })
    }

    /// Whether this is defined directly in a class body
    #[inline]
    #[must_use]
    pub fn is_method(&self) -> bool {
        self.class.is_some()
    }

    /// Parameters after the implicit receiver
    #[must_use]
    pub fn explicit_params(&self) -> &[String] {
        match self.params.first() {
            Some(first) if self.is_method() && !first.starts_with('*') => &self.params[1..],
            _ => &self.params,
        }
    }

    /// `yield` expressions in the function's own scope
    #[must_use]
    pub fn yields(&self) -> Vec<Node<'t>> {
        scope_descendants(self.node)
            .filter(|n| n.kind() == "yield")
            .collect()
    }

    /// Call expressions in the function's own scope
    #[must_use]
    pub fn calls(&self) -> Vec<CallSite<'t>> {
        scope_descendants(self.node)
            .filter_map(|n| CallSite::from_node(n, self.source))
            .collect()
    }

    /// Function body block
    #[must_use]
    pub fn body(&self) -> Option<Node<'t>> {
        self.node.child_by_field_name("body")
    }
}

/// A name bound by an import statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedName {
    /// Source module for `from … import`, `None` for plain `import`
    pub module: Option<String>,
    /// Imported name as written (`App`, `textual.app`)
    pub name: String,
    /// `as` alias
    pub alias: Option<String>,
    /// 1-based line of the import statement
    pub line: usize,
}

impl ImportedName {
    /// Name visible in the importing module
    #[inline]
    #[must_use]
    pub fn bound_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Call expression view
#[derive(Debug, Clone)]
pub struct CallSite<'t> {
    /// Underlying `call` node
    pub node: Node<'t>,
    /// Final name segment of the callee (`Button` for `widgets.Button(…)`)
    pub callee: String,
    /// Callee expression as written
    pub path: String,
    /// 1-based line
    pub line: usize,
    source: &'t str,
}

impl<'t> CallSite<'t> {
    /// Build view from a `call` node
    #[must_use]
    pub fn from_node(node: Node<'t>, source: &'t str) -> Option<Self> {
        if node.kind() != "call" {
            return None;
        }
        let function = node.child_by_field_name("function")?;
        let callee = match function.kind() {
            "attribute" => node_text(function.child_by_field_name("attribute")?, source),
            _ => node_text(function, source),
        };

        Some(Self {
            node,
            callee: callee.to_string(),
            path: node_text(function, source).to_string(),
            line: line_of(node),
            source,
        })
    }

    /// Receiver of an attribute call (`self` for `self.query_one(…)`)
    #[must_use]
    pub fn receiver(&self) -> Option<&'t str> {
        let function = self.node.child_by_field_name("function")?;
        if function.kind() != "attribute" {
            return None;
        }
        Some(node_text(function.child_by_field_name("object")?, self.source))
    }

    /// Positional argument expressions
    #[must_use]
    pub fn positional_args(&self) -> Vec<Node<'t>> {
        let Some(args) = self.node.child_by_field_name("arguments") else {
            return Vec::new();
        };
        let mut cursor = args.walk();
        args.named_children(&mut cursor)
            .filter(|a| !matches!(a.kind(), "keyword_argument" | "comment"))
            .collect()
    }

    /// String literal passed as keyword `name`
    #[must_use]
    pub fn keyword_string(&self, name: &str) -> Option<String> {
        let args = self.node.child_by_field_name("arguments")?;
        let mut cursor = args.walk();
        let value = args
            .named_children(&mut cursor)
            .filter(|a| a.kind() == "keyword_argument")
            .find(|a| {
                a.child_by_field_name("name")
                    .is_some_and(|n| node_text(n, self.source) == name)
            })?
            .child_by_field_name("value")?;
        string_literal(value, self.source)
    }
}

/// String literal bound to a name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringAssignment {
    /// Assigned name (`CSS`)
    pub target: String,
    /// Literal content between the quotes
    pub value: String,
    /// 1-based line on which the literal opens
    pub line: usize,
}

impl StringAssignment {
    /// Source line of the `n`th (1-based) line of the literal content
    #[inline]
    #[must_use]
    pub fn source_line(&self, n: usize) -> usize {
        self.line + n.saturating_sub(1)
    }
}

/// Content of a string literal node, quotes and prefixes removed
#[must_use]
pub fn string_literal(node: Node<'_>, source: &str) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }

    let mut start = None;
    let mut end = None;
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            match child.kind() {
                "string_start" => start = Some(child.end_byte()),
                "string_end" => end = Some(child.start_byte()),
                _ => {}
            }
        }
    }

    match (start, end) {
        (Some(s), Some(e)) if s <= e => source.get(s..e).map(str::to_string),
        _ => None,
    }
}

fn node_text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    source.get(node.byte_range()).unwrap_or("")
}

fn base_name(text: &str) -> &str {
    let head = text.split('[').next().unwrap_or(text).trim();
    head.rsplit('.').next().unwrap_or(head)
}

fn enclosing_class(node: Node<'_>, source: &str) -> Option<String> {
    let mut current = node.parent();
    while let Some(parent) = current {
        match parent.kind() {
            "class_definition" => {
                return parent
                    .child_by_field_name("name")
                    .map(|n| node_text(n, source).to_string());
            }
            "function_definition" | "lambda" | "module" => return None,
            _ => current = parent.parent(),
        }
    }
    None
}

fn parameter_names(params: Node<'_>, source: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = params.walk();
    for param in params.named_children(&mut cursor) {
        let name = match param.kind() {
            "identifier" | "list_splat_pattern" | "dictionary_splat_pattern" => {
                Some(node_text(param, source).to_string())
            }
            "default_parameter" | "typed_default_parameter" => param
                .child_by_field_name("name")
                .map(|n| node_text(n, source).to_string()),
            "typed_parameter" => param
                .named_child(0)
                .map(|n| node_text(n, source).to_string()),
            _ => None,
        };
        if let Some(name) = name {
            names.push(name);
        }
    }
    names
}

fn collect_imported(
    stmt: Node<'_>,
    source: &str,
    module: Option<&str>,
    out: &mut Vec<ImportedName>,
) {
    let mut cursor = stmt.walk();
    let entries: Vec<Node<'_>> = stmt.children_by_field_name("name", &mut cursor).collect();

    for entry in entries {
        let (name, alias) = match entry.kind() {
            "aliased_import" => (
                entry
                    .child_by_field_name("name")
                    .map(|n| node_text(n, source).to_string()),
                entry
                    .child_by_field_name("alias")
                    .map(|a| node_text(a, source).to_string()),
            ),
            _ => (Some(node_text(entry, source).to_string()), None),
        };

        if let Some(name) = name {
            out.push(ImportedName {
                module: module.map(str::to_string),
                name,
                alias,
                line: line_of(stmt),
            });
        }
    }
}

fn first_syntax_error(root: Node<'_>, source: &str) -> SyntaxError {
    let culprit = descendants(root).find(|n| n.is_error() || n.is_missing());

    match culprit {
        Some(node) => {
            let pos = node.start_position();
            let message = if node.is_missing() {
                format!("expected '{}'", node.kind())
            } else {
                let snippet: String = node_text(node, source)
                    .lines()
                    .next()
                    .unwrap_or("")
                    .trim()
                    .chars()
                    .take(24)
                    .collect();
                if snippet.is_empty() {
                    "invalid syntax".to_string()
                } else {
                    format!("invalid syntax near '{snippet}'")
                }
            };
            SyntaxError::new(pos.row + 1, pos.column + 1, message)
        }
        None => SyntaxError::new(1, 1, "invalid syntax"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const APP: &str = r##"from textual.app import App, ComposeResult as CR
from textual.widgets import Button, Header

class Demo(App[None]):
    CSS = """
Screen {
    layout: vertical;
}
"""

    def compose(self) -> CR:
        yield Header()
        yield Button("go", id="go", classes="primary wide")

    async def on_button_pressed(self, event: Button.Pressed) -> None:
        def helper():
            yield 1
        self.query_one("#go")
"##;

    #[test]
    fn parses_clean_source() {
        let tree = SourceTree::parse(APP).unwrap();
        assert_eq!(tree.root().kind(), "module");
    }

    #[test]
    fn reports_first_syntax_error() {
        let err = SourceTree::parse("class Broken(App:\n    pass\n").unwrap_err();
        match err {
            ParseError::Syntax(e) => assert_eq!(e.line, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn class_bases_are_matched_by_name() {
        let tree = SourceTree::parse(APP).unwrap();
        let classes = tree.classes();
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].name, "Demo");
        assert!(classes[0].inherits_from("App"));
        assert!(!classes[0].inherits_from("Screen"));
    }

    #[test]
    fn qualified_base_is_matched() {
        let tree = SourceTree::parse("import textual.app\nclass A(textual.app.App):\n    pass\n").unwrap();
        assert!(tree.classes()[0].inherits_from("App"));
    }

    #[test]
    fn methods_include_async_and_annotations() {
        let tree = SourceTree::parse(APP).unwrap();
        let class = &tree.classes()[0];
        let compose = class.method("compose").unwrap();
        assert_eq!(compose.returns.as_deref(), Some("CR"));
        assert_eq!(compose.params, vec!["self".to_string()]);
        assert!(compose.explicit_params().is_empty());

        let handler = class.method("on_button_pressed").unwrap();
        assert_eq!(handler.explicit_params(), &["event".to_string()]);
        assert_eq!(handler.class.as_deref(), Some("Demo"));
    }

    #[test]
    fn yields_stay_in_scope() {
        let tree = SourceTree::parse(APP).unwrap();
        let class = &tree.classes()[0];
        assert_eq!(class.method("compose").unwrap().yields().len(), 2);
        assert!(class.method("on_button_pressed").unwrap().yields().is_empty());
    }

    #[test]
    fn imports_record_aliases() {
        let tree = SourceTree::parse(APP).unwrap();
        let imports = tree.imports();
        let compose_result = imports.iter().find(|i| i.name == "ComposeResult").unwrap();
        assert_eq!(compose_result.bound_name(), "CR");
        assert_eq!(compose_result.module.as_deref(), Some("textual.app"));
        assert!(imports.iter().any(|i| i.name == "Button"));
    }

    #[test]
    fn call_sites_expose_keywords_and_receivers() {
        let tree = SourceTree::parse(APP).unwrap();
        let class = &tree.classes()[0];
        let calls = class.method("compose").unwrap().calls();
        let button = calls.iter().find(|c| c.callee == "Button").unwrap();
        assert_eq!(button.keyword_string("id").as_deref(), Some("go"));
        assert_eq!(button.keyword_string("classes").as_deref(), Some("primary wide"));
        assert_eq!(button.positional_args().len(), 1);

        let query = class
            .method("on_button_pressed")
            .unwrap()
            .calls()
            .into_iter()
            .find(|c| c.callee == "query_one")
            .unwrap();
        assert_eq!(query.receiver(), Some("self"));
    }

    #[test]
    fn string_assignments_keep_source_lines() {
        let tree = SourceTree::parse(APP).unwrap();
        let css = tree.string_assignments(&["CSS"]);
        assert_eq!(css.len(), 1);
        assert_eq!(css[0].line, 5);
        assert!(css[0].value.contains("layout: vertical;"));
        // content line 2 is "Screen {"
        assert_eq!(css[0].source_line(2), 6);
    }

    #[test]
    fn preamble_skips_docstring_and_future_imports() {
        let src = "#!/usr/bin/env python\n\"\"\"Doc.\"\"\"\nfrom __future__ import annotations\nimport os\n";
        let tree = SourceTree::parse(src).unwrap();
        assert_eq!(tree.preamble_end_line(), 3);

        let plain = SourceTree::parse("import os\n").unwrap();
        assert_eq!(plain.preamble_end_line(), 0);
    }
}
