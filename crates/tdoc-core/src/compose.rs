//! Declared widget trees
//!
//! Reads the widget tree a composition method declares: yielded widget calls,
//! `with Container():` blocks, and widget calls passed positionally to other widget
//! calls. A call counts as a widget construction when its callee starts with an
//! uppercase letter.

use tree_sitter::Node;

use crate::schema::COMPOSE_METHOD;
use crate::syntax::{CallSite, FunctionDef, SourceTree};

/// One declared widget
#[derive(Debug, Clone)]
pub struct WidgetDecl<'t> {
    /// Construction call
    pub call: CallSite<'t>,
    /// Index of the enclosing declaration in [`Composition::widgets`]
    pub parent: Option<usize>,
    /// 1 for top-level yields, plus one per enclosing widget
    pub depth: usize,
    /// `id=` keyword literal
    pub id: Option<String>,
    /// `classes=` keyword literal, split on whitespace
    pub classes: Vec<String>,
}

impl WidgetDecl<'_> {
    /// Widget type name as called
    #[inline]
    #[must_use]
    pub fn widget_type(&self) -> &str {
        &self.call.callee
    }
}

/// The widget tree declared by one composition method
#[derive(Debug, Clone)]
pub struct Composition<'t> {
    /// Composition method
    pub method: FunctionDef<'t>,
    /// Declarations in source order; parents precede children
    pub widgets: Vec<WidgetDecl<'t>>,
    /// `yield` expressions in the method
    pub yield_count: usize,
}

impl Composition<'_> {
    /// Class owning the method, or `<module>` for a free function
    #[must_use]
    pub fn owner(&self) -> &str {
        self.method.class.as_deref().unwrap_or("<module>")
    }

    /// Deepest declaration, 0 when nothing is declared
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.widgets.iter().map(|w| w.depth).max().unwrap_or(0)
    }

    /// Indices of declarations whose parent is `parent`
    #[must_use]
    pub fn children_of(&self, parent: Option<usize>) -> Vec<usize> {
        self.widgets
            .iter()
            .enumerate()
            .filter(|(_, w)| w.parent == parent)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Every composition method in the module, with its declared tree
#[must_use]
pub fn compositions(tree: &SourceTree) -> Vec<Composition<'_>> {
    tree.functions()
        .into_iter()
        .filter(|f| f.name == COMPOSE_METHOD && f.is_method())
        .map(|method| {
            let mut builder = Builder {
                source: tree.source(),
                scope: method.node.id(),
                widgets: Vec::new(),
                yields: 0,
            };
            if let Some(body) = method.body() {
                builder.visit(body, None, 0);
            }
            Composition {
                method,
                widgets: builder.widgets,
                yield_count: builder.yields,
            }
        })
        .collect()
}

struct Builder<'t> {
    source: &'t str,
    scope: usize,
    widgets: Vec<WidgetDecl<'t>>,
    yields: usize,
}

impl<'t> Builder<'t> {
    fn visit(&mut self, node: Node<'t>, parent: Option<usize>, depth: usize) {
        match node.kind() {
            "function_definition" | "class_definition" | "lambda" if node.id() != self.scope => {}
            "with_statement" => self.visit_with(node, parent, depth),
            "yield" => {
                self.yields += 1;
                if let Some(value) = node.named_child(0) {
                    match self.widget_call(value) {
                        Some(call) => {
                            self.declare(call, parent, depth + 1);
                        }
                        None => self.visit(value, parent, depth),
                    }
                }
            }
            _ => {
                for i in 0..node.child_count() {
                    if let Some(child) = node.child(i) {
                        self.visit(child, parent, depth);
                    }
                }
            }
        }
    }

    fn visit_with(&mut self, node: Node<'t>, parent: Option<usize>, depth: usize) {
        let mut parent = parent;
        let mut depth = depth;

        for i in 0..node.named_child_count() {
            let Some(clause) = node.named_child(i) else {
                continue;
            };
            if clause.kind() != "with_clause" {
                continue;
            }
            for j in 0..clause.named_child_count() {
                let Some(value) = clause
                    .named_child(j)
                    .and_then(|item| item.child_by_field_name("value"))
                else {
                    continue;
                };
                if let Some(call) = self.widget_call(value) {
                    let idx = self.declare(call, parent, depth + 1);
                    parent = Some(idx);
                    depth += 1;
                }
            }
        }

        if let Some(body) = node.child_by_field_name("body") {
            self.visit(body, parent, depth);
        }
    }

    /// Record a declaration and the widget calls nested in its arguments
    fn declare(&mut self, call: CallSite<'t>, parent: Option<usize>, depth: usize) -> usize {
        let args = call.positional_args();
        let idx = self.widgets.len();
        self.widgets.push(WidgetDecl {
            id: call.keyword_string("id"),
            classes: call
                .keyword_string("classes")
                .map(|c| c.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            call,
            parent,
            depth,
        });

        for arg in args {
            if let Some(child) = self.widget_call(arg) {
                self.declare(child, Some(idx), depth + 1);
            }
        }
        idx
    }

    fn widget_call(&self, node: Node<'t>) -> Option<CallSite<'t>> {
        CallSite::from_node(node, self.source)
            .filter(|c| c.callee.starts_with(|ch: char| ch.is_ascii_uppercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn single(source: &str) -> (usize, Vec<(String, Option<usize>, usize)>) {
        let tree = SourceTree::parse(source).unwrap();
        let comps = compositions(&tree);
        assert_eq!(comps.len(), 1);
        let c = &comps[0];
        (
            c.yield_count,
            c.widgets
                .iter()
                .map(|w| (w.widget_type().to_string(), w.parent, w.depth))
                .collect(),
        )
    }

    #[test]
    fn flat_yields() {
        let (yields, widgets) = single(
            "class A(App):\n    def compose(self):\n        yield Header()\n        yield Footer()\n",
        );
        assert_eq!(yields, 2);
        assert_eq!(
            widgets,
            vec![
                ("Header".to_string(), None, 1),
                ("Footer".to_string(), None, 1),
            ]
        );
    }

    #[test]
    fn with_blocks_nest() {
        let (_, widgets) = single(
            "class A(App):\n    def compose(self):\n        with Horizontal():\n            with Vertical(id=\"side\"):\n                yield Button(\"x\")\n",
        );
        assert_eq!(
            widgets,
            vec![
                ("Horizontal".to_string(), None, 1),
                ("Vertical".to_string(), Some(0), 2),
                ("Button".to_string(), Some(1), 3),
            ]
        );
    }

    #[test]
    fn positional_widget_arguments_nest() {
        let (yields, widgets) = single(
            "class A(App):\n    def compose(self):\n        yield Horizontal(Button(\"a\"), Label(\"b\"), name=\"row\")\n",
        );
        assert_eq!(yields, 1);
        assert_eq!(
            widgets,
            vec![
                ("Horizontal".to_string(), None, 1),
                ("Button".to_string(), Some(0), 2),
                ("Label".to_string(), Some(0), 2),
            ]
        );
    }

    #[test]
    fn lowercase_calls_are_not_widgets() {
        let (yields, widgets) = single(
            "class A(App):\n    def compose(self):\n        with self.batch():\n            yield make_widget()\n",
        );
        assert_eq!(yields, 1);
        assert!(widgets.is_empty());
    }

    #[test]
    fn id_and_classes_are_read() {
        let tree = SourceTree::parse(
            "class A(App):\n    def compose(self):\n        yield Button(\"ok\", id=\"ok\", classes=\"primary big\")\n",
        )
        .unwrap();
        let comps = compositions(&tree);
        let button = &comps[0].widgets[0];
        assert_eq!(button.id.as_deref(), Some("ok"));
        assert_eq!(button.classes, vec!["primary".to_string(), "big".to_string()]);
        assert_eq!(comps[0].owner(), "A");
    }

    #[test]
    fn nested_functions_are_skipped() {
        let (yields, widgets) = single(
            "class A(App):\n    def compose(self):\n        def gen():\n            yield Label()\n        yield Header()\n",
        );
        assert_eq!(yields, 1);
        assert_eq!(widgets.len(), 1);
    }
}
