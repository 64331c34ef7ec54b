//! tdoc core
//!
//! Shared foundation for the tdoc diagnostic toolkit:
//!
//! - [`syntax`]: tree-sitter backed parsing of Python application sources into a
//!   [`SourceTree`], plus typed views over the constructs the rule passes care about
//!   (classes, functions, imports, calls, yields, string assignments).
//! - [`compose`]: the widget tree a composition method declares, with nesting
//!   depth, ids and classes.
//! - [`schema`]: the static registry of known widgets, containers, event tags and
//!   deprecated identifiers for the Textual framework.
//! - [`report`]: text framing shared by the static and dynamic reports so both can be
//!   concatenated.
//!
//! # Example
//!
//! ```rust,ignore
//! use tdoc_core::{Schema, SourceTree};
//!
//! let tree = SourceTree::parse("from textual.app import App\nclass Demo(App): ...")?;
//! for class in tree.classes() {
//!     if class.inherits_from(tdoc_core::schema::APP_BASE) {
//!         println!("application class {}", class.name);
//!     }
//! }
//! assert!(Schema::textual().is_known_widget("Button"));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod compose;
pub mod error;
pub mod report;
pub mod schema;
pub mod syntax;

pub use compose::{compositions, Composition, WidgetDecl};
pub use error::{ParseError, SyntaxError};
pub use schema::Schema;
pub use syntax::{
    CallSite, ClassDef, FunctionDef, ImportedName, SourceTree, StringAssignment,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports for rule and analysis code
pub mod prelude {
    //! Common imports for working with parsed sources
    pub use crate::error::{ParseError, SyntaxError};
    pub use crate::schema::{self, Schema};
    pub use crate::syntax::{
        CallSite, ClassDef, FunctionDef, ImportedName, SourceTree, StringAssignment,
    };
}
