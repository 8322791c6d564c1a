//! Table widget activation.
//!
//! Tables rendered by the server are plain `<table>` elements flagged with a
//! class. Each flagged table is wrapped by the table widget exactly once;
//! [`TableRegistry`] remembers which element ids are already wrapped.

use serde::Serialize;
use std::collections::HashSet;
use std::rc::Rc;

use crate::config::{PAGINATED_TABLE_CLASS, SIMPLE_TABLE_CLASS};
use crate::types::{AppError, AppResult};

/// Flavor of table requested by the markup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// No paging, search or info footer
    Simple,
    /// Paging and search enabled
    Paginated,
}

impl TableKind {
    /// Scan order: simple tables first, so a table flagged twice stays simple.
    pub const ALL: [TableKind; 2] = [TableKind::Simple, TableKind::Paginated];

    /// CSS class marking this kind in the markup.
    pub fn css_class(&self) -> &'static str {
        match self {
            TableKind::Simple => SIMPLE_TABLE_CLASS,
            TableKind::Paginated => PAGINATED_TABLE_CLASS,
        }
    }

    pub fn options(&self) -> TableOptions {
        let paginated = matches!(self, TableKind::Paginated);
        TableOptions {
            paging: paginated,
            info: false,
            searching: paginated,
            order: Vec::new(),
            responsive: true,
        }
    }
}

/// Configuration object passed to the table widget.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TableOptions {
    pub paging: bool,
    pub info: bool,
    pub searching: bool,
    /// Initial sort; empty keeps the server's row order
    pub order: Vec<(usize, String)>,
    pub responsive: bool,
}

/// Whether `id` can be used verbatim in a `#id` selector.
///
/// Ids outside `[A-Za-z_][A-Za-z0-9_-]*` would need CSS escaping.
pub fn is_selector_safe(id: &str) -> bool {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// A flagged table found in the page.
#[derive(Clone, Debug, PartialEq)]
pub struct TableElement {
    pub id: Option<String>,
    pub kind: TableKind,
}

/// Access to the table widget library.
pub trait TableWidget {
    /// Flagged tables of one kind currently in the page, in document order.
    fn find_tables(&self, kind: TableKind) -> Vec<TableElement>;

    /// Whether the element with this id is already wrapped by the widget.
    fn is_table(&self, id: &str) -> bool;

    /// Wrap the element with this id.
    fn activate(&self, id: &str, options: &TableOptions) -> AppResult<()>;
}

impl<T: TableWidget + ?Sized> TableWidget for Rc<T> {
    fn find_tables(&self, kind: TableKind) -> Vec<TableElement> {
        (**self).find_tables(kind)
    }

    fn is_table(&self, id: &str) -> bool {
        (**self).is_table(id)
    }

    fn activate(&self, id: &str, options: &TableOptions) -> AppResult<()> {
        (**self).activate(id, options)
    }
}

/// Outcome of one [`TableRegistry::initialize`] pass.
#[derive(Debug, Default, PartialEq)]
pub struct TableInitReport {
    /// Ids wrapped during this pass
    pub activated: Vec<String>,
    /// Tables left alone because they were already wrapped or had no usable id
    pub skipped: usize,
    /// Tables the widget refused
    pub failed: Vec<(String, AppError)>,
}

/// Ids of tables already wrapped by the widget.
#[derive(Debug, Default)]
pub struct TableRegistry {
    active: HashSet<String>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.active.contains(id)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Wrap every flagged table not wrapped yet.
    ///
    /// Safe to call repeatedly: known ids and tables the widget already
    /// manages are skipped. A refused table does not stop the pass.
    pub fn initialize<W: TableWidget + ?Sized>(&mut self, widget: &W) -> TableInitReport {
        let mut report = TableInitReport::default();

        for kind in TableKind::ALL {
            let options = kind.options();
            for table in widget.find_tables(kind) {
                let Some(id) = table.id.filter(|id| !id.is_empty()) else {
                    log::warn!("Skipping .{} table without an id", kind.css_class());
                    report.skipped += 1;
                    continue;
                };

                if !is_selector_safe(&id) {
                    log::warn!("Skipping .{} table #{}: id needs escaping", kind.css_class(), id);
                    report.skipped += 1;
                    continue;
                }

                if self.active.contains(&id) {
                    report.skipped += 1;
                    continue;
                }
                if widget.is_table(&id) {
                    self.active.insert(id);
                    report.skipped += 1;
                    continue;
                }

                match widget.activate(&id, &options) {
                    Ok(()) => {
                        log::debug!("Activated {:?} table #{}", kind, id);
                        self.active.insert(id.clone());
                        report.activated.push(id);
                    }
                    Err(e) => {
                        log::error!("Failed to activate table #{}: {}", id, e);
                        report.failed.push((id, e));
                    }
                }
            }
        }

        report
    }

    /// Forget ids whose element is no longer wrapped.
    ///
    /// Called after the content region is replaced: a fresh element reusing
    /// an old id must be wrapped again.
    pub fn reconcile<W: TableWidget + ?Sized>(&mut self, widget: &W) {
        let before = self.active.len();
        self.active.retain(|id| widget.is_table(id));
        let dropped = before - self.active.len();
        if dropped > 0 {
            log::debug!("Forgot {} replaced table(s)", dropped);
        }
    }
}
