//! Lexically scoped symbol table
//!
//! Scopes live in an arena and point at their parent by index, so the chain
//! can never form a cycle. Popping a scope only moves the cursor back to its
//! parent; the popped scope stays in the arena until the table is dropped.
//!
//! The two lookups have different reach:
//! [`SymbolTable::lookup`] searches the whole chain (visibility), while
//! [`SymbolTable::declare`] only checks the innermost scope (redeclaration).
//! Declaring a name that an outer scope already has is shadowing, not an error.

use crate::parser::ast::Mutability;
use rustc_hash::FxHashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Value,
    Type,
    Function,
    Enum,
    Struct,
}

/// One declared name.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub file: Arc<str>,
    pub kind: SymbolKind,
    pub mutability: Mutability,
    /// Set once the binding has received a value.
    pub assigned: bool,
    pub line: u32,
    pub column: u32,
}

impl Symbol {
    pub fn new(name: impl Into<String>, file: Arc<str>, kind: SymbolKind, line: u32, column: u32) -> Self {
        Self {
            name: name.into(),
            file,
            kind,
            mutability: Mutability::Mutable,
            assigned: false,
            line,
            column,
        }
    }

    pub fn with_mutability(mut self, mutability: Mutability) -> Self {
        self.mutability = mutability;
        self
    }

    pub fn assigned(mut self, assigned: bool) -> Self {
        self.assigned = assigned;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    File,
    Namespace,
    Function,
    Block,
}

/// Index of a scope in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScopeId(usize);

#[derive(Debug)]
struct Scope {
    kind: ScopeKind,
    parent: Option<ScopeId>,
    symbols: FxHashMap<String, Symbol>,
}

#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// A table holding just the file-level root scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                kind: ScopeKind::File,
                parent: None,
                symbols: FxHashMap::default(),
            }],
            current: ScopeId(0),
        }
    }

    pub fn current_kind(&self) -> ScopeKind {
        self.scopes[self.current.0].kind
    }

    /// Enter a new scope nested in the current one.
    pub fn push_scope(&mut self, kind: ScopeKind) {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            kind,
            parent: Some(self.current),
            symbols: FxHashMap::default(),
        });
        self.current = id;
    }

    /// Leave the current scope. The root scope is never popped.
    pub fn pop_scope(&mut self) {
        if let Some(parent) = self.scopes[self.current.0].parent {
            self.current = parent;
        }
    }

    /// Insert into the current scope. Returns `false`, leaving the existing
    /// symbol untouched, if the name is already declared in this same scope.
    pub fn declare(&mut self, symbol: Symbol) -> bool {
        if self.declared_locally(&symbol.name) {
            return false;
        }
        self.scopes[self.current.0]
            .symbols
            .insert(symbol.name.clone(), symbol);
        true
    }

    /// Innermost visible symbol called `name`.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.chain(self.current)
            .find_map(|id| self.scopes[id.0].symbols.get(name))
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        let owner = self
            .chain(self.current)
            .find(|id| self.scopes[id.0].symbols.contains_key(name))?;
        self.scopes[owner.0].symbols.get_mut(name)
    }

    /// Whether `name` is visible from the current scope.
    pub fn exists(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Whether `name` is declared in the current scope itself.
    pub fn declared_locally(&self, name: &str) -> bool {
        self.scopes[self.current.0].symbols.contains_key(name)
    }

    /// Scope ids from `start` out to the root.
    fn chain(&self, start: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(start), move |id| self.scopes[id.0].parent)
    }
}
