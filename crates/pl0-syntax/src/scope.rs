//! Named entities (constants, variables, procedures) and the scope stack
//! used to resolve them across nested procedures.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A named entity in some scope.
#[derive(Debug)]
pub enum Symbol {
    Constant {
        name: String,
        value: i64,
    },
    Variable {
        name: String,
        level: usize,
        index: usize,
    },
    Procedure {
        name: String,
        level: usize,
    },
}

pub type SymbolRef = Rc<Symbol>;

/// Identity of a symbol, usable as a hash map key. Two `SymbolId`s compare
/// equal iff they were produced from the same `Rc` allocation — this is how
/// the compiler keys its `entry_points` and per-procedure patch-list maps
/// without needing `Symbol` itself to implement structural equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(*const Symbol);

impl Symbol {
    pub fn name(&self) -> &str {
        match self {
            Symbol::Constant { name, .. } => name,
            Symbol::Variable { name, .. } => name,
            Symbol::Procedure { name, .. } => name,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Symbol::Variable { .. })
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Symbol::Constant { .. })
    }

    pub fn is_procedure(&self) -> bool {
        matches!(self, Symbol::Procedure { .. })
    }

    /// The depth of the scope this symbol was declared in. For a procedure
    /// this is the depth of the *enclosing* scope, not the scope it introduces.
    pub fn level(&self) -> usize {
        match self {
            Symbol::Constant { .. } => 0,
            Symbol::Variable { level, .. } => *level,
            Symbol::Procedure { level, .. } => *level,
        }
    }

    pub fn id(self: &SymbolRef) -> SymbolId {
        SymbolId(Rc::as_ptr(self))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A lexical region: a map from name to symbol, plus a pointer to the
/// enclosing scope (`None` for the outermost, program-level scope).
pub struct Scope {
    members: RefCell<HashMap<String, SymbolRef>>,
    enclosing: Option<Rc<Scope>>,
    level: usize,
    variable_count: RefCell<usize>,
}

impl Scope {
    /// The program-level scope, at depth 0.
    pub fn root() -> Rc<Scope> {
        Rc::new(Scope {
            members: RefCell::new(HashMap::new()),
            enclosing: None,
            level: 0,
            variable_count: RefCell::new(0),
        })
    }

    /// A fresh scope for a procedure body nested directly inside `enclosing`.
    pub fn nested(enclosing: &Rc<Scope>) -> Rc<Scope> {
        Rc::new(Scope {
            members: RefCell::new(HashMap::new()),
            enclosing: Some(Rc::clone(enclosing)),
            level: enclosing.level + 1,
            variable_count: RefCell::new(0),
        })
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn variable_count(&self) -> usize {
        *self.variable_count.borrow()
    }

    pub fn enclosing(&self) -> Option<&Rc<Scope>> {
        self.enclosing.as_ref()
    }

    /// Insert `symbol` into this scope. Fails if a symbol with the same name
    /// already exists directly in this scope (shadowing an outer scope is fine).
    pub fn define(&self, symbol: SymbolRef) -> Result<(), String> {
        let name = symbol.name().to_owned();
        if symbol.is_variable() {
            *self.variable_count.borrow_mut() += 1;
        }
        match self.members.borrow_mut().entry(name.clone()) {
            std::collections::hash_map::Entry::Occupied(_) => Err(name),
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(symbol);
                Ok(())
            }
        }
    }

    /// Resolve `name` in this scope, then its enclosing scopes outward.
    pub fn resolve(self: &Rc<Self>, name: &str) -> Option<SymbolRef> {
        if let Some(symbol) = self.members.borrow().get(name) {
            return Some(Rc::clone(symbol));
        }
        self.enclosing.as_ref().and_then(|parent| parent.resolve(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variable_indices_are_assigned_in_declaration_order() {
        let root = Scope::root();
        root.define(Rc::new(Symbol::Variable {
            name: "a".into(),
            level: 0,
            index: 0,
        }))
        .unwrap();
        root.define(Rc::new(Symbol::Variable {
            name: "b".into(),
            level: 0,
            index: 1,
        }))
        .unwrap();
        assert_eq!(root.variable_count(), 2);
    }

    #[test]
    fn duplicate_definition_fails() {
        let root = Scope::root();
        root.define(Rc::new(Symbol::Constant {
            name: "x".into(),
            value: 1,
        }))
        .unwrap();
        let err = root
            .define(Rc::new(Symbol::Constant {
                name: "x".into(),
                value: 2,
            }))
            .unwrap_err();
        assert_eq!(err, "x");
    }

    #[test]
    fn inner_scope_shadows_outer() {
        let root = Scope::root();
        root.define(Rc::new(Symbol::Variable {
            name: "x".into(),
            level: 0,
            index: 0,
        }))
        .unwrap();
        let inner = Scope::nested(&root);
        inner
            .define(Rc::new(Symbol::Variable {
                name: "x".into(),
                level: 1,
                index: 0,
            }))
            .unwrap();

        let resolved = inner.resolve("x").unwrap();
        assert_eq!(resolved.level(), 1);
    }

    #[test]
    fn resolution_walks_outward() {
        let root = Scope::root();
        root.define(Rc::new(Symbol::Constant {
            name: "pi".into(),
            value: 3,
        }))
        .unwrap();
        let inner = Scope::nested(&root);
        assert!(inner.resolve("pi").is_some());
        assert!(inner.resolve("missing").is_none());
    }
}
