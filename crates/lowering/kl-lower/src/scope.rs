//! Scope table for name resolution during lowering
//!
//! Scopes form a tree rooted at one global scope. Lookups walk from a scope to
//! its ancestors; inner bindings shadow outer ones without touching them.

use kl_intern::Symbol;
use kl_ir::{IrType, Operand, ValueId};
use la_arena::{Arena, Idx};
use rustc_hash::FxHashMap;

/// Unique identifier for a scope
pub type ScopeId = Idx<ScopeData>;

/// Stack slot backing a mutable binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackSlot {
    /// Address produced by the `alloca`
    pub ptr: ValueId,
    /// Type stored in the slot
    pub ty: IrType,
}

/// What an identifier is bound to
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    /// SSA value, constant or function; read without a load
    Direct(Operand),
    /// Mutable variable; reads load and writes store
    Slot(StackSlot),
    /// Namespace, only usable as the object of a member access
    Namespace(ScopeId),
}

/// A scope frame
#[derive(Debug, Clone)]
pub struct ScopeData {
    /// Namespace name, `None` for function and block scopes
    pub name: Option<Symbol>,
    /// Enclosing scope, `None` for the global scope
    pub parent: Option<ScopeId>,
    /// Bindings made in this frame
    pub bindings: FxHashMap<Symbol, BoundValue>,
}

/// Tree of scopes for one module lowering
#[derive(Debug)]
pub struct ScopeTable {
    scopes: Arena<ScopeData>,
    global: ScopeId,
}

impl ScopeTable {
    /// Creates a table holding only the global scope
    pub fn new() -> Self {
        let mut scopes = Arena::new();
        let global = scopes.alloc(ScopeData {
            name: None,
            parent: None,
            bindings: FxHashMap::default(),
        });
        Self { scopes, global }
    }

    /// The root scope
    pub fn global(&self) -> ScopeId {
        self.global
    }

    /// Creates a child of `parent`; `name` is set for namespaces
    pub fn enter(&mut self, parent: ScopeId, name: Option<Symbol>) -> ScopeId {
        let id = self.scopes.alloc(ScopeData {
            name,
            parent: Some(parent),
            bindings: FxHashMap::default(),
        });
        log::trace!("entered scope {id:?} under {parent:?}");
        id
    }

    /// Binds `name` in `scope`, replacing an earlier binding in the same frame
    ///
    /// Returns the replaced binding.
    pub fn bind(&mut self, scope: ScopeId, name: Symbol, value: BoundValue) -> Option<BoundValue> {
        self.scopes[scope].bindings.insert(name, value)
    }

    /// Undoes a [`Self::bind`], given the binding it returned
    pub fn restore(&mut self, scope: ScopeId, name: Symbol, previous: Option<BoundValue>) {
        let bindings = &mut self.scopes[scope].bindings;
        bindings.remove(&name);
        bindings.extend(previous.map(|value| (name, value)));
    }

    /// Looks `name` up in `scope` and then its ancestors
    pub fn resolve(&self, scope: ScopeId, name: Symbol) -> Option<&BoundValue> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let data = &self.scopes[id];
            if let Some(value) = data.bindings.get(&name) {
                return Some(value);
            }
            current = data.parent;
        }
        None
    }

    /// Looks `property` up in `namespace` only
    pub fn resolve_qualified(&self, namespace: ScopeId, property: Symbol) -> Option<&BoundValue> {
        self.scopes[namespace].bindings.get(&property)
    }

    /// Drops the bindings of a finished function or block scope
    pub fn discard(&mut self, scope: ScopeId) {
        self.scopes[scope].bindings.clear();
    }

    /// Namespace name of a scope
    pub fn name(&self, scope: ScopeId) -> Option<Symbol> {
        self.scopes[scope].name
    }

    /// Enclosing scope
    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes[scope].parent
    }

    /// Names of the namespaces enclosing `scope`, outermost first
    pub fn namespace_path(&self, scope: ScopeId) -> Vec<Symbol> {
        let mut path = Vec::new();
        let mut current = Some(scope);
        while let Some(id) = current {
            path.extend(self.name(id));
            current = self.parent(id);
        }
        path.reverse();
        path
    }
}

impl Default for ScopeTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kl_intern::Interner;
    use kl_ir::Constant;

    fn direct(value: f64) -> BoundValue {
        BoundValue::Direct(Operand::Constant(Constant::Double(value)))
    }

    #[test]
    fn test_inner_binding_shadows_outer() {
        let interner = Interner::new();
        let x = interner.intern("x");
        let mut scopes = ScopeTable::new();
        let global = scopes.global();
        let inner = scopes.enter(global, None);

        scopes.bind(global, x, direct(1.0));
        scopes.bind(inner, x, direct(2.0));
        assert_eq!(scopes.resolve(inner, x), Some(&direct(2.0)));
        assert_eq!(scopes.resolve(global, x), Some(&direct(1.0)));

        scopes.discard(inner);
        assert_eq!(scopes.resolve(inner, x), Some(&direct(1.0)));
    }

    #[test]
    fn test_rebinding_in_same_frame_overwrites() {
        let interner = Interner::new();
        let x = interner.intern("x");
        let mut scopes = ScopeTable::new();
        let global = scopes.global();
        scopes.bind(global, x, direct(1.0));
        scopes.bind(global, x, direct(3.0));
        assert_eq!(scopes.resolve(global, x), Some(&direct(3.0)));
    }

    #[test]
    fn test_restore_undoes_bind() {
        let interner = Interner::new();
        let (x, y) = (interner.intern("x"), interner.intern("y"));
        let mut scopes = ScopeTable::new();
        let global = scopes.global();
        scopes.bind(global, x, direct(1.0));

        let previous = scopes.bind(global, x, direct(2.0));
        assert_eq!(previous, Some(direct(1.0)));
        scopes.restore(global, x, previous);
        assert_eq!(scopes.resolve(global, x), Some(&direct(1.0)));

        let previous = scopes.bind(global, y, direct(3.0));
        assert_eq!(previous, None);
        scopes.restore(global, y, previous);
        assert_eq!(scopes.resolve(global, y), None);
    }

    #[test]
    fn test_qualified_lookup_does_not_walk_parents() {
        let interner = Interner::new();
        let m = interner.intern("M");
        let g = interner.intern("g");
        let outer = interner.intern("outer");
        let mut scopes = ScopeTable::new();
        let global = scopes.global();
        let namespace = scopes.enter(global, Some(m));
        scopes.bind(global, outer, direct(0.0));
        scopes.bind(namespace, g, direct(5.0));

        assert_eq!(scopes.resolve_qualified(namespace, g), Some(&direct(5.0)));
        assert_eq!(scopes.resolve_qualified(namespace, outer), None);
        assert_eq!(scopes.resolve(namespace, outer), Some(&direct(0.0)));
    }

    #[test]
    fn test_namespace_path() {
        let interner = Interner::new();
        let (m, n) = (interner.intern("M"), interner.intern("N"));
        let mut scopes = ScopeTable::new();
        let outer = scopes.enter(scopes.global(), Some(m));
        let inner = scopes.enter(outer, Some(n));
        let block = scopes.enter(inner, None);
        assert_eq!(scopes.namespace_path(block), vec![m, n]);
        assert_eq!(scopes.namespace_path(scopes.global()), Vec::<Symbol>::new());
        assert_eq!(scopes.parent(block), Some(inner));
        assert_eq!(scopes.name(inner), Some(n));
    }
}
