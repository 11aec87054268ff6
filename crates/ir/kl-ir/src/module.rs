//! Modules: the function list and private constant data

use crate::display;
use crate::error::IrError;
use crate::function::Function;
use crate::types::{FunctionType, IrType};
use crate::value::{FuncId, GlobalId};
use indexmap::IndexMap;

/// Module-level byte buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Global {
    /// Symbol name
    pub name: String,
    /// Initializer bytes, stored as `[N x i8]`
    pub bytes: Vec<u8>,
    /// Whether the data is read-only
    pub constant: bool,
}

impl Global {
    /// `[N x i8]` where `N` is the byte count
    pub fn ty(&self) -> IrType {
        IrType::Array {
            element: Box::new(IrType::byte()),
            len: self.bytes.len() as u64,
        }
    }
}

/// Translation output: named functions plus their constant data
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    name: String,
    functions: Vec<Function>,
    by_name: IndexMap<String, FuncId>,
    globals: Vec<Global>,
}

impl Module {
    /// Creates an empty module
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
            by_name: IndexMap::new(),
            globals: Vec::new(),
        }
    }

    /// Module identifier
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a bodiless function under a unique name
    ///
    /// # Errors
    /// [`IrError::DuplicateSymbol`] when the name is taken.
    pub fn declare_function(
        &mut self,
        name: impl Into<String>,
        ty: FunctionType,
    ) -> Result<FuncId, IrError> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(IrError::DuplicateSymbol(name));
        }
        let id = FuncId::from_index(self.functions.len());
        self.functions.push(Function::new(name.clone(), ty));
        self.by_name.insert(name, id);
        Ok(id)
    }

    /// Installs a body built for a previously declared function
    ///
    /// # Errors
    /// Fails for an unknown id, a function that already has a body, or a body
    /// whose name or signature differs from the declaration.
    pub fn define_function(&mut self, id: FuncId, body: Function) -> Result<(), IrError> {
        let slot = self
            .functions
            .get_mut(id.index())
            .ok_or(IrError::UnknownFunction(id))?;
        if !slot.is_declaration() {
            return Err(IrError::AlreadyDefined(slot.name.clone()));
        }
        if slot.name != body.name || slot.ty != body.ty {
            return Err(IrError::DeclarationMismatch {
                declared: slot.name.clone(),
                found: body.name,
            });
        }
        *slot = body;
        Ok(())
    }

    /// Removes the most recently declared function while it has no body
    ///
    /// Used to back out a declaration whose body could not be built. The
    /// name becomes free again.
    ///
    /// # Errors
    /// [`IrError::UnknownFunction`] unless `id` is the last function, and
    /// [`IrError::AlreadyDefined`] when it has a body.
    pub fn retract_declaration(&mut self, id: FuncId) -> Result<Function, IrError> {
        let is_last = id.index() + 1 == self.functions.len();
        let Some(function) = self.functions.last().filter(|_| is_last) else {
            return Err(IrError::UnknownFunction(id));
        };
        if !function.is_declaration() {
            return Err(IrError::AlreadyDefined(function.name.clone()));
        }
        self.by_name.shift_remove(&function.name);
        self.functions.pop().ok_or(IrError::UnknownFunction(id))
    }

    /// Function by id
    pub fn function(&self, id: FuncId) -> Option<&Function> {
        self.functions.get(id.index())
    }

    /// Function id by linkage name
    pub fn function_by_name(&self, name: &str) -> Option<FuncId> {
        self.by_name.get(name).copied()
    }

    /// Functions in declaration order
    pub fn functions(&self) -> impl Iterator<Item = (FuncId, &Function)> {
        self.functions
            .iter()
            .enumerate()
            .map(|(index, function)| (FuncId::from_index(index), function))
    }

    /// Number of functions, declarations included
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    /// Adds a private constant byte buffer named `.str`, `.str.1`, ...
    pub fn add_string_constant(&mut self, bytes: &[u8]) -> GlobalId {
        let id = GlobalId::from_index(self.globals.len());
        let name = match id.index() {
            0 => ".str".to_owned(),
            n => format!(".str.{n}"),
        };
        self.globals.push(Global {
            name,
            bytes: bytes.to_vec(),
            constant: true,
        });
        id
    }

    /// Global by id
    pub fn global(&self, id: GlobalId) -> Option<&Global> {
        self.globals.get(id.index())
    }

    /// Text of one function, `None` for an unknown id
    pub fn display_function(&self, id: FuncId) -> Option<String> {
        display::function_text(self, id)
    }

    /// All globals in creation order
    pub fn globals(&self) -> &[Global] {
        &self.globals
    }

    /// Drops every global created after the first `len`
    pub fn truncate_globals(&mut self, len: usize) {
        self.globals.truncate(len);
    }
}
