//! Tables the compiler consults and fills while it emits code.
//!
//! Instructions refer to names and literals through small typed indices into
//! these tables, so a finished function is a plain list of copyable
//! instructions.
mod functions;
mod numbers;
mod objects;
mod strings;
mod symbols;

pub use functions::{Arity, Builtin, FunctionTable, UserFunction, BUILTINS};
pub use numbers::{ConstantTable, NumberError, NumberParser};
pub use objects::{ObjectError, ObjectTable, ObjectType};
pub use strings::StringTable;
pub use symbols::{GlobalSlot, ScopeError, SymbolKind, SymbolTable};

macro_rules! index_types {
	($($(#[$meta:meta])* $name:ident;)*) => {
		$(
			$(#[$meta])*
			#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
			pub struct $name(pub u32);

			impl $name {
				pub fn index(self) -> usize { self.0 as usize }

				pub(crate) fn from_index(index: usize) -> Self { Self(index as u32) }
			}

			impl std::fmt::Display for $name {
				fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
			}
		)*
	};
}

index_types! {
	/// An interned string literal.
	StrId;
	/// An interned numeric constant.
	ConstId;
	/// A global or static variable.
	GlobalId;
	/// A user function, possibly not defined yet.
	FuncId;
	/// A builtin function.
	BuiltinId;
	/// An object type.
	TypeId;
	/// An object element name.
	ElementId;
}

/// Everything the compiler resolves names and literals against.
pub struct Environment {
	pub strings:   StringTable,
	pub numbers:   Box<dyn NumberParser>,
	pub symbols:   SymbolTable,
	pub functions: FunctionTable,
	pub objects:   ObjectTable,
}

impl Environment {
	pub fn new(numbers: Box<dyn NumberParser>) -> Self {
		Self {
			strings: StringTable::default(),
			numbers,
			symbols: SymbolTable::default(),
			functions: FunctionTable::default(),
			objects: ObjectTable::default(),
		}
	}
}

impl Default for Environment {
	fn default() -> Self { Self::new(Box::new(ConstantTable::default())) }
}
