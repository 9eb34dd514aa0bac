use std::collections::HashMap;

use super::{BuiltinId, FuncId};
use crate::bytecode::Function;

/// A function implemented by the virtual machine.
#[derive(Debug, PartialEq, Eq)]
pub struct Builtin {
	pub name:     &'static str,
	pub min_args: usize,
	pub max_args: usize,
}

const MANY: usize = usize::MAX;

const fn builtin(name: &'static str, min_args: usize, max_args: usize) -> Builtin { Builtin { name, min_args, max_args } }

#[rustfmt::skip]
pub static BUILTINS: &[Builtin] = &[
	builtin("abs", 1, 2),
	builtin("acos", 1, 2),
	builtin("append", 1, MANY),
	builtin("asin", 1, 2),
	builtin("atan", 1, 2),
	builtin("atan2", 2, 3),
	builtin("avg", 0, MANY),
	builtin("ceil", 1, 1),
	builtin("char", 1, 1),
	builtin("config", 1, 2),
	builtin("cos", 1, 2),
	builtin("cosh", 1, 2),
	builtin("delete", 2, 2),
	builtin("den", 1, 1),
	builtin("det", 1, 1),
	builtin("digit", 2, 2),
	builtin("digits", 1, 1),
	builtin("epsilon", 0, 1),
	builtin("eval", 1, 1),
	builtin("exp", 1, 2),
	builtin("fact", 1, 1),
	builtin("fib", 1, 1),
	builtin("floor", 1, 1),
	builtin("frac", 1, 1),
	builtin("gcd", 1, MANY),
	builtin("hash", 0, MANY),
	builtin("im", 1, 1),
	builtin("insert", 2, MANY),
	builtin("int", 1, 1),
	builtin("inverse", 1, 1),
	builtin("isint", 1, 1),
	builtin("isnum", 1, 1),
	builtin("isreal", 1, 1),
	builtin("isstr", 1, 1),
	builtin("lcm", 1, MANY),
	builtin("list", 0, MANY),
	builtin("ln", 1, 2),
	builtin("matdim", 1, 1),
	builtin("matfill", 2, 3),
	builtin("matmax", 2, 2),
	builtin("matmin", 2, 2),
	builtin("max", 1, MANY),
	builtin("min", 1, MANY),
	builtin("mod", 2, 2),
	builtin("norm", 1, 1),
	builtin("num", 1, 1),
	builtin("param", 1, 1),
	builtin("pi", 0, 1),
	builtin("pop", 1, 1),
	builtin("power", 2, 3),
	builtin("push", 2, MANY),
	builtin("quo", 2, 2),
	builtin("quomod", 4, 4),
	builtin("re", 1, 1),
	builtin("root", 2, 3),
	builtin("round", 1, 3),
	builtin("scale", 2, 2),
	builtin("sgn", 1, 1),
	builtin("sin", 1, 2),
	builtin("size", 1, 1),
	builtin("sqrt", 1, 3),
	builtin("str", 1, 1),
	builtin("strcat", 1, MANY),
	builtin("strlen", 1, 1),
	builtin("substr", 3, 3),
	builtin("sum", 0, MANY),
	builtin("tan", 1, 2),
	builtin("trunc", 1, 2),
];

/// Why a builtin call has the wrong number of arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
	TooFew,
	TooMany,
}

/// A user function, known by name as soon as something calls it.
#[derive(Debug, Clone)]
pub struct UserFunction {
	pub name: String,
	/// Missing until a `define` for it compiles cleanly
	pub body: Option<Function>,
}

/// Builtin and user function registry.
#[derive(Debug, Default)]
pub struct FunctionTable {
	users: Vec<UserFunction>,
	index: HashMap<String, FuncId>,
}

impl FunctionTable {
	pub fn lookup_builtin(&self, name: &str) -> Option<BuiltinId> {
		BUILTINS.iter().position(|b| b.name == name).map(BuiltinId::from_index)
	}

	pub fn builtin(&self, id: BuiltinId) -> Option<&'static Builtin> { BUILTINS.get(id.index()) }

	pub fn check_arity(&self, id: BuiltinId, args: usize) -> Result<(), Arity> {
		match self.builtin(id) {
			Some(b) if args < b.min_args => Err(Arity::TooFew),
			Some(b) if args > b.max_args => Err(Arity::TooMany),
			_ => Ok(()),
		}
	}

	/// Index of a user function, registering the name on first use.
	pub fn intern_user_function(&mut self, name: &str) -> FuncId {
		if let Some(&id) = self.index.get(name) {
			return id;
		}
		let id = FuncId::from_index(self.users.len());
		self.users.push(UserFunction { name: name.to_string(), body: None });
		self.index.insert(name.to_string(), id);
		id
	}

	/// Install or replace the body of a user function.
	pub fn define(&mut self, id: FuncId, function: Function) {
		if let Some(user) = self.users.get_mut(id.index()) {
			user.body = Some(function);
		}
	}

	pub fn user(&self, id: FuncId) -> Option<&UserFunction> { self.users.get(id.index()) }

	pub fn users(&self) -> impl Iterator<Item = &UserFunction> { self.users.iter() }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn builtin_arity() {
		let functions = FunctionTable::default();
		let fact = functions.lookup_builtin("fact").unwrap();
		assert_eq!(functions.builtin(fact).map(|b| b.name), Some("fact"));
		assert_eq!(functions.check_arity(fact, 0), Err(Arity::TooFew));
		assert_eq!(functions.check_arity(fact, 1), Ok(()));
		assert_eq!(functions.check_arity(fact, 2), Err(Arity::TooMany));
		let max = functions.lookup_builtin("max").unwrap();
		assert_eq!(functions.check_arity(max, 40), Ok(()));
		assert_eq!(functions.lookup_builtin("nosuch"), None);
	}

	#[test]
	fn user_functions_are_interned() {
		let mut functions = FunctionTable::default();
		let f = functions.intern_user_function("f");
		let g = functions.intern_user_function("g");
		assert_ne!(f, g);
		assert_eq!(functions.intern_user_function("f"), f);
		assert!(functions.user(f).unwrap().body.is_none());
		assert_eq!(functions.users().count(), 2);
	}
}
