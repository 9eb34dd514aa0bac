use std::collections::HashMap;

use super::GlobalId;

/// What a name refers to at the point it is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
	Parameter(usize),
	Local(usize),
	Static(GlobalId),
	Global(GlobalId),
	Undefined,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ScopeError {
	#[error("\"{0}\" is already a parameter or local of this function")]
	AlreadyDefined(String),
	#[error("parameter \"{0}\" is already defined")]
	DuplicateParameter(String),
}

/// A persistent variable slot.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalSlot {
	pub name:      String,
	pub is_static: bool,
}

/// A static variable while its declaring scope is open.
#[derive(Debug)]
struct StaticBinding {
	name:       String,
	id:         GlobalId,
	/// Declared inside a `define` body
	function:   bool,
	file_depth: usize,
}

/// Scope resolution for the function being compiled.
///
/// Parameters and locals live in numbered slots of the current function and
/// disappear when the next function begins. Globals live for the whole
/// session. Statics get a persistent slot like globals, but their name is
/// only visible until the function or input file declaring them ends.
#[derive(Debug, Default)]
pub struct SymbolTable {
	globals:      Vec<GlobalSlot>,
	global_index: HashMap<String, GlobalId>,
	statics:      Vec<StaticBinding>,
	params:       Vec<String>,
	locals:       Vec<String>,
	in_function:  bool,
	file_depth:   usize,
}

impl SymbolTable {
	/// Resolve a name: parameters, then locals, then visible statics, then globals.
	pub fn classify(&self, name: &str) -> SymbolKind {
		if let Some(slot) = self.params.iter().position(|p| p == name) {
			return SymbolKind::Parameter(slot);
		}
		if let Some(slot) = self.locals.iter().position(|l| l == name) {
			return SymbolKind::Local(slot);
		}
		if let Some(binding) = self.statics.iter().rev().find(|s| s.name == name) {
			return SymbolKind::Static(binding.id);
		}
		match self.global_index.get(name) {
			Some(&id) => SymbolKind::Global(id),
			None => SymbolKind::Undefined,
		}
	}

	pub fn declare_parameter(&mut self, name: &str) -> Result<usize, ScopeError> {
		if self.params.iter().any(|p| p == name) {
			return Err(ScopeError::DuplicateParameter(name.to_string()));
		}
		self.params.push(name.to_string());
		Ok(self.params.len() - 1)
	}

	pub fn declare_local(&mut self, name: &str) -> Result<usize, ScopeError> {
		self.check_function_scoped(name)?;
		self.locals.push(name.to_string());
		Ok(self.locals.len() - 1)
	}

	/// Bind `name` to a persistent slot. A global reuses the slot of an
	/// earlier global of the same name, a static always gets a fresh one.
	pub fn declare_global(&mut self, name: &str, is_static: bool) -> Result<GlobalId, ScopeError> {
		self.check_function_scoped(name)?;
		if !is_static {
			if let Some(&id) = self.global_index.get(name) {
				return Ok(id);
			}
		}
		let id = GlobalId::from_index(self.globals.len());
		self.globals.push(GlobalSlot { name: name.to_string(), is_static });
		if is_static {
			self.statics.push(StaticBinding {
				name: name.to_string(),
				id,
				function: self.in_function,
				file_depth: self.file_depth,
			});
		} else {
			self.global_index.insert(name.to_string(), id);
		}
		Ok(id)
	}

	fn check_function_scoped(&self, name: &str) -> Result<(), ScopeError> {
		if self.params.iter().chain(&self.locals).any(|n| n == name) {
			return Err(ScopeError::AlreadyDefined(name.to_string()));
		}
		Ok(())
	}

	/// Forget the parameters and locals of the previous function.
	pub fn begin_function(&mut self) {
		self.params.clear();
		self.locals.clear();
	}

	pub fn enter_function_scope(&mut self) { self.in_function = true; }

	pub fn exit_function_scope(&mut self) {
		self.statics.retain(|s| !s.function);
		self.in_function = false;
		self.begin_function();
	}

	pub fn enter_file_scope(&mut self) { self.file_depth += 1; }

	pub fn exit_file_scope(&mut self) {
		let depth = self.file_depth;
		self.statics.retain(|s| s.function || s.file_depth < depth);
		self.file_depth = depth.saturating_sub(1);
	}

	pub fn param_count(&self) -> usize { self.params.len() }

	pub fn local_count(&self) -> usize { self.locals.len() }

	pub fn global(&self, id: GlobalId) -> Option<&GlobalSlot> { self.globals.get(id.index()) }

	pub fn globals(&self) -> impl Iterator<Item = (GlobalId, &GlobalSlot)> {
		self.globals.iter().enumerate().map(|(i, slot)| (GlobalId::from_index(i), slot))
	}
}
