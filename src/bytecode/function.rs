use std::fmt;

use anyhow::bail;

use super::{Label, NamedLabels, Offset, Op, PENDING};
use crate::environment::{ConstId, Environment};

/// What a compiled function is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
	/// A `define`d function.
	Named,
	/// The statements of one top-level evaluation.
	TopLevel,
	/// An evaluation started by running code, as with `eval`.
	NestedEval,
}

impl FunctionKind {
	pub fn is_anonymous(self) -> bool { !matches!(self, Self::Named) }
}

/// A finished function, ready to be run.
#[derive(Debug, Clone)]
pub struct Function {
	name:        String,
	kind:        FunctionKind,
	param_count: usize,
	local_count: usize,
	code:        Box<[Op]>,
}

impl Function {
	pub fn name(&self) -> &str { &self.name }

	pub fn kind(&self) -> FunctionKind { self.kind }

	pub fn param_count(&self) -> usize { self.param_count }

	pub fn local_count(&self) -> usize { self.local_count }

	pub fn code(&self) -> &[Op] { &self.code }

	/// Listing of the code with operands resolved to names where possible.
	pub fn listing<'a>(&'a self, env: &'a Environment) -> Listing<'a> { Listing { function: self, env } }

	pub fn disassemble(&self, env: &Environment) -> String { self.listing(env).to_string() }
}

pub struct Listing<'a> {
	function: &'a Function,
	env:      &'a Environment,
}

impl fmt::Display for Listing<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let Listing { function, env } = self;
		writeln!(f, "{}({} params, {} locals):", function.name, function.param_count, function.local_count)?;
		for (offset, op) in function.code.iter().enumerate() {
			write!(f, "{offset:>5}: {op}")?;
			let name = match *op {
				Op::Number(id) | Op::Imaginary(id) => env.numbers.text(id),
				Op::String(id) | Op::PrintString(id) | Op::Quit(Some(id)) => env.strings.get(id),
				Op::GlobalAddr(id) => env.symbols.global(id).map(|slot| slot.name.as_str()),
				Op::ElemAddr(id) => env.objects.element_name(id),
				Op::ObjCreate(id) => env.objects.object_type(id).map(|t| t.name.as_str()),
				Op::Call { function, .. } => env.functions.builtin(function).map(|b| b.name),
				Op::UserCall { function, .. } => env.functions.user(function).map(|u| u.name.as_str()),
				_ => None,
			};
			match name {
				Some(name) => writeln!(f, " ({name:?})")?,
				None => writeln!(f)?,
			}
		}
		Ok(())
	}
}

/// The function under construction and its instruction buffer.
///
/// Code is only ever appended, except for the jump targets and constant
/// operands patched in place once they are known.
#[derive(Debug)]
pub struct FunctionBuilder {
	name:   String,
	kind:   FunctionKind,
	code:   Vec<Op>,
	labels: NamedLabels,
}

impl FunctionBuilder {
	pub fn new(name: impl Into<String>, kind: FunctionKind) -> Self {
		Self { name: name.into(), kind, code: vec![], labels: NamedLabels::default() }
	}

	pub fn name(&self) -> &str { &self.name }

	pub fn kind(&self) -> FunctionKind { self.kind }

	/// Offset the next instruction will get.
	pub fn here(&self) -> Offset { self.code.len() }

	pub fn code(&self) -> &[Op] { &self.code }

	pub fn emit(&mut self, op: Op) -> Offset {
		self.code.push(op);
		self.code.len() - 1
	}

	/// Emit a jump built by `kind` towards `label`.
	pub fn emit_jump(&mut self, kind: fn(Offset) -> Op, label: &mut Label) -> Offset {
		let target = label.reference(self.here());
		self.emit(kind(target))
	}

	/// Resolve `label` at the current offset.
	pub fn resolve(&mut self, label: &mut Label) -> anyhow::Result<()> { label.resolve(self.here(), &mut self.code) }

	pub fn emit_goto(&mut self, name: &str) -> Offset {
		let target = self.labels.reference(name, self.here());
		self.emit(Op::Jump(target))
	}

	pub fn is_label_defined(&self, name: &str) -> bool { self.labels.is_defined(name) }

	pub fn define_label(&mut self, name: &str) -> anyhow::Result<()> {
		self.labels.define(name, self.code.len(), &mut self.code)
	}

	pub fn undefined_labels(&self) -> Vec<String> {
		self.labels.undefined().into_iter().map(str::to_string).collect()
	}

	/// Turn a read-only index just emitted into one that may be written through.
	pub fn mark_index_writable(&mut self) {
		if let Some(Op::IndexAddr { writable, .. }) = self.code.last_mut() {
			*writable = true;
		}
	}

	/// Fill in the constant of a `Number` emitted before its value was known.
	pub fn patch_constant(&mut self, at: Offset, value: ConstId) -> anyhow::Result<()> {
		match self.code.get_mut(at) {
			Some(Op::Number(id)) => {
				*id = value;
				Ok(())
			}
			other => bail!("no constant to patch at {at}: {other:?}"),
		}
	}

	/// End the body with an implicit undefined return and hand out the code.
	pub fn finish(&mut self, param_count: usize, local_count: usize) -> anyhow::Result<Function> {
		self.emit(Op::Undef);
		self.emit(Op::Return);
		if let Some(offset) = self.code.iter().position(|op| op.target() == Some(PENDING)) {
			bail!("unresolved jump at {offset} in {}", self.name);
		}
		Ok(Function {
			name: self.name.clone(),
			kind: self.kind,
			param_count,
			local_count,
			code: std::mem::take(&mut self.code).into_boxed_slice(),
		})
	}
}
