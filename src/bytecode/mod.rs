//! The instructions the compiler emits for the stack machine.
//!
//! Every expression leaves either a value or an address on the stack.
//! Addressing instructions push a location, and instructions that need a
//! value read through an address they find on the stack. Jump targets are
//! instruction indices within the same function.
mod function;
mod label;

use std::fmt;

pub use function::{Function, FunctionBuilder, FunctionKind, Listing};
pub use label::{Label, NamedLabels, PatchSite};

use crate::environment::{BuiltinId, ConstId, ElementId, FuncId, GlobalId, StrId, TypeId};

/// Index of an instruction within its function.
pub type Offset = usize;

/// Target carried by a jump whose label is not resolved yet.
pub(crate) const PENDING: Offset = Offset::MAX;

/// What a `show` statement lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowTopic {
	Builtins,
	Globals,
	Functions,
	ObjectFunctions,
	Config,
	ObjectTypes,
	Files,
	Sizes,
	Opcodes(FuncId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
	/// Source line of the statement that follows.
	Debug(usize),

	/// Push a real constant.
	Number(ConstId),
	/// Push an imaginary constant.
	Imaginary(ConstId),
	/// Push a string literal.
	String(StrId),
	/// Push the address of the previous top-level result.
	OldValue,
	/// Push the null value.
	Undef,
	Zero,
	One,

	LocalAddr(usize),
	ParamAddr(usize),
	GlobalAddr(GlobalId),
	/// Index the matrix whose address is below `dims` index values.
	/// Read-only until the compiler finds the element is written to.
	IndexAddr { dims: usize, writable: bool },
	/// `m[[i]]`: index a matrix as if it were one-dimensional.
	FastIndexAddr,
	/// Address of an element of the object below.
	ElemAddr(ElementId),
	/// Address of slot `n` of the composite being initialized.
	InitAddr(usize),

	/// Create a matrix from `dims` pairs of bounds.
	MatCreate(usize),
	ObjCreate(TypeId),
	/// Fill a new matrix with the value on top.
	InitFill,
	/// Store the top value into slot `n` of the composite below it.
	ElemInit(usize),

	Duplicate,
	/// Duplicate the top, reading through it if it is an address.
	DupValue,
	/// Replace an address by the value it holds.
	GetValue,
	Pop,
	/// Remember the top value as the previous result.
	Save,
	/// Store the value on top into the address below, leaving the value.
	Assign,
	/// Like `Assign` but pops the value as well.
	AssignPop,

	Add,
	Sub,
	Mul,
	Div,
	/// Integer quotient `//`.
	Quo,
	Mod,
	And,
	Or,
	LeftShift,
	RightShift,
	Power,
	Negate,
	Not,
	Eq,
	Ne,
	Lt,
	Gt,
	Le,
	Ge,
	PreInc,
	PreDec,
	PostInc,
	PostDec,

	Jump(Offset),
	/// Pop and jump if false.
	JumpEq(Offset),
	/// Pop and jump if true.
	JumpNe(Offset),
	/// Jump keeping the top if it is true, otherwise pop it.
	CondOrJump(Offset),
	/// Jump keeping the top if it is false, otherwise pop it.
	CondAndJump(Offset),
	/// Compare the case value on top with the switch value below. On a
	/// mismatch pop the case value and jump, otherwise pop both.
	CaseJump(Offset),
	/// Jump if this instruction has run before.
	InitStatic(Offset),

	Call { function: BuiltinId, args: usize },
	UserCall { function: FuncId, args: usize },
	Return,

	Print,
	PrintEol,
	PrintSpace,
	PrintString(StrId),
	/// Print the value of a top-level statement.
	PrintResult,
	Quit(Option<StrId>),
	Show(ShowTopic),
}

impl Op {
	/// Jump target, for instructions that have one.
	pub fn target(&self) -> Option<Offset> {
		use Op::*;
		match *self {
			Jump(t) | JumpEq(t) | JumpNe(t) | CondOrJump(t) | CondAndJump(t) | CaseJump(t) | InitStatic(t) => Some(t),
			_ => None,
		}
	}

	fn target_mut(&mut self) -> Option<&mut Offset> {
		use Op::*;
		match self {
			Jump(t) | JumpEq(t) | JumpNe(t) | CondOrJump(t) | CondAndJump(t) | CaseJump(t) | InitStatic(t) => Some(t),
			_ => None,
		}
	}

	pub fn mnemonic(&self) -> &'static str {
		use Op::*;
		match self {
			Debug(_) => "DEBUG",
			Number(_) => "NUMBER",
			Imaginary(_) => "IMAGINARY",
			String(_) => "STRING",
			OldValue => "OLDVALUE",
			Undef => "UNDEF",
			Zero => "ZERO",
			One => "ONE",
			LocalAddr(_) => "LOCALADDR",
			ParamAddr(_) => "PARAMADDR",
			GlobalAddr(_) => "GLOBALADDR",
			IndexAddr { .. } => "INDEXADDR",
			FastIndexAddr => "FIADDR",
			ElemAddr(_) => "ELEMADDR",
			InitAddr(_) => "INITADDR",
			MatCreate(_) => "MATCREATE",
			ObjCreate(_) => "OBJCREATE",
			InitFill => "INITFILL",
			ElemInit(_) => "ELEMINIT",
			Duplicate => "DUPLICATE",
			DupValue => "DUPVALUE",
			GetValue => "GETVALUE",
			Pop => "POP",
			Save => "SAVE",
			Assign => "ASSIGN",
			AssignPop => "ASSIGNPOP",
			Add => "ADD",
			Sub => "SUB",
			Mul => "MUL",
			Div => "DIV",
			Quo => "QUO",
			Mod => "MOD",
			And => "AND",
			Or => "OR",
			LeftShift => "LEFTSHIFT",
			RightShift => "RIGHTSHIFT",
			Power => "POWER",
			Negate => "NEGATE",
			Not => "NOT",
			Eq => "EQ",
			Ne => "NE",
			Lt => "LT",
			Gt => "GT",
			Le => "LE",
			Ge => "GE",
			PreInc => "PREINC",
			PreDec => "PREDEC",
			PostInc => "POSTINC",
			PostDec => "POSTDEC",
			Jump(_) => "JUMP",
			JumpEq(_) => "JUMPEQ",
			JumpNe(_) => "JUMPNE",
			CondOrJump(_) => "CONDORJUMP",
			CondAndJump(_) => "CONDANDJUMP",
			CaseJump(_) => "CASEJUMP",
			InitStatic(_) => "INITSTATIC",
			Call { .. } => "CALL",
			UserCall { .. } => "USERCALL",
			Return => "RETURN",
			Print => "PRINT",
			PrintEol => "PRINTEOL",
			PrintSpace => "PRINTSPACE",
			PrintString(_) => "PRINTSTRING",
			PrintResult => "PRINTRESULT",
			Quit(_) => "QUIT",
			Show(_) => "SHOW",
		}
	}
}

impl fmt::Display for Op {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		use Op::*;
		let name = self.mnemonic();
		match self {
			Debug(line) => write!(f, "{name} line {line}"),
			Number(id) | Imaginary(id) => write!(f, "{name} #{id}"),
			String(id) | PrintString(id) | Quit(Some(id)) => write!(f, "{name} ${id}"),
			LocalAddr(slot) | ParamAddr(slot) | InitAddr(slot) | ElemInit(slot) | MatCreate(slot) => {
				write!(f, "{name} {slot}")
			}
			GlobalAddr(id) => write!(f, "{name} {id}"),
			IndexAddr { dims, writable } => write!(f, "{name} {dims} {}", if *writable { "w" } else { "r" }),
			ElemAddr(id) => write!(f, "{name} {id}"),
			ObjCreate(id) => write!(f, "{name} {id}"),
			Call { function, args } => write!(f, "{name} {function} {args}"),
			UserCall { function, args } => write!(f, "{name} {function} {args}"),
			Show(topic) => write!(f, "{name} {topic:?}"),
			_ => match self.target() {
				Some(target) => write!(f, "{name} {target}"),
				None => write!(f, "{name}"),
			},
		}
	}
}
