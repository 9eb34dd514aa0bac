use anyhow::Context;
use TokenType::*;

use super::{ExprFlags, ParseResult, Parser, Skip};
use crate::{
	bytecode::{Label, Op},
	environment::{Arity, BuiltinId, FuncId, SymbolKind},
	error::parser::ParseErrorType,
	host::Host,
	scanner::{ScanMode, TokenType},
};

/// The function a call goes to.
#[derive(Clone, Copy)]
enum Callee {
	Builtin(BuiltinId),
	User(FuncId),
}

impl<H: Host> Parser<H> {
	/// Parse comma separated expressions, keeping the value of the last one.
	pub(super) fn expr_list(&mut self) -> ParseResult<ExprFlags> {
		let mut flags = self.assignment()?;
		while self.next_if(|t| matches!(t, Comma))? {
			self.function.emit(Op::Pop);
			self.assignment()?;
			flags = ExprFlags::RVALUE;
		}
		Ok(flags)
	}

	/// Parse an assignment, or whatever expression is there if no assignment
	/// operator follows it.
	pub(super) fn assignment(&mut self) -> ParseResult<ExprFlags> { self.nested(Self::assignment_inner) }

	fn assignment_inner(&mut self) -> ParseResult<ExprFlags> {
		let flags = self.alt_cond()?;
		#[rustfmt::skip]
		let op = match self.next()? {
			Assign => None,
			PlusEquals => Some(Op::Add),
			MinusEquals => Some(Op::Sub),
			MultEquals => Some(Op::Mul),
			DivEquals => Some(Op::Div),
			SlashSlashEquals => Some(Op::Quo),
			ModEquals => Some(Op::Mod),
			AndEquals => Some(Op::And),
			OrEquals => Some(Op::Or),
			LeftShiftEquals => Some(Op::LeftShift),
			RightShiftEquals => Some(Op::RightShift),
			PowerEquals => Some(Op::Power),
			Number(_) | Imaginary(_) | String(_) | Symbol(_) | OldValue | LeftParen | PlusPlus | MinusMinus | Not => {
				self.error(ParseErrorType::MissingOperator, Skip::None)?;
				return Ok(flags);
			}
			_ => {
				self.push_back();
				return Ok(flags);
			}
		};
		if flags.is_rvalue() {
			self.error(ParseErrorType::IllegalAssignment, Skip::None)?;
			self.assignment()?;
			return Ok(ExprFlags::RVALUE | ExprFlags::ASSIGN);
		}
		self.function.mark_index_writable();
		if op.is_some() {
			self.function.emit(Op::Duplicate);
		}
		if self.next_if(|t| matches!(t, LeftBrace))? {
			self.push_back();
			match op {
				Some(op) => {
					self.function.emit(Op::DupValue);
					self.init_list()?;
					self.function.emit(op);
					self.function.emit(Op::Assign);
				}
				None => {
					self.init_list()?;
				}
			}
			return Ok(ExprFlags::ASSIGN);
		}
		self.assignment()?;
		if let Some(op) = op {
			self.function.emit(op);
		}
		self.function.emit(Op::Assign);
		Ok(ExprFlags::ASSIGN)
	}

	/// Parse `cond ? a : b`.
	fn alt_cond(&mut self) -> ParseResult<ExprFlags> {
		let flags = self.or_cond()?;
		if !self.next_if(|t| matches!(t, Question))? {
			return Ok(flags);
		}
		let mut alternative = Label::new();
		let mut done = Label::new();
		self.function.emit_jump(Op::JumpEq, &mut alternative);
		self.nested(Self::alt_cond)?;
		if !self.next_if(|t| matches!(t, Colon))? {
			self.error(ParseErrorType::MissingColon, Skip::Statement)?;
			return Ok(ExprFlags::RVALUE);
		}
		self.function.emit_jump(Op::Jump, &mut done);
		self.function.resolve(&mut alternative)?;
		self.nested(Self::alt_cond)?;
		self.function.resolve(&mut done)?;
		Ok(ExprFlags::RVALUE)
	}

	/// Parse `a || b`, skipping the rest of the chain once a value is true.
	fn or_cond(&mut self) -> ParseResult<ExprFlags> {
		let mut done = Label::new();
		let mut flags = self.and_cond()?;
		while self.next_if(|t| matches!(t, OrOr))? {
			self.function.emit_jump(Op::CondOrJump, &mut done);
			self.and_cond()?;
			flags = ExprFlags::RVALUE;
		}
		if done.has_pending() {
			self.function.resolve(&mut done)?;
		}
		Ok(flags)
	}

	/// Parse `a && b`, skipping the rest of the chain once a value is false.
	fn and_cond(&mut self) -> ParseResult<ExprFlags> {
		let mut done = Label::new();
		let mut flags = self.relation()?;
		while self.next_if(|t| matches!(t, AndAnd))? {
			self.function.emit_jump(Op::CondAndJump, &mut done);
			self.relation()?;
			flags = ExprFlags::RVALUE;
		}
		if done.has_pending() {
			self.function.resolve(&mut done)?;
		}
		Ok(flags)
	}

	fn relation(&mut self) -> ParseResult<ExprFlags> {
		let flags = self.sum()?;
		#[rustfmt::skip]
		let op = match self.next()? {
			Eq => Op::Eq,
			Ne => Op::Ne,
			Lt => Op::Lt,
			Gt => Op::Gt,
			Le => Op::Le,
			Ge => Op::Ge,
			_ => {
				self.push_back();
				return Ok(flags);
			}
		};
		self.sum()?;
		self.function.emit(op);
		Ok(ExprFlags::RVALUE)
	}

	fn sum(&mut self) -> ParseResult<ExprFlags> {
		let mut flags = self.product()?;
		loop {
			let op = match self.next()? {
				Plus => Op::Add,
				Minus => Op::Sub,
				_ => {
					self.push_back();
					return Ok(flags);
				}
			};
			self.product()?;
			self.function.emit(op);
			flags = ExprFlags::RVALUE;
		}
	}

	fn product(&mut self) -> ParseResult<ExprFlags> {
		let mut flags = self.or_expr()?;
		loop {
			let op = match self.next()? {
				Mult => Op::Mul,
				Div => Op::Div,
				Mod => Op::Mod,
				SlashSlash => Op::Quo,
				_ => {
					self.push_back();
					return Ok(flags);
				}
			};
			self.or_expr()?;
			self.function.emit(op);
			flags = ExprFlags::RVALUE;
		}
	}

	fn or_expr(&mut self) -> ParseResult<ExprFlags> {
		let mut flags = self.and_expr()?;
		while self.next_if(|t| matches!(t, Or))? {
			self.and_expr()?;
			self.function.emit(Op::Or);
			flags = ExprFlags::RVALUE;
		}
		Ok(flags)
	}

	fn and_expr(&mut self) -> ParseResult<ExprFlags> {
		let mut flags = self.shift()?;
		while self.next_if(|t| matches!(t, And))? {
			self.shift()?;
			self.function.emit(Op::And);
			flags = ExprFlags::RVALUE;
		}
		Ok(flags)
	}

	/// Parse the postfix operators of a term, then a right associative
	/// power or shift.
	fn shift(&mut self) -> ParseResult<ExprFlags> { self.nested(Self::shift_inner) }

	fn shift_inner(&mut self) -> ParseResult<ExprFlags> {
		let mut flags = self.term()?;
		let mut token = self.next()?;
		if matches!(token, PlusPlus | MinusMinus) {
			let increment = matches!(token, PlusPlus);
			if flags.is_rvalue() {
				let error = if increment { ParseErrorType::BadIncrement } else { ParseErrorType::BadDecrement };
				self.error(error, Skip::None)?;
			}
			self.function.mark_index_writable();
			self.function.emit(if increment { Op::PostInc } else { Op::PostDec });
			flags = ExprFlags::RVALUE | ExprFlags::ASSIGN;
			token = self.next()?;
		}
		if matches!(token, Not) {
			let fact = self.env.functions.lookup_builtin("fact").context("no factorial builtin")?;
			self.function.emit(Op::Call { function: fact, args: 1 });
			flags = ExprFlags::RVALUE;
			token = self.next()?;
		}
		let op = match token {
			Power => Op::Power,
			LeftShift => Op::LeftShift,
			RightShift => Op::RightShift,
			_ => {
				self.push_back();
				return Ok(flags);
			}
		};
		self.shift()?;
		self.function.emit(op);
		Ok(ExprFlags::RVALUE)
	}

	fn term(&mut self) -> ParseResult<ExprFlags> { self.nested(Self::term_inner) }

	fn term_inner(&mut self) -> ParseResult<ExprFlags> {
		let flags = match self.next()? {
			Number(id) => {
				self.function.emit(Op::Number(id));
				ExprFlags::RVALUE | ExprFlags::CONST
			}
			Imaginary(id) => {
				self.function.emit(Op::Imaginary(id));
				ExprFlags::RVALUE | ExprFlags::CONST
			}
			String(id) => {
				self.function.emit(Op::String(id));
				ExprFlags::RVALUE | ExprFlags::CONST
			}
			OldValue => {
				self.function.emit(Op::OldValue);
				ExprFlags::ADDRESS
			}
			token @ (PlusPlus | MinusMinus) => {
				let increment = matches!(token, PlusPlus);
				if self.term()?.is_rvalue() {
					let error = if increment { ParseErrorType::BadIncrement } else { ParseErrorType::BadDecrement };
					self.error(error, Skip::None)?;
				}
				self.function.mark_index_writable();
				self.function.emit(if increment { Op::PreInc } else { Op::PreDec });
				ExprFlags::ASSIGN
			}
			Not => {
				self.term()?;
				self.function.emit(Op::Not);
				ExprFlags::RVALUE
			}
			Minus => {
				self.term()?;
				self.function.emit(Op::Negate);
				ExprFlags::RVALUE
			}
			Plus => {
				self.term()?;
				ExprFlags::RVALUE
			}
			LeftParen => {
				let flags = self.expr_list()?;
				if !self.next_if(|t| matches!(t, RightParen))? {
					self.error(ParseErrorType::MissingRightParen, Skip::Statement)?;
				}
				flags
			}
			Mat => {
				self.mat_declaration(None)?;
				ExprFlags::ASSIGN
			}
			Obj => {
				self.obj_declaration(None)?;
				ExprFlags::ASSIGN
			}
			Symbol(_) => {
				self.push_back();
				self.id_expr(true, false)?
			}
			LeftBracket => {
				self.error(ParseErrorType::BadIndexUsage, Skip::None)?;
				ExprFlags::ADDRESS
			}
			Period => {
				self.error(ParseErrorType::BadElementReference, Skip::None)?;
				ExprFlags::ADDRESS
			}
			token if token.is_keyword() => {
				self.error(ParseErrorType::ReservedKeyword, Skip::None)?;
				ExprFlags::ADDRESS
			}
			_ => {
				self.push_back();
				self.error(ParseErrorType::MissingExpression, Skip::Comma)?;
				ExprFlags::ADDRESS
			}
		};
		Ok(flags)
	}

	/// Parse a name with any call, index and element references after it.
	///
	/// With `ok_mat` unset the name ends before a `[`, as in `mat a[3]`.
	/// With `autodef` an unknown name at the top level becomes a global.
	pub(super) fn id_expr(&mut self, ok_mat: bool, autodef: bool) -> ParseResult<ExprFlags> {
		let Some(name) = self.identifier()? else { return Ok(ExprFlags::ADDRESS) };
		let mut flags = ExprFlags::ADDRESS;
		match self.next()? {
			LeftParen => {
				self.call_args(&name)?;
				flags = ExprFlags::RVALUE;
			}
			Assign => {
				self.push_back();
				self.use_symbol(&name, true)?;
			}
			_ => {
				self.push_back();
				self.use_symbol(&name, autodef)?;
			}
		}
		loop {
			match self.next()? {
				LeftBracket => {
					self.push_back();
					if !ok_mat {
						return Ok(flags);
					}
					self.matrix_args()?;
					flags = ExprFlags::ADDRESS;
				}
				Period => {
					self.element()?;
					flags = ExprFlags::ADDRESS;
				}
				LeftParen => {
					self.error(ParseErrorType::CallNotAllowed, Skip::None)?;
					self.push_back();
					return Ok(flags);
				}
				_ => {
					self.push_back();
					return Ok(flags);
				}
			}
		}
	}

	/// Read a name that is not a keyword.
	pub(super) fn identifier(&mut self) -> ParseResult<Option<std::string::String>> {
		match self.next()? {
			Symbol(name) => Ok(Some(name)),
			token if token.is_keyword() => {
				self.error(ParseErrorType::KeywordAsSymbol, Skip::None)?;
				Ok(None)
			}
			_ => {
				self.push_back();
				self.error(ParseErrorType::SymbolExpected, Skip::None)?;
				Ok(None)
			}
		}
	}

	/// Emit the address of a variable.
	pub(super) fn use_symbol(&mut self, name: &str, autodef: bool) -> ParseResult {
		let op = match self.env.symbols.classify(name) {
			SymbolKind::Parameter(slot) => Op::ParamAddr(slot),
			SymbolKind::Local(slot) => Op::LocalAddr(slot),
			SymbolKind::Static(id) | SymbolKind::Global(id) => Op::GlobalAddr(id),
			SymbolKind::Undefined if autodef && self.is_anonymous() => match self.env.symbols.declare_global(name, false) {
				Ok(id) => Op::GlobalAddr(id),
				Err(error) => return self.error(error.into(), Skip::None),
			},
			SymbolKind::Undefined => return self.error(ParseErrorType::Undefined(name.to_string()), Skip::None),
		};
		self.function.emit(op);
		Ok(())
	}

	/// Parse call arguments after the opening parenthesis. An argument
	/// written `&x` is passed by address, an empty one is undefined.
	fn call_args(&mut self, name: &str) -> ParseResult {
		let callee = match self.env.functions.lookup_builtin(name) {
			Some(id) => Callee::Builtin(id),
			None => Callee::User(self.env.functions.intern_user_function(name)),
		};
		if self.next_if(|t| matches!(t, RightParen))? {
			return self.emit_call(callee, 0);
		}
		let quomod = name == "quomod";
		let mut args = 0;
		loop {
			args += 1;
			match self.next()? {
				RightParen => {
					self.function.emit(Op::Undef);
					return self.emit_call(callee, args);
				}
				Comma => {
					self.function.emit(Op::Undef);
					continue;
				}
				_ => self.push_back(),
			}
			let by_address = self.next_if(|t| matches!(t, And))?;
			let flags = self.assignment()?;
			if by_address {
				if flags.is_rvalue() {
					self.error(ParseErrorType::AddressOfNonVariable, Skip::None)?;
				}
				self.function.mark_index_writable();
			} else if matches!(callee, Callee::User(_)) {
				self.function.emit(Op::GetValue);
			}
			if quomod && args > 2 {
				self.function.mark_index_writable();
			}
			match self.next()? {
				RightParen => return self.emit_call(callee, args),
				Comma => {}
				_ => return self.error(ParseErrorType::MissingCallParen, Skip::Statement),
			}
		}
	}

	fn emit_call(&mut self, callee: Callee, args: usize) -> ParseResult {
		let op = match callee {
			Callee::Builtin(function) => {
				if let Err(arity) = self.env.functions.check_arity(function, args) {
					let name = self.env.functions.builtin(function).map_or("", |b| b.name).to_string();
					let error = match arity {
						Arity::TooFew => ParseErrorType::TooFewArguments(name),
						Arity::TooMany => ParseErrorType::TooManyArguments(name),
					};
					self.error(error, Skip::None)?;
				}
				Op::Call { function, args }
			}
			Callee::User(function) => Op::UserCall { function, args },
		};
		self.function.emit(op);
		Ok(())
	}

	/// Parse `[i, j]` or the fast index `[[i]]`.
	fn matrix_args(&mut self) -> ParseResult {
		if !self.next_if(|t| matches!(t, LeftBracket))? {
			return self.error(ParseErrorType::MatrixIndexExpected, Skip::None);
		}
		if self.next_if(|t| matches!(t, LeftBracket))? {
			self.assignment()?;
			if !self.next_if(|t| matches!(t, RightBracket))? || !self.next_if(|t| matches!(t, RightBracket))? {
				return self.error(ParseErrorType::BadFastIndex, Skip::None);
			}
			self.function.emit(Op::FastIndexAddr);
			return Ok(());
		}
		let mut dims = 1;
		loop {
			self.assignment()?;
			match self.next()? {
				RightBracket => {
					self.function.emit(Op::IndexAddr { dims, writable: false });
					return Ok(());
				}
				Comma => dims += 1,
				_ => {
					self.push_back();
					return self.error(ParseErrorType::MissingRightBracket, Skip::None);
				}
			}
		}
	}

	/// Parse the name after the `.` of an element reference.
	fn element(&mut self) -> ParseResult {
		let Some(name) = self.identifier()? else { return Ok(()) };
		match self.env.objects.lookup_element(&name) {
			Some(id) => {
				self.function.emit(Op::ElemAddr(id));
				Ok(())
			}
			None => self.error(ParseErrorType::UndefinedElement(name), Skip::None),
		}
	}

	/// Parse `{a, b, {c, d}}` into the composite on the stack, returning
	/// the number of slots it fills.
	pub(super) fn init_list(&mut self) -> ParseResult<usize> {
		self.nested(|parser| {
			let mode = parser.scanner.set_mode(ScanMode::DEFAULT);
			let result = parser.init_entries();
			parser.scanner.set_mode(mode);
			result
		})
	}

	fn init_entries(&mut self) -> ParseResult<usize> {
		if !self.next_if(|t| matches!(t, LeftBrace))? {
			self.error(ParseErrorType::InitializerBrace, Skip::Statement)?;
			return Ok(0);
		}
		let mut index = 0;
		loop {
			match self.next()? {
				Comma => {
					index += 1;
					continue;
				}
				RightBrace => return Ok(index),
				LeftBrace => {
					self.push_back();
					self.function.emit(Op::Duplicate);
					self.function.emit(Op::InitAddr(index));
					self.init_list()?;
				}
				_ => {
					self.push_back();
					self.assignment()?;
				}
			}
			self.function.emit(Op::ElemInit(index));
			match self.next()? {
				Comma => index += 1,
				RightBrace => return Ok(index + 1),
				_ => {
					self.error(ParseErrorType::BadInitializer, Skip::Statement)?;
					return Ok(0);
				}
			}
		}
	}
}
