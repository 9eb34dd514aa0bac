//! Variable declarations and the `mat` and `obj` constructors.
//!
//! ``` BNF
//! declarations → ( "local" | "global" | "static" ) declaration ( "," declaration )* ";"? ;
//! declaration  → SYMBOL ( "=" assignment )? | "mat" matrices | "obj" object ;
//! matrices     → matrix ( "," matrix )* ;
//! matrix       → SYMBOL ","* matrix | ( "[" bounds? "]" )* ( "=" initlist )? ;
//! bounds       → bound ( "," bound )* ;
//! bound        → assignment ( ":" assignment )? ;
//! object       → TYPE ( "{" ELEMENT ( "," ELEMENT )* "}" )? objects ;
//! objects      → ( SYMBOL ","* )* ( "=" initlist )? ( "," objects )* ;
//! ```
//!
//! In a declaration the names are new variables of the declared scope. As
//! an expression, `mat` and `obj` assign to any variable reference instead.
use tracing::debug;
use TokenType::*;

use super::{ParseResult, Parser, Skip};
use crate::{
	bytecode::{Label, Op},
	environment::{ConstId, SymbolKind, TypeId},
	error::parser::ParseErrorType,
	host::Host,
	scanner::TokenType,
};

/// Where a declared variable lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum DeclScope {
	Local,
	Global,
	/// A global visible only in the declaring function or file, set up once.
	Static,
}

impl<H: Host> Parser<H> {
	/// Parse one `local`, `global` or `static` line.
	pub(super) fn declarations(&mut self) -> ParseResult {
		#[rustfmt::skip]
		let scope = match self.next()? {
			Local => DeclScope::Local,
			Global => DeclScope::Global,
			Static => DeclScope::Static,
			_ => {
				self.push_back();
				return Ok(());
			}
		};
		loop {
			self.one_declaration(scope)?;
			match self.next()? {
				Comma => continue,
				NewLine | RightBrace | Eof => {
					self.push_back();
					return Ok(());
				}
				Semicolon => return Ok(()),
				_ => return self.error(ParseErrorType::BadDeclarationSyntax, Skip::Statement),
			}
		}
	}

	/// A static is initialized the first time its declaration runs, so its
	/// initializer is jumped over from then on.
	fn one_declaration(&mut self, scope: DeclScope) -> ParseResult {
		let mut once = Label::new();
		if scope == DeclScope::Static {
			self.function.emit_jump(Op::InitStatic, &mut once);
		}
		match self.next()? {
			Symbol(name) => {
				self.define_symbol(&name, scope)?;
				if self.next_if(|t| matches!(t, Assign))? {
					self.function.emit(Op::Debug(self.scanner.token_line()));
					self.use_symbol(&name, false)?;
					self.assignment()?;
					self.function.emit(Op::AssignPop);
				}
			}
			Mat => {
				self.function.emit(Op::Debug(self.scanner.token_line()));
				self.mat_declaration(Some(scope))?;
				self.function.emit(Op::Pop);
			}
			Obj => {
				self.function.emit(Op::Debug(self.scanner.token_line()));
				self.obj_declaration(Some(scope))?;
				self.function.emit(Op::Pop);
			}
			_ => self.error(ParseErrorType::BadDeclaration, Skip::Comma)?,
		}
		if scope == DeclScope::Static {
			self.function.resolve(&mut once)?;
		}
		Ok(())
	}

	/// Declare `name` in `scope`. Redeclaring a global is allowed, shadowing
	/// a parameter or local of the same function is not.
	fn define_symbol(&mut self, name: &str, scope: DeclScope) -> ParseResult {
		if let SymbolKind::Parameter(_) | SymbolKind::Local(_) = self.env.symbols.classify(name) {
			return self.error(ParseErrorType::AlreadyDefined(name.to_string()), Skip::Comma);
		}
		let declared = match scope {
			DeclScope::Local => self.env.symbols.declare_local(name).map(drop),
			DeclScope::Global => self.env.symbols.declare_global(name, false).map(drop),
			DeclScope::Static => self.env.symbols.declare_global(name, true).map(drop),
		};
		match declared {
			Ok(()) => Ok(()),
			Err(error) => self.error(error.into(), Skip::Comma),
		}
	}

	/// Parse the matrices after `mat`, leaving the last one on the stack.
	pub(super) fn mat_declaration(&mut self, scope: Option<DeclScope>) -> ParseResult {
		loop {
			self.one_matrix(scope)?;
			if !self.next_if(|t| matches!(t, Comma))? {
				return Ok(());
			}
			self.function.emit(Op::Pop);
		}
	}

	/// `mat a, b[3]` gives every name its own copy of the matrix built last.
	fn one_matrix(&mut self, scope: Option<DeclScope>) -> ParseResult {
		self.nested(|parser| {
			if parser.target(scope)? {
				while parser.next_if(|t| matches!(t, Comma))? {}
				parser.one_matrix(scope)?;
				parser.function.emit(Op::Assign);
				return Ok(());
			}
			if !parser.next_if(|t| matches!(t, LeftBracket))? {
				parser.function.emit(Op::MatCreate(0));
				return Ok(());
			}
			if parser.next_if(|t| matches!(t, RightBracket))? {
				return parser.implicit_matrix();
			}
			parser.create_matrix()?;
			if parser.next_if(|t| matches!(t, Assign))? {
				parser.init_list()?;
			}
			Ok(())
		})
	}

	/// Emit the variable a constructor is assigned to, if a name comes next.
	fn target(&mut self, scope: Option<DeclScope>) -> ParseResult<bool> {
		let Symbol(name) = self.next()? else {
			self.push_back();
			return Ok(false);
		};
		match scope {
			None => {
				self.push_back();
				self.id_expr(false, true)?;
			}
			Some(scope) => {
				self.define_symbol(&name, scope)?;
				self.use_symbol(&name, false)?;
			}
		}
		Ok(true)
	}

	/// `mat m[] = {...}` sizes a one dimensional matrix by its initializer.
	/// The bound is emitted before the list is counted and patched after.
	fn implicit_matrix(&mut self) -> ParseResult {
		let bound = self.function.emit(Op::Number(ConstId::ZERO));
		self.function.emit(Op::One);
		self.function.emit(Op::Sub);
		self.function.emit(Op::Zero);
		self.function.emit(Op::MatCreate(1));
		self.function.emit(Op::Zero);
		self.function.emit(Op::InitFill);
		let count = if self.next_if(|t| matches!(t, Assign))? { self.init_list()? } else { 0 };
		let count = self.env.numbers.intern_integer(count);
		self.function.patch_constant(bound, count)?;
		Ok(())
	}

	/// Parse the bounds of `[a, b:c][d]` up to and including the last `]`.
	/// A lone bound `n` stands for `0:n-1`. A further bracket group builds
	/// the matrix every element starts out as.
	fn create_matrix(&mut self) -> ParseResult {
		self.nested(|parser| {
			let mut dims = 1;
			loop {
				parser.assignment()?;
				match parser.next()? {
					RightBracket | Comma => {
						parser.push_back();
						parser.function.emit(Op::One);
						parser.function.emit(Op::Sub);
						parser.function.emit(Op::Zero);
					}
					Colon => {
						parser.assignment()?;
					}
					_ => parser.push_back(),
				}
				match parser.next()? {
					RightBracket => {
						parser.function.emit(Op::MatCreate(dims));
						if parser.next_if(|t| matches!(t, LeftBracket))? {
							parser.create_matrix()?;
						} else {
							parser.function.emit(Op::Zero);
						}
						parser.function.emit(Op::InitFill);
						return Ok(());
					}
					Comma if dims < parser.config.max_dims => dims += 1,
					Comma => {
						let max = parser.config.max_dims;
						return parser.error(ParseErrorType::TooManyDimensions(max), Skip::Statement);
					}
					_ => return parser.error(ParseErrorType::IllegalMatrix, Skip::Statement),
				}
			}
		})
	}

	/// Parse what follows `obj`: a type name, optionally the definition of
	/// its elements, then the variables to create.
	pub(super) fn obj_declaration(&mut self, scope: Option<DeclScope>) -> ParseResult {
		let Symbol(type_name) = self.next()? else {
			return self.error(ParseErrorType::ObjectTypeExpected, Skip::Statement);
		};
		if !self.next_if(|t| matches!(t, LeftBrace))? {
			return self.obj_vars(&type_name, scope);
		}
		let mut elements = vec![];
		let mut duplicates = false;
		loop {
			let Symbol(element) = self.next()? else {
				return self.error(ParseErrorType::ElementNameExpected, Skip::Statement);
			};
			let id = self.env.objects.intern_element_name(&element);
			if elements.contains(&id) {
				self.error(ParseErrorType::DuplicateElement(element), Skip::None)?;
				duplicates = true;
			}
			elements.push(id);
			match self.next()? {
				RightBrace if duplicates => return self.error(ParseErrorType::ObjectDefinition, Skip::None),
				RightBrace => {
					if let Err(error) = self.env.objects.define_object_type(&type_name, elements) {
						return self.error(error.into(), Skip::None);
					}
					debug!(name = type_name, "object type defined");
					return self.obj_vars(&type_name, scope);
				}
				Comma | Semicolon | NewLine => {}
				_ => return self.error(ParseErrorType::BadElementDefinition, Skip::Statement),
			}
		}
	}

	fn obj_vars(&mut self, type_name: &str, scope: Option<DeclScope>) -> ParseResult {
		let Some(id) = self.env.objects.lookup_object_type(type_name) else {
			return self.error(ParseErrorType::ObjectUndefined(type_name.to_string()), Skip::Statement);
		};
		loop {
			self.one_obj(id, scope)?;
			if !self.next_if(|t| matches!(t, Comma))? {
				return Ok(());
			}
			self.function.emit(Op::Pop);
		}
	}

	fn one_obj(&mut self, id: TypeId, scope: Option<DeclScope>) -> ParseResult {
		self.nested(|parser| {
			if parser.target(scope)? {
				while parser.next_if(|t| matches!(t, Comma))? {}
				parser.one_obj(id, scope)?;
				parser.function.emit(Op::Assign);
				return Ok(());
			}
			parser.function.emit(Op::ObjCreate(id));
			if parser.next_if(|t| matches!(t, Assign))? {
				parser.init_list()?;
			}
			Ok(())
		})
	}
}
