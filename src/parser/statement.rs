//! Statements, brace-delimited bodies and the statements of one top-level
//! evaluation.
//!
//! ``` BNF
//! statement → "if" condition statement ( "else" statement )?
//!           | "for" "(" exprlist? ";" exprlist? ";" exprlist? ")" statement
//!           | "while" condition statement
//!           | "do" statement "while" condition
//!           | "switch" condition body
//!           | "case" exprlist ":" statement
//!           | "default" ":" statement
//!           | ( "continue" | "break" | "goto" LABEL | "return" exprlist? ) ";"
//!           | "print" printlist | "quit" STRING? ";" | "show" topic ";"
//!           | LABEL ":" statement | body | exprlist ";" | ";" ;
//! condition → "(" exprlist ")" ;
//! body      → "{" declarations* statement* "}" ;
//! ```
use tracing::trace;
use TokenType::*;

use super::{ParseResult, Parser, Skip, Targets};
use crate::{
	bytecode::{FunctionKind, Label, Op, ShowTopic},
	error::parser::ParseErrorType,
	host::Host,
	scanner::{ScanMode, TokenType},
};

impl<H: Host> Parser<H> {
	pub(super) fn statement(&mut self, targets: Targets<'_>) -> ParseResult {
		self.nested(|parser| parser.statement_inner(targets))
	}

	fn statement_inner(&mut self, mut targets: Targets<'_>) -> ParseResult {
		let token = self.next()?;
		self.function.emit(Op::Debug(self.scanner.token_line()));
		match token {
			NewLine | Semicolon => return Ok(()),
			RightBrace => return self.error(ParseErrorType::ExtraneousRightBrace, Skip::None),
			Continue => match targets.cont.as_deref_mut() {
				Some(cont) => {
					self.function.emit_jump(Op::Jump, cont);
				}
				None => return self.error(ParseErrorType::ContinueOutsideLoop, Skip::Statement),
			},
			Break => match targets.brk.as_deref_mut() {
				Some(brk) => {
					self.function.emit_jump(Op::Jump, brk);
				}
				None => return self.error(ParseErrorType::BreakOutsideLoop, Skip::Statement),
			},
			Goto => match self.next()? {
				Symbol(name) => {
					self.function.emit_goto(&name);
				}
				_ => return self.error(ParseErrorType::GotoLabelExpected, Skip::Statement),
			},
			Return => self.return_statement()?,
			LeftBrace => {
				self.push_back();
				return self.body(targets, false);
			}
			If => return self.if_statement(targets),
			For => return self.for_statement(),
			While => return self.while_statement(),
			Do => self.do_statement()?,
			Switch => return self.switch_statement(targets),
			Case => return self.case_clause(targets),
			Default => return self.default_clause(targets),
			Else => return self.error(ParseErrorType::ElseWithoutIf, Skip::Statement),
			Show => self.show_statement()?,
			Print => return self.print_statement(),
			Quit => {
				let message = match self.next()? {
					String(id) => Some(id),
					_ => {
						self.push_back();
						None
					}
				};
				self.function.emit(Op::Quit(message));
			}
			Symbol(name) if self.scanner.next_char_is(':') => {
				if self.function.is_label_defined(&name) {
					self.error(ParseErrorType::DuplicateLabel(name), Skip::None)?;
				} else {
					trace!(label = name, "define label");
					self.function.define_label(&name)?;
				}
				return self.statement(targets.loops());
			}
			_ => {
				self.push_back();
				self.expression_statement(targets.in_loop())?;
			}
		}
		self.end_of_statement()
	}

	/// A statement ends at a semicolon, or before a newline or closing brace.
	fn end_of_statement(&mut self) -> ParseResult {
		match self.next()? {
			RightBrace | NewLine | Eof => {
				self.push_back();
				Ok(())
			}
			Semicolon => Ok(()),
			_ => self.error(ParseErrorType::SemicolonExpected, Skip::Statement),
		}
	}

	/// Evaluate for effect inside loops and functions. At the top level the
	/// value is kept as the result of the line, and printed unless it came
	/// from an assignment.
	fn expression_statement(&mut self, in_loop: bool) -> ParseResult {
		let flags = self.expr_list()?;
		if in_loop || !self.is_anonymous() {
			self.function.emit(Op::Pop);
			return Ok(());
		}
		self.function.emit(Op::Save);
		if flags.is_assign() || self.function.kind() == FunctionKind::NestedEval {
			self.function.emit(Op::Pop);
		} else {
			self.function.emit(Op::PrintResult);
		}
		Ok(())
	}

	fn return_statement(&mut self) -> ParseResult {
		match self.next()? {
			NewLine | Semicolon | RightBrace | Eof => {
				self.push_back();
				self.function.emit(Op::Undef);
			}
			_ => {
				self.push_back();
				self.expr_list()?;
				if self.is_anonymous() {
					self.function.emit(Op::Save);
				}
			}
		}
		self.function.emit(Op::Return);
		Ok(())
	}

	/// Parse `( exprlist )`.
	pub(super) fn condition(&mut self) -> ParseResult {
		if !self.next_if(|t| matches!(t, LeftParen))? {
			return self.error(ParseErrorType::LeftParenExpected("condition"), Skip::Statement);
		}
		self.expr_list()?;
		if !self.next_if(|t| matches!(t, RightParen))? {
			return self.error(ParseErrorType::RightParenExpected("condition"), Skip::Statement);
		}
		Ok(())
	}

	fn if_statement(&mut self, mut targets: Targets<'_>) -> ParseResult {
		let mut otherwise = Label::new();
		self.condition()?;
		self.function.emit_jump(Op::JumpEq, &mut otherwise);
		self.statement(targets.loops())?;
		if !self.next_if(|t| matches!(t, Else))? {
			self.function.resolve(&mut otherwise)?;
			return Ok(());
		}
		let mut done = Label::new();
		self.function.emit_jump(Op::Jump, &mut done);
		self.function.resolve(&mut otherwise)?;
		self.statement(targets.loops())?;
		self.function.resolve(&mut done)?;
		Ok(())
	}

	/// `for (init; test; step) body`, where `continue` goes to the step if
	/// there is one, else to the test, else back to the body.
	fn for_statement(&mut self) -> ParseResult {
		let mut test = Label::new();
		let mut step = Label::new();
		let mut body = Label::new();
		let mut brk = Label::new();
		if !self.next_if(|t| matches!(t, LeftParen))? {
			return self.error(ParseErrorType::LeftParenExpected("FOR statement"), Skip::Statement);
		}
		if !self.next_if(|t| matches!(t, Semicolon))? {
			self.expr_list()?;
			self.function.emit(Op::Pop);
			if !self.next_if(|t| matches!(t, Semicolon))? {
				return self.error(ParseErrorType::MissingSemicolon("FOR initializer"), Skip::Statement);
			}
		}
		let has_test = !self.next_if(|t| matches!(t, Semicolon))?;
		if has_test {
			self.function.resolve(&mut test)?;
			self.expr_list()?;
			self.function.emit_jump(Op::JumpNe, &mut body);
			self.function.emit_jump(Op::Jump, &mut brk);
			if !self.next_if(|t| matches!(t, Semicolon))? {
				return self.error(ParseErrorType::MissingSemicolon("FOR condition"), Skip::Statement);
			}
		}
		let has_step = !self.next_if(|t| matches!(t, RightParen))?;
		if has_step {
			if !has_test {
				self.function.emit_jump(Op::Jump, &mut body);
			}
			self.function.resolve(&mut step)?;
			self.expr_list()?;
			self.function.emit(Op::Pop);
			if has_test {
				self.function.emit_jump(Op::Jump, &mut test);
			}
			if !self.next_if(|t| matches!(t, RightParen))? {
				return self.error(ParseErrorType::RightParenExpected("FOR statement"), Skip::Statement);
			}
		}
		self.function.resolve(&mut body)?;
		let cont = match (has_step, has_test) {
			(true, _) => &mut step,
			(false, true) => &mut test,
			(false, false) => &mut body,
		};
		self.statement(Targets { cont: Some(&mut *cont), brk: Some(&mut brk), ..Targets::default() })?;
		self.function.emit_jump(Op::Jump, cont);
		self.function.resolve(&mut brk)?;
		Ok(())
	}

	fn while_statement(&mut self) -> ParseResult {
		let mut cont = Label::new();
		let mut brk = Label::new();
		self.function.resolve(&mut cont)?;
		self.condition()?;
		self.function.emit_jump(Op::JumpEq, &mut brk);
		self.statement(Targets { cont: Some(&mut cont), brk: Some(&mut brk), ..Targets::default() })?;
		self.function.emit_jump(Op::Jump, &mut cont);
		self.function.resolve(&mut brk)?;
		Ok(())
	}

	fn do_statement(&mut self) -> ParseResult {
		let mut top = Label::new();
		let mut cont = Label::new();
		let mut brk = Label::new();
		self.function.resolve(&mut top)?;
		self.statement(Targets { cont: Some(&mut cont), brk: Some(&mut brk), ..Targets::default() })?;
		if !self.next_if(|t| matches!(t, While))? {
			return self.error(ParseErrorType::WhileExpected, Skip::Statement);
		}
		self.function.resolve(&mut cont)?;
		self.condition()?;
		self.function.emit_jump(Op::JumpNe, &mut top);
		self.function.resolve(&mut brk)?;
		Ok(())
	}

	/// The switch value stays on the stack while the cases are tried in
	/// turn. Each `case` jumps to the next one on a mismatch, the last
	/// mismatch goes to `default` or drops the value.
	fn switch_statement(&mut self, mut targets: Targets<'_>) -> ParseResult {
		let mut brk = Label::new();
		let mut next_case = Label::new();
		let mut default = Label::new();
		self.condition()?;
		if !self.next_if(|t| matches!(t, LeftBrace))? {
			return self.error(ParseErrorType::SwitchBraceExpected, Skip::Statement);
		}
		self.function.emit_jump(Op::Jump, &mut next_case);
		self.push_back();
		self.statement(Targets {
			cont:      targets.cont.as_deref_mut(),
			brk:       Some(&mut brk),
			next_case: Some(&mut next_case),
			default:   Some(&mut default),
		})?;
		self.function.emit_jump(Op::Jump, &mut brk);
		self.function.resolve(&mut next_case)?;
		if default.is_resolved() {
			self.function.emit_jump(Op::Jump, &mut default);
		} else {
			self.function.emit(Op::Pop);
		}
		self.function.resolve(&mut brk)?;
		Ok(())
	}

	fn case_clause(&mut self, mut targets: Targets<'_>) -> ParseResult {
		let Some(next_case) = targets.next_case.as_deref_mut() else {
			return self.error(ParseErrorType::CaseOutsideSwitch, Skip::Statement);
		};
		let mut skip = Label::new();
		self.function.emit_jump(Op::Jump, &mut skip);
		let mut this_case = std::mem::take(next_case);
		self.function.resolve(&mut this_case)?;
		self.expr_list()?;
		if !self.next_if(|t| matches!(t, Colon))? {
			return self.error(ParseErrorType::CaseColonExpected, Skip::Statement);
		}
		self.function.emit_jump(Op::CaseJump, next_case);
		self.function.resolve(&mut skip)?;
		self.statement(targets.reborrow())
	}

	fn default_clause(&mut self, mut targets: Targets<'_>) -> ParseResult {
		if !self.next_if(|t| matches!(t, Colon))? {
			return self.error(ParseErrorType::DefaultColonExpected, Skip::Statement);
		}
		let Some(default) = targets.default.as_deref_mut() else {
			return self.error(ParseErrorType::DefaultOutsideSwitch, Skip::Statement);
		};
		if default.is_resolved() {
			return self.error(ParseErrorType::MultipleDefaults, Skip::Statement);
		}
		let mut skip = Label::new();
		self.function.emit_jump(Op::Jump, &mut skip);
		self.function.resolve(default)?;
		self.function.emit(Op::Pop);
		self.function.resolve(&mut skip)?;
		self.statement(targets.reborrow())
	}

	/// `print a, b: c "text"`. A comma prints a space, a colon nothing, and
	/// the line ends unless the list ends in either.
	fn print_statement(&mut self) -> ParseResult {
		let mut eol = true;
		loop {
			match self.next()? {
				RightBrace | NewLine | Eof => {
					self.push_back();
					break;
				}
				Semicolon => break,
				Comma => {
					self.function.emit(Op::PrintSpace);
					eol = false;
				}
				Colon => eol = false,
				String(id) => {
					self.function.emit(Op::PrintString(id));
					eol = true;
				}
				_ => {
					self.push_back();
					self.assignment()?;
					self.function.emit(Op::Print);
					eol = true;
				}
			}
		}
		if eol {
			self.function.emit(Op::PrintEol);
		}
		Ok(())
	}

	/// `show` takes any word starting with the first four letters of a topic.
	fn show_statement(&mut self) -> ParseResult {
		let Symbol(word) = self.next()? else {
			self.push_back();
			eprintln!(
				"SHOW command to be followed by at least four letters of one of:\n\tbuiltin, global, function, \
				 objfunc, config, objtype, files, sizes, opcodes"
			);
			return Ok(());
		};
		let prefix: std::string::String = word.chars().take(4).collect();
		#[rustfmt::skip]
		let topic = match prefix.as_str() {
			"buil" => ShowTopic::Builtins,
			"glob" => ShowTopic::Globals,
			"func" => ShowTopic::Functions,
			"objf" => ShowTopic::ObjectFunctions,
			"conf" => ShowTopic::Config,
			"objt" => ShowTopic::ObjectTypes,
			"file" => ShowTopic::Files,
			"size" => ShowTopic::Sizes,
			"opco" => match self.next()? {
				Symbol(name) => ShowTopic::Opcodes(self.env.functions.intern_user_function(&name)),
				_ => {
					self.push_back();
					return self.error(ParseErrorType::ShowFunctionExpected, Skip::Statement);
				}
			},
			_ => {
				eprintln!("Unknown SHOW parameter \"{word}\" ignored");
				return Ok(());
			}
		};
		self.function.emit(Op::Show(topic));
		Ok(())
	}

	/// Parse `{ declarations statements }`. Declarations are only allowed at
	/// the top of a function body, before any statement.
	pub(super) fn body(&mut self, targets: Targets<'_>, top: bool) -> ParseResult {
		if !self.next_if(|t| matches!(t, LeftBrace))? {
			return self.error(ParseErrorType::MissingLeftBrace, Skip::Statement);
		}
		let mode = self.scanner.set_mode(ScanMode::DEFAULT);
		let result = self.body_statements(targets, top);
		self.scanner.set_mode(mode);
		result
	}

	fn body_statements(&mut self, mut targets: Targets<'_>, top: bool) -> ParseResult {
		let mut seen_code = false;
		loop {
			match self.next()? {
				RightBrace => return Ok(()),
				Eof => {
					self.push_back();
					return self.error(ParseErrorType::MissingRightBrace, Skip::None);
				}
				Local | Global | Static if !top => {
					self.error(ParseErrorType::DeclarationsAtTop, Skip::Statement)?;
				}
				Local | Global | Static if seen_code => {
					self.error(ParseErrorType::DeclarationsBeforeCode, Skip::Statement)?;
				}
				Local | Global | Static => {
					self.push_back();
					self.declarations()?;
				}
				_ => {
					self.push_back();
					self.statement(targets.reborrow())?;
					seen_code = true;
				}
			}
		}
	}

	/// Statements up to the end of the line, or of the input for a nested
	/// evaluation, with declarations allowed before the first of them.
	pub(super) fn top_level_statements(&mut self) -> ParseResult {
		let mut seen_code = false;
		loop {
			match self.next()? {
				Semicolon => {}
				NewLine | Eof => return Ok(()),
				Local | Global | Static if seen_code => {
					self.error(ParseErrorType::DeclarationsBeforeCode, Skip::Statement)?;
				}
				Local | Global | Static => {
					self.push_back();
					self.declarations()?;
				}
				_ => {
					self.push_back();
					self.statement(Targets::default())?;
					seen_code = true;
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::super::tests::{code, compile, errors, last_code};
	use crate::bytecode::Op::{self, *};

	fn jumps(ops: &[Op]) -> Vec<(&'static str, usize)> {
		ops.iter().filter_map(|op| op.target().map(|target| (op.mnemonic(), target))).collect()
	}

	#[test]
	fn top_level_values_are_printed() {
		assert_eq!(code("1\n")[1..], [Save, PrintResult, Undef, Return]);
		assert_eq!(code("x = 1\n")[3..], [Save, Pop, Undef, Return]);
		let parser = compile("define f() { 1; }\n");
		let body = parser.host().defined[0].code();
		assert!(body.contains(&Pop) && !body.contains(&PrintResult));
	}

	#[test]
	fn if_else_jumps() {
		let ops = last_code("x = 1\nif (x) print 1; else print 2;\n");
		let jumps = jumps(&ops);
		assert_eq!(jumps.len(), 2, "{ops:?}");
		let (otherwise, done) = (jumps[0].1, jumps[1].1);
		assert_eq!(jumps[0].0, "JUMPEQ");
		assert!(matches!(ops[otherwise - 1], Jump(_)));
		assert!(done > otherwise);
	}

	#[test]
	fn while_loop_jumps_back() {
		let ops = last_code("x = 3\nwhile (x) x--\n");
		let targets = jumps(&ops);
		assert_eq!(targets[0].0, "JUMPEQ");
		assert_eq!(targets[1], ("JUMP", 1));
		assert_eq!(ops[targets[0].1], Undef);
		assert!(!ops.contains(&PrintResult));
	}

	#[test]
	fn for_loop_continue_goes_to_step() {
		let ops = last_code("for (i = 0; i < 3; i++) { continue; }\n");
		let step = ops.iter().position(|op| *op == PostInc).unwrap() - 1;
		let continue_jump = ops.iter().rposition(|op| *op == Jump(step));
		assert!(continue_jump.is_some(), "{ops:?}");
		assert!(errors("for (;;) break\n").is_empty());
		assert_eq!(errors("for i = 0\n"), ["Left parenthesis expected for FOR statement"]);
		assert_eq!(errors("for (i = 0)\n"), ["Missing semicolon after FOR initializer"]);
	}

	#[test]
	fn do_while() {
		assert!(errors("x = 3\ndo x--; while (x)\n").is_empty());
		assert_eq!(errors("x = 3\ndo x--; until (x)\n"), ["WHILE keyword expected for DO statement"]);
	}

	#[test]
	fn switch_cases() {
		let ops = code("x = 2\nswitch (x) { case 1: print 1; break; case 2: print 2; default: print 3 }\n");
		assert_eq!(ops.iter().filter(|op| matches!(op, CaseJump(_))).count(), 2);
		assert_eq!(errors("case 1: 2\n"), ["CASE not within SWITCH statement"]);
		assert_eq!(errors("default: 2\n"), ["DEFAULT not within SWITCH statement"]);
		assert_eq!(errors("switch (1) { default: 1; default: 2 }\n"), ["Multiple DEFAULT clauses in SWITCH"]);
		assert_eq!(errors("switch (1) 2\n"), ["Missing left brace for switch statement"]);
	}

	#[test]
	fn loop_control_outside_loops() {
		assert_eq!(errors("continue\n"), ["CONTINUE not within FOR, WHILE, or DO"]);
		assert_eq!(errors("break\n"), ["BREAK not within FOR, WHILE, or DO"]);
		assert_eq!(errors("switch (1) { case 1: continue }\n"), ["CONTINUE not within FOR, WHILE, or DO"]);
	}

	#[test]
	fn goto_labels() {
		assert!(errors("goto done; print 1; done: ;\n").is_empty());
		assert_eq!(errors("goto nowhere\n"), ["Label \"nowhere\" is undefined"]);
		assert_eq!(errors("a: 1; a: 2\n"), ["Label \"a\" is multiply defined"]);
		assert_eq!(errors("goto 3\n"), ["Missing label in goto"]);
	}

	#[test]
	fn print_list() {
		let ops = code("print 1, 2: \"x\"\n");
		let printed: Vec<_> = ops.iter().map(Op::mnemonic).filter(|m| m.starts_with("PRINT")).collect();
		assert_eq!(printed, ["PRINT", "PRINTSPACE", "PRINT", "PRINTSTRING", "PRINTEOL"]);
		assert!(!code("print 1,\n").contains(&PrintEol));
	}

	#[test]
	fn statement_errors() {
		assert_eq!(errors("}\n"), ["Extraneous right brace"]);
		assert_eq!(errors("else 1\n"), ["ELSE without preceeding IF"]);
		assert_eq!(errors("if 1\n"), ["Left parenthesis expected for condition"]);
		assert_eq!(errors("1 )\n"), ["Semicolon expected"]);
		assert_eq!(errors("show opcodes 1\n"), ["Function name expected for show opcodes"]);
		assert_eq!(errors("x = 1; local y\n"), ["Declarations must be used before code"]);
	}

	#[test]
	fn show_and_quit() {
		let parser = compile("show glob\nquit \"bye\"\n");
		let executed = &parser.host().executed;
		assert!(executed[0].code().iter().any(|op| matches!(op, Show(crate::bytecode::ShowTopic::Globals))));
		assert!(executed[1].code().iter().any(|op| matches!(op, Quit(Some(_)))));
	}

	#[test]
	fn return_at_top_level_saves() {
		assert_eq!(code("return 4\n")[1..3], [Save, Return]);
		assert_eq!(code("return\n")[..2], [Undef, Return]);
	}
}
