//! A small integer stack machine standing in for the real one.
//!
//! Only the instructions scalar integer code needs are run. Anything else
//! makes the run fail, which the parser reports and survives.
use std::collections::{HashMap, HashSet};

use anyhow::{anyhow, bail, Context};
use zcalc::{
	bytecode::{Function, Op},
	environment::{Environment, SymbolKind},
	scanner::StrSource,
	CalcError, Config, Host, Parser,
};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Loc {
	Global(usize),
	Local(usize),
	Param(usize),
	Old,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Slot {
	Int(i64),
	Addr(Loc),
}

struct Frame {
	params: Vec<i64>,
	locals: Vec<i64>,
}

#[derive(Default)]
pub struct Machine {
	globals:  HashMap<usize, i64>,
	old:      i64,
	/// `(function, offset)` of every `InitStatic` that has run
	statics:  HashSet<(String, usize)>,
	pub out:  String,
	pub runs: usize,
}

impl Machine {
	fn load(&self, frame: &Frame, slot: Slot) -> i64 {
		match slot {
			Slot::Int(v) => v,
			Slot::Addr(Loc::Global(id)) => self.globals.get(&id).copied().unwrap_or(0),
			Slot::Addr(Loc::Local(n)) => frame.locals.get(n).copied().unwrap_or(0),
			Slot::Addr(Loc::Param(n)) => frame.params.get(n).copied().unwrap_or(0),
			Slot::Addr(Loc::Old) => self.old,
		}
	}

	fn store(&mut self, frame: &mut Frame, slot: Slot, value: i64) -> anyhow::Result<()> {
		match slot {
			Slot::Addr(Loc::Global(id)) => {
				self.globals.insert(id, value);
			}
			Slot::Addr(Loc::Local(n)) => *frame.locals.get_mut(n).context("local")? = value,
			Slot::Addr(Loc::Param(n)) => *frame.params.get_mut(n).context("param")? = value,
			Slot::Addr(Loc::Old) => self.old = value,
			Slot::Int(_) => bail!("store into a value"),
		}
		Ok(())
	}

	fn run(&mut self, function: &Function, env: &Environment, params: Vec<i64>) -> anyhow::Result<i64> {
		let mut frame = Frame { locals: vec![0; function.local_count()], params };
		let mut stack: Vec<Slot> = vec![];
		let mut pc = 0;
		macro_rules! pop {
			() => {
				stack.pop().ok_or_else(|| anyhow!("stack underflow at {pc}"))?
			};
		}
		macro_rules! value {
			() => {{
				let slot = pop!();
				self.load(&frame, slot)
			}};
		}
		while let Some(&op) = function.code().get(pc) {
			pc += 1;
			match op {
				Op::Debug(_) | Op::Show(_) => {}
				Op::Number(id) => {
					let text = env.numbers.text(id).context("constant")?;
					stack.push(Slot::Int(text.parse()?));
				}
				Op::Undef | Op::Zero | Op::String(_) => stack.push(Slot::Int(0)),
				Op::One => stack.push(Slot::Int(1)),
				Op::OldValue => stack.push(Slot::Addr(Loc::Old)),
				Op::LocalAddr(n) => stack.push(Slot::Addr(Loc::Local(n))),
				Op::ParamAddr(n) => stack.push(Slot::Addr(Loc::Param(n))),
				Op::GlobalAddr(id) => stack.push(Slot::Addr(Loc::Global(id.index()))),
				Op::Duplicate => {
					let top = *stack.last().context("duplicate")?;
					stack.push(top);
				}
				Op::DupValue => {
					let top = *stack.last().context("dupvalue")?;
					stack.push(Slot::Int(self.load(&frame, top)));
				}
				Op::GetValue => {
					let v = value!();
					stack.push(Slot::Int(v));
				}
				Op::Pop => {
					pop!();
				}
				Op::Save => {
					let top = *stack.last().context("save")?;
					self.old = self.load(&frame, top);
				}
				Op::Assign | Op::AssignPop => {
					let v = value!();
					let target = pop!();
					self.store(&mut frame, target, v)?;
					if op == Op::Assign {
						stack.push(Slot::Int(v));
					}
				}
				Op::Negate => {
					let v = value!();
					stack.push(Slot::Int(-v));
				}
				Op::Not => {
					let v = value!();
					stack.push(Slot::Int((v == 0) as i64));
				}
				Op::PreInc | Op::PreDec | Op::PostInc | Op::PostDec => {
					let target = pop!();
					let old = self.load(&frame, target);
					let new = if matches!(op, Op::PreInc | Op::PostInc) { old + 1 } else { old - 1 };
					self.store(&mut frame, target, new)?;
					stack.push(Slot::Int(if matches!(op, Op::PreInc | Op::PreDec) { new } else { old }));
				}
				Op::Add | Op::Sub | Op::Mul | Op::Div | Op::Quo | Op::Mod | Op::Power | Op::Eq | Op::Ne | Op::Lt | Op::Gt | Op::Le | Op::Ge => {
					let b = value!();
					let a = value!();
					let v = match op {
						Op::Add => a + b,
						Op::Sub => a - b,
						Op::Mul => a * b,
						Op::Div | Op::Quo => a.checked_div(b).context("division by zero")?,
						Op::Mod => a.checked_rem(b).context("division by zero")?,
						Op::Power => a.pow(u32::try_from(b)?),
						Op::Eq => (a == b) as i64,
						Op::Ne => (a != b) as i64,
						Op::Lt => (a < b) as i64,
						Op::Gt => (a > b) as i64,
						Op::Le => (a <= b) as i64,
						_ => (a >= b) as i64,
					};
					stack.push(Slot::Int(v));
				}
				Op::Jump(t) => pc = t,
				Op::JumpEq(t) => {
					if value!() == 0 {
						pc = t;
					}
				}
				Op::JumpNe(t) => {
					if value!() != 0 {
						pc = t;
					}
				}
				Op::CondOrJump(t) | Op::CondAndJump(t) => {
					let top = *stack.last().context("condjump")?;
					let truth = self.load(&frame, top) != 0;
					if truth == matches!(op, Op::CondOrJump(_)) {
						pc = t;
					} else {
						pop!();
					}
				}
				Op::CaseJump(t) => {
					let case = value!();
					let top = *stack.last().context("switch value")?;
					if self.load(&frame, top) != case {
						pc = t;
					} else {
						pop!();
					}
				}
				Op::InitStatic(t) => {
					if !self.statics.insert((function.name().to_string(), pc - 1)) {
						pc = t;
					}
				}
				Op::UserCall { function: id, args } => {
					let mut params = vec![0; args];
					for param in params.iter_mut().rev() {
						*param = value!();
					}
					let callee = env.functions.user(id).context("function")?;
					let body = callee.body.as_ref().with_context(|| format!("{} is not defined", callee.name))?;
					let result = self.run(body, env, params)?;
					stack.push(Slot::Int(result));
				}
				Op::Return => {
					return Ok(match stack.pop() {
						Some(slot) => self.load(&frame, slot),
						None => 0,
					});
				}
				Op::Print => {
					let v = value!();
					self.out.push_str(&v.to_string());
				}
				Op::PrintResult => {
					let v = value!();
					self.out.push_str(&format!("{v}\n"));
				}
				Op::PrintEol => self.out.push('\n'),
				Op::PrintSpace => self.out.push(' '),
				Op::PrintString(id) => self.out.push_str(env.strings.get(id).unwrap_or_default()),
				Op::Quit(_) => return Ok(0),
				other => bail!("unsupported instruction {other:?}"),
			}
		}
		bail!("{} ran off its end", function.name())
	}
}

/// Host running top-level code on a [`Machine`] and keeping listings.
#[derive(Default)]
pub struct Session {
	pub machine:  Machine,
	pub listings: Vec<String>,
}

impl Host for Session {
	fn execute(&mut self, function: &Function, env: &Environment) -> anyhow::Result<()> {
		self.listings.push(function.disassemble(env));
		self.machine.runs += 1;
		self.machine.run(function, env, vec![])?;
		Ok(())
	}
}

pub fn session(config: Config, input: &str) -> (Parser<Session>, Result<(), CalcError>) {
	let mut parser = Parser::new(config, Session::default());
	let result = parser.compile_statement_stream(Box::new(StrSource::new("session", input)));
	(parser, result)
}

pub fn run(input: &str) -> Parser<Session> {
	let (parser, result) = session(Config::default(), input);
	assert!(result.is_ok(), "{input}: {result:?} {:?}", parser.diagnostics());
	parser
}

/// Value of global `name` after the session.
pub fn global(parser: &Parser<Session>, name: &str) -> i64 {
	match parser.environment().symbols.classify(name) {
		SymbolKind::Global(id) => parser.host().machine.globals.get(&id.index()).copied().unwrap_or(0),
		other => panic!("{name} is {other:?}"),
	}
}
