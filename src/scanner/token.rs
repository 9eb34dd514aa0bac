use crate::environment::{ConstId, StrId};

/// The different types of tokens of the calculator language.
///
/// Literal and identifier tokens carry their interned payload, so the copying
/// stays lightweight except for symbol names.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
	/// End of line, only produced while newlines are significant.
	NewLine,
	/// End of the current input.
	Eof,
	/// Semicolon `;`.
	Semicolon,
	/// Colon `:`.
	Colon,
	/// Comma `,`.
	Comma,
	/// Question mark `?`.
	Question,
	/// Left parenthesis `(`.
	LeftParen,
	/// Right parenthesis `)`.
	RightParen,
	/// Left bracket `[`.
	LeftBracket,
	/// Right bracket `]`.
	RightBracket,
	/// Left brace `{`.
	LeftBrace,
	/// Right brace `}`.
	RightBrace,
	/// Period `.` followed by an element name.
	Period,
	/// A lone `.`, the previous value.
	OldValue,
	/// At sign `@`.
	At,
	/// Backquote `` ` ``.
	Backquote,
	/// Dollar `$`.
	Dollar,
	/// Arrow `->`.
	Arrow,
	/// Hash `#`.
	Hash,
	/// Tilde `~`.
	Tilde,
	/// Backslash `\`.
	Backslash,

	/// Assign `=`.
	Assign,
	/// `+=`.
	PlusEquals,
	/// `-=`.
	MinusEquals,
	/// `*=`.
	MultEquals,
	/// `/=`.
	DivEquals,
	/// `//=`.
	SlashSlashEquals,
	/// `%=`.
	ModEquals,
	/// `&=`.
	AndEquals,
	/// `|=`.
	OrEquals,
	/// `<<=`.
	LeftShiftEquals,
	/// `>>=`.
	RightShiftEquals,
	/// `^=` or `**=`.
	PowerEquals,
	/// `#=`.
	HashEquals,
	/// `~=`.
	TildeEquals,
	/// `\=`.
	BackslashEquals,

	/// Plus `+`.
	Plus,
	/// Minus `-`.
	Minus,
	/// Asterisk `*`.
	Mult,
	/// Slash `/`.
	Div,
	/// Integer quotient `//`.
	SlashSlash,
	/// Modulo `%`.
	Mod,
	/// Power `^` or `**`.
	Power,
	/// Increment `++`.
	PlusPlus,
	/// Decrement `--`.
	MinusMinus,
	/// Bitwise and `&`.
	And,
	/// Bitwise or `|`.
	Or,
	/// Logical and `&&`.
	AndAnd,
	/// Logical or `||`.
	OrOr,
	/// Not `!`, also the postfix factorial.
	Not,
	/// Left shift `<<`.
	LeftShift,
	/// Right shift `>>`.
	RightShift,
	/// Equal `==`.
	Eq,
	/// Not equal `!=`.
	Ne,
	/// Less than `<`.
	Lt,
	/// Greater than `>`.
	Gt,
	/// Less than or equal `<=`.
	Le,
	/// Greater than or equal `>=`.
	Ge,

	/// Identifier, e.g. variable or function name.
	Symbol(String),
	/// String literal.
	String(StrId),
	/// Real number literal.
	Number(ConstId),
	/// Imaginary number literal, e.g. `2i`.
	Imaginary(ConstId),

	If,
	Else,
	For,
	While,
	Do,
	Continue,
	Break,
	Goto,
	Return,
	Local,
	Global,
	Static,
	Switch,
	Case,
	Default,
	/// `quit` or `exit`.
	Quit,
	Define,
	Read,
	Show,
	Help,
	Write,
	Mat,
	Obj,
	Print,
	Cd,
}

impl TokenType {
	pub fn is_keyword(&self) -> bool {
		use TokenType::*;
		matches!(
			self,
			If | Else
				| For | While | Do | Continue
				| Break | Goto | Return | Local
				| Global | Static | Switch | Case
				| Default | Quit | Define | Read
				| Show | Help | Write | Mat
				| Obj | Print | Cd
		)
	}

	pub fn keyword_or_symbol(value: &str) -> Self {
		use TokenType::*;
		match value {
			"if" => If,
			"else" => Else,
			"for" => For,
			"while" => While,
			"do" => Do,
			"continue" => Continue,
			"break" => Break,
			"goto" => Goto,
			"return" => Return,
			"local" => Local,
			"global" => Global,
			"static" => Static,
			"switch" => Switch,
			"case" => Case,
			"default" => Default,
			"quit" | "exit" => Quit,
			"define" => Define,
			"read" => Read,
			"show" => Show,
			"help" => Help,
			"write" => Write,
			"mat" => Mat,
			"obj" => Obj,
			"print" => Print,
			"cd" => Cd,
			_ => Symbol(value.to_string()),
		}
	}
}
