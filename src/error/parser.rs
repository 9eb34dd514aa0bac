use crate::environment::{ObjectError, ScopeError};

/// Syntax and semantic errors found while compiling a unit.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorType {
	// Terms and expressions
	MissingExpression,
	ReservedKeyword,
	KeywordAsSymbol,
	SymbolExpected,
	MissingOperator,
	IllegalAssignment,
	BadIncrement,
	BadDecrement,
	BadIndexUsage,
	BadElementReference,
	BadFastIndex,
	MatrixIndexExpected,
	MissingRightBracket,
	MissingRightParen,
	MissingColon,
	CallNotAllowed,
	AddressOfNonVariable,
	MissingCallParen,
	TooFewArguments(String),
	TooManyArguments(String),

	// Names
	Undefined(String),
	UndefinedElement(String),
	AlreadyDefined(String),
	DuplicateParameter(String),
	UndefinedLabel(String),
	DuplicateLabel(String),

	// Functions and bodies
	FunctionNameExpected,
	BuiltinName,
	FunctionLeftParen,
	BadFunctionDefinition,
	FunctionBodyExpected,
	IllegalFunctionDefinition,
	MissingLeftBrace,
	MissingRightBrace,
	DeclarationsAtTop,
	DeclarationsBeforeCode,

	// Statements
	ExtraneousRightBrace,
	ContinueOutsideLoop,
	BreakOutsideLoop,
	GotoLabelExpected,
	ElseWithoutIf,
	LeftParenExpected(&'static str),
	RightParenExpected(&'static str),
	SemicolonExpected,
	MissingSemicolon(&'static str),
	WhileExpected,
	SwitchBraceExpected,
	CaseOutsideSwitch,
	CaseColonExpected,
	DefaultOutsideSwitch,
	DefaultColonExpected,
	MultipleDefaults,
	ShowFunctionExpected,

	// Declarations
	BadDeclarationSyntax,
	BadDeclaration,
	ObjectTypeExpected,
	ElementNameExpected,
	DuplicateElement(String),
	ObjectDefinition,
	BadElementDefinition,
	ObjectUndefined(String),
	ObjectRedefined(String),
	TooManyDimensions(usize),
	IllegalMatrix,
	InitializerBrace,
	BadInitializer,

	// Commands
	FilenameExpected,
	FilenameSemicolon,
	CannotOpen(String),
	InputDepth,
	CannotWrite(String),
}

impl std::fmt::Display for ParseErrorType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		use ParseErrorType::*;
		match self {
			MissingExpression => write!(f, "Missing expression"),
			ReservedKeyword => write!(f, "Expression contains reserved keyword"),
			KeywordAsSymbol => write!(f, "Reserved keyword used as symbol name"),
			SymbolExpected => write!(f, "Symbol name expected"),
			MissingOperator => write!(f, "Missing operator"),
			IllegalAssignment => write!(f, "Illegal assignment"),
			BadIncrement => write!(f, "Bad ++ usage"),
			BadDecrement => write!(f, "Bad -- usage"),
			BadIndexUsage => write!(f, "Bad index usage"),
			BadElementReference => write!(f, "Bad element reference"),
			BadFastIndex => write!(f, "Bad fast index usage"),
			MatrixIndexExpected => write!(f, "Matrix indexing expected"),
			MissingRightBracket => write!(f, "Missing right bracket in array reference"),
			MissingRightParen => write!(f, "Missing right parenthesis"),
			MissingColon => write!(f, "Missing colon for conditional expression"),
			CallNotAllowed => write!(f, "Function calls not allowed as expressions"),
			AddressOfNonVariable => write!(f, "Taking address of non-variable"),
			MissingCallParen => write!(f, "Missing right parenthesis in function call"),
			TooFewArguments(name) => write!(f, "Too few arguments for builtin function \"{name}\""),
			TooManyArguments(name) => write!(f, "Too many arguments for builtin function \"{name}\""),

			Undefined(name) => write!(f, "\"{name}\" is undefined"),
			UndefinedElement(name) => write!(f, "Element \"{name}\" is undefined"),
			AlreadyDefined(name) => write!(f, "Variable \"{name}\" is already defined"),
			DuplicateParameter(name) => write!(f, "Parameter \"{name}\" is already defined"),
			UndefinedLabel(name) => write!(f, "Label \"{name}\" is undefined"),
			DuplicateLabel(name) => write!(f, "Label \"{name}\" is multiply defined"),

			FunctionNameExpected => write!(f, "Function name expected"),
			BuiltinName => write!(f, "Using builtin function name"),
			FunctionLeftParen => write!(f, "Left parenthesis expected for function"),
			BadFunctionDefinition => write!(f, "Bad function definition"),
			FunctionBodyExpected => write!(f, "Left brace or equals sign expected for function"),
			IllegalFunctionDefinition => write!(f, "Illegal function definition"),
			MissingLeftBrace => write!(f, "Missing left brace for function body"),
			MissingRightBrace => write!(f, "Missing right brace"),
			DeclarationsAtTop => write!(f, "Declarations must be at the top of the function"),
			DeclarationsBeforeCode => write!(f, "Declarations must be used before code"),

			ExtraneousRightBrace => write!(f, "Extraneous right brace"),
			ContinueOutsideLoop => write!(f, "CONTINUE not within FOR, WHILE, or DO"),
			BreakOutsideLoop => write!(f, "BREAK not within FOR, WHILE, or DO"),
			GotoLabelExpected => write!(f, "Missing label in goto"),
			ElseWithoutIf => write!(f, "ELSE without preceeding IF"),
			LeftParenExpected(what) => write!(f, "Left parenthesis expected for {what}"),
			RightParenExpected(what) => write!(f, "Right parenthesis expected for {what}"),
			SemicolonExpected => write!(f, "Semicolon expected"),
			MissingSemicolon(what) => write!(f, "Missing semicolon after {what}"),
			WhileExpected => write!(f, "WHILE keyword expected for DO statement"),
			SwitchBraceExpected => write!(f, "Missing left brace for switch statement"),
			CaseOutsideSwitch => write!(f, "CASE not within SWITCH statement"),
			CaseColonExpected => write!(f, "Missing colon after CASE value"),
			DefaultOutsideSwitch => write!(f, "DEFAULT not within SWITCH statement"),
			DefaultColonExpected => write!(f, "Missing colon after DEFAULT keyword"),
			MultipleDefaults => write!(f, "Multiple DEFAULT clauses in SWITCH"),
			ShowFunctionExpected => write!(f, "Function name expected for show opcodes"),

			BadDeclarationSyntax => write!(f, "Bad syntax in declaration statement"),
			BadDeclaration => write!(f, "Bad syntax for declaration"),
			ObjectTypeExpected => write!(f, "Object type name missing"),
			ElementNameExpected => write!(f, "Missing element name in OBJ statement"),
			DuplicateElement(name) => write!(f, "Duplicate element name \"{name}\""),
			ObjectDefinition => write!(f, "Object definition has duplicate elements"),
			BadElementDefinition => write!(f, "Bad object element definition"),
			ObjectUndefined(name) => write!(f, "Object type \"{name}\" is undefined"),
			ObjectRedefined(name) => write!(f, "Object type \"{name}\" is already defined differently"),
			TooManyDimensions(max) => write!(f, "Only {max} dimensions allowed"),
			IllegalMatrix => write!(f, "Illegal matrix definition"),
			InitializerBrace => write!(f, "Missing left brace for initialization list"),
			BadInitializer => write!(f, "Bad initialization list"),

			FilenameExpected => write!(f, "Filename expected"),
			FilenameSemicolon => write!(f, "Missing semicolon after filename"),
			CannotOpen(name) => write!(f, "Cannot open \"{name}\""),
			InputDepth => write!(f, "Maximum input depth reached"),
			CannotWrite(name) => write!(f, "Error writing \"{name}\""),
		}
	}
}

impl std::error::Error for ParseErrorType {}

impl From<ScopeError> for ParseErrorType {
	fn from(error: ScopeError) -> Self {
		match error {
			ScopeError::AlreadyDefined(name) => Self::AlreadyDefined(name),
			ScopeError::DuplicateParameter(name) => Self::DuplicateParameter(name),
		}
	}
}

impl From<ObjectError> for ParseErrorType {
	fn from(error: ObjectError) -> Self {
		match error {
			ObjectError::Redefined(name) => Self::ObjectRedefined(name),
		}
	}
}
