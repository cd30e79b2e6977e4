//! Typed AST wrappers over the untyped rowan CST.
//!
//! This module provides strongly-typed accessors for Huff syntax nodes.
//! Each struct wraps a SyntaxNode and provides methods to access children.
//! Accessors return `None` or skip items where error recovery left a
//! construct incomplete.

use smol_str::SmolStr;

use super::syntax_kind::{SyntaxKind, SyntaxNode, SyntaxToken};

/// Trait for AST nodes that wrap a SyntaxNode
pub trait AstNode: Sized {
    fn can_cast(kind: SyntaxKind) -> bool;
    fn cast(node: SyntaxNode) -> Option<Self>;
    fn syntax(&self) -> &SyntaxNode;
}

// ============================================================================
// Helper macros
// ============================================================================

macro_rules! ast_node {
    ($name:ident, $($kind:ident)|+) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(SyntaxNode);

        impl AstNode for $name {
            fn can_cast(kind: SyntaxKind) -> bool {
                matches!(kind, $(SyntaxKind::$kind)|+)
            }

            fn cast(node: SyntaxNode) -> Option<Self> {
                if Self::can_cast(node.kind()) {
                    Some(Self(node))
                } else {
                    None
                }
            }

            fn syntax(&self) -> &SyntaxNode {
                &self.0
            }
        }
    };
}

fn tokens(node: &SyntaxNode) -> impl Iterator<Item = SyntaxToken> + use<> {
    node.children_with_tokens().filter_map(|element| element.into_token())
}

/// Text of the first non-missing token of `kind` directly under `node`.
fn token_text(node: &SyntaxNode, kind: SyntaxKind) -> Option<SmolStr> {
    tokens(node)
        .find(|token| token.kind() == kind && !token.text().is_empty())
        .map(|token| SmolStr::new(token.text()))
}

fn child<N: AstNode>(node: &SyntaxNode) -> Option<N> {
    node.children().find_map(N::cast)
}

/// Identifiers between the first `(` and its `)`.
fn parenthesized_names(node: &SyntaxNode) -> Vec<SmolStr> {
    tokens(node)
        .skip_while(|token| token.kind() != SyntaxKind::L_PAREN)
        .take_while(|token| token.kind() != SyntaxKind::R_PAREN)
        .filter(|token| token.kind() == SyntaxKind::IDENTIFIER && !token.text().is_empty())
        .map(|token| SmolStr::new(token.text()))
        .collect()
}

fn unquote(text: &str) -> SmolStr {
    let inner = text
        .strip_prefix(['"', '\''])
        .and_then(|rest| rest.strip_suffix(['"', '\'']))
        .unwrap_or(text);
    SmolStr::new(inner)
}

// ============================================================================
// Root
// ============================================================================

ast_node!(SourceFile, SOURCE_FILE);

impl SourceFile {
    pub fn definitions(&self) -> impl Iterator<Item = Definition> + use<> {
        self.0.children().filter_map(Definition::cast)
    }

    pub fn declarations(&self) -> impl Iterator<Item = Declaration> + use<> {
        self.0.children().filter_map(Declaration::cast)
    }

    /// Every `#define macro` and `#define fn`
    pub fn macros(&self) -> impl Iterator<Item = Macro> + use<> {
        self.declarations().filter_map(|declaration| match declaration.item()? {
            Declared::Macro(item) => Some(item),
            _ => None,
        })
    }

    pub fn find_macro(&self, name: &str) -> Option<Macro> {
        self.macros().find(|item| item.name().as_deref() == Some(name))
    }
}

// ============================================================================
// Top-level definitions
// ============================================================================

/// Anything at the top level of a file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Definition {
    Declaration(Declaration),
    Decorator(Decorator),
    Import(Import),
}

impl AstNode for Definition {
    fn can_cast(kind: SyntaxKind) -> bool {
        matches!(kind, SyntaxKind::DECLARATION | SyntaxKind::DECORATOR | SyntaxKind::IMPORT)
    }

    fn cast(node: SyntaxNode) -> Option<Self> {
        match node.kind() {
            SyntaxKind::DECLARATION => Some(Self::Declaration(Declaration(node))),
            SyntaxKind::DECORATOR => Some(Self::Decorator(Decorator(node))),
            SyntaxKind::IMPORT => Some(Self::Import(Import(node))),
            _ => None,
        }
    }

    fn syntax(&self) -> &SyntaxNode {
        match self {
            Self::Declaration(it) => it.syntax(),
            Self::Decorator(it) => it.syntax(),
            Self::Import(it) => it.syntax(),
        }
    }
}

ast_node!(Declaration, DECLARATION);

/// What a `#define` declares
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Declared {
    Constant(Constant),
    Error(ErrorDef),
    Event(Event),
    Function(Function),
    Jumptable(Jumptable),
    Macro(Macro),
    Table(Table),
    Test(Test),
}

impl Declaration {
    pub fn item(&self) -> Option<Declared> {
        self.0.children().find_map(|node| match node.kind() {
            SyntaxKind::CONSTANT => Some(Declared::Constant(Constant(node))),
            SyntaxKind::ERROR_DEF => Some(Declared::Error(ErrorDef(node))),
            SyntaxKind::EVENT => Some(Declared::Event(Event(node))),
            SyntaxKind::FUNCTION => Some(Declared::Function(Function(node))),
            SyntaxKind::JUMPTABLE | SyntaxKind::JUMPTABLE_PACKED => {
                Some(Declared::Jumptable(Jumptable(node)))
            }
            SyntaxKind::MACRO | SyntaxKind::FN => Some(Declared::Macro(Macro(node))),
            SyntaxKind::TABLE => Some(Declared::Table(Table(node))),
            SyntaxKind::TEST => Some(Declared::Test(Test(node))),
            _ => None,
        })
    }

    /// Name of the declared item
    pub fn name(&self) -> Option<SmolStr> {
        self.0
            .children()
            .find_map(|node| token_text(&node, SyntaxKind::IDENTIFIER))
    }
}

ast_node!(Import, IMPORT);

impl Import {
    /// The imported path without its quotes
    pub fn path(&self) -> Option<SmolStr> {
        token_text(&self.0, SyntaxKind::STRING_LITERAL).map(|text| unquote(&text))
    }
}

ast_node!(Decorator, DECORATOR);

impl Decorator {
    pub fn items(&self) -> impl Iterator<Item = DecoratorItem> + use<> {
        self.0.children().filter_map(DecoratorItem::cast)
    }
}

ast_node!(DecoratorItem, DECORATOR_ITEM);

impl DecoratorItem {
    pub fn name(&self) -> Option<SmolStr> {
        token_text(&self.0, SyntaxKind::IDENTIFIER)
    }

    /// Arguments as written, strings unquoted
    pub fn args(&self) -> Vec<SmolStr> {
        tokens(&self.0)
            .skip_while(|token| token.kind() != SyntaxKind::L_PAREN)
            .filter(|token| {
                matches!(
                    token.kind(),
                    SyntaxKind::IDENTIFIER | SyntaxKind::NUMBER | SyntaxKind::STRING_LITERAL
                ) && !token.text().is_empty()
            })
            .map(|token| unquote(token.text()))
            .collect()
    }
}

// ============================================================================
// Macros, tables, tests
// ============================================================================

ast_node!(Macro, MACRO | FN);

impl Macro {
    pub fn name(&self) -> Option<SmolStr> {
        token_text(&self.0, SyntaxKind::IDENTIFIER)
    }

    /// `fn` rather than `macro`
    pub fn is_fn(&self) -> bool {
        self.0.kind() == SyntaxKind::FN
    }

    pub fn parameters(&self) -> Vec<SmolStr> {
        parenthesized_names(&self.0)
    }

    /// Stack items the macro takes
    pub fn takes(&self) -> Option<SmolStr> {
        self.count_after(SyntaxKind::TAKES_KW)
    }

    /// Stack items the macro returns
    pub fn returns(&self) -> Option<SmolStr> {
        self.count_after(SyntaxKind::RETURNS_KW)
    }

    pub fn body(&self) -> Option<MacroBody> {
        child(&self.0)
    }

    fn count_after(&self, keyword: SyntaxKind) -> Option<SmolStr> {
        tokens(&self.0)
            .skip_while(|token| token.kind() != keyword)
            .find(|token| token.kind() == SyntaxKind::NUMBER && !token.text().is_empty())
            .map(|token| SmolStr::new(token.text()))
    }
}

ast_node!(Table, TABLE);

impl Table {
    pub fn name(&self) -> Option<SmolStr> {
        token_text(&self.0, SyntaxKind::IDENTIFIER)
    }

    pub fn body(&self) -> Option<MacroBody> {
        child(&self.0)
    }
}

ast_node!(Test, TEST);

impl Test {
    pub fn name(&self) -> Option<SmolStr> {
        token_text(&self.0, SyntaxKind::IDENTIFIER)
    }

    pub fn parameters(&self) -> Vec<SmolStr> {
        parenthesized_names(&self.0)
    }

    pub fn body(&self) -> Option<MacroBody> {
        child(&self.0)
    }
}

ast_node!(Jumptable, JUMPTABLE | JUMPTABLE_PACKED);

impl Jumptable {
    pub fn name(&self) -> Option<SmolStr> {
        token_text(&self.0, SyntaxKind::IDENTIFIER)
    }

    pub fn is_packed(&self) -> bool {
        self.0.kind() == SyntaxKind::JUMPTABLE_PACKED
    }

    /// Jump labels in table order
    pub fn labels(&self) -> Vec<SmolStr> {
        self.0
            .children()
            .filter(|node| node.kind() == SyntaxKind::JUMPTABLE_BODY)
            .flat_map(|body| body.children())
            .filter(|node| node.kind() == SyntaxKind::JUMPDEST)
            .filter_map(|node| token_text(&node, SyntaxKind::IDENTIFIER))
            .collect()
    }
}

ast_node!(MacroBody, MACRO_BODY);

impl MacroBody {
    /// Body items in order. Trivia and recovery leftovers are skipped.
    pub fn items(&self) -> impl Iterator<Item = BodyItem> + use<> {
        self.0.children_with_tokens().filter_map(|element| match element {
            rowan::NodeOrToken::Node(node) => BodyItem::from_node(node),
            rowan::NodeOrToken::Token(token) => BodyItem::from_token(&token),
        })
    }
}

/// One item of a macro body
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BodyItem {
    Opcode(SmolStr),
    Number(SmolStr),
    /// A label used as a value
    Jumpdest(SmolStr),
    /// `label:`
    Label(SmolStr),
    Call(MacroCall),
    /// `[CONSTANT]`
    Constant(SmolStr),
    /// `<parameter>`
    Parameter(SmolStr),
    Builtin(BuiltinFunction),
}

impl BodyItem {
    fn from_token(token: &SyntaxToken) -> Option<Self> {
        let text = SmolStr::new(token.text());
        if text.is_empty() {
            return None;
        }
        match token.kind() {
            SyntaxKind::OPCODE => Some(Self::Opcode(text)),
            SyntaxKind::NUMBER => Some(Self::Number(text)),
            _ => None,
        }
    }

    fn from_node(node: SyntaxNode) -> Option<Self> {
        let name = token_text(&node, SyntaxKind::IDENTIFIER);
        match node.kind() {
            SyntaxKind::JUMPDEST => name.map(Self::Jumpdest),
            SyntaxKind::JUMPDEST_LABEL => name.map(Self::Label),
            SyntaxKind::REFERENCED_CONSTANT => name.map(Self::Constant),
            SyntaxKind::REFERENCED_PARAMETER => name.map(Self::Parameter),
            SyntaxKind::MACRO_CALL => Some(Self::Call(MacroCall(node))),
            SyntaxKind::BUILTIN_FUNCTION => Some(Self::Builtin(BuiltinFunction(node))),
            _ => None,
        }
    }
}

ast_node!(MacroCall, MACRO_CALL);

impl MacroCall {
    pub fn name(&self) -> Option<SmolStr> {
        token_text(&self.0, SyntaxKind::IDENTIFIER)
    }

    pub fn args(&self) -> Vec<SmolStr> {
        tokens(&self.0)
            .skip_while(|token| token.kind() != SyntaxKind::L_PAREN)
            .filter(|token| matches!(token.kind(), SyntaxKind::IDENTIFIER | SyntaxKind::NUMBER))
            .filter(|token| !token.text().is_empty())
            .map(|token| SmolStr::new(token.text()))
            .collect()
    }
}

ast_node!(BuiltinFunction, BUILTIN_FUNCTION);

impl BuiltinFunction {
    /// `__FUNC_SIG`, `FREE_STORAGE_POINTER()`, ...
    pub fn name(&self) -> Option<SmolStr> {
        tokens(&self.0)
            .find(|token| {
                token.kind().is_keyword() || token.kind() == SyntaxKind::FREE_STORAGE_POINTER
            })
            .map(|token| SmolStr::new(token.text()))
    }

    /// The single argument, strings unquoted
    pub fn arg(&self) -> Option<SmolStr> {
        tokens(&self.0)
            .find(|token| {
                matches!(
                    token.kind(),
                    SyntaxKind::IDENTIFIER | SyntaxKind::NUMBER | SyntaxKind::STRING_LITERAL
                ) && !token.text().is_empty()
            })
            .map(|token| unquote(token.text()))
    }
}

// ============================================================================
// Constants and ABI declarations
// ============================================================================

ast_node!(Constant, CONSTANT);

impl Constant {
    pub fn name(&self) -> Option<SmolStr> {
        token_text(&self.0, SyntaxKind::IDENTIFIER)
    }

    /// The literal value, if the constant is a number
    pub fn value(&self) -> Option<SmolStr> {
        token_text(&self.0, SyntaxKind::NUMBER)
    }

    pub fn builtin(&self) -> Option<BuiltinFunction> {
        child(&self.0)
    }
}

ast_node!(Function, FUNCTION);

impl Function {
    pub fn name(&self) -> Option<SmolStr> {
        token_text(&self.0, SyntaxKind::IDENTIFIER)
    }

    pub fn inputs(&self) -> Option<ParameterList> {
        child(&self.0)
    }

    pub fn outputs(&self) -> Option<ParameterList> {
        self.0.children().filter_map(ParameterList::cast).nth(1)
    }

    /// `view`, `pure`, `payable` or `nonpayable`
    pub fn visibility(&self) -> Option<SmolStr> {
        self.0
            .children()
            .find(|node| node.kind() == SyntaxKind::VISIBILITY)
            .and_then(|node| tokens(&node).find(|token| token.kind().is_keyword()))
            .map(|token| SmolStr::new(token.text()))
    }
}

ast_node!(Event, EVENT);

impl Event {
    pub fn name(&self) -> Option<SmolStr> {
        token_text(&self.0, SyntaxKind::IDENTIFIER)
    }

    pub fn parameters(&self) -> Option<ParameterList> {
        child(&self.0)
    }
}

ast_node!(ErrorDef, ERROR_DEF);

impl ErrorDef {
    pub fn name(&self) -> Option<SmolStr> {
        token_text(&self.0, SyntaxKind::IDENTIFIER)
    }

    pub fn parameters(&self) -> Option<ParameterList> {
        child(&self.0)
    }
}

ast_node!(ParameterList, PARAMETER_LIST);

impl ParameterList {
    pub fn parameters(&self) -> impl Iterator<Item = Parameter> + use<> {
        self.0.children().filter_map(Parameter::cast)
    }
}

ast_node!(Parameter, PARAMETER);

impl Parameter {
    /// The type as written, including array dimensions
    pub fn ty(&self) -> Option<SmolStr> {
        let node = self.0.children().find(|node| node.kind() == SyntaxKind::TYPE)?;
        let text: String = tokens(&node)
            .filter(|token| !token.kind().is_trivia())
            .map(|token| token.text().to_string())
            .collect();
        (!text.is_empty()).then(|| SmolStr::new(text))
    }

    pub fn location(&self) -> Option<SmolStr> {
        self.0
            .children()
            .find(|node| node.kind() == SyntaxKind::LOCATION)
            .and_then(|node| tokens(&node).find(|token| token.kind().is_keyword()))
            .map(|token| SmolStr::new(token.text()))
    }

    pub fn name(&self) -> Option<SmolStr> {
        token_text(&self.0, SyntaxKind::IDENTIFIER)
    }
}
