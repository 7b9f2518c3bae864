//! Lexical identity of traced arguments.

use std::fmt;

use crate::Name;

/// How a parameter accepts its argument.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ParamKind {
    PositionalOnly,
    PositionalOrKeyword,
    /// `*args`
    VarPositional,
    KeywordOnly,
    /// `**kwargs`
    VarKeyword,
}

impl ParamKind {
    /// Whether an argument of this kind can be supplied by position.
    pub const fn accepts_positional(self) -> bool {
        matches!(self, ParamKind::PositionalOnly | ParamKind::PositionalOrKeyword)
    }

    /// Whether an argument of this kind can be supplied by keyword.
    pub const fn accepts_keyword(self) -> bool {
        matches!(self, ParamKind::PositionalOrKeyword | ParamKind::KeywordOnly)
    }
}

/// Identifies an argument within a call: parameter name plus kind.
///
/// Two arguments with the same name but different kinds are different
/// bindings.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ArgTag {
    pub name: Name,
    pub kind: ParamKind,
}

impl ArgTag {
    pub const fn new(name: Name, kind: ParamKind) -> Self {
        ArgTag { name, kind }
    }

    /// A positional-or-keyword parameter, the common case.
    pub fn positional(name: &str) -> Self {
        ArgTag::new(Name::intern(name), ParamKind::PositionalOrKeyword)
    }

    pub fn keyword_only(name: &str) -> Self {
        ArgTag::new(Name::intern(name), ParamKind::KeywordOnly)
    }
}

impl fmt::Display for ArgTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ParamKind::VarPositional => write!(f, "*{}", self.name),
            ParamKind::VarKeyword => write!(f, "**{}", self.name),
            _ => write!(f, "{}", self.name),
        }
    }
}
