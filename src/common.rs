use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};
use std::num::NonZeroU32;
use std::str::FromStr;
pub use vec1::vec1;

pub type Int = i64;
pub type UInt = u32;
pub type NonZeroUInt = NonZeroU32;

pub type Float = f64;

pub type NonEmpty<T> = vec1::Vec1<T>;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOperator {
    pub const ALL: &'static [Self] = &[Self::Add, Self::Sub, Self::Mul, Self::Div, Self::Pow];

    pub const fn as_char(&self) -> char {
        match self {
            Self::Add => '+',
            Self::Sub => '-',
            Self::Mul => '*',
            Self::Div => '/',
            Self::Pow => '^',
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char(self.as_char())
    }
}

impl FromStr for BinaryOperator {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mul,
            "/" => Self::Div,
            "^" => Self::Pow,
            _ => return Err(()),
        })
    }
}

/// Comparison used by conditionals. Alternate spellings (`=!`, `=>`, `=<`)
/// are folded into these six when lexed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    pub fn compare(&self, lhs: Int, rhs: Int) -> bool {
        match self {
            Self::Eq => lhs == rhs,
            Self::Ne => lhs != rhs,
            Self::Gt => lhs > rhs,
            Self::Ge => lhs >= rhs,
            Self::Lt => lhs < rhs,
            Self::Le => lhs <= rhs,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Conditional {
    pub operator: CompareOp,
    pub comparer: Int,
}

impl Conditional {
    pub const fn new(operator: CompareOp, comparer: Int) -> Self {
        Self { operator, comparer }
    }

    pub fn matches(&self, value: Int) -> bool {
        self.operator.compare(value, self.comparer)
    }
}

impl fmt::Display for Conditional {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator, self.comparer)
    }
}

/// How several conditionals attached to the same modifier combine.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Every conditional must hold.
    #[default]
    All,
    /// At least one conditional must hold.
    Any,
}

impl MatchPolicy {
    /// An empty list never matches; callers substitute their own default
    /// predicate before asking.
    pub fn check(&self, conditionals: &[Conditional], value: Int) -> bool {
        if conditionals.is_empty() {
            return false;
        }
        match self {
            Self::All => conditionals.iter().all(|c| c.matches(value)),
            Self::Any => conditionals.iter().any(|c| c.matches(value)),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Side {
    High,
    Low,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Self::High => 'h',
            Self::Low => 'l',
        };
        f.write_char(c)
    }
}
