use super::{ast::*, error::*};
use crate::common::*;
use crate::lex::{Lexeme, LexemeKind};
use crate::roll::{self, Modifier, Number};
use std::collections::HashMap;

type PResult<T = Node> = Result<T, ParseError>;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Associativity {
    Left,
    Right,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct OperatorInfo {
    pub precedence: u8,
    pub associativity: Associativity,
}

/// Binding strength of each binary operator. Operators missing from the
/// table are rejected by the parser.
#[derive(Debug, Clone, PartialEq)]
pub struct PrecedenceTable {
    operators: HashMap<BinaryOperator, OperatorInfo>,
}

impl PrecedenceTable {
    pub fn new() -> Self {
        Self {
            operators: HashMap::new(),
        }
    }

    pub fn with(mut self, op: BinaryOperator, precedence: u8, associativity: Associativity) -> Self {
        self.operators.insert(
            op,
            OperatorInfo {
                precedence,
                associativity,
            },
        );
        self
    }

    pub fn get(&self, op: BinaryOperator) -> Option<OperatorInfo> {
        self.operators.get(&op).copied()
    }

    /// Unary minus binds at this level, so `-2^2` is `-(2^2)`.
    fn max_precedence(&self) -> u8 {
        self.operators
            .values()
            .map(|info| info.precedence)
            .max()
            .unwrap_or(0)
    }
}

impl Default for PrecedenceTable {
    fn default() -> Self {
        use Associativity::*;
        use BinaryOperator::*;

        Self::new()
            .with(Add, 1, Left)
            .with(Sub, 1, Left)
            .with(Mul, 2, Left)
            .with(Div, 2, Left)
            .with(Pow, 3, Right)
    }
}

pub struct Parser<'a> {
    lexemes: &'a [Lexeme],
    pos: usize,
    precedence: &'a PrecedenceTable,
    notation: String,
}

impl<'a> Parser<'a> {
    pub fn new(lexemes: &'a [Lexeme], precedence: &'a PrecedenceTable) -> Self {
        Self {
            lexemes,
            pos: 0,
            precedence,
            notation: lexemes.iter().map(|l| l.original.as_str()).collect(),
        }
    }

    pub fn with_notation(mut self, notation: impl Into<String>) -> Self {
        self.notation = notation.into();
        self
    }

    pub fn parse(mut self) -> PResult<Expression> {
        if self.lexemes.is_empty() {
            return Err(self.error_at_end(ParseErrorKind::Empty));
        }

        let root = self.parse_expression(0)?;
        if let Some(lexeme) = self.peek() {
            let kind = match lexeme.kind {
                LexemeKind::Math if lexeme.data == ")" => ParseErrorKind::UnbalancedParenthesis,
                kind => ParseErrorKind::UnexpectedLexeme(kind),
            };
            return Err(self.error_at(lexeme, kind));
        }

        log::debug!("parsed {:?} as {}", self.notation, root);
        Ok(Expression::new(root, self.notation))
    }

    fn peek(&self) -> Option<&'a Lexeme> {
        self.lexemes.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'a Lexeme> {
        let ret = self.peek();
        self.pos += 1;
        ret
    }

    fn error_at(&self, lexeme: &Lexeme, kind: ParseErrorKind) -> ParseError {
        ParseError {
            kind,
            span: lexeme.span.clone(),
            slice: lexeme.original.clone(),
            notation: self.notation.clone(),
        }
    }

    fn error_at_end(&self, kind: ParseErrorKind) -> ParseError {
        let end = self.lexemes.last().map_or(0, |l| l.span.end);
        ParseError {
            kind,
            span: end..end,
            slice: String::new(),
            notation: self.notation.clone(),
        }
    }

    /// The binary operator at the cursor, if any.
    fn peek_operator(&self) -> PResult<Option<(BinaryOperator, OperatorInfo)>> {
        let lexeme = match self.peek() {
            Some(lexeme) => lexeme,
            None => return Ok(None),
        };
        if lexeme.kind.is_modifier() {
            return Err(self.error_at(lexeme, ParseErrorKind::ModifierWithoutDice(lexeme.kind)));
        }
        if lexeme.kind != LexemeKind::Math {
            return Ok(None);
        }
        let op = match lexeme.data.parse::<BinaryOperator>() {
            Ok(op) => op,
            Err(()) => return Ok(None),
        };
        match self.precedence.get(op) {
            Some(info) => Ok(Some((op, info))),
            None => Err(self.error_at(
                lexeme,
                ParseErrorKind::UnknownOperator(lexeme.data.clone()),
            )),
        }
    }

    fn parse_expression(&mut self, min_precedence: u8) -> PResult {
        let mut lhs = self.parse_operand()?;

        while let Some((op, info)) = self.peek_operator()? {
            if info.precedence < min_precedence {
                break;
            }
            self.advance();

            let next_min = match info.associativity {
                Associativity::Left => info.precedence + 1,
                Associativity::Right => info.precedence,
            };
            let rhs = self.parse_expression(next_min)?;
            lhs = Node::Binary(Box::new(lhs), op, Box::new(rhs));
        }

        Ok(lhs)
    }

    fn parse_operand(&mut self) -> PResult {
        let lexeme = match self.advance() {
            Some(lexeme) => lexeme,
            None => return Err(self.error_at_end(ParseErrorKind::UnexpectedEnd)),
        };

        match lexeme.kind {
            LexemeKind::Math => match lexeme.data.as_str() {
                "(" => {
                    let inner = self.parse_expression(0)?;
                    match self.advance() {
                        Some(close) if close.kind == LexemeKind::Math && close.data == ")" => {
                            Ok(Node::Grouping(Box::new(inner)))
                        }
                        _ => Err(self.error_at(lexeme, ParseErrorKind::UnbalancedParenthesis)),
                    }
                }
                ")" => Err(self.error_at(lexeme, ParseErrorKind::UnbalancedParenthesis)),
                "-" => {
                    let inner = self.parse_expression(self.precedence.max_precedence())?;
                    Ok(Node::Negate(Box::new(inner)))
                }
                _ => Err(self.error_at(lexeme, ParseErrorKind::UnexpectedLexeme(lexeme.kind))),
            },
            LexemeKind::Dice => self.parse_dice(lexeme),
            LexemeKind::Stunt => Ok(Node::Stunt(StuntDie {
                notation: lexeme.original.clone(),
            })),
            kind if kind.is_modifier() => {
                Err(self.error_at(lexeme, ParseErrorKind::ModifierWithoutDice(kind)))
            }
            kind => Err(self.error_at(lexeme, ParseErrorKind::UnexpectedReference(kind))),
        }
    }

    fn parse_dice(&mut self, lexeme: &Lexeme) -> PResult {
        let (count, faces) = match lexeme.data.split_once('d') {
            Some(parts) => parts,
            None => return self.parse_literal(lexeme),
        };

        let count = count.parse::<UInt>().ok();
        let faces = faces.parse::<UInt>().ok().and_then(NonZeroUInt::new);
        let mut group = match (count, faces) {
            (Some(count), Some(faces)) => DiceGroup::new(count, faces, lexeme.original.clone()),
            _ => return Err(self.error_at(lexeme, ParseErrorKind::InvalidDice)),
        };
        group.conditionals = lexeme.conditionals().to_vec();

        while let Some(next) = self.peek().filter(|l| l.kind.is_modifier()) {
            group.modifiers.push(self.modifier(next)?);
            group.notation.push_str(&next.original);
            self.advance();
        }

        Ok(Node::Dice(group))
    }

    fn parse_literal(&self, lexeme: &Lexeme) -> PResult {
        let value: Number = match lexeme.data.parse::<Int>() {
            Ok(x) => x.into(),
            Err(_) => match lexeme.data.parse::<Float>() {
                Ok(x) if x.is_finite() => x.into(),
                _ => return Err(self.error_at(lexeme, ParseErrorKind::InvalidDice)),
            },
        };
        Ok(Node::Literal(value))
    }

    fn modifier(&self, lexeme: &Lexeme) -> PResult<Modifier> {
        let n = lexeme
            .data
            .parse::<UInt>()
            .map_err(|_| self.error_at(lexeme, ParseErrorKind::InvalidModifier))?;
        let conditionals = lexeme.conditionals().to_vec();

        Ok(match lexeme.kind {
            LexemeKind::KeepHigh => roll::Keep::new(Side::High, n).into(),
            LexemeKind::KeepLow => roll::Keep::new(Side::Low, n).into(),
            LexemeKind::DropHigh => roll::Drop::new(Side::High, n).into(),
            LexemeKind::DropLow => roll::Drop::new(Side::Low, n).into(),
            LexemeKind::Reroll => roll::Reroll::new(n, conditionals).into(),
            LexemeKind::Explode => roll::Explode::new(n, conditionals).into(),
            LexemeKind::ExplodeCombine => roll::ExplodeCombine::new(n, conditionals).into(),
            kind => return Err(self.error_at(lexeme, ParseErrorKind::UnexpectedLexeme(kind))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lex::{tokenize, LexContext};
    use crate::settings::Settings;

    fn parse_with(s: &str, table: &PrecedenceTable) -> PResult<Expression> {
        let settings = Settings::default();
        let lexemes = tokenize(s, &LexContext::new(&settings)).unwrap();
        Parser::new(&lexemes, table).with_notation(s).parse()
    }

    fn check(s: &str, expected: &str) {
        let expr = parse_with(s, &PrecedenceTable::default()).unwrap();
        assert_eq!(expr.root.to_string(), expected, "{}", s);
    }

    fn check_err(s: &str, expected: ParseErrorKind) {
        let err = parse_with(s, &PrecedenceTable::default()).unwrap_err();
        assert_eq!(err.kind, expected, "{}", s);
    }

    #[test]
    fn test_parse_precedence() {
        check("1+2*3^2", "[1 + [2 * [3 ^ 2]]]");
        check("2^3^2", "[2 ^ [3 ^ 2]]");
        check("10-4-3", "[[10 - 4] - 3]");
        check("8/4*2", "[[8 / 4] * 2]");
    }

    #[test]
    fn test_parse_grouping_and_negation() {
        check("(1+2)*3", "[([1 + 2]) * 3]");
        check("-2^2", "-[2 ^ 2]");
        check("--3", "--3");
        check("2*-1d4", "[2 * -1d4]");
    }

    #[test]
    fn test_parse_dice_groups() {
        check("4d6kh3", "4d6kh3");
        check("5d10>=8", "5d10>=8");
        check("2d6r<3!2", "2d6r<3!2");

        let expr = parse_with("d20kh1 + 3", &PrecedenceTable::default()).unwrap();
        let groups = expr.groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].count, 1);
        assert_eq!(groups[0].faces.get(), 20);
        assert_eq!(groups[0].notation, "d20kh1");
        assert_eq!(expr.notation, "d20kh1 + 3");
    }

    #[test]
    fn test_parse_literals() {
        check("0d6", "0d6");
        check("3", "3");
    }

    #[test]
    fn test_custom_precedence() {
        use BinaryOperator::*;
        let table = PrecedenceTable::new()
            .with(Add, 2, Associativity::Left)
            .with(Mul, 1, Associativity::Left);
        let expr = parse_with("1+2*3", &table).unwrap();
        assert_eq!(expr.root.to_string(), "[[1 + 2] * 3]");

        let err = parse_with("2^3", &table).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnknownOperator("^".to_string()));
    }

    #[test]
    fn test_parse_errors() {
        use LexemeKind::*;
        check_err("", ParseErrorKind::Empty);
        check_err("1+", ParseErrorKind::UnexpectedEnd);
        check_err("(1+2", ParseErrorKind::UnbalancedParenthesis);
        check_err("1+2)", ParseErrorKind::UnbalancedParenthesis);
        check_err("kh1", ParseErrorKind::ModifierWithoutDice(KeepHigh));
        check_err("(1d6)kh1", ParseErrorKind::ModifierWithoutDice(KeepHigh));
        check_err("3!", ParseErrorKind::ModifierWithoutDice(Explode));
        check_err("1+[[Note]]", ParseErrorKind::UnexpectedReference(Section));
        check_err("2 3", ParseErrorKind::UnexpectedLexeme(Dice));
        check_err("*2", ParseErrorKind::UnexpectedLexeme(Math));
        check_err("1d0", ParseErrorKind::InvalidDice);
    }

    #[test]
    fn test_error_location() {
        let err = parse_with("1 + kh2", &PrecedenceTable::default()).unwrap_err();
        assert_eq!(err.span, 4..7);
        assert_eq!(err.slice, "kh2");
        assert_eq!(err.notation, "1 + kh2");
    }
}
