//! Boolean expression parsing, evaluation and truth tables.
//!
//! Expressions accept mixed notation: `¬`/`NOT`/`!` for negation,
//! `∧`/`AND`/`&`/`.` for conjunction, `∨`/`OR`/`|`/`+` for disjunction and
//! `⊕`/`XOR`/`^`/`!=` for exclusive-or, with parentheses and the literals
//! `0`/`1`. Keywords are case-insensitive; variable names are matched exactly.
//!
//! Binding strength from tightest to loosest: `NOT`, `XOR`, `AND`, `OR`.
//! Nesting and tree height are both capped at [`MAX_EXPRESSION_DEPTH`].
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

/// Largest variable count accepted when enumerating a truth table.
pub const MAX_TABLE_VARIABLES: usize = 16;

/// Deepest nesting, and tallest expression tree, the parser accepts.
pub const MAX_EXPRESSION_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BooleanError {
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },
    #[error("unexpected token {token} at position {position}")]
    UnexpectedToken { token: String, position: usize },
    #[error("expression ended early")]
    UnexpectedEnd,
    #[error("missing closing parenthesis")]
    UnbalancedParenthesis,
    #[error("trailing input at position {0}")]
    TrailingInput(usize),
    #[error("variable {0} has no value")]
    UnboundVariable(String),
    #[error("{0} variables exceed the truth table limit")]
    TooManyVariables(usize),
    #[error("expression nests deeper than {0} levels")]
    TooDeep(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    And,
    Or,
    Xor,
}

impl BinaryOp {
    const fn precedence(self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::Xor => 3,
        }
    }

    const fn apply(self, lhs: bool, rhs: bool) -> bool {
        match self {
            Self::And => lhs && rhs,
            Self::Or => lhs || rhs,
            Self::Xor => lhs != rhs,
        }
    }
}

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Const(bool),
    Var(String),
    Not(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// Evaluate under `bindings`, a list of `(name, value)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`BooleanError::UnboundVariable`] for a name missing from `bindings`.
    pub fn eval(&self, bindings: &[(&str, bool)]) -> Result<bool, BooleanError> {
        match self {
            Self::Const(value) => Ok(*value),
            Self::Var(name) => bindings
                .iter()
                .find(|(bound, _)| *bound == name)
                .map(|(_, value)| *value)
                .ok_or_else(|| BooleanError::UnboundVariable(name.clone())),
            Self::Not(inner) => inner.eval(bindings).map(|value| !value),
            Self::Binary { op, lhs, rhs } => Ok(op.apply(lhs.eval(bindings)?, rhs.eval(bindings)?)),
        }
    }

    /// Variable names in order of first appearance.
    #[must_use]
    pub fn variables(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables(&self, names: &mut Vec<String>) {
        match self {
            Self::Const(_) => {}
            Self::Var(name) => {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
            Self::Not(inner) => inner.collect_variables(names),
            Self::Binary { lhs, rhs, .. } => {
                lhs.collect_variables(names);
                rhs.collect_variables(names);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Not,
    Op(BinaryOp),
    Open,
    Close,
    Const(bool),
    Ident(String),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Not => f.write_str("NOT"),
            Self::Op(BinaryOp::And) => f.write_str("AND"),
            Self::Op(BinaryOp::Or) => f.write_str("OR"),
            Self::Op(BinaryOp::Xor) => f.write_str("XOR"),
            Self::Open => f.write_str("("),
            Self::Close => f.write_str(")"),
            Self::Const(value) => write!(f, "{}", u8::from(*value)),
            Self::Ident(name) => f.write_str(name),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, BooleanError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();
    while let Some((offset, ch)) = chars.next() {
        let token = match ch {
            c if c.is_whitespace() => continue,
            '¬' => Token::Not,
            '!' => {
                if chars.next_if(|(_, next)| *next == '=').is_some() {
                    let _ = chars.next_if(|(_, next)| *next == '=');
                    Token::Op(BinaryOp::Xor)
                } else {
                    Token::Not
                }
            }
            '∧' | '.' => Token::Op(BinaryOp::And),
            '&' => {
                let _ = chars.next_if(|(_, next)| *next == '&');
                Token::Op(BinaryOp::And)
            }
            '∨' | '+' => Token::Op(BinaryOp::Or),
            '|' => {
                let _ = chars.next_if(|(_, next)| *next == '|');
                Token::Op(BinaryOp::Or)
            }
            '⊕' | '^' => Token::Op(BinaryOp::Xor),
            '(' => Token::Open,
            ')' => Token::Close,
            '0' => Token::Const(false),
            '1' => Token::Const(true),
            c if c.is_alphabetic() || c == '_' => {
                let mut word = String::from(c);
                while let Some((_, next)) =
                    chars.next_if(|(_, next)| next.is_alphanumeric() || *next == '_')
                {
                    word.push(next);
                }
                keyword(&word).unwrap_or(Token::Ident(word))
            }
            other => return Err(BooleanError::UnexpectedChar { ch: other, offset }),
        };
        tokens.push(token);
    }
    Ok(tokens)
}

fn keyword(word: &str) -> Option<Token> {
    match word.to_ascii_uppercase().as_str() {
        "NOT" => Some(Token::Not),
        "AND" => Some(Token::Op(BinaryOp::And)),
        "OR" => Some(Token::Op(BinaryOp::Or)),
        "XOR" => Some(Token::Op(BinaryOp::Xor)),
        _ => None,
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

/// A parsed subtree and its height.
type Parsed = (Expr, usize);

const fn bounded(height: usize) -> Result<usize, BooleanError> {
    if height > MAX_EXPRESSION_DEPTH {
        Err(BooleanError::TooDeep(MAX_EXPRESSION_DEPTH))
    } else {
        Ok(height)
    }
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn descend(&mut self) -> Result<(), BooleanError> {
        self.depth += 1;
        bounded(self.depth).map(|_| ())
    }

    fn expression(&mut self, min_precedence: u8) -> Result<Parsed, BooleanError> {
        let (mut lhs, mut height) = self.operand()?;
        while let Some(Token::Op(op)) = self.peek() {
            let op = *op;
            if op.precedence() < min_precedence {
                break;
            }
            self.pos += 1;
            let (rhs, rhs_height) = self.expression(op.precedence() + 1)?;
            height = bounded(height.max(rhs_height) + 1)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok((lhs, height))
    }

    fn operand(&mut self) -> Result<Parsed, BooleanError> {
        let position = self.pos;
        match self.bump() {
            Some(Token::Not) => {
                self.descend()?;
                let (inner, height) = self.operand()?;
                self.depth -= 1;
                Ok((Expr::Not(Box::new(inner)), bounded(height + 1)?))
            }
            Some(Token::Open) => {
                self.descend()?;
                let inner = self.expression(0)?;
                self.depth -= 1;
                match self.bump() {
                    Some(Token::Close) => Ok(inner),
                    _ => Err(BooleanError::UnbalancedParenthesis),
                }
            }
            Some(Token::Const(value)) => Ok((Expr::Const(value), 0)),
            Some(Token::Ident(name)) => Ok((Expr::Var(name), 0)),
            Some(token) => Err(BooleanError::UnexpectedToken {
                token: token.to_string(),
                position,
            }),
            None => Err(BooleanError::UnexpectedEnd),
        }
    }
}

/// Parse `input` into an expression tree.
///
/// # Errors
///
/// Returns a [`BooleanError`] for unknown characters, malformed structure,
/// unbalanced parentheses, input left over after a complete expression, or
/// nesting beyond [`MAX_EXPRESSION_DEPTH`].
pub fn parse(input: &str) -> Result<Expr, BooleanError> {
    let mut parser = Parser {
        tokens: tokenize(input)?,
        pos: 0,
        depth: 0,
    };
    let (expr, _) = parser.expression(0)?;
    if parser.pos < parser.tokens.len() {
        return Err(match parser.peek() {
            Some(Token::Close) => BooleanError::UnbalancedParenthesis,
            _ => BooleanError::TrailingInput(parser.pos),
        });
    }
    Ok(expr)
}

/// Parse and evaluate in one step.
///
/// # Errors
///
/// Propagates any parse or binding failure.
pub fn try_evaluate(expression: &str, bindings: &[(&str, bool)]) -> Result<bool, BooleanError> {
    parse(expression)?.eval(bindings)
}

/// Evaluate `expression`, treating any failure as `false`.
#[must_use]
pub fn evaluate(expression: &str, bindings: &[(&str, bool)]) -> bool {
    try_evaluate(expression, bindings).unwrap_or_else(|err| {
        log::warn!("boolean expression {expression:?} could not be evaluated: {err}");
        false
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruthRow {
    pub inputs: SmallVec<[bool; 4]>,
    pub output: bool,
}

/// Every assignment of the declared variables with its output.
///
/// Rows are ordered MSB-first: variable 0 is the highest bit of the row index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruthTable {
    pub variables: Vec<String>,
    pub rows: Vec<TruthRow>,
}

impl TruthTable {
    /// Output column as comma-joined `0`/`1` digits.
    #[must_use]
    pub fn column(&self) -> String {
        self.rows
            .iter()
            .map(|row| if row.output { "1" } else { "0" })
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Build the full truth table of `expression` over `variables`.
///
/// # Errors
///
/// Fails on parse errors, on a variable the expression uses but `variables`
/// does not declare, or when more than [`MAX_TABLE_VARIABLES`] are declared.
pub fn truth_table(expression: &str, variables: &[&str]) -> Result<TruthTable, BooleanError> {
    let count = variables.len();
    if count > MAX_TABLE_VARIABLES {
        return Err(BooleanError::TooManyVariables(count));
    }
    let expr = parse(expression)?;
    let mut rows = Vec::with_capacity(1 << count);
    for index in 0..(1_usize << count) {
        let inputs: SmallVec<[bool; 4]> = (0..count)
            .map(|bit| index & (1 << (count - 1 - bit)) != 0)
            .collect();
        let bindings: Vec<(&str, bool)> = variables
            .iter()
            .copied()
            .zip(inputs.iter().copied())
            .collect();
        let output = expr.eval(&bindings)?;
        rows.push(TruthRow { inputs, output });
    }
    Ok(TruthTable {
        variables: variables.iter().map(ToString::to_string).collect(),
        rows,
    })
}

/// Output column of `expression`; a failing expression yields an all-zero column.
#[must_use]
pub fn truth_column(expression: &str, variables: &[&str]) -> String {
    truth_table(expression, variables)
        .map(|table| table.column())
        .unwrap_or_else(|err| {
            log::warn!("truth table for {expression:?} could not be built: {err}");
            let rows = 1_usize << variables.len().min(MAX_TABLE_VARIABLES);
            vec!["0"; rows].join(",")
        })
}

/// Elementary logic gates over any number of inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicGate {
    And,
    Or,
    Not,
    Xor,
    Nand,
    Nor,
}

impl LogicGate {
    pub const ALL: &'static [Self] = &[
        Self::And,
        Self::Or,
        Self::Not,
        Self::Xor,
        Self::Nand,
        Self::Nor,
    ];

    /// `NOT` reads only the first input; `XOR` is odd parity.
    #[must_use]
    pub fn output(self, inputs: &[bool]) -> bool {
        match self {
            Self::And => inputs.iter().all(|v| *v),
            Self::Or => inputs.iter().any(|v| *v),
            Self::Not => !inputs.first().copied().unwrap_or(false),
            Self::Xor => inputs.iter().filter(|v| **v).count() % 2 == 1,
            Self::Nand => !inputs.iter().all(|v| *v),
            Self::Nor => !inputs.iter().any(|v| *v),
        }
    }

    /// IEC symbol drawn inside the gate box.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::And | Self::Nand => "&",
            Self::Or | Self::Nor => "≥1",
            Self::Not => "1",
            Self::Xor => "=1",
        }
    }

    #[must_use]
    pub const fn is_inverted(self) -> bool {
        matches!(self, Self::Not | Self::Nand | Self::Nor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::TRUTH_TABLE_TEMPLATES;

    #[test]
    fn mixed_notation_evaluates() {
        let ab = [("A", true), ("B", false)];
        assert!(evaluate("A OR B", &ab));
        assert!(evaluate("A ∨ B", &ab));
        assert!(evaluate("A + B", &ab));
        assert!(evaluate("A || B", &ab));
        assert!(!evaluate("A AND B", &ab));
        assert!(!evaluate("A.B", &ab));
        assert!(!evaluate("A && B", &ab));
        assert!(!evaluate("A ∧ B", &ab));
        assert!(evaluate("A ⊕ B", &ab));
        assert!(evaluate("a xor b", &[("a", true), ("b", false)]));
        assert!(evaluate("¬B", &ab));
        assert!(evaluate("!B", &ab));
        assert!(evaluate("not(B)", &ab));
        assert!(evaluate("A !== B", &ab));
        assert!(!evaluate("A != A", &ab));
        assert!(evaluate("A ^ B", &ab));
        assert!(evaluate("!!A", &ab));
    }

    #[test]
    fn precedence_binds_not_then_xor_then_and_then_or() {
        // OR is loosest: 1 OR (0 AND 0)
        assert!(try_evaluate("1 + 0 . 0", &[]).unwrap());
        // XOR above AND: 1 AND (0 XOR 1)
        assert!(try_evaluate("1 . 0 XOR 1", &[]).unwrap());
        // NOT binds to the operand only: (NOT 1) OR 1
        assert!(try_evaluate("NOT 1 OR 1", &[]).unwrap());
        assert!(!try_evaluate("NOT (1 OR 1)", &[]).unwrap());
        // left associative chains
        assert!(!try_evaluate("1 XOR 1 XOR 0", &[]).unwrap());
    }

    #[test]
    fn parse_builds_expected_tree() {
        let expr = parse("A + NOT(A)").unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::Or,
                lhs: Box::new(Expr::Var("A".into())),
                rhs: Box::new(Expr::Not(Box::new(Expr::Var("A".into())))),
            }
        );
        assert_eq!(parse("B.(A + B) + C").unwrap().variables(), vec!["B", "A", "C"]);
    }

    #[test]
    fn failures_are_reported_and_default_false() {
        assert_eq!(
            parse("A $ B"),
            Err(BooleanError::UnexpectedChar { ch: '$', offset: 2 })
        );
        assert_eq!(parse("(A AND B"), Err(BooleanError::UnbalancedParenthesis));
        assert_eq!(parse("A AND B)"), Err(BooleanError::UnbalancedParenthesis));
        assert_eq!(parse("A AND"), Err(BooleanError::UnexpectedEnd));
        assert_eq!(parse("A B"), Err(BooleanError::TrailingInput(1)));
        assert!(matches!(
            parse("AND A"),
            Err(BooleanError::UnexpectedToken { position: 0, .. })
        ));
        assert_eq!(
            try_evaluate("A AND C", &[("A", true)]),
            Err(BooleanError::UnboundVariable("C".into()))
        );
        assert!(!evaluate("A AND C", &[("A", true)]));
        assert!(!evaluate("", &[]));
        assert!(!evaluate("2", &[]));
    }

    #[test]
    fn truth_table_rows_are_msb_first() {
        let table = truth_table("A AND NOT B", &["A", "B"]).unwrap();
        let inputs: Vec<Vec<bool>> = table.rows.iter().map(|r| r.inputs.to_vec()).collect();
        assert_eq!(
            inputs,
            vec![
                vec![false, false],
                vec![false, true],
                vec![true, false],
                vec![true, true]
            ]
        );
        assert_eq!(table.column(), "0,0,1,0");
        assert_eq!(truth_table("1", &[]).unwrap().column(), "1");
    }

    #[test]
    fn truth_column_fails_safe() {
        assert_eq!(truth_column("A OR", &["A", "B"]), "0,0,0,0");
        assert_eq!(truth_column("A OR C", &["A", "B"]), "0,0,0,0");
        assert!(matches!(
            truth_table("A", &["A"; 17]),
            Err(BooleanError::TooManyVariables(17))
        ));
    }

    #[test]
    fn generator_literals_agree_with_evaluator() {
        for (expression, column) in TRUTH_TABLE_TEMPLATES {
            let variables: &[&str] = if expression.contains('B') {
                &["A", "B"]
            } else {
                &["A"]
            };
            assert_eq!(truth_column(expression, variables), column, "{expression}");
        }
    }

    #[test]
    fn simplification_identities_hold() {
        for (expression, simplified) in crate::generator::SIMPLIFY_TEMPLATES {
            let lhs = truth_column(expression, &["A", "B"]);
            let rhs = truth_column(simplified, &["A", "B"]);
            assert_eq!(lhs, rhs, "{expression} = {simplified}");
        }
    }

    #[test]
    fn gates_follow_their_tables() {
        let tt = [true, true];
        let tf = [true, false];
        let ff = [false, false];
        assert!(LogicGate::And.output(&tt));
        assert!(!LogicGate::And.output(&tf));
        assert!(LogicGate::Or.output(&tf));
        assert!(!LogicGate::Or.output(&ff));
        assert!(LogicGate::Not.output(&[false]));
        assert!(LogicGate::Not.output(&[]));
        assert!(LogicGate::Xor.output(&tf));
        assert!(LogicGate::Xor.output(&[true, true, true]));
        assert!(!LogicGate::Nand.output(&tt));
        assert!(LogicGate::Nor.output(&ff));
        assert_eq!(LogicGate::Xor.symbol(), "=1");
        assert!(LogicGate::Nand.is_inverted());
        assert_eq!(serde_json::to_string(&LogicGate::Nand).unwrap(), "\"NAND\"");
    }

    #[test]
    fn deep_nesting_is_rejected_without_overflow() {
        let too_deep = Err(BooleanError::TooDeep(MAX_EXPRESSION_DEPTH));
        let a = [("A", true)];

        let keywords = format!("{}A", "NOT ".repeat(10_000));
        assert_eq!(try_evaluate(&keywords, &a), too_deep);
        assert!(!evaluate(&keywords, &a));

        let bangs = format!("{}A", "!".repeat(200_000));
        assert_eq!(try_evaluate(&bangs, &a), too_deep);

        let parens = format!("{}A{}", "(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(try_evaluate(&parens, &a), too_deep);
        assert!(!evaluate(&parens, &a));

        let unclosed = "(".repeat(200_000);
        assert_eq!(
            parse(&unclosed).err(),
            Some(BooleanError::TooDeep(MAX_EXPRESSION_DEPTH))
        );
    }

    #[test]
    fn long_operator_chains_are_bounded() {
        let chain = format!("{}A", "A + ".repeat(10_000));
        assert_eq!(
            try_evaluate(&chain, &[("A", false)]),
            Err(BooleanError::TooDeep(MAX_EXPRESSION_DEPTH))
        );
        let short = format!("{}A", "A + ".repeat(MAX_EXPRESSION_DEPTH - 1));
        assert_eq!(try_evaluate(&short, &[("A", false)]), Ok(false));
    }

    #[test]
    fn moderate_nesting_still_evaluates() {
        let a = [("A", true)];
        assert!(evaluate(&format!("{}A", "NOT ".repeat(100)), &a));
        assert!(!evaluate(&format!("{}A", "!".repeat(MAX_EXPRESSION_DEPTH - 1)), &a));
        let parens = format!("{}A{}", "(".repeat(200), ")".repeat(200));
        assert!(evaluate(&parens, &a));
    }
}
