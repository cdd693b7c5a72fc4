//! Text front end: parses polynomial expressions such as `0.25*I*x^2*y - y`.

use crate::error::{NormalFormError, Result};
use crate::polynomial::{Coefficient, Polynomial, Variables};
use crate::vector_field::VectorField;

/// Largest total degree an expanded expression may reach.
pub const MAX_DEGREE: u32 = 1024;

/// Abstract syntax tree of a parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable(String),
    Binary(Box<Expr>, char, Box<Expr>),
    Neg(Box<Expr>),
    Call(String, Box<Expr>),
}

impl Expr {
    /// Expands the tree into a polynomial in `vars`.
    pub fn to_polynomial(&self, vars: &Variables) -> Result<Polynomial> {
        let nvars = vars.len();
        match self {
            Expr::Number(n) => Ok(Polynomial::constant(nvars, Coefficient::from(*n))),
            Expr::Variable(name) => match vars.index_of(name) {
                Some(k) => Ok(Polynomial::variable(nvars, k)),
                // `I` is the imaginary unit unless declared as a variable.
                None if name == "I" => Ok(Polynomial::constant(nvars, Coefficient::i())),
                None => Err(NormalFormError::Parse(format!("unknown identifier `{}`", name))),
            },
            Expr::Neg(inner) => Ok(-&inner.to_polynomial(vars)?),
            Expr::Call(name, _) => Err(NormalFormError::Parse(format!(
                "function `{}` is not polynomial",
                name
            ))),
            Expr::Binary(left, op, right) => {
                let lhs = left.to_polynomial(vars)?;
                let rhs = right.to_polynomial(vars)?;
                match op {
                    '+' => Ok(&lhs + &rhs),
                    '-' => Ok(&lhs - &rhs),
                    '*' => {
                        ensure_degree(degree_of(&lhs) + degree_of(&rhs))?;
                        Ok(&lhs * &rhs)
                    }
                    '/' => {
                        let divisor = rhs.as_constant().ok_or_else(|| {
                            NormalFormError::Parse("division by a non-constant".to_string())
                        })?;
                        if divisor.norm() == 0.0 {
                            return Err(NormalFormError::Parse("division by zero".to_string()));
                        }
                        Ok(lhs.scale(divisor.inv()))
                    }
                    '^' => {
                        let exponent = exponent_of(&rhs)?;
                        ensure_degree(degree_of(&lhs) * exponent)?;
                        Ok(lhs.pow(exponent))
                    }
                    other => Err(NormalFormError::Parse(format!("unknown operator `{}`", other))),
                }
            }
        }
    }
}

fn exponent_of(rhs: &Polynomial) -> Result<u32> {
    let value = rhs
        .as_constant()
        .ok_or_else(|| NormalFormError::Parse("exponent must be a constant".to_string()))?;
    let re = value.re;
    if value.im != 0.0 || re < 0.0 || re.fract() != 0.0 {
        return Err(NormalFormError::Parse(format!(
            "exponent {} is not a non-negative integer",
            value
        )));
    }
    if re > f64::from(MAX_DEGREE) {
        return Err(NormalFormError::Parse(format!(
            "exponent {} exceeds the maximum degree {}",
            re, MAX_DEGREE
        )));
    }
    Ok(re as u32)
}

// Operands are already bounded by `MAX_DEGREE`, so sums and products of
// two degrees fit in a `u32`.
fn degree_of(p: &Polynomial) -> u32 {
    p.degree().unwrap_or(0)
}

fn ensure_degree(degree: u32) -> Result<()> {
    if degree > MAX_DEGREE {
        return Err(NormalFormError::Parse(format!(
            "expanded degree {} exceeds the maximum degree {}",
            degree, MAX_DEGREE
        )));
    }
    Ok(())
}

/// Parses a string expression into an AST.
pub fn parse(input: &str) -> Result<Expr> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expression()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(NormalFormError::Parse(format!(
            "unexpected token {:?} in `{}`",
            token, input
        ))),
    }
}

pub fn parse_polynomial(input: &str, vars: &Variables) -> Result<Polynomial> {
    parse(input)?.to_polynomial(vars)
}

/// Parses one expression per component.
pub fn parse_vector_field<S: AsRef<str>>(equations: &[S], vars: &Variables) -> Result<VectorField> {
    let components = equations
        .iter()
        .map(|eq| parse_polynomial(eq.as_ref(), vars))
        .collect::<Result<Vec<_>>>()?;
    VectorField::new(vars.len(), components)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Identifier(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_ascii_digit() || c == '.' {
            let mut num_str = String::new();
            while let Some(&d) = chars.peek() {
                if d.is_ascii_digit() || d == '.' {
                    num_str.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            let value = num_str
                .parse()
                .map_err(|_| NormalFormError::Parse(format!("malformed number `{}`", num_str)))?;
            tokens.push(Token::Number(value));
        } else if c.is_alphabetic() || c == '_' {
            let mut ident = String::new();
            while let Some(&d) = chars.peek() {
                if d.is_alphanumeric() || d == '_' {
                    ident.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Identifier(ident));
        } else {
            let token = match c {
                '+' => Token::Plus,
                '-' => Token::Minus,
                '*' => Token::Star,
                '/' => Token::Slash,
                '^' => Token::Caret,
                '(' => Token::LParen,
                ')' => Token::RParen,
                other => {
                    return Err(NormalFormError::Parse(format!(
                        "unexpected character `{}`",
                        other
                    )))
                }
            };
            tokens.push(token);
            chars.next();
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn consume(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect_rparen(&mut self) -> Result<()> {
        match self.consume() {
            Some(Token::RParen) => Ok(()),
            _ => Err(NormalFormError::Parse("expected ')'".to_string())),
        }
    }

    fn parse_expression(&mut self) -> Result<Expr> {
        let mut left = self.parse_factor()?;

        loop {
            let op = match self.peek() {
                Some(Token::Plus) => '+',
                Some(Token::Minus) => '-',
                _ => break,
            };
            self.consume();
            let right = self.parse_factor()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.peek() {
                Some(Token::Star) => '*',
                Some(Token::Slash) => '/',
                _ => break,
            };
            self.consume();
            let right = self.parse_unary()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    // Unary minus binds looser than `^`, so `-x^2` is `-(x^2)`.
    fn parse_unary(&mut self) -> Result<Expr> {
        if let Some(Token::Minus) = self.peek() {
            self.consume();
            let expr = self.parse_unary()?;
            return Ok(Expr::Neg(Box::new(expr)));
        }
        if let Some(Token::Plus) = self.peek() {
            self.consume();
            return self.parse_unary();
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<Expr> {
        let base = self.parse_primary()?;
        if let Some(Token::Caret) = self.peek() {
            self.consume();
            // right-associative
            let exponent = self.parse_unary()?;
            return Ok(Expr::Binary(Box::new(base), '^', Box::new(exponent)));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.consume() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Identifier(name)) => {
                if let Some(Token::LParen) = self.peek() {
                    self.consume();
                    let arg = self.parse_expression()?;
                    self.expect_rparen()?;
                    Ok(Expr::Call(name, Box::new(arg)))
                } else {
                    Ok(Expr::Variable(name))
                }
            }
            Some(Token::LParen) => {
                let expr = self.parse_expression()?;
                self.expect_rparen()?;
                Ok(expr)
            }
            Some(token) => Err(NormalFormError::Parse(format!("unexpected token {:?}", token))),
            None => Err(NormalFormError::Parse("unexpected end of input".to_string())),
        }
    }
}
