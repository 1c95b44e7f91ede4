use std::rc::Rc;
use std::sync::LazyLock;

use pest::Parser;
use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};

use crate::ast::{BinaryOp, Expr, Lambda, Literal, UnaryOp};
use crate::error::EvalError;

#[derive(pest_derive::Parser)]
#[grammar = "grammar.pest"]
struct ExprParser;

static PRATT: LazyLock<PrattParser<Rule>> = LazyLock::new(|| {
    PrattParser::new()
        .op(Op::infix(Rule::nullish, Assoc::Left))
        .op(Op::infix(Rule::or, Assoc::Left))
        .op(Op::infix(Rule::and, Assoc::Left))
        .op(Op::infix(Rule::eq, Assoc::Left)
            | Op::infix(Rule::ne, Assoc::Left)
            | Op::infix(Rule::strict_eq, Assoc::Left)
            | Op::infix(Rule::strict_ne, Assoc::Left))
        .op(Op::infix(Rule::lt, Assoc::Left)
            | Op::infix(Rule::le, Assoc::Left)
            | Op::infix(Rule::gt, Assoc::Left)
            | Op::infix(Rule::ge, Assoc::Left))
        .op(Op::infix(Rule::add, Assoc::Left) | Op::infix(Rule::sub, Assoc::Left))
        .op(Op::infix(Rule::mul, Assoc::Left)
            | Op::infix(Rule::div, Assoc::Left)
            | Op::infix(Rule::rem, Assoc::Left))
        .op(Op::prefix(Rule::not) | Op::prefix(Rule::neg) | Op::prefix(Rule::pos))
        .op(Op::postfix(Rule::member) | Op::postfix(Rule::index) | Op::postfix(Rule::call))
});

/// Parse one expression into an AST.
pub fn parse(code: &str) -> Result<Expr, EvalError> {
    let syntax = |message: String| EvalError::Syntax {
        expression: code.to_string(),
        message,
    };
    let mut pairs = ExprParser::parse(Rule::program, code).map_err(|e| syntax(e.to_string()))?;
    let expr = pairs
        .next()
        .and_then(|program| program.into_inner().next())
        .ok_or_else(|| syntax("empty expression".to_string()))?;
    build_expr(expr).map_err(syntax)
}

fn build_expr(pair: Pair<'_, Rule>) -> Result<Expr, String> {
    match pair.as_rule() {
        Rule::expr => match pair.into_inner().next() {
            Some(inner) => build_expr(inner),
            None => Err("empty expression".to_string()),
        },
        Rule::lambda => {
            let mut inner = pair.into_inner();
            let params: Vec<String> = inner
                .next()
                .map(|p| p.into_inner().map(|i| i.as_str().to_string()).collect())
                .unwrap_or_default();
            let body = inner
                .next()
                .ok_or_else(|| "lambda without body".to_string())
                .and_then(build_expr)?;
            Ok(Expr::Lambda(Rc::new(Lambda { params, body })))
        }
        Rule::conditional => {
            let mut inner = pair.into_inner();
            let test = inner
                .next()
                .ok_or_else(|| "empty conditional".to_string())
                .and_then(build_expr)?;
            match (inner.next(), inner.next()) {
                (Some(then), Some(otherwise)) => Ok(Expr::Conditional {
                    test: Box::new(test),
                    then: Box::new(build_expr(then)?),
                    otherwise: Box::new(build_expr(otherwise)?),
                }),
                _ => Ok(test),
            }
        }
        Rule::binary => build_binary(pair.into_inner()),
        _ => build_primary(pair),
    }
}

fn build_binary(pairs: Pairs<'_, Rule>) -> Result<Expr, String> {
    PRATT
        .map_primary(|primary| build_primary(primary))
        .map_prefix(|op, rhs| {
            let op = match op.as_rule() {
                Rule::not => UnaryOp::Not,
                Rule::neg => UnaryOp::Neg,
                Rule::pos => UnaryOp::Plus,
                rule => return Err(format!("unexpected prefix operator {rule:?}")),
            };
            Ok(Expr::Unary {
                op,
                operand: Box::new(rhs?),
            })
        })
        .map_postfix(|lhs, op| {
            let object = Box::new(lhs?);
            match op.as_rule() {
                Rule::member => {
                    let property = op
                        .into_inner()
                        .next()
                        .map(|p| p.as_str().to_string())
                        .unwrap_or_default();
                    Ok(Expr::Member { object, property })
                }
                Rule::index => {
                    let index = op
                        .into_inner()
                        .next()
                        .ok_or_else(|| "empty index".to_string())
                        .and_then(build_expr)?;
                    Ok(Expr::Index {
                        object,
                        index: Box::new(index),
                    })
                }
                Rule::call => {
                    let args = op.into_inner().map(build_expr).collect::<Result<_, _>>()?;
                    Ok(Expr::Call {
                        callee: object,
                        args,
                    })
                }
                rule => Err(format!("unexpected postfix operator {rule:?}")),
            }
        })
        .map_infix(|lhs, op, rhs| {
            let op = match op.as_rule() {
                Rule::add => BinaryOp::Add,
                Rule::sub => BinaryOp::Sub,
                Rule::mul => BinaryOp::Mul,
                Rule::div => BinaryOp::Div,
                Rule::rem => BinaryOp::Rem,
                Rule::lt => BinaryOp::Lt,
                Rule::le => BinaryOp::Le,
                Rule::gt => BinaryOp::Gt,
                Rule::ge => BinaryOp::Ge,
                Rule::eq => BinaryOp::Eq,
                Rule::ne => BinaryOp::Ne,
                Rule::strict_eq => BinaryOp::StrictEq,
                Rule::strict_ne => BinaryOp::StrictNe,
                Rule::and => BinaryOp::And,
                Rule::or => BinaryOp::Or,
                Rule::nullish => BinaryOp::Nullish,
                rule => return Err(format!("unexpected operator {rule:?}")),
            };
            Ok(Expr::Binary {
                op,
                lhs: Box::new(lhs?),
                rhs: Box::new(rhs?),
            })
        })
        .parse(pairs)
}

fn build_primary(pair: Pair<'_, Rule>) -> Result<Expr, String> {
    let literal = |l: Literal| -> Result<Expr, String> { Ok(Expr::Literal(l)) };
    match pair.as_rule() {
        Rule::expr => build_expr(pair),
        Rule::number => pair
            .as_str()
            .parse::<f64>()
            .map(|n| Expr::Literal(Literal::Number(n)))
            .map_err(|e| format!("bad number `{}`: {e}", pair.as_str())),
        Rule::string => literal(Literal::String(string_contents(pair))),
        Rule::boolean => literal(Literal::Bool(pair.as_str() == "true")),
        Rule::null => literal(Literal::Null),
        Rule::undefined => literal(Literal::Undefined),
        Rule::ident => Ok(Expr::Ident(pair.as_str().to_string())),
        Rule::array => {
            let items = pair.into_inner().map(build_expr).collect::<Result<_, _>>()?;
            Ok(Expr::Array(items))
        }
        Rule::object => {
            let mut props = Vec::new();
            for prop in pair.into_inner() {
                let mut parts = prop.into_inner();
                let Some(key_pair) = parts.next() else {
                    continue;
                };
                let key = match key_pair.as_rule() {
                    Rule::string => string_contents(key_pair),
                    _ => key_pair.as_str().to_string(),
                };
                // `{ name }` shorthand reads the identifier of the same name
                let value = match parts.next() {
                    Some(v) => build_expr(v)?,
                    None => Expr::Ident(key.clone()),
                };
                props.push((key, value));
            }
            Ok(Expr::Object(props))
        }
        rule => Err(format!("unexpected {rule:?}")),
    }
}

fn string_contents(pair: Pair<'_, Rule>) -> String {
    pair.into_inner()
        .next()
        .map(|chars| unescape(chars.as_str()))
        .unwrap_or_default()
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
