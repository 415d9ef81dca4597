use nom::{
    branch::alt,
    bytes::complete::take_till,
    character::complete::{char, multispace1, satisfy},
    combinator::{cut, map, opt, recognize, value},
    multi::{many0, many0_count, many1},
    sequence::{delimited, pair, terminated},
    IResult,
};
use thiserror::Error;
use tracing::debug;

use super::expr::Expression;
use super::varset::{Variable, RENAME_MARKER};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected {found} at line {line}, column {column}")]
    Syntax {
        line: usize,
        column: usize,
        found: String,
    },
    #[error("program has no expression to evaluate")]
    Empty,
}

impl ParseError {
    fn at(src: &str, rest: &str) -> Self {
        let consumed = &src[..src.len() - rest.len()];
        let line = consumed.matches('\n').count() + 1;
        let column = consumed.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
        let found = match rest.lines().next() {
            Some(l) if !l.is_empty() => format!("`{l}`"),
            _ => String::from("end of input"),
        };

        ParseError::Syntax {
            line,
            column,
            found,
        }
    }
}

/// Parses a program: any number of `name = expr;` definitions followed by
/// the expression to evaluate.
///
/// Definitions are expanded into the final expression with capture-avoiding
/// substitution, latest first, so a definition may use the ones before it.
pub fn parse(src: &str) -> Result<Expression, ParseError> {
    let (defs, body) = match program(src) {
        Ok(("", (defs, Some(body)))) => (defs, body),
        Ok(("", (_, None))) => return Err(ParseError::Empty),
        Ok((rest, _)) => return Err(ParseError::at(src, rest)),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => {
            return Err(ParseError::at(src, e.input));
        }
        Err(nom::Err::Incomplete(_)) => return Err(ParseError::at(src, "")),
    };

    debug!(definitions = defs.len(), "parsed program");

    Ok(defs.iter().rev().fold(body, |body, (name, def)| {
        body.substitute(&Variable::from(*name), def)
    }))
}

fn is_ident_start(c: char) -> bool {
    (c.is_alphabetic() || c == '_') && c != 'λ'
}

fn is_ident_rest(c: char) -> bool {
    is_ident_start(c) || c.is_numeric() || c == '\'' || c == RENAME_MARKER
}

// whitespace and `#` line comments
fn ws(s: &str) -> IResult<&str, ()> {
    value(
        (),
        many0_count(alt((
            multispace1,
            recognize(pair(char('#'), take_till(|c: char| c == '\n'))),
        ))),
    )(s)
}

fn token<'a, O, P>(parser: P) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    P: FnMut(&'a str) -> IResult<&'a str, O>,
{
    terminated(parser, ws)
}

fn identifier(s: &str) -> IResult<&str, &str> {
    recognize(pair(satisfy(is_ident_start), many0_count(satisfy(is_ident_rest))))(s)
}

fn lambda(s: &str) -> IResult<&str, Expression> {
    let (s, _) = token(alt((char('λ'), char('\\'))))(s)?;
    let (s, params) = many1(token(identifier))(s)?;
    let (s, _) = token(char('.'))(s)?;
    let (s, body) = expr(s)?;

    // `λx y.b` is `λx.λy.b`
    let lam = params
        .into_iter()
        .rev()
        .fold(body, |body, x| Expression::lam(x, body));

    Ok((s, lam))
}

fn term(s: &str) -> IResult<&str, Expression> {
    alt((
        lambda,
        map(token(identifier), Expression::var),
        delimited(token(char('(')), expr, token(char(')'))),
    ))(s)
}

fn expr(s: &str) -> IResult<&str, Expression> {
    let (s, head) = term(s)?;
    let (s, args) = many0(term)(s)?;

    Ok((s, args.into_iter().fold(head, Expression::app)))
}

fn definition(s: &str) -> IResult<&str, (&str, Expression)> {
    let (s, name) = token(identifier)(s)?;
    let (s, _) = token(char('='))(s)?;
    let (s, body) = cut(terminated(expr, token(char(';'))))(s)?;

    Ok((s, (name, body)))
}

type Program<'a> = (Vec<(&'a str, Expression)>, Option<Expression>);

fn program(s: &str) -> IResult<&str, Program<'_>> {
    let (s, _) = ws(s)?;
    let (s, defs) = many0(definition)(s)?;
    let (s, body) = opt(terminated(expr, opt(token(char(';')))))(s)?;

    Ok((s, (defs, body)))
}
