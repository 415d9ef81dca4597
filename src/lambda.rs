use std::io;

use thiserror::Error;
use tracing::debug;

use evaluator::{OutOfSteps, StepLimit};
use expr::Expression;
use parser_lc::ParseError;

pub mod evaluator;
pub mod expr;
pub mod parser_lc;
pub mod varset;

#[derive(Debug, Clone, Copy, Default)]
pub struct Options<'a> {
    /// Evaluate under a [`StepLimit`] instead of running unbounded.
    pub max_steps: Option<usize>,
    pub parse_only: bool,
    /// A term the result must be alpha-equivalent to.
    pub expect: Option<&'a str>,
}

#[derive(Error, Debug)]
pub enum RunError {
    #[error("failed parsing input: {0}")]
    Parse(#[from] ParseError),
    #[error("failed parsing expected term: {0}")]
    Expected(#[source] ParseError),
    #[error(transparent)]
    OutOfSteps(#[from] OutOfSteps),
    #[error("io error: {0}")]
    IO(#[from] io::Error),
    #[error("got {actual}, which is not alpha-equivalent to {expected}")]
    Unexpected {
        actual: Expression,
        expected: Expression,
    },
}

pub fn run(prog: &str, options: Options) -> Result<Expression, RunError> {
    let expected = options
        .expect
        .map(parser_lc::parse)
        .transpose()
        .map_err(RunError::Expected)?;

    let expr = parser_lc::parse(prog)?;
    debug!(%expr, "definitions expanded");

    let res = if options.parse_only {
        expr
    } else if let Some(limit) = options.max_steps {
        let mut budget = StepLimit::new(limit);
        let res = expr.evaluate_with(&mut budget)?;
        debug!(steps = budget.taken(), "evaluation finished");
        res
    } else {
        expr.evaluate()
    };

    match expected {
        Some(expected) if !res.alpha_eq(&expected) => Err(RunError::Unexpected {
            actual: res,
            expected,
        }),
        _ => Ok(res),
    }
}
