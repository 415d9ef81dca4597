use core::convert::Infallible;

use thiserror::Error;
use tracing::trace;

use super::expr::Expression;

/// Consulted once before every beta-reduction.
pub trait Budget {
    type Exhausted;

    fn spend(&mut self) -> Result<(), Self::Exhausted>;
}

/// Never runs out. Evaluating a divergent term under it never returns.
pub struct Unbounded;

impl Budget for Unbounded {
    type Exhausted = Infallible;

    fn spend(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("evaluation did not terminate within {0} beta-reductions")]
pub struct OutOfSteps(pub usize);

/// Allows a fixed number of beta-reductions.
#[derive(Debug, Clone, Copy)]
pub struct StepLimit {
    limit: usize,
    taken: usize,
}

impl StepLimit {
    pub fn new(limit: usize) -> Self {
        StepLimit { limit, taken: 0 }
    }

    pub fn taken(&self) -> usize {
        self.taken
    }
}

impl Budget for StepLimit {
    type Exhausted = OutOfSteps;

    fn spend(&mut self) -> Result<(), OutOfSteps> {
        if self.taken >= self.limit {
            return Err(OutOfSteps(self.limit));
        }
        self.taken += 1;
        Ok(())
    }
}

impl Expression {
    /// Reduces to normal form, leftmost-outermost, call-by-name.
    ///
    /// The operand of an application whose head is stuck stays unevaluated.
    /// May not terminate; see [`Expression::evaluate_with`] for a bounded run.
    #[must_use]
    pub fn evaluate(self) -> Expression {
        match self.evaluate_with(&mut Unbounded) {
            Ok(expr) => expr,
            Err(never) => match never {},
        }
    }

    pub fn evaluate_with<B: Budget>(mut self, budget: &mut B) -> Result<Expression, B::Exhausted> {
        // contracting the head redex loops here instead of recursing, so a
        // divergent term runs in constant stack
        loop {
            match self {
                Expression::Var(_) => return Ok(self),
                Expression::Lam(x, body) => {
                    return Ok(Expression::Lam(x, Box::new((*body).evaluate_with(budget)?)));
                }
                Expression::App(app) => {
                    let (f, arg) = *app;
                    match f.evaluate_with(budget)? {
                        Expression::Lam(x, body) => {
                            budget.spend()?;
                            trace!(%x, %arg, "beta-reducing");
                            self = body.substitute(&x, &arg);
                        }
                        f => return Ok(Expression::app(f, arg)),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::mpsc, thread, time::Duration};

    use const_format::formatcp;

    use super::{Expression, OutOfSteps, StepLimit};
    use crate::lambda::parser_lc::{parse, ParseError};

    const ID: &str = "(λx.x)";
    const TRUE: &str = "(λx.λy.x)";
    const FALSE: &str = "(λx.λy.y)";
    const AND: &str = "(λa.λb.a b a)";
    const OMEGA_HALF: &str = "(λx.x x)";
    const OMEGA: &str = formatcp!("{OMEGA_HALF} {OMEGA_HALF}");
    const ZERO: &str = "(λf.λx.x)";
    const TWO: &str = "(λf.λx.f (f x))";
    const SUCC: &str = "(λn.λf.λx.f (n f x))";
    const Y: &str = "(λg.(λx.g (x x)) (λx.g (x x)))";

    type Result = core::result::Result<(), ParseError>;

    fn reduce(prog: &str, expected: &str) -> Result {
        let res = parse(prog)?.evaluate();
        let expected = parse(expected)?;
        assert!(
            res.alpha_eq(&expected),
            "{prog} reduced to {res}, expected {expected}"
        );
        Ok(())
    }

    #[test]
    fn test_variable_is_irreducible() -> Result {
        assert_eq!(parse("x")?.evaluate(), Expression::var("x"));
        Ok(())
    }

    #[test]
    fn test_id() -> Result {
        assert_eq!(parse(formatcp!("{ID} {ID}"))?.evaluate().to_string(), "(λx.x)");
        reduce(formatcp!("{ID} y"), "y")
    }

    #[test]
    fn test_known_redex() -> Result {
        let prog = formatcp!("(λa.λb.a a b) {FALSE} {TRUE}");
        let res = parse(prog)?.evaluate();

        let Expression::Lam(p, body) = &res else {
            panic!("expected an abstraction, got {res}");
        };
        let Expression::Lam(q, body) = &**body else {
            panic!("expected a nested abstraction, got {res}");
        };
        assert_ne!(p, q);
        assert_eq!(**body, Expression::Var(p.clone()));
        assert_eq!(res.to_string(), format!("(λ{p}.(λ{q}.{p}))"));
        Ok(())
    }

    #[test]
    fn test_booleans() -> Result {
        reduce(formatcp!("{AND} {TRUE} {TRUE}"), TRUE)?;
        reduce(formatcp!("{AND} {TRUE} {FALSE}"), FALSE)?;
        reduce(formatcp!("{AND} {FALSE} {TRUE}"), FALSE)
    }

    #[test]
    fn test_evaluates_under_binder() -> Result {
        assert_eq!(
            parse(formatcp!("λz.{ID} z"))?.evaluate().to_string(),
            "(λz.z)"
        );
        Ok(())
    }

    #[test]
    fn test_stuck_application_keeps_operand() -> Result {
        // the head reduces, the operand is left as written
        let res = parse(formatcp!("({ID} f) ({ID} a)"))?.evaluate();
        assert_eq!(res.to_string(), "(f ((λx.x) a))");
        Ok(())
    }

    #[test]
    fn test_call_by_name_discards_divergent_argument() -> Result {
        reduce(formatcp!("(λx.λy.y) ({OMEGA})"), "λy.y")
    }

    #[test]
    fn test_stuck_operand_under_binder() -> Result {
        let res = parse(formatcp!("{SUCC} {ZERO}"))?.evaluate();
        assert_eq!(res.to_string(), "(λf.(λx.(f (((λf.(λx.x)) f) x))))");
        Ok(())
    }

    #[test]
    fn test_church_numeral_applied() -> Result {
        reduce(formatcp!("{TWO} {ID} z"), "z")
    }

    #[test]
    fn test_renaming_during_reduction() -> Result {
        // (λx.λy.x) y must not become λy.y
        reduce("(λx.λy.x) y", "λz.y")
    }

    #[test]
    fn test_y_terminates_when_recursion_is_dropped() -> Result {
        reduce(formatcp!("{Y} (λr.λn.n)"), "λn.n")
    }

    #[test]
    fn test_step_limit_on_omega() -> Result {
        let mut budget = StepLimit::new(10_000);
        let res = parse(OMEGA)?.evaluate_with(&mut budget);

        assert_eq!(res, Err(OutOfSteps(10_000)));
        assert_eq!(budget.taken(), 10_000);
        Ok(())
    }

    #[test]
    fn test_step_limit_counts_reductions() -> Result {
        let mut budget = StepLimit::new(100);
        let res = parse(formatcp!("{ID} ({ID} z)"))?.evaluate_with(&mut budget);

        assert_eq!(res, Ok(Expression::var("z")));
        assert_eq!(budget.taken(), 2);
        Ok(())
    }

    #[test]
    fn test_zero_budget_allows_normal_forms() -> Result {
        let res = parse("λx.x y")?.evaluate_with(&mut StepLimit::new(0));
        assert_eq!(res.map(|e| e.to_string()), Ok(String::from("(λx.(x y))")));
        Ok(())
    }

    #[test]
    fn test_omega_does_not_terminate() -> Result {
        let omega = parse(OMEGA)?;
        let (tx, rx) = mpsc::channel();

        // left running on purpose; the test binary exits without joining it
        thread::spawn(move || {
            let _ = tx.send(omega.evaluate());
        });

        assert_eq!(
            rx.recv_timeout(Duration::from_millis(300)),
            Err(mpsc::RecvTimeoutError::Timeout)
        );
        Ok(())
    }
}
