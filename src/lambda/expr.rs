use core::fmt;

use tracing::trace;

use super::varset::{VarSet, Variable};

pub const LAMBDA: &str = "λ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Var(Variable),
    Lam(Variable, Box<Expression>),
    App(Box<(Expression, Expression)>),
}

impl Expression {
    pub fn var(name: &str) -> Expression {
        Expression::Var(Variable::from(name))
    }

    pub fn lam(name: &str, body: Expression) -> Expression {
        Expression::Lam(Variable::from(name), Box::new(body))
    }

    pub fn app(f: Expression, x: Expression) -> Expression {
        Expression::App(Box::new((f, x)))
    }

    /// Variables with at least one occurrence not bound by an enclosing
    /// abstraction.
    pub fn free_variables(&self) -> VarSet {
        match self {
            Expression::Var(x) => VarSet::singleton(x.clone()),
            Expression::Lam(x, body) => body.free_variables().without(x),
            Expression::App(app) => app.0.free_variables().union(&app.1.free_variables()),
        }
    }

    /// Replaces every free occurrence of `v` with `replacement`.
    ///
    /// Bound variables that would capture a free variable of `replacement`
    /// are renamed by appending [`RENAME_MARKER`](super::varset::RENAME_MARKER)
    /// until the name is fresh. Subtrees that don't mention `v` freely come
    /// back unchanged.
    #[must_use]
    pub fn substitute(&self, v: &Variable, replacement: &Expression) -> Expression {
        match self {
            Expression::Var(x) if x == v => replacement.clone(),
            Expression::Var(_) => self.clone(),
            Expression::App(app) => Expression::app(
                app.0.substitute(v, replacement),
                app.1.substitute(v, replacement),
            ),
            Expression::Lam(x, body) => {
                if x == v {
                    return self.clone();
                }

                let body_free = body.free_variables();
                if !body_free.contains(v) {
                    return self.clone();
                }

                // the new name must not capture anything in the replacement,
                // nor collide with what is already free in the body
                let taken = replacement.free_variables().union(&body_free.without(x));
                let mut fresh = x.clone();
                while taken.contains(&fresh) {
                    fresh = fresh.primed();
                }

                let body = if fresh == *x {
                    body.substitute(v, replacement)
                } else {
                    trace!(from = %x, to = %fresh, "renaming bound variable");
                    body.substitute(x, &Expression::Var(fresh.clone()))
                        .substitute(v, replacement)
                };

                Expression::Lam(fresh, Box::new(body))
            }
        }
    }

    /// Structural equality up to consistent renaming of bound variables.
    pub fn alpha_eq(&self, other: &Expression) -> bool {
        fn alpha_eq_impl<'a>(
            a: &'a Expression,
            b: &'a Expression,
            left: &mut Vec<&'a Variable>,
            right: &mut Vec<&'a Variable>,
        ) -> bool {
            match (a, b) {
                (Expression::Var(x), Expression::Var(y)) => {
                    let i = left.iter().rposition(|&v| v == x);
                    let j = right.iter().rposition(|&v| v == y);
                    match (i, j) {
                        (None, None) => x == y,
                        (Some(i), Some(j)) => i == j,
                        _ => false,
                    }
                }
                (Expression::Lam(x, p), Expression::Lam(y, q)) => {
                    left.push(x);
                    right.push(y);
                    let eq = alpha_eq_impl(p, q, left, right);
                    left.pop();
                    right.pop();
                    eq
                }
                (Expression::App(p), Expression::App(q)) => {
                    alpha_eq_impl(&p.0, &q.0, left, right) && alpha_eq_impl(&p.1, &q.1, left, right)
                }
                _ => false,
            }
        }

        alpha_eq_impl(self, other, &mut Vec::new(), &mut Vec::new())
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Var(x) => write!(f, "{x}"),
            Expression::Lam(x, body) => write!(f, "({LAMBDA}{x}.{body})"),
            Expression::App(app) => write!(f, "({} {})", app.0, app.1),
        }
    }
}
