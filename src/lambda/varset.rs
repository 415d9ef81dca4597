use alloc::sync::Arc;
use core::fmt;

/// Appended to a bound name until it stops colliding.
pub const RENAME_MARKER: char = '′';

/// A variable name. Two variables are the same iff their names are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable(Arc<str>);

impl Variable {
    /// The same name with one more rename marker.
    #[must_use]
    pub fn primed(&self) -> Variable {
        Variable(format!("{}{RENAME_MARKER}", self.0).into())
    }
}

impl From<&str> for Variable {
    fn from(name: &str) -> Self {
        Variable(name.into())
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An immutable finite set of variables.
///
/// Kept as a sorted, deduplicated vector. Every operation returns a new set
/// and leaves its operands untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarSet(Vec<Variable>);

impl VarSet {
    pub fn empty() -> Self {
        VarSet(Vec::new())
    }

    pub fn singleton(v: Variable) -> Self {
        VarSet(vec![v])
    }

    pub fn contains(&self, v: &Variable) -> bool {
        self.0.binary_search(v).is_ok()
    }

    #[must_use]
    pub fn union(&self, other: &VarSet) -> VarSet {
        let (mut a, mut b) = (self.0.iter().peekable(), other.0.iter().peekable());
        let mut out = Vec::with_capacity(self.0.len() + other.0.len());

        // both sides are sorted, so a single merge pass drops duplicates
        loop {
            let next = match (a.peek(), b.peek()) {
                (Some(x), Some(y)) => match x.cmp(y) {
                    core::cmp::Ordering::Less => a.next(),
                    core::cmp::Ordering::Greater => b.next(),
                    core::cmp::Ordering::Equal => {
                        b.next();
                        a.next()
                    }
                },
                (Some(_), None) => a.next(),
                (None, Some(_)) => b.next(),
                (None, None) => break,
            };
            out.extend(next.cloned());
        }

        VarSet(out)
    }

    #[must_use]
    pub fn without(&self, v: &Variable) -> VarSet {
        VarSet(self.0.iter().filter(|x| *x != v).cloned().collect())
    }
}

impl Default for VarSet {
    fn default() -> Self {
        VarSet::empty()
    }
}

impl FromIterator<Variable> for VarSet {
    fn from_iter<I: IntoIterator<Item = Variable>>(iter: I) -> Self {
        let mut vars: Vec<_> = iter.into_iter().collect();
        vars.sort_unstable();
        vars.dedup();
        VarSet(vars)
    }
}

impl fmt::Display for VarSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{v}")?;
        }
        f.write_str("}")
    }
}
