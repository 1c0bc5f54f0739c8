//! Contract-violation diagnostics.
//!
//! The algorithms in this crate are built on invariants that the input mesh
//! and the call sequence are expected to uphold (see spec §7): a broken mesh
//! or an out-of-order call is a programming error in the caller, not a
//! recoverable condition. We report these the way the original C++ `CHECK`
//! macro does — print a diagnostic, then abort — except "abort" here means
//! "panic", which is the idiomatic Rust equivalent of `DEBUG_BREAK()` +
//! `std::abort()` for an unrecoverable invariant failure.

use std::fmt;

/// A contract violation: an internal invariant that does not hold.
#[derive(Debug, thiserror::Error)]
pub struct ClusterFault {
    expr: &'static str,
    file: &'static str,
    line: u32,
    message: Option<String>,
}

impl ClusterFault {
    #[doc(hidden)]
    pub fn new(expr: &'static str, file: &'static str, line: u32, message: Option<String>) -> Self {
        Self {
            expr,
            file,
            line,
            message,
        }
    }
}

impl fmt::Display for ClusterFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "contract violation: `{}` at {}:{}",
            self.expr, self.file, self.line
        )?;
        if let Some(message) = &self.message {
            write!(f, " ({message})")?;
        }
        Ok(())
    }
}

/// Panics with a [`ClusterFault`] diagnostic unless `expr` holds.
///
/// Mirrors the original's `CHECK(expr)`. Unlike `debug_assert!`, this check
/// is never compiled out: the invariants here (self-loops in the hash
/// table's chain, `UnionSequential`'s ascending-root precondition, ...) guard
/// memory-safety-adjacent assumptions the rest of the crate relies on, not
/// just debug-time sanity.
macro_rules! contract {
    ($cond:expr) => {
        if !$cond {
            let fault = $crate::contract::ClusterFault::new(stringify!($cond), file!(), line!(), None);
            log::error!("{fault}");
            panic!("{fault}");
        }
    };
    ($cond:expr, $($msg:tt)+) => {
        if !$cond {
            let fault = $crate::contract::ClusterFault::new(
                stringify!($cond),
                file!(),
                line!(),
                Some(format!($($msg)+)),
            );
            log::error!("{fault}");
            panic!("{fault}");
        }
    };
}

pub(crate) use contract;

#[cfg(test)]
mod tests {
    #[test]
    #[should_panic(expected = "contract violation")]
    fn contract_panics_with_diagnostic() {
        let x = 1;
        contract!(x == 2, "expected x to be {}", 2);
    }

    #[test]
    fn contract_passes_silently() {
        let x = 2;
        contract!(x == 2);
    }
}
