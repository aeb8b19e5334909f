//! Properties every reachable board must satisfy.
//!
//! `Board::apply_move` checks the full set in debug builds; the tests use
//! the individual invariants to pin down what a corrupted board looks like.

/// A property of a state `S`.
pub trait Invariant<S> {
    /// True if `state` satisfies the property.
    fn holds(state: &S) -> bool;

    /// What the property says, for violation reports.
    fn description() -> &'static str;
}

/// A failed invariant.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("Invariant violated: {}", description)]
pub struct InvariantViolation {
    /// The failed invariant's description.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a violation report.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// Several invariants checked as one.
pub trait InvariantSet<S> {
    /// Checks every member, returning all violations rather than the first.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

macro_rules! invariant_tuple {
    ($($member:ident),+) => {
        impl<S, $($member),+> InvariantSet<S> for ($($member,)+)
        where
            $($member: Invariant<S>,)+
        {
            fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
                let violations: Vec<_> = [$(($member::holds(state), $member::description())),+]
                    .into_iter()
                    .filter(|(holds, _)| !holds)
                    .map(|(_, description)| InvariantViolation::new(description))
                    .collect();

                if violations.is_empty() { Ok(()) } else { Err(violations) }
            }
        }
    };
}

invariant_tuple!(A);
invariant_tuple!(A, B);
invariant_tuple!(A, B, C);

pub mod active_board;
pub mod alternating_turn;
pub mod monotonic_board;

pub use active_board::ActiveBoardInvariant;
pub use alternating_turn::AlternatingTurnInvariant;
pub use monotonic_board::MonotonicBoardInvariant;

/// All board invariants as a composable set.
pub type BoardInvariants = (
    MonotonicBoardInvariant,
    AlternatingTurnInvariant,
    ActiveBoardInvariant,
);
