//! Window primitives.
//!
//! Ranking functions count rows of an ordered partition. `NTILE` and
//! `LEAD`/`LAG` cannot be answered in one pass, so they emit per-row fact
//! records ([`NtileFact`], [`LeadLagFact`]) that the window executor
//! resolves once the partition is complete. `NTH_VALUE` reads the frame
//! installed in the [`EvalContext`](crate::EvalContext).

mod facts;
mod first_last;
mod lead_lag;
mod nth_value;
mod ntile;
mod ranking;

pub use facts::{LeadLagFact, NtileFact};
pub use first_last::{FirstLastMode, FirstLastValue};
pub use lead_lag::LeadLagValue;
pub use nth_value::NthValue;
pub use ntile::Ntile;
pub use ranking::{RankMode, RankingFunction};
