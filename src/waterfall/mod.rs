//! Period-by-period cash-flow waterfall
//!
//! Cash generated by the receivables pool pays administration and expected
//! losses first, then the tranches in strict seniority: senior interest and
//! principal, mezzanine interest and principal, junior interest and principal.
//! Whatever is left is the residual, which belongs to the junior holder.

pub mod cashflows;
pub mod engine;
pub mod state;

pub use cashflows::{PeriodRecord, Tranche, TrancheLeg, WaterfallResult, WaterfallSummary};
pub use engine::{AdminBase, CouponBasis, DayCount, PeriodInputs, WaterfallConfig, WaterfallEngine};
pub use state::WaterfallState;
