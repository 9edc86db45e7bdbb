//! Sequential-pay waterfall engine

use chrono::NaiveDate;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::cashflows::{PeriodRecord, Tranche, TrancheLeg, WaterfallResult};
use super::state::WaterfallState;
use crate::assumptions::{AssetRate, Assumptions};
use crate::calendar::{self, HolidayCalendar, BUSINESS_DAYS_PER_YEAR};
use crate::curve::{
    compound_spread, forward_rate, period_rate_for_fraction, CurvePoint, RateCurve, YieldCurve,
};
use crate::error::{FidcError, Result};

/// How an interval between payment dates becomes a fraction of a year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayCount {
    /// Every period is `1 / periods_per_year`
    Periodic,
    /// Business days in the period over 252
    Business252,
}

impl DayCount {
    pub fn year_fraction(&self, business_days: u32, periods_per_year: u32) -> f64 {
        match self {
            DayCount::Periodic => 1.0 / periods_per_year.max(1) as f64,
            DayCount::Business252 => business_days as f64 / BUSINESS_DAYS_PER_YEAR,
        }
    }

    /// Period loss rate. Periodic runs convert the annual rate geometrically;
    /// business-day runs scale it by the elapsed year fraction.
    pub fn loss_rate(&self, loss_rate_aa: f64, year_fraction: f64) -> f64 {
        match self {
            DayCount::Periodic => period_rate_for_fraction(loss_rate_aa, year_fraction),
            DayCount::Business252 => loss_rate_aa * year_fraction,
        }
    }
}

/// How senior and mezzanine coupons are set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CouponBasis {
    /// The tranche's annual rate, every period
    Fixed,
    /// The tranche's rate is a spread over the curve; each period accrues the
    /// forward rate bootstrapped between consecutive payment dates
    Floating,
}

/// Amount the administration fee rate applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminBase {
    /// Volume at funding, so the fee does not decay with the pool
    InitialVolume,
    /// Pool balance at the start of each period
    PoolBalance,
}

/// Configuration for a waterfall run
#[derive(Debug, Clone)]
pub struct WaterfallConfig {
    pub day_count: DayCount,
    pub coupon_basis: CouponBasis,
    pub admin_base: AdminBase,
    pub holidays: HolidayCalendar,
    /// Funding curve; required by floating coupons and curve-priced assets
    pub curve: Option<YieldCurve>,
    /// Funding date followed by the payment dates. Replaces the monthly
    /// schedule built from the assumptions' start date and period count.
    pub schedule: Option<Vec<NaiveDate>>,
}

impl Default for WaterfallConfig {
    fn default() -> Self {
        Self {
            day_count: DayCount::Periodic,
            coupon_basis: CouponBasis::Fixed,
            admin_base: AdminBase::InitialVolume,
            holidays: HolidayCalendar::new(),
            curve: None,
            schedule: None,
        }
    }
}

impl WaterfallConfig {
    /// Business-day accrual with floating coupons over `curve`
    pub fn floating(curve: YieldCurve, holidays: HolidayCalendar) -> Self {
        Self {
            day_count: DayCount::Business252,
            coupon_basis: CouponBasis::Floating,
            admin_base: AdminBase::InitialVolume,
            holidays,
            curve: Some(curve),
            schedule: None,
        }
    }

    pub fn with_curve(mut self, curve: YieldCurve) -> Self {
        self.curve = Some(curve);
        self
    }

    pub fn with_holidays(mut self, holidays: HolidayCalendar) -> Self {
        self.holidays = holidays;
        self
    }

    pub fn with_schedule(mut self, dates: Vec<NaiveDate>) -> Self {
        self.schedule = Some(dates);
        self
    }
}

/// Rates and day counts for one period, fixed before any cash moves
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodInputs {
    pub period: u32,
    pub date: NaiveDate,
    pub calendar_days: i64,
    pub business_days: u32,
    pub elapsed_business_days: u32,
    pub year_fraction: f64,
    pub curve_rate: f64,
    pub asset_rate: f64,
    pub admin_rate: f64,
    pub loss_rate: f64,
    pub spot_rates: [f64; 3],
    pub coupon_rates_aa: [f64; 3],
    pub coupon_period_rates: [f64; 3],
}

/// Main waterfall engine
#[derive(Debug, Clone)]
pub struct WaterfallEngine {
    assumptions: Assumptions,
    config: WaterfallConfig,
    schedule: Vec<NaiveDate>,
    periods_per_year: u32,
    amortization: f64,
}

impl WaterfallEngine {
    /// Validate the inputs and lay out the payment schedule.
    ///
    /// # Errors
    /// Invalid assumptions, a curve-dependent setup without a curve, an
    /// explicit schedule that does not strictly increase, or a generated
    /// schedule that runs past the representable date range.
    pub fn new(assumptions: Assumptions, config: WaterfallConfig) -> Result<Self> {
        assumptions.validate()?;

        let needs_curve = assumptions.asset_rate.needs_curve()
            || config.coupon_basis == CouponBasis::Floating;
        if needs_curve && config.curve.is_none() {
            return Err(FidcError::MissingCurve);
        }

        let schedule = match &config.schedule {
            Some(dates) => {
                calendar::validate_schedule(dates)?;
                dates.clone()
            }
            None => calendar::payment_schedule(
                assumptions.start_date,
                assumptions.periods,
                assumptions.frequency_months,
            )?,
        };
        let periods_per_year = assumptions.periods_per_year();
        let amortization = assumptions.scheduled_amortization(schedule.len().saturating_sub(1));

        Ok(Self {
            assumptions,
            config,
            schedule,
            periods_per_year,
            amortization,
        })
    }

    pub fn assumptions(&self) -> &Assumptions {
        &self.assumptions
    }

    pub fn config(&self) -> &WaterfallConfig {
        &self.config
    }

    /// Funding date followed by the payment dates
    pub fn schedule(&self) -> &[NaiveDate] {
        &self.schedule
    }

    pub fn periods_per_year(&self) -> u32 {
        self.periods_per_year
    }

    /// Run the waterfall over the whole schedule
    pub fn run(&self) -> WaterfallResult {
        let mut result = WaterfallResult::new(self.periods_per_year);
        let Some((&start, payment_dates)) = self.schedule.split_first() else {
            return result;
        };

        debug!(
            "Running waterfall: {} periods from {}, {:?} day count, {:?} coupons",
            payment_dates.len(),
            start,
            self.config.day_count,
            self.config.coupon_basis
        );

        let curve_rate = self.curve_rate(&CurvePoint::new(0, start));
        let funded = WaterfallState::funded(&self.assumptions, start, self.spot_rates(curve_rate));
        result.timeline.push(self.funding_record(&funded, curve_rate));

        let periods = payment_dates.iter().scan(funded, |state, &date| {
            let inputs = self.period_inputs(state, date);
            let (next, record) = self.step(state, &inputs);
            *state = next;
            Some(record)
        });
        result.timeline.extend(periods);

        result
    }

    /// Rates and day counts for the period ending on `date`
    pub fn period_inputs(&self, state: &WaterfallState, date: NaiveDate) -> PeriodInputs {
        let business_days = calendar::business_days(state.date, date, &self.config.holidays);
        let elapsed_business_days = state.elapsed_business_days + business_days;
        let year_fraction = self
            .config
            .day_count
            .year_fraction(business_days, self.periods_per_year);

        let curve_rate = self.curve_rate(&CurvePoint::new(elapsed_business_days, date));

        let asset_rate = match self.assumptions.asset_rate {
            AssetRate::Annual { rate_aa } => period_rate_for_fraction(rate_aa, year_fraction),
            AssetRate::MonthlyCession { rate_am } => {
                period_rate_for_fraction(rate_am, 12.0 * year_fraction)
            }
            AssetRate::CurveSpread { spread_aa } => {
                period_rate_for_fraction(compound_spread(curve_rate, spread_aa), year_fraction)
            }
        };

        let spot_rates = self.spot_rates(curve_rate);
        let coupon_rates_aa = Tranche::ALL.map(|t| {
            let spot = spot_rates[t.index()];
            if self.is_floating(t) {
                forward_rate(
                    spot,
                    state.spot_rate(t),
                    elapsed_business_days,
                    state.elapsed_business_days,
                )
            } else {
                spot
            }
        });

        PeriodInputs {
            period: state.period + 1,
            date,
            calendar_days: calendar::calendar_days(state.date, date),
            business_days,
            elapsed_business_days,
            year_fraction,
            curve_rate,
            asset_rate,
            admin_rate: period_rate_for_fraction(self.assumptions.admin_rate_aa, year_fraction),
            loss_rate: self
                .config
                .day_count
                .loss_rate(self.assumptions.loss_rate_aa, year_fraction),
            spot_rates,
            coupon_rates_aa,
            coupon_period_rates: coupon_rates_aa.map(|r| period_rate_for_fraction(r, year_fraction)),
        }
    }

    /// Advance one period: generate pool cash, then pay senior, mezzanine and
    /// junior in that order, interest before principal.
    pub fn step(&self, state: &WaterfallState, inputs: &PeriodInputs) -> (WaterfallState, PeriodRecord) {
        let a = &self.assumptions;
        let mut row = PeriodRecord::new(inputs.period, inputs.date);

        row.calendar_days = inputs.calendar_days;
        row.business_days = inputs.business_days;
        row.elapsed_business_days = inputs.elapsed_business_days;
        row.year_fraction = inputs.year_fraction;
        row.curve_rate = inputs.curve_rate;
        row.asset_rate = inputs.asset_rate;
        row.admin_rate = inputs.admin_rate;
        row.loss_rate = inputs.loss_rate;

        // Pool
        let pool_start = state.pool_balance;
        let asset_interest = pool_start * inputs.asset_rate;
        let amortization = self.amortization.min(pool_start).max(0.0);
        // Loss never takes the pool below zero
        let expected_loss = (pool_start * inputs.loss_rate)
            .min(pool_start - amortization)
            .max(0.0);
        let admin_reference = match self.config.admin_base {
            AdminBase::InitialVolume => a.volume,
            AdminBase::PoolBalance => pool_start,
        };
        let admin_cost = (admin_reference * inputs.admin_rate).max(a.admin_min_period);

        let gross_cash = asset_interest + amortization;
        let net_cash = gross_cash - admin_cost - expected_loss;
        let pool_end = pool_start - amortization - expected_loss;

        row.pool_start = pool_start;
        row.asset_interest = asset_interest;
        row.amortization = amortization;
        row.gross_cash = gross_cash;
        row.admin_cost = admin_cost;
        row.expected_loss = expected_loss;
        row.net_cash = net_cash;
        row.pool_end = pool_end;

        // Strict seniority; unpaid interest is foregone
        let mut available = net_cash.max(0.0);
        let mut balances = state.balances;
        for tranche in Tranche::ALL {
            let i = tranche.index();
            let balance_start = state.balances[i];

            let interest_due = (balance_start * inputs.coupon_period_rates[i]).max(0.0);
            let interest_paid = available.min(interest_due);
            available -= interest_paid;

            let principal_paid = available.min(balance_start.max(0.0));
            available -= principal_paid;

            balances[i] = balance_start - principal_paid;
            row.set_leg(
                tranche,
                TrancheLeg {
                    rate_aa: inputs.coupon_rates_aa[i],
                    period_rate: inputs.coupon_period_rates[i],
                    balance_start,
                    interest_due,
                    interest_paid,
                    principal_paid,
                    balance_end: balances[i],
                },
            );
        }
        row.residual = if net_cash < 0.0 { net_cash } else { available };

        trace!(
            "Period {} ({}): pool {:.2} -> {:.2}, net cash {:.2}, residual {:.2}",
            row.period,
            row.date,
            pool_start,
            pool_end,
            net_cash,
            row.residual
        );

        let next = WaterfallState {
            period: inputs.period,
            date: inputs.date,
            elapsed_business_days: inputs.elapsed_business_days,
            pool_balance: pool_end,
            balances,
            spot_rates: inputs.spot_rates,
        };

        (next, row)
    }

    fn funding_record(&self, state: &WaterfallState, curve_rate: f64) -> PeriodRecord {
        let mut row = PeriodRecord::new(0, state.date);
        row.curve_rate = curve_rate;
        row.pool_start = state.pool_balance;
        row.pool_end = state.pool_balance;

        for tranche in Tranche::ALL {
            let balance = state.balance(tranche);
            let rate_aa = state.spot_rate(tranche);
            row.set_leg(
                tranche,
                TrancheLeg {
                    rate_aa,
                    period_rate: crate::curve::period_rate(rate_aa, self.periods_per_year),
                    balance_start: balance,
                    balance_end: balance,
                    ..Default::default()
                },
            );
        }
        row
    }

    fn curve_rate(&self, point: &CurvePoint) -> f64 {
        self.config
            .curve
            .as_ref()
            .map(|curve| curve.rate_at(point))
            .unwrap_or(0.0)
    }

    fn is_floating(&self, tranche: Tranche) -> bool {
        self.config.coupon_basis == CouponBasis::Floating && tranche != Tranche::Junior
    }

    /// Annual coupon per tranche if a period ended where `curve_rate` was read
    fn spot_rates(&self, curve_rate: f64) -> [f64; 3] {
        Tranche::ALL.map(|t| {
            let rate = self.assumptions.coupon_rate(t);
            if self.is_floating(t) {
                compound_spread(curve_rate, rate)
            } else {
                rate
            }
        })
    }
}
