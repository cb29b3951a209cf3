// Cost estimator for a stay at one hostel

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::Hostel;

pub const MIN_STAY_MONTHS: u32 = 1;
pub const MAX_STAY_MONTHS: u32 = 12;

// Starting values of the calculator form
pub const DEFAULT_STAY_MONTHS: u32 = 10;
pub const DEFAULT_ELECTRICITY_PER_MONTH: u64 = 1000;
pub const DEFAULT_TRANSPORT_PER_MONTH: u64 = 1500;
pub const DEFAULT_PERSONAL_PER_MONTH: u64 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CostComponent {
    Rent,
    MessFee,
    Electricity,
    Security,
    Transport,
    Personal,
}

impl CostComponent {
    pub const ALL: [CostComponent; 6] = [
        CostComponent::Rent,
        CostComponent::MessFee,
        CostComponent::Electricity,
        CostComponent::Security,
        CostComponent::Transport,
        CostComponent::Personal,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CostComponent::Rent => "Rent",
            CostComponent::MessFee => "Mess Fee",
            CostComponent::Electricity => "Electricity & Utilities",
            CostComponent::Security => "Security Deposit",
            CostComponent::Transport => "Transportation",
            CostComponent::Personal => "Personal Expenses",
        }
    }
}

/// Itemized cost of a whole stay, in rupees.
///
/// Always produced in one piece by [`estimate_cost`]; `total` is the sum of
/// the six components, saturating at `u64::MAX`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub rent: u64,
    pub mess_fee: u64,
    pub electricity: u64,
    /// One-time deposit, independent of the stay length.
    pub security: u64,
    pub transport: u64,
    pub personal: u64,
    pub total: u64,
}

impl CostBreakdown {
    pub fn component(&self, component: CostComponent) -> u64 {
        match component {
            CostComponent::Rent => self.rent,
            CostComponent::MessFee => self.mess_fee,
            CostComponent::Electricity => self.electricity,
            CostComponent::Security => self.security,
            CostComponent::Transport => self.transport,
            CostComponent::Personal => self.personal,
        }
    }

    pub fn components(&self) -> Vec<(CostComponent, u64)> {
        CostComponent::ALL
            .into_iter()
            .map(|c| (c, self.component(c)))
            .collect()
    }

    /// Share of the total taken by `component`, in percent with one decimal.
    /// A zero total has no shares; every component reports 0.0.
    pub fn percentage(&self, component: CostComponent) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let share = self.component(component) as f64 / self.total as f64 * 100.0;
        (share * 10.0).round() / 10.0
    }

    pub fn monthly_average(&self, months: u32) -> u64 {
        if months == 0 {
            return 0;
        }
        self.total / months as u64
    }
}

/// Estimates the cost of staying `months` months in `room_type` at `hostel`.
///
/// An unknown room type contributes no rent. `months` is used as given; clamp
/// user input with [`clamp_months`] first.
pub fn estimate_cost(
    hostel: &Hostel,
    room_type: &str,
    months: u32,
    electricity_per_month: u64,
    transport_per_month: u64,
    personal_per_month: u64,
) -> CostBreakdown {
    let months = months as u64;

    let monthly_rent = hostel.room_price(room_type).unwrap_or_else(|| {
        debug!(hostel = %hostel.id, room_type, "unknown room type, rent counted as 0");
        0
    });

    let rent = monthly_rent.saturating_mul(months);
    let mess_fee = hostel.mess_fee.unwrap_or(0).saturating_mul(months);
    let electricity = if hostel.electricity_included {
        0
    } else {
        electricity_per_month.saturating_mul(months)
    };
    let security = hostel.security_deposit;
    let transport = transport_per_month.saturating_mul(months);
    let personal = personal_per_month.saturating_mul(months);

    let total = [mess_fee, electricity, security, transport, personal]
        .into_iter()
        .fold(rent, u64::saturating_add);

    CostBreakdown {
        rent,
        mess_fee,
        electricity,
        security,
        transport,
        personal,
        total,
    }
}

pub fn clamp_months(months: i64) -> u32 {
    months.clamp(MIN_STAY_MONTHS as i64, MAX_STAY_MONTHS as i64) as u32
}

/// Inputs of the cost calculator form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostParams {
    pub room_type: String,
    pub months: u32,
    pub electricity_per_month: u64,
    pub transport_per_month: u64,
    pub personal_per_month: u64,
}

impl CostParams {
    // First room type, ten months; no electricity estimate when rent covers it
    pub fn defaults_for(hostel: &Hostel) -> Self {
        Self {
            room_type: hostel.room_types.first().cloned().unwrap_or_default(),
            months: DEFAULT_STAY_MONTHS,
            electricity_per_month: if hostel.electricity_included {
                0
            } else {
                DEFAULT_ELECTRICITY_PER_MONTH
            },
            transport_per_month: DEFAULT_TRANSPORT_PER_MONTH,
            personal_per_month: DEFAULT_PERSONAL_PER_MONTH,
        }
    }

    pub fn with_months(mut self, months: i64) -> Self {
        self.months = clamp_months(months);
        self
    }

    pub fn estimate(&self, hostel: &Hostel) -> CostBreakdown {
        estimate_cost(
            hostel,
            &self.room_type,
            self.months,
            self.electricity_per_month,
            self.transport_per_month,
            self.personal_per_month,
        )
    }
}
