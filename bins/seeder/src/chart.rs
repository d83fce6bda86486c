//! Standard freight-forwarding chart of accounts.
//!
//! Group accounts come before their children so each parent already exists
//! when a child is created.

use std::collections::HashMap;

use freightledger_core::chart::{Account, AccountType};
use freightledger_db::{AccountError, AccountRepository};
use freightledger_db::repositories::{CreateAccountInput, UpdateAccountInput};
use tracing::debug;

use AccountType::{Asset, Equity, Expense, Income, Liability};

/// One account of the seed chart.
#[derive(Debug, Clone, Copy)]
pub struct SeedAccount {
    pub code: &'static str,
    pub name: &'static str,
    pub account_type: AccountType,
    pub parent: Option<&'static str>,
    pub is_group: bool,
}

const fn group(
    code: &'static str,
    name: &'static str,
    account_type: AccountType,
    parent: Option<&'static str>,
) -> SeedAccount {
    SeedAccount { code, name, account_type, parent, is_group: true }
}

const fn leaf(
    code: &'static str,
    name: &'static str,
    account_type: AccountType,
    parent: &'static str,
) -> SeedAccount {
    SeedAccount { code, name, account_type, parent: Some(parent), is_group: false }
}

const fn root(code: &'static str, name: &'static str, account_type: AccountType) -> SeedAccount {
    SeedAccount { code, name, account_type, parent: None, is_group: false }
}

pub const STANDARD_CHART: &[SeedAccount] = &[
    group("1000", "Assets", Asset, None),
    group("1100", "Cash & Bank", Asset, Some("1000")),
    leaf("1101", "Cash - Petty Cash", Asset, "1100"),
    leaf("1102", "Bank - BCA", Asset, "1100"),
    leaf("1103", "Bank - Mandiri", Asset, "1100"),
    leaf("1104", "Bank - BNI", Asset, "1100"),
    leaf("1105", "Bank - Other", Asset, "1100"),
    leaf("1110", "Cash In Transit", Asset, "1100"),
    group("1200", "Receivables", Asset, Some("1000")),
    leaf("1201", "Account Receivable - Trade", Asset, "1200"),
    leaf("1202", "AR - Employee/Advance", Asset, "1200"),
    leaf("1203", "AR - Other", Asset, "1200"),
    leaf("1210", "Allowance for Doubtful Accounts", Asset, "1200"),
    group("1300", "Prepayments & Deposits", Asset, Some("1000")),
    leaf("1301", "Prepaid Expense", Asset, "1300"),
    leaf("1302", "Prepaid Insurance", Asset, "1300"),
    leaf("1303", "Prepaid Rent", Asset, "1300"),
    leaf("1310", "Deposit to Vendors", Asset, "1300"),
    group("1400", "Inventory", Asset, Some("1000")),
    leaf("1401", "Inventory - Packing Material", Asset, "1400"),
    leaf("1402", "Inventory - Others", Asset, "1400"),
    group("1500", "Prepaid Taxes", Asset, Some("1000")),
    leaf("1501", "VAT In (PPN Masukan)", Asset, "1500"),
    leaf("1502", "PPh 21 Prepaid", Asset, "1500"),
    leaf("1503", "PPh 23 Prepaid", Asset, "1500"),
    leaf("1504", "PPh 4(2) Prepaid", Asset, "1500"),
    leaf("1505", "Other Tax Prepaid", Asset, "1500"),
    group("1600", "Fixed Assets", Asset, Some("1000")),
    leaf("1601", "Fixed Asset - Vehicle", Asset, "1600"),
    leaf("1602", "Fixed Asset - Equipment", Asset, "1600"),
    leaf("1603", "Fixed Asset - Furniture", Asset, "1600"),
    leaf("1604", "Fixed Asset - Computer & IT", Asset, "1600"),
    leaf("1611", "Accum Dep - Vehicle", Asset, "1600"),
    leaf("1612", "Accum Dep - Equipment", Asset, "1600"),
    leaf("1613", "Accum Dep - Furniture", Asset, "1600"),
    leaf("1614", "Accum Dep - Computer & IT", Asset, "1600"),
    group("2000", "Liabilities", Liability, None),
    group("2100", "Payables", Liability, Some("2000")),
    leaf("2101", "Account Payable - Trade", Liability, "2100"),
    leaf("2102", "AP - Other", Liability, "2100"),
    group("2200", "Customer Deposits", Liability, Some("2000")),
    leaf("2201", "Customer Deposit / Unearned Revenue", Liability, "2200"),
    group("2300", "Taxes Payable", Liability, Some("2000")),
    leaf("2301", "VAT Out (PPN Keluaran)", Liability, "2300"),
    leaf("2302", "PPh 21 Payable", Liability, "2300"),
    leaf("2303", "PPh 23 Payable", Liability, "2300"),
    leaf("2304", "PPh 4(2) Payable", Liability, "2300"),
    leaf("2305", "Corporate Income Tax Payable", Liability, "2300"),
    group("2400", "Accruals", Liability, Some("2000")),
    leaf("2401", "Accrued Expense", Liability, "2400"),
    leaf("2402", "Accrued Salary", Liability, "2400"),
    leaf("2403", "Accrued Bonus/THR", Liability, "2400"),
    leaf("2404", "Accrued Freight/Carrier Cost", Liability, "2400"),
    group("2500", "Loans", Liability, Some("2000")),
    leaf("2501", "Loan Payable - Bank", Liability, "2500"),
    leaf("2502", "Loan Payable - Other", Liability, "2500"),
    group("3000", "Equity", Equity, None),
    leaf("3101", "Capital / Paid-in Capital", Equity, "3000"),
    leaf("3201", "Retained Earnings", Equity, "3000"),
    leaf("3301", "Current Year Profit/Loss", Equity, "3000"),
    group("4000", "Revenue", Income, None),
    group("4100", "Service Revenue", Income, Some("4000")),
    leaf("4101", "Revenue - Ocean Freight", Income, "4100"),
    leaf("4102", "Revenue - Air Freight", Income, "4100"),
    leaf("4103", "Revenue - Trucking / Inland", Income, "4100"),
    leaf("4104", "Revenue - Customs Clearance", Income, "4100"),
    leaf("4105", "Revenue - Handling / THC / Port Charges", Income, "4100"),
    leaf("4106", "Revenue - Warehousing", Income, "4100"),
    leaf("4107", "Revenue - Door to Door Service", Income, "4100"),
    leaf("4108", "Revenue - Document / Admin Fee", Income, "4100"),
    leaf("4109", "Revenue - Other Services", Income, "4100"),
    group("4200", "Sales Adjustments", Income, Some("4000")),
    leaf("4201", "Sales Discount", Income, "4200"),
    leaf("4202", "Sales Return/Adjustment", Income, "4200"),
    group("5000", "Cost of Services", Expense, None),
    leaf("5101", "COGS - Ocean Freight Cost", Expense, "5000"),
    leaf("5102", "COGS - Air Freight Cost", Expense, "5000"),
    leaf("5103", "COGS - Trucking Cost", Expense, "5000"),
    leaf("5104", "COGS - Customs/Broker Cost", Expense, "5000"),
    leaf("5105", "COGS - Handling/THC/Port Cost", Expense, "5000"),
    leaf("5106", "COGS - Warehousing Cost", Expense, "5000"),
    leaf("5107", "COGS - Packing Material", Expense, "5000"),
    leaf("5108", "COGS - Survey/Inspection", Expense, "5000"),
    leaf("5109", "COGS - Other Direct Cost", Expense, "5000"),
    group("6000", "Operating Expenses", Expense, None),
    group("6100", "Personnel", Expense, Some("6000")),
    leaf("6101", "Salary & Wages", Expense, "6100"),
    leaf("6102", "BPJS & Allowances", Expense, "6100"),
    leaf("6103", "Overtime", Expense, "6100"),
    leaf("6104", "Bonus/THR", Expense, "6100"),
    group("6200", "Office", Expense, Some("6000")),
    leaf("6201", "Rent Expense", Expense, "6200"),
    leaf("6202", "Electricity/Water", Expense, "6200"),
    leaf("6203", "Internet/Phone", Expense, "6200"),
    leaf("6204", "Office Supplies", Expense, "6200"),
    leaf("6205", "Maintenance Office", Expense, "6200"),
    group("6300", "Sales & Marketing", Expense, Some("6000")),
    leaf("6301", "Sales Commission", Expense, "6300"),
    leaf("6302", "Entertainment", Expense, "6300"),
    leaf("6303", "Advertising/Promotion", Expense, "6300"),
    leaf("6304", "Travel Sales", Expense, "6300"),
    group("6400", "Transport & Travel", Expense, Some("6000")),
    leaf("6401", "Fuel", Expense, "6400"),
    leaf("6402", "Toll & Parking", Expense, "6400"),
    leaf("6403", "Travel & Accommodation", Expense, "6400"),
    leaf("6404", "Vehicle Maintenance", Expense, "6400"),
    group("6500", "Professional & IT", Expense, Some("6000")),
    leaf("6501", "Legal & Notary", Expense, "6500"),
    leaf("6502", "Accounting/Consulting", Expense, "6500"),
    leaf("6503", "Software Subscription", Expense, "6500"),
    leaf("6504", "Hosting/Server", Expense, "6500"),
    leaf("6505", "Domain/SSL", Expense, "6500"),
    group("6600", "Finance Costs", Expense, Some("6000")),
    leaf("6601", "Bank Charges", Expense, "6600"),
    leaf("6602", "Interest Expense", Expense, "6600"),
    leaf("6603", "FX Loss", Expense, "6600"),
    group("6700", "Depreciation", Expense, Some("6000")),
    leaf("6701", "Depreciation - Vehicle", Expense, "6700"),
    leaf("6702", "Depreciation - Equipment", Expense, "6700"),
    leaf("6703", "Depreciation - Furniture", Expense, "6700"),
    leaf("6704", "Depreciation - Computer & IT", Expense, "6700"),
    group("6800", "Other Operating", Expense, Some("6000")),
    leaf("6801", "Insurance Expense", Expense, "6800"),
    leaf("6802", "Training", Expense, "6800"),
    leaf("6803", "Donations", Expense, "6800"),
    leaf("6809", "Other Expense", Expense, "6800"),
    root("7101", "Other Income", Income),
    root("7601", "Other Expense", Expense),
    root("7602", "FX Gain", Income),
];

/// Counts reported after a seed run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub created: usize,
    pub renamed: usize,
    pub unchanged: usize,
}

/// Seeds [`STANDARD_CHART`] into `chart_year`.
///
/// Existing codes are kept; only their name is brought in line with the seed.
pub async fn seed_chart(
    repo: &AccountRepository,
    chart_year: i32,
) -> Result<SeedSummary, AccountError> {
    let mut summary = SeedSummary::default();
    let mut by_code: HashMap<&'static str, Account> = HashMap::new();

    for seed in STANDARD_CHART {
        let account = match repo.find_by_code(chart_year, seed.code).await? {
            Some(existing) if existing.name == seed.name => {
                summary.unchanged += 1;
                existing
            }
            Some(existing) => {
                summary.renamed += 1;
                let update = UpdateAccountInput {
                    name: Some(seed.name.to_string()),
                    ..UpdateAccountInput::default()
                };
                repo.update_account(existing.id, update).await?
            }
            None => {
                let mut input =
                    CreateAccountInput::new(chart_year, seed.code, seed.name, seed.account_type);
                if let Some(parent) = seed.parent.and_then(|code| by_code.get(code)) {
                    input = input.under(parent.id);
                }
                if seed.is_group {
                    input = input.group();
                }
                summary.created += 1;
                repo.create_account(input).await?
            }
        };

        debug!(code = seed.code, "seeded account");
        by_code.insert(seed.code, account);
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_codes_are_unique() {
        let mut seen = HashSet::new();
        for seed in STANDARD_CHART {
            assert!(seen.insert(seed.code), "duplicate code {}", seed.code);
        }
    }

    #[test]
    fn test_parents_precede_children_and_share_type() {
        let mut earlier: HashMap<&str, &SeedAccount> = HashMap::new();
        for seed in STANDARD_CHART {
            if let Some(parent) = seed.parent {
                let parent = earlier
                    .get(parent)
                    .unwrap_or_else(|| panic!("{} listed before its parent", seed.code));
                assert!(parent.is_group, "{} is a parent but not a group", parent.code);
                assert_eq!(parent.account_type, seed.account_type, "{}", seed.code);
            }
            earlier.insert(seed.code, seed);
        }
    }

    #[test]
    fn test_every_group_has_children() {
        for seed in STANDARD_CHART.iter().filter(|s| s.is_group) {
            assert!(
                STANDARD_CHART.iter().any(|s| s.parent == Some(seed.code)),
                "group {} is empty",
                seed.code
            );
        }
    }

    #[test]
    fn test_default_mapping_codes_are_postable() {
        for code in ["1201", "4101", "2301", "1101", "1503"] {
            let seed = STANDARD_CHART.iter().find(|s| s.code == code);
            assert!(seed.is_some_and(|s| !s.is_group), "{code}");
        }
    }
}
