//! Chart of accounts domain types.
//!
//! Account kinds are closed enumerations. The normal balance side and the
//! subtype-to-type table are exhaustive `match`es, so adding a variant fails
//! to compile until every mapping is updated.

use chrono::{DateTime, Utc};
use koperasi_shared::types::{AccountId, CooperativeId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::error::LedgerError;

/// The five recognized account kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Resources owned by the cooperative.
    Asset,
    /// Obligations, including member deposits.
    Liability,
    /// Members' capital and retained SHU.
    Equity,
    /// Income earned.
    Revenue,
    /// Costs incurred.
    Expense,
}

impl AccountType {
    /// Every account type, in chart-of-accounts order.
    pub const ALL: [Self; 5] = [
        Self::Asset,
        Self::Liability,
        Self::Equity,
        Self::Revenue,
        Self::Expense,
    ];

    /// Side on which this account type naturally increases.
    ///
    /// - Asset/Expense: debit-normal
    /// - Liability/Equity/Revenue: credit-normal
    #[must_use]
    pub const fn normal_balance(self) -> NormalBalance {
        match self {
            Self::Asset | Self::Expense => NormalBalance::Debit,
            Self::Liability | Self::Equity | Self::Revenue => NormalBalance::Credit,
        }
    }

    /// Lowercase name used in storage and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Revenue => "revenue",
            Self::Expense => "expense",
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccountType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asset" => Ok(Self::Asset),
            "liability" => Ok(Self::Liability),
            "equity" => Ok(Self::Equity),
            "revenue" => Ok(Self::Revenue),
            "expense" => Ok(Self::Expense),
            _ => Err(LedgerError::UnknownAccountType(s.to_string())),
        }
    }
}

/// Side of the ledger on which an account increases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalBalance {
    /// Debits increase the balance.
    Debit,
    /// Credits increase the balance.
    Credit,
}

impl NormalBalance {
    /// Calculates the balance change contributed by a debit/credit pair.
    ///
    /// Debit-normal: `debit - credit`. Credit-normal: `credit - debit`.
    #[must_use]
    pub fn balance_change(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            Self::Debit => debit - credit,
            Self::Credit => credit - debit,
        }
    }

    /// Like [`Self::balance_change`], returning `None` on overflow.
    #[must_use]
    pub fn checked_balance_change(self, debit: Decimal, credit: Decimal) -> Option<Decimal> {
        match self {
            Self::Debit => debit.checked_sub(credit),
            Self::Credit => credit.checked_sub(debit),
        }
    }
}

/// Account subtypes used by cooperative charts of accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountSubtype {
    /// Cash on hand.
    Cash,
    /// Bank balances.
    Bank,
    /// Trade and other receivables.
    Receivable,
    /// Loans disbursed to members.
    MemberLoan,
    /// Property and equipment.
    FixedAsset,
    /// Trade and other payables.
    Payable,
    /// Voluntary member deposits (simpanan sukarela).
    VoluntarySavings,
    /// One-off membership capital (simpanan pokok).
    PrincipalSavings,
    /// Recurring mandatory capital (simpanan wajib).
    MandatorySavings,
    /// Retained SHU not yet distributed.
    RetainedShu,
    /// General reserve.
    Reserve,
    /// Interest earned on member loans.
    InterestIncome,
    /// Service and administration fees.
    ServiceIncome,
    /// Any other revenue.
    OtherIncome,
    /// Day-to-day operating costs.
    OperatingExpense,
    /// Interest paid on deposits.
    InterestExpense,
    /// Any other expense.
    OtherExpense,
}

impl AccountSubtype {
    /// The account type every account of this subtype must have.
    #[must_use]
    pub const fn account_type(self) -> AccountType {
        match self {
            Self::Cash | Self::Bank | Self::Receivable | Self::MemberLoan | Self::FixedAsset => {
                AccountType::Asset
            }
            Self::Payable | Self::VoluntarySavings => AccountType::Liability,
            Self::PrincipalSavings | Self::MandatorySavings | Self::RetainedShu | Self::Reserve => {
                AccountType::Equity
            }
            Self::InterestIncome | Self::ServiceIncome | Self::OtherIncome => AccountType::Revenue,
            Self::OperatingExpense | Self::InterestExpense | Self::OtherExpense => {
                AccountType::Expense
            }
        }
    }

    /// Snake-case name used in storage and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Bank => "bank",
            Self::Receivable => "receivable",
            Self::MemberLoan => "member_loan",
            Self::FixedAsset => "fixed_asset",
            Self::Payable => "payable",
            Self::VoluntarySavings => "voluntary_savings",
            Self::PrincipalSavings => "principal_savings",
            Self::MandatorySavings => "mandatory_savings",
            Self::RetainedShu => "retained_shu",
            Self::Reserve => "reserve",
            Self::InterestIncome => "interest_income",
            Self::ServiceIncome => "service_income",
            Self::OtherIncome => "other_income",
            Self::OperatingExpense => "operating_expense",
            Self::InterestExpense => "interest_expense",
            Self::OtherExpense => "other_expense",
        }
    }
}

impl std::fmt::Display for AccountSubtype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccountSubtype {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        [
            Self::Cash,
            Self::Bank,
            Self::Receivable,
            Self::MemberLoan,
            Self::FixedAsset,
            Self::Payable,
            Self::VoluntarySavings,
            Self::PrincipalSavings,
            Self::MandatorySavings,
            Self::RetainedShu,
            Self::Reserve,
            Self::InterestIncome,
            Self::ServiceIncome,
            Self::OtherIncome,
            Self::OperatingExpense,
            Self::InterestExpense,
            Self::OtherExpense,
        ]
        .into_iter()
        .find(|subtype| subtype.as_str() == normalized)
        .ok_or_else(|| LedgerError::UnknownAccountSubtype(s.to_string()))
    }
}

/// An entry in a cooperative's chart of accounts.
///
/// Type and normal balance are fixed at creation; re-typing would silently
/// change the sign of every historical balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Owning cooperative.
    pub cooperative_id: CooperativeId,
    /// Account code, unique within the cooperative (e.g. "1000").
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account kind.
    pub account_type: AccountType,
    /// Optional finer classification.
    pub subtype: Option<AccountSubtype>,
    /// Parent account in the same cooperative.
    pub parent_id: Option<AccountId>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Builds a new account from validated input, trimming code and name.
    #[must_use]
    pub fn new(cooperative_id: CooperativeId, input: CreateAccountInput) -> Self {
        Self {
            id: AccountId::new(),
            cooperative_id,
            code: input.code.trim().to_string(),
            name: input.name.trim().to_string(),
            account_type: input.account_type,
            subtype: input.subtype,
            parent_id: input.parent_id,
            created_at: Utc::now(),
        }
    }

    /// Normal balance side, derived from the account type.
    #[must_use]
    pub const fn normal_balance(&self) -> NormalBalance {
        self.account_type.normal_balance()
    }
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// Account code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account kind.
    pub account_type: AccountType,
    /// Optional subtype; must belong to `account_type`.
    pub subtype: Option<AccountSubtype>,
    /// Optional parent account.
    pub parent_id: Option<AccountId>,
}

impl CreateAccountInput {
    /// Creates a root account input with no subtype.
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            account_type,
            subtype: None,
            parent_id: None,
        }
    }

    /// Sets the subtype.
    #[must_use]
    pub fn with_subtype(mut self, subtype: AccountSubtype) -> Self {
        self.subtype = Some(subtype);
        self
    }

    /// Sets the parent account.
    #[must_use]
    pub fn with_parent(mut self, parent_id: AccountId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}
