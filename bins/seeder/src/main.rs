//! Ledger seeder for Koperasi development and testing.
//!
//! Builds an in-memory ledger for a demo cooperative: a standard cooperative
//! chart of accounts, one open fiscal year and a handful of member savings
//! and loan postings. Prints the resulting trial balance.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::Context;
use chrono::{Datelike, NaiveDate, Utc};
use koperasi_core::accounts::{AccountSubtype, AccountType, CreateAccountInput};
use koperasi_core::fiscal::CreatePeriodInput;
use koperasi_core::ledger::{JournalLineInput, PostEntryInput, TrialBalance};
use koperasi_core::{BroadcastEventBus, InMemoryStore, LedgerService};
use koperasi_shared::AppConfig;
use koperasi_shared::telemetry::init_tracing;
use koperasi_shared::types::{AccountId, CooperativeId, FiscalPeriodId, UserId, format_amount};
use rust_decimal::Decimal;
use tracing::info;

/// Demo cooperative ID (consistent for all seeds)
const DEMO_COOP_ID: &str = "00000000-0000-0000-0000-000000000001";
/// Demo treasurer ID (consistent for all seeds)
const DEMO_USER_ID: &str = "00000000-0000-0000-0000-000000000002";

/// Standard cooperative chart of accounts: (code, name, type, subtype, parent code).
const CHART: &[(&str, &str, AccountType, Option<AccountSubtype>, Option<&str>)] = &[
    ("1000", "Kas dan Bank", AccountType::Asset, None, None),
    ("1010", "Kas", AccountType::Asset, Some(AccountSubtype::Cash), Some("1000")),
    ("1020", "Bank", AccountType::Asset, Some(AccountSubtype::Bank), Some("1000")),
    ("1200", "Piutang Pinjaman Anggota", AccountType::Asset, Some(AccountSubtype::MemberLoan), None),
    ("2100", "Simpanan Sukarela", AccountType::Liability, Some(AccountSubtype::VoluntarySavings), None),
    ("3100", "Simpanan Pokok", AccountType::Equity, Some(AccountSubtype::PrincipalSavings), None),
    ("3200", "Simpanan Wajib", AccountType::Equity, Some(AccountSubtype::MandatorySavings), None),
    ("3300", "SHU Ditahan", AccountType::Equity, Some(AccountSubtype::RetainedShu), None),
    ("4100", "Pendapatan Bunga Pinjaman", AccountType::Revenue, Some(AccountSubtype::InterestIncome), None),
    ("5100", "Beban Operasional", AccountType::Expense, Some(AccountSubtype::OperatingExpense), None),
];

/// Demo postings: (month, description, debit code, credit code, amount in rupiah).
const POSTINGS: &[(u32, &str, &str, &str, i64)] = &[
    (1, "Setoran simpanan pokok anggota", "1010", "3100", 500_000),
    (1, "Setoran simpanan wajib anggota", "1010", "3200", 1_200_000),
    (2, "Setoran simpanan sukarela", "1020", "2100", 2_000_000),
    (3, "Pencairan pinjaman anggota", "1200", "1010", 1_500_000),
    (4, "Penerimaan bunga pinjaman", "1010", "4100", 45_000),
    (4, "Biaya operasional kantor", "5100", "1010", 120_000),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.logging).context("failed to install tracing subscriber")?;

    let coop: CooperativeId = DEMO_COOP_ID.parse()?;
    let user: UserId = DEMO_USER_ID.parse()?;
    let service = LedgerService::new(
        Arc::new(InMemoryStore::new()),
        Arc::new(BroadcastEventBus::new()),
        &config.ledger,
    );

    println!("Seeding chart of accounts...");
    let accounts = seed_accounts(&service, coop).await?;

    println!("Seeding fiscal period...");
    let year = Utc::now().year();
    let period = seed_period(&service, coop, year).await?;

    println!("Seeding journal entries...");
    seed_entries(&service, coop, user, period, year, &accounts).await?;

    let as_of = NaiveDate::from_ymd_opt(year, 12, 31).context("invalid year end")?;
    let trial = service.trial_balance(coop, as_of).await?;
    print_trial_balance(&trial);

    println!("Seeding complete!");
    Ok(())
}

/// Seeds the chart of accounts, returning `(code, id)` pairs.
async fn seed_accounts(
    service: &LedgerService<InMemoryStore>,
    coop: CooperativeId,
) -> anyhow::Result<Vec<(&'static str, AccountId)>> {
    let mut created: Vec<(&'static str, AccountId)> = Vec::with_capacity(CHART.len());

    for &(code, name, account_type, subtype, parent) in CHART {
        let mut input = CreateAccountInput::new(code, name, account_type);
        input.subtype = subtype;
        if let Some(parent_code) = parent {
            input.parent_id = Some(lookup(&created, parent_code)?);
        }

        let account = service.create_account(coop, input).await?;
        println!("  {code} {name}");
        created.push((code, account.id));
    }

    Ok(created)
}

/// Opens the fiscal year.
async fn seed_period(
    service: &LedgerService<InMemoryStore>,
    coop: CooperativeId,
    year: i32,
) -> anyhow::Result<FiscalPeriodId> {
    let start_date = NaiveDate::from_ymd_opt(year, 1, 1).context("invalid year start")?;
    let end_date = NaiveDate::from_ymd_opt(year, 12, 31).context("invalid year end")?;

    let period = service
        .create_period(
            coop,
            CreatePeriodInput {
                name: format!("Tahun Buku {year}"),
                start_date,
                end_date,
            },
        )
        .await?;
    info!(period_id = %period.id, "fiscal period opened");

    Ok(period.id)
}

/// Posts the demo member transactions.
async fn seed_entries(
    service: &LedgerService<InMemoryStore>,
    coop: CooperativeId,
    user: UserId,
    period: FiscalPeriodId,
    year: i32,
    accounts: &[(&'static str, AccountId)],
) -> anyhow::Result<()> {
    for &(month, description, debit_code, credit_code, rupiah) in POSTINGS {
        let amount = Decimal::from(rupiah);
        let entry = service
            .post_entry(
                coop,
                PostEntryInput {
                    fiscal_period_id: period,
                    entry_date: NaiveDate::from_ymd_opt(year, month, 15)
                        .context("invalid entry date")?,
                    description: description.to_string(),
                    lines: vec![
                        JournalLineInput::debit(lookup(accounts, debit_code)?, amount),
                        JournalLineInput::credit(lookup(accounts, credit_code)?, amount),
                    ],
                    created_by: user,
                },
            )
            .await?;
        println!("  {} {description}", entry.entry_date);
    }

    Ok(())
}

fn lookup(accounts: &[(&'static str, AccountId)], code: &str) -> anyhow::Result<AccountId> {
    accounts
        .iter()
        .find(|(candidate, _)| *candidate == code)
        .map(|(_, id)| *id)
        .with_context(|| format!("account {code} not seeded"))
}

fn print_trial_balance(trial: &TrialBalance) {
    println!();
    println!("Neraca Saldo per {}", trial.as_of);
    println!("{:<6} {:<28} {:>16} {:>16}", "Kode", "Akun", "Debit", "Kredit");
    for row in &trial.rows {
        println!(
            "{:<6} {:<28} {:>16} {:>16}",
            row.code,
            row.name,
            format_amount(row.debit),
            format_amount(row.credit)
        );
    }
    println!(
        "{:<6} {:<28} {:>16} {:>16}",
        "",
        "Total",
        format_amount(trial.total_debit),
        format_amount(trial.total_credit)
    );
    println!(
        "Balanced: {}",
        if trial.is_balanced() { "yes" } else { "NO" }
    );
}
