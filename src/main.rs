use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use loan_schedule::loan::REQUEST_DATE_FORMAT;
use loan_schedule::{Loan, LoanRequest, LoanTerms, PaymentEntry};
use rust_decimal::Decimal;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Table, global = true)]
    format: Format,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate the payment schedule of a loan
    Schedule(LoanArgs),
    /// Override the principal of one payment and print the updated schedule
    Modify {
        #[command(flatten)]
        loan: LoanArgs,

        /// Id of the payment to modify (1-based)
        #[arg(long)]
        payment: u32,

        /// New principal portion of that payment
        #[arg(long, allow_hyphen_values = true)]
        principal: String,
    },
}

#[derive(Args)]
struct LoanArgs {
    /// JSON loan request file; replaces the individual loan flags
    #[arg(long, conflicts_with_all = ["amount", "rate", "payments", "periodicity", "start"])]
    input: Option<PathBuf>,

    /// Loan amount
    #[arg(long)]
    amount: Option<Decimal>,

    /// Annual interest rate in percent
    #[arg(long)]
    rate: Option<Decimal>,

    /// Number of payments
    #[arg(long, allow_hyphen_values = true)]
    payments: Option<i64>,

    /// Payment frequency: <N>m, <N>w or <N>d
    #[arg(long)]
    periodicity: Option<String>,

    /// Loan start date (DD-MM-YYYY)
    #[arg(long)]
    start: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Table,
    Json,
}

impl LoanArgs {
    fn into_request(self) -> Result<LoanRequest> {
        if let Some(path) = self.input {
            let file = File::open(&path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            return serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("invalid loan request in {}", path.display()));
        }

        let (Some(amount), Some(rate), Some(payments), Some(periodicity), Some(start)) =
            (self.amount, self.rate, self.payments, self.periodicity, self.start)
        else {
            bail!("either --input or all of --amount, --rate, --payments, --periodicity and --start are required");
        };
        let loan_start_date = NaiveDate::parse_from_str(&start, REQUEST_DATE_FORMAT)
            .with_context(|| format!("invalid start date {start:?}, expected DD-MM-YYYY"))?;

        Ok(LoanRequest {
            amount,
            loan_start_date,
            number_of_payments: payments,
            periodicity,
            interest_rate: rate,
        })
    }

    fn into_loan(self) -> Result<Loan> {
        let terms: LoanTerms = self.into_request()?.into_terms()?;
        Loan::create(terms).context("failed to generate payment schedule")
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let loan = match cli.command {
        Command::Schedule(args) => args.into_loan()?,
        Command::Modify { loan, payment, principal } => {
            let mut loan = loan.into_loan()?;
            loan.modify_payment(payment, &principal)
                .with_context(|| format!("failed to modify payment {payment}"))?;
            loan
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.format {
        Format::Json => {
            serde_json::to_writer_pretty(&mut out, loan.payments())?;
            writeln!(out)?;
        }
        Format::Table => write_table(&mut out, &loan)?,
    }

    Ok(())
}

fn write_table(out: &mut impl Write, loan: &Loan) -> io::Result<()> {
    writeln!(
        out,
        "{:>4}  {:<10}  {:>14}  {:>12}  {:>14}",
        "id", "date", "principal", "interest", "balance"
    )?;
    for PaymentEntry { id, date, principal, interest, remaining_balance } in loan.payments() {
        writeln!(
            out,
            "{:>4}  {:<10}  {:>14.2}  {:>12.2}  {:>14.2}",
            id,
            date.format("%Y-%m-%d").to_string(),
            principal,
            interest,
            remaining_balance
        )?;
    }
    match (loan.total_principal(), loan.total_interest()) {
        (Some(principal), Some(interest)) => writeln!(
            out,
            "total principal {principal:.2}, total interest {interest:.2}"
        ),
        _ => writeln!(out, "totals out of range"),
    }
}
