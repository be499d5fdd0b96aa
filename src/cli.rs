use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use thiserror::Error;

use crate::core::{
    CURRENCY_PREFIX, Catalog, CatalogError, Feedback, HealthCheckForm, HealthReport, InputError,
    QuizEngine, QuizView,
};

const QUIZ_HELP: &str = "Commands: <number> select, n next, p previous, r restart, q quit";
const PROGRESS_WIDTH: usize = 20;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(
    name = "finwiz",
    about = "Financial literacy quiz, health check, and student finance directory"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        help = "JSON catalog replacing the built-in quiz bank and directories"
    )]
    pub catalog: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        help = "Log filter used when RUST_LOG is unset, e.g. debug"
    )]
    pub log_level: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the JSON API over HTTP
    Serve(ServeArgs),
    /// Compute savings rate, debt-to-income ratio, and advice
    Health(HealthArgs),
    /// Take the financial literacy quiz in the terminal
    Quiz,
    /// List lenders, advice resources, and student groups
    Directory(DirectoryArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
    #[arg(value_name = "PORT", help = "Positional form of --port")]
    pub port_arg: Option<u16>,
}

impl ServeArgs {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port_arg.unwrap_or(self.port))
    }
}

#[derive(Args, Debug)]
pub struct HealthArgs {
    #[arg(long, default_value = "", help = "Monthly income (RM)")]
    pub income: String,
    #[arg(long, default_value = "", help = "Monthly expenses (RM)")]
    pub expenses: String,
    #[arg(long, default_value = "", help = "Total monthly debt payments (RM)")]
    pub debt: String,
    #[arg(long, help = "Reject malformed amounts instead of treating them as 0")]
    pub strict: bool,
    #[arg(long, help = "Print the report as JSON")]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct DirectoryArgs {
    #[arg(long, help = "List every advice resource instead of the first few")]
    pub all: bool,
}

pub fn load_catalog(cli: &Cli) -> Result<Catalog, CliError> {
    let catalog = Catalog::load_or_builtin(cli.catalog.as_deref())?;
    match &cli.catalog {
        Some(path) => tracing::info!(
            path = %path.display(),
            questions = catalog.quiz.len(),
            "loaded catalog"
        ),
        None => tracing::debug!(questions = catalog.quiz.len(), "using built-in catalog"),
    }
    Ok(catalog)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthJson<'a> {
    income: f64,
    expenses: f64,
    debt: f64,
    report: &'a HealthReport,
}

pub fn run_health<W: Write>(args: &HealthArgs, out: &mut W) -> Result<(), CliError> {
    let mut form = HealthCheckForm {
        income: args.income.clone(),
        expenses: args.expenses.clone(),
        debt: args.debt.clone(),
        ..HealthCheckForm::default()
    };
    if args.strict {
        form.submit_strict()?;
    } else {
        form.submit();
    }
    let Some((inputs, report)) = form.submitted() else {
        return Ok(());
    };

    if args.json {
        let body = HealthJson {
            income: inputs.income,
            expenses: inputs.expenses,
            debt: inputs.debt,
            report,
        };
        serde_json::to_writer_pretty(&mut *out, &body)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "Results:")?;
    writeln!(out, "Savings Rate: {}%", report.savings_rate_display())?;
    writeln!(out, "Debt-to-Income Ratio: {}%", report.debt_to_income_display())?;
    writeln!(
        out,
        "Emergency Fund Target: {CURRENCY_PREFIX} {}",
        report.emergency_fund_display()
    )?;
    writeln!(out, "Advice:")?;
    for tip in &report.advice {
        writeln!(out, "  - {tip}")?;
    }
    Ok(())
}

pub fn run_directory<W: Write>(catalog: &Catalog, show_all: bool, out: &mut W) -> io::Result<()> {
    writeln!(out, "Lender Organizations")?;
    for lender in &catalog.lenders {
        writeln!(out, "  {} <{}>", lender.name, lender.url)?;
        writeln!(out, "    {}", lender.description)?;
    }

    writeln!(out, "\nStudent Telegram Groups")?;
    for group in &catalog.community_groups {
        writeln!(out, "  {} <{}>", group.title, group.url)?;
        writeln!(out, "    {}", group.description)?;
    }

    writeln!(out, "\nFinancial Advice Resources")?;
    for resource in catalog.visible_resources(show_all) {
        writeln!(
            out,
            "  {} [{}] <{}>",
            resource.title, resource.platform, resource.url
        )?;
    }
    if !show_all && catalog.has_more_resources() {
        let hidden = catalog.resources.len() - catalog.visible_resources(false).len();
        writeln!(out, "  ... {hidden} more (use --all)")?;
    }
    Ok(())
}

/// Interactive quiz loop. Returns when the user quits or input ends.
pub fn run_quiz<R: BufRead, W: Write>(
    engine: &mut QuizEngine,
    input: R,
    out: &mut W,
) -> io::Result<()> {
    render_quiz(&engine.view(), out)?;
    for line in input.lines() {
        let line = line?;
        let command = line.trim();
        match command {
            "" => {}
            "q" | "quit" => break,
            "n" | "next" => {
                if !engine.next() {
                    writeln!(out, "Choose an answer first.")?;
                }
            }
            "p" | "prev" | "previous" => {
                if !engine.previous() {
                    writeln!(out, "Already at the first question.")?;
                }
            }
            "r" | "restart" => engine.reset(),
            other => match other.parse::<usize>() {
                Ok(choice) => select_by_number(engine, choice, out)?,
                Err(_) => writeln!(out, "Unknown command {other:?}. {QUIZ_HELP}")?,
            },
        }
        render_quiz(&engine.view(), out)?;
    }
    Ok(())
}

fn select_by_number<W: Write>(
    engine: &mut QuizEngine,
    choice: usize,
    out: &mut W,
) -> io::Result<()> {
    if engine.state().is_finished() {
        return writeln!(out, "The quiz is over. Press r to try again.");
    }
    let option = choice
        .checked_sub(1)
        .and_then(|i| engine.bank().get(engine.state().current_index)?.options.get(i))
        .cloned();
    match option {
        Some(option) => {
            if !engine.select_option(option) {
                writeln!(out, "Answer already shown. Press n to continue.")?;
            }
        }
        None => writeln!(out, "No option {choice}.")?,
    }
    Ok(())
}

fn render_quiz<W: Write>(view: &QuizView, out: &mut W) -> io::Result<()> {
    match view {
        QuizView::Finished { summary, .. } => {
            writeln!(out, "\nYour Score: {summary}")?;
            writeln!(out, "Press r to try again or q to quit.")?;
        }
        QuizView::InProgress(question) => {
            let filled =
                (question.progress_percent / 100.0 * PROGRESS_WIDTH as f64).round() as usize;
            writeln!(
                out,
                "\nQuestion {} of {} [{}{}]",
                question.number,
                question.total,
                "#".repeat(filled.min(PROGRESS_WIDTH)),
                "-".repeat(PROGRESS_WIDTH - filled.min(PROGRESS_WIDTH)),
            )?;
            writeln!(out, "{}", question.prompt)?;
            for (i, option) in question.options.iter().enumerate() {
                let marker = if option.selected { '*' } else { ' ' };
                let feedback = match option.feedback {
                    Some(Feedback::Correct) => "  ✓ Correct",
                    Some(Feedback::Incorrect) => "  ✗ Incorrect",
                    None => "",
                };
                writeln!(out, " {marker}{}) {}{feedback}", i + 1, option.text)?;
            }
            let mut actions = Vec::new();
            if question.can_go_previous {
                actions.push("p Previous");
            }
            if question.can_go_next {
                actions.push(if question.next_label == "Finish" {
                    "n Finish"
                } else {
                    "n Next"
                });
            }
            if !actions.is_empty() {
                writeln!(out, "[{}]", actions.join("] ["))?;
            }
        }
    }
    out.flush()
}
