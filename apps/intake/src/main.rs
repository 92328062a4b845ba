use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    sync::Arc,
};

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use email_delivery::{EmailDelivery, EmailJsClient, MissingEmailDelivery};
use form_core::{FormController, SubmitOutcome};
use shared::{
    error::{ApiError, ErrorCode},
    questionnaire::{QuestionKind, QUESTIONS},
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod answers;
mod config;
mod fill;

use answers::{apply_assignments, read_answers_file, Assignment};
use config::{load_settings, Settings};

#[derive(Parser, Debug)]
#[command(name = "intake", about = "Fill in and send case reports")]
struct Cli {
    #[arg(long, default_value = "intake.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the questionnaire with its answer keys and options.
    Questions,
    /// Print the report for the given answers without sending it.
    Preview(AnswerArgs),
    /// Send the report for the given answers.
    Submit(AnswerArgs),
    /// Answer the questionnaire interactively, then optionally send it.
    Fill,
}

#[derive(Args, Debug)]
struct AnswerArgs {
    /// TOML or JSON file with (some of) the answers.
    #[arg(long)]
    answers: Option<PathBuf>,
    /// Single answer, e.g. --set gender=female.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<Assignment>,
    /// Checked option of a multi-select question, e.g. --check injuryType=aaa.
    #[arg(long = "check", value_name = "KEY=OPTION")]
    check: Vec<Assignment>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let settings = load_settings(&cli.config)?;

    match cli.command {
        Command::Questions => print_questions(),
        Command::Preview(args) => {
            let controller = build_controller(&settings, Arc::new(MissingEmailDelivery));
            load_answers(&controller, &args)?;
            print!("{}", controller.preview());
            Ok(())
        }
        Command::Submit(args) => {
            settings.ensure_delivery_configured()?;
            let delivery = Arc::new(EmailJsClient::new(settings.email_options())?);
            let controller = build_controller(&settings, delivery);
            load_answers(&controller, &args)?;
            match controller.submit().await {
                SubmitOutcome::Submitted => {
                    println!("Success: Case report submitted successfully!");
                    Ok(())
                }
                SubmitOutcome::Failed(error) => {
                    let notice = ApiError::new(ErrorCode::Delivery, error.to_string());
                    bail!("{} ({})", notice.title(), notice.message)
                }
                SubmitOutcome::AlreadySubmitting => bail!("a submission is already in progress"),
            }
        }
        Command::Fill => fill_interactively(&settings).await,
    }
}

fn build_controller(settings: &Settings, delivery: Arc<dyn EmailDelivery>) -> FormController {
    FormController::new(delivery, settings.delivery_target())
}

fn load_answers(controller: &FormController, args: &AnswerArgs) -> Result<()> {
    if let Some(path) = &args.answers {
        controller.load(read_answers_file(path)?);
    }
    apply_assignments(controller, &args.set, &args.check)
}

fn print_questions() -> Result<()> {
    let mut out = io::stdout().lock();
    for question in &QUESTIONS {
        let key = match question.kind {
            QuestionKind::Text { field, .. } | QuestionKind::Choice { field, .. } => field.as_str(),
            QuestionKind::MultiChoice { field, .. } => field.as_str(),
        };
        let options = question.options();
        writeln!(out, "{:>2}. {} [{key}]", question.number, question.prompt)?;
        if !options.is_empty() {
            writeln!(out, "    options: {}", options.join(" | "))?;
        }
        if let Some(satellite) = question.satellite {
            writeln!(
                out,
                "    {} [{}]",
                satellite.prompt,
                satellite.field.as_str()
            )?;
        }
    }
    Ok(())
}

async fn fill_interactively(settings: &Settings) -> Result<()> {
    let delivery: Arc<dyn EmailDelivery> = match settings.ensure_delivery_configured() {
        Ok(()) => Arc::new(EmailJsClient::new(settings.email_options())?),
        Err(err) => {
            warn!(%err, "email delivery not configured; reports can only be previewed");
            Arc::new(MissingEmailDelivery)
        }
    };
    let controller = build_controller(settings, delivery);

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    writeln!(output, "Case Report")?;
    writeln!(
        output,
        "After using XXX®, please take 1-2 minutes to fill out this short report as completely as possible."
    )?;
    if !fill::fill(&controller, &mut input, &mut output)? {
        writeln!(output)?;
        writeln!(output, "Input ended before the last question.")?;
    }

    writeln!(output)?;
    write!(output, "{}", controller.preview())?;
    submit_with_retry(&controller, &mut input, &mut output).await
}

async fn submit_with_retry(
    controller: &FormController,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<()> {
    let mut prompt = "Submit this report?";
    while fill::confirm(input, output, prompt)? {
        match controller.submit().await {
            SubmitOutcome::Submitted => {
                writeln!(output, "Success: Case report submitted successfully!")?;
                return Ok(());
            }
            SubmitOutcome::Failed(error) => {
                let notice = ApiError::new(ErrorCode::Delivery, error.to_string());
                writeln!(output, "Error: {} ({})", notice.title(), notice.message)?;
                prompt = "Retry with the same answers?";
            }
            SubmitOutcome::AlreadySubmitting => {
                writeln!(output, "A submission is already in progress.")?;
            }
        }
    }
    writeln!(output, "Report not sent.")?;
    Ok(())
}
