//! folio-dl command-line driver

use anyhow::Context;
use clap::{ArgGroup, Parser};
use folio_dl::{
    AccountSession, Config, Credentials, Error, FolioApi, HttpTransport, IssueFilter, QpdfEngine,
    Reconstructor, magazines,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "folio-dl", version)]
#[command(about = "Download purchased magazine issues as decrypted PDF files", long_about = None)]
#[command(group(
    ArgGroup::new("action")
        .required(true)
        .args(["list", "all", "from", "single"])
))]
struct Cli {
    /// List all available issues
    #[arg(long)]
    list: bool,

    /// Download all available issues
    #[arg(long)]
    all: bool,

    /// Download all issues starting with the specified number
    #[arg(long, value_name = "NUMBER", value_parser = clap::value_parser!(u32).range(1..))]
    from: Option<u32>,

    /// Download the single issue with the specified number
    #[arg(long, value_name = "NUMBER", value_parser = clap::value_parser!(u32).range(1..))]
    single: Option<u32>,

    /// Account email (default: $FOLIO_DL_EMAIL)
    #[arg(long)]
    email: Option<String>,

    /// Account password (default: $FOLIO_DL_PASSWORD)
    #[arg(long)]
    password: Option<String>,

    /// Resume an existing account identifier instead of creating one
    #[arg(long, env = "FOLIO_DL_UID")]
    uid: Option<String>,

    /// Publication to download (default: Edge)
    #[arg(short, long)]
    magazine: Option<String>,

    /// Output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn filter(&self) -> IssueFilter {
        match (self.single, self.from) {
            (Some(n), _) => IssueFilter::Single(n),
            (None, Some(n)) => IssueFilter::From(n),
            (None, None) => IssueFilter::All,
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("folio_dl=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("folio_dl=info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            let code = e
                .downcast_ref::<Error>()
                .map(Error::exit_code)
                .unwrap_or(1);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(magazine) = &cli.magazine {
        config.magazine = magazine.clone();
    }
    if let Some(dir) = &cli.output {
        config.output.dir = dir.clone();
    }

    // Everything that can be checked locally fails before the first request
    let magazine = *magazines::lookup(&config.magazine)?;
    let credentials = Credentials::resolve(cli.email.as_deref(), cli.password.as_deref())?;
    let engine = if cli.list {
        None
    } else {
        Some(Arc::new(QpdfEngine::from_config(&config.output)?))
    };

    let cancel = CancellationToken::new();
    tokio::spawn(folio_dl::cancel_on_shutdown(cancel.clone()));

    let transport = Arc::new(HttpTransport::new(&config.api)?);
    let api = FolioApi::new(transport, cancel.clone());
    let session = match cli.uid.as_deref().filter(|uid| !uid.trim().is_empty()) {
        Some(uid) => AccountSession::restore(api, magazine, uid, &config).await?,
        None => AccountSession::establish(api, magazine, &config).await?,
    };
    session.login(&credentials, &config.login).await?;
    info!(magazine = magazine.name, uid = %session.account_id(), "logged in");

    let issues = session.issues().await?;

    let Some(engine) = engine else {
        for issue in &issues {
            println!("{}. {}", issue.number, issue.title);
        }
        return Ok(ExitCode::SUCCESS);
    };

    let filter = cli.filter();
    let selected = filter.select(&issues)?;
    let reconstructor = Reconstructor::new(engine, &magazine, &config, cancel)?;

    if let IssueFilter::Single(_) = filter {
        for issue in selected {
            let outcome = reconstructor.reconstruct_with_retry(issue).await?;
            println!("{}", outcome.path().display());
        }
        return Ok(ExitCode::SUCCESS);
    }

    if selected.is_empty() {
        warn!("no issues match the selection");
    }

    let report = reconstructor.reconstruct_all(&selected).await;
    if report.was_cancelled() {
        return Err(Error::Cancelled.into());
    }
    for path in &report.written {
        println!("{}", path.display());
    }
    if !report.is_success() {
        for failure in &report.failed {
            error!(issue = %failure.number, title = %failure.title, "not downloaded");
        }
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}
