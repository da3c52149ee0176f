use anyhow::{Context, Result};
use cardlog_core::{
    DescriptionMatch, ExportFormat, NormalizeOptions, SignConvention, TransactionsPayload, normalize,
    write_csv_file,
};
use cardlog_ingest::capture::{chrome_capabilities, chromedriver};
use cardlog_ingest::prompt::{prompt, prompt_secret};
use cardlog_ingest::{Credentials, LiveCapture, ManualFeed, TransactionSource};
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::info;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

mod config;
mod state;

use config::{Config, ToolSection, load_config};

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("CARDLOG_BUILD_SHA"), ")");

const DEFAULT_CSV_OUTPUT: &str = "output.csv";

#[derive(Parser, Debug)]
#[command(name = "cardlog", version = VERSION, about = "Export FNBO card transactions to a simple ledger")]
struct Cli {
    /// Config file (default: ~/.cardlog/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Output options shared by both tools
#[derive(Args, Debug)]
struct OutputArgs {
    /// csv (ledger file) or text (date,amount,description lines)
    #[arg(long)]
    format: Option<ExportFormat>,

    /// Where to write the ledger; text goes to stdout when omitted
    #[arg(long)]
    output_file: Option<PathBuf>,

    /// as-reported or negated
    #[arg(long)]
    sign: Option<SignConvention>,

    /// How descriptions are compared with the payment marker: exact or trimmed
    #[arg(long = "match")]
    matching: Option<DescriptionMatch>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in through a browser, intercept the transactions request, and replay it for one large page
    Capture {
        /// Portal username (prompted if omitted)
        #[arg(long)]
        username: Option<String>,

        /// Portal password (prompted if omitted)
        #[arg(long)]
        password: Option<String>,

        /// Number of transactions to request (default: portal.page_size, 300)
        #[arg(long)]
        page_size: Option<u32>,

        /// Seconds to wait for the page's transactions request
        #[arg(long)]
        request_timeout: Option<u64>,

        /// Run Chrome without a window
        #[arg(long, default_value_t = false)]
        headless: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Build the ledger from a transactions response saved by hand
    Feed {
        /// Card account id used in the transactions URL (prompted if needed)
        #[arg(long)]
        account: Option<String>,

        /// pageSize for the printed URL (default: portal.page_size, 300)
        #[arg(long)]
        data_count: Option<u32>,

        /// Saved JSON response; when omitted the URL is printed and the path prompted
        #[arg(long)]
        data_file: Option<PathBuf>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config_file = cli.config.as_deref();

    match cli.command {
        Command::Capture {
            username,
            password,
            page_size,
            request_timeout,
            headless,
            output,
        } => {
            let cfg = load_config(config_file)?;
            let credentials = Credentials {
                username: match username {
                    Some(u) => u,
                    None => prompt("Username")?,
                },
                password: match password {
                    Some(p) => p,
                    None => prompt_secret("Password")?,
                },
            };

            let mut settings = cfg.portal.clone();
            if let Some(n) = page_size {
                settings.page_size = n;
            }
            if let Some(secs) = request_timeout {
                settings.request_timeout_secs = secs;
            }
            let mut webdriver = cfg.webdriver.clone();
            webdriver.headless |= headless;

            let (client, driver) = chromedriver::connect(&webdriver).await?;
            let fetched = async {
                let session = client
                    .new_session(chrome_capabilities(webdriver.headless, &webdriver.browser_args))
                    .await
                    .context("starting browser session")?;
                load(LiveCapture::new(session, credentials, settings)).await
            }
            .await;
            if let Some(driver) = driver {
                driver.shutdown().await;
            }

            let opts = cfg.capture.normalize_options(
                NormalizeOptions::live_capture(),
                output.sign,
                output.matching,
            );
            emit(&fetched?, opts, &cfg.capture, ExportFormat::Csv, output)?;
        }

        Command::Feed {
            account,
            data_count,
            data_file,
            output,
        } => {
            let cfg = load_config(config_file)?;
            let feed = ManualFeed::resolve(
                &cfg.portal.portal_url,
                account,
                data_count.unwrap_or(cfg.portal.page_size),
                data_file,
                &mut io::stdin().lock(),
                &mut io::stdout(),
            )?;

            let payload = load(feed).await?;
            let opts = cfg.feed.normalize_options(
                NormalizeOptions::manual_feed(),
                output.sign,
                output.matching,
            );
            emit(&payload, opts, &cfg.feed, ExportFormat::Text, output)?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config(config_file)?,
            ConfigCommand::Show => {
                let cfg: Config = load_config(config_file)?;
                println!("# {}", config::config_path(config_file)?.display());
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },
    }

    Ok(())
}

async fn load<S: TransactionSource>(source: S) -> Result<TransactionsPayload> {
    info!("Loading transactions from {}", source.describe());
    let payload = source.fetch().await?;
    info!(
        "Received {} transactions",
        payload.credit_card_transactions.len()
    );
    Ok(payload)
}

/// Normalize and write in the chosen format. CSV always lands in a file.
fn emit(
    payload: &TransactionsPayload,
    opts: NormalizeOptions,
    section: &ToolSection,
    base_format: ExportFormat,
    output: OutputArgs,
) -> Result<()> {
    let txns = normalize(payload, opts);
    info!(
        "Kept {} of {} transactions (sign={}, match={})",
        txns.len(),
        payload.credit_card_transactions.len(),
        opts.sign,
        opts.matching
    );

    let format = section.export_format(base_format, output.format);
    let output_file = output.output_file.or_else(|| section.output_file.clone());

    match (format, output_file) {
        (ExportFormat::Csv, path) => {
            let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_CSV_OUTPUT));
            write_csv_file(&path, &txns)?;
            info!("Wrote {} rows to {}", txns.len(), path.display());
        }
        (ExportFormat::Text, Some(path)) => write_text_file(&path, &txns)?,
        (ExportFormat::Text, None) => ExportFormat::Text.render(io::stdout().lock(), &txns)?,
    }
    Ok(())
}

fn write_text_file(path: &Path, txns: &[cardlog_core::Transaction]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    ExportFormat::Text.render(BufWriter::new(file), txns)?;
    info!("Wrote {} lines to {}", txns.len(), path.display());
    Ok(())
}
