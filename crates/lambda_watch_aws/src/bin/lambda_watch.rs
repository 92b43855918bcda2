use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use aws_sdk_lambda::config::Region;
use clap::{Parser, Subcommand};
use lambda_watch_aws::adapters::cloudwatch::CloudWatchLogPlatform;
use lambda_watch_aws::adapters::deploy::AwsLambdaUploader;
use lambda_watch_aws::adapters::invoke::AwsLambdaInvoker;
use lambda_watch_aws::config::{default_config_path, init_config, load_config, AppConfig};
use lambda_watch_aws::handlers::deploy::deploy_functions;
use lambda_watch_aws::handlers::test_run::run_invocation_test;
use lambda_watch_aws::logging::init_logging;
use lambda_watch_aws::packaging::DEFAULT_PATH_FILTER;
use lambda_watch_aws::templates::load_event_template;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "lambda_watch",
    about = "Deploy Lambda functions and watch single invocations through CloudWatch Logs"
)]
struct Cli {
    /// Configuration file (defaults to ~/.lambda_watch/conf.json)
    #[arg(long, env = "LAMBDA_WATCH_CONFIG", global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the default configuration file
    Config,
    /// Package and deploy Lambda functions found under the source path
    Deploy {
        /// Glob over function directories, relative to the source path
        #[arg(default_value = DEFAULT_PATH_FILTER)]
        filter: String,
    },
    /// Invoke a function once and print the logs of that invocation
    Test {
        function_name: String,
        /// JSON event template with {{variable}} placeholders
        event_template: PathBuf,
        /// Give up after this many seconds (overrides the configured timeout)
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

// ── helpers ────────────────────────────────────────────────────────

async fn load_aws_config(config: &AppConfig) -> aws_config::SdkConfig {
    aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(config.aws.region.clone()))
        .load()
        .await
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt_received");
            trigger.cancel();
        }
    });
    cancel
}

// ── commands ───────────────────────────────────────────────────────

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };

    match cli.command {
        Commands::Config => {
            init_config(&config_path)?;
            println!("Saved configuration at {}", config_path.display());
        }
        Commands::Deploy { filter } => {
            let config = load_config(&config_path)?;
            println!("Path filter: {filter}");
            println!("Source path: {}", config.source_path.display());
            println!("Deploy path: {}", config.deploy_path.display());
            println!("Target region: {}", config.aws.region);

            let aws_config = load_aws_config(&config).await;
            let uploader = AwsLambdaUploader::new(aws_sdk_lambda::Client::new(&aws_config));
            let deployed =
                deploy_functions(&uploader, &config.source_path, &config.deploy_path, &filter)
                    .await?;
            for function in &deployed {
                println!(
                    "{:?} {} ({})",
                    function.outcome,
                    function.function_name,
                    function.archive_path.display()
                );
            }
            println!("Deployment completed");
        }
        Commands::Test {
            function_name,
            event_template,
            timeout_secs,
        } => {
            let config = load_config(&config_path)?;
            let event = load_event_template(&event_template, &config.variables)
                .with_context(|| format!("cannot load event for {function_name}"))?;
            let mut settings = config.watch.clone();
            if timeout_secs.is_some() {
                settings.timeout_secs = timeout_secs;
            }

            let aws_config = load_aws_config(&config).await;
            let invoker = AwsLambdaInvoker::new(aws_sdk_lambda::Client::new(&aws_config));
            let platform =
                CloudWatchLogPlatform::new(aws_sdk_cloudwatchlogs::Client::new(&aws_config));

            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            run_invocation_test(
                &invoker,
                &platform,
                &function_name,
                &event,
                &settings,
                cancel_on_ctrl_c(),
                &mut out,
            )
            .await?;
        }
    }

    Ok(())
}

// ── main ───────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %format!("{err:#}"), "command_failed");
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
