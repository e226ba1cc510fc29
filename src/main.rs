use std::process::ExitCode;
use std::sync::Arc;

use ai_lint::analysis::Analyzer;
use ai_lint::cli::{self, args::Args};
use ai_lint::config::Config;
use ai_lint::infrastructure::logging::{setup_logging, LoggingConfig};
use ai_lint::ingress::{IngressAdapter, TesseractExtractor};
use ai_lint::report::Report;
use clap::Parser;

async fn run(args: &Args, config: &Config) -> anyhow::Result<bool> {
    let analyzer = Analyzer::from_config(config)?;
    let ingress = IngressAdapter::new().with_extractor(Arc::new(TesseractExtractor::from_config(config)));

    let input = cli::read_input(args).await?;
    let source = ingress.resolve(input).await?;
    tracing::debug!(
        "Resolved {} bytes of {} (fallback: {})",
        source.code.len(),
        source.language,
        source.language_fallback
    );

    let result = analyzer.analyze(&source.code, &source.language).await?;
    let report = Report::new(&result, &source.language, source.language_fallback);
    println!("{}", report.render(args.format)?);

    Ok(result.success)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    let mut config = Config::new();

    config.update_from_args(&args);
    config.validate()?;
    setup_logging(LoggingConfig::from_config(&config))?;

    match run(&args, &config).await {
        Ok(true) => Ok(ExitCode::SUCCESS),
        Ok(false) => Ok(ExitCode::FAILURE),
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("❌ {:#}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}
