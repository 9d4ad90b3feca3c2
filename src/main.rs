use clap::Parser;
use tutorial_check::core::ConfigProvider;
use tutorial_check::core::report::write_json_report;
use tutorial_check::utils::{logger, validation::Validate};
use tutorial_check::{CheckEngine, CliConfig, CommandVerifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::debug!("CLI config: {:?}", cli);

    let settings = match cli.resolve().and_then(|s| s.validate().map(|_| s)) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let verifier = CommandVerifier::new(
        settings.verifier_program.clone(),
        settings.verifier_args.clone(),
        settings.timeout(),
    )
    .with_target_dir(settings.target_dir());
    tracing::debug!(
        "Verifier timeout {:?}, shared target dir {}",
        verifier.timeout(),
        settings.target_dir().display()
    );
    let engine = CheckEngine::from_config(&settings, verifier)?;

    let report = match engine.run(std::io::stdout()).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("❌ Tutorial check aborted: {} ({:?})", e, e.category());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    if let Some(path) = &cli.report {
        if let Err(e) = write_json_report(&report, path) {
            tracing::error!("❌ Could not write JSON report: {}", e);
            std::process::exit(1);
        }
    }

    std::process::exit(report.exit_code());
}
