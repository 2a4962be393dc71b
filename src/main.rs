use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = gmail_launcher::cli::Cli::parse();
    gmail_launcher::telemetry::init(cli.verbose);

    if let Err(err) = gmail_launcher::run(cli).await {
        tracing::error!(error = %err, "command failed");
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
