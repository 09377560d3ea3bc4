use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = marketplace::arguments::Arguments::parse();
    let config = observe::Config::new(&args.log_filter, Some(tracing::Level::ERROR), args.log_json);
    observe::tracing::initialize(&config);
    tracing::info!("running marketplace with validated arguments:\n{}", args);
    marketplace::run::run(args).await
}
