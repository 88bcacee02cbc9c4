use anyhow::Context;
use menu_browser::{api::HttpBackend, config::ClientConfig, controller::Controller};

mod handlers;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(true)
        .with_file(false)
        .with_writer(std::io::stderr)
        .pretty()
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("fail to setup logging")?;

    let config = ClientConfig::load().context("fail to load configuration")?;
    tracing::info!("using backend at {}", config.base_url());

    let backend = HttpBackend::new(&config);
    let mut controller = Controller::new(backend, config);

    handlers::repl(&mut controller).await
}
