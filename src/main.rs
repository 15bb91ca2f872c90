use clap::Parser;
use page_yield::{Scrape, ScrapeError, ScrapedContent};
use std::process::ExitCode;

mod args;
use args::Args;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    match run(&args).await {
        Ok(content) => match print_json(&content, args.pretty) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                ::log::error!("Failed to serialize result: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            ::log::error!("Scrape failed: {}", e);
            match print_json(&e.failure(), args.pretty) {
                Ok(json) => eprintln!("{}", json),
                Err(_) => eprintln!("{}", e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> Result<ScrapedContent, ScrapeError> {
    let mut scrape = Scrape::new(args.url.clone());

    if let Some(path) = &args.config {
        scrape = scrape.with_config_file(path)?;
    }
    if let Some(url) = &args.webdriver_url {
        scrape = scrape.with_webdriver_url(url.clone());
    }
    if args.no_dialog {
        scrape = scrape.with_dialog_handling(false);
    }
    if let Some(max) = args.max_images {
        scrape = scrape.with_max_images(max);
    }
    if let Some(max) = args.max_links {
        scrape = scrape.with_max_links(max);
    }

    match &args.html {
        Some(path) => {
            ::log::info!("Extracting {} from {}", args.url, path.display());
            let html = std::fs::read_to_string(path)
                .map_err(|e| ScrapeError::Config(format!("{}: {}", path.display(), e)))?;
            scrape.extract_html(&args.title, &html)
        }
        None => {
            log_webdriver_note();
            scrape.run().await
        }
    }
}

fn log_webdriver_note() {
    ::log::info!(
        "Rendering requires a WebDriver server (e.g., ChromeDriver); set WEBDRIVER_URL if not using http://localhost:4444"
    );
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}
