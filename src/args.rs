use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "page-yield")]
#[command(about = "Renders a page in a browser and extracts markdown and structured data")]
#[command(version)]
pub struct Args {
    /// Page URL (http or https)
    pub url: String,

    /// Path to a JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// WebDriver server URL (overrides the configuration)
    #[arg(short, long)]
    pub webdriver_url: Option<String>,

    /// Extract from a saved HTML file instead of opening a browser
    #[arg(long)]
    pub html: Option<PathBuf>,

    /// Title to report when extracting from --html
    #[arg(long, default_value = "")]
    pub title: String,

    /// Skip cookie-consent dialog handling
    #[arg(long)]
    pub no_dialog: bool,

    /// Maximum number of images in the output
    #[arg(long)]
    pub max_images: Option<usize>,

    /// Maximum number of links in the output
    #[arg(long)]
    pub max_links: Option<usize>,

    /// Pretty-print the JSON output
    #[arg(short, long)]
    pub pretty: bool,
}
