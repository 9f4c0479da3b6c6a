use anyhow::Result;
use clap::Parser;
use ghidra_bundle::config::Config;
use ghidra_bundle::github::GitHub;
use ghidra_bundle::pipeline::{self, OutputFormat, PackageOptions};
use ghidra_bundle::runtime::RealRuntime;
use std::path::PathBuf;
use std::time::Duration;

const USER_AGENT: &str = concat!("ghidra-bundle/", env!("CARGO_PKG_VERSION"));

/// ghidra-bundle - package Ghidra releases into a macOS application bundle
///
/// Fetches a Ghidra release archive (or uses a local one), unpacks it into a
/// pre-built .app skeleton, optionally bundles a JDK or the Graal VM and any
/// extension zips, and wraps the result as a dmg or tarball.
#[derive(Parser, Debug)]
#[command(author, about)]
struct Cli {
    /// Ghidra zip URL. Defaults to the latest release from GitHub
    #[arg(short, long)]
    url: Option<String>,

    /// Path to a Ghidra zip or install directory
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Construct a DMG file for distribution (the default)
    #[arg(short, long, conflicts_with = "tar")]
    dmg: bool,

    /// Construct a tar file for distribution
    #[arg(short, long)]
    tar: bool,

    /// Set the version for the bundle. Eg: "9.1 BETA"
    #[arg(short = 'v', long)]
    version: Option<String>,

    /// Do an in-place upgrade of an app bundle
    #[arg(long)]
    app: Option<PathBuf>,

    /// Path to a Ghidra extension zip to install (repeatable)
    #[arg(long = "extension")]
    extensions: Vec<PathBuf>,

    /// Print available Ghidra versions
    #[arg(long)]
    list_versions: bool,

    /// Path to a JDK zip or directory to bundle
    #[arg(short, long, conflicts_with = "graal")]
    jdk: Option<PathBuf>,

    /// Bundle the Graal VM for Python3 support
    #[arg(long)]
    graal: bool,

    /// App bundle skeleton to stage from
    #[arg(long, value_name = "PATH", default_value = "Ghidra.app")]
    skeleton: PathBuf,

    /// GitHub API URL (defaults to https://api.github.com)
    #[arg(long = "api-url", value_name = "URL")]
    api_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let runtime = RealRuntime;
    let config = Config::new(&runtime, cli.api_url.clone());

    // The API client gets a hard timeout; the download client only bounds
    // connection setup, since release archives can take minutes to fetch.
    let api = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()?;
    let http = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(30))
        .build()?;
    let github = GitHub::new(api, config.api_url.clone());

    if cli.list_versions {
        println!("Available Ghidra versions from GitHub:");
        for version in pipeline::list_versions(&github, &config).await? {
            println!("\t{}", version);
        }
        return Ok(());
    }

    let output = if cli.tar {
        OutputFormat::Tar
    } else {
        OutputFormat::Dmg
    };

    let opts = PackageOptions {
        url: cli.url,
        path: cli.path,
        version: cli.version,
        app: cli.app,
        skeleton: cli.skeleton,
        jdk: cli.jdk,
        graal: cli.graal,
        extensions: cli.extensions,
        output,
        out_dir: PathBuf::from("."),
    };

    pipeline::run(&runtime, &github, &http, &config, opts).await
}
