use clap::{Parser, Subcommand};
use leaflet_offline::catalog::AssetKind;
use leaflet_offline::features::Plugins;
use leaflet_offline::fetch::{self, FetchOptions, HttpSource};
use leaflet_offline::save::{SaveError, SaveOptions};
use leaflet_offline::{audit, config, output, rewrite, save};
use std::path::{Path, PathBuf};

/// Optional plugin groups, shared by `fetch` and `embed`.
#[derive(clap::Args, Clone, Copy)]
struct PluginArgs {
    /// Time animation assets (TimeDimension, moment, iso8601)
    #[arg(long)]
    with_time: bool,
    /// Animated track assets (leaflet-ant-path)
    #[arg(long)]
    with_antpath: bool,
    /// Marker clustering assets (leaflet.markercluster)
    #[arg(long)]
    with_clustering: bool,
    /// Drawing tool assets (leaflet.draw)
    #[arg(long)]
    with_draw: bool,
}

impl From<PluginArgs> for Plugins {
    fn from(args: PluginArgs) -> Self {
        Plugins {
            time: args.with_time,
            ant_path: args.with_antpath,
            clustering: args.with_clustering,
            draw: args.with_draw,
        }
    }
}

#[derive(Parser)]
#[command(name = "leaflet-offline")]
#[command(about = "Make Leaflet map documents work without network access")]
#[command(long_about = "\
Make Leaflet map documents work without network access

Map generators write HTML that loads Leaflet and its plugins from public CDNs.
`fetch` downloads those assets into a directory once; `embed` rewrites a saved
map so it loads them from that directory or carries them inline.

  leaflet-offline fetch --dir assets --with-time
  leaflet-offline embed map.html --output map.offline.html --assets assets --strict

Asset directory layout (flat, one file per catalog entry):

  assets/
  ├── .offline-assets.json         # What was fetched, from where, with SHA-256
  ├── leaflet.js
  ├── leaflet.css
  ├── jquery-3.7.1.min.js
  └── ...

Run 'leaflet-offline catalog' to list every known asset and its filename.
Run 'leaflet-offline gen-config' to generate a documented config file.")]
#[command(version)]
struct Cli {
    /// Config file (stock defaults apply when it does not exist)
    #[arg(long, default_value = config::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download catalog assets into a directory
    Fetch {
        /// Target directory (created if absent)
        #[arg(long)]
        dir: PathBuf,
        #[command(flatten)]
        plugins: PluginArgs,
        /// Keep files that already exist instead of downloading them again
        #[arg(long)]
        skip_existing: bool,
    },
    /// Rewrite a map document to use local assets
    Embed {
        /// Map document to read
        input: PathBuf,
        /// Where to write the rewritten document
        #[arg(long, short)]
        output: PathBuf,
        /// Directory of fetched assets
        #[arg(long)]
        assets: Option<PathBuf>,
        /// Explicit asset file, as KIND=PATH (repeatable)
        #[arg(long = "asset", value_name = "KIND=PATH", value_parser = parse_asset_override)]
        asset_files: Vec<(AssetKind, PathBuf)>,
        /// Link to local files instead of inlining their content
        #[arg(long)]
        link: bool,
        /// Fail unless every required asset is local
        #[arg(long)]
        strict: bool,
        #[command(flatten)]
        plugins: PluginArgs,
        /// Write links relative to the output file's directory
        #[arg(long)]
        relative: bool,
        /// Tile URL template replacing OpenStreetMap tiles
        #[arg(long, value_name = "TEMPLATE")]
        tiles: Option<String>,
    },
    /// List asset references and remote URLs in a document
    Check {
        /// Map document to inspect
        input: PathBuf,
    },
    /// Print the asset catalog
    Catalog,
    /// Print a stock config file with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Fetch {
            dir,
            plugins,
            skip_existing,
        } => {
            let config = config::load_config(&cli.config)?;
            let source = HttpSource::new(&config.fetch)?;
            let options = FetchOptions {
                skip_existing,
                ..FetchOptions::from_config(&config)
            };
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_fetch_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = fetch::fetch(&dir, &plugins.into(), &source, &options, Some(tx));
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            let report = result?;
            println!();
            output::print_fetch_report(&report);
            if !report.is_complete() {
                std::process::exit(2);
            }
        }
        Command::Embed {
            input,
            output: output_path,
            assets,
            asset_files,
            link,
            strict,
            plugins,
            relative,
            tiles,
        } => {
            let config = config::load_config(&cli.config)?;
            let document = std::fs::read_to_string(&input)?;
            let defaults = SaveOptions::from_config(&config);
            let link_base = (relative || config.save.relative_links)
                .then(|| output_dir(&output_path));
            let options = SaveOptions {
                offline_assets_dir: assets,
                assets_map: asset_files.into_iter().collect(),
                embed_assets: defaults.embed_assets && !link,
                strict_offline: defaults.strict_offline || strict,
                plugins: plugins.into(),
                link_base,
                tiles_template: tiles,
                ..defaults
            };
            match save::save(&document, &output_path, &options) {
                Ok(report) => output::print_save_report(&report),
                Err(SaveError::MissingAssets(missing)) => {
                    eprintln!("Refusing to write {}: {}", output_path.display(), missing);
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::Check { input } => {
            let config = config::load_config(&cli.config)?;
            let document = std::fs::read_to_string(&input)?;
            let references = rewrite::find_references(&document, &config.catalog());
            output::print_check(&references, &audit::remote_urls(&document));
        }
        Command::Catalog => {
            let config = config::load_config(&cli.config)?;
            output::print_catalog(&config.catalog());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Parse a `KIND=PATH` asset override.
fn parse_asset_override(raw: &str) -> Result<(AssetKind, PathBuf), String> {
    let (kind, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KIND=PATH, got `{raw}`"))?;
    let kind: AssetKind = kind.trim().parse().map_err(|e| format!("{e}"))?;
    if path.is_empty() {
        return Err(format!("missing path for `{kind}`"));
    }
    Ok((kind, PathBuf::from(path)))
}

/// Directory that relative links are computed against.
fn output_dir(output: &Path) -> PathBuf {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
