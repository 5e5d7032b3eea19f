//! Command-line interface implementation

use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use crate::config::{load_config, AtlasdefConfig};
use crate::diagnostic::{CollectingSink, Diagnostic};
use crate::grouping::group_by_key_with;
use crate::loader::{FsLoader, RawTexture};
use crate::models::Definitions;
use crate::page::{FrameSelector, Strictness};
use crate::parser::{parse_definition, parse_metadata};
use crate::registry::{AtlasStore, PageHandle};
use crate::sequence::expand_checked;
use crate::tokenizer::{tokenize, TokenKind};

const EXIT_SUCCESS: u8 = 0;
const EXIT_ERROR: u8 = 1;
const EXIT_INVALID_ARGS: u8 = 2;

/// Atlasdef - inspect sprite atlases and compile animation definitions
#[derive(Parser)]
#[command(name = "atlasdef")]
#[command(about = "Inspect sprite atlases and compile animation definitions into frame sequences")]
#[command(version)]
pub struct Cli {
    /// Path to atlasdef.toml (default: search upward from the working directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the frame groups of an atlas metadata file
    Groups {
        /// Atlas metadata file (JSON or JSON5)
        metadata: PathBuf,
    },

    /// Print the tokens of a definition
    Tokens {
        definition: String,
    },

    /// Parse a definition and print its range specs and frame indices
    Parse {
        definition: String,
    },

    /// Load an atlas, apply definitions and print the resulting groups
    Expand {
        /// Atlas metadata file
        #[arg(short, long)]
        metadata: PathBuf,

        /// Atlas image file (read, never decoded)
        #[arg(short, long)]
        image: PathBuf,

        /// Animation definition as NAME=DEFINITION, e.g. heroWalk=0-3(2)
        #[arg(short, long = "define", value_parser = parse_define)]
        definitions: Vec<(String, String)>,

        /// Strict mode: any diagnostic rejects the definition
        #[arg(long)]
        strict: bool,
    },

    /// Load an atlas and query frames by group name, index, or START..END
    Frames {
        #[arg(short, long)]
        metadata: PathBuf,

        #[arg(short, long)]
        image: PathBuf,

        /// Group name, frame index, or index range (end exclusive)
        selector: String,
    },
}

fn parse_define(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, definition)) if !name.is_empty() => {
            Ok((name.to_string(), definition.to_string()))
        }
        _ => Err(format!("expected NAME=DEFINITION, got '{}'", s)),
    }
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    match cli.command {
        Commands::Groups { metadata } => run_groups(&metadata, &config),
        Commands::Tokens { definition } => run_tokens(&definition),
        Commands::Parse { definition } => run_parse(&definition),
        Commands::Expand {
            metadata,
            image,
            definitions,
            strict,
        } => {
            let mut config = config;
            if strict {
                config.definitions.strictness = Strictness::Strict;
            }
            config.animations.extend(definitions);
            block_on(run_expand(&metadata, &image, config))
        }
        Commands::Frames {
            metadata,
            image,
            selector,
        } => block_on(run_frames(&metadata, &image, &selector, config)),
    }
}

fn block_on<F: std::future::Future<Output = ExitCode>>(future: F) -> ExitCode {
    match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime.block_on(future),
        Err(e) => {
            eprintln!("Error: Cannot start runtime: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn print_diagnostics(prefix: &str, diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("{}: {}", prefix, diagnostic.render());
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: Cannot serialize output: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn run_groups(metadata: &Path, config: &AtlasdefConfig) -> ExitCode {
    let text = match std::fs::read_to_string(metadata) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: Cannot open metadata file '{}': {}", metadata.display(), e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };
    let atlas = match parse_metadata(&text) {
        Ok(atlas) => atlas,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let groups: BTreeMap<String, Vec<String>> =
        group_by_key_with(&atlas.frames, config.grouping.order)
            .into_iter()
            .map(|(key, frames)| (key, frames.into_iter().map(|f| f.name).collect()))
            .collect();
    print_json(&groups)
}

fn run_tokens(definition: &str) -> ExitCode {
    let (tokens, diagnostics) = tokenize(definition);
    for token in &tokens {
        match token.kind {
            TokenKind::Number => {
                println!("{:>4}  {} {}", token.position, token.kind, token.value)
            }
            _ => println!("{:>4}  {}", token.position, token.kind),
        }
    }
    print_diagnostics("Warning", &diagnostics);
    ExitCode::from(EXIT_SUCCESS)
}

fn run_parse(definition: &str) -> ExitCode {
    let result = parse_definition(definition);
    let (indices, too_long) = expand_checked(&result.specs);
    print_diagnostics("Warning", &result.diagnostics);
    print_diagnostics("Warning", &too_long);
    let output = serde_json::json!({
        "specs": result.specs,
        "indices": indices,
    });
    print_json(&output)
}

/// Build the page for `image` through an atlas store configured from `config`.
async fn load_page(
    metadata: &Path,
    image: &Path,
    config: &AtlasdefConfig,
    definitions: Option<&Definitions>,
    sink: &Arc<CollectingSink>,
) -> Result<PageHandle<RawTexture>, ExitCode> {
    let loader = match &config.atlas.root {
        Some(root) => FsLoader::with_root(root),
        None => FsLoader::new(),
    };
    let store = AtlasStore::new(loader, config.cache_options()).with_sink(sink.clone());
    let atlas = store.atlas(&config.atlas.id);

    let image = image.to_string_lossy();
    let metadata = metadata.to_string_lossy();
    atlas
        .get_or_build_page(&image, &metadata, definitions)
        .await
        .map_err(|e| {
            print_diagnostics("Warning", &sink.take());
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        })
}

async fn run_expand(metadata: &Path, image: &Path, config: AtlasdefConfig) -> ExitCode {
    let sink = Arc::new(CollectingSink::new());
    let definitions = config.animations.clone();
    let page = match load_page(metadata, image, &config, Some(&definitions), &sink).await {
        Ok(page) => page,
        Err(code) => return code,
    };
    print_diagnostics("Warning", &sink.take());

    let groups: BTreeMap<String, Vec<String>> = page
        .groups()
        .into_iter()
        .filter(|(name, _)| definitions.is_empty() || definitions.contains_key(name))
        .map(|(name, frames)| (name, frames.into_iter().map(|f| f.name).collect()))
        .collect();
    print_json(&groups)
}

async fn run_frames(metadata: &Path, image: &Path, selector: &str, config: AtlasdefConfig) -> ExitCode {
    let sink = Arc::new(CollectingSink::new());
    let definitions = config.animations.clone();
    let page = match load_page(metadata, image, &config, Some(&definitions), &sink).await {
        Ok(page) => page,
        Err(code) => return code,
    };

    let selector: FrameSelector = match selector.parse() {
        Ok(selector) => selector,
        Err(never) => match never {},
    };
    let frames = page.get_frames(&selector, sink.as_ref());
    print_diagnostics("Warning", &sink.take());
    print_json(&frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_define() {
        assert_eq!(
            parse_define("heroWalk=0-3(2)"),
            Ok(("heroWalk".to_string(), "0-3(2)".to_string()))
        );
        assert_eq!(
            parse_define("a=b=c"),
            Ok(("a".to_string(), "b=c".to_string()))
        );
        assert!(parse_define("=0").is_err());
        assert!(parse_define("walk").is_err());
    }

    #[test]
    fn test_cli_parses_expand() {
        let cli = Cli::try_parse_from([
            "atlasdef",
            "expand",
            "-m",
            "hero.json",
            "-i",
            "hero.png",
            "-d",
            "walk=0-2",
            "-d",
            "idle=0(4)",
            "--strict",
        ])
        .unwrap();
        match cli.command {
            Commands::Expand {
                definitions,
                strict,
                ..
            } => {
                assert_eq!(definitions.len(), 2);
                assert!(strict);
            }
            _ => panic!("expected expand"),
        }
    }
}
