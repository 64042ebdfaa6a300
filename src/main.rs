// Copyright 2025 dentsusoken
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use clap::{Parser, Subcommand};
use cjdk::commands::{self, GlobalArgs};
use cjdk::error::{format_error_chain, get_exit_code};
use cjdk::logging;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cjdk")]
#[command(author, version, about = "Cache and run a specific JDK without installing it system-wide", long_about = None)]
struct Cli {
    /// JDK specifier, e.g. "adoptium:17" or "17+" (equivalent to --vendor/--version)
    #[arg(short = 'j', long, global = true, value_name = "VENDOR:VERSION")]
    jdk: Option<String>,

    /// Directory to use for the cache (must be absolute)
    #[arg(long, global = true, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// URL of the JDK index JSON
    #[arg(long, global = true, value_name = "URL")]
    index_url: Option<String>,

    /// How long, in seconds, to consider a cached index fresh
    #[arg(long, global = true, value_name = "SECONDS")]
    index_ttl: Option<f64>,

    /// Override OS name (default: autodetected)
    #[arg(long, global = true, value_name = "NAME")]
    os: Option<String>,

    /// Override CPU architecture name (default: autodetected)
    #[arg(long, global = true, value_name = "NAME")]
    arch: Option<String>,

    /// Show a progress bar for downloads and extraction
    #[arg(long, global = true)]
    progress: bool,

    /// Suppress the progress bar
    #[arg(long, global = true, conflicts_with = "progress")]
    no_progress: bool,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn global_args(&self) -> GlobalArgs {
        let progress = if self.progress {
            Some(true)
        } else if self.no_progress {
            Some(false)
        } else {
            None
        };
        GlobalArgs {
            jdk: self.jdk.clone(),
            cache_dir: self.cache_dir.clone(),
            index_url: self.index_url.clone(),
            index_ttl: self.index_ttl,
            os: self.os.clone(),
            arch: self.arch.clone(),
            progress,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved Java home, installing the JDK if missing
    JavaHome,

    /// Set JAVA_HOME/PATH for the requested JDK, then run PROG
    Exec {
        prog: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Pre-warm the cache for the requested JDK
    #[command(alias = "cache_jdk", hide = true)]
    Cache,

    /// Cache an arbitrary file, downloading it if necessary
    CacheFile {
        url: String,
        filename: String,
        #[arg(long, value_name = "SECONDS")]
        ttl: Option<f64>,
        #[arg(long, conflicts_with_all = ["sha256", "sha512"])]
        sha1: Option<String>,
        #[arg(long, conflicts_with_all = ["sha1", "sha512"])]
        sha256: Option<String>,
        #[arg(long, conflicts_with_all = ["sha1", "sha256"])]
        sha512: Option<String>,
        #[arg(long)]
        name: Option<String>,
    },

    /// Cache an arbitrary tgz/zip package, downloading and extracting it if necessary
    CachePackage {
        url: String,
        #[arg(long, conflicts_with_all = ["sha256", "sha512"])]
        sha1: Option<String>,
        #[arg(long, conflicts_with_all = ["sha1", "sha512"])]
        sha256: Option<String>,
        #[arg(long, conflicts_with_all = ["sha1", "sha256"])]
        sha512: Option<String>,
        #[arg(long)]
        name: Option<String>,
    },

    /// List JDK vendors named in the index
    LsVendors,

    /// List JDK versions (cached by default; --available lists everything the index knows)
    Ls {
        #[arg(long, conflicts_with = "available")]
        cached: bool,
        #[arg(long)]
        available: bool,
    },

    /// Remove the entire cache directory
    ClearCache,
}

fn main() {
    let cli = Cli::parse();
    logging::setup_logger(cli.verbose);

    let result: cjdk::error::Result<()> = (|| match &cli.command {
        Commands::JavaHome => commands::java_home::execute(cli.global_args().into_builder()),
        Commands::Exec { prog, args } => commands::exec::execute(cli.global_args().into_builder(), prog, args),
        Commands::Cache => commands::cache_jdk::execute(cli.global_args().into_builder()),
        Commands::CacheFile {
            url,
            filename,
            ttl,
            sha1,
            sha256,
            sha512,
            name,
        } => commands::cache_file::execute(
            url,
            filename,
            *ttl,
            sha1.clone(),
            sha256.clone(),
            sha512.clone(),
            name.clone(),
            cli.global_args().into_builder(),
        ),
        Commands::CachePackage {
            url,
            sha1,
            sha256,
            sha512,
            name,
        } => commands::cache_package::execute(
            url,
            sha1.clone(),
            sha256.clone(),
            sha512.clone(),
            name.clone(),
            cli.global_args().into_builder(),
        ),
        Commands::LsVendors => commands::ls_vendors::execute(cli.global_args().into_builder()),
        Commands::Ls { cached: _, available } => commands::ls::execute(cli.global_args().into_builder(), !available),
        Commands::ClearCache => commands::clear_cache::execute(cli.global_args().into_builder()),
    })();

    if let Err(e) = result {
        eprintln!("{}", format_error_chain(&e));
        std::process::exit(get_exit_code(&e));
    }
}
