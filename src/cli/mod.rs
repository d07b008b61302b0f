use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cryodrgn_io::particles::AlignType;

mod command;
mod config;
mod epochs;
mod info;
mod write_star;

/// cryodrgn-io - Relion STAR export and cryoDRGN helpers
#[derive(Parser)]
#[command(name = "cryodrgn-io")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a particle set (JSON) as a Relion 3.1 STAR file
    WriteStar {
        /// Particle set in JSON
        #[arg(value_name = "PARTICLES")]
        input: PathBuf,

        /// Output STAR file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Link or convert referenced stacks into this directory
        #[arg(short = 'o', long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Alignment convention (none, 2D, projection)
        #[arg(short = 'a', long, value_name = "TYPE")]
        align_type: Option<AlignType>,

        /// Leave out CTF columns
        #[arg(long)]
        no_ctf: bool,

        /// Convert stacks even when a link would do
        #[arg(long)]
        force_convert: bool,

        /// Copy every image into this single new stack
        #[arg(long, value_name = "FILE")]
        output_stack: Option<PathBuf>,

        /// Print the file mapping as JSON
        #[arg(long)]
        print_mapping: bool,

        /// Load settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Display the tables of a STAR file
    Info {
        /// Input STAR file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// List column labels
        #[arg(short, long)]
        columns: bool,
    },

    /// Show the last completed epoch of a training directory
    Epochs {
        /// cryoDRGN training output directory
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },

    /// Show (or run) the shell line for a cryoDRGN program
    Command {
        /// cryoDRGN sub-program, e.g. train_vae
        #[arg(value_name = "PROGRAM")]
        program: String,

        /// GPU devices, comma separated
        #[arg(long, value_delimiter = ',', value_name = "IDS")]
        gpus: Option<Vec<u32>>,

        /// Load launcher settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Run the program instead of printing the line
        #[arg(long)]
        run: bool,

        /// Arguments passed to the program
        #[arg(last = true, value_name = "ARGS")]
        args: Vec<String>,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::WriteStar {
            input,
            output,
            output_dir,
            align_type,
            no_ctf,
            force_convert,
            output_stack,
            print_mapping,
            config,
        } => write_star::run(write_star::Options {
            input,
            output,
            output_dir,
            align_type,
            no_ctf,
            force_convert,
            output_stack,
            print_mapping,
            config,
        }),
        Commands::Info { file, columns } => info::run(file, columns),
        Commands::Epochs { dir } => epochs::run(dir),
        Commands::Command {
            program,
            gpus,
            config,
            run,
            args,
        } => command::run(program, gpus, config, run, args),
    }
}
