#![warn(clippy::pedantic)]
#![allow(clippy::too_many_lines)]

use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use archsym_core::{
    ArchGraphNode, ArchGraphSystem, BsgsOptions, Construction, Error, ReprMethod, ReprOptions,
    TaskAllocation, TaskOrbits, TransversalVariant, loader,
};
use clap::{Parser, ValueEnum, error::ErrorKind};
use itertools::Itertools;
use log::debug;

/// Computes architecture graph symmetries and symmetry-reduced task
/// mappings
#[derive(Parser)]
#[command(version, about)]
enum Commands {
    /// Print the automorphism group of an architecture description
    Autom {
        /// The architecture description file
        file: PathBuf,
        #[arg(long, value_enum, default_value = "deterministic")]
        construction: ConstructionArg,
        #[arg(long, value_enum, default_value = "explicit")]
        transversals: TransversalsArg,
    },
    /// Print canonical orbit representatives of task allocations
    Map {
        /// The architecture description file
        file: PathBuf,
        /// One allocation: the PE index per task
        #[arg(long, num_args = 1.., required = true)]
        tasks: Vec<usize>,
        #[arg(long, value_enum, default_value = "iterate")]
        method: MethodArg,
        /// Shift of the acting PE range
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Export a leaf architecture graph in DOT format
    Dot {
        /// The architecture description file
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ConstructionArg {
    Deterministic,
    Random,
    Solve,
}

#[derive(Clone, Copy, ValueEnum)]
enum TransversalsArg {
    Explicit,
    Tree,
}

#[derive(Clone, Copy, ValueEnum)]
enum MethodArg {
    Iterate,
    Orbits,
    LocalSearch,
}

// exit codes fixed by the front-end contract: 0 success, 1 usage error,
// 2 input parse error, 3 runtime error
const USAGE_ERROR: u8 = 1;
const PARSE_ERROR: u8 = 2;
const RUNTIME_ERROR: u8 = 3;

fn main() -> ExitCode {
    let _ = color_eyre::install();
    env_logger::init();

    let args = match Commands::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();

            return if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(USAGE_ERROR)
            };
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err((code, message)) => {
            eprintln!("error: {message}");
            ExitCode::from(code)
        }
    }
}

fn run(args: Commands) -> Result<(), (u8, String)> {
    match args {
        Commands::Autom {
            file,
            construction,
            transversals,
        } => {
            let mut system = load(&file)?;

            let options = BsgsOptions {
                construction: match construction {
                    ConstructionArg::Deterministic => Construction::Deterministic,
                    ConstructionArg::Random => Construction::Random,
                    ConstructionArg::Solve => Construction::Solve,
                },
                transversals: match transversals {
                    TransversalsArg::Explicit => TransversalVariant::Explicit,
                    TransversalsArg::Tree => TransversalVariant::SchreierTree,
                },
                ..BsgsOptions::default()
            };

            let group = system
                .automorphisms(&options)
                .map_err(|err| (RUNTIME_ERROR, err.to_string()))?;

            println!("degree: {}", group.degree());
            println!("order: {}", group.order());
            println!(
                "strong generators: [{}]",
                group.generators().iter().map(ToString::to_string).join(", ")
            );

            Ok(())
        }
        Commands::Map {
            file,
            tasks,
            method,
            offset,
        } => {
            let mut system = load(&file)?;

            debug!("mapping {tasks:?} over {} processors", system.num_processors());

            let options = ReprOptions {
                method: match method {
                    MethodArg::Iterate => ReprMethod::Iterate,
                    MethodArg::Orbits => ReprMethod::Orbits,
                    MethodArg::LocalSearch => ReprMethod::LocalSearch,
                },
                offset,
                ..ReprOptions::default()
            };

            let mut orbits = TaskOrbits::new();
            let mapping = system
                .repr(&TaskAllocation::new(tasks), Some(&mut orbits), &options)
                .map_err(|err| (RUNTIME_ERROR, err.to_string()))?;

            println!(
                "[{}] => [{}]",
                mapping.allocation().tasks().iter().join(", "),
                mapping.representative().tasks().iter().join(", ")
            );

            Ok(())
        }
        Commands::Dot { file } => {
            let system = load(&file)?;

            let ArchGraphNode::Graph(graph) = system.node() else {
                return Err((
                    RUNTIME_ERROR,
                    "dot export requires a leaf graph description".to_owned(),
                ));
            };

            print!("{}", graph.to_dot());
            Ok(())
        }
    }
}

fn load(path: &Path) -> Result<ArchGraphSystem, (u8, String)> {
    let text =
        fs::read_to_string(path).map_err(|err| (RUNTIME_ERROR, format!("{}: {err}", path.display())))?;

    loader::parse(&text).map_err(|err| {
        let code = if matches!(err, Error::Parse(_)) {
            PARSE_ERROR
        } else {
            RUNTIME_ERROR
        };

        (code, err.to_string())
    })
}
