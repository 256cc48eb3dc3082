//! Punto de entrada ("driver").
//!
//! Este módulo orquesta las diferentes fases del proceso de
//! compilación, así como la ejecución de imágenes, y expone una CLI.

use anyhow::{self, Context};
use clap::{self, crate_version, Arg, ArgMatches, Command};
use lpn::{
    target,
    vm::{Image, Machine},
};

use std::{fs::File, io::Write, path::Path, process};

/// Imagen que se ejecuta si no se indica otra.
const DEFAULT_IMAGE: &str = "programa.mem";

fn main() -> anyhow::Result<()> {
    // Parsing de CLI
    let args = Command::new("LPN toolchain")
        .version(crate_version!())
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .multiple_occurrences(true)
                .global(true)
                .help("Increase log verbosity"),
        )
        .subcommand(
            Command::new("compile")
                .about("Translate an LPN program to assembly")
                .arg(
                    Arg::new("source")
                        .required(true)
                        .value_name("SOURCE")
                        .help("Source file (.lpn)"),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .takes_value(true)
                        .value_name("FILE")
                        .help("Output file ('-' for stdout), defaults to SOURCE with .asm"),
                ),
        )
        .subcommand(
            Command::new("run")
                .about("Execute a binary memory image")
                .arg(
                    Arg::new("image")
                        .value_name("IMAGE")
                        .default_value(DEFAULT_IMAGE)
                        .help("Memory image file"),
                ),
        )
        .get_matches();

    let level = match args.occurrences_of("verbose") {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match args.subcommand() {
        Some(("compile", args)) => compile(args),
        Some(("run", args)) => run(args),
        _ => unreachable!("clap allowed a missing subcommand"),
    }
}

fn compile(args: &ArgMatches) -> anyhow::Result<()> {
    let source_path = args.value_of("source").unwrap();
    let source = std::fs::read_to_string(source_path)
        .with_context(|| format!("Failed to read source file: {}", source_path))?;

    let compilation = match lpn::compile(&source) {
        Ok(compilation) => compilation,

        // Error fatal: nada se escribe
        Err(diagnostics) => {
            eprint!("{}", diagnostics);
            process::exit(1);
        }
    };

    eprint!("{}", compilation.diagnostics);

    let output = match args.value_of("output") {
        Some(output) => output.to_owned(),
        None => Path::new(source_path)
            .with_extension("asm")
            .to_string_lossy()
            .into_owned(),
    };

    match output.as_str() {
        // Salida a stdout
        "-" => {
            let stdout = std::io::stdout();
            let mut stdout = stdout.lock();
            target::emit(&compilation.assembly, &mut stdout).context("Failed to emit to stdout")?;
        }

        // Salida a archivo
        path => {
            let mut file = File::create(path)
                .with_context(|| format!("Failed to open for writing: {}", path))?;

            target::emit(&compilation.assembly, &mut file)
                .and_then(|()| file.flush())
                .with_context(|| format!("Failed to emit to file: {}", path))?;

            tracing::info!(output = path, "assembly written");
        }
    }

    Ok(())
}

fn run(args: &ArgMatches) -> anyhow::Result<()> {
    let path = args.value_of("image").unwrap();
    let image = Image::read(path).with_context(|| format!("Failed to load image: {}", path))?;

    let mut machine = Machine::new(image);
    let registers = machine.run();

    print!("{}", machine.dump());
    print!("{}", registers);

    Ok(())
}
