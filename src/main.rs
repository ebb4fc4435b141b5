extern crate clap;
#[macro_use]
extern crate log;
extern crate chrono;
extern crate fern;
extern crate term_grid;

pub mod assembler;

use clap::{App, Arg, ArgMatches};
use term_grid::{Cell, Direction, Filling, Grid, GridOptions};

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

fn main() {
    let args = process_arguments();
    initialize_logging(args.occurrences_of("verbose"));

    let ifile = args.value_of("INPUT").unwrap();
    let ipath = Path::new(ifile);

    debug!(
        "Arguments:\n\tVerbosity: {}\n\tCheck Only: {}\n\tOutfile: {}\n\tInfile: {}",
        args.occurrences_of("verbose"),
        args.is_present("check"),
        args.value_of("output").unwrap_or("None"),
        ifile
    );

    // Open the path in read-only mode, returns `io::Result<File>`
    let source = match File::open(&ipath) {
        Err(err) => {
            error!(
                "fatal: unable to open input file `{}`: {}",
                ipath.display(),
                err
            );
            std::process::exit(1);
        }
        Ok(file) => file,
    };

    if args.is_present("check") {
        check_lexical(ifile, source);
    }

    let ast = match assembler::parser::parse_file(ifile, source) {
        Err(err) => {
            error!("{}: {}", ifile, err);
            std::process::exit(1);
        }
        Ok(file) => file,
    };

    let print_debug = args.is_present("print-debug");
    let mut image: Vec<u8> = Vec::new();
    let mut grid = Grid::new(GridOptions {
        filling: Filling::Spaces(1),
        direction: Direction::LeftToRight,
    });

    for statement in &ast.statements {
        let offset = image.len();
        if let Err(err) = assembler::encoding::encode(statement, &mut image) {
            error!("{}: {}", ast.filename, err);
            std::process::exit(1);
        }

        if print_debug {
            grid.add(Cell::from(format!("0x{:04X}:", offset)));
            grid.add(Cell::from(format!("{}", statement)));
            grid.add(Cell::from("=>".to_string()));
            grid.add(Cell::from(
                image[offset..]
                    .iter()
                    .map(|byte| format!("{:02X}", byte))
                    .collect::<Vec<_>>()
                    .join(" "),
            ));
        }
    }

    if print_debug {
        println!("{}", grid.fit_into_columns(4));
    }

    let opath = if let Some(filename) = args.value_of("output") {
        PathBuf::from(filename)
    } else {
        ipath.with_extension("bin")
    };

    let mut ofile = match File::create(&opath) {
        Err(err) => {
            error!(
                "fatal: unable to open output file `{}`: {}",
                opath.display(),
                err
            );
            std::process::exit(1);
        }
        Ok(file) => file,
    };

    if let Err(err) = ofile.write_all(&image) {
        error!(
            "fatal: unable to write to output file `{}`: {}",
            opath.display(),
            err
        );
        std::process::exit(1);
    }

    debug!("wrote {} byte(s) to `{}`", image.len(), opath.display());
}

/// Scans the whole input and reports every lexical error in one run,
/// then exits. Unlike the assembly pipeline, this mode does not stop
/// at the first diagnostic.
fn check_lexical(filename: &str, source: File) -> ! {
    let (tokens, errors) = match assembler::lexer::tokenize(source) {
        Err(err) => {
            error!("fatal: unable to read input file `{}`: {}", filename, err);
            std::process::exit(1);
        }
        Ok(scanned) => scanned,
    };

    for err in &errors {
        error!("{}: {}", filename, err);
    }
    info!(
        "{}: scanned {} token(s), {} lexical error(s)",
        filename,
        tokens.len(),
        errors.len()
    );

    std::process::exit(if errors.is_empty() { 0 } else { 1 });
}

fn process_arguments() -> ArgMatches<'static> {
    App::new(option_env!("CARGO_PKG_NAME").unwrap())
        .version(option_env!("CARGO_PKG_VERSION").unwrap())
        .about(option_env!("CARGO_PKG_DESCRIPTION").unwrap())
        .arg(
            Arg::with_name("INPUT")
                .help("Sets the input file to use")
                .required(true)
                .multiple(false)
                .index(1),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .takes_value(false)
                .help("Sets the level of verbosity"),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .takes_value(true)
                .help("write output to an outfile"),
        )
        .arg(
            Arg::with_name("check")
                .short("c")
                .takes_value(false)
                .help("scan the input for lexical errors and exit"),
        )
        .arg(
            Arg::with_name("print-debug")
                .short("d")
                .alias("show")
                .alias("s")
                .takes_value(false)
                .help("prints each statement and its encoding to STDOUT"),
        )
        .get_matches()
}

fn initialize_logging(verbosity: u64) {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(match verbosity {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Warn,
            2 => log::LevelFilter::Info,
            3 | _ => log::LevelFilter::Debug,
        })
        .chain(std::io::stdout())
        .apply()
        .ok();
}
