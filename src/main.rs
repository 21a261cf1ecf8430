extern crate clap;
#[macro_use] extern crate log;
extern crate fern;
extern crate chrono;
extern crate term_grid;
extern crate osciasm;

use clap::{Arg, ArgMatches, App};
use term_grid::{Grid, GridOptions, Direction, Filling, Cell};

use osciasm::assembler::{self, symbols::SymbolTable, resolver::Assembler, eval::parse_number};

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

fn main() {
    let args = process_arguments();
    initialize_logging(args.occurrences_of("verbose"));

    debug!("Arguments:\n\tVerbosity: {}\n\tAST Only: {}\n\tOutfile: {}\n\tInfile: {}",
        match args.occurrences_of("verbose") {
            0 => log::LevelFilter::Error.to_string(),
            1 => log::LevelFilter::Warn.to_string(),
            2 => log::LevelFilter::Info.to_string(),
            3 | _ => log::LevelFilter::Debug.to_string(),
        },
        args.is_present("ast"),
        args.value_of("output").unwrap_or("<stdout>"),
        args.value_of("INPUT").unwrap_or_default()
    );

    let ifile = args.value_of("INPUT").unwrap_or_default();
    let ipath = Path::new(ifile);

    let text = match fs::read_to_string(&ipath) {
        Err(err) => {
            error!("fatal: unable to read input file `{}`: {}", ipath.display(), err);
            std::process::exit(1);
        },
        Ok(text) => text,
    };

    let ast = match assembler::parse(&text, ifile) {
        Err(err) => {
            error!("{}", err);
            std::process::exit(1);
        },
        Ok(ast) => ast,
    };
    let program = assembler::compile(ast);

    if args.is_present("ast") {
        for ins in program.iter() {
            println!("{}\t{}", ins.position(), ins);
        }
        return;
    }

    let mut symbols = SymbolTable::new();
    for define in args.values_of("define").into_iter().flatten() {
        match parse_define(define) {
            Some((name, value)) => { symbols.define(name, value); },
            None => {
                error!("fatal: invalid symbol definition `{}`, expected NAME=VALUE", define);
                std::process::exit(1);
            },
        }
    }

    let mut asm = Assembler::with_symbols(symbols);
    let fragments = match asm.listing(&program) {
        Err(err) => {
            error!("{}", err);
            std::process::exit(1);
        },
        Ok(fragments) => fragments,
    };

    if args.is_present("print-debug") {
        let mut grid = Grid::new(GridOptions {
            filling:     Filling::Spaces(1),
            direction:   Direction::LeftToRight,
        });

        let mut fragments_iter = fragments.iter().peekable();
        for ins in program.iter() {
            let fragment = fragments_iter.next_if(|f| f.position == *ins.position());
            let (address, words) = match fragment {
                Some(f) => (
                    format!("0x{:08X}:", f.address),
                    f.words().iter().map(|w| format!("{:08X}", w)).collect::<Vec<_>>().join(" "),
                ),
                None => (String::new(), String::new()),
            };
            grid.add(Cell::from(address));
            grid.add(Cell::from(format!("{}", ins)));
            grid.add(Cell::from("=>".to_string()));
            grid.add(Cell::from(words));
        }

        eprintln!("{}", grid.fit_into_columns(4));

        for (name, value) in asm.symbols().sorted() {
            debug!("symbol {} = {:#X}", name, value);
        }
    }

    let image = assembler::encoder::link(&fragments);

    let result = match args.value_of("output") {
        Some(filename) => {
            let opath = Path::new(filename);
            File::create(&opath).and_then(|mut ofile| ofile.write_all(&image))
                .map_err(|err| format!("unable to write to output file `{}`: {}", opath.display(), err))
        },
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(&image).and_then(|_| handle.flush())
                .map_err(|err| format!("unable to write to stdout: {}", err))
        },
    };

    if let Err(err) = result {
        error!("fatal: {}", err);
        std::process::exit(1);
    }
    info!("wrote {} byte(s)", image.len());
}

/// Parses a `NAME=VALUE` symbol definition. VALUE uses the same number
/// syntax as the assembler.
fn parse_define(define: &str) -> Option<(&str, i64)> {
    let mut parts = define.splitn(2, '=');
    let name = parts.next()?.trim();
    let value = parse_number(parts.next()?.trim()).ok()?;
    if name.is_empty() || !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    Some((name, value))
}

fn process_arguments() -> ArgMatches<'static> {
    App::new(option_env!("CARGO_PKG_NAME").unwrap_or("osciasm"))
        .version(option_env!("CARGO_PKG_VERSION").unwrap_or("unknown"))
        .author(option_env!("CARGO_PKG_AUTHORS").unwrap_or(""))
        .about(option_env!("CARGO_PKG_DESCRIPTION").unwrap_or(""))
        .arg(Arg::with_name("INPUT")
            .help("Sets the input file to use")
            .required(true)
            .multiple(false)
            .index(1))
        .arg(Arg::with_name("verbose")
            .short("v")
            .multiple(true)
            .takes_value(false)
            .help("Sets the level of verbosity"))
        .arg(Arg::with_name("output")
            .short("o")
            .takes_value(true)
            .help("write output to an outfile instead of STDOUT"))
        .arg(Arg::with_name("ast")
            .short("a")
            .long("ast")
            .takes_value(false)
            .help("print the parsed instructions with their postfix operands and stop"))
        .arg(Arg::with_name("define")
            .short("D")
            .takes_value(true)
            .multiple(true)
            .number_of_values(1)
            .help("predefine a symbol, as NAME=VALUE"))
        .arg(Arg::with_name("print-debug")
            .short("d")
            .alias("show")
            .alias("s")
            .takes_value(false)
            .help("prints an address listing alongside the assembly to STDERR"))
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
        .chain(std::io::stderr())
        .apply().ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_define() {
        assert_eq!(parse_define("answer=42"), Some(("answer", 42)));
        assert_eq!(parse_define("base = 0x80"), Some(("base", 0x80)));
        assert_eq!(parse_define("answer"), None);
        assert_eq!(parse_define("=1"), None);
        assert_eq!(parse_define("1x=1"), None);
        assert_eq!(parse_define("x=zz"), None);
    }
}
