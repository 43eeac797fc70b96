use anyhow::Result as AnyResult;
use clap::{arg, value_parser, ArgMatches, Command};
use log::info;
use mimalloc::MiMalloc;
use pdf_filter::{
    chunk::DEFAULT_CHUNK_SIZE, params, FilterName, FilterOptions, FilterParameters, Pipeline,
    Strictness,
};
use std::{
    fs::File,
    io::{stdin, stdout, BufWriter, Read, Write},
    path::PathBuf,
};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn filter_args(cmd: Command) -> Command {
    cmd.arg(
        arg!(-f <filename> "Input file, read stdin if omitted")
            .value_parser(value_parser!(PathBuf)),
    )
    .arg(
        arg!(--filter <name> "Filter name, repeat in stream Filter entry order")
            .required(true)
            .action(clap::ArgAction::Append),
    )
    .arg(
        arg!(--predictor <predictor> "Predictor of LZW and Flate filters")
            .value_parser(value_parser!(i32)),
    )
    .arg(
        arg!(--colors <colors> "Color components per sample")
            .value_parser(value_parser!(i32)),
    )
    .arg(
        arg!(--bpc <bpc> "Bits per color component")
            .value_parser(value_parser!(i32)),
    )
    .arg(
        arg!(--columns <columns> "Samples per row")
            .value_parser(value_parser!(i32)),
    )
    .arg(
        arg!(--"early-change" <early_change> "LZW EarlyChange, default: 1")
            .value_parser(value_parser!(i32)),
    )
    .arg(arg!(--strict "Fail on truncated predictor rows"))
    .arg(
        arg!(--"chunk-size" <size> "Bytes read per chunk, 0 reads all at once")
            .value_parser(value_parser!(usize)),
    )
}

fn cli() -> Command {
    Command::new("filter-dump")
        .about("Decode or encode data with PDF stream filters")
        .subcommand_required(true)
        .subcommand(filter_args(
            Command::new("decode").about("decode filtered data to stdout"),
        ))
        .subcommand(filter_args(
            Command::new("encode").about("encode data to stdout, decode gives it back"),
        ))
}

fn parameters(m: &ArgMatches) -> FilterParameters {
    let entries = [
        (params::KEY_PREDICTOR, "predictor"),
        (params::KEY_COLORS, "colors"),
        (params::KEY_BITS_PER_COMPONENT, "bpc"),
        (params::KEY_COLUMNS, "columns"),
        (params::KEY_EARLY_CHANGE, "early-change"),
    ];
    FilterParameters::from_entries(
        entries
            .into_iter()
            .filter_map(|(key, arg)| m.get_one::<i32>(arg).map(|v| (key, *v))),
    )
}

fn pipeline(m: &ArgMatches) -> AnyResult<Pipeline> {
    let params = parameters(m);
    let options = FilterOptions {
        chunk_size: m
            .get_one::<usize>("chunk-size")
            .copied()
            .unwrap_or(DEFAULT_CHUNK_SIZE),
        strictness: if m.get_flag("strict") {
            Strictness::Strict
        } else {
            Strictness::Lenient
        },
    };

    let mut p = Pipeline::new(options);
    for name in m.get_many::<String>("filter").into_iter().flatten() {
        let name = FilterName::parse(name)?;
        let params = if name.accepts_predictor() {
            params
        } else {
            FilterParameters::default()
        };
        p = p.push(name, params);
    }
    Ok(p)
}

/// Read `r` in chunks of `size` bytes, all at once if `size` is zero.
fn read_chunks(
    mut r: impl Read,
    size: usize,
) -> impl Iterator<Item = pdf_filter::Result<Vec<u8>>> {
    let mut done = false;
    std::iter::from_fn(move || {
        if done {
            return None;
        }
        let mut buf = vec![];
        let n = if size == 0 {
            done = true;
            r.read_to_end(&mut buf)
        } else {
            (&mut r).take(size as u64).read_to_end(&mut buf)
        };
        match n {
            Ok(0) if size != 0 => None,
            Ok(_) => Some(Ok(buf)),
            Err(e) => {
                done = true;
                Some(Err(e.into()))
            }
        }
    })
}

fn run(m: &ArgMatches, encode: bool) -> AnyResult<()> {
    let p = pipeline(m)?;
    info!(
        "{} with {:?}",
        if encode { "encode" } else { "decode" },
        p.filters()
    );

    let input: Box<dyn Read> = match m.get_one::<PathBuf>("filename") {
        Some(path) => Box::new(File::open(path)?),
        None => Box::new(stdin().lock()),
    };
    let source = read_chunks(input, p.options().chunk_size);
    let chunks = if encode {
        p.encode(source)?
    } else {
        p.decode(source)?
    };

    let mut out = BufWriter::new(stdout().lock());
    for chunk in chunks {
        out.write_all(&chunk?)?;
    }
    out.flush()?;
    Ok(())
}

fn main() -> AnyResult<()> {
    env_logger::init();

    match cli().get_matches().subcommand() {
        Some(("decode", sub_m)) => run(sub_m, false),
        Some(("encode", sub_m)) => run(sub_m, true),
        _ => unreachable!("subcommand required"),
    }
}
