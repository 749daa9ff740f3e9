use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{arg, builder::PossibleValue, value_parser, Arg, ArgAction, ArgMatches, Command, ValueEnum};
use mosaicify::color::Comparison;
use mosaicify::export::CollisionPolicy;
use mosaicify::{Choice, MosaicConfig};

/// Collision handling offered on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum OnCollision {
    Ask,
    Policy(CollisionPolicy),
}

impl ValueEnum for OnCollision {
    fn value_variants<'a>() -> &'a [Self] {
        &[
            OnCollision::Ask,
            OnCollision::Policy(CollisionPolicy::Overwrite),
            OnCollision::Policy(CollisionPolicy::AutoRename),
            OnCollision::Policy(CollisionPolicy::Fail),
        ]
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        match self {
            OnCollision::Ask => {
                Some(PossibleValue::new("ask").help("Ask whether to override or pick a new name."))
            }
            OnCollision::Policy(policy) => policy.to_possible_value(),
        }
    }
}

pub(crate) fn command() -> Command {
    Command::new("mosaicify")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Rebuilds a target image as a mosaic of images from a library directory.")
        .arg(
            Arg::new("library")
                .help("Directory of images used as mosaic tiles")
                .required(true)
                .index(1)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("target")
                .help("Image to reproduce")
                .required(true)
                .index(2)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            arg!(-q --quality [QUALITY] "Tile edge length in target pixels; 1 is the finest and slowest")
                .value_parser(value_parser!(u32).range(1..))
                .default_value("8"),
        )
        .arg(
            arg!(-s --size [SIZE] "Edge length of each library image in the result")
                .value_parser(value_parser!(u32).range(1..))
                .default_value("16"),
        )
        .arg(
            arg!(-c --choice [CHOICE] "Show the result, export it, or both")
                .value_parser(value_parser!(Choice))
                .default_value("both"),
        )
        .arg(
            Arg::new("file_name")
                .help("Export file name; omitted or empty picks result_<n>.jpg")
                .short('n')
                .long("file-name")
                .value_name("FILE_NAME"),
        )
        .arg(
            Arg::new("export_dir")
                .help("Directory to export into, created if absent")
                .short('e')
                .long("export-dir")
                .value_name("EXPORT_DIR")
                .value_parser(value_parser!(PathBuf))
                .default_value("."),
        )
        .arg(
            Arg::new("scan_database")
                .help("Rebuild the library's color index before matching")
                .long("scan-database")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("probe_size")
                .help("Edge length library images are shrunk to when scanning")
                .short('p')
                .long("probe-size")
                .value_name("PROBE_SIZE")
                .value_parser(value_parser!(u32).range(1..))
                .default_value("32"),
        )
        .arg(
            Arg::new("index_dir")
                .help("Directory holding color index files")
                .long("index-dir")
                .value_name("INDEX_DIR")
                .value_parser(value_parser!(PathBuf))
                .default_value("."),
        )
        .arg(
            arg!(--comparison [COMPARISON] "Distance comparison used when matching tiles")
                .value_parser(value_parser!(Comparison))
                .default_value("mean"),
        )
        .arg(
            Arg::new("on_collision")
                .help("What to do when the export file already exists")
                .long("on-collision")
                .value_name("ON_COLLISION")
                .value_parser(value_parser!(OnCollision))
                .default_value("ask"),
        )
        .arg(
            Arg::new("quiet")
                .help("Hide progress bars and stage messages")
                .long("quiet")
                .action(ArgAction::SetTrue),
        )
}

fn required<'a, T: Clone + Send + Sync + 'static>(matches: &'a ArgMatches, id: &str) -> Result<&'a T> {
    matches
        .get_one::<T>(id)
        .with_context(|| format!("missing argument '{id}'"))
}

/// Parsed arguments, before any interactive collision handling
pub(crate) struct Args {
    pub(crate) config: MosaicConfig,
    pub(crate) on_collision: OnCollision,
    pub(crate) quiet: bool,
}

pub(crate) fn parse(matches: &ArgMatches) -> Result<Args> {
    let quiet = matches.get_flag("quiet");
    let on_collision = *required::<OnCollision>(matches, "on_collision")?;
    let mut config = MosaicConfig::new(
        required::<PathBuf>(matches, "library")?.clone(),
        required::<PathBuf>(matches, "target")?.clone(),
    );
    config.tile_size = *required::<u32>(matches, "quality")?;
    config.render_size = *required::<u32>(matches, "size")?;
    config.probe_size = *required::<u32>(matches, "probe_size")?;
    config.choice = *required::<Choice>(matches, "choice")?;
    config.comparison = *required::<Comparison>(matches, "comparison")?;
    config.file_name = matches
        .get_one::<String>("file_name")
        .map(|name| name.trim().to_string())
        .unwrap_or_default();
    config.export_dir = required::<PathBuf>(matches, "export_dir")?.clone();
    config.index_dir = required::<PathBuf>(matches, "index_dir")?.clone();
    config.rescan = matches.get_flag("scan_database");
    config.show_progress = !quiet;
    if let OnCollision::Policy(policy) = on_collision {
        config.collision = policy;
    }
    Ok(Args {
        config,
        on_collision,
        quiet,
    })
}
