use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use env_logger::Env;
use mosaicify::export::{normalize_file_name, CollisionPolicy, SystemViewer};
use mosaicify::Pipeline;

mod cli;

use cli::OnCollision;

fn main() -> Result<()> {
    let matches = cli::command().get_matches();
    let mut args = cli::parse(&matches)?;

    let level = if args.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_target(false)
        .init();

    let config = &mut args.config;
    if args.on_collision == OnCollision::Ask && config.choice.exports() && !config.file_name.is_empty() {
        config.file_name = confirm_file_name(&config.export_dir, &config.file_name)?;
        config.collision = CollisionPolicy::Overwrite;
    }

    let pipeline = Pipeline::new(args.config).context("Invalid mosaic settings.")?;
    let report = pipeline
        .run(&SystemViewer)
        .context("Failed to generate the mosaic.")?;

    if let Some(path) = &report.exported {
        println!("Exported to '{}'.", path.display());
    }
    println!(
        "All done: {}x{} tiles, {}x{} pixels in {:.1?}.",
        report.cols, report.rows, report.canvas_size.0, report.canvas_size.1, report.elapsed
    );
    Ok(())
}

fn prompt(question: &str) -> Result<String> {
    print!("{question}");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read the answer.")?;
    Ok(answer.trim().to_string())
}

/// Ask until the export name is free or the user agrees to override it.
/// An empty new name falls back to auto-naming.
fn confirm_file_name(export_dir: &Path, file_name: &str) -> Result<String> {
    let mut file_name = normalize_file_name(file_name);
    while export_dir.join(&file_name).exists() {
        let answer = prompt(&format!(
            "'{}' already exists, do you want to override it? (y/n): ",
            export_dir.join(&file_name).display()
        ))?;
        if answer.eq_ignore_ascii_case("y") {
            break;
        }
        let name = prompt("Please enter a new file name (empty for auto-naming): ")?;
        if name.is_empty() {
            return Ok(String::new());
        }
        file_name = normalize_file_name(&name);
    }
    Ok(file_name)
}
