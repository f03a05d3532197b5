use anyhow::{Context, Result};
use clap::Parser;
use huffpack::{Container, Frequencies, Node};
use log::LevelFilter;
use std::{
    fs::{self, File},
    io::{stdin, stdout, BufRead, BufReader, Write},
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[clap(about = "Huffman compression of files")]
pub struct Options {
    #[clap(flatten)]
    global: GlobalOptions,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Parser)]
pub struct GlobalOptions {
    /// More log output, repeat for more detail.
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors.
    #[clap(short, long, global = true)]
    quiet: bool,
}

#[derive(Parser)]
pub enum Command {
    Compress(CompressOptions),
    Decompress(DecompressOptions),
    Codes(CodesOptions),
}

pub trait Runnable {
    fn run(&self, global: &GlobalOptions) -> Result<()>;
}

/// Input path from the command line, or asked for on stdin.
fn input_path(file: &Option<PathBuf>) -> Result<PathBuf> {
    if let Some(file) = file {
        return Ok(file.clone());
    }

    print!("Please enter the file path: ");
    stdout().flush()?;
    let mut line = String::new();
    stdin().lock().read_line(&mut line)?;
    let line = line.trim_end_matches(['\r', '\n']);
    anyhow::ensure!(!line.is_empty(), "no file path given");
    Ok(line.into())
}

/// `notes.txt` becomes `notesCompressed.bin` next to it.
fn compressed_path(input: &Path) -> PathBuf {
    let mut name = input.file_stem().unwrap_or_default().to_os_string();
    name.push("Compressed.bin");
    input.with_file_name(name)
}

/// `output.txt` in the directory of the input.
fn decompressed_path(input: &Path) -> PathBuf {
    input.with_file_name("output.txt")
}

#[derive(Parser)]
pub struct CompressOptions {
    /// Output file, defaults to `<stem>Compressed.bin` beside the input.
    #[clap(short, long)]
    output: Option<PathBuf>,
    file: Option<PathBuf>,
}

impl Runnable for CompressOptions {
    fn run(&self, _global: &GlobalOptions) -> Result<()> {
        let input = input_path(&self.file)?;
        let output = self
            .output
            .clone()
            .unwrap_or_else(|| compressed_path(&input));

        let data = fs::read(&input).with_context(|| format!("reading {}", input.display()))?;
        let container =
            Container::encode(&data).with_context(|| format!("compressing {}", input.display()))?;

        let compressed = container.to_vec()?;
        fs::write(&output, &compressed).with_context(|| format!("writing {}", output.display()))?;

        println!(
            "File compressed successfully: {} ({} bytes -> {} bytes)",
            output.display(),
            data.len(),
            compressed.len()
        );
        Ok(())
    }
}

#[derive(Parser)]
pub struct DecompressOptions {
    /// Output file, defaults to `output.txt` beside the input.
    #[clap(short, long)]
    output: Option<PathBuf>,
    file: Option<PathBuf>,
}

impl Runnable for DecompressOptions {
    fn run(&self, _global: &GlobalOptions) -> Result<()> {
        let input = input_path(&self.file)?;
        let output = self
            .output
            .clone()
            .unwrap_or_else(|| decompressed_path(&input));

        let file = File::open(&input).with_context(|| format!("opening {}", input.display()))?;
        let restored = Container::read_from(BufReader::new(file))
            .and_then(|container| container.decode())
            .with_context(|| format!("decompressing {}", input.display()))?;
        fs::write(&output, &restored).with_context(|| format!("writing {}", output.display()))?;

        println!(
            "Decoding complete! Check the output file: {}",
            output.display()
        );
        Ok(())
    }
}

#[derive(Parser)]
pub struct CodesOptions {
    file: Option<PathBuf>,
}

impl Runnable for CodesOptions {
    fn run(&self, _global: &GlobalOptions) -> Result<()> {
        let input = input_path(&self.file)?;
        let file = File::open(&input).with_context(|| format!("opening {}", input.display()))?;
        let frequencies = Frequencies::count(BufReader::new(file))?;
        let encoder = Node::from_frequencies(&frequencies)?.encoder();

        let mut codes: Vec<_> = encoder.iter().collect();
        codes.sort_by_key(|(symbol, _)| *symbol);

        let mut out = stdout().lock();
        for (symbol, code) in codes {
            let bits: String = code
                .iter()
                .by_vals()
                .map(|bit| if bit { '1' } else { '0' })
                .collect();
            let count = frequencies.get(symbol).unwrap_or_default();
            writeln!(out, "{symbol:#04x} {count:>10} {bits}")?;
        }
        Ok(())
    }
}

impl Runnable for Command {
    fn run(&self, global: &GlobalOptions) -> Result<()> {
        match self {
            Command::Compress(command) => command.run(global),
            Command::Decompress(command) => command.run(global),
            Command::Codes(command) => command.run(global),
        }
    }
}

impl GlobalOptions {
    fn log_level(&self) -> LevelFilter {
        match (self.quiet, self.verbose) {
            (true, _) => LevelFilter::Error,
            (false, 0) => LevelFilter::Warn,
            (false, 1) => LevelFilter::Info,
            (false, 2) => LevelFilter::Debug,
            (false, _) => LevelFilter::Trace,
        }
    }
}

impl Options {
    fn run(&self) -> Result<()> {
        self.command.run(&self.global)
    }
}

fn main() -> Result<()> {
    let options = Options::parse();
    env_logger::Builder::new()
        .filter_level(options.global.log_level())
        .parse_default_env()
        .init();
    options.run()
}
