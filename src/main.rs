// niftyc: parse and check Nifty source files

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser as _;

use nifty::parser::Lexer;
use nifty::{parse_sources, CompilerConfig, Reporter, SourceBuffer, Verbosity};

#[derive(clap::Parser, Debug)]
#[command(name = "niftyc", version, about = "Check Nifty source files for syntax and scope errors")]
struct Cli {
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,

    #[arg(long, help = "Disable colored diagnostics (also set by NO_COLOR)")]
    no_color: bool,

    #[arg(short, long, conflicts_with = "quiet", help = "Also dump tokens and syntax trees")]
    verbose: bool,

    #[arg(short, long, help = "Print diagnostics only")]
    quiet: bool,

    #[arg(long, help = "Print the token stream of each file and exit")]
    tokens: bool,
}

impl Cli {
    fn config(&self) -> CompilerConfig {
        let no_color_env = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        let verbosity = if self.quiet {
            Verbosity::Quiet
        } else if self.verbose {
            Verbosity::Debug
        } else {
            Verbosity::Info
        };
        CompilerConfig {
            disable_colors: self.no_color || no_color_env,
            verbosity,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let config = cli.config();

    let sources = cli
        .files
        .iter()
        .map(|path| {
            SourceBuffer::load(path).with_context(|| format!("failed to load {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    if cli.tokens {
        let mut out = io::stdout().lock();
        for source in &sources {
            dump_tokens(&mut out, source)?;
        }
        return Ok(ExitCode::SUCCESS);
    }

    if config.shows(Verbosity::Info) {
        for source in &sources {
            eprintln!("Parsing {}...", source.name());
        }
    }
    if config.shows(Verbosity::Debug) {
        for source in &sources {
            dump_tokens(&mut io::stderr().lock(), source)?;
        }
    }

    let reports = parse_sources(&sources);

    let mut reporter = Reporter::stderr(config.colors_enabled());
    let mut failed = false;
    let mut found_entrypoint = false;
    for report in &reports {
        for diagnostic in &report.diagnostics {
            reporter.emit(diagnostic)?;
        }
        if config.shows(Verbosity::Debug) {
            for node in &report.result.nodes {
                eprintln!("{node}");
            }
        }
        if config.shows(Verbosity::Info) {
            eprintln!(
                "Parsed {}: {} top-level declarations, {} errors, {} warnings",
                report.name,
                report.result.nodes.len(),
                report.result.error_count,
                report.result.warning_count
            );
        }
        failed |= !report.result.is_ok();
        found_entrypoint |= report.result.found_entrypoint;
    }

    if !found_entrypoint && config.shows(Verbosity::Info) {
        eprintln!("Note: no entry point 'fn main' declared");
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn dump_tokens(out: &mut impl Write, source: &SourceBuffer) -> io::Result<()> {
    writeln!(out, "== {} ==", source.name())?;
    for token in Lexer::new(source).tokenize() {
        writeln!(
            out,
            "{:>4}:{:<3} {:<14} {:?}",
            token.line,
            token.column,
            format!("{:?}", token.kind),
            token.lexeme
        )?;
    }
    Ok(())
}
