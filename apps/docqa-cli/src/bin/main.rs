use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use docqa_cli::{init_tracing, load_settings, split_overrides};
use docqa_core::data_processor::DataProcessor;
use docqa_pipeline::QaPipeline;

const PREVIEW_CHARS: usize = 120;
const USAGE: &str = "Usage: docqa <ask|chat|chunks> <file-or-dir> [question] [--top-k N] [--chunk-size N] [--overlap N]";

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() { eprintln!("{USAGE}"); std::process::exit(1); }
    let cmd = args.remove(0);
    (cmd, args)
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let (cmd, args) = parse_args();
    let (overrides, positional) = split_overrides(args)?;
    let settings = load_settings(&overrides).map_err(|e| { eprintln!("Error loading config: {e}"); e })?;

    let Some(path) = positional.first().map(PathBuf::from) else {
        eprintln!("{USAGE}");
        std::process::exit(1);
    };

    match cmd.as_str() {
        "ask" => {
            let question = positional[1..].join(" ");
            if question.trim().is_empty() {
                eprintln!("Usage: docqa ask <file-or-dir> \"<question>\"");
                std::process::exit(1);
            }
            let pipeline = QaPipeline::open(&path, &settings)?;
            println!("{}", pipeline.ask(&question));
        }
        "chat" => {
            let pipeline = QaPipeline::open(&path, &settings)?;
            eprintln!("Indexed {} chunks from {}. Type 'quit' to exit.", pipeline.index().len(), path.display());
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            loop {
                write!(stdout, "> ")?;
                stdout.flush()?;
                let mut line = String::new();
                if stdin.lock().read_line(&mut line)? == 0 { break; }
                let question = line.trim();
                if question.is_empty() { continue; }
                if matches!(question, "quit" | "exit") { break; }
                writeln!(stdout, "{}\n", pipeline.ask(question))?;
            }
        }
        "chunks" => {
            let chunks = DataProcessor::with_config(settings.chunking)?.process_path(&path)?;
            for c in &chunks {
                println!("── {} [{}/{}] chars {}..{}", c.id, c.chunk_index + 1, c.total_chunks, c.start, c.end);
                let preview: String = c.content.chars().take(PREVIEW_CHARS).collect();
                let ellipsis = if c.content.chars().count() > PREVIEW_CHARS { "…" } else { "" };
                println!("{preview}{ellipsis}\n");
            }
            println!("{} chunks (size {}, overlap {})", chunks.len(), settings.chunking.chunk_size, settings.chunking.overlap);
        }
        _ => { eprintln!("Unknown command: {cmd}\n{USAGE}"); std::process::exit(1); }
    }
    Ok(())
}
