use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use indicatif::ProgressBar;
use tracing_subscriber::EnvFilter;

use docqa_core::config::{expand_path, Config, Settings};
use docqa_core::traits::{DocumentLoader, Embedder, LanguageModel};
use docqa_core::Chunker;
use docqa_embed::get_default_embedder;
use docqa_llm::OpenAiChatModel;
use docqa_loader::FileLoader;
use docqa_rag::{Answer, RagChain, Session};

type Chain = RagChain<Box<dyn Embedder>, Box<dyn LanguageModel>>;

fn usage(prog: &str) -> ! {
    eprintln!("Usage:");
    eprintln!("  {prog} ask <file.pdf|file.txt> \"<question>\" [\"<question>\" ...]");
    eprintln!("  {prog} chat <file.pdf|file.txt>");
    eprintln!("  {prog} chunks <file.pdf|file.txt>");
    std::process::exit(1)
}

fn parse_args() -> (String, String, PathBuf, Vec<String>) {
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    if args.len() < 2 { usage(&prog); }
    let cmd = args.remove(0);
    let file = expand_path(args.remove(0));
    (prog, cmd, file, args)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;
    let (prog, cmd, file, questions) = parse_args();

    match cmd.as_str() {
        "chunks" => print_chunks(&settings, &file)?,
        "ask" => {
            if questions.is_empty() { usage(&prog); }
            let (chain, mut session) = open_session(&settings, &file)?;
            for question in &questions {
                println!("\n❓ {question}");
                match session.ask(&chain, question) {
                    Ok(answer) => print_answer(&answer),
                    Err(e) => eprintln!("⚠️  Could not answer: {e}"),
                }
            }
        }
        "chat" => {
            let (chain, mut session) = open_session(&settings, &file)?;
            chat_loop(&chain, &mut session)?;
        }
        _ => { eprintln!("Unknown command: {}", cmd); usage(&prog); }
    }
    Ok(())
}

fn open_session(settings: &Settings, file: &Path) -> anyhow::Result<(Chain, Session)> {
    let embedder = get_default_embedder(&settings.gateway)?;
    let llm: Box<dyn LanguageModel> = Box::new(OpenAiChatModel::from_settings(&settings.gateway)?);
    let chain = RagChain::from_settings(embedder, llm, settings);

    let bytes = fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let name = file.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_else(|| file.display().to_string());
    let mut session = Session::from_settings(settings)?;
    println!("📄 Processing {name}...");
    let pb = ProgressBar::new(0);
    let info = session.process_upload_with_progress(&FileLoader::new(), chain.embedder(), &bytes, &name, &pb)?;
    println!("✅ Indexed {} ({} pages, {} chunks)", info.name, info.pages, info.chunks);
    Ok((chain, session))
}

fn print_answer(answer: &Answer) {
    println!("💬 {}", answer.text);
    if !answer.sources.is_empty() {
        println!("   📚 Sources:");
        for (i, hit) in answer.sources.iter().enumerate() {
            let page = hit.page.map(|p| format!("p.{p}")).unwrap_or_else(|| "-".to_string());
            println!("     {}. score={:.4} {} {}", i + 1, hit.score, page, preview(&hit.content, 80));
        }
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars { return flat; }
    format!("{}…", flat.chars().take(max_chars).collect::<String>())
}

fn chat_loop(chain: &Chain, session: &mut Session) -> anyhow::Result<()> {
    println!("Ask questions about the document. Commands: :history, :reset, :quit");
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("\n> ");
        io::stdout().flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 { break; }
        let input = line.trim();
        match input {
            "" => continue,
            ":quit" | ":q" | ":exit" => break,
            ":reset" => { session.reset_history(); println!("🧹 History cleared"); }
            ":history" => {
                if session.history().is_empty() { println!("(empty)"); }
                for (i, turn) in session.history().turns().enumerate() {
                    println!("{}. Q: {}\n   A: {}", i + 1, turn.question, turn.answer);
                }
            }
            question => match session.ask(chain, question) {
                Ok(answer) => print_answer(&answer),
                Err(e) => eprintln!("⚠️  Could not answer: {e}"),
            },
        }
    }
    Ok(())
}

fn print_chunks(settings: &Settings, file: &Path) -> anyhow::Result<()> {
    let bytes = fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let name = file.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_else(|| file.display().to_string());
    let document = FileLoader::new().load(&bytes, &name)?;
    let chunks = Chunker::new(settings.chunking)?.chunk_document(&document);
    println!("📄 {} ({}), {} pages → {} chunks (max_size={}, overlap={})",
        document.name, document.format, document.segments.len(), chunks.len(),
        settings.chunking.max_size, settings.chunking.overlap);
    for chunk in &chunks {
        let page = chunk.page.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string());
        println!("\n  #{} page={} offset={} len={}", chunk.chunk_index, page, chunk.offset, chunk.content.chars().count());
        println!("     📝 {}", preview(&chunk.content, 120));
    }
    Ok(())
}
