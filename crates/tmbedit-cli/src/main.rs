use anyhow::{Context, Result};
use std::{env, path::PathBuf, process, time::Instant};
use tmbedit_config::Config;
use tmbedit_engine::document::Document;
use tmbedit_engine::spellcheck::{
    CheckerStatus, CustomWords, EngineConfig, ResolvedAnnotation, SpellCheckSession,
    WordListChecker, project,
};
use tokio::runtime::Handle;

struct Args {
    file: PathBuf,
    dictionary_dir: Option<PathBuf>,
    add_words: Vec<String>,
    suggest: bool,
}

fn usage(program: &str) -> ! {
    eprintln!("Usage: {program} <file> [--dictionary DIR] [--add-word WORD]... [--suggest]");
    process::exit(1);
}

fn parse_args() -> Args {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("tmbedit-cli");

    let mut file = None;
    let mut dictionary_dir = None;
    let mut add_words = Vec::new();
    let mut suggest = false;

    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--dictionary" => match rest.next() {
                Some(dir) => dictionary_dir = Some(PathBuf::from(dir)),
                None => usage(program),
            },
            "--add-word" => match rest.next() {
                Some(word) => add_words.push(word.clone()),
                None => usage(program),
            },
            "--suggest" => suggest = true,
            _ if file.is_none() && !arg.starts_with("--") => file = Some(PathBuf::from(arg)),
            _ => usage(program),
        }
    }

    let Some(file) = file else { usage(program) };
    Args {
        file,
        dictionary_dir,
        add_words,
        suggest,
    }
}

/// 1-based line and column of an annotation in the flattened text.
fn line_and_column(text: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    for ch in text.chars().take(offset) {
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = parse_args();
    let config_path = Config::config_path();
    log::info!("Config path: {}", config_path.display());

    let mut config = match Config::load() {
        Ok(Some(config)) => config,
        Ok(None) => Config::default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };
    if let Some(dir) = args.dictionary_dir {
        config.spellcheck.dictionary_dir = Config::expand_path(&dir).unwrap_or(dir);
    }
    let settings = &config.spellcheck;

    if !settings.enabled {
        println!(
            "Spell checking is disabled in '{}'",
            config_path.display()
        );
        return Ok(());
    }

    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read '{}'", args.file.display()))?;
    let doc = Document::from_bytes(&bytes)?;

    let engine_config = EngineConfig {
        debounce: settings.debounce(),
        pending_timeout: settings.pending_timeout(),
    };
    let mut session = SpellCheckSession::new(engine_config, Handle::current());

    let (aff, dic) = settings.dictionary_paths();
    session.init(WordListChecker::from_paths(&aff, &dic, CustomWords::new()));
    if let CheckerStatus::Failed(reason) = session.engine().status() {
        eprintln!("Warning: spell checking unavailable: {reason}");
        return Ok(());
    }

    // Words accepted for this run only
    let now = Instant::now();
    for word in &args.add_words {
        session.add_word(word, &doc, now);
    }
    if args.add_words.is_empty() {
        session.check_now(&doc, now);
    }
    while session.next_completed(&doc).await.is_some() {}

    let projection = project(&doc);
    let annotations: Vec<ResolvedAnnotation> = session.engine().annotations().to_vec();
    for annotation in &annotations {
        let offset = projection.map.doc_to_text(annotation.doc_start).unwrap_or(0);
        let (line, column) = line_and_column(&projection.text, offset);
        println!(
            "{}:{line}:{column}: {}",
            args.file.display(),
            annotation.word
        );

        if args.suggest {
            let suggestions = session.suggestions(&annotation.word).await;
            if !suggestions.is_empty() {
                println!("    did you mean: {}", suggestions.join(", "));
            }
        }
    }

    println!("{} misspelled words", session.engine().misspelled_count());
    Ok(())
}
