//! `flashdeck` - CLI and web server for the flashcard manager
//!
//! This binary parses the command line, loads configuration once and hands it
//! to the store, the generation client and the HTTP server.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::{bail, Context};
use clap::Parser;

use flashdeck::cli::{Cli, Command, ConfigCommand, GenerateCommand, OutputFormat};
use flashdeck::generation::Generator;
use flashdeck::{init_logging, server, Config, Flashcard, GenerationClient, Storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Config validation is reported by its own command
    if let Command::Config(ConfigCommand::Validate { file }) = &cli.command {
        return handle_validate(file.clone().or_else(|| cli.config.clone()));
    }

    let mut config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    match cli.command {
        Command::Serve(cmd) => {
            if let Some(bind) = cmd.bind {
                config.server.bind = bind;
            }
            server::serve(&config).await?;
        }
        Command::List(cmd) => handle_list(&config, cmd.format)?,
        Command::Add(cmd) => {
            let card = Flashcard::from_input(&cmd.term, &cmd.definition)?;
            let cards = storage(&config).append(card)?;
            println!("Added flashcard ({} total)", cards.len());
        }
        Command::Clear(cmd) => {
            if !cmd.yes {
                bail!("refusing to remove every flashcard without --yes");
            }
            storage(&config).clear()?;
            println!("Cleared all flashcards");
        }
        Command::Generate(cmd) => handle_generate(&config, &cmd).await?,
        Command::Status(cmd) => handle_status(&config, cmd.json)?,
        Command::Config(cmd) => handle_config(&config, cmd)?,
    }

    Ok(())
}

fn storage(config: &Config) -> Storage {
    Storage::new(config.storage_path())
}

fn handle_list(config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let cards = storage(config).load()?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&cards)?),
        OutputFormat::Plain => {
            if cards.is_empty() {
                println!("No flashcards yet.");
            }
            for card in &cards {
                println!("{}: {}", card.term, card.definition);
            }
        }
        OutputFormat::Table => {
            let width = cards
                .iter()
                .map(|c| c.term.chars().count())
                .max()
                .unwrap_or(0)
                .max("TERM".len());
            println!("{:<4} {:<width$}  DEFINITION", "#", "TERM");
            for (i, card) in cards.iter().enumerate() {
                println!("{:<4} {:<width$}  {}", i + 1, card.term, card.definition);
            }
        }
    }
    Ok(())
}

async fn handle_generate(config: &Config, cmd: &GenerateCommand) -> anyhow::Result<()> {
    let subject = cmd.subject.trim();
    if subject.is_empty() {
        bail!("subject is required");
    }

    let client = GenerationClient::new(config.provider.clone())?;
    let generated = client.generate_flashcards(subject).await;

    for card in &generated {
        println!("{}: {}", card.term, card.definition);
    }

    if cmd.dry_run {
        println!("(dry run, nothing saved)");
        return Ok(());
    }

    let cards = storage(config).merge_generated(generated, config.generate.merge)?;
    println!("Saved; collection now holds {} flashcards", cards.len());
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let stats = storage(config).stats()?;
    let provider = &config.provider;
    let credential_set = std::env::var(&provider.api_key_env).is_ok_and(|v| !v.is_empty());

    if json {
        let status = serde_json::json!({
            "storage_path": config.storage_path(),
            "total_cards": stats.total_cards,
            "error_cards": stats.error_cards,
            "file_size_bytes": stats.file_size_bytes,
            "last_modified": stats.last_modified,
            "provider": provider.kind,
            "endpoint": provider.endpoint(),
            "model": provider.model,
            "api_key_env": provider.api_key_env,
            "credential_set": credential_set,
            "merge": config.generate.merge,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("flashdeck status");
        println!("----------------");
        println!("Storage:       {}", config.storage_path().display());
        println!("Cards:         {}", stats.total_cards);
        println!("Error cards:   {}", stats.error_cards);
        println!("File size:     {} bytes", stats.file_size_bytes);
        match stats.last_modified {
            Some(t) => println!("Last modified: {}", t.to_rfc3339()),
            None => println!("Last modified: never"),
        }
        println!();
        println!("Provider:      {} ({})", provider.kind.label(), provider.kind);
        println!("Endpoint:      {}", provider.endpoint());
        println!("Model:         {}", provider.model);
        println!(
            "Credential:    {} ({})",
            provider.api_key_env,
            if credential_set { "set" } else { "not set" }
        );
        println!("Merge policy:  {:?}", config.generate.merge);
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                let provider = &config.provider;
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Path:               {}", config.storage_path().display());
                println!();
                println!("[Server]");
                println!("  Bind:               {}", config.server.bind);
                println!();
                println!("[Provider]");
                println!("  Kind:               {}", provider.kind);
                println!("  Endpoint:           {}", provider.endpoint());
                println!("  Model:              {}", provider.model);
                println!("  API key variable:   {}", provider.api_key_env);
                println!("  Max tokens:         {}", provider.max_tokens);
                println!("  Temperature:        {}", provider.temperature);
                println!("  Timeout (secs):     {}", provider.timeout_secs);
                println!("  Cards per subject:  {}", provider.card_count);
                println!();
                println!("[Generate]");
                println!("  Merge:              {:?}", config.generate.merge);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => handle_validate(file)?,
    }
    Ok(())
}

fn handle_validate(file: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = file.unwrap_or_else(Config::default_config_path);
    println!("Validating configuration: {}", path.display());
    if let Err(e) = Config::load_from(Some(path)) {
        bail!("Configuration error: {e}");
    }
    println!("Configuration is valid.");
    Ok(())
}
