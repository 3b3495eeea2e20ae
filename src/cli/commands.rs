// Subcommand handlers

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::sync::Arc;

use super::draft::{brief_from, pick_agent, run_draft};
use super::{AgentsCommand, Command, KnowledgeCommand, PromptArgs, ProvidersCommand};
use crate::agent::{AgentConfig, AgentRole};
use crate::context::AppContext;
use crate::outline;
use crate::providers::{PromptOptions, ProviderSettings};
use crate::server;

/// Execute one parsed command against the application context.
pub async fn run(ctx: Arc<AppContext>, command: Command) -> Result<()> {
    match command {
        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| ctx.settings().server.bind_address.clone());
            server::serve(ctx, &bind).await
        }
        Command::Providers(cmd) => providers(&ctx, cmd),
        Command::Prompt(args) => prompt(&ctx, args).await,
        Command::Agents(cmd) => agents(&ctx, cmd),
        Command::Outline(args) => {
            let writer = pick_agent(&ctx, args.writer.as_deref(), AgentRole::ContentWriter)?;
            let blocks = ctx
                .agent(writer)
                .generate_structured_blocks(&brief_from(&args), args.context.as_deref())
                .await
                .context("Outline generation failed")?;
            if blocks.is_empty() {
                bail!("The writer returned no readable outline sections");
            }
            println!("{}", outline::render_listing(&blocks));
            Ok(())
        }
        Command::Draft(args) => {
            let markdown = run_draft(ctx, &args).await?;
            match &args.output {
                Some(path) => {
                    std::fs::write(path, &markdown)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    eprintln!("✓ Draft written to {}", path.display());
                }
                None => println!("{}", markdown),
            }
            Ok(())
        }
        Command::Knowledge(cmd) => knowledge(&ctx, cmd),
    }
}

fn providers(ctx: &AppContext, cmd: ProvidersCommand) -> Result<()> {
    match cmd {
        ProvidersCommand::List => {
            for status in ctx.registry().get_configurations()? {
                let marker = if status.is_default { "*" } else { " " };
                let state = if status.configured {
                    "configured"
                } else {
                    "not configured"
                };
                println!("{} {:<10} {:<16} {}", marker, status.name, status.display_name, state);
                for (field, value) in status.config.iter() {
                    println!("      {} = {}", field, value);
                }
            }
            Ok(())
        }
        ProvidersCommand::Configure { name, fields } => {
            let provider = ctx.registry().get_provider(&name)?;
            let mut settings = ProviderSettings::new();
            for (field, value) in fields {
                if provider.schema().field(&field).is_none() {
                    bail!("{} has no field '{}'", provider.name(), field);
                }
                settings.insert(field, field_value(&value));
            }
            provider.configure(settings)?;

            let missing = provider.missing_fields();
            if missing.is_empty() {
                eprintln!("✓ {} configured", provider.name());
            } else {
                eprintln!(
                    "Saved {}; still missing: {}",
                    provider.name(),
                    missing.join(", ")
                );
            }
            Ok(())
        }
        ProvidersCommand::Default { name } => {
            ctx.registry().set_default_provider(&name)?;
            if ctx.registry().default_provider()?.is_none() {
                eprintln!("Warning: {} is not configured yet", name);
            }
            Ok(())
        }
    }
}

/// `true`/`false` become booleans, everything else stays text.
fn field_value(raw: &str) -> Value {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

async fn prompt(ctx: &AppContext, args: PromptArgs) -> Result<()> {
    if let Some(task) = args.task {
        let writer = pick_agent(ctx, None, AgentRole::ContentWriter)?;
        let text = ctx
            .agent(writer)
            .execute_text_task(&args.prompt, task, None)
            .await?;
        println!("{}", text);
        return Ok(());
    }

    let provider = match &args.provider {
        Some(name) => ctx.registry().get_provider(name)?,
        None => ctx.registry().require_default_provider()?,
    };

    let mut options = PromptOptions::default();
    if let Some(temperature) = args.temperature {
        options = options.with_temperature(temperature);
    }
    if let Some(max_tokens) = args.max_tokens {
        options = options.with_max_tokens(max_tokens);
    }
    if let Some(secs) = args.timeout {
        options = options.with_timeout_secs(secs);
    }

    let response = provider.execute_prompt(&args.prompt, &options).await?;
    if args.show_reasoning {
        if let Some(reasoning) = &response.reasoning {
            eprintln!("--- reasoning ---\n{}\n-----------------", reasoning);
        }
    }
    println!("{}", response.content);
    Ok(())
}

fn agents(ctx: &AppContext, cmd: AgentsCommand) -> Result<()> {
    match cmd {
        AgentsCommand::List => {
            for agent in ctx.agents().list() {
                println!(
                    "{}  {:<20} {:<16} {:<14} {}",
                    agent.id,
                    agent.name,
                    agent.role.as_str(),
                    agent.writing_style.as_str(),
                    agent.tone
                );
            }
            Ok(())
        }
        AgentsCommand::Create {
            name,
            role,
            prompt,
            style,
            tone,
            expertise,
        } => {
            let mut agent = AgentConfig::new(name, role, prompt).with_expertise(expertise);
            if let Some(style) = style {
                if !style.belongs_to(role) {
                    bail!("Style '{}' is not available to a {}", style, role);
                }
                agent = agent.with_style(style);
            }
            if let Some(tone) = tone {
                agent = agent.with_tone(tone);
            }
            let agent = ctx.agents().create(agent)?;
            println!("{}", agent.id);
            Ok(())
        }
        AgentsCommand::Delete { agent } => {
            let found = ctx
                .agents()
                .find(&agent)
                .with_context(|| format!("No agent named '{}'", agent))?;
            ctx.agents().delete(&found.id)?;
            eprintln!("✓ Deleted {}", found.name);
            Ok(())
        }
    }
}

fn knowledge(ctx: &AppContext, cmd: KnowledgeCommand) -> Result<()> {
    match cmd {
        KnowledgeCommand::Add { title, text, file } => {
            let content = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                (None, None) => bail!("Pass --text or --file"),
            };
            let entry = ctx.knowledge().add(title, content)?;
            println!("{}", entry.id);
            Ok(())
        }
        KnowledgeCommand::List => {
            for entry in ctx.knowledge().list() {
                println!("{}  {} ({} chars)", entry.id, entry.title, entry.content.len());
            }
            Ok(())
        }
        KnowledgeCommand::Remove { id } => {
            if !ctx.knowledge().remove(&id)? {
                bail!("No knowledge entry with id {}", id);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::config::Settings;
    use crate::store::MemoryStore;
    use clap::Parser;

    fn context() -> Arc<AppContext> {
        Arc::new(AppContext::with_store(Settings::default(), Arc::new(MemoryStore::new())).unwrap())
    }

    async fn run_args(ctx: &Arc<AppContext>, args: &[&str]) -> Result<()> {
        let cli = Cli::parse_from(std::iter::once("penwright").chain(args.iter().copied()));
        run(ctx.clone(), cli.command).await
    }

    #[test]
    fn test_field_value() {
        assert_eq!(field_value("false"), Value::Bool(false));
        assert_eq!(field_value("gpt-4o"), Value::String("gpt-4o".into()));
    }

    #[tokio::test]
    async fn test_configure_and_default() {
        let ctx = context();
        run_args(
            &ctx,
            &[
                "providers",
                "configure",
                "ollama",
                "--set",
                "baseUrl=http://gpu-box:11434",
                "--set",
                "model=qwen3",
                "--set",
                "stream=false",
            ],
        )
        .await
        .unwrap();
        run_args(&ctx, &["providers", "default", "ollama"]).await.unwrap();

        let provider = ctx.registry().require_default_provider().unwrap();
        assert_eq!(provider.name(), "ollama");
        assert_eq!(provider.get_config().get("stream"), Some(&Value::Bool(false)));
    }

    #[tokio::test]
    async fn test_configure_rejects_unknown_field() {
        let ctx = context();
        let result = run_args(&ctx, &["providers", "configure", "openai", "--set", "color=blue"]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_agent_create_and_delete() {
        let ctx = context();
        let before = ctx.agents().list().len();
        run_args(&ctx, &["agents", "create", "Critic", "--role", "reviewer"])
            .await
            .unwrap();
        assert_eq!(ctx.agents().list().len(), before + 1);

        run_args(&ctx, &["agents", "delete", "critic"]).await.unwrap();
        assert_eq!(ctx.agents().list().len(), before);
    }

    #[tokio::test]
    async fn test_writer_style_rejected_for_reviewer() {
        let ctx = context();
        let result = run_args(
            &ctx,
            &["agents", "create", "Odd", "--role", "reviewer", "--style", "storytelling"],
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_prompt_without_provider_fails() {
        let ctx = context();
        let err = run_args(&ctx, &["prompt", "Hello"]).await.unwrap_err();
        assert!(err.to_string().contains("No LLM provider is configured"));
    }
}
