// CLI module
// Command tree for the `penwright` binary

mod commands;
mod draft;

pub use commands::run;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::agent::{AgentRole, TextTask, Tone, WritingStyle};

#[derive(Parser, Debug)]
#[command(name = "penwright")]
#[command(author, version, about = "Writer and reviewer agents for long-form content")]
#[command(long_about = r#"
Penwright plans, writes and reviews long-form content section by section
with configurable writer and reviewer agents over your choice of LLM provider.

Configuration files are loaded from (in priority order):
1. --config <path>                    Explicit config file
2. <workspace>/.penwright/config.toml  Workspace config
3. ~/.penwright/config.toml           Global config

Example:
  penwright providers configure openai --set apiKey=sk-... --set model=gpt-4o
  penwright draft "Why tea beats coffee" --audience "office workers" -o tea.md
"#)]
pub struct Cli {
    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server for the browser editor
    Serve {
        /// Bind address (overrides settings)
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Inspect and configure LLM providers
    #[command(subcommand)]
    Providers(ProvidersCommand),

    /// Send a single prompt
    Prompt(PromptArgs),

    /// Manage writer and reviewer agents
    #[command(subcommand)]
    Agents(AgentsCommand),

    /// Plan a document and print its outline
    Outline(BriefArgs),

    /// Plan, write, review and revise a whole document
    Draft(DraftArgs),

    /// Manage reference material used in prompts
    #[command(subcommand)]
    Knowledge(KnowledgeCommand),
}

#[derive(Subcommand, Debug)]
pub enum ProvidersCommand {
    /// List providers with their status (secrets redacted)
    List,

    /// Replace a provider's configuration
    Configure {
        /// Provider name (openai, anthropic, gemini, deepseek, ollama)
        name: String,

        /// Field assignment, repeatable (e.g. --set model=gpt-4o)
        #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
        fields: Vec<(String, String)>,
    },

    /// Select the provider agents use
    Default { name: String },
}

#[derive(Args, Debug)]
pub struct PromptArgs {
    pub prompt: String,

    /// Provider to use instead of the default
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Run a text task (simplify, rephrase, grammar, explain) with the default writer
    #[arg(long)]
    pub task: Option<TextTask>,

    #[arg(long)]
    pub temperature: Option<f32>,

    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Give up after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Also print the model's reasoning, when it emitted one
    #[arg(long)]
    pub show_reasoning: bool,
}

#[derive(Subcommand, Debug)]
pub enum AgentsCommand {
    List,

    Create {
        name: String,

        /// writer or reviewer
        #[arg(long)]
        role: AgentRole,

        /// Persona description placed at the top of every prompt
        #[arg(long, default_value = "")]
        prompt: String,

        #[arg(long)]
        style: Option<WritingStyle>,

        #[arg(long)]
        tone: Option<Tone>,

        /// Area of expertise, repeatable
        #[arg(long)]
        expertise: Vec<String>,
    },

    /// Delete an agent by id or name
    Delete { agent: String },
}

#[derive(Args, Debug, Clone)]
pub struct BriefArgs {
    /// What the document is about
    pub idea: String,

    #[arg(long, default_value = "blog post")]
    pub content_type: String,

    #[arg(long, default_value = "general readers")]
    pub audience: String,

    /// Extra planning instructions for the outline
    #[arg(long)]
    pub context: Option<String>,

    /// Writer agent (id or name) instead of the first writer
    #[arg(long)]
    pub writer: Option<String>,
}

#[derive(Args, Debug)]
pub struct DraftArgs {
    #[command(flatten)]
    pub brief: BriefArgs,

    /// Reviewer agent (id or name) instead of the first reviewer
    #[arg(long)]
    pub reviewer: Option<String>,

    /// Document title for the export
    #[arg(long)]
    pub title: Option<String>,

    /// Skip the review and rewrite passes
    #[arg(long)]
    pub no_review: bool,

    /// Write the markdown here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum KnowledgeCommand {
    /// Add an entry from text or a file
    Add {
        title: String,

        #[arg(long, conflicts_with = "file")]
        text: Option<String>,

        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
    },

    List,

    Remove { id: String },
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing field name in '{}'", raw));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("apiKey=sk=abc").unwrap(),
            ("apiKey".to_string(), "sk=abc".to_string())
        );
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("=x").is_err());
    }

    #[test]
    fn test_parse_configure() {
        let cli = Cli::parse_from([
            "penwright",
            "-vv",
            "providers",
            "configure",
            "ollama",
            "--set",
            "model=qwen3",
            "--set",
            "stream=false",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Providers(ProvidersCommand::Configure { name, fields }) => {
                assert_eq!(name, "ollama");
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[1], ("stream".to_string(), "false".to_string()));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_agent_create() {
        let cli = Cli::parse_from([
            "penwright",
            "agents",
            "create",
            "Critic",
            "--role",
            "reviewer",
            "--tone",
            "authoritative",
        ]);
        match cli.command {
            Command::Agents(AgentsCommand::Create { role, tone, style, .. }) => {
                assert_eq!(role, AgentRole::ContentReviewer);
                assert_eq!(tone, Some(Tone::Authoritative));
                assert!(style.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_draft_flattens_brief() {
        let cli = Cli::parse_from([
            "penwright",
            "draft",
            "Tea",
            "--audience",
            "drinkers",
            "--no-review",
            "--config",
            "/tmp/p.toml",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/p.toml")));
        match cli.command {
            Command::Draft(args) => {
                assert_eq!(args.brief.idea, "Tea");
                assert_eq!(args.brief.audience, "drinkers");
                assert!(args.no_review);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
