use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::types::SamplingParameters;

#[derive(Parser, Debug)]
#[command(
    name = "llm-switchboard",
    version,
    about = "One HTTP surface for many hosted LLM vendors"
)]
pub struct Cli {
    /// Configuration file (defaults to config/switchboard.toml when present)
    #[arg(long, global = true, env = "LLM_SWITCHBOARD_CONFIG")]
    pub config: Option<PathBuf>,
    /// Vendor API key for one-shot commands
    #[arg(long, global = true, env = "LLM_SWITCHBOARD_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the REST API server
    Serve {
        /// Bind address (overrides [server].bind)
        #[arg(long)]
        addr: Option<SocketAddr>,
    },
    /// Print the known provider keys
    Providers,
    /// List the models a provider offers
    Models {
        #[arg(long, short)]
        provider: String,
        #[arg(long, short)]
        search: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Generate a completion for a prompt
    Generate {
        #[arg(long, short)]
        provider: String,
        #[arg(long, short)]
        model: String,
        #[command(flatten)]
        sampling: SamplingArgs,
        /// Prompt text; words are joined with spaces
        #[arg(required = true, trailing_var_arg = true)]
        prompt: Vec<String>,
    },
    /// Count tokens for a text under a model
    CountTokens {
        #[arg(long, short)]
        provider: String,
        #[arg(long, short)]
        model: String,
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },
}

#[derive(Args, Debug, Default, Clone)]
pub struct SamplingArgs {
    #[arg(long)]
    pub temperature: Option<f32>,
    #[arg(long)]
    pub max_tokens: Option<u32>,
    #[arg(long)]
    pub top_p: Option<f32>,
    #[arg(long)]
    pub top_k: Option<u32>,
    #[arg(long)]
    pub frequency_penalty: Option<f32>,
    #[arg(long)]
    pub presence_penalty: Option<f32>,
    #[arg(long)]
    pub repetition_penalty: Option<f32>,
}

impl From<SamplingArgs> for SamplingParameters {
    fn from(args: SamplingArgs) -> Self {
        SamplingParameters {
            temperature: args.temperature,
            max_tokens: args.max_tokens,
            top_p: args.top_p,
            top_k: args.top_k,
            frequency_penalty: args.frequency_penalty,
            presence_penalty: args.presence_penalty,
            repetition_penalty: args.repetition_penalty,
            ..SamplingParameters::EMPTY
        }
    }
}
