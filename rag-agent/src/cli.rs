use crate::config::DEFAULT_QUERY;
use clap::{Parser, Subcommand};

/// Ask a retrieval-augmented agent a question
#[derive(Parser, Debug)]
#[command(name = "rag-agent")]
#[command(version)]
#[command(about = "Tool-calling agent over a Supabase vector store", long_about = None)]
pub struct Args {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Invoke the agent once and print the answer
    Ask {
        /// Question for the agent
        #[arg(value_name = "QUERY", default_value = DEFAULT_QUERY)]
        query: String,
    },
    /// Serve the agent over HTTP
    Serve {
        /// Port to listen on (defaults to PORT)
        #[arg(long)]
        port: Option<u16>,
    },
}

impl Args {
    pub fn command(&self) -> Command {
        match &self.command {
            Some(Command::Ask { query }) => Command::Ask {
                query: query.clone(),
            },
            Some(Command::Serve { port }) => Command::Serve { port: *port },
            None => Command::Ask {
                query: DEFAULT_QUERY.to_string(),
            },
        }
    }
}
