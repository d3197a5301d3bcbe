use clap::{Parser, Subcommand};

/// appgate — keyed application gateway for LLM backends
#[derive(Parser)]
#[command(name = "appgate", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the gateway server
    Serve {
        /// Port to bind (defaults to APPGATE_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage application records directly in the database
    App {
        #[command(subcommand)]
        command: AppCommands,
    },
}

#[derive(Subcommand)]
pub enum AppCommands {
    /// List registered applications
    List,
    /// Register a new application
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "lollms")]
        binding: String,
        #[arg(long)]
        host: Option<String>,
        #[arg(long, env = "APPGATE_SERVICE_KEY")]
        service_key: Option<String>,
        /// Comma-separated allow-list; empty allows every model
        #[arg(long)]
        models: Option<String>,
        /// Explicit key; a UUID is generated when omitted
        #[arg(long)]
        key: Option<String>,
        /// Create the application deactivated
        #[arg(long)]
        inactive: bool,
        #[arg(long)]
        welcome_message: Option<String>,
    },
    /// Delete an application
    Delete {
        #[arg(long)]
        key: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_create() {
        let cli = Cli::try_parse_from([
            "appgate", "app", "create", "--name", "Test", "--binding", "ollama", "--models",
            "llama3,mistral", "--inactive",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::App {
                command:
                    AppCommands::Create {
                        name,
                        binding,
                        models,
                        inactive,
                        ..
                    },
            }) => {
                assert_eq!(name, "Test");
                assert_eq!(binding, "ollama");
                assert_eq!(models.as_deref(), Some("llama3,mistral"));
                assert!(inactive);
            }
            _ => panic!("expected app create"),
        }
    }

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["appgate"]).unwrap();
        assert!(cli.command.is_none());
    }
}
