use clap::Subcommand;

use crate::util::{api_request, exit_error, read_json_from_file};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Store a new screen config
    Create {
        /// JSON file with the config (use '-' for stdin)
        #[arg(long, short = 'f')]
        file: String,
    },
    /// List stored configs
    List,
    /// Show one stored config
    Get {
        #[arg(long)]
        id: u64,
    },
    /// Replace a stored config
    Update {
        #[arg(long)]
        id: u64,
        /// JSON file with the config (use '-' for stdin)
        #[arg(long, short = 'f')]
        file: String,
    },
    /// Delete a stored config
    Delete {
        #[arg(long)]
        id: u64,
    },
    /// Build every widget of a stored config into one screen
    Build {
        #[arg(long)]
        id: u64,
        /// Skip pretty-printing (raw JSON for piping)
        #[arg(long)]
        raw: bool,
    },
}

pub async fn run(api_url: &str, user_id: Option<&str>, command: ConfigCommands) -> i32 {
    use reqwest::Method;

    match command {
        ConfigCommands::Create { file } => {
            let body = load(&file);
            api_request(api_url, Method::POST, "/config", user_id, Some(body), false).await
        }
        ConfigCommands::List => {
            api_request(api_url, Method::GET, "/config", user_id, None, false).await
        }
        ConfigCommands::Get { id } => {
            api_request(api_url, Method::GET, &format!("/config/{id}"), user_id, None, false).await
        }
        ConfigCommands::Update { id, file } => {
            let body = load(&file);
            api_request(
                api_url,
                Method::PUT,
                &format!("/config/{id}"),
                user_id,
                Some(body),
                false,
            )
            .await
        }
        ConfigCommands::Delete { id } => {
            api_request(
                api_url,
                Method::DELETE,
                &format!("/config/{id}"),
                user_id,
                None,
                false,
            )
            .await
        }
        ConfigCommands::Build { id, raw } => {
            api_request(
                api_url,
                Method::GET,
                &format!("/build/ui/{id}"),
                user_id,
                None,
                raw,
            )
            .await
        }
    }
}

fn load(file: &str) -> serde_json::Value {
    read_json_from_file(file).unwrap_or_else(|e| {
        exit_error(
            &e,
            Some("Expected {\"name\": ..., \"widgets\": [{\"function_name\": ..., \"backend_output\": ...}]}"),
        )
    })
}
