use clap::Args;
use serde_json::json;

use crate::util::{api_request, payload_arg};

#[derive(Args)]
pub struct BuildArgs {
    /// Builder function (see `divbridge functions`)
    #[arg(long)]
    pub function: String,
    /// LLM text for this turn
    #[arg(long)]
    pub llm_output: Option<String>,
    /// Tool payload as JSON string
    #[arg(long, conflicts_with = "file")]
    pub backend_output: Option<String>,
    /// Read the tool payload from file (use '-' for stdin)
    #[arg(long, short = 'f')]
    pub file: Option<String>,
    /// Use the legacy /chat/v2 route (no adapters, card only)
    #[arg(long)]
    pub legacy: bool,
    /// Skip pretty-printing (raw JSON for piping)
    #[arg(long)]
    pub raw: bool,
}

pub async fn run(api_url: &str, args: BuildArgs) -> i32 {
    let backend_output = payload_arg(args.backend_output.as_deref(), args.file.as_deref());

    let mut body = json!({
        "function_name": args.function,
        "backend_output": backend_output,
    });
    if let Some(text) = args.llm_output {
        body["llm_output"] = json!(text);
    }

    let path = if args.legacy {
        "/chat/v2/build_ui"
    } else {
        "/chat/v3/build_ui"
    };

    api_request(
        api_url,
        reqwest::Method::POST,
        path,
        None,
        Some(body),
        args.raw,
    )
    .await
}
