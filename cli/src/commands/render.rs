use clap::Args;
use divbridge_core::render::{Mode, Renderer};
use divbridge_core::widget::BuildRequest;
use serde_json::json;

use crate::util::{payload_arg, pretty};

/// Render locally with the builtin builders; no server needed.
#[derive(Args)]
pub struct RenderArgs {
    /// Builder function
    #[arg(long)]
    pub function: String,
    #[arg(long)]
    pub llm_output: Option<String>,
    /// Tool payload as JSON string
    #[arg(long, conflicts_with = "file")]
    pub backend_output: Option<String>,
    /// Read the tool payload from file (use '-' for stdin)
    #[arg(long, short = 'f')]
    pub file: Option<String>,
    /// Skip the format adapters
    #[arg(long)]
    pub direct: bool,
    /// Print the widget descriptor and adapters alongside the card
    #[arg(long)]
    pub details: bool,
}

pub fn run(args: RenderArgs) -> i32 {
    let mut request = BuildRequest::new(
        args.function,
        payload_arg(args.backend_output.as_deref(), args.file.as_deref()),
    );
    if let Some(text) = args.llm_output {
        request = request.with_llm_output(text);
    }

    let mode = if args.direct { Mode::Direct } else { Mode::Adapted };

    match Renderer::offline().render(&request, mode) {
        Ok(rendered) => {
            tracing::debug!(adapters = ?rendered.adapters, "rendered offline");
            let card = rendered.output.ui.unwrap_or(serde_json::Value::Null);
            let output = if args.details {
                json!({
                    "widget": rendered.output.widget,
                    "adapters": rendered.adapters,
                    "card": card,
                })
            } else {
                card
            };
            println!("{}", pretty(&output));
            0
        }
        Err(e) => {
            let err = json!({
                "error": "render_error",
                "message": e.to_string(),
                "function_name": request.function_name,
            });
            eprintln!("{}", pretty(&err));
            1
        }
    }
}
