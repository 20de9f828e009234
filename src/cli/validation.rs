use crate::cli::args::{CliArgs, Command};

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(Command::Category { label }) = args.command.as_ref() {
        crate::model::Category::from_label(label).map_err(|e| e.to_string())?;
    }
    if let Some(raw) = args.api_base.as_deref() {
        reqwest::Url::parse(raw.trim()).map_err(|e| format!("invalid --api-base '{raw}': {e}"))?;
    }
    if let Some(raw) = args.output_format.as_deref() {
        if crate::render::OutputFormat::parse(raw).is_none() {
            return Err(format!(
                "invalid --output-format '{raw}', expected text, json, or html"
            ));
        }
    }
    for raw in &args.header {
        crate::client::parse_header_line(raw).map_err(|e| e.to_string())?;
    }
    if args.ephemeral && args.session.is_some() {
        return Err("use either --session or --ephemeral, not both".to_string());
    }
    Ok(())
}
