use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format. In JSON mode the
/// fields of `data` are merged into the top-level object.
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(Value::Object(fields)), Some(target)) = (data, response.as_object_mut()) {
                target.extend(fields);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Print a labelled value in text mode; JSON mode prints nothing.
pub fn output_field(output_format: &OutputFormat, label: &str, value: &str) {
    if let OutputFormat::Text = output_format {
        println!("{}: {}", label, value);
    }
}
