use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;

use optgen_build::Generated;

/// How the run summary is printed.
#[derive(Clone, Copy, Debug, ValueEnum, Default, PartialEq)]
pub enum OutputFormat {
    /// One status line (default)
    #[default]
    Text,
    /// JSON summary for scripting
    Json,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub type_name: String,
    pub source_file: String,
    pub output_file: String,
    pub package: String,
    pub post_processed: bool,
    pub fields: Vec<FieldReport>,
}

#[derive(Debug, Serialize)]
pub struct FieldReport {
    pub name: String,
    #[serde(rename = "type")]
    pub declared_type: String,
    pub composite: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
}

impl From<&Generated> for Report {
    fn from(generated: &Generated) -> Self {
        Self {
            type_name: generated.type_name.clone(),
            source_file: generated.source_file.display().to_string(),
            output_file: generated.output_file.display().to_string(),
            package: generated.package.clone(),
            post_processed: generated.post_processed,
            fields: generated
                .fields
                .iter()
                .map(|field| FieldReport {
                    name: field.name.clone(),
                    declared_type: field.declared_type.clone(),
                    composite: field.composite,
                    param: field.param_name.clone(),
                })
                .collect(),
        }
    }
}

pub fn render_report(generated: &Generated, format: OutputFormat, use_color: bool) -> Result<String> {
    let report = Report::from(generated);
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            let mark = if use_color { "✓".green().bold().to_string() } else { "✓".to_string() };
            let output = if use_color {
                report.output_file.bold().to_string()
            } else {
                report.output_file.clone()
            };
            Ok(format!(
                "{mark} {output}: {} accessor pair(s) for `{}`",
                report.fields.len(),
                report.type_name
            ))
        }
    }
}
