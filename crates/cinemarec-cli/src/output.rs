use clap::ValueEnum;
use owo_colors::OwoColorize;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    #[value(name = "json-pretty")]
    JsonPretty,
}

pub struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn is_human(&self) -> bool {
        self.format == OutputFormat::Human
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn success(&self, msg: impl AsRef<str>) {
        if self.quiet {
            return;
        }

        match self.format {
            OutputFormat::Human => {
                println!("{} {}", "✓".green(), msg.as_ref());
            }
            OutputFormat::Json | OutputFormat::JsonPretty => {
                self.print_json(&message_record("success", msg.as_ref()));
            }
        }
    }

    pub fn error(&self, msg: impl AsRef<str>) {
        // Errors are shown even in quiet mode
        match self.format {
            OutputFormat::Human => {
                eprintln!("{} {}", "✗".red(), msg.as_ref());
            }
            OutputFormat::Json | OutputFormat::JsonPretty => {
                self.print_json(&message_record("error", msg.as_ref()));
            }
        }
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        if self.quiet {
            return;
        }

        match self.format {
            OutputFormat::Human => {
                println!("{}", msg.as_ref());
            }
            OutputFormat::Json | OutputFormat::JsonPretty => {
                self.print_json(&message_record("info", msg.as_ref()));
            }
        }
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        if self.quiet {
            return;
        }

        match self.format {
            OutputFormat::Human => {
                println!("{} {}", "⚠".yellow(), msg.as_ref());
            }
            OutputFormat::Json | OutputFormat::JsonPretty => {
                self.print_json(&message_record("warning", msg.as_ref()));
            }
        }
    }

    pub fn println(&self, msg: impl AsRef<str>) {
        if self.quiet {
            return;
        }

        match self.format {
            OutputFormat::Human => {
                println!("{}", msg.as_ref());
            }
            OutputFormat::Json | OutputFormat::JsonPretty => {
                // Plain lines become info records; blank spacer lines are dropped
                if let Some(record) = line_record(msg.as_ref()) {
                    self.print_json(&record);
                }
            }
        }
    }

    pub fn json(&self, data: &serde_json::Value) {
        if self.quiet && self.format != OutputFormat::Human {
            return;
        }

        self.print_json(data);
    }

    fn print_json(&self, data: &serde_json::Value) {
        println!("{}", self.render_json(data));
    }

    fn render_json(&self, data: &serde_json::Value) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string(data).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(data).unwrap_or_default(),
            OutputFormat::Human => data.to_string(),
        }
    }
}

fn message_record(kind: &str, msg: &str) -> serde_json::Value {
    json!({
        "type": kind,
        "message": msg
    })
}

fn line_record(msg: &str) -> Option<serde_json::Value> {
    (!msg.trim().is_empty()).then(|| message_record("info", msg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_lines_become_info_records() {
        let output = Output::new(OutputFormat::Json, false);
        let record = line_record("Total watched: 3").unwrap();
        assert_eq!(
            output.render_json(&record),
            r#"{"message":"Total watched: 3","type":"info"}"#
        );
        assert!(line_record("").is_none());
        assert!(line_record("   ").is_none());
    }

    #[test]
    fn test_pretty_rendering() {
        let output = Output::new(OutputFormat::JsonPretty, false);
        let rendered = output.render_json(&message_record("warning", "careful"));
        assert!(rendered.contains('\n'));
        assert!(rendered.contains(r#""type": "warning""#));
    }
}
