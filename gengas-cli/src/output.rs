use crate::{cli::OutputFormat, error::Result};
use chrono::{DateTime, Utc};
#[cfg(feature = "colored-output")]
use colored::*;
use serde::Serialize;
use std::borrow::Cow;
use std::io::Write;
use streams_resolver::{
    directory::{CountryEntry, Directory},
    media::ResolvedStream,
};
#[cfg(feature = "table-output")]
use tabled::{Table, Tabled, settings::Style};

pub struct OutputManager {
    colored: bool,
}

impl OutputManager {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    pub fn format_resolved(&self, stream: &ResolvedStream, format: &OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Pretty => Ok(self.resolved_pretty(stream)),
            OutputFormat::Json => Self::json(stream, true),
            OutputFormat::JsonCompact => Self::json(stream, false),
            #[cfg(feature = "table-output")]
            OutputFormat::Table => Ok(Self::property_table(vec![
                ("Source URL", Cow::Borrowed(stream.source_url.as_str())),
                ("Playable URL", Cow::Borrowed(stream.playable_url.as_str())),
                ("Method", Cow::Owned(stream.method.to_string())),
                ("Format", Self::stream_format(stream)),
                ("Resolved At", Cow::Owned(stream.resolved_at.to_rfc3339())),
            ])),
            #[cfg(not(feature = "table-output"))]
            OutputFormat::Table => Ok(self.resolved_pretty(stream)),
        }
    }

    pub fn format_countries(
        &self,
        directory: &Directory,
        now: DateTime<Utc>,
        format: &OutputFormat,
    ) -> Result<String> {
        match format {
            OutputFormat::Json => Self::json(directory, true),
            OutputFormat::JsonCompact => Self::json(directory, false),
            #[cfg(feature = "table-output")]
            OutputFormat::Table => {
                #[derive(Tabled)]
                struct CountryRow<'a> {
                    country: &'a str,
                    code: &'a str,
                    channels: usize,
                    local_time: String,
                }

                let rows: Vec<CountryRow> = directory
                    .countries()
                    .map(|(key, entry)| CountryRow {
                        country: key,
                        code: entry.code.as_deref().unwrap_or("-"),
                        channels: entry.channels.len(),
                        local_time: entry.local_time(now).unwrap_or_else(|| "-".to_string()),
                    })
                    .collect();
                Ok(Table::new(rows).with(Style::modern()).to_string())
            }
            _ => {
                let mut output = String::new();
                output.push_str(&self.colorize(
                    &format!(
                        "{} countries, {} channels:",
                        directory.len(),
                        directory.channel_count()
                    ),
                    &Color::Green,
                    true,
                ));
                output.push('\n');

                for (key, entry) in directory.countries() {
                    let time = entry
                        .local_time(now)
                        .map(|t| format!(" [{t}]"))
                        .unwrap_or_default();
                    output.push_str(&format!(
                        "  {} ({} channels){}\n",
                        self.colorize(key, &Color::Cyan, true),
                        entry.channels.len(),
                        self.colorize(&time, &Color::Yellow, false)
                    ));
                }
                Ok(output)
            }
        }
    }

    pub fn format_country(
        &self,
        key: &str,
        entry: &CountryEntry,
        now: DateTime<Utc>,
        format: &OutputFormat,
    ) -> Result<String> {
        match format {
            OutputFormat::Json => Self::json(entry, true),
            OutputFormat::JsonCompact => Self::json(entry, false),
            #[cfg(feature = "table-output")]
            OutputFormat::Table => {
                #[derive(Tabled)]
                struct ChannelRow<'a> {
                    name: &'a str,
                    #[tabled(rename = "type")]
                    kind: &'a str,
                    language: &'a str,
                    url: &'a str,
                }

                let rows: Vec<ChannelRow> = entry
                    .channels
                    .iter()
                    .map(|channel| ChannelRow {
                        name: &channel.name,
                        kind: channel.kind.as_str(),
                        language: channel.language.as_deref().unwrap_or("-"),
                        url: &channel.url,
                    })
                    .collect();
                Ok(Table::new(rows).with(Style::modern()).to_string())
            }
            _ => {
                let mut output = String::new();
                output.push_str(&self.colorize(key, &Color::Green, true));
                if let Some(time) = entry.local_time(now) {
                    output.push_str(&format!(" (local time {time})"));
                }
                output.push('\n');

                for channel in &entry.channels {
                    output.push_str(&format!(
                        "  {} [{}]: {}\n",
                        self.colorize(&channel.name, &Color::Cyan, true),
                        self.colorize(channel.kind.as_str(), &Color::Yellow, false),
                        self.colorize(&channel.url, &Color::Blue, false)
                    ));
                }
                Ok(output)
            }
        }
    }

    pub fn format_suggestions(&self, keys: &[&str], format: &OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Self::json(&keys, true),
            OutputFormat::JsonCompact => Self::json(&keys, false),
            _ if keys.is_empty() => Ok("No matching countries\n".to_string()),
            _ => Ok(keys
                .iter()
                .map(|key| format!("  {}\n", self.colorize(key, &Color::Cyan, false)))
                .collect()),
        }
    }

    fn resolved_pretty(&self, stream: &ResolvedStream) -> String {
        let mut output = String::new();

        output.push_str(&self.colorize("Resolved Stream:", &Color::Green, true));
        output.push('\n');

        let rows = [
            ("Source URL", Cow::Borrowed(stream.source_url.as_str()), Color::Blue),
            ("Playable URL", Cow::Borrowed(stream.playable_url.as_str()), Color::Blue),
            ("Method", Cow::Owned(stream.method.to_string()), Color::Cyan),
            ("Format", Self::stream_format(stream), Color::Cyan),
            ("Resolved At", Cow::Owned(stream.resolved_at.to_rfc3339()), Color::Cyan),
        ];
        for (label, value, color) in rows {
            output.push_str(&format!(
                "  {}: {}\n",
                self.colorize(label, &Color::Yellow, false),
                self.colorize(&value, &color, false)
            ));
        }

        output
    }

    fn stream_format(stream: &ResolvedStream) -> Cow<'static, str> {
        match stream.format {
            Some(format) => Cow::Owned(format.to_string()),
            None => Cow::Borrowed("unknown"),
        }
    }

    #[cfg(feature = "table-output")]
    fn property_table(rows: Vec<(&str, Cow<'_, str>)>) -> String {
        #[derive(Tabled)]
        struct TableRow<'a> {
            property: &'a str,
            value: Cow<'a, str>,
        }

        let rows: Vec<TableRow> = rows
            .into_iter()
            .map(|(property, value)| TableRow { property, value })
            .collect();
        Table::new(rows).with(Style::modern()).to_string()
    }

    fn json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
        let mut result = if pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        result.push('\n');
        Ok(result)
    }

    fn colorize(&self, text: &str, color: &Color, bold: bool) -> String {
        #[cfg(feature = "colored-output")]
        {
            if self.colored {
                let colored_text = match color {
                    Color::Green => text.green(),
                    Color::Yellow => text.yellow(),
                    Color::Blue => text.blue(),
                    Color::Cyan => text.cyan(),
                };
                if bold {
                    colored_text.bold().to_string()
                } else {
                    colored_text.to_string()
                }
            } else {
                text.to_string()
            }
        }

        #[cfg(not(feature = "colored-output"))]
        {
            let _ = (color, bold, self.colored);
            text.to_string()
        }
    }
}

enum Color {
    Green,
    Yellow,
    Blue,
    Cyan,
}

pub fn write_output(content: &str, output_file: Option<&std::path::Path>) -> Result<()> {
    match output_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, content)?;
        }
        None => {
            print!("{content}");
            std::io::stdout().flush()?;
        }
    }
    Ok(())
}
