use std::io::{self, Write};
use std::time::Duration;

use serde::Serialize;

use crate::app::{DownloadAndConvertResult, ProgressEvent, ProgressSink};
use crate::convert::ConvertResult;
use crate::download::DownloadResult;
use crate::orthofinder::InitResult;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Human,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_init(result: &InitResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_download(result: &DownloadResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_convert(result: &ConvertResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_download_and_convert(result: &DownloadAndConvertResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Forwards progress events to the tracing subscriber.
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => tracing::info!(
                elapsed_ms = millis(elapsed),
                "{}",
                event.message
            ),
            None => tracing::info!("{}", event.message),
        }
    }
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
