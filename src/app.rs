//! Main application module
//!
//! Glue between the command line and the features: resolves the effective
//! configuration and lyric sequence, then runs one command against them.

mod preview;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use serde::Serialize;

pub use preview::TerminalSink;

use crate::features::export::ScriptEmitter;
use crate::features::lyrics::{
    DriverOptions, DriverSummary, FrameSink, LineVisualState, LyricSequence, LyricsEngine,
    RenderDriver, load_lyrics, sample_lyrics,
};
use crate::features::settings::{Alignment, Rgb, ScriptConfig, ValidConfig};

/// Command line overrides applied on top of the config file
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ConfigOverrides {
    /// Composition name
    #[arg(long, global = true)]
    pub comp_name: Option<String>,
    /// Composition width in pixels
    #[arg(long, global = true)]
    pub width: Option<u32>,
    /// Composition height in pixels
    #[arg(long, global = true)]
    pub height: Option<u32>,
    /// Frames per second
    #[arg(long, global = true)]
    pub fps: Option<f64>,
    /// Composition duration in seconds
    #[arg(long, global = true)]
    pub duration: Option<f64>,
    /// Font size in pixels
    #[arg(long, global = true)]
    pub font_size: Option<f64>,
    /// Font family of the text layers
    #[arg(long, global = true)]
    pub font_name: Option<String>,
    /// Colour of the active line (#RRGGBB)
    #[arg(long, global = true)]
    pub text_color: Option<Rgb>,
    /// Colour of the other lines (#RRGGBB)
    #[arg(long, global = true)]
    pub inactive_color: Option<Rgb>,
    /// Vertical distance between lines in pixels
    #[arg(long, global = true)]
    pub spacing: Option<f64>,
    /// Blur radius of unfocused lines
    #[arg(long, global = true)]
    pub blur_max: Option<f64>,
    /// Scale of the active line
    #[arg(long, global = true)]
    pub active_scale: Option<f64>,
    /// Scale of the other lines, in (0, 1]; saved and exported only
    #[arg(long, global = true)]
    pub inactive_scale: Option<f64>,
    /// Focus transition speed
    #[arg(long, global = true)]
    pub damping: Option<f64>,
    /// Horizontal anchor: left or center
    #[arg(long, global = true)]
    pub alignment: Option<Alignment>,
    /// Upward shift of every line in pixels
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub text_lift: Option<f64>,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut ScriptConfig) {
        if let Some(v) = &self.comp_name {
            config.comp_name = v.clone();
        }
        if let Some(v) = &self.font_name {
            config.font_name = v.clone();
        }
        if let Some(v) = self.width {
            config.width = v;
        }
        if let Some(v) = self.height {
            config.height = v;
        }
        if let Some(v) = self.fps {
            config.fps = v;
        }
        if let Some(v) = self.duration {
            config.duration = v;
        }
        if let Some(v) = self.font_size {
            config.font_size = v;
        }
        if let Some(v) = self.text_color {
            config.text_color = v;
        }
        if let Some(v) = self.inactive_color {
            config.inactive_color = v;
        }
        if let Some(v) = self.spacing {
            config.spacing = v;
        }
        if let Some(v) = self.blur_max {
            config.blur_max = v;
        }
        if let Some(v) = self.active_scale {
            config.active_scale = v;
        }
        if let Some(v) = self.inactive_scale {
            config.inactive_scale = v;
        }
        if let Some(v) = self.damping {
            config.damping = v;
        }
        if let Some(v) = self.alignment {
            config.alignment = v;
        }
        if let Some(v) = self.text_lift {
            config.text_lift = v;
        }
    }
}

/// Resolve the effective config: file (or defaults), then overrides
///
/// An explicit `path` must exist. Without one the default location is used
/// when it holds a file.
pub fn resolve_config(
    path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> anyhow::Result<ValidConfig> {
    let mut config = match path {
        Some(path) => ScriptConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => ScriptConfig::load().context("Failed to load the default config")?,
    };
    overrides.apply(&mut config);
    config.validated().context("Invalid configuration")
}

/// Lyrics from `path`, or the built-in sample
pub fn resolve_lyrics(path: Option<&Path>) -> anyhow::Result<LyricSequence> {
    match path {
        Some(path) => {
            load_lyrics(path).with_context(|| format!("Failed to load lyrics from {:?}", path))
        }
        None => Ok(sample_lyrics()),
    }
}

/// One line of a `frame` report
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LineReport<'a> {
    index: usize,
    text: &'a str,
    #[serde(flatten)]
    state: LineVisualState,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FrameReport<'a> {
    active_position: f64,
    lines: Vec<LineReport<'a>>,
}

/// Application state for one command
pub struct App {
    config: ValidConfig,
    lyrics: LyricSequence,
    engine: Arc<LyricsEngine>,
}

impl App {
    pub fn new(config: ValidConfig, lyrics: LyricSequence) -> Self {
        let engine = Arc::new(LyricsEngine::new(config.clone(), lyrics.len()));
        Self {
            config,
            lyrics,
            engine,
        }
    }

    pub fn lyrics(&self) -> &LyricSequence {
        &self.lyrics
    }

    /// Animate in the terminal until the step limit or Ctrl-C
    pub async fn run_preview(&self, options: DriverOptions) -> anyhow::Result<DriverSummary> {
        let sink = TerminalSink::stdout(&self.lyrics);
        self.run_driver(options, sink).await
    }

    /// Drive `sink` until the step limit or Ctrl-C
    pub async fn run_driver<S: FrameSink>(
        &self,
        options: DriverOptions,
        sink: S,
    ) -> anyhow::Result<DriverSummary> {
        tracing::info!(
            "Previewing {} lines from line {} every {:?}",
            self.lyrics.len(),
            options.start_index,
            options.step_period
        );

        let mut handle = RenderDriver::new(Arc::clone(&self.engine), options).spawn(sink);
        let mut frames = handle.frames();

        loop {
            tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    signal.context("Failed to listen for Ctrl-C")?;
                    tracing::info!("Interrupted, stopping preview");
                    handle.stop();
                    break;
                }
                changed = frames.changed() => {
                    // the driver dropped its sender, so it has finished
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        let summary = handle.join().await?;
        tracing::info!(
            "Preview ended on line {} after {} steps ({} frames)",
            summary.final_index,
            summary.steps,
            summary.frames
        );
        Ok(summary)
    }

    /// Line visual states at `active` as pretty JSON
    pub fn frame_json(&self, active: f64) -> anyhow::Result<String> {
        if !active.is_finite() {
            bail!("Active position must be a finite number, got {}", active);
        }
        let frame = self.engine.frame_par(0, active);
        let report = FrameReport {
            active_position: frame.active_position,
            lines: self
                .lyrics
                .lines()
                .iter()
                .zip(frame.lines)
                .enumerate()
                .map(|(index, (line, state))| LineReport {
                    index,
                    text: &line.text,
                    state,
                })
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&report)?)
    }

    /// Visual state of a single line at `active` as pretty JSON
    pub fn line_json(&self, index: usize, active: f64) -> anyhow::Result<String> {
        if !active.is_finite() {
            bail!("Active position must be a finite number, got {}", active);
        }
        let state = self.engine.line_state(index, active)?;
        let report = LineReport {
            index,
            text: &self.lyrics.lines()[index].text,
            state,
        };
        Ok(serde_json::to_string_pretty(&report)?)
    }

    /// Write the host script to `out` (a directory or a file path)
    pub fn export(&self, out: &Path, marker_interval: Duration) -> anyhow::Result<PathBuf> {
        let artifact = ScriptEmitter::new(&self.config, &self.lyrics)
            .with_marker_interval(marker_interval)
            .artifact();
        artifact
            .write_to(out)
            .with_context(|| format!("Failed to write script to {:?}", out))
    }
}

/// Pretty JSON of the effective config
pub fn config_json(config: &ValidConfig) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&**config)?)
}

/// Save the effective config, to `out` or the default location
pub fn init_config(config: &ValidConfig, out: Option<&Path>) -> anyhow::Result<PathBuf> {
    let path = match out {
        Some(path) => path.to_path_buf(),
        None => ScriptConfig::file_path().context("No config directory on this platform")?,
    };
    config
        .save_to_file(&path)
        .with_context(|| format!("Failed to save config to {:?}", path))?;
    tracing::info!("Config saved to {:?}", path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::lyrics::Frame;
    use parking_lot::Mutex;

    #[derive(Clone, Default)]
    struct Counter(Arc<Mutex<Vec<f64>>>);

    impl FrameSink for Counter {
        fn render(&mut self, frame: &Frame) {
            self.0.lock().push(frame.active_position);
        }
    }

    fn app() -> App {
        App::new(ScriptConfig::default().validated().unwrap(), sample_lyrics())
    }

    #[test]
    fn test_overrides_win_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "spacing": 200, "blurMax": 5 }"#).unwrap();

        let overrides = ConfigOverrides {
            spacing: Some(150.0),
            text_color: Some(Rgb::new(0xFF, 0, 0)),
            alignment: Some(Alignment::Center),
            inactive_scale: Some(0.9),
            ..Default::default()
        };
        let config = resolve_config(Some(&path), &overrides).unwrap();
        assert_eq!(config.spacing, 150.0);
        assert_eq!(config.inactive_scale, 0.9);
        assert_eq!(config.blur_max, 5.0);
        assert_eq!(config.text_color.to_string(), "#FF0000");
        assert_eq!(config.alignment, Alignment::Center);
    }

    #[test]
    fn test_explicit_missing_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = resolve_config(Some(&dir.path().join("none.json")), &Default::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{}").unwrap();
        let overrides = ConfigOverrides {
            spacing: Some(0.0),
            ..Default::default()
        };
        let err = resolve_config(Some(&path), &overrides).unwrap_err();
        assert!(format!("{:#}", err).contains("spacing"));
    }

    #[test]
    fn test_resolve_lyrics_defaults_to_sample() {
        assert_eq!(resolve_lyrics(None).unwrap(), sample_lyrics());
    }

    #[test]
    fn test_frame_json() {
        let json = app().frame_json(2.0).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["activePosition"], 2.0);
        let lines = value["lines"].as_array().unwrap();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[2]["text"], "一秒绽放一秒又坠落");
        assert_eq!(lines[2]["offsetY"], 0.0);
        assert_eq!(lines[2]["weight"], "bold");
        assert_eq!(lines[2]["color"], "#FFFFFF");
        assert_eq!(lines[0]["offsetY"], -360.0);
        assert_eq!(lines[0]["blur"], 20.0);

        assert!(app().frame_json(f64::NAN).is_err());
    }

    #[test]
    fn test_inactive_scale_override_is_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{}").unwrap();
        let overrides = ConfigOverrides {
            inactive_scale: Some(1.5),
            ..Default::default()
        };
        let err = resolve_config(Some(&path), &overrides).unwrap_err();
        assert!(format!("{:#}", err).contains("inactiveScale"));
    }

    #[test]
    fn test_line_json() {
        let json = app().line_json(3, 2.0).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["index"], 3);
        assert_eq!(value["offsetY"], 180.0);
        assert_eq!(value["weight"], "normal");
        assert_eq!(value["color"], "#878787");

        // the sample has 7 lines
        let err = app().line_json(7, 2.0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Line index 7 out of range for 7 lyric lines"
        );
        assert!(app().line_json(0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_export_writes_script() {
        let dir = tempfile::tempdir().unwrap();
        let path = app().export(dir.path(), Duration::from_secs(2)).unwrap();
        assert_eq!(path.file_name().unwrap(), "AM_Lyrics_Generator_v2.jsx");
        let script = std::fs::read_to_string(path).unwrap();
        assert!(script.contains("app.beginUndoGroup"));
    }

    #[test]
    fn test_init_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScriptConfig {
            damping: 1.5,
            ..Default::default()
        }
        .validated()
        .unwrap();
        let path = init_config(&config, Some(&dir.path().join("nested/config.json"))).unwrap();
        let loaded = resolve_config(Some(&path), &Default::default()).unwrap();
        assert_eq!(loaded, config);
        assert!(config_json(&config).unwrap().contains("\"damping\": 1.5"));
    }

    #[tokio::test]
    async fn test_run_driver_until_step_limit() {
        let counter = Counter::default();
        let options = DriverOptions {
            start_index: 0,
            step_period: Duration::from_millis(5),
            frame_period: None,
            max_steps: Some(2),
        };
        let summary = app().run_driver(options, counter.clone()).await.unwrap();

        assert_eq!(summary.steps, 2);
        assert_eq!(summary.final_index, 2);
        assert_eq!(*counter.0.lock(), [0.0, 1.0, 2.0]);
    }
}
