//! After Effects script export
//!
//! Writes a self-contained ExtendScript (`.jsx`) that builds a composition
//! with one text layer per lyric line. Every layer property is driven by an
//! expression transcribed from the same [`LensModel`] the preview uses, and
//! the active position comes from markers on a control layer, so the host
//! re-evaluates the effect per frame on its own timeline.

pub mod expression;

use std::fmt::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::features::lyrics::engine::LensModel;
use crate::features::lyrics::LyricSequence;
use crate::features::settings::{Alignment, ValidConfig};

use expression::{js_string, HostLiteral, LineExpressions, ACTIVE_SLIDER, CONTROL_LAYER};

/// Fixed name of the exported script
pub const EXPORT_FILE_NAME: &str = "AM_Lyrics_Generator_v2.jsx";
/// Media type offered with the exported bytes
pub const EXPORT_MEDIA_TYPE: &str = "text/javascript";
/// Product label written into the script header and undo group
pub const PRODUCT_LABEL: &str = "AM Lyrics Generator v2";

/// Exported file, ready to be written or offered for download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: &'static str,
    pub media_type: &'static str,
    pub bytes: Vec<u8>,
}

impl Artifact {
    /// Write the bytes to `target`
    ///
    /// A directory target receives the file under [`EXPORT_FILE_NAME`].
    pub fn write_to(&self, target: &Path) -> std::io::Result<PathBuf> {
        let path = if target.is_dir() {
            target.join(self.file_name)
        } else {
            target.to_path_buf()
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, &self.bytes)?;
        tracing::info!("Exported {:?} ({} bytes)", path, self.bytes.len());
        Ok(path)
    }
}

/// Builds the host script for a config and a lyric sequence
#[derive(Debug, Clone)]
pub struct ScriptEmitter<'a> {
    config: &'a ValidConfig,
    lyrics: &'a LyricSequence,
    lens: LensModel,
    marker_interval: Duration,
}

impl<'a> ScriptEmitter<'a> {
    pub fn new(config: &'a ValidConfig, lyrics: &'a LyricSequence) -> Self {
        Self {
            config,
            lyrics,
            lens: LensModel::new(config),
            marker_interval: Duration::from_secs(2),
        }
    }

    /// Spacing of generated markers for lyrics without timing
    pub fn with_marker_interval(mut self, interval: Duration) -> Self {
        self.marker_interval = interval;
        self
    }

    /// Marker time in seconds for every line
    ///
    /// LRC start times are used when every line has one, otherwise lines are
    /// spaced evenly from 0. Times are strictly increasing: a line sharing
    /// its start time with the previous one is pushed one frame later, since
    /// the host keeps a single marker per time.
    pub fn marker_times(&self) -> Vec<f64> {
        let mut times: Vec<f64> = if self.lyrics.is_timed() {
            self.lyrics
                .lines()
                .iter()
                .map(|l| l.start_time.unwrap_or_default() as f64 / 1000.0)
                .collect()
        } else {
            let step = self.marker_interval.as_secs_f64();
            (0..self.lyrics.len()).map(|i| i as f64 * step).collect()
        };

        let frame = 1.0 / self.config.fps;
        for i in 1..times.len() {
            if times[i] <= times[i - 1] {
                times[i] = times[i - 1] + frame;
            }
        }

        let late = times.iter().filter(|&&t| t >= self.config.duration).count();
        if late > 0 {
            tracing::warn!(
                "{} of {} lyric markers fall at or after the composition end ({}s) and will not be reached",
                late,
                times.len(),
                self.config.duration
            );
        }
        times
    }

    /// The complete script text
    pub fn script(&self) -> String {
        self.to_string()
    }

    /// The script as a downloadable artifact
    pub fn artifact(&self) -> Artifact {
        let bytes = self.script().into_bytes();
        tracing::debug!("Generated {} ({} bytes)", EXPORT_FILE_NAME, bytes.len());
        Artifact {
            file_name: EXPORT_FILE_NAME,
            media_type: EXPORT_MEDIA_TYPE,
            bytes,
        }
    }

    fn write_config(&self, f: &mut impl Write) -> fmt::Result {
        let c = self.config;
        writeln!(f, "    var CONFIG = {{")?;
        writeln!(f, "        compName: {},", js_string(&c.comp_name))?;
        writeln!(f, "        width: {},", c.width)?;
        writeln!(f, "        height: {},", c.height)?;
        writeln!(f, "        fps: {},", c.fps.literal())?;
        writeln!(f, "        duration: {},", c.duration.literal())?;
        writeln!(f, "        fontSize: {},", c.font_size.literal())?;
        writeln!(f, "        fontName: {},", js_string(&c.font_name))?;
        writeln!(f, "        textColor: {},", js_string(&c.text_color.to_string()))?;
        writeln!(f, "        inactiveColor: {},", js_string(&c.inactive_color.to_string()))?;
        writeln!(f, "        spacing: {},", c.spacing.literal())?;
        writeln!(f, "        blurMax: {},", c.blur_max.literal())?;
        writeln!(f, "        activeScale: {},", c.active_scale.literal())?;
        writeln!(f, "        inactiveScale: {}, // reserved, not applied", c.inactive_scale.literal())?;
        writeln!(f, "        damping: {},", c.damping.literal())?;
        writeln!(f, "        alignment: {},", js_string(&c.alignment.to_string()))?;
        writeln!(f, "        textLift: {}", c.text_lift.literal())?;
        writeln!(f, "    }};")
    }

    fn write_lyrics(&self, f: &mut impl Write) -> fmt::Result {
        writeln!(f, "    var LYRICS = [")?;
        for (i, line) in self.lyrics.lines().iter().enumerate() {
            let sep = if i + 1 < self.lyrics.len() { "," } else { "" };
            writeln!(f, "        {}{}", js_string(&line.text), sep)?;
        }
        writeln!(f, "    ];")?;

        let markers: Vec<String> = self.marker_times().iter().map(|t| t.literal()).collect();
        writeln!(f, "    var MARKERS = [{}];", markers.join(", "))
    }

    fn write_expressions(&self, f: &mut impl Write) -> fmt::Result {
        let exprs = LineExpressions::new(&self.lens, self.config);
        writeln!(f, "    var ACTIVE_EXPR = {};", js_string(&expression::active_index(self.config.damping)))?;
        writeln!(f, "    var POSITION_EXPR = {};", js_string(&exprs.position))?;
        writeln!(f, "    var SCALE_EXPR = {};", js_string(&exprs.scale))?;
        writeln!(f, "    var OPACITY_EXPR = {};", js_string(&exprs.opacity))?;
        writeln!(f, "    var BLUR_EXPR = {};", js_string(&exprs.blur))?;
        writeln!(f, "    var STYLE_EXPR = {};", js_string(&exprs.style))?;
        writeln!(f)?;

        // the host splices in the line index
        writeln!(f, "    function prelude(i) {{")?;
        writeln!(
            f,
            "        return {} + \"var line = \" + i + \";\\n\" + {};",
            js_string(&LineExpressions::prelude_head()),
            js_string(LineExpressions::prelude_tail())
        )?;
        writeln!(f, "    }}")
    }
}

impl fmt::Display for ScriptEmitter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let justification = match self.config.alignment {
            Alignment::Left => "ParagraphJustification.LEFT_JUSTIFY",
            Alignment::Center => "ParagraphJustification.CENTER_JUSTIFY",
        };

        writeln!(f, "// {}", PRODUCT_LABEL)?;
        writeln!(f, "// Apple Music-style scrolling lyrics for After Effects.")?;
        writeln!(f, "// File > Scripts > Run Script File... and pick this file.")?;
        writeln!(f, "(function () {{")?;
        self.write_config(f)?;
        writeln!(f)?;
        self.write_lyrics(f)?;
        writeln!(f)?;
        self.write_expressions(f)?;
        writeln!(f)?;
        f.write_str(
            r##"    function hexToRgb(hex) {
        var v = parseInt(hex.replace("#", ""), 16);
        return [((v >> 16) & 255) / 255, ((v >> 8) & 255) / 255, (v & 255) / 255];
    }

"##,
        )?;
        writeln!(f, "    app.beginUndoGroup({});", js_string(PRODUCT_LABEL))?;
        f.write_str(
            r#"    var comp = app.project.items.addComp(CONFIG.compName, CONFIG.width, CONFIG.height, 1, CONFIG.duration, CONFIG.fps);

    var ctrl = comp.layers.addNull(CONFIG.duration);
"#,
        )?;
        writeln!(f, "    ctrl.name = {};", js_string(CONTROL_LAYER))?;
        f.write_str(
            r#"    ctrl.enabled = false;
    var slider = ctrl.property("ADBE Effect Parade").addProperty("ADBE Slider Control");
"#,
        )?;
        writeln!(f, "    slider.name = {};", js_string(ACTIVE_SLIDER))?;
        f.write_str(
            r#"    var markers = ctrl.property("ADBE Marker");
    for (var m = 0; m < MARKERS.length; m++) {
        markers.setValueAtTime(MARKERS[m], new MarkerValue(LYRICS[m]));
    }
    slider.property("ADBE Slider Control-0001").expression = ACTIVE_EXPR;

    for (var i = LYRICS.length - 1; i >= 0; i--) {
        var layer = comp.layers.addText(LYRICS[i]);
        layer.name = (i + 1) + " " + LYRICS[i];

        var textProp = layer.property("ADBE Text Properties").property("ADBE Text Document");
        var doc = textProp.value;
        doc.font = CONFIG.fontName;
        doc.fontSize = CONFIG.fontSize;
        doc.applyFill = true;
        doc.fillColor = hexToRgb(CONFIG.inactiveColor);
"#,
        )?;
        writeln!(f, "        doc.justification = {};", justification)?;
        f.write_str(
            r#"        textProp.setValue(doc);
        textProp.expression = prelude(i) + STYLE_EXPR;

        var blur = layer.property("ADBE Effect Parade").addProperty("ADBE Gaussian Blur 2");
        blur.property("ADBE Gaussian Blur 2-0001").expression = prelude(i) + BLUR_EXPR;

        var xf = layer.property("ADBE Transform Group");
        xf.property("ADBE Position").expression = prelude(i) + POSITION_EXPR;
        xf.property("ADBE Scale").expression = prelude(i) + SCALE_EXPR;
        xf.property("ADBE Opacity").expression = prelude(i) + OPACITY_EXPR;
    }

    app.endUndoGroup();
})();
"#,
        )
    }
}
