//! Host expression transcription
//!
//! Renders the engine's lens formulas as After Effects expression source.
//! Only the lens values themselves are read here, so the preview and the
//! exported script cannot drift apart.

use crate::features::lyrics::engine::lens::{Grid, LensModel, Ramp, Step};
use crate::features::lyrics::engine::physics::SETTLE_RATE;
use crate::features::settings::{Rgb, ValidConfig};

/// Name of the null layer carrying markers and the active index slider
pub const CONTROL_LAYER: &str = "Lyrics Control";
/// Name of the slider effect holding the active position
pub const ACTIVE_SLIDER: &str = "Active Index";

/// A value that can be written as an ExtendScript literal
pub trait HostLiteral {
    fn literal(&self) -> String;
}

impl HostLiteral for f64 {
    /// Always carries a decimal point or exponent (`180.0`, `0.8`)
    fn literal(&self) -> String {
        format!("{:?}", self)
    }
}

impl HostLiteral for bool {
    fn literal(&self) -> String {
        self.to_string()
    }
}

impl HostLiteral for Rgb {
    /// Normalised `[r, g, b]` array as AE colour properties expect
    fn literal(&self) -> String {
        let [r, g, b] = self.to_unit();
        format!("[{}, {}, {}]", r.literal(), g.literal(), b.literal())
    }
}

/// Escape `s` as a double-quoted ES3 string literal
///
/// Non-ASCII characters are written as `\uXXXX` escapes so the script parses
/// regardless of how the host decodes the file.
pub fn js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{:04X}", unit));
                }
            }
        }
    }
    out.push('"');
    out
}

/// `ramp` evaluated at `var`, mirroring [`Ramp::eval`]
pub fn ramp(var: &str, ramp: &Ramp) -> String {
    let start = ramp.start.literal();
    let end = ramp.end.literal();
    let t = format!("(({var} - {start}) / ({end} - {start}))");
    format!(
        "(({var} <= {start}) ? {from} : (({var} < {end}) ? ({from} + ({to} - {from}) * {t}) : {to}))",
        from = ramp.from.literal(),
        to = ramp.to.literal(),
    )
}

/// `step` evaluated at `var`, mirroring [`Step::eval`]
pub fn step<T: HostLiteral + Copy>(var: &str, step: &Step<T>) -> String {
    format!(
        "(({var} < {}) ? {} : {})",
        step.threshold.literal(),
        step.below.literal(),
        step.at_or_above.literal()
    )
}

/// Grid offset of `line` for focus `active`, mirroring [`Grid::offset`]
pub fn grid(line: &str, active: &str, grid: &Grid) -> String {
    let pitch = grid.pitch.literal();
    format!("({line} * {pitch} - {active} * {pitch})")
}

/// Damped transition progress after `elapsed` seconds
pub fn settle_progress(elapsed: &str, damping: f64) -> String {
    format!(
        "(({elapsed} <= 0) ? 0 : (1 - Math.exp(-{} * {} * {elapsed})))",
        damping.literal(),
        SETTLE_RATE.literal()
    )
}

/// Expression bodies for one lens, shared by every lyric layer
///
/// Each body expects `line`, `active` and `diff` to be defined by
/// [`LineExpressions::prelude`].
#[derive(Debug, Clone)]
pub struct LineExpressions {
    pub position: String,
    pub scale: String,
    pub opacity: String,
    pub blur: String,
    pub style: String,
}

impl LineExpressions {
    pub fn new(lens: &LensModel, config: &ValidConfig) -> Self {
        let x = config.width as f64 * config.alignment.x_fraction();
        let center_y = config.height as f64 / 2.0;

        Self {
            position: format!(
                "[{}, {} + {} - {}];",
                x.literal(),
                center_y.literal(),
                grid("line", "active", &lens.grid),
                config.text_lift.literal()
            ),
            scale: format!(
                "var s = {};\n[s * 100, s * 100];",
                ramp("diff", &lens.scale)
            ),
            opacity: format!("{} * 100;", ramp("diff", &lens.opacity)),
            blur: format!("{};", step("diff", &lens.blur)),
            style: format!(
                "var e = {};\ntext.sourceText.style.setFillColor(e ? {} : {}).setFauxBold(e);",
                step("diff", &lens.emphasis),
                config.text_color.literal(),
                config.inactive_color.literal()
            ),
        }
    }

    /// Shared header binding `line`, `active` and `diff`
    pub fn prelude(line_index: usize) -> String {
        format!(
            "{}var line = {};\n{}",
            Self::prelude_head(),
            line_index,
            Self::prelude_tail()
        )
    }

    /// Part of the prelude before the `line` binding
    pub fn prelude_head() -> String {
        format!(
            "var active = thisComp.layer({}).effect({})(\"Slider\");\n",
            js_string(CONTROL_LAYER),
            js_string(ACTIVE_SLIDER)
        )
    }

    /// Part of the prelude after the `line` binding
    pub fn prelude_tail() -> &'static str {
        "var diff = Math.abs(line - active);\n"
    }
}

/// Slider expression deriving the active position from layer markers
///
/// The n-th passed marker focuses line n - 1. Each move starts from wherever
/// the previous glide had reached when its marker was passed, the same way
/// the render driver chains its transitions.
pub fn active_index(damping: f64) -> String {
    let progress = settle_progress("t", damping);
    format!(
        "var m = thisLayer.marker;\n\
         var from = 0;\n\
         var to = 0;\n\
         var since = 0;\n\
         for (var k = 1; k <= m.numKeys; k++) {{\n\
         \x20   var at = m.key(k).time;\n\
         \x20   if (at > time) {{ break; }}\n\
         \x20   var t = at - since;\n\
         \x20   from = from + (to - from) * {progress};\n\
         \x20   to = k - 1;\n\
         \x20   since = at;\n\
         }}\n\
         var t = time - since;\n\
         from + (to - from) * {progress};"
    )
}
