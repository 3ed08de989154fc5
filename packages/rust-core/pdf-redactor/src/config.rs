//! Redaction configuration types

use serde::{Deserialize, Serialize};

/// Default value for draw_visual_marker field (enabled by default)
fn default_draw_visual_marker() -> bool {
    true
}

/// Default value for case_sensitive_search field (enabled by default)
fn default_case_sensitive_search() -> bool {
    true
}

/// Default value for recurse_form_xobjects field (enabled by default)
fn default_recurse_form_xobjects() -> bool {
    true
}

/// How a glyph's bounding box is tested against a redaction area.
///
/// The strategy trades thoroughness against collateral removal: a glyph that
/// merely touches an area is dropped under `AnyOverlap` but survives under
/// `CenterPoint` or `FullyContained`.
///
/// # Examples
///
/// ```
/// use pdf_redactor::GlyphRemovalStrategy;
///
/// let strategy = GlyphRemovalStrategy::default();
/// assert_eq!(strategy, GlyphRemovalStrategy::AnyOverlap);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum GlyphRemovalStrategy {
    /// Remove when the center of the glyph's bounding box lies inside an
    /// area
    CenterPoint,

    /// Remove on any non-empty intersection with an area
    #[default]
    AnyOverlap,

    /// Remove only when the glyph's bounding box is fully inside an area
    FullyContained,
}

/// RGB color for the visual marker, components in [0, 1]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MarkerColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl MarkerColor {
    /// Solid black, the conventional redaction bar color
    pub const BLACK: MarkerColor = MarkerColor {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    /// Create a color, clamping each component into [0, 1]
    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
        }
    }
}

impl Default for MarkerColor {
    fn default() -> Self {
        MarkerColor::BLACK
    }
}

/// Configuration for a redaction call
///
/// # Examples
///
/// ```
/// use pdf_redactor::{GlyphRemovalStrategy, MarkerColor, RedactionConfig};
///
/// // Defaults: black markers, any-overlap removal, recursion enabled
/// let config = RedactionConfig::default();
/// assert!(config.draw_visual_marker);
///
/// // Paranoid center-point removal with dark red bars
/// let config = RedactionConfig {
///     glyph_removal_strategy: GlyphRemovalStrategy::CenterPoint,
///     marker_color: MarkerColor::rgb(0.5, 0.0, 0.0),
///     ..Default::default()
/// };
/// # let _ = config;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionConfig {
    /// Draw a filled rectangle over each redaction area
    #[serde(default = "default_draw_visual_marker")]
    pub draw_visual_marker: bool,

    /// Fill color for the visual marker
    #[serde(default)]
    pub marker_color: MarkerColor,

    /// How glyph boxes are tested against redaction areas
    #[serde(default)]
    pub glyph_removal_strategy: GlyphRemovalStrategy,

    /// Case-sensitive matching in the text-search collaborator; the core
    /// pipeline itself is unaffected
    #[serde(default = "default_case_sensitive_search")]
    pub case_sensitive_search: bool,

    /// Recurse into Form XObjects whose bounds intersect a redaction area
    #[serde(default = "default_recurse_form_xobjects")]
    pub recurse_form_xobjects: bool,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            draw_visual_marker: true,
            marker_color: MarkerColor::default(),
            glyph_removal_strategy: GlyphRemovalStrategy::default(),
            case_sensitive_search: true,
            recurse_form_xobjects: true,
        }
    }
}
