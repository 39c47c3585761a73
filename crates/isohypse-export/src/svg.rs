//! SVG export serializer.
//!
//! Converts a [`ContourSet`] into an SVG string with one `<path>` element
//! per contour, using the [`svg`] crate for document construction, XML
//! escaping, and path data formatting.
//!
//! Each polyline becomes a `<path>` using `M` (move to) and `L` (line
//! to) commands. Major (index) contours are drawn with a wider stroke,
//! as on printed topographic maps.
//!
//! Optional [`SvgMetadata`] embeds `<title>` and `<desc>` elements for
//! accessibility and to help file managers identify exported files.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Description, Element, Path, Title};
use svg::node::{Node, Text, Value};

use isohypse_pipeline::{ContourSet, Polyline};

/// Metadata to embed in the SVG document.
///
/// All fields are optional. When present, `<title>`, `<desc>` and
/// `<metadata>` elements are emitted in that order immediately after the
/// opening `<svg>` tag.
///
/// Text values are XML-escaped automatically by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    ///
    /// Typically the source height map filename (without extension).
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,

    /// Serialized [`ContourConfig`](isohypse_pipeline::ContourConfig),
    /// emitted inside a `<metadata>` element wrapped in a namespaced
    /// `<isohypse:config>` element so exported files carry their
    /// settings.
    pub config_json: Option<&'a str>,
}

/// Stroke styling for exported contours.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgStyle {
    /// Stroke colour for every contour (any SVG paint value).
    pub stroke: String,

    /// Stroke width of ordinary contours, in field units.
    pub stroke_width: f64,

    /// Multiplier applied to `stroke_width` for major contours.
    pub major_width_factor: f64,
}

impl SvgStyle {
    /// Default major contour width multiplier.
    pub const DEFAULT_MAJOR_WIDTH_FACTOR: f64 = 3.0;

    /// Stroke width for a contour.
    #[must_use]
    pub fn width_for(&self, major: bool) -> f64 {
        if major {
            self.stroke_width * self.major_width_factor
        } else {
            self.stroke_width
        }
    }
}

impl Default for SvgStyle {
    fn default() -> Self {
        Self {
            stroke: "black".to_string(),
            stroke_width: 1.0,
            major_width_factor: Self::DEFAULT_MAJOR_WIDTH_FACTOR,
        }
    }
}

/// Build an SVG path `d` attribute string from a polyline.
///
/// Uses `M` for the first point and `L` for subsequent points.
/// Returns an empty string for polylines with fewer than 2 points.
///
/// Coordinates are formatted by the [`svg`] crate using `f32` precision
/// (sufficient for sample-space coordinates from the pipeline).
///
/// # Examples
///
/// ```
/// use isohypse_pipeline::{Point, Polyline};
/// use isohypse_export::build_path_data;
///
/// let polyline = Polyline::new(vec![
///     Point::new(10.0, 20.0),
///     Point::new(30.0, 40.0),
/// ]);
/// let d = build_path_data(&polyline);
/// assert_eq!(d, "M10,20 L30,40");
/// ```
#[must_use]
pub fn build_path_data(polyline: &Polyline) -> String {
    let points = polyline.points();
    if points.len() < 2 {
        return String::new();
    }

    let first = &points[0];
    let mut data = Data::new().move_to((first.x, first.y));
    for p in &points[1..] {
        data = data.line_to((p.x, p.y));
    }
    String::from(Value::from(data))
}

/// Serialize a contour set into an SVG document.
///
/// The `viewBox` spans the source field, so contour coordinates are
/// used unchanged. Contours with fewer than 2 points are skipped. Each
/// `<path>` carries its level in a `data-iso` attribute, and major
/// contours get `class="major"`.
#[must_use]
pub fn to_svg(set: &ContourSet, metadata: &SvgMetadata<'_>, style: &SvgStyle) -> String {
    let w = set.dimensions.width;
    let h = set.dimensions.height;
    let mut doc = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", (0, 0, w, h));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    if let Some(config_json) = metadata.config_json {
        let mut config_el = Element::new("isohypse:config");
        config_el.assign("xmlns:isohypse", "urn:isohypse:config:1");
        config_el.append(Text::new(config_json));
        let mut metadata_el = Element::new("metadata");
        metadata_el.append(config_el);
        doc = doc.add(metadata_el);
    }

    for contour in &set.contours {
        let d = build_path_data(&contour.polyline);
        if d.is_empty() {
            continue;
        }

        let mut path = Path::new()
            .set("d", d)
            .set("fill", "none")
            .set("stroke", style.stroke.as_str())
            .set("stroke-width", style.width_for(contour.major))
            .set("data-iso", contour.iso_value);
        if contour.major {
            path = path.set("class", "major");
        }
        doc = doc.add(path);
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}
