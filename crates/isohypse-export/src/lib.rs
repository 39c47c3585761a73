//! isohypse-export: Pure format serializers (sans-IO)
//!
//! Converts contour sets into output formats. Currently supports SVG.

pub mod svg;

pub use svg::{SvgMetadata, SvgStyle, build_path_data, to_svg};
