use crate::config::RenderConfig;
use crate::error::{Error, Result, write_bytes};
use std::path::Path;

/// Rasterizes an SVG document produced by [`super::SvgCanvas`] into PNG bytes.
pub fn rasterize_png(svg: &str, render_cfg: &RenderConfig, font_family: &str) -> Result<Vec<u8>> {
    let mut opt = usvg::Options::default();
    opt.font_family = font_family.to_string();
    if let Some(size) = usvg::Size::from_wh(render_cfg.width.max(1.0), render_cfg.height.max(1.0)) {
        opt.default_size = size;
    }
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt).map_err(|err| Error::Raster(err.to_string()))?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| Error::Raster("failed to allocate pixmap".to_string()))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap
        .encode_png()
        .map_err(|err| Error::Raster(err.to_string()))
}

pub fn write_output_png(
    svg: &str,
    output: &Path,
    render_cfg: &RenderConfig,
    font_family: &str,
) -> Result<()> {
    let bytes = rasterize_png(svg, render_cfg, font_family)?;
    write_bytes(output, bytes)
}
