//! `--output` mode: render the first matching file to disk without a viewer.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::errors::ViewerError;
use crate::services::{FileService, RenderService};

/// Render the first file matched by `masks` into `output`, returning the source path
pub fn run(
    files: &FileService,
    renderer: &RenderService,
    masks: &[String],
    output: &Path,
) -> Result<PathBuf, ViewerError> {
    if masks.is_empty() {
        return Err(ViewerError::NoMasks);
    }
    let source = files.expand(masks).into_iter().next().ok_or(ViewerError::NoFiles)?;
    let html = renderer.render(&source)?;

    let output = files.absolute(output);
    fs::write(&output, html).map_err(|e| ViewerError::Write { path: output.clone(), source: e })?;
    info!("Wrote {:?} to {:?}", source, output);
    Ok(source)
}
