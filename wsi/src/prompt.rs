//! Interactive selection of the release tag and the install directory.
//!
//! Both prompts are written against generic reader/writer parameters so the
//! loops can be driven by in-memory buffers in tests; the real callers hand
//! them locked stdin and stdout.

use crate::{index::ReleaseIndex, paths};
use anyhow::{Context, Result};
use std::{
    io::{BufRead, Write},
    path::PathBuf,
};

/// Lists the available tags, marking the default with ` *`, and reads one
/// line of input. Empty input selects the default; anything else must be a
/// known tag or the listing and the prompt repeat. There is no retry cap.
pub(crate) fn select_tag<R: BufRead, W: Write>(
    index: &ReleaseIndex,
    mut input: R,
    mut output: W,
) -> Result<String> {
    let default_tag = index.default_tag()?;

    loop {
        writeln!(output, "Available WASI SDK releases:")?;
        for tag in index.tags() {
            if tag == default_tag {
                writeln!(output, "{tag} *")?;
            } else {
                writeln!(output, "{tag}")?;
            }
        }
        write!(output, "Release to install [{default_tag}]: ")?;
        output.flush()?;

        let choice = read_line(&mut input)?;
        if choice.is_empty() {
            return Ok(default_tag.to_string());
        }
        if index.contains_tag(&choice) {
            return Ok(choice);
        }
        writeln!(output, "Invalid release: {choice}")?;
    }
}

/// Prompts for the install directory, suggesting
/// `<home>/opt/wasi-sdk/<version>`. Empty input accepts the suggestion.
pub(crate) fn select_install_dir<R: BufRead, W: Write>(
    tag: &str,
    mut input: R,
    mut output: W,
) -> Result<PathBuf> {
    let version = paths::sdk_version(tag)?;
    let default_dir = paths::default_install_dir(version)?;

    write!(output, "Install directory [{}]: ", default_dir.display())?;
    output.flush()?;

    let choice = read_line(&mut input)?;
    if choice.is_empty() {
        Ok(default_dir)
    } else {
        Ok(PathBuf::from(choice))
    }
}

fn read_line<R: BufRead>(input: &mut R) -> Result<String> {
    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("failed to read from standard input")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
