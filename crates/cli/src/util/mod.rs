// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use anyhow::{Result, bail};
use std::{
    fs::File,
    io::{self, BufRead, Write, stdin, stdout},
    path::Path,
};

/// Where the generated document goes: the given file, or stdout when there is none.
///
/// An existing file is only replaced when `yes` is set or the user agrees at the prompt.
pub fn open_file_for_output(output: Option<&Path>, yes: bool) -> Result<Box<dyn Write + Send>> {
    open_output(output, yes, &mut stdin().lock())
}

fn open_output(
    output: Option<&Path>,
    yes: bool,
    answers: &mut dyn BufRead,
) -> Result<Box<dyn Write + Send>> {
    let Some(output) = output else {
        return Ok(Box::new(stdout()));
    };

    if output.exists() && !yes && !confirm_overwrite(output, answers)? {
        bail!("Not overwriting file");
    }

    Ok(Box::new(File::create(output)?))
}

/// Stdout may carry the document, so the question goes to stderr.
fn confirm_overwrite(output: &Path, answers: &mut dyn BufRead) -> Result<bool> {
    eprint!(
        "File `{}` already exists. Overwrite? [y/N]: ",
        output.display()
    );
    io::stderr().flush()?;

    let mut answer = String::new();
    answers.read_line(&mut answer)?;

    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}
