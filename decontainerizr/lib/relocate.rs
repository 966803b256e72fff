//! Script relocation.
//!
//! Scripts listed in `cfg/relocatable_scripts` get their interpreter line pointed at the launcher,
//! so that running them goes through the launcher again. The argument portion of the line (the
//! launch request) is kept as is.

use std::{
    ffi::OsStr,
    fs::{self, OpenOptions},
    io::{self, Read, Seek, Write},
    os::unix::ffi::OsStrExt,
    path::{Path, PathBuf},
};

use getset::Getters;

use crate::{
    config::RELOCATABLE_SCRIPTS_FILENAME,
    utils::{is_target_under, weakly_canonical},
    ConfigWarning, DecontainerizrResult,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The outcome of pointing a script's interpreter line at a new interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShebangRewrite {
    /// The interpreter line was replaced.
    Rewritten,

    /// The interpreter line already named the new interpreter; the file was left untouched.
    AlreadyRelocated,
}

/// What a relocation pass did.
#[derive(Debug, Default, Getters)]
#[getset(get = "pub with_prefix")]
pub struct RelocationSummary {
    /// Scripts whose interpreter line was rewritten.
    rewritten: Vec<PathBuf>,

    /// Scripts that already pointed at the launcher.
    already_relocated: Vec<PathBuf>,

    /// Records that were skipped.
    warnings: Vec<ConfigWarning>,
}

/// The byte ranges of an interpreter line.
struct InterpreterLine {
    /// Start of the interpreter path.
    start: usize,

    /// End of the interpreter path, which is where the argument portion starts.
    end: usize,
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Relocates every script listed in `<cfg_dir>/relocatable_scripts`.
///
/// Each record is a path relative to `fs_root`. Absolute records, records naming a missing file,
/// records whose symlinks lead out of `fs_root` and files that cannot be rewritten are skipped
/// with a warning. A missing list means there is nothing to relocate.
pub fn relocate_scripts(
    cfg_dir: &Path,
    fs_root: &Path,
    interpreter: &Path,
) -> DecontainerizrResult<RelocationSummary> {
    let mut summary = RelocationSummary::default();
    let canonical_root = weakly_canonical(fs_root);

    let list_path = cfg_dir.join(RELOCATABLE_SCRIPTS_FILENAME);
    let records = match fs::read(&list_path) {
        Ok(records) => records,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("no relocatable scripts at {}", list_path.display());
            return Ok(summary);
        }
        Err(e) => return Err(e.into()),
    };

    for record in records.split(|b| *b == b'\n') {
        if record.is_empty() {
            continue;
        }

        let record_str = String::from_utf8_lossy(record).into_owned();
        let relative = Path::new(OsStr::from_bytes(record));
        if relative.is_absolute() {
            summary.skip(ConfigWarning::AbsoluteRelocation(record_str));
            continue;
        }

        let script = fs_root.join(relative);
        if !script.exists() {
            summary.skip(ConfigWarning::MissingRelocation(record_str));
            continue;
        }

        if !is_target_under(&weakly_canonical(&script), &canonical_root) {
            summary.skip(ConfigWarning::OutsideRelocation(record_str));
            continue;
        }

        match set_shebang_interpreter(&script, interpreter) {
            Ok(ShebangRewrite::Rewritten) => {
                tracing::debug!("rewrote interpreter line of {}", script.display());
                summary.rewritten.push(script);
            }
            Ok(ShebangRewrite::AlreadyRelocated) => {
                tracing::debug!("{} is already relocated", script.display());
                summary.already_relocated.push(script);
            }
            Err(e) => summary.skip(ConfigWarning::RelocationFailed(record_str, e)),
        }
    }

    Ok(summary)
}

/// Points the interpreter line of `script` at `interpreter`, rewriting the file in place.
///
/// The file ends up exactly as long as the new interpreter line plus the untouched remainder.
pub fn set_shebang_interpreter(script: &Path, interpreter: &Path) -> io::Result<ShebangRewrite> {
    let mut file = OpenOptions::new().read(true).write(true).open(script)?;

    let mut content = Vec::new();
    file.read_to_end(&mut content)?;

    let interpreter = interpreter.as_os_str().as_bytes();
    if let Some(line) = InterpreterLine::parse(&content) {
        if &content[line.start..line.end] == interpreter {
            return Ok(ShebangRewrite::AlreadyRelocated);
        }
    }

    let rewritten = rewrite_shebang(&content, interpreter);
    file.rewind()?;
    file.write_all(&rewritten)?;
    file.set_len(rewritten.len() as u64)?;

    Ok(ShebangRewrite::Rewritten)
}

/// Replaces the interpreter path of a script's interpreter line.
///
/// Rules:
/// - `#!<old> <args>` becomes `#!<new> <args>`, the argument portion is kept byte for byte
/// - `#!<old>` becomes `#!<new>`
/// - content without an interpreter line gets `#!<new>\n` prepended
///
/// ## Examples
///
/// ```
/// use decontainerizr::relocate::rewrite_shebang;
///
/// let script = b"#!/usr/bin/intp shebang_exec /usr/bin/python3 -u\nprint(1)\n";
/// let rewritten = rewrite_shebang(script, b"/opt/app/bin/intp");
///
/// assert_eq!(
///     rewritten,
///     b"#!/opt/app/bin/intp shebang_exec /usr/bin/python3 -u\nprint(1)\n"
/// );
/// ```
pub fn rewrite_shebang(content: &[u8], interpreter: &[u8]) -> Vec<u8> {
    let mut rewritten = Vec::with_capacity(content.len() + interpreter.len() + 3);
    rewritten.extend_from_slice(b"#!");
    rewritten.extend_from_slice(interpreter);

    match InterpreterLine::parse(content) {
        Some(line) => rewritten.extend_from_slice(&content[line.end..]),
        None => {
            rewritten.push(b'\n');
            rewritten.extend_from_slice(content);
        }
    }

    rewritten
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl RelocationSummary {
    fn skip(&mut self, warning: ConfigWarning) {
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }
}

impl InterpreterLine {
    fn parse(content: &[u8]) -> Option<Self> {
        if !content.starts_with(b"#!") {
            return None;
        }

        let line_end = content
            .iter()
            .position(|b| *b == b'\n')
            .unwrap_or(content.len());

        let start = 2 + content[2..line_end]
            .iter()
            .take_while(|b| is_blank(**b))
            .count();

        let end = content[start..line_end]
            .iter()
            .position(|b| is_blank(*b))
            .map_or(line_end, |offset| start + offset);

        Some(Self { start, end })
    }
}

fn is_blank(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
