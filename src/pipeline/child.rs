//! The external decompressor process and its pipes.

use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::os::fd::OwnedFd;
use std::process::{Child, Command, ExitStatus, Stdio};

use crate::diagnostic::normalize_stderr;
use crate::options::DecompressOptions;
use crate::{Error, Result};

use super::io::read_full;
use super::writer::WriterProcess;

/// Where the decompressor's stdin comes from.
#[derive(Debug)]
pub(crate) enum ChildInput<'a> {
    /// A private duplicate of the caller's file, rewound to offset 0.
    File(File),
    /// In-memory bytes, fed through a pipe by a writer helper.
    Buffer(&'a [u8]),
}

impl<'a> ChildInput<'a> {
    /// Prefers streaming straight from `source` when it is seekable.
    pub(crate) fn new(data: &'a [u8], source: Option<&File>) -> Self {
        let Some(source) = source else {
            return ChildInput::Buffer(data);
        };
        match rewound_duplicate(source) {
            Ok(file) => ChildInput::File(file),
            Err(e) => {
                log::debug!("source descriptor not usable as stdin ({}), piping buffer", e);
                ChildInput::Buffer(data)
            }
        }
    }
}

fn rewound_duplicate(source: &File) -> std::io::Result<File> {
    let mut file = source.try_clone()?;
    file.seek(SeekFrom::Start(0))?;
    Ok(file)
}

/// A running decompressor with its pipes and optional writer helper.
///
/// Every pipe end is owned here and closed when the handle finishes or is
/// dropped. The decompressor is always waited for before the writer helper:
/// once the decompressor has exited its stdin is closed, so the helper is
/// guaranteed to finish too.
#[derive(Debug)]
pub(crate) struct ChildProcessHandle {
    program: String,
    child: Child,
    writer: Option<WriterProcess>,
    closed_early: bool,
    reaped: bool,
}

impl ChildProcessHandle {
    /// Launches `argv` with stdout and stderr piped back to us.
    pub(crate) fn spawn(
        argv: &[&str],
        input: ChildInput<'_>,
        options: &DecompressOptions,
    ) -> Result<Self> {
        let (program, args) = match argv.split_first() {
            Some(split) => split,
            None => {
                return Err(Error::Unsupported {
                    method: "(empty command)",
                });
            }
        };

        let mut command = Command::new(program);
        command
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(path) = &options.search_path {
            command.env("PATH", path);
        }

        let data = match input {
            ChildInput::File(file) => {
                command.stdin(Stdio::from(file));
                None
            }
            ChildInput::Buffer(data) => {
                command.stdin(Stdio::piped());
                Some(data)
            }
        };

        log::debug!("executing {}", argv.join(" "));
        let child = command.spawn().map_err(|source| Error::Spawn {
            program: program.to_string(),
            source,
        })?;

        let mut handle = Self {
            program: program.to_string(),
            child,
            writer: None,
            closed_early: false,
            reaped: false,
        };

        if let (Some(data), Some(stdin)) = (data, handle.child.stdin.take()) {
            let writer = WriterProcess::spawn(OwnedFd::from(stdin), data).map_err(Error::Writer)?;
            handle.writer = Some(writer);
        }
        Ok(handle)
    }

    /// Collects the decompressor's output into `out`.
    ///
    /// A full buffer closes stdout at once, so a child with more to say
    /// dies of a broken pipe instead of blocking. A short read consults
    /// stderr: anything printed there is the decompressor's diagnostic.
    pub(crate) fn collect(&mut self, out: &mut [u8], stderr_limit: usize) -> Result<usize> {
        let n = match self.child.stdout.as_mut() {
            Some(stdout) => read_full(stdout, out, false).map_err(Error::ReadStdout)?,
            None => 0,
        };
        log::trace!("{} produced {} bytes", self.program, n);

        if n == out.len() {
            log::debug!("closing {} stdout at byte ceiling", self.program);
            drop(self.child.stdout.take());
            self.closed_early = true;
            return Ok(n);
        }

        let Some(stderr) = self.child.stderr.as_mut() else {
            return Ok(n);
        };
        let mut diagnostic = vec![0u8; stderr_limit];
        let len = read_full(stderr, &mut diagnostic, false).map_err(Error::ReadStderr)?;
        if len > 0 {
            log::debug!("{} wrote {} bytes to stderr", self.program, len);
            return Err(Error::ChildDiagnostic(normalize_stderr(&diagnostic[..len])));
        }
        Ok(n)
    }

    /// Closes every pipe and reaps the decompressor, then the writer helper.
    ///
    /// Returns the decompressor's exit status.
    pub(crate) fn finish(mut self) -> Result<ExitStatus> {
        self.reap()
    }

    fn reap(&mut self) -> Result<ExitStatus> {
        self.reaped = true;

        drop(self.child.stdin.take());
        drop(self.child.stdout.take());
        drop(self.child.stderr.take());

        let status = self.child.wait().map_err(Error::Wait);
        if let Ok(status) = &status {
            self.log_status(*status);
        }

        let writer = match self.writer.as_mut() {
            Some(writer) => writer.wait().map(|_| ()).map_err(Error::Wait),
            None => Ok(()),
        };
        let status = status?;
        writer?;
        Ok(status)
    }

    fn log_status(&self, status: ExitStatus) {
        if status.success() {
            return;
        }
        if self.closed_early {
            log::debug!("{} stopped after stdout was closed ({})", self.program, status);
            return;
        }
        match status.code() {
            Some(code) => log::warn!("{} exited with status {}", self.program, code),
            None => log::warn!("{} did not exit normally ({})", self.program, status),
        }
    }
}

impl Drop for ChildProcessHandle {
    fn drop(&mut self) {
        if self.reaped {
            return;
        }
        if let Err(e) = self.reap() {
            log::warn!("cleanup of {} failed: {}", self.program, e);
        }
    }
}
