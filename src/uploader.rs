// Upload flow: print each bundle's path, then POST its contents.
// Nothing that goes wrong for one entry stops the loop; failures are logged
// at warn level and counted in the summary.

use crate::api::BundleSink;
use crate::bundle::{self, Bundle};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Per-run counters, logged once the loop ends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UploadSummary {
    pub discovered: usize,
    pub succeeded: usize,
    /// Got a response, but not a 2xx one.
    pub rejected: usize,
    /// Never got a response: read error or transport error.
    pub failed: usize,
}

/// Spinner on stderr. indicatif hides it by itself when stderr is not a
/// terminal; `show == false` hides it always.
pub fn progress_bar(show: bool) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} [{pos}/{len}] {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Upload every entry of `dir` to `sink`, one at a time in listing order.
///
/// A directory that cannot be listed is logged and yields zero uploads.
pub fn run<S, W>(sink: &S, dir: &Path, out: &mut W, progress: &ProgressBar) -> UploadSummary
where
    S: BundleSink + ?Sized,
    W: Write,
{
    let bundles = match bundle::discover(dir) {
        Ok(bundles) => bundles,
        Err(e) => {
            progress.suspend(|| warn!("{:#}", e));
            Vec::new()
        }
    };
    upload_all(sink, &bundles, out, progress)
}

/// The loop itself, over an already discovered list.
pub fn upload_all<S, W>(
    sink: &S,
    bundles: &[Bundle],
    out: &mut W,
    progress: &ProgressBar,
) -> UploadSummary
where
    S: BundleSink + ?Sized,
    W: Write,
{
    let mut summary = UploadSummary {
        discovered: bundles.len(),
        ..UploadSummary::default()
    };
    progress.set_length(bundles.len() as u64);

    for bundle in bundles {
        let path = bundle.path();
        progress.set_message(path.display().to_string());
        progress.suspend(|| {
            if let Err(e) = print_path(out, path) {
                warn!("Failed to print {}: {}", path.display(), e);
            }
        });

        match upload_one(sink, bundle, progress) {
            Outcome::Accepted => summary.succeeded += 1,
            Outcome::Rejected => summary.rejected += 1,
            Outcome::Failed => summary.failed += 1,
        }
        progress.inc(1);
    }

    progress.finish_and_clear();
    info!(
        "Uploaded {} bundle(s): {} accepted, {} rejected, {} failed",
        summary.discovered, summary.succeeded, summary.rejected, summary.failed
    );
    summary
}

/// Write the path's bytes as the OS gave them, so non-UTF-8 names come out
/// unchanged.
fn print_path<W: Write>(out: &mut W, path: &Path) -> io::Result<()> {
    out.write_all(path.as_os_str().as_encoded_bytes())?;
    out.write_all(b"\n")?;
    out.flush()
}

enum Outcome {
    Accepted,
    Rejected,
    Failed,
}

// Warnings are emitted under `suspend` so they do not tear the spinner line.
fn upload_one<S: BundleSink + ?Sized>(sink: &S, bundle: &Bundle, progress: &ProgressBar) -> Outcome {
    let path = bundle.path().display();
    let body = match bundle.read() {
        Ok(body) => body,
        Err(e) => {
            progress.suspend(|| warn!("{:#}", e));
            return Outcome::Failed;
        }
    };

    match sink.post_bundle(body) {
        Ok(status) if status.is_success() => {
            debug!("{} -> {}", path, status);
            Outcome::Accepted
        }
        Ok(status) => {
            progress.suspend(|| warn!("{} was answered with {}", path, status));
            Outcome::Rejected
        }
        Err(e) => {
            progress.suspend(|| warn!("Upload of {} failed: {:#}", path, e));
            Outcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use reqwest::StatusCode;
    use std::cell::RefCell;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// A byte buffer that the writer under test and the sink (or a log
    /// subscriber) can both see.
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> Vec<u8> {
            self.0.lock().unwrap().clone()
        }

        fn text(&self) -> String {
            String::from_utf8(self.contents()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Snapshots stdout at every POST: the lines printed so far.
    struct StdoutWatchingSink {
        stdout: SharedBuf,
        seen: RefCell<Vec<(Vec<String>, Vec<u8>)>>,
    }

    impl BundleSink for StdoutWatchingSink {
        fn post_bundle(&self, body: Vec<u8>) -> Result<StatusCode> {
            let lines = self.stdout.text().lines().map(str::to_string).collect();
            self.seen.borrow_mut().push((lines, body));
            Ok(StatusCode::OK)
        }
    }

    /// Records every body and answers from a scripted list of outcomes,
    /// repeating the last one.
    struct RecordingSink {
        bodies: RefCell<Vec<Vec<u8>>>,
        answers: Vec<Option<StatusCode>>,
    }

    impl RecordingSink {
        fn answering(answers: Vec<Option<StatusCode>>) -> Self {
            RecordingSink {
                bodies: RefCell::new(Vec::new()),
                answers,
            }
        }

        fn ok() -> Self {
            Self::answering(vec![Some(StatusCode::OK)])
        }
    }

    impl BundleSink for RecordingSink {
        fn post_bundle(&self, body: Vec<u8>) -> Result<StatusCode> {
            let mut bodies = self.bodies.borrow_mut();
            bodies.push(body);
            let idx = (bodies.len() - 1).min(self.answers.len() - 1);
            self.answers[idx].ok_or_else(|| anyhow!("connection refused"))
        }
    }

    fn printed_lines(out: Vec<u8>) -> Vec<String> {
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn posts_each_file_once_with_its_exact_bytes() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.json"), b"{\"a\":1}").unwrap();
        fs::write(dir.path().join("b.json"), [0u8, 159, 146, 150]).unwrap();

        let bundles = bundle::discover(dir.path()).unwrap();
        let sink = RecordingSink::ok();
        let mut out = Vec::new();
        let summary = upload_all(&sink, &bundles, &mut out, &ProgressBar::hidden());

        let lines = printed_lines(out);
        let bodies = sink.bodies.into_inner();
        assert_eq!(lines.len(), 2);
        assert_eq!(bodies.len(), 2);
        // The nth printed path belongs to the nth body.
        for (line, body) in lines.iter().zip(&bodies) {
            assert_eq!(&fs::read(line).unwrap(), body);
        }
        assert_eq!(summary.succeeded, 2);
    }

    #[test]
    fn path_is_printed_before_its_request_is_sent() {
        let dir = TempDir::new().unwrap();
        for (name, body) in [("a.json", "first"), ("b.json", "second"), ("c.json", "third")] {
            fs::write(dir.path().join(name), body).unwrap();
        }
        let bundles = bundle::discover(dir.path()).unwrap();
        let stdout = SharedBuf::default();
        let sink = StdoutWatchingSink {
            stdout: stdout.clone(),
            seen: RefCell::new(Vec::new()),
        };

        upload_all(&sink, &bundles, &mut stdout.clone(), &ProgressBar::hidden());

        let seen = sink.seen.into_inner();
        assert_eq!(seen.len(), 3);
        for (n, (lines, body)) in seen.iter().enumerate() {
            // Request n+1 goes out once exactly n+1 paths are on stdout,
            // and the last of them names the file being posted.
            assert_eq!(lines.len(), n + 1);
            let last = lines.last().unwrap();
            assert_eq!(PathBuf::from(last), bundles[n].path());
            assert_eq!(&fs::read(last).unwrap(), body);
        }
    }

    #[test]
    fn failure_warnings_are_logged_while_the_progress_bar_runs() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.json"), "{}").unwrap();
        fs::write(dir.path().join("b.json"), "{}").unwrap();
        let sink = RecordingSink::answering(vec![Some(StatusCode::BAD_REQUEST), None]);

        let logs = SharedBuf::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let progress = ProgressBar::with_draw_target(None, indicatif::ProgressDrawTarget::hidden());

        let summary = tracing::subscriber::with_default(subscriber, || {
            run(&sink, dir.path(), &mut Vec::new(), &progress)
        });

        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.failed, 1);
        let logs = logs.text();
        assert!(logs.contains("was answered with 400 Bad Request"), "{logs}");
        assert!(logs.contains("failed: connection refused"), "{logs}");
        assert!(progress.is_finished());
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_names_are_printed_byte_for_byte() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join(OsStr::from_bytes(b"caf\xe9.json"));
        fs::write(&path, "{}").unwrap();

        let sink = RecordingSink::ok();
        let mut out = Vec::new();
        run(&sink, dir.path(), &mut out, &ProgressBar::hidden());

        let mut expected = path.as_os_str().as_bytes().to_vec();
        expected.push(b'\n');
        assert_eq!(out, expected);
        assert!(String::from_utf8(out).is_err());
        assert_eq!(*sink.bodies.borrow(), vec![b"{}".to_vec()]);
    }

    #[test]
    fn prints_in_listing_order() {
        let bundles = vec![
            Bundle::new(PathBuf::from("./bundles/").join("z.json")),
            Bundle::new(PathBuf::from("./bundles/").join("a.json")),
        ];
        let sink = RecordingSink::ok();
        let mut out = Vec::new();
        upload_all(&sink, &bundles, &mut out, &ProgressBar::hidden());

        assert_eq!(
            printed_lines(out),
            vec!["./bundles/z.json", "./bundles/a.json"]
        );
    }

    #[test]
    fn failures_do_not_stop_the_loop() {
        let dir = TempDir::new().unwrap();
        for name in ["1.json", "2.json", "3.json"] {
            fs::write(dir.path().join(name), name).unwrap();
        }
        let sink = RecordingSink::answering(vec![
            None,
            Some(StatusCode::INTERNAL_SERVER_ERROR),
            Some(StatusCode::CREATED),
        ]);
        let mut out = Vec::new();
        let summary = run(&sink, dir.path(), &mut out, &ProgressBar::hidden());

        assert_eq!(printed_lines(out).len(), 3);
        assert_eq!(sink.bodies.borrow().len(), 3);
        assert_eq!(
            summary,
            UploadSummary {
                discovered: 3,
                succeeded: 1,
                rejected: 1,
                failed: 1,
            }
        );
    }

    #[test]
    fn unreadable_entry_is_printed_but_not_posted() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("subdir")).unwrap();
        fs::write(dir.path().join("ok.json"), b"{}").unwrap();

        let sink = RecordingSink::ok();
        let mut out = Vec::new();
        let summary = run(&sink, dir.path(), &mut out, &ProgressBar::hidden());

        assert_eq!(printed_lines(out).len(), 2);
        assert_eq!(*sink.bodies.borrow(), vec![b"{}".to_vec()]);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.succeeded, 1);
    }

    #[test]
    fn empty_directory_prints_and_posts_nothing() {
        let dir = TempDir::new().unwrap();
        let sink = RecordingSink::ok();
        let mut out = Vec::new();
        let summary = run(&sink, dir.path(), &mut out, &ProgressBar::hidden());

        assert!(out.is_empty());
        assert!(sink.bodies.borrow().is_empty());
        assert_eq!(summary, UploadSummary::default());
    }

    #[test]
    fn missing_directory_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        let sink = RecordingSink::ok();
        let mut out = Vec::new();
        let summary = run(
            &sink,
            &dir.path().join("missing"),
            &mut out,
            &ProgressBar::hidden(),
        );

        assert!(out.is_empty());
        assert_eq!(summary.discovered, 0);
    }
}
