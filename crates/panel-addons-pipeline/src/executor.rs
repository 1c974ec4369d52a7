use std::collections::VecDeque;
use std::path::PathBuf;

use panel_addons::{InstallError, InstallManifest, ProgressEvent, command};

/// Runs a manifest's commands in order inside the staging tree,
/// yielding progress lazily as it is polled.
///
/// One runner serves one install session and is not restartable. Each
/// command produces a `step` event before it is spawned (so a slow
/// command is visible, not buffered), then an `output` event when it
/// wrote anything. A rejected or failing command ends the sequence as
/// a typed error; when every command has run, a `done` event is
/// yielded and the runner is exhausted. Commands never run in
/// parallel: later steps may depend on earlier ones.
pub struct InstallRunner {
    workdir: PathBuf,
    commands: VecDeque<(String, String)>,
    announced: Option<(String, String)>,
    finished: bool,
}

impl InstallRunner {
    pub fn new(manifest: &InstallManifest, workdir: impl Into<PathBuf>) -> Self {
        let commands = manifest
            .ordered_commands()
            .into_iter()
            .map(|(key, cmd)| (format!("Step {key}"), cmd))
            .collect();

        Self {
            workdir: workdir.into(),
            commands,
            announced: None,
            finished: false,
        }
    }

    /// The next progress event, an error that ends the session, or
    /// `None` once the sequence is exhausted.
    pub async fn next_event(&mut self) -> Option<Result<ProgressEvent, InstallError>> {
        loop {
            if self.finished {
                return None;
            }

            // A step was announced on the previous poll; run it now.
            if let Some((step, cmd)) = self.announced.take() {
                match self.run(&cmd).await {
                    Ok(output) if output.is_empty() => continue,
                    Ok(output) => return Some(Ok(ProgressEvent::output(step, cmd, output))),
                    Err(e) => {
                        self.finished = true;
                        return Some(Err(e));
                    }
                }
            }

            match self.commands.pop_front() {
                None => {
                    self.finished = true;
                    return Some(Ok(ProgressEvent::done("Installation complete")));
                }
                Some((step, raw)) => {
                    let cmd = raw.trim().to_owned();

                    if !command::is_allowed(&cmd) {
                        self.finished = true;
                        return Some(Err(InstallError::CommandRejected { cmd }));
                    }

                    self.announced = Some((step.clone(), cmd.clone()));
                    return Some(Ok(ProgressEvent::step(step, cmd)));
                }
            }
        }
    }

    async fn run(&self, cmd: &str) -> Result<String, InstallError> {
        let line = command::parse_command(cmd)?;

        let output = tokio::process::Command::new(&line.bin)
            .args(&line.args)
            .current_dir(&self.workdir)
            .output()
            .await
            .map_err(|e| InstallError::CommandFailed {
                cmd: cmd.to_owned(),
                output: e.to_string(),
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        let combined = combined.trim().to_owned();

        if !output.status.success() {
            return Err(InstallError::CommandFailed {
                cmd: cmd.to_owned(),
                output: if combined.is_empty() {
                    output.status.to_string()
                } else {
                    combined
                },
            });
        }

        Ok(combined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(commands: &[(&str, &str)]) -> InstallManifest {
        InstallManifest {
            commands: commands
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
            ..Default::default()
        }
    }

    async fn collect(runner: &mut InstallRunner) -> Vec<Result<ProgressEvent, InstallError>> {
        let mut events = Vec::new();
        while let Some(event) = runner.next_event().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn empty_manifest_trivially_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = InstallRunner::new(&manifest(&[]), dir.path());

        let events = collect(&mut runner).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            Ok(ProgressEvent::Done { .. })
        ));
    }

    #[tokio::test]
    async fn commands_run_in_manifest_order_in_the_workdir() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = InstallRunner::new(
            &manifest(&[("2", "mv first second"), ("1", "mkdir first")]),
            dir.path(),
        );

        let events = collect(&mut runner).await;

        // mkdir and mv are silent, so: step, step, done.
        assert_eq!(events.len(), 3);
        assert!(
            matches!(&events[0], Ok(ProgressEvent::Step { step, cmd }) if step == "Step 1" && cmd == "mkdir first")
        );
        assert!(
            matches!(&events[1], Ok(ProgressEvent::Step { step, cmd }) if step == "Step 2" && cmd == "mv first second")
        );
        assert!(matches!(&events[2], Ok(ProgressEvent::Done { .. })));

        assert!(dir.path().join("second").is_dir());
        assert!(!dir.path().join("first").exists());
    }

    #[tokio::test]
    async fn rejected_command_stops_before_later_steps() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = InstallRunner::new(
            &manifest(&[("1", "rm -rf /"), ("2", "mkdir never")]),
            dir.path(),
        );

        let events = collect(&mut runner).await;

        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            Err(InstallError::CommandRejected { cmd }) if cmd == "rm -rf /"
        ));
        assert!(!dir.path().join("never").exists());
    }

    #[tokio::test]
    async fn metacharacters_rejected_even_with_allowed_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = InstallRunner::new(
            &manifest(&[("1", "npm install; rm -rf /")]),
            dir.path(),
        );

        let events = collect(&mut runner).await;
        assert!(matches!(
            &events[0],
            Err(InstallError::CommandRejected { .. })
        ));
    }

    #[tokio::test]
    async fn failing_command_yields_error_with_output_and_stops() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = InstallRunner::new(
            &manifest(&[("1", "cp missing.txt dest.txt"), ("2", "mkdir never")]),
            dir.path(),
        );

        let events = collect(&mut runner).await;

        // step for the attempt, then the typed failure.
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], Ok(ProgressEvent::Step { .. })));
        assert!(matches!(
            &events[1],
            Err(InstallError::CommandFailed { cmd, output })
                if cmd == "cp missing.txt dest.txt" && !output.is_empty()
        ));
        assert!(!dir.path().join("never").exists());
    }

    #[tokio::test]
    async fn step_always_precedes_output_and_terminal_is_last() {
        let dir = tempfile::tempdir().unwrap();
        // cp -v prints what it copied, exercising the output event.
        std::fs::write(dir.path().join("a.txt"), "data").unwrap();
        let mut runner =
            InstallRunner::new(&manifest(&[("1", "cp -v a.txt b.txt")]), dir.path());

        let events = collect(&mut runner).await;

        assert_eq!(events.len(), 3);
        assert!(
            matches!(&events[0], Ok(ProgressEvent::Step { cmd, .. }) if cmd == "cp -v a.txt b.txt")
        );
        assert!(matches!(
            &events[1],
            Ok(ProgressEvent::Output { output, .. }) if !output.is_empty()
        ));
        assert!(matches!(&events[2], Ok(ProgressEvent::Done { .. })));
    }

    #[tokio::test]
    async fn runner_is_exhausted_after_terminal() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = InstallRunner::new(&manifest(&[]), dir.path());

        assert!(runner.next_event().await.is_some());
        assert!(runner.next_event().await.is_none());
        assert!(runner.next_event().await.is_none());
    }
}
