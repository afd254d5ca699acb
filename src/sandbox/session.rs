//! Running a command inside a sandbox.

use super::{PathFilter, SandboxGuard, SymlinkFarm};
use crate::config::ResolvedConfig;
use crate::constants::{
    ENV_GIT_DIR, ENV_GIT_WORK_TREE, ENV_OPENCODE_CONFIG_CONTENT, ENV_OPENCODE_CONFIG_DIR,
    ENV_PROFILE,
};
use crate::core::OcxError;
use crate::git::{self, GitRepoInfo};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tracing::{debug, warn};

/// One ghost-mode run: build the sandbox, run the command in it, tear it down.
///
/// Per-run state (sandbox path, cleanup flag) lives in the run itself and
/// each run holds its own forwarding slot, so several sessions can coexist in
/// one process.
#[derive(Debug, Clone)]
pub struct GhostSession {
    project_root: PathBuf,
    config: ResolvedConfig,
    profile_dir: Option<PathBuf>,
    farm: SymlinkFarm,
    keep_sandbox: bool,
}

impl GhostSession {
    pub fn new(project_root: impl Into<PathBuf>, config: ResolvedConfig) -> Self {
        Self {
            project_root: project_root.into(),
            config,
            profile_dir: None,
            farm: SymlinkFarm::new(),
            keep_sandbox: false,
        }
    }

    /// Directory exported as `OPENCODE_CONFIG_DIR`.
    #[must_use]
    pub fn with_profile_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.profile_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_farm(mut self, farm: SymlinkFarm) -> Self {
        self.farm = farm;
        self
    }

    #[must_use]
    pub const fn keep_sandbox(mut self, keep: bool) -> Self {
        self.keep_sandbox = keep;
        self
    }

    /// Runs `program` with `args` in a fresh sandbox and returns its exit code.
    ///
    /// The sandbox is removed after the process exits, whatever the outcome.
    /// A failed removal is logged and does not change the returned code.
    /// SIGINT, SIGTERM and SIGHUP are relayed to the process while it runs; one
    /// that arrives before the process starts skips it and returns `128 + signal`.
    pub async fn run(&self, program: &Path, args: &[String]) -> Result<i32> {
        match self.farm.sweep_orphans().await {
            Ok(0) => {}
            Ok(n) => debug!("Swept {} orphaned sandbox(es)", n),
            Err(e) => warn!("Failed to sweep orphaned sandboxes: {e:#}"),
        }

        // Interrupts are caught from here until cleanup finishes
        let forwarder = signals::Forwarder::install()?;

        let filter = PathFilter::new(&self.config.exclude, &self.config.include)?;
        let sandbox = self.farm.create(&self.project_root, &filter).await?;
        let guard = SandboxGuard::new(&sandbox);
        debug!("Sandbox ready at {}", sandbox.display());

        let result = self.launch(program, args, &sandbox, &forwarder).await;

        if self.keep_sandbox {
            guard.keep();
        } else if let Err(e) = guard.cleanup().await {
            warn!("Failed to remove sandbox {}: {e:#}", sandbox.display());
        }

        drop(forwarder);
        result
    }

    async fn launch(
        &self,
        program: &Path,
        args: &[String],
        sandbox: &Path,
        forwarder: &signals::Forwarder,
    ) -> Result<i32> {
        let repo = git::repo_info(&self.project_root).await;
        let env = build_env(&self.config, self.profile_dir.as_deref(), repo.as_ref())?;

        if let Some(signal) = forwarder.take_pending() {
            debug!("Interrupted by signal {} before start", signal);
            return Ok(128 + signal);
        }

        self.spawn_and_wait(program, args, sandbox, &env, forwarder).await.map(exit_code)
    }

    async fn spawn_and_wait(
        &self,
        program: &Path,
        args: &[String],
        sandbox: &Path,
        env: &[(String, String)],
        forwarder: &signals::Forwarder,
    ) -> Result<ExitStatus> {
        let mut command = Command::new(program);
        command
            .args(args)
            .current_dir(sandbox)
            .envs(env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        debug!("Spawning {} {}", program.display(), args.join(" "));
        let mut child = command
            .spawn()
            .with_context(|| format!("Failed to start {}", program.display()))?;

        if let Some(pid) = child.id() {
            forwarder.attach(pid);
        }

        let status = child.wait().await;
        forwarder.detach();
        status.with_context(|| format!("Failed to wait for {}", program.display()))
    }
}

/// Environment handed to the sandboxed process.
pub fn build_env(
    config: &ResolvedConfig,
    profile_dir: Option<&Path>,
    repo: Option<&GitRepoInfo>,
) -> Result<Vec<(String, String)>> {
    let mut env = vec![(
        ENV_OPENCODE_CONFIG_CONTENT.to_string(),
        serde_json::to_string(&config.opencode).context("Failed to serialize opencode config")?,
    )];

    if let Some(dir) = profile_dir {
        env.push((ENV_OPENCODE_CONFIG_DIR.to_string(), dir.display().to_string()));
    }
    if let Some(name) = &config.profile_name {
        env.push((ENV_PROFILE.to_string(), name.clone()));
    }
    if let Some(repo) = repo {
        env.push((ENV_GIT_WORK_TREE.to_string(), repo.work_tree.display().to_string()));
        env.push((ENV_GIT_DIR.to_string(), repo.git_dir.display().to_string()));
    }

    Ok(env)
}

/// Finds `program` on `PATH` (or checks it when it is a path).
pub fn locate_command(program: &str) -> Result<PathBuf> {
    which::which(program).map_err(|_| {
        OcxError::CommandNotFound {
            command: program.to_string(),
        }
        .into()
    })
}

/// Exit code of a finished process; `128 + signal` when killed by a signal.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

#[cfg(unix)]
mod signals {
    //! Process-wide SIGINT/SIGTERM/SIGHUP relay.
    //!
    //! Each live [`Forwarder`] owns one slot holding its child's pid. The first
    //! forwarder installs the handler with `sigaction` and remembers the
    //! previous dispositions; the last one to drop puts them back.

    use anyhow::{Context, Result};
    use nix::libc::c_int;
    use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, kill, sigaction};
    use nix::unistd::Pid;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::{Mutex, PoisonError};
    use tracing::{debug, warn};

    const FORWARDED: [Signal; 3] = [Signal::SIGINT, Signal::SIGTERM, Signal::SIGHUP];
    const SLOTS: usize = 32;

    const FREE: i32 = 0;
    /// Slot taken, no child yet: signals are recorded in `PENDING`.
    const WAITING: i32 = -1;

    static CHILDREN: [AtomicI32; SLOTS] = [const { AtomicI32::new(FREE) }; SLOTS];
    static PENDING: [AtomicI32; SLOTS] = [const { AtomicI32::new(0) }; SLOTS];

    struct Installed {
        users: usize,
        previous: Vec<(Signal, SigAction)>,
    }

    static INSTALLED: Mutex<Installed> = Mutex::new(Installed {
        users: 0,
        previous: Vec::new(),
    });

    extern "C" fn relay(signum: c_int) {
        let Ok(signal) = Signal::try_from(signum) else {
            return;
        };
        for (child, pending) in CHILDREN.iter().zip(PENDING.iter()) {
            match child.load(Ordering::SeqCst) {
                FREE => {}
                WAITING => pending.store(signum, Ordering::SeqCst),
                pid => {
                    let _ = kill(Pid::from_raw(pid), signal);
                }
            }
        }
    }

    fn restore(previous: &mut Vec<(Signal, SigAction)>) {
        for (signal, action) in previous.drain(..) {
            // SAFETY: reinstates the disposition that was active before `install`
            if let Err(e) = unsafe { sigaction(signal, &action) } {
                warn!("Failed to restore {signal:?} handler: {e}");
            }
        }
    }

    /// Relays SIGINT/SIGTERM/SIGHUP received by OCX to the attached child.
    ///
    /// Signals arriving before [`attach`](Self::attach) are held and reported
    /// by [`take_pending`](Self::take_pending), or forwarded on attach.
    pub(super) struct Forwarder {
        slot: Option<usize>,
        registered: bool,
    }

    impl Forwarder {
        pub(super) fn install() -> Result<Self> {
            let slot = CHILDREN.iter().position(|c| {
                c.compare_exchange(FREE, WAITING, Ordering::SeqCst, Ordering::SeqCst).is_ok()
            });
            match slot {
                Some(slot) => PENDING[slot].store(0, Ordering::SeqCst),
                None => warn!("Too many concurrent sessions; signals will not be forwarded"),
            }
            let mut forwarder = Self {
                slot,
                registered: false,
            };

            let mut installed = INSTALLED.lock().unwrap_or_else(PoisonError::into_inner);
            if installed.users == 0 {
                let action =
                    SigAction::new(SigHandler::Handler(relay), SaFlags::SA_RESTART, SigSet::empty());
                for signal in FORWARDED {
                    // SAFETY: `relay` only touches atomics and calls kill(2)
                    match unsafe { sigaction(signal, &action) } {
                        Ok(previous) => installed.previous.push((signal, previous)),
                        Err(e) => {
                            restore(&mut installed.previous);
                            return Err(e).with_context(|| format!("Failed to install {signal:?} handler"));
                        }
                    }
                }
                debug!("Installed signal forwarding");
            }
            installed.users += 1;
            forwarder.registered = true;
            Ok(forwarder)
        }

        /// Signal number caught while no child was attached, if any.
        pub(super) fn take_pending(&self) -> Option<i32> {
            let slot = self.slot?;
            match PENDING[slot].swap(0, Ordering::SeqCst) {
                0 => None,
                signum => Some(signum),
            }
        }

        pub(super) fn attach(&self, pid: u32) {
            let (Some(slot), Ok(pid)) = (self.slot, i32::try_from(pid)) else {
                return;
            };
            CHILDREN[slot].store(pid, Ordering::SeqCst);
            if let Some(signum) = self.take_pending()
                && let Ok(signal) = Signal::try_from(signum)
            {
                debug!("Forwarding early {signal:?} to {pid}");
                let _ = kill(Pid::from_raw(pid), signal);
            }
        }

        /// Stops relaying to the child; later signals are held again.
        pub(super) fn detach(&self) {
            if let Some(slot) = self.slot {
                CHILDREN[slot].store(WAITING, Ordering::SeqCst);
            }
        }
    }

    impl Drop for Forwarder {
        fn drop(&mut self) {
            if self.registered {
                let mut installed = INSTALLED.lock().unwrap_or_else(PoisonError::into_inner);
                installed.users -= 1;
                if installed.users == 0 {
                    restore(&mut installed.previous);
                    debug!("Removed signal forwarding");
                }
            }
            if let Some(slot) = self.slot {
                PENDING[slot].store(0, Ordering::SeqCst);
                CHILDREN[slot].store(FREE, Ordering::SeqCst);
            }
        }
    }
}

#[cfg(not(unix))]
mod signals {
    use anyhow::Result;

    /// Console control events reach the child directly on this platform.
    pub(super) struct Forwarder;

    impl Forwarder {
        pub(super) fn install() -> Result<Self> {
            Ok(Self)
        }

        pub(super) fn take_pending(&self) -> Option<i32> {
            None
        }

        pub(super) fn attach(&self, _pid: u32) {}

        pub(super) fn detach(&self) {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(profile: Option<&str>) -> ResolvedConfig {
        let serde_json::Value::Object(opencode) = json!({ "theme": "dark", "mcp": { "exa": {} } }) else {
            unreachable!()
        };
        ResolvedConfig {
            opencode,
            profile_name: profile.map(ToString::to_string),
            ..ResolvedConfig::default()
        }
    }

    fn lookup<'a>(env: &'a [(String, String)], key: &str) -> Option<&'a str> {
        env.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_build_env_with_profile_and_repo() {
        let repo = GitRepoInfo {
            work_tree: PathBuf::from("/work/project"),
            git_dir: PathBuf::from("/work/project/.git"),
        };
        let env = build_env(&config(Some("work")), Some(Path::new("/cfg/profiles/work")), Some(&repo))
            .unwrap();

        let content: serde_json::Value =
            serde_json::from_str(lookup(&env, ENV_OPENCODE_CONFIG_CONTENT).unwrap()).unwrap();
        assert_eq!(content, json!({ "theme": "dark", "mcp": { "exa": {} } }));
        assert_eq!(lookup(&env, ENV_OPENCODE_CONFIG_DIR), Some("/cfg/profiles/work"));
        assert_eq!(lookup(&env, ENV_PROFILE), Some("work"));
        assert_eq!(lookup(&env, ENV_GIT_WORK_TREE), Some("/work/project"));
        assert_eq!(lookup(&env, ENV_GIT_DIR), Some("/work/project/.git"));
    }

    #[test]
    fn test_build_env_minimal() {
        let env = build_env(&config(None), None, None).unwrap();
        assert_eq!(env.len(), 1);
        assert_eq!(env[0].0, ENV_OPENCODE_CONFIG_CONTENT);
    }

    #[test]
    fn test_locate_missing_command() {
        let err = locate_command("ocx-definitely-missing-binary").unwrap_err();
        assert!(matches!(err.downcast_ref::<OcxError>(), Some(OcxError::CommandNotFound { .. })));
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use crate::test_utils::write_tree;
        use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, raise, sigaction};
        use serial_test::serial;
        use std::time::{Duration, Instant};
        use tempfile::TempDir;

        struct Fixture {
            _temp: TempDir,
            project: PathBuf,
            sandboxes: PathBuf,
        }

        fn fixture() -> Fixture {
            crate::test_utils::init_test_logging(None);
            let temp = TempDir::new().unwrap();
            let project = temp.path().join("project");
            let sandboxes = temp.path().join("sandboxes");
            std::fs::create_dir_all(&sandboxes).unwrap();
            write_tree(&project, &[("visible.txt", "v"), ("secret.txt", "s")]).unwrap();
            Fixture {
                _temp: temp,
                project,
                sandboxes,
            }
        }

        fn session(f: &Fixture) -> GhostSession {
            let config = ResolvedConfig {
                exclude: vec!["secret.txt".to_string()],
                ..config(None)
            };
            GhostSession::new(&f.project, config).with_farm(SymlinkFarm::with_temp_root(&f.sandboxes))
        }

        fn sh(script: &str) -> Vec<String> {
            vec!["-c".to_string(), script.to_string()]
        }

        fn sandbox_entries(dir: &Path) -> Vec<PathBuf> {
            std::fs::read_dir(dir).unwrap().map(|e| e.unwrap().path()).collect()
        }

        /// Current handler for `signal`, read by swapping the default in and back out.
        fn disposition(signal: Signal) -> SigHandler {
            let default = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
            // SAFETY: the previous action is put back before returning
            let previous = unsafe { sigaction(signal, &default) }.unwrap();
            unsafe { sigaction(signal, &previous) }.unwrap();
            previous.handler()
        }

        #[tokio::test]
        #[serial(signals)]
        async fn test_command_sees_filtered_tree_and_sandbox_is_removed() {
            let f = fixture();
            let out = f.project.parent().unwrap().join("seen.txt");
            let script = format!(
                "test -e visible.txt && test ! -e secret.txt && printf %s \"$OPENCODE_CONFIG_CONTENT\" > {}",
                out.display()
            );

            let code = session(&f).run(Path::new("/bin/sh"), &sh(&script)).await.unwrap();

            assert_eq!(code, 0);
            let seen: serde_json::Value =
                serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
            assert_eq!(seen["theme"], "dark");
            assert!(sandbox_entries(&f.sandboxes).is_empty());
        }

        #[tokio::test]
        #[serial(signals)]
        async fn test_exit_code_propagates() {
            let f = fixture();
            let code = session(&f).run(Path::new("/bin/sh"), &sh("exit 7")).await.unwrap();
            assert_eq!(code, 7);
            assert!(sandbox_entries(&f.sandboxes).is_empty());
        }

        #[tokio::test]
        #[serial(signals)]
        async fn test_keep_sandbox() {
            let f = fixture();
            let code =
                session(&f).keep_sandbox(true).run(Path::new("/bin/sh"), &sh("true")).await.unwrap();
            assert_eq!(code, 0);

            let kept = sandbox_entries(&f.sandboxes);
            assert_eq!(kept.len(), 1);
            assert!(kept[0].join("visible.txt").exists());
        }

        #[tokio::test]
        #[serial(signals)]
        async fn test_spawn_failure_still_cleans_up() {
            let f = fixture();
            let result = session(&f).run(Path::new("/nonexistent/program"), &[]).await;
            assert!(result.is_err());
            assert!(sandbox_entries(&f.sandboxes).is_empty());
        }

        #[tokio::test]
        #[serial(signals)]
        async fn test_orphans_swept_before_run() {
            let f = fixture();
            let orphan = f.sandboxes.join("ocx-ghost-stale.removing");
            std::fs::create_dir(&orphan).unwrap();

            session(&f).run(Path::new("/bin/sh"), &sh("true")).await.unwrap();

            assert!(!orphan.exists());
        }

        #[tokio::test]
        #[serial(signals)]
        async fn test_handlers_restored_after_run() {
            let f = fixture();
            let before = [Signal::SIGINT, Signal::SIGTERM, Signal::SIGHUP].map(disposition);

            session(&f).run(Path::new("/bin/sh"), &sh("exit 3")).await.unwrap();
            session(&f).run(Path::new("/nonexistent/program"), &[]).await.unwrap_err();

            assert_eq!([Signal::SIGINT, Signal::SIGTERM, Signal::SIGHUP].map(disposition), before);
            assert_eq!(disposition(Signal::SIGHUP), SigHandler::SigDfl);
        }

        #[tokio::test]
        #[serial(signals)]
        async fn test_sigterm_is_relayed_to_child() {
            let f = fixture();
            let session = session(&f);
            let run = tokio::spawn(async move {
                session
                    .run(Path::new("/bin/sh"), &sh("trap 'exit 42' TERM; touch started; sleep 30 & wait"))
                    .await
            });

            let deadline = Instant::now() + Duration::from_secs(10);
            while !sandbox_entries(&f.sandboxes).iter().any(|s| s.join("started").exists()) {
                assert!(Instant::now() < deadline, "command never started");
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            raise(Signal::SIGTERM).unwrap();

            assert_eq!(run.await.unwrap().unwrap(), 42);
            assert!(sandbox_entries(&f.sandboxes).is_empty());
        }

        #[test]
        #[serial(signals)]
        fn test_signal_before_attach_is_held() {
            let forwarder = signals::Forwarder::install().unwrap();
            assert!(matches!(disposition(Signal::SIGHUP), SigHandler::Handler(_)));

            raise(Signal::SIGHUP).unwrap();

            assert_eq!(forwarder.take_pending(), Some(Signal::SIGHUP as i32));
            assert_eq!(forwarder.take_pending(), None);
            drop(forwarder);
            assert_eq!(disposition(Signal::SIGHUP), SigHandler::SigDfl);
        }

        #[test]
        fn test_signal_exit_code() {
            use std::os::unix::process::ExitStatusExt;
            assert_eq!(exit_code(ExitStatus::from_raw(15)), 128 + 15);
            assert_eq!(exit_code(ExitStatus::from_raw(3 << 8)), 3);
        }
    }
}
