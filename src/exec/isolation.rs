// src/exec/isolation.rs

//! Process-group isolation as a pluggable capability.
//!
//! The orchestrator picks an [`Isolation`] from config once, applies it to
//! the `AppCommand` before launch, and the launcher honours whatever was set.
//! Tests can pass their own implementation to observe or fake the decision.

use std::fmt::Debug;

use crate::exec::command::AppCommand;
use crate::types::IsolateMode;

/// Decides whether the app is separated from the supervisor's signals.
pub trait Isolation: Send + Sync + Debug {
    /// Set platform attributes on the command before it is started.
    fn apply(&self, app: &mut AppCommand);

    /// Short name for logs and `--dry-run`.
    fn name(&self) -> &'static str;
}

/// Leave the app in the supervisor's process group.
///
/// Terminal signals such as Ctrl-C reach the app directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIsolation;

impl Isolation for NoIsolation {
    fn apply(&self, app: &mut AppCommand) {
        app.process_group = None;
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Start the app as leader of a new process group.
///
/// Signals sent to the supervisor are then not forwarded to the app, and the
/// whole group can be terminated on teardown. On platforms without process
/// groups the attribute is ignored at launch.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewProcessGroup;

impl Isolation for NewProcessGroup {
    fn apply(&self, app: &mut AppCommand) {
        app.process_group = Some(0);
    }

    fn name(&self) -> &'static str {
        "new-group"
    }
}

/// Pick the isolation for a configured mode.
pub fn isolation_for(mode: IsolateMode) -> Box<dyn Isolation> {
    match mode {
        IsolateMode::None => Box::new(NoIsolation),
        IsolateMode::NewGroup => Box::new(NewProcessGroup),
        IsolateMode::Auto if cfg!(unix) => Box::new(NewProcessGroup),
        IsolateMode::Auto => Box::new(NoIsolation),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_group_sets_group_zero() {
        let mut app = AppCommand::default();
        NewProcessGroup.apply(&mut app);
        assert_eq!(app.process_group, Some(0));
    }

    #[test]
    fn none_clears_group() {
        let mut app = AppCommand {
            process_group: Some(0),
            ..Default::default()
        };
        NoIsolation.apply(&mut app);
        assert_eq!(app.process_group, None);
    }

    #[test]
    fn explicit_modes_map_directly() {
        assert_eq!(isolation_for(IsolateMode::None).name(), "none");
        assert_eq!(isolation_for(IsolateMode::NewGroup).name(), "new-group");
    }

    #[cfg(unix)]
    #[test]
    fn auto_uses_new_group_on_unix() {
        assert_eq!(isolation_for(IsolateMode::Auto).name(), "new-group");
    }
}
