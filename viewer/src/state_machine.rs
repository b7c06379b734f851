//! Key-driven switching between inspection views.

use crate::backend::ViewerBackend;
use crate::scene::{Scene, SceneContext, ViewState};
use crate::Result;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Something the user can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Show(ViewState),
    Snapshot,
    Quit,
}

/// Whether the event loop should keep running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Exit,
}

/// Fixed mapping from key characters to triggers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMap {
    bindings: BTreeMap<char, Trigger>,
}

impl Default for KeyMap {
    /// `1`-`5` select views, `s` saves a snapshot, `q` quits.
    fn default() -> Self {
        let mut bindings: BTreeMap<char, Trigger> = ViewState::ALL
            .into_iter()
            .map(|s| (char::from(b'0' + s.number()), Trigger::Show(s)))
            .collect();
        for (key, trigger) in [('s', Trigger::Snapshot), ('q', Trigger::Quit)] {
            bindings.insert(key, trigger);
            bindings.insert(key.to_ascii_uppercase(), trigger);
        }
        Self { bindings }
    }
}

impl KeyMap {
    pub fn lookup(&self, key: char) -> Option<Trigger> {
        self.bindings.get(&key).copied()
    }

    /// Operator-facing help text, one binding per line.
    pub fn legend(&self) -> String {
        let mut out =
            String::from("[Keymap] Key '1'-'5' to see different views, 's' to snapshot, 'q' to quit\n");
        for state in ViewState::ALL {
            let _ = writeln!(out, "  {}: {}", state.number(), state.description());
        }
        out
    }
}

/// Owns the scene context and the scene currently on screen.
///
/// Every transition clears the backend, re-adds the full geometry list of
/// the requested view and replaces [`current_scene`](Self::current_scene)
/// as a whole, so the outcome depends only on the requested view.
#[derive(Debug)]
pub struct ViewStateMachine {
    context: SceneContext,
    keymap: KeyMap,
    current: Option<Scene>,
    snapshot_path: PathBuf,
}

impl ViewStateMachine {
    pub fn new(context: SceneContext, snapshot_path: impl Into<PathBuf>) -> Self {
        Self {
            context,
            keymap: KeyMap::default(),
            current: None,
            snapshot_path: snapshot_path.into(),
        }
    }

    pub fn with_keymap(mut self, keymap: KeyMap) -> Self {
        self.keymap = keymap;
        self
    }

    pub fn keymap(&self) -> &KeyMap {
        &self.keymap
    }

    pub fn context(&self) -> &SceneContext {
        &self.context
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn current_scene(&self) -> Option<&Scene> {
        self.current.as_ref()
    }

    pub fn current_state(&self) -> Option<ViewState> {
        self.current.as_ref().map(Scene::state)
    }

    /// Show `state`. On error nothing is touched.
    pub fn activate(&mut self, state: ViewState, backend: &mut dyn ViewerBackend) -> Result<()> {
        let scene = self.context.compose(state)?;

        backend.clear_geometry();
        for geometry in scene.geometries() {
            backend.add_geometry(geometry);
        }

        tracing::info!("showing view {state}");
        self.current = Some(scene);
        Ok(())
    }

    pub fn handle(&mut self, trigger: Trigger, backend: &mut dyn ViewerBackend) -> Result<Control> {
        match trigger {
            Trigger::Show(state) => self.activate(state, backend)?,
            Trigger::Snapshot => backend.capture_frame(&self.snapshot_path)?,
            Trigger::Quit => {
                tracing::info!("quit requested");
                return Ok(Control::Exit);
            }
        }
        Ok(Control::Continue)
    }

    /// Unbound keys are ignored.
    pub fn handle_key(&mut self, key: char, backend: &mut dyn ViewerBackend) -> Result<Control> {
        match self.keymap.lookup(key) {
            Some(trigger) => self.handle(trigger, backend),
            None => Ok(Control::Continue),
        }
    }
}
