//! Seam to the 3D rendering collaborator.
//!
//! The viewer owns the live camera and orbit controls; the client only reads
//! the current view on save and writes a stored view on apply.

use crate::client::local_preset::ClientPreset;
use crate::model::preset::CameraPose;
use serde::{Deserialize, Serialize};

/// Camera pose plus orbit pivot, as read from or written to the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub camera: CameraPose,
    pub controls_target: [f64; 3],
}

/// Live camera/controls state supplied by the rendering subsystem.
pub trait ViewerScene {
    fn current_view(&self) -> ViewState;
    /// Label of the loaded model, `None` when nothing is loaded.
    fn loaded_model_name(&self) -> Option<String>;
    fn apply_view(&mut self, view: &ViewState);
}

/// Plain in-memory scene, used where no renderer is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneState {
    pub view: ViewState,
    pub model_name: Option<String>,
}

impl SceneState {
    pub fn new(view: ViewState, model_name: Option<String>) -> Self {
        Self { view, model_name }
    }
}

impl Default for SceneState {
    /// Matches the viewer's initial camera: `(0, 1.5, 3)` looking at the origin.
    fn default() -> Self {
        Self {
            view: ViewState {
                camera: CameraPose {
                    position: [0.0, 1.5, 3.0],
                    quaternion: [0.0, 0.0, 0.0, 1.0],
                },
                controls_target: [0.0, 0.0, 0.0],
            },
            model_name: None,
        }
    }
}

impl ViewerScene for SceneState {
    fn current_view(&self) -> ViewState {
        self.view
    }

    fn loaded_model_name(&self) -> Option<String> {
        self.model_name.clone()
    }

    fn apply_view(&mut self, view: &ViewState) {
        self.view = *view;
    }
}

/// Copies a preset's pose and orbit target onto the live scene.
///
/// Touches neither the store nor the snapshot.
pub fn apply_preset(preset: &ClientPreset, scene: &mut impl ViewerScene) {
    scene.apply_view(&preset.view());
}
