//! Command-line stand-in for the live viewer scene.

use anyhow::{bail, Result};
use clap::Args;
use orbitview_core::{CameraPose, SceneState, ViewState};

#[derive(Args, Debug, Clone)]
pub struct SceneArgs {
    /// Camera position as `x,y,z`
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, default_values_t = [0.0, 1.5, 3.0])]
    pub position: Vec<f64>,

    /// Camera orientation quaternion as `x,y,z,w`
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, default_values_t = [0.0, 0.0, 0.0, 1.0])]
    pub quaternion: Vec<f64>,

    /// Orbit target as `x,y,z`
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, default_values_t = [0.0, 0.0, 0.0])]
    pub target: Vec<f64>,

    /// Label of the loaded model
    #[arg(long)]
    pub model: Option<String>,
}

impl SceneArgs {
    pub fn into_scene(self) -> Result<SceneState> {
        let view = ViewState {
            camera: CameraPose {
                position: fixed("position", self.position)?,
                quaternion: fixed("quaternion", self.quaternion)?,
            },
            controls_target: fixed("target", self.target)?,
        };
        Ok(SceneState::new(view, self.model))
    }
}

fn fixed<const N: usize>(flag: &str, values: Vec<f64>) -> Result<[f64; N]> {
    let actual = values.len();
    match values.try_into() {
        Ok(array) => Ok(array),
        Err(_) => bail!("--{flag} expects {N} comma-separated numbers, got {actual}"),
    }
}
