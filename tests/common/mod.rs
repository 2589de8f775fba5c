pub mod fixtures;

use folio::layout::DrawableId;
use folio::render::{DrawCommand, StateChange};
use folio::types::TextureId;
use folio::{FolioError, FrameConfig, FrameDriver, InboxSender, Scene};
use serde_json::Value;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// A driver over the software backend with a scene already built.
pub struct SceneDriver {
    pub driver: FrameDriver,
    pub sender: InboxSender,
    /// The layout the scene was built into.
    pub scene: DrawableId,
}

impl SceneDriver {
    /// Children of the scene layout, in order.
    pub fn items(&self) -> Vec<DrawableId> {
        self.driver.tree().children(self.scene).to_vec()
    }

    /// Commands the backend recorded in the latest frame, unless already taken.
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        self.driver.backend_mut().take_commands()
    }
}

/// Builds a scene from JSON with the default configuration.
pub fn driver_for(scene: &Value) -> Result<SceneDriver, FolioError> {
    driver_with_config(scene, FrameConfig::default())
}

pub fn driver_with_config(scene: &Value, config: FrameConfig) -> Result<SceneDriver, FolioError> {
    let scene = Scene::from_json(&serde_json::to_string(scene)?)?;
    let (mut driver, sender) = FrameDriver::software(config);
    let page = driver.config().page.clone();
    let scene = scene.build(driver.tree_mut(), &page)?;
    Ok(SceneDriver { driver, sender, scene })
}

pub fn binds_texture(commands: &[DrawCommand], texture: TextureId) -> bool {
    commands
        .iter()
        .any(|c| *c == DrawCommand::Bind(StateChange::Texture(Some(texture))))
}
