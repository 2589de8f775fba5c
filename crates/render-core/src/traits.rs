use crate::{HitRecord, Mesh, RenderError, RenderMode, SelectionId, StateChange};

/// The graphics collaborator, reduced to what layout needs from it.
///
/// A GPU implementation renders identify passes into an integer id target
/// with a depth attachment and reads back the region; the
/// [`SoftwareBackend`](crate::SoftwareBackend) does the same on the CPU.
pub trait GraphicsBackend {
    fn mode(&self) -> RenderMode;

    /// Called once at the start of every frame, before any pass.
    fn begin_frame(&mut self) {}

    /// Switches between visible output and an identify pass. Entering
    /// identify mode clears the id+depth target.
    fn set_mode(&mut self, mode: RenderMode) -> Result<(), RenderError>;

    fn bind(&mut self, change: StateChange);

    /// Tags subsequent submissions while in identify mode.
    fn set_identity(&mut self, id: SelectionId);

    fn submit(&mut self, mesh: &Mesh) -> Result<(), RenderError>;

    /// Reads back which ids covered the identify region, with depth ranges.
    fn read_hits(&mut self) -> Result<Vec<HitRecord>, RenderError>;
}
