// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The per-frame state machine: acquire, shadow pass, main pass, submit, present.
//!
//! [`FrameOrchestrator::draw_frame`] drives any [`RenderBackend`], so the same sequence
//! runs against the Vulkan renderer and against the recording mock in tests.

use umbra_core::platform::input::InputSnapshot;
use umbra_core::renderer::api::common::Extent2D;
use umbra_core::renderer::traits::{
    advance_slot, AcquireOutcome, DebugOverlay, OverlayState, PresentOutcome, RenderBackend,
};
use umbra_core::renderer::{PresentError, RenderError};
use umbra_core::scene::Scene;
use umbra_lanes::render_lane::{
    flush, prepare_scene_buffers, prepare_scene_uniforms, record_main_pass, record_shadow_pass,
    update_node_uniforms, update_scene_uniforms, update_shadow_uniforms, MainPassInputs,
    SceneBindings, SceneUniformBlocks,
};

/// What happened to one call of [`FrameOrchestrator::draw_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame was submitted and queued for display.
    Presented,
    /// The frame was submitted, then the surface was rebuilt because present reported it
    /// stale.
    PresentedAndRecreated,
    /// Nothing was drawn because the surface is zero-sized.
    SkippedEmptySurface,
    /// Nothing was drawn; acquire reported the surface out of date and it was rebuilt.
    SkippedOutOfDate,
}

/// Device state created on the first frame.
#[derive(Debug, Clone, Copy)]
struct Prepared {
    blocks: SceneUniformBlocks,
    bindings: SceneBindings,
}

/// Sequences one frame at a time over a [`RenderBackend`].
///
/// Frames are strictly serialized: a frame's commands are submitted and the queue drained
/// before the next frame starts recording.
#[derive(Debug, Default)]
pub struct FrameOrchestrator {
    prepared: Option<Prepared>,
    slot: usize,
    frame: u64,
    overlay_state: OverlayState,
    resize_pending: bool,
}

impl FrameOrchestrator {
    /// Creates an orchestrator that prepares the scene on its first frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// The sync slot the next frame uses.
    pub fn current_slot(&self) -> usize {
        self.slot
    }

    /// Number of frames presented so far.
    pub fn frames_presented(&self) -> u64 {
        self.frame
    }

    /// The overlay toggles as of the last frame.
    pub fn overlay_state(&self) -> OverlayState {
        self.overlay_state
    }

    /// Whether the scene's device resources exist.
    pub fn is_prepared(&self) -> bool {
        self.prepared.is_some()
    }

    /// Makes the next frame rebuild the surface before acquiring.
    pub fn request_resize(&mut self) {
        self.resize_pending = true;
    }

    /// Creates the scene uniform blocks, uploads the scene and writes its descriptor sets.
    /// Does nothing once the scene is prepared.
    pub fn prepare<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        scene: &mut Scene,
    ) -> Result<(), RenderError> {
        if self.prepared.is_some() {
            return Ok(());
        }
        let blocks = prepare_scene_uniforms(backend)?;
        let bindings = prepare_scene_buffers(backend, scene, &blocks)?;
        log::info!(
            "Scene prepared: {} nodes, {} meshes",
            scene.nodes.len(),
            scene.meshes().len()
        );
        self.prepared = Some(Prepared { blocks, bindings });
        Ok(())
    }

    /// Draws one frame of `scene` to a surface currently `surface_extent` large.
    ///
    /// The overlay builds its frame after the slot's fence is waited on and before the
    /// uniforms are streamed, so its scene edits show up in the same frame.
    ///
    /// ## Errors
    ///
    /// Any [`RenderError`] is fatal: resource failures, lost devices and failed surface
    /// recreation. A stale surface is not an error; it is rebuilt and reported through
    /// [`FrameOutcome`].
    pub fn draw_frame<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        scene: &mut Scene,
        overlay: &mut dyn DebugOverlay,
        input: &InputSnapshot,
        surface_extent: Extent2D,
    ) -> Result<FrameOutcome, RenderError> {
        if surface_extent.is_empty() {
            return Ok(FrameOutcome::SkippedEmptySurface);
        }
        if std::mem::take(&mut self.resize_pending) {
            self.recreate(backend, surface_extent)?;
        }
        self.prepare(backend, scene)?;
        let prepared = self.prepared.ok_or(RenderError::NotPrepared("scene"))?;
        let slot = self.slot;

        // --- 1. Acquire ---
        backend.wait_for_slot(slot)?;
        overlay.new_frame(input);
        overlay.build(scene, &mut self.overlay_state);
        let image_index = match backend.acquire(slot)? {
            AcquireOutcome::Image(index) => index,
            AcquireOutcome::OutOfDate => {
                self.recreate(backend, surface_extent)?;
                return Ok(FrameOutcome::SkippedOutOfDate);
            }
        };

        // --- 2. Stream uniforms ---
        let extent = backend.extent();
        update_shadow_uniforms(backend, &prepared.blocks, scene)?;
        update_scene_uniforms(backend, &prepared.blocks, scene, extent)?;
        flush(backend, &prepared.blocks)?;
        update_node_uniforms(backend, scene)?;

        // --- 3. Record the shadow and main passes ---
        backend.begin_commands(slot, image_index)?;
        record_shadow_pass(backend, scene, &prepared.bindings)?;
        let inputs = MainPassInputs {
            bindings: &prepared.bindings,
            extent,
            overlay_state: self.overlay_state,
        };
        record_main_pass(backend, scene, &inputs, overlay)?;
        backend.end_commands()?;

        // --- 4. Submit and present ---
        // The fence is only unsignaled once a submit is certain to signal it again.
        backend.reset_slot(slot)?;
        backend.submit(slot)?;
        backend.wait_idle()?;
        let stale = match backend.present(slot, image_index) {
            Ok(PresentOutcome::Presented) => false,
            Ok(PresentOutcome::Suboptimal) | Err(PresentError::OutOfDate) => true,
            Err(e) => return Err(e.into()),
        };

        self.frame += 1;
        log::trace!("Frame {} presented (slot {slot}, image {image_index})", self.frame);
        self.slot = advance_slot(slot, backend.slot_count());

        if stale {
            self.recreate(backend, surface_extent)?;
            return Ok(FrameOutcome::PresentedAndRecreated);
        }
        Ok(FrameOutcome::Presented)
    }

    fn recreate<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        extent: Extent2D,
    ) -> Result<(), RenderError> {
        backend.recreate_surface(extent)?;
        // The slot count follows the new image count.
        let count = backend.slot_count();
        if count > 0 && self.slot >= count {
            self.slot = 0;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_core::renderer::testing::{Call, RecordingBackend};
    use umbra_core::renderer::traits::CommandRecorder;

    struct Silent;

    impl DebugOverlay for Silent {
        fn new_frame(&mut self, _input: &InputSnapshot) {}
        fn build(&mut self, _scene: &mut Scene, _state: &mut OverlayState) {}
        fn record(&mut self, _recorder: &mut dyn CommandRecorder) {}
    }

    fn frame_calls(calls: &[Call]) -> Vec<Call> {
        calls
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    Call::WaitForSlot(_)
                        | Call::Acquire(_)
                        | Call::ResetSlot(_)
                        | Call::BeginCommands { .. }
                        | Call::EndCommands
                        | Call::Submit(_)
                        | Call::WaitIdle
                        | Call::Present { .. }
                        | Call::RecreateSurface(_)
                )
            })
            .cloned()
            .collect()
    }

    #[test]
    fn test_frame_sequence() {
        let mut backend = RecordingBackend::default();
        let mut scene = Scene::default();
        let mut orchestrator = FrameOrchestrator::new();
        let extent = backend.extent;

        let outcome = orchestrator
            .draw_frame(&mut backend, &mut scene, &mut Silent, &InputSnapshot::default(), extent)
            .unwrap();
        assert_eq!(outcome, FrameOutcome::Presented);
        assert_eq!(
            frame_calls(&backend.calls),
            vec![
                Call::WaitForSlot(0),
                Call::Acquire(0),
                Call::BeginCommands {
                    slot: 0,
                    image_index: 0
                },
                Call::EndCommands,
                Call::ResetSlot(0),
                Call::Submit(0),
                Call::WaitIdle,
                Call::Present {
                    slot: 0,
                    image_index: 0
                },
            ]
        );
        assert_eq!(orchestrator.current_slot(), 1);
        assert_eq!(orchestrator.frames_presented(), 1);
    }

    #[test]
    fn test_fence_reset_directly_precedes_submit() {
        let mut backend = RecordingBackend::new(2, Extent2D::new(640, 480));
        let mut scene = Scene::default();
        let mut orchestrator = FrameOrchestrator::new();
        for _ in 0..3 {
            orchestrator
                .draw_frame(
                    &mut backend,
                    &mut scene,
                    &mut Silent,
                    &InputSnapshot::default(),
                    Extent2D::new(640, 480),
                )
                .unwrap();
        }
        let calls = frame_calls(&backend.calls);
        let resets: Vec<usize> = calls
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c, Call::ResetSlot(_)))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(resets.len(), 3);
        for i in resets {
            assert_eq!(calls[i - 1], Call::EndCommands);
            match (&calls[i], &calls[i + 1]) {
                (Call::ResetSlot(reset), Call::Submit(submitted)) => assert_eq!(reset, submitted),
                other => panic!("fence reset not followed by its submit: {other:?}"),
            }
        }
    }

    #[test]
    fn test_slots_wrap_with_image_count() {
        let mut backend = RecordingBackend::new(3, Extent2D::new(640, 480));
        let mut scene = Scene::default();
        let mut orchestrator = FrameOrchestrator::new();
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(orchestrator.current_slot());
            orchestrator
                .draw_frame(
                    &mut backend,
                    &mut scene,
                    &mut Silent,
                    &InputSnapshot::default(),
                    Extent2D::new(640, 480),
                )
                .unwrap();
        }
        assert_eq!(seen, vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_scene_is_prepared_once() {
        let mut backend = RecordingBackend::default();
        let mut scene = Scene::default();
        let mut orchestrator = FrameOrchestrator::new();
        let extent = backend.extent;
        for _ in 0..2 {
            orchestrator
                .draw_frame(&mut backend, &mut scene, &mut Silent, &InputSnapshot::default(), extent)
                .unwrap();
        }
        assert_eq!(
            backend.count(|c| matches!(c, Call::CreateCubemap { .. })),
            1
        );
        assert_eq!(
            backend.count(|c| matches!(c, Call::RecordUniformCopy { blocks, .. } if blocks.len() == 6)),
            1
        );
    }

    #[test]
    fn test_empty_surface_skips_without_touching_the_backend() {
        let mut backend = RecordingBackend::default();
        let mut scene = Scene::default();
        let mut orchestrator = FrameOrchestrator::new();
        let outcome = orchestrator
            .draw_frame(
                &mut backend,
                &mut scene,
                &mut Silent,
                &InputSnapshot::default(),
                Extent2D::new(0, 600),
            )
            .unwrap();
        assert_eq!(outcome, FrameOutcome::SkippedEmptySurface);
        assert!(backend.calls.is_empty());
        assert!(!orchestrator.is_prepared());
    }

    #[test]
    fn test_out_of_date_acquire_recreates_and_skips() {
        let mut backend = RecordingBackend::default();
        backend.acquire_outcomes.push_back(AcquireOutcome::OutOfDate);
        let mut scene = Scene::default();
        let mut orchestrator = FrameOrchestrator::new();
        let resized = Extent2D::new(800, 600);

        let outcome = orchestrator
            .draw_frame(&mut backend, &mut scene, &mut Silent, &InputSnapshot::default(), resized)
            .unwrap();
        assert_eq!(outcome, FrameOutcome::SkippedOutOfDate);
        assert_eq!(
            frame_calls(&backend.calls),
            vec![
                Call::WaitForSlot(0),
                Call::Acquire(0),
                Call::RecreateSurface(resized),
            ]
        );
        // The fence was never reset, so the slot is reused as is.
        assert_eq!(orchestrator.current_slot(), 0);
        assert_eq!(backend.extent, resized);
    }

    #[test]
    fn test_suboptimal_present_recreates_after_presenting() {
        let mut backend = RecordingBackend::default();
        backend.present_outcomes.push_back(PresentOutcome::Suboptimal);
        let mut scene = Scene::default();
        let mut orchestrator = FrameOrchestrator::new();
        let extent = backend.extent;

        let outcome = orchestrator
            .draw_frame(&mut backend, &mut scene, &mut Silent, &InputSnapshot::default(), extent)
            .unwrap();
        assert_eq!(outcome, FrameOutcome::PresentedAndRecreated);
        assert_eq!(backend.calls.last(), Some(&Call::RecreateSurface(extent)));
        assert_eq!(orchestrator.frames_presented(), 1);
    }

    #[test]
    fn test_resize_request_recreates_before_acquire() {
        let mut backend = RecordingBackend::default();
        let mut scene = Scene::default();
        let mut orchestrator = FrameOrchestrator::new();
        orchestrator.request_resize();
        let resized = Extent2D::new(1920, 1080);

        orchestrator
            .draw_frame(&mut backend, &mut scene, &mut Silent, &InputSnapshot::default(), resized)
            .unwrap();
        let calls = frame_calls(&backend.calls);
        assert_eq!(calls[0], Call::RecreateSurface(resized));
        assert_eq!(calls[1], Call::WaitForSlot(0));
        assert_eq!(
            backend.count(|c| matches!(c, Call::RecreateSurface(_))),
            1
        );
    }

    #[test]
    fn test_shrinking_image_count_resets_slot() {
        let mut backend = RecordingBackend::new(3, Extent2D::new(640, 480));
        let mut scene = Scene::default();
        let mut orchestrator = FrameOrchestrator::new();
        let extent = backend.extent;
        for _ in 0..2 {
            orchestrator
                .draw_frame(&mut backend, &mut scene, &mut Silent, &InputSnapshot::default(), extent)
                .unwrap();
        }
        assert_eq!(orchestrator.current_slot(), 2);

        backend.slots = 2;
        orchestrator.request_resize();
        orchestrator
            .draw_frame(&mut backend, &mut scene, &mut Silent, &InputSnapshot::default(), extent)
            .unwrap();
        assert!(backend.calls.contains(&Call::WaitForSlot(0)));
        assert!(!backend.calls.contains(&Call::WaitForSlot(2)));
    }
}
