//! Dispatch of UI eraser commands

use glam::Vec3;
use tracing::{debug, error};
use voxview_ipc::{EditTag, EngineToUi, EraserCommand, SkipReason, SurfaceEraseRequest};

use super::{EraseOutcome, SurfaceEraseParams, VolumeEngine};
use crate::types::EditKind;

impl From<EditKind> for EditTag {
    fn from(kind: EditKind) -> Self {
        match kind {
            EditKind::Tangential => EditTag::Tangential,
            EditKind::Normal => EditTag::Normal,
            EditKind::Flood => EditTag::Flood,
        }
    }
}

impl From<&SurfaceEraseRequest> for SurfaceEraseParams {
    fn from(req: &SurfaceEraseRequest) -> Self {
        Self {
            target_uv: Vec3::from_array(req.target),
            size: req.size,
            depth: req.depth,
            view_direction: Vec3::from_array(req.view_direction),
            iso_threshold: req.iso_threshold,
            is_start: req.is_start,
            is_mouse_up: req.is_mouse_up,
            use_surface_normal: req.use_surface_normal,
            stroke_length: req.stroke_length,
        }
    }
}

impl VolumeEngine {
    /// Execute one command and build the notification for the UI
    ///
    /// Notifications for mask changes (edits, undo, reset) carry the dirty
    /// slices, draining the tracker.
    pub fn handle_command(&mut self, command: EraserCommand) -> EngineToUi {
        debug!("Handling eraser command: {:?}", command);
        match command {
            EraserCommand::SurfaceErase(req) => {
                let outcome = self.erase_surface(&SurfaceEraseParams::from(&req));
                self.edit_notification(outcome)
            }
            EraserCommand::FloodErase {
                target,
                is_start,
                is_mouse_up,
            } => {
                let outcome = self.flood_erase(Vec3::from_array(target), is_start, is_mouse_up);
                self.edit_notification(outcome)
            }
            EraserCommand::Undo => match self.undo() {
                Some(report) => EngineToUi::UndoApplied {
                    tag: report.kind.into(),
                    voxels: report.voxels,
                    dirty_slices: self.take_dirty_mask_slices(),
                },
                None => EngineToUi::NothingToUndo,
            },
            EraserCommand::ResetMask => {
                self.reset_mask();
                EngineToUi::MaskReset {
                    dirty_slices: self.take_dirty_mask_slices(),
                }
            }
            EraserCommand::Refilter { sigma } => match self.refilter(sigma) {
                Ok(Some(report)) => EngineToUi::Filtered {
                    slices: report.slices,
                },
                Ok(None) => EngineToUi::EditSkipped {
                    reason: SkipReason::NotReady,
                },
                Err(err) => {
                    error!("Refilter failed: {}", err);
                    EngineToUi::Error {
                        code: "filter_failed".to_string(),
                        message: err.to_string(),
                    }
                }
            },
        }
    }

    fn edit_notification(&mut self, outcome: EraseOutcome) -> EngineToUi {
        let reason = match outcome {
            EraseOutcome::Erased { kind, voxels } => {
                return EngineToUi::EditApplied {
                    tag: kind.into(),
                    voxels,
                    dirty_slices: self.take_dirty_mask_slices(),
                };
            }
            EraseOutcome::Released => SkipReason::Released,
            EraseOutcome::Throttled => SkipReason::Throttled,
            EraseOutcome::NoChange => SkipReason::NoChange,
        };
        EngineToUi::EditSkipped { reason }
    }
}
