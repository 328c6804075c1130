//! Display-tree intents emitted by the lifecycle runtime for the rendering surface.

use desktop_app_contract::{ApplicationId, MenuFragmentId, WindowId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Where an attached window renders.
pub enum WindowLayer {
    /// Inside the ordered stack at the given position.
    Stacked(usize),
    /// Above the highest stack position in use.
    Modal,
    /// Container that already exists in the host page.
    Existing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Built-in window chrome affordances.
pub struct WindowChrome {
    /// Close button.
    pub closable: bool,
    /// Zoom button.
    pub zoomable: bool,
    /// Drag-to-move title bar.
    pub draggable: bool,
}

impl Default for WindowChrome {
    fn default() -> Self {
        Self {
            closable: true,
            zoomable: true,
            draggable: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Intents drained by the rendering surface with
/// [`ApplicationLifecycleManager::drain_effects`](crate::ApplicationLifecycleManager::drain_effects).
pub enum ShellEffect {
    /// Create the container grouping an application's windows.
    CreateWindowGroup {
        /// Owning application.
        application_id: ApplicationId,
    },
    /// Remove an application's window group.
    RemoveWindowGroup {
        /// Owning application.
        application_id: ApplicationId,
    },
    /// Attach a window container to the display tree.
    AttachWindow {
        /// Window being attached.
        window_id: WindowId,
        /// Owning application.
        application_id: ApplicationId,
        /// Controller content rendered in the container.
        markup: String,
        /// Render layer.
        layer: WindowLayer,
    },
    /// Detach a window container from the display tree.
    DetachWindow {
        /// Window being detached.
        window_id: WindowId,
    },
    /// Wire chrome affordances on a window.
    InstallChrome {
        /// Target window.
        window_id: WindowId,
        /// Affordances to wire.
        chrome: WindowChrome,
    },
    /// A stacked window's position changed.
    SetStackPosition {
        /// Target window.
        window_id: WindowId,
        /// New zero-based position.
        position: usize,
    },
    /// Toggle a window's blurred rendering.
    SetWindowBlurred {
        /// Target window.
        window_id: WindowId,
        /// Whether the window renders blurred.
        blurred: bool,
    },
    /// Show a menu fragment in the system bar.
    ShowMenu(MenuFragmentId),
    /// Hide a menu fragment from the system bar.
    HideMenu(MenuFragmentId),
}
