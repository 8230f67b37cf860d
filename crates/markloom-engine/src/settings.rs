use crate::geometry::Size;

/// Tunables for an editor session
///
/// Front ends usually build this from the `[editor]` table of the user's
/// config file; everything has a usable default.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorSettings {
    /// Vertical space between consecutive view lines, also the top margin
    pub gap: f32,
    /// Height of one text row, used for caret bands and vertical navigation
    pub line_height: f32,
    /// Scrollbar thickness; shrinks the visible container and sets the
    /// drag-autoscroll step
    pub scrollbar_size: f32,
    /// Margin between the container edge and the region the caret must stay in
    pub container_padding: f32,
    /// View lines materialized beyond each edge of the viewport
    pub window_buffer: usize,
    /// Overlap area above which two ranges count as intersecting
    pub intersection_threshold: f32,
    pub viewport: Size,
    /// Undo steps kept before the oldest is dropped
    pub history_limit: usize,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            gap: 24.0,
            line_height: 28.8,
            scrollbar_size: 16.0,
            container_padding: 4.0,
            window_buffer: 2,
            intersection_threshold: 1.0,
            viewport: Size::new(800.0, 600.0),
            history_limit: 100,
        }
    }
}

impl EditorSettings {
    /// Visible container size: viewport minus scrollbar and padding
    pub fn container_size(&self) -> Size {
        let inset = self.scrollbar_size + self.container_padding;
        Size::new(
            (self.viewport.width - inset).max(0.0),
            (self.viewport.height - inset).max(0.0),
        )
    }
}
