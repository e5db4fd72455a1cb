use std::sync::Arc;

use scout_protocol::DisplayEntry;
use scout_protocol::Location;
use tracing::debug;
use tracing::warn;

use crate::host::Host;
use crate::host::LineKind;
use crate::host::PaneId;
use crate::host::Surface;
use crate::host::SurfaceLine;

const SEPARATOR: &str = "────────────────────────────────────────";
const TARGET_MARKER: &str = "> ";
const CONTEXT_MARKER: &str = "  ";

/// At most one read-only preview surface, owned by whichever controller
/// is active. Created lazily on first use, updated in place afterwards,
/// torn down entirely when its mode exits.
pub(crate) struct Preview {
    surface: Option<Surface>,
    context_lines: u32,
}

impl Preview {
    pub(crate) fn new(context_lines: u32) -> Self {
        Self {
            surface: None,
            context_lines,
        }
    }

    /// Materialize a preview of the entry's location. Focus stays on (or
    /// returns to) `return_focus`; the preview never steals input focus.
    /// Entries without a location are ignored.
    pub(crate) async fn show(
        &mut self,
        host: &Arc<dyn Host>,
        entry: &DisplayEntry,
        return_focus: PaneId,
    ) {
        let Some(location) = &entry.location else {
            return;
        };

        let text = match host.read_file(&location.file).await {
            Ok(text) => text,
            Err(err) => {
                warn!("preview read failed for {}: {err:#}", location.file.display());
                host.set_status(&format!("preview failed: {err}")).await;
                return;
            }
        };
        let lines = build_preview_lines(location, &text, self.context_lines);

        match self.surface {
            Some(surface) => {
                if let Err(err) = host.update_surface(surface, lines).await {
                    warn!("preview update failed: {err:#}");
                    host.set_status(&format!("preview failed: {err}")).await;
                }
            }
            None => match host.create_surface("preview", lines).await {
                Ok(surface) => {
                    self.surface = Some(surface);
                    if let Err(err) = host.focus_pane(return_focus).await {
                        warn!("could not restore focus after preview: {err:#}");
                    }
                }
                Err(err) => {
                    warn!("preview create failed: {err:#}");
                    host.set_status(&format!("preview failed: {err}")).await;
                }
            },
        }
    }

    /// Tear the surface down. The next `show` recreates it fresh.
    pub(crate) async fn close(&mut self, host: &Arc<dyn Host>) {
        if let Some(surface) = self.surface.take()
            && let Err(err) = host.close_surface(surface).await
        {
            debug!("preview close failed: {err:#}");
        }
    }
}

/// Header, separator, then a symmetric context window around the target
/// line, clamped to the file. The target line carries a leading marker.
fn build_preview_lines(location: &Location, text: &str, context: u32) -> Vec<SurfaceLine> {
    let mut lines = vec![
        SurfaceLine::new(
            LineKind::Header,
            format!("{}:{}", location.file.display(), location.line),
        ),
        SurfaceLine::new(LineKind::Separator, SEPARATOR),
    ];

    let source: Vec<&str> = text.lines().collect();
    let total = source.len() as u32;
    if total == 0 {
        return lines;
    }

    let target = location.line;
    let start = target.saturating_sub(context).max(1);
    let end = target.saturating_add(context).min(total);
    for number in start..=end {
        let Some(content) = source.get(number as usize - 1) else {
            break;
        };
        let (marker, kind) = if number == target {
            (TARGET_MARKER, LineKind::Target)
        } else {
            (CONTEXT_MARKER, LineKind::Context)
        };
        lines.push(SurfaceLine::new(kind, format!("{marker}{content}")));
    }
    lines
}
