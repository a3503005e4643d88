use std::io::Write;

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::Print;

use crate::bridge::{Bridge, ContextDelivered, MountToken};
use crate::context::ContextSnapshot;
use crate::error::{BridgeError, Result};
use crate::geometry::Rect;
use crate::zone::Zone;

use super::width::{display_width, truncate_to_width};

/// Renderer runtime parameters.
#[derive(Debug, Clone, Default)]
pub struct RendererSettings {
    pub restore_cursor: Option<(u16, u16)>,
}

/// Draws one zone. Owns the renderer side of the bridge handshake.
#[derive(Debug, Clone)]
pub struct ZoneRenderer {
    zone: Zone,
    token: Option<MountToken>,
    delivered: Option<ContextSnapshot>,
    settings: RendererSettings,
}

impl ZoneRenderer {
    pub fn new(zone: Zone) -> Self {
        Self {
            zone,
            token: None,
            delivered: None,
            settings: RendererSettings::default(),
        }
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    pub fn settings_mut(&mut self) -> &mut RendererSettings {
        &mut self.settings
    }

    /// Receive the token the bridge issued at `initialize`.
    pub fn attach(&mut self, token: MountToken) {
        self.token = Some(token);
        self.delivered = None;
    }

    pub fn detach(&mut self) {
        self.token = None;
        self.delivered = None;
    }

    pub fn token(&self) -> Option<MountToken> {
        self.token
    }

    /// True once the bridge has answered this renderer's mount announcement.
    pub fn is_mounted(&self) -> bool {
        self.delivered.is_some()
    }

    pub fn delivered_context(&self) -> Option<&ContextSnapshot> {
        self.delivered.as_ref()
    }

    /// Announce "mounted" to the bridge and keep the context it returns.
    pub fn announce(&mut self, bridge: &mut Bridge) -> Result<ContextDelivered> {
        let token = self.token.ok_or(BridgeError::NotReady(self.zone))?;
        let delivered = bridge.renderer_mounted(token)?;
        self.accept(&delivered);
        Ok(delivered)
    }

    /// Keep a context the bridge delivered for this renderer's token.
    /// Deliveries for another zone or epoch are ignored.
    pub fn accept(&mut self, delivered: &ContextDelivered) -> bool {
        let matches = self
            .token
            .is_some_and(|t| t.zone == delivered.zone && t.epoch == delivered.epoch);
        if matches {
            self.delivered = Some(delivered.context.clone());
        }
        matches
    }

    /// Lines for the zone, padded to the rect and clipped to its height.
    pub fn compose(&self, bridge: &Bridge, rect: Rect) -> Vec<String> {
        let width = rect.width as usize;
        let height = rect.height as usize;
        if width == 0 || height == 0 {
            return Vec::new();
        }

        let context = bridge.context();
        let badges = context.map(|ctx| ctx.enable_context_bridge).unwrap_or(false);

        let mut lines = if !bridge.is_ready() {
            vec![format!("Initializing {} bridge...", self.zone)]
        } else if let Some(content) = bridge.injected_content() {
            wrap_to_width(&content.body, rect.width)
        } else {
            let mut idle = vec![format!("{} slot bridge ready", self.zone)];
            if let Some(route) = context.and_then(|ctx| ctx.current_route()) {
                idle.push(format!("Route: {route}"));
            }
            idle
        };

        lines.truncate(height);
        while lines.len() < height {
            lines.push(String::new());
        }

        if badges && bridge.injected_content().is_some() {
            let badge = format!("[{}]", bridge.injection_count());
            let space = width.saturating_sub(display_width(&badge));
            let head = truncate_to_width(&lines[0], space);
            lines[0] = format!("{}{}", pad_to(head, space), badge);
        }
        if badges && bridge.is_handoff_complete() {
            if let Some(last) = lines.last_mut() {
                *last = format!("✓ {last}");
            }
        }

        for line in lines.iter_mut() {
            pad_line(line, rect.width);
        }
        lines
    }

    pub fn render(&self, writer: &mut impl Write, bridge: &Bridge, rect: Rect) -> Result<()> {
        for (offset, line) in self.compose(bridge, rect).iter().enumerate() {
            queue!(
                writer,
                MoveTo(rect.x, rect.y.saturating_add(offset as u16)),
                Print(line)
            )?;
        }

        if let Some((row, col)) = self.settings.restore_cursor {
            queue!(writer, MoveTo(col, row))?;
        }

        writer.flush()?;
        Ok(())
    }
}

fn wrap_to_width(content: &str, width: u16) -> Vec<String> {
    if width == 0 {
        return Vec::new();
    }

    let mut lines = Vec::new();
    for raw in content.split('\n') {
        if raw.is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        for ch in raw.chars() {
            if current.is_empty() && ch == ' ' {
                continue;
            }
            current.push(ch);
            let display = display_width(&current) as u16;
            if display > width {
                current.pop();
                if current.is_empty() {
                    // Character wider than the zone; drop it.
                    lines.push(String::new());
                } else {
                    lines.push(current.trim_start().to_string());
                }
                current.clear();
                if ch != ' ' {
                    current.push(ch);
                }
            } else if display == width {
                lines.push(current.trim_start().to_string());
                current.clear();
            }
        }

        if !current.is_empty() {
            lines.push(current.trim_start().to_string());
        }
    }

    lines
}

fn pad_to(mut text: String, width: usize) -> String {
    let mut display = display_width(&text);
    while display < width {
        text.push(' ');
        display += 1;
    }
    text
}

fn pad_line(line: &mut String, width: u16) {
    let width = width as usize;
    if display_width(line) > width {
        // Overshoot from badges or ANSI content; clip to the zone edge.
        while display_width(line) > width {
            line.pop();
        }
    }
    let padded = pad_to(std::mem::take(line), width);
    *line = padded;
}
