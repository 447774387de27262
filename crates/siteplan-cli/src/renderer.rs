//! Terminal rendering of the markdown produced by the core display types.
//!
//! Rich output goes through termimad with a small skin; `--no-color` prints
//! the markdown unchanged.

use anyhow::Result;
use termimad::{crossterm::style::Color, MadSkin};

/// Terminal renderer that can switch between rich and plain text output
pub struct TerminalRenderer {
    rich_enabled: bool,
    skin: MadSkin,
}

impl TerminalRenderer {
    pub fn new(rich_enabled: bool) -> Self {
        let mut skin = MadSkin::default();

        skin.set_headers_fg(Color::Blue);
        skin.bold.set_fg(Color::Yellow);
        skin.italic.set_fg(Color::Magenta);
        skin.inline_code.set_bg(Color::AnsiValue(238));

        Self { rich_enabled, skin }
    }

    /// Render markdown text to the terminal.
    ///
    /// Header lines keep their hash marks and are colored by level so nested
    /// sections (analysis, plan, task, last check) stay distinguishable.
    pub fn render(&self, markdown: &str) -> Result<()> {
        if !self.rich_enabled {
            print!("{markdown}");
            return Ok(());
        }

        for line in markdown.lines() {
            match header_color(line) {
                Some(code) => println!("\x1b[{code}m{line}\x1b[0m"),
                None => {
                    self.skin.print_inline(line);
                    println!();
                }
            }
        }
        Ok(())
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new(true)
    }
}

/// ANSI color code for a markdown header line, `None` for other lines.
fn header_color(line: &str) -> Option<u8> {
    let level = line.chars().take_while(|c| *c == '#').count();
    if level == 0 || !line[level..].starts_with(' ') {
        return None;
    }
    Some(match level {
        1 => 34,
        2 => 36,
        3 => 32,
        _ => 35,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_renderer() {
        let renderer = TerminalRenderer::new(false);
        assert!(!renderer.rich_enabled);
    }

    #[test]
    fn test_default_is_rich() {
        let renderer = TerminalRenderer::default();
        assert!(renderer.rich_enabled);
    }

    #[test]
    fn test_header_colors_by_level() {
        assert_eq!(header_color("# https://example.com"), Some(34));
        assert_eq!(header_color("## Tasks (0/3 completed)"), Some(36));
        assert_eq!(header_color("### 1. Add alt text"), Some(32));
        assert_eq!(header_color("#### Last Check"), Some(35));
    }

    #[test]
    fn test_non_headers_are_not_colored() {
        assert_eq!(header_color("- Score: 62/100"), None);
        assert_eq!(header_color("#hashtag"), None);
        assert_eq!(header_color(""), None);
    }
}
