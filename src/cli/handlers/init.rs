use crate::cli::commands::InitArgs;
use crate::io::board_io;

const BOARD_TOML_TEMPLATE: &str = r##"[board]
name = "{name}"

# --- Geometry ---
# Items can never be resized below this.
[geometry]
min_width = 160.0
min_height = 120.0
# resize_handle = 16.0

# --- Strings ---
# Defaults for new connections. Style is solid, dashed, dotted or zigzag.
[connections]
color = "#d32f2f"
style = "solid"
thickness = 2.0
# min_line_length = 20.0

# --- Globe ---
# Arcs fan out from `primary` (a marker id), or the first marker if unset.
[globe]
arc_lift = 1.15
arc_segments = 64
# primary = "hq"

# --- UI Customization ---
# Board units per terminal cell.
[ui]
scale_x = 10.0
scale_y = 20.0
#
# [ui.colors]
# background = "#2B1D0E"
# cork = "#A0522D"
# text = "#F5E6C8"
# dim = "#8B7355"
# highlight = "#FFD54F"
# string = "#D32F2F"
# selected = "#4FC3F7"
"##;

/// Infer a board name from a directory name: replace hyphens with spaces, title-case.
fn infer_name(dir_name: &str) -> String {
    dir_name
        .split(['-', '_'])
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => {
                    let upper: String = c.to_uppercase().collect();
                    upper + &chars.collect::<String>()
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_board_toml(name: &str) -> String {
    // Names go inside a basic TOML string
    let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
    BOARD_TOML_TEMPLATE.replace("{name}", &escaped)
}

pub fn cmd_init(args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;

    if let Some(parent) = cwd.parent()
        && let Ok(parent_root) = board_io::discover_board(parent)
    {
        eprintln!(
            "Note: parent board found at {}/",
            parent_root.join(board_io::BOARD_DIR).display()
        );
        eprintln!("Creating new board in ./{}/", board_io::BOARD_DIR);
    }

    let name = args.name.unwrap_or_else(|| {
        cwd.file_name()
            .and_then(|n| n.to_str())
            .map(infer_name)
            .unwrap_or_else(|| "Untitled".to_string())
    });

    board_io::init_board(&cwd, &render_board_toml(&name))?;
    println!("Initialized board: {}", name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::BoardConfig;

    #[test]
    fn test_infer_name() {
        assert_eq!(infer_name("harbor-murders"), "Harbor Murders");
        assert_eq!(infer_name("case_42"), "Case 42");
        assert_eq!(infer_name("corkboard"), "Corkboard");
    }

    #[test]
    fn test_template_parses_with_defaults() {
        let text = render_board_toml("The \"Docks\" Case");
        let config: BoardConfig = toml::from_str(&text).unwrap();
        assert_eq!(config.board.name, "The \"Docks\" Case");
        assert_eq!(config.geometry.min_width, 160.0);
        assert_eq!(config.connections.thickness, 2.0);
        assert_eq!(config.globe.arc_segments, 64);
        assert!(config.globe.primary.is_none());
        assert!(config.ui.colors.is_empty());
    }
}
