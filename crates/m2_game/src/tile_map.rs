//! Character-grid tile maps.
//!
//! A map file is plain text: one line per row, one character per cell.
//! Cell characters are resolved through [`TileBindings`]; the default set
//! maps `.` to empty and `0` to rock. Tiles are placed at
//! `(col * block, row * block)` in window pixels and drawn shifted by the
//! map's scroll offset.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use glam::IVec2;

/// Authored tile edge in logical pixels.
pub const BLOCK_SIZE: i32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileKind {
    Rocks,
}

impl TileKind {
    pub const ALL: &'static [TileKind] = &[TileKind::Rocks];

    pub fn id(self) -> u32 {
        match self {
            TileKind::Rocks => 0,
        }
    }

    pub fn is_solid(self) -> bool {
        match self {
            TileKind::Rocks => true,
        }
    }

    pub fn image_path(self) -> &'static str {
        match self {
            TileKind::Rocks => "assets/textures/four_rocks.png",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    kind: TileKind,
    solid: bool,
    visible: bool,
    position: IVec2,
    size: i32,
}

impl Tile {
    pub fn new(kind: TileKind, position: IVec2, size: i32) -> Self {
        Self {
            kind,
            solid: kind.is_solid(),
            visible: true,
            position,
            size,
        }
    }

    pub fn kind(&self) -> TileKind {
        self.kind
    }

    #[allow(dead_code)]
    pub fn id(&self) -> u32 {
        self.kind.id()
    }

    pub fn is_solid(&self) -> bool {
        self.solid
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[allow(dead_code)]
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Untranslated world position.
    pub fn position(&self) -> IVec2 {
        self.position
    }

    pub fn size(&self) -> i32 {
        self.size
    }
}

/// Character to tile-kind lookup used while parsing.
#[derive(Debug, Clone)]
pub struct TileBindings {
    empty: char,
    kinds: HashMap<char, TileKind>,
}

impl Default for TileBindings {
    fn default() -> Self {
        let mut kinds = HashMap::new();
        kinds.insert('0', TileKind::Rocks);
        Self { empty: '.', kinds }
    }
}

impl TileBindings {
    /// `Ok(None)` for the empty marker, `Err(())` for an unbound character.
    fn resolve(&self, ch: char) -> Result<Option<TileKind>, ()> {
        if ch == self.empty {
            return Ok(None);
        }
        self.kinds.get(&ch).copied().map(Some).ok_or(())
    }
}

/// Draw-ready view of one visible tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileDraw {
    pub kind: TileKind,
    pub solid: bool,
    pub position: IVec2,
    pub size: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileMap {
    rows: usize,
    cols: usize,
    cells: Vec<Option<Tile>>,
    block_size: i32,
    offset: IVec2,
}

impl TileMap {
    pub fn empty(block_size: i32) -> Self {
        Self {
            rows: 0,
            cols: 0,
            cells: Vec::new(),
            block_size,
            offset: IVec2::ZERO,
        }
    }

    /// Parse map text. Rows must all be as wide as the first one; trailing
    /// blank lines at the end of the file are ignored.
    pub fn parse(text: &str, block_size: i32, bindings: &TileBindings) -> Result<Self, String> {
        let mut lines: Vec<&str> = text.lines().collect();
        while lines.len() > 1 && lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        let Some(first) = lines.first() else {
            return Err("Map validation failed: map is empty".to_string());
        };
        let cols = first.chars().count();
        if cols == 0 {
            return Err("Map validation failed: first row is empty".to_string());
        }

        let rows = lines.len();
        let mut cells = Vec::with_capacity(rows * cols);
        for (row, line) in lines.iter().enumerate() {
            let width = line.chars().count();
            if width != cols {
                return Err(format!(
                    "Map validation failed: row {} has {} columns, expected {}",
                    row, width, cols
                ));
            }
            for (col, ch) in line.chars().enumerate() {
                let kind = bindings.resolve(ch).map_err(|()| {
                    format!(
                        "Map validation failed: unknown tile character '{}' at row {}, column {}",
                        ch, row, col
                    )
                })?;
                let position = IVec2::new(col as i32 * block_size, row as i32 * block_size);
                cells.push(kind.map(|kind| Tile::new(kind, position, block_size)));
            }
        }

        Ok(Self {
            rows,
            cols,
            cells,
            block_size,
            offset: IVec2::ZERO,
        })
    }

    /// `(rows, cols)`
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn block_size(&self) -> i32 {
        self.block_size
    }

    #[allow(dead_code)]
    pub fn tile_at(&self, row: usize, col: usize) -> Option<&Tile> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells[row * self.cols + col].as_ref()
    }

    #[allow(dead_code)]
    pub fn tile_at_mut(&mut self, row: usize, col: usize) -> Option<&mut Tile> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells[row * self.cols + col].as_mut()
    }

    pub fn tile_count(&self) -> usize {
        self.cells.iter().flatten().count()
    }

    pub fn solid_tiles(&self) -> impl Iterator<Item = &Tile> {
        self.cells.iter().flatten().filter(|t| t.is_solid())
    }

    pub fn offset(&self) -> IVec2 {
        self.offset
    }

    pub fn scroll_by(&mut self, delta: IVec2) {
        self.offset += delta;
    }

    /// Visible tiles at their on-screen positions (`position + offset`).
    pub fn visible_tiles(&self) -> impl Iterator<Item = TileDraw> + '_ {
        let offset = self.offset;
        self.cells
            .iter()
            .flatten()
            .filter(|t| t.is_visible())
            .map(move |t| TileDraw {
                kind: t.kind(),
                solid: t.is_solid(),
                position: t.position() + offset,
                size: t.size(),
            })
    }
}

pub fn load_tile_map_from_path(
    path: &Path,
    block_size: i32,
    bindings: &TileBindings,
) -> Result<TileMap, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read map file {}: {e}", path.display()))?;
    let map = TileMap::parse(&raw, block_size, bindings)
        .map_err(|e| format!("{e} (in {})", path.display()))?;
    let (rows, cols) = map.dimensions();
    log::info!(
        "Map loaded: {} ({}x{}, {} tiles, {} solid, block {} px)",
        path.display(),
        cols,
        rows,
        map.tile_count(),
        map.solid_tiles().count(),
        map.block_size()
    );
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "m2_map_test_{}_{}_{}",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn parse(text: &str) -> Result<TileMap, String> {
        TileMap::parse(text, 16, &TileBindings::default())
    }

    #[test]
    fn tiles_are_placed_on_the_block_grid() {
        let map = parse("0.0\n.0.\n").expect("valid map");
        assert_eq!(map.dimensions(), (2, 3));
        assert_eq!(map.tile_count(), 3);

        let tile = map.tile_at(1, 1).expect("centre tile");
        assert_eq!(tile.position(), IVec2::new(16, 16));
        assert_eq!(tile.id(), 0);
        assert!(tile.is_solid());
        assert_eq!(map.tile_at(0, 2).map(Tile::position), Some(IVec2::new(32, 0)));
        assert!(map.tile_at(0, 1).is_none());
        assert!(map.tile_at(5, 5).is_none());
    }

    #[test]
    fn block_size_scales_positions() {
        let map = TileMap::parse("..\n.0", 80, &TileBindings::default()).expect("valid map");
        let tile = map.tile_at(1, 1).expect("tile");
        assert_eq!(tile.position(), IVec2::new(80, 80));
        assert_eq!(tile.size(), 80);
        assert_eq!(map.block_size(), 80);
    }

    #[test]
    fn crlf_and_trailing_newline_are_accepted() {
        let map = parse("00\r\n..\r\n").expect("crlf map");
        assert_eq!(map.dimensions(), (2, 2));
        let map = parse("00\n..\n\n\n").expect("trailing blank lines");
        assert_eq!(map.dimensions(), (2, 2));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = parse("000\n00\n000").expect_err("ragged map should fail");
        assert!(err.contains("row 1 has 2 columns, expected 3"));
    }

    #[test]
    fn blank_row_in_the_middle_is_ragged() {
        let err = parse("00\n\n00").expect_err("blank middle row should fail");
        assert!(err.contains("row 1 has 0 columns"));
    }

    #[test]
    fn unknown_character_is_rejected() {
        let err = parse("0.\n.x").expect_err("unknown char should fail");
        assert!(err.contains("unknown tile character 'x' at row 1, column 1"));
    }

    #[test]
    fn empty_map_is_rejected() {
        let err = parse("").expect_err("empty map should fail");
        assert!(err.contains("map is empty"));
        let err = parse("\n").expect_err("blank first row should fail");
        assert!(err.contains("first row is empty"));
    }

    #[test]
    fn visible_tiles_apply_offset_and_skip_hidden() {
        let mut map = parse("00\n00").expect("valid map");
        map.scroll_by(IVec2::new(-4, 2));
        map.tile_at_mut(0, 0).expect("tile").set_visible(false);

        let drawn: Vec<TileDraw> = map.visible_tiles().collect();
        assert_eq!(drawn.len(), 3);
        assert_eq!(drawn[0].position, IVec2::new(12, 2));
        assert_eq!(drawn[2].position, IVec2::new(12, 18));
        assert!(drawn.iter().all(|d| d.solid));
        // Hidden tiles are still solid.
        assert_eq!(map.solid_tiles().count(), 4);
    }

    #[test]
    fn scroll_accumulates() {
        let mut map = parse("0").expect("valid map");
        map.scroll_by(IVec2::new(10, 0));
        map.scroll_by(IVec2::new(10, -1));
        assert_eq!(map.offset(), IVec2::new(20, -1));
    }

    #[test]
    fn missing_file_reports_path() {
        let path = temp_file_path("missing");
        let err = load_tile_map_from_path(&path, 16, &TileBindings::default())
            .expect_err("missing map should fail");
        assert!(err.contains("Failed to read map file"));
    }

    #[test]
    fn load_from_disk_names_the_file_on_parse_error() {
        let path = temp_file_path("bad");
        fs::write(&path, "0?").expect("write temp file");
        let err = load_tile_map_from_path(&path, 16, &TileBindings::default())
            .expect_err("bad map should fail");
        assert!(err.contains("unknown tile character '?'"));
        assert!(err.contains(&path.display().to_string()));
        let _ = fs::remove_file(path);
    }
}
