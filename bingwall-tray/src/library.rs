use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use bingwall_core::wallpaper::current_wallpaper;

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "bmp"];

/// Downloaded wallpapers, newest first, with a navigation cursor.
///
/// Index 0 is the most recently modified file; moving "previous" walks
/// toward older files.
pub struct WallpaperLibrary {
    dir: PathBuf,
    wallpapers: Vec<PathBuf>,
    current: usize,
}

impl WallpaperLibrary {
    pub fn new(dir: PathBuf) -> Self {
        let mut library = WallpaperLibrary {
            dir,
            wallpapers: Vec::new(),
            current: 0,
        };
        library.refresh();
        library
    }

    /// Rescan the directory and re-sync the cursor with the OS wallpaper.
    pub fn refresh(&mut self) {
        self.wallpapers = scan_wallpapers(&self.dir);
        self.current = 0;
        if let Some(current) = current_wallpaper() {
            if let Some(pos) = self.wallpapers.iter().position(|p| *p == current) {
                self.current = pos;
            }
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn at_latest(&self) -> bool {
        self.current == 0
    }

    pub fn at_oldest(&self) -> bool {
        self.wallpapers.is_empty() || self.current >= self.wallpapers.len() - 1
    }

    /// Move toward newer files; `None` when already at the newest.
    pub fn next(&mut self) -> Option<&Path> {
        if self.wallpapers.is_empty() || self.at_latest() {
            return None;
        }
        self.current -= 1;
        Some(&self.wallpapers[self.current])
    }

    /// Move toward older files; `None` when already at the oldest.
    pub fn previous(&mut self) -> Option<&Path> {
        if self.at_oldest() {
            return None;
        }
        self.current += 1;
        Some(&self.wallpapers[self.current])
    }

    pub fn jump_to_latest(&mut self) -> Option<&Path> {
        if self.wallpapers.is_empty() {
            return None;
        }
        self.current = 0;
        Some(&self.wallpapers[0])
    }

    /// `name (n of total)` for the tray status row.
    pub fn current_info(&self) -> String {
        if self.wallpapers.is_empty() {
            return "No wallpapers found".to_string();
        }
        let wallpaper = &self.wallpapers[self.current];
        let name = wallpaper
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("?");
        format!("{} ({} of {})", name, self.current + 1, self.wallpapers.len())
    }
}

fn scan_wallpapers(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut wallpapers: Vec<(PathBuf, SystemTime)> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .map(|path| {
            let modified = path
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (path, modified)
        })
        .collect();
    wallpapers.sort_by(|a, b| b.1.cmp(&a.1));
    wallpapers.into_iter().map(|(path, _)| path).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    fn touch(path: &Path, age: Duration) {
        let file = fs::File::create(path).unwrap();
        let mtime = SystemTime::now() - age;
        file.set_modified(mtime).unwrap();
    }

    #[test]
    fn scan_sorts_newest_first_and_skips_non_images() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("old.jpg"), Duration::from_secs(300));
        touch(&dir.path().join("new.png"), Duration::from_secs(10));
        touch(&dir.path().join("mid.webp"), Duration::from_secs(100));
        touch(&dir.path().join("notes.txt"), Duration::from_secs(1));

        let scanned = scan_wallpapers(dir.path());
        let names: Vec<_> = scanned
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["new.png", "mid.webp", "old.jpg"]);
    }

    #[test]
    fn scan_of_missing_directory_is_empty() {
        let dir = tempdir().unwrap();
        assert!(scan_wallpapers(&dir.path().join("absent")).is_empty());
    }

    #[test]
    fn navigation_moves_the_cursor_within_bounds() {
        let dir = tempdir().unwrap();
        let mut library = WallpaperLibrary {
            dir: dir.path().to_path_buf(),
            wallpapers: vec![
                dir.path().join("c.jpg"),
                dir.path().join("b.jpg"),
                dir.path().join("a.jpg"),
            ],
            current: 0,
        };

        assert!(library.at_latest());
        assert!(library.next().is_none());

        assert_eq!(library.previous().unwrap(), dir.path().join("b.jpg"));
        assert_eq!(library.previous().unwrap(), dir.path().join("a.jpg"));
        assert!(library.at_oldest());
        assert!(library.previous().is_none());

        assert_eq!(library.next().unwrap(), dir.path().join("b.jpg"));
        assert_eq!(library.jump_to_latest().unwrap(), dir.path().join("c.jpg"));
        assert!(library.at_latest());
    }

    #[test]
    fn current_info_shows_position() {
        let dir = tempdir().unwrap();
        let mut library = WallpaperLibrary {
            dir: dir.path().to_path_buf(),
            wallpapers: vec![dir.path().join("b.jpg"), dir.path().join("a.jpg")],
            current: 0,
        };
        assert_eq!(library.current_info(), "b.jpg (1 of 2)");
        library.previous();
        assert_eq!(library.current_info(), "a.jpg (2 of 2)");

        let empty = WallpaperLibrary {
            dir: dir.path().to_path_buf(),
            wallpapers: Vec::new(),
            current: 0,
        };
        assert_eq!(empty.current_info(), "No wallpapers found");
    }
}
