use std::{
    fs,
    io::{self, Write},
    mem::{take},
    path::{Path, PathBuf},
};

use crate::{
    TrackerError, TrackerResult,
    manga::{Chapter, Manga},
};

pub const REGISTRY_FILE_NAME: &'static str = "MangaTitleList.txt";

const TITLE_COLUMN: &'static str = "Chapter Title";
const DATE_COLUMN: &'static str = "Chapter Date";
const URL_COLUMN: &'static str = "Chapter URL";
const CHAPTER_COLUMNS: [&'static str; 3] = [TITLE_COLUMN, DATE_COLUMN, URL_COLUMN];

pub fn registry_path(storage_dir: &Path) -> PathBuf {
    storage_dir.join(REGISTRY_FILE_NAME)
}

pub fn chapter_file_path(storage_dir: &Path, manga_title: &str) -> PathBuf {
    storage_dir.join(format!("{}.csv", manga_title))
}

/// Reloads a manga's chapter history from its CSV file, in file order
/// (the writer always writes newest first, so newest first survives the
/// round trip). A missing file is the one signal that the title has never
/// been populated before.
pub fn load_manga_history(storage_dir: &Path, manga: &mut Manga) -> TrackerResult<()> {
    let path = chapter_file_path(storage_dir, manga.title());
    if !path.exists() {
        manga.mark_as_new();
        return Ok(());
    }

    let text = fs::read_to_string(&path)?;
    let mut rows = parse_rows(&text).into_iter();
    let header = rows.next().ok_or(TrackerError::MissingColumn(TITLE_COLUMN))?;
    let columns = locate_columns(&header)?;

    for (index, row) in rows.enumerate() {
        let field = |column: usize| {
            // Header is line 1, so data rows start at line 2
            row.get(column).ok_or(TrackerError::MalformedRow(index + 2))
        };
        // The stored date string goes back through the same parsing path
        // as a live scrape instead of being trusted
        let chapter = Chapter::new(
            field(columns[0])?.clone(),
            field(columns[1])?,
            field(columns[2])?.clone(),
        )?;
        manga.append_chapter(chapter);
    }
    Ok(())
}

/// Rewrites the full chapter history for one manga, newest first.
pub fn save_manga_history(storage_dir: &Path, manga: &Manga) -> TrackerResult<()> {
    fs::create_dir_all(storage_dir)?;
    let file = fs::File::create(chapter_file_path(storage_dir, manga.title()))?;
    let mut writer = io::BufWriter::new(file);

    write_row(&mut writer, &CHAPTER_COLUMNS)?;
    for chapter in manga.chapters() {
        write_row(&mut writer, &[chapter.title(), chapter.date_string(), chapter.url()])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn delete_chapter_file(storage_dir: &Path, manga_title: &str) -> TrackerResult<()> {
    let path = chapter_file_path(storage_dir, manga_title);
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// The tracked titles, in file order. No registry file yet just means
/// nothing is tracked.
pub fn load_title_registry(storage_dir: &Path) -> TrackerResult< Vec<String> > {
    let path = registry_path(storage_dir);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let text = fs::read_to_string(path)?;
    Ok(text.lines()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect())
}

pub fn save_title_registry(storage_dir: &Path, manga_titles: &[String]) -> TrackerResult<()> {
    fs::create_dir_all(storage_dir)?;
    let mut text = String::new();
    for manga_title in manga_titles {
        text.push_str(manga_title);
        text.push('\n');
    }
    fs::write(registry_path(storage_dir), text)?;
    Ok(())
}

fn locate_columns(header: &[String]) -> TrackerResult<[usize; 3]> {
    let mut columns = [0; 3];
    for (slot, &name) in CHAPTER_COLUMNS.iter().enumerate() {
        columns[slot] = header.iter().position(|cell| cell == name)
            .ok_or(TrackerError::MissingColumn(name))?;
    }
    Ok(columns)
}

/* ---------------- CSV rows ---------------- */

/// Minimal CSV parser, quote and CRLF tolerant.
fn parse_rows(text: &str) -> Vec< Vec<String> > {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    if matches!(chars.peek(), Some('"')) {
                        chars.next(); // double-quote escape
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            },
            ',' if !in_quotes => row.push(take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) {
                    chars.next();
                }
                row.push(take(&mut field));
                if row.len() == 1 && row[0].is_empty() {
                    row.clear(); // blank line
                } else {
                    rows.push(take(&mut row));
                }
            },
            _ => field.push(ch),
        }
    }

    // Flush a final row with no trailing newline
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"')
        || field.contains('\n') || field.contains('\r')
}

fn write_row<W: Write>(mut writer: W, row: &[&str]) -> io::Result<()> {
    let mut first = true;
    for cell in row {
        if !first {
            write!(writer, ",")?;
        } else {
            first = false;
        }
        if needs_quotes(cell) {
            write!(writer, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(writer, "{}", cell)?;
        }
    }
    writeln!(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manga::{UpdateStatus};

    fn tmp_dir(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("manga_store_{}", name));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).unwrap();
        path
    }

    fn chapter(title: &str, date: &str, url: &str) -> Chapter {
        Chapter::new(title.to_string(), date, url.to_string()).unwrap()
    }

    #[test]
    fn history_round_trips_field_for_field() {
        let dir = tmp_dir("round_trip");
        let mut manga = Manga::new("Test-Manga".to_string());
        manga.append_chapter(chapter("Chapter 0002", "01/02/2023", "manga4life.com/b"));
        manga.append_chapter(chapter("Chapter 0001", "01/01/2023", "manga4life.com/a"));
        save_manga_history(&dir, &manga).unwrap();

        let mut reloaded = Manga::new("Test-Manga".to_string());
        load_manga_history(&dir, &mut reloaded).unwrap();
        assert_eq!(reloaded.chapters(), manga.chapters());
        assert_eq!(reloaded.update_status(), UpdateStatus::Unchanged);
    }

    #[test]
    fn a_missing_file_marks_the_manga_new() {
        let dir = tmp_dir("missing_file");
        let mut manga = Manga::new("Never-Seen".to_string());
        load_manga_history(&dir, &mut manga).unwrap();
        assert!(manga.chapters().is_empty());
        assert_eq!(manga.update_status(), UpdateStatus::Initialized);
    }

    #[test]
    fn columns_are_located_by_name_not_position() {
        let dir = tmp_dir("column_order");
        fs::write(
            chapter_file_path(&dir, "Test-Manga"),
            "Chapter URL,Chapter Title,Chapter Date\n\
             manga4life.com/a,Chapter 0001,01/01/2023\n",
        ).unwrap();

        let mut manga = Manga::new("Test-Manga".to_string());
        load_manga_history(&dir, &mut manga).unwrap();
        assert_eq!(manga.chapters().len(), 1);
        assert_eq!(manga.chapters()[0].title(), "Chapter 0001");
        assert_eq!(manga.chapters()[0].url(), "manga4life.com/a");
    }

    #[test]
    fn a_missing_column_is_a_hard_failure() {
        let dir = tmp_dir("missing_column");
        fs::write(
            chapter_file_path(&dir, "Test-Manga"),
            "Chapter Title,Chapter Date\nChapter 0001,01/01/2023\n",
        ).unwrap();

        let mut manga = Manga::new("Test-Manga".to_string());
        assert!(matches!(
            load_manga_history(&dir, &mut manga),
            Err(TrackerError::MissingColumn(URL_COLUMN))
        ));
    }

    #[test]
    fn a_short_row_is_a_hard_failure() {
        let dir = tmp_dir("short_row");
        fs::write(
            chapter_file_path(&dir, "Test-Manga"),
            "Chapter Title,Chapter Date,Chapter URL\nChapter 0001,01/01/2023\n",
        ).unwrap();

        let mut manga = Manga::new("Test-Manga".to_string());
        assert!(matches!(
            load_manga_history(&dir, &mut manga),
            Err(TrackerError::MalformedRow(2))
        ));
    }

    #[test]
    fn quoted_fields_survive_the_round_trip() {
        let dir = tmp_dir("quoting");
        let mut manga = Manga::new("Test-Manga".to_string());
        manga.append_chapter(chapter("Chapter 1, part \"A\"", "01/01/2023", "manga4life.com/a"));
        save_manga_history(&dir, &manga).unwrap();

        let mut reloaded = Manga::new("Test-Manga".to_string());
        load_manga_history(&dir, &mut reloaded).unwrap();
        assert_eq!(reloaded.chapters()[0].title(), "Chapter 1, part \"A\"");
    }

    #[test]
    fn registry_round_trips_in_order() {
        let dir = tmp_dir("registry");
        assert!(load_title_registry(&dir).unwrap().is_empty());

        let titles = vec!["Jujutsu-Kaisen".to_string(), "One-Piece".to_string()];
        save_title_registry(&dir, &titles).unwrap();
        assert_eq!(load_title_registry(&dir).unwrap(), titles);
    }

    #[test]
    fn deleting_a_chapter_file_is_idempotent() {
        let dir = tmp_dir("delete");
        let mut manga = Manga::new("Test-Manga".to_string());
        manga.append_chapter(chapter("Chapter 0001", "01/01/2023", "manga4life.com/a"));
        save_manga_history(&dir, &manga).unwrap();

        delete_chapter_file(&dir, "Test-Manga").unwrap();
        assert!(!chapter_file_path(&dir, "Test-Manga").exists());
        // A second delete finds nothing and still succeeds
        delete_chapter_file(&dir, "Test-Manga").unwrap();
    }
}
