pub mod dates;
pub mod manga4life;

use chrono::{Local, NaiveDate};

use crate::{TrackerResult};

/// One released chapter, exactly as it will be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    title: String,
    date: NaiveDate,
    date_string: String,
    url: String,
}
impl Chapter {
    pub fn new(title: String, raw_date: &str, url: String) -> TrackerResult<Chapter> {
        let (date, date_string) = dates::resolve(raw_date, Local::now().date_naive())?;
        Ok(Chapter { title, date, date_string, url })
    }

    pub fn title(&self) -> &str { &self.title }
    pub fn date(&self) -> NaiveDate { self.date }
    pub fn date_string(&self) -> &str { &self.date_string }
    pub fn url(&self) -> &str { &self.url }

    /// True when `other` counts as strictly newer than this chapter.
    /// A same-day entry with a different title counts as newer, so a
    /// multi-chapter drop on one day is picked up in full; a same-day
    /// entry with the same title does not, so a rescan stops on it.
    pub fn released_before(&self, other: &Chapter) -> bool {
        if self.date == other.date {
            self.title != other.title
        } else {
            self.date < other.date
        }
    }
}

/// Per-title chapter history plus the flags the update report reads.
/// Chapters are held newest first; index 0 is the latest known release.
#[derive(Debug)]
pub struct Manga {
    title: String,
    url: String,
    chapters: Vec<Chapter>,
    is_new_manga: bool,
    has_new_chapters: bool,
}
impl Manga {
    pub fn new(title: String) -> Manga {
        let url = manga4life::manga_page_url(&title);
        Manga {
            title,
            url,
            chapters: Vec::new(),
            is_new_manga: false,
            has_new_chapters: false,
        }
    }

    pub fn title(&self) -> &str { &self.title }
    pub fn url(&self) -> &str { &self.url }
    pub fn chapters(&self) -> &[Chapter] { &self.chapters }
    pub fn latest_chapter(&self) -> Option<&Chapter> { self.chapters.first() }

    pub fn mark_as_new(&mut self) {
        self.is_new_manga = true;
    }

    /// Start-of-run cleanup. A title marked new graduates out of that
    /// state once it has been populated at least once.
    pub fn reset(&mut self) {
        if self.is_new_manga && !self.chapters.is_empty() {
            self.is_new_manga = false;
        }
        self.chapters.clear();
        self.has_new_chapters = false;
    }

    pub fn contains_chapter(&self, chapter: &Chapter) -> bool {
        self.chapters.contains(chapter)
    }

    /// Inserts at `index` when it is within bounds, appends otherwise.
    /// A chapter already on record is left alone.
    pub fn insert_chapter(&mut self, chapter: Chapter, index: usize) {
        if self.contains_chapter(&chapter) {
            return;
        }
        if index <= self.chapters.len() {
            self.chapters.insert(index, chapter);
        } else {
            self.chapters.push(chapter);
        }
    }

    pub fn append_chapter(&mut self, chapter: Chapter) {
        let end = self.chapters.len();
        self.insert_chapter(chapter, end);
    }

    /// Folds a freshly scraped chapter list into the history. The site
    /// lists chapters newest first, so the scan stops at the first entry
    /// that is already on record or not strictly newer than the newest
    /// known chapter; nothing past that point can be new.
    pub fn record_new_chapters(&mut self, scraped: Vec<Chapter>) {
        let latest = self.latest_chapter().cloned();
        let mut insert_index = 0;
        for candidate in scraped {
            if self.contains_chapter(&candidate) {
                break;
            }
            if let Some(latest) = &latest {
                if !latest.released_before(&candidate) {
                    break;
                }
            }
            self.insert_chapter(candidate, insert_index);
            insert_index += 1;
        }
        if insert_index > 0 {
            self.has_new_chapters = true;
        }
    }

    pub fn update_status(&self) -> UpdateStatus {
        if self.is_new_manga {
            UpdateStatus::Initialized
        } else if self.has_new_chapters {
            UpdateStatus::NewChapters
        } else {
            UpdateStatus::Unchanged
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UpdateStatus {
    Initialized,
    NewChapters,
    Unchanged,
}
