use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    time::{Instant},
};
use isahc::{
    http::{Uri},
};
use serde::{Deserialize};

use manga_update_tracker::{
    TrackerResult, fetch_page,
    manga::{Manga, UpdateStatus, manga4life::{self, TitleProbe}},
    storage,
};

#[derive(Deserialize)]
struct RunInfo {
    storage_dir: PathBuf,
}

fn main() {
    let run_info: RunInfo = toml::from_str(
        &fs::read_to_string("manga_tracker.toml").expect("Failed to read the tracker config")
    ).expect("Failed to convert the tracker config");
    fs::create_dir_all(&run_info.storage_dir)
        .expect("Failed to create the storage directory");

    let manga_titles = storage::load_title_registry(&run_info.storage_dir)
        .expect("Failed to load the manga title list");
    let mut manga_list: Vec<Manga> = manga_titles.into_iter().map(Manga::new).collect();

    loop {
        match menu_choice() {
            MenuChoice::Run => run_update_check(&run_info.storage_dir, &mut manga_list),
            MenuChoice::Add => add_manga(&run_info.storage_dir, &mut manga_list),
            MenuChoice::Delete => delete_manga(&run_info.storage_dir, &mut manga_list),
            MenuChoice::View => list_manga(&manga_list),
            MenuChoice::Quit => break,
        }
    }
}

#[derive(Debug, Copy, Clone)]
enum MenuChoice {
    Run,
    Add,
    Delete,
    View,
    Quit,
}

fn menu_choice() -> MenuChoice {
    loop {
        println!();
        println!("[1]: Check for updates");
        println!("[2]: Add a manga to the manga title list");
        println!("[3]: Delete a manga from the manga title list");
        println!("[4]: View the manga list");
        println!("[5]: Quit");
        println!();
        match prompt("Enter the number of your choice: ").as_str() {
            "1" => return MenuChoice::Run,
            "2" => return MenuChoice::Add,
            "3" => return MenuChoice::Delete,
            "4" => return MenuChoice::View,
            "5" => return MenuChoice::Quit,
            _ => println!("Invalid input, please try again"),
        }
    }
}

fn prompt(message: &str) -> String {
    print!("{}", message);
    io::stdout().flush().expect("Failed to flush stdout");
    let mut input = String::new();
    io::stdin().read_line(&mut input).expect("Failed to read from stdin");
    input.trim().to_string()
}

/// One full pass over every tracked title. A title that fails mid-check
/// is skipped without touching its file, so its history cannot be
/// half-written.
fn run_update_check(storage_dir: &Path, manga_list: &mut Vec<Manga>) {
    let mut report = String::new();

    for manga in manga_list.iter_mut() {
        manga.reset();
        println!();
        println!("Checking {}, URL: {}", manga.title(), manga.url());
        let start = Instant::now();

        match check_manga(storage_dir, manga) {
            Ok(()) => println!("Checked {} in {:?}", manga.title(), start.elapsed()),
            Err(e) => {
                println!("Failed {}: {:?}", manga.title(), e);
                continue;
            },
        }
        match manga.update_status() {
            UpdateStatus::Initialized => {
                report += &format!("{} has been initialized.\n", manga.title());
            },
            UpdateStatus::NewChapters => {
                report += &format!("{} has new chapters.\n", manga.title());
            },
            UpdateStatus::Unchanged => (),
        }
    }

    println!();
    println!("Updates: ");
    if report.is_empty() {
        println!("None");
    } else {
        print!("{}", report);
    }
}

fn check_manga(storage_dir: &Path, manga: &mut Manga) -> TrackerResult<()> {
    storage::load_manga_history(storage_dir, manga)?;
    let uri: Uri = manga.url().parse()?;
    let page = fetch_page(uri)?;
    let scraped = manga4life::scrape_chapters(&page)?;
    manga.record_new_chapters(scraped);
    storage::save_manga_history(storage_dir, manga)
}

fn add_manga(storage_dir: &Path, manga_list: &mut Vec<Manga>) {
    println!();
    println!("Input the URL title of the manga to add \
        (for https://manga4life.com/manga/Jujutsu-Kaisen, input Jujutsu-Kaisen)");

    loop {
        println!();
        let input = prompt("Enter the manga title (or 'C' to cancel): ");
        if input.eq_ignore_ascii_case("c") {
            return;
        }
        // Case sensitive, exactly like the site's URLs
        if manga_list.iter().any(|manga| manga.title() == input) {
            println!("This manga is already in the manga list, please try again");
            continue;
        }
        match manga4life::probe_title(&input) {
            Ok(TitleProbe::Found) => {
                let mut manga = Manga::new(input);
                manga.mark_as_new();
                println!("Manga [{}] has been added to the manga title list", manga.title());
                manga_list.push(manga);
                save_registry(storage_dir, manga_list);
                return;
            },
            Ok(TitleProbe::NoChapterList) => {
                println!("Manga4Life does not have this manga, please try again");
            },
            Ok(TitleProbe::BadUrl) => {
                println!("This title does not lead to a working Manga4Life URL, please try again");
            },
            Err(e) => println!("Could not reach Manga4Life ({:?}), please try again", e),
        }
    }
}

fn delete_manga(storage_dir: &Path, manga_list: &mut Vec<Manga>) {
    if manga_list.is_empty() {
        println!("There are no manga to delete in the manga title list");
        return;
    }

    loop {
        println!();
        for (index, manga) in manga_list.iter().enumerate() {
            println!("({}): {}", index + 1, manga.title());
        }
        println!();
        let input = prompt("Enter the number of the manga to delete (or 'C' to cancel): ");
        if input.eq_ignore_ascii_case("c") {
            return;
        }
        match input.parse::<usize>() {
            Ok(number) if 1 <= number && number <= manga_list.len() => {
                let manga = manga_list.remove(number - 1);
                if let Err(e) = storage::delete_chapter_file(storage_dir, manga.title()) {
                    println!("Failed to delete the chapter file of {}: {:?}", manga.title(), e);
                }
                println!("Manga [{}] has been deleted from the manga title list", manga.title());
                save_registry(storage_dir, manga_list);
                return;
            },
            _ => println!("That is not a number in the list, please try again"),
        }
    }
}

fn list_manga(manga_list: &[Manga]) {
    println!();
    println!("Manga List: ");
    if manga_list.is_empty() {
        println!("None");
        return;
    }
    for (index, manga) in manga_list.iter().enumerate() {
        println!("({}): {}", index + 1, manga.title());
    }
}

fn save_registry(storage_dir: &Path, manga_list: &[Manga]) {
    let manga_titles: Vec<String> = manga_list.iter()
        .map(|manga| manga.title().to_string())
        .collect();
    if let Err(e) = storage::save_title_registry(storage_dir, &manga_titles) {
        println!("Failed to save the manga title list: {:?}", e);
    }
}
