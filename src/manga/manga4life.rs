use isahc::{
    http::{StatusCode, Uri},
    prelude::*,
};
use kuchiki::{
    ElementData, NodeDataRef, NodeRef,
    traits::*,
};

use crate::{
    PageComponent, TrackerError, TrackerResult,
    manga::{Chapter},
};

const HOST_NAME: &'static str = "manga4life.com";

const CHAPTER_LIST_SELECTOR: &'static str = ".list-group.top-10.bottom-5.ng-scope";
const CHAPTER_ITEM_SELECTOR: &'static str = ".list-group-item.ChapterLink.ng-scope";
const CHAPTER_TITLE_SELECTOR: &'static str = "[style='font-weight:600']";
const CHAPTER_DATE_SELECTOR: &'static str = ".d-block.d-md-none.ng-binding";
// The not-found page has no chapter list at all, and the plain markup
// (before any script runs) carries the container without the ng- classes
const STATIC_CHAPTER_LIST_SELECTOR: &'static str = ".list-group.top-10.bottom-5";

pub fn manga_page_url(manga_title: &str) -> String {
    format!("https://{}/manga/{}", HOST_NAME, manga_title)
}

/// Pulls every chapter entry off a title page, newest first as the site
/// lists them. Any missing piece fails the whole scrape; a partial
/// chapter list must never reach the history.
pub fn scrape_chapters(page: &NodeRef) -> TrackerResult<Vec<Chapter>> {
    let chapter_list = select_first(page, CHAPTER_LIST_SELECTOR, PageComponent::ChapterList)?;
    let items = chapter_list.as_node().select(CHAPTER_ITEM_SELECTOR)
        .map_err(|_| TrackerError::BadCssSelector(CHAPTER_ITEM_SELECTOR.to_string()))?;

    let mut chapters = Vec::new();
    for item in items {
        let title_text = select_first(
            item.as_node(), CHAPTER_TITLE_SELECTOR, PageComponent::ChapterTitle,
        )?.text_contents();
        let date_text = select_first(
            item.as_node(), CHAPTER_DATE_SELECTOR, PageComponent::ChapterDate,
        )?.text_contents();
        let url = {
            let attributes = item.attributes.borrow();
            let href = attributes.get("href")
                .ok_or(TrackerError::ComponentMissing(PageComponent::ChapterLink))?;
            format!("{}{}", HOST_NAME, href)
        };
        chapters.push(Chapter::new(
            clean_chapter_label(&title_text),
            date_text.trim(),
            url,
        )?);
    }
    Ok(chapters)
}

/// What a probe of a candidate title's page found.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TitleProbe {
    Found,
    NoChapterList,
    BadUrl,
}

/// Checks whether the site actually has a manga under this URL title
/// before it is allowed into the registry.
pub fn probe_title(manga_title: &str) -> TrackerResult<TitleProbe> {
    let uri: Uri = manga_page_url(manga_title).parse()?;
    let mut response = isahc::get(&uri)?;
    if response.status() != StatusCode::OK {
        return Ok(TitleProbe::BadUrl);
    }
    let page = kuchiki::parse_html().one(response.text()?);
    if has_chapter_list(&page) {
        Ok(TitleProbe::Found)
    } else {
        Ok(TitleProbe::NoChapterList)
    }
}

pub fn has_chapter_list(page: &NodeRef) -> bool {
    page.select_first(STATIC_CHAPTER_LIST_SELECTOR).is_ok()
}

/// The site's label convention: drop everything that is not alphanumeric,
/// then put a single space back between the 7-char "Chapter" prefix and
/// the number.
fn clean_chapter_label(raw: &str) -> String {
    let stripped: String = raw.chars().filter(|c| c.is_alphanumeric()).collect();
    let split_at = stripped.char_indices().nth(7)
        .map_or(stripped.len(), |(index, _)| index);
    format!("{} {}", &stripped[..split_at], &stripped[split_at..])
}

fn select_first(
    node: &NodeRef,
    selector: &'static str,
    component: PageComponent,
) -> TrackerResult< NodeDataRef<ElementData> > {
    node.select_first(selector)
        .map_err(|_| TrackerError::ComponentMissing(component))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TITLE_PAGE: &'static str = r#"
        <html><body>
        <div class="list-group top-10 bottom-5 ng-scope">
            <a class="list-group-item ChapterLink ng-scope"
               href="/read-online/Test-Manga-chapter-1087.html">
                <span style="font-weight:600">Chapter 1087</span>
                <span class="d-block d-md-none ng-binding"> 07/15/2023 </span>
            </a>
            <a class="list-group-item ChapterLink ng-scope"
               href="/read-online/Test-Manga-chapter-1086.html">
                <span style="font-weight:600">Chapter 1086</span>
                <span class="d-block d-md-none ng-binding">07/08/2023</span>
            </a>
        </div>
        </body></html>
    "#;

    fn parse(html: &str) -> NodeRef {
        kuchiki::parse_html().one(html)
    }

    #[test]
    fn scrapes_chapters_in_page_order() {
        let chapters = scrape_chapters(&parse(TITLE_PAGE)).unwrap();
        assert_eq!(chapters.len(), 2);

        assert_eq!(chapters[0].title(), "Chapter 1087");
        assert_eq!(chapters[0].date_string(), "07/15/2023");
        assert_eq!(
            chapters[0].url(),
            "manga4life.com/read-online/Test-Manga-chapter-1087.html"
        );
        assert_eq!(chapters[1].title(), "Chapter 1086");
    }

    #[test]
    fn a_page_without_the_chapter_list_fails_the_scrape() {
        let page = parse("<html><body><div class='other'></div></body></html>");
        assert!(matches!(
            scrape_chapters(&page),
            Err(TrackerError::ComponentMissing(PageComponent::ChapterList))
        ));
    }

    #[test]
    fn an_entry_missing_its_date_fails_the_scrape() {
        let page = parse(r#"
            <div class="list-group top-10 bottom-5 ng-scope">
                <a class="list-group-item ChapterLink ng-scope" href="/x">
                    <span style="font-weight:600">Chapter 0001</span>
                </a>
            </div>
        "#);
        assert!(matches!(
            scrape_chapters(&page),
            Err(TrackerError::ComponentMissing(PageComponent::ChapterDate))
        ));
    }

    #[test]
    fn labels_are_stripped_and_resplit() {
        assert_eq!(clean_chapter_label("Chapter 1087"), "Chapter 1087");
        assert_eq!(clean_chapter_label("Chapter-0186"), "Chapter 0186");
        // Short labels keep the site quirk of a trailing space
        assert_eq!(clean_chapter_label("One"), "One ");
    }

    #[test]
    fn the_probe_container_is_detected_without_script_classes() {
        let page = parse(r#"<div class="list-group top-10 bottom-5"></div>"#);
        assert!(has_chapter_list(&page));
        assert!(!has_chapter_list(&parse("<div class='list-group'></div>")));
    }

    #[test]
    fn page_urls_follow_the_site_rule() {
        assert_eq!(
            manga_page_url("Jujutsu-Kaisen"),
            "https://manga4life.com/manga/Jujutsu-Kaisen"
        );
    }
}
