pub mod manga;
pub mod storage;

use std::{
    io::{Error as IOError},
};
use isahc::{
    Error as IsahcError,
    http::{
        Uri,
        uri::{InvalidUri},
    },
    prelude::*,
};
use kuchiki::{
    NodeRef,
    traits::*,
};

pub type TrackerResult<T> = Result<T, TrackerError>;
#[derive(Debug)]
pub enum TrackerError {
    ComponentMissing(PageComponent),
    BadCssSelector(String),
    InvalidDate(String),
    MissingColumn(&'static str),
    MalformedRow(usize),

    InvalidUri(InvalidUri),
    IOError(IOError),
    IsahcError(IsahcError),
}
impl From<InvalidUri> for TrackerError {
    fn from(error: InvalidUri) -> Self { Self::InvalidUri(error) }
}
impl From<IOError> for TrackerError {
    fn from(error: IOError) -> Self { Self::IOError(error) }
}
impl From<IsahcError> for TrackerError {
    fn from(error: IsahcError) -> Self { Self::IsahcError(error) }
}

#[derive(Debug, Copy, Clone)]
pub enum PageComponent {
    ChapterList,
    ChapterTitle,
    ChapterDate,
    ChapterLink,
}

pub fn fetch_page(uri: Uri) -> TrackerResult<NodeRef> {
    let page_text = isahc::get(uri)?.text()?;
    Ok(kuchiki::parse_html().one(page_text))
}
