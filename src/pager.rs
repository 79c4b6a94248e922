// Manages pages of an open database file.
//
// The storage engine never touches the file directly: it sees a page
// provider, a small read-only interface handing out the raw bytes of page N
// along with the file's page size and reserved-space tail.  Tests drive the
// engine with an in-memory provider; production uses the file-backed one
// defined here.
//
// Pages are loaded on demand and cached for the life of the pager.  Reads
// are idempotent: asking for the same page twice yields the same bytes.

use std::io::{Read, Seek, SeekFrom};

use log::debug;

use crate::dbheader;

// Page numbers are 1-based, to match how the file format numbers pages.
pub type PageNum = usize;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error accessing database file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error in database file header: {0}")]
    Header(#[from] dbheader::Error),
    #[error("Page {0} is not present in the database file.")]
    NoSuchPage(PageNum),
    #[error("The database file has been closed.")]
    Closed,
}

/// Read-only random access to the pages of one database file.
///
/// `get_page` must return a slice of exactly `page_size` bytes for every
/// page number in `1..=num_pages`.
pub trait PageSource {
    fn page_size(&self) -> usize;
    fn reserved_space(&self) -> usize;
    fn get_page(&mut self, pgnum: PageNum) -> Result<&[u8], Error>;
    fn close(&mut self) -> Result<(), Error>;
}

// A mutable reference to a provider is itself a provider, so callers can
// lend one pager to several short-lived engines in turn.
impl<T: PageSource + ?Sized> PageSource for &mut T {
    fn page_size(&self) -> usize {
        (**self).page_size()
    }
    fn reserved_space(&self) -> usize {
        (**self).reserved_space()
    }
    fn get_page(&mut self, pgnum: PageNum) -> Result<&[u8], Error> {
        (**self).get_page(pgnum)
    }
    fn close(&mut self) -> Result<(), Error> {
        (**self).close()
    }
}

/// A file-backed page provider.  Holds the parsed file header and a lazy
/// cache of loaded pages.
pub struct FilePager {
    f: Option<std::fs::File>,
    header: dbheader::DbHeader,
    pages: Vec<Option<Vec<u8>>>,
}

impl FilePager {
    pub fn open(path: &str) -> Result<Self, Error> {
        let mut f = std::fs::OpenOptions::new()
            .read(true)
            .write(false)
            .create(false)
            .open(path)?;
        let header = dbheader::read_header(&mut f)?;
        let num_pages = header.num_pages as usize;
        Ok(FilePager {
            f: Some(f),
            header,
            pages: vec![None; num_pages],
        })
    }

    pub fn header(&self) -> &dbheader::DbHeader {
        &self.header
    }

    pub fn num_pages(&self) -> usize {
        self.header.num_pages as usize
    }

    fn ensure_present(&mut self, pgnum: PageNum) -> Result<(), Error> {
        if self.pages[pgnum - 1].is_some() {
            return Ok(());
        }
        let f = self.f.as_mut().ok_or(Error::Closed)?;
        debug!("loading page {} on demand", pgnum);
        let page_size = self.header.page_size as usize;
        let mut v = vec![0_u8; page_size];
        f.seek(SeekFrom::Start((pgnum - 1) as u64 * page_size as u64))?;
        f.read_exact(&mut v[..])?;
        self.pages[pgnum - 1] = Some(v);
        Ok(())
    }
}

impl PageSource for FilePager {
    fn page_size(&self) -> usize {
        self.header.page_size as usize
    }

    fn reserved_space(&self) -> usize {
        self.header.reserved_space as usize
    }

    fn get_page(&mut self, pgnum: PageNum) -> Result<&[u8], Error> {
        if pgnum == 0 || pgnum > self.pages.len() {
            return Err(Error::NoSuchPage(pgnum));
        }
        self.ensure_present(pgnum)?;
        match &self.pages[pgnum - 1] {
            Some(v) => Ok(v.as_slice()),
            None => unreachable!("ensure_present loaded the page"),
        }
    }

    fn close(&mut self) -> Result<(), Error> {
        // Cached pages stay readable; only the file handle is released.
        self.f = None;
        Ok(())
    }
}
