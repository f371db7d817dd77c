use scraper::{Html, Selector};

use crate::parse::error::Result;
use crate::parse::{Error, Record};
use crate::static_selector;

/// A fetched `ricerca-medici` page.
pub struct PortalPage {
    document: Html,
}

impl PortalPage {
    pub fn parse(text: &str) -> Self {
        Self {
            document: Html::parse_document(text),
        }
    }

    /// Reads the records embedded in the `value` of the `<input>` matched by
    /// `results`. `Ok(None)` means the input is not on the page at all.
    pub fn records(&self, results: &Selector) -> Result<Option<Vec<Record>>> {
        let Some(input) = self.document.select(results).next() else {
            return Ok(None);
        };
        let value = input
            .attr("value")
            .ok_or_else(|| Error::html_parse_error("results input has no value attribute"))?;
        Record::all_from_value(value).map(Some)
    }

    /// Outer markup of every `<table>` whose markup mentions `needle`, in document order.
    pub fn tables_containing(&self, needle: &str) -> Vec<String> {
        static_selector!(TABLE_SELECTOR <- "table");
        self.document
            .select(&TABLE_SELECTOR)
            .map(|table| table.html())
            .filter(|markup| markup.contains(needle))
            .collect()
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = String> + '_ {
        static_selector!(PARAGRAPH_SELECTOR <- "p");
        self.document
            .select(&PARAGRAPH_SELECTOR)
            .map(|p| p.text().collect::<String>())
    }
}
