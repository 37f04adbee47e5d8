use std::path::PathBuf;

use dms::{
    DocumentType, LifecycleStatus,
    registry::{DocumentQuery, Registry},
};
use tracing::instrument;

use super::terminal::{Colorize, paint_status};

#[derive(Debug, clap::Parser)]
pub struct List {
    /// Keep only documents in this lifecycle state
    #[arg(long, value_parser = super::parse_status)]
    status: Option<LifecycleStatus>,

    /// Keep only documents of this type
    #[arg(long = "type", value_parser = super::parse_document_type)]
    document_type: Option<DocumentType>,

    /// Case-insensitive search over code, title, summary, and keywords
    #[arg(long, short)]
    search: Option<String>,

    /// Page number (1-based)
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Documents per page (0 shows everything)
    #[arg(long, default_value_t = 20)]
    page_size: usize,
}

impl Default for List {
    fn default() -> Self {
        Self {
            status: None,
            document_type: None,
            search: None,
            page: 1,
            page_size: 20,
        }
    }
}

impl List {
    #[instrument(skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let store = super::open_store(&root);
        let registry = Registry::new(&store);

        let query = DocumentQuery {
            status: self.status,
            document_type: self.document_type,
            search: self.search,
            page: self.page,
            page_size: self.page_size,
        };
        let page = registry.list(&query)?;

        if page.items.is_empty() {
            println!("No documents found.");
            return Ok(());
        }

        println!(
            "{:<20} {:<12} {:<4} TITLE",
            "CODE", "STATUS", "REV"
        );
        println!("{}", "─".repeat(70).dim());
        for record in &page.items {
            // Pad before colorizing; escape codes would skew the column.
            let status = paint_status(
                record.lifecycle_status,
                &format!("{:<12}", record.lifecycle_status),
            );
            println!(
                "{:<20} {status} {:<4} {}",
                record.document_code, record.revision, record.title
            );
        }

        println!();
        if page.page_size == 0 {
            println!("{}", format!("{} documents", page.total).dim());
        } else {
            let pages = page.total.div_ceil(page.page_size).max(1);
            println!(
                "{}",
                format!("page {} of {pages} ({} documents)", page.page, page.total).dim()
            );
        }
        Ok(())
    }
}
