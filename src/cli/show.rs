use std::path::PathBuf;

use dms::registry::Registry;
use tracing::instrument;

use super::terminal::{Colorize, paint_status};

#[derive(Debug, clap::Parser)]
pub struct Show {
    /// The id of the document to show
    id: String,
}

impl Show {
    #[instrument(skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let store = super::open_store(&root);
        let registry = Registry::new(&store);
        let record = registry.get(&self.id)?;

        println!(
            "{}  {}",
            record.document_code,
            paint_status(record.lifecycle_status, &record.lifecycle_status.to_string())
        );
        println!("{}", "─".repeat(70).dim());
        println!("Title:       {}", record.title);
        println!("Type:        {}", record.document_type);
        println!("Process:     {}", record.process_or_function);
        println!("Department:  {}", record.department_or_site);
        if !record.revision.is_empty() {
            println!("Revision:    {}", record.revision);
        }
        println!("Owner:       {}", format_user(&record.owner));
        println!("Approver:    {}", format_user(&record.approver));
        if let Some(date) = record.effective_date {
            println!("Effective:   {date}");
        }
        if let Some(date) = record.next_review_date {
            println!("Review due:  {date}");
        }
        if !record.keywords.is_empty() {
            println!("Keywords:    {}", record.keywords.join(", "));
        }
        if !record.summary.is_empty() {
            println!("Summary:     {}", record.summary);
        }
        if let Some(id) = &record.supersedes_document_id {
            println!("Supersedes:  {id}");
        }
        if let Some(id) = &record.superseded_by_document_id {
            println!("Superseded by: {id}");
        }
        if !record.authoring_file_url.is_empty() {
            println!("Authoring:   {}", record.authoring_file_url.dim());
        }
        if !record.published_file_url.is_empty() {
            println!("Published:   {}", record.published_file_url.dim());
        }
        if !record.archive_file_url.is_empty() {
            println!("Archive:     {}", record.archive_file_url.dim());
        }
        println!("{}", format!("id: {}", record.id).dim());
        Ok(())
    }
}

fn format_user(user: &dms::UserRef) -> String {
    if user.email.is_empty() {
        user.display_name.clone()
    } else {
        format!("{} <{}>", user.display_name, user.email)
    }
}
