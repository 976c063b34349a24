//! Add and add-qa command handlers.

use super::open_store;
use clap::Args;
use methodics_core::{config::AppConfig, AppError, AppResult};
use methodics_knowledge::ingest::{document_from_file, ingest_document, ingest_qa_pair};
use methodics_knowledge::{NewDocument, NewQaPair};
use std::path::PathBuf;

/// Add a methodic from a file or inline text
#[derive(Args, Debug)]
pub struct AddCommand {
    /// Title (defaults to the file name when adding a file)
    #[arg(short, long)]
    pub title: Option<String>,

    /// Text or markdown file with the methodic body
    #[arg(short, long, conflicts_with = "text", required_unless_present = "text")]
    pub file: Option<PathBuf>,

    /// Methodic body given inline
    #[arg(long)]
    pub text: Option<String>,

    /// Subject
    #[arg(short, long)]
    pub subject: Option<String>,

    /// Author
    #[arg(short, long)]
    pub author: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AddCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let input = self.to_new_document()?;
        let store = open_store(config)?;
        let document = ingest_document(store.as_ref(), input)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&document)?);
        } else {
            println!("Added methodic {}: {}", document.id, document.title);
        }
        Ok(())
    }

    fn to_new_document(&self) -> AppResult<NewDocument> {
        match (&self.file, &self.text) {
            (Some(path), _) => document_from_file(
                path,
                self.title.clone(),
                self.subject.clone(),
                self.author.clone(),
            ),
            (None, Some(text)) => Ok(NewDocument {
                title: self.title.clone().unwrap_or_default(),
                subject: self.subject.clone(),
                author: self.author.clone(),
                body: text.clone(),
            }),
            (None, None) => Err(AppError::Validation(
                "either --file or --text is required".to_string(),
            )),
        }
    }
}

/// Add a question-answer pair
#[derive(Args, Debug)]
pub struct AddQaCommand {
    /// Question text
    #[arg(short, long)]
    pub question: String,

    /// Answer text
    #[arg(short, long)]
    pub answer: String,

    /// Id of the methodic the pair belongs to
    #[arg(long)]
    pub methodic_id: Option<i64>,
}

impl AddQaCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let store = open_store(config)?;
        let pair = ingest_qa_pair(
            store.as_ref(),
            NewQaPair {
                question: self.question.clone(),
                answer: self.answer.clone(),
                document_id: self.methodic_id,
            },
        )?;
        println!("Added QA pair {}", pair.id);
        Ok(())
    }
}
